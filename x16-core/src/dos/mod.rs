//! Virtual disk DOS: transfers, directory listing, channels and commands.

pub mod command;
pub mod files;
pub mod listing;
pub mod transfer;
pub mod writer;

pub use command::{DosCommand, DosStatus};
pub use files::{FileMode, FileTable, IoFile};
pub use listing::{block_count, encode_listing, parse_listing, ListingLine};
pub use transfer::{load, save, LoadOutcome, LoadRequest, LoadTarget, SaveRequest};
pub use writer::BoundedWriter;
