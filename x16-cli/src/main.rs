//! X16 DOS CLI - Drive the virtual disk from the command line.
//!
//! Usage:
//!   x16dos [--sdcard DIR] <command>
//!
//! Examples:
//!   x16dos dir                           # LOAD"$" and list it like BASIC
//!   x16dos --sdcard card load GAME.PRG   # LOAD at the file's own address
//!   x16dos load TILES.BIN --vram-bank 0  # LOAD into video RAM
//!   x16dos copy GAME.PRG BACKUP.PRG      # LOAD then SAVE the same range
//!   x16dos --dos-trap C100 dos           # Print the disk status

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crossterm::{
    queue,
    style::{Attribute, Print, SetAttribute},
};
use serde::Serialize;

use x16_core::kernal::addr;
use x16_core::{
    parse_listing, swap_case, DosConfig, DosError, DosResult, DosSession, HeadlessMachine, HostDirFS,
    TrapResult, VolumeFS, X16Bus,
};

/// Where BASIC programs live, and where `dir` puts the listing.
const BASIC_START: u16 = 0x0801;

/// Guest buffer holding the filename.
const NAME_BUFFER: u16 = 0x0400;

/// Zero page pointer handed to SAVE.
const SAVE_POINTER: u8 = 0xFB;

/// PETSCII reverse-video on.
const RVS_ON: u8 = 0x12;

/// Commander X16 virtual disk CLI
#[derive(Parser, Debug)]
#[command(name = "x16dos")]
#[command(about = "Serve Commander X16 LOAD/SAVE from a host directory")]
struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Host directory acting as the SD card
    #[arg(long, global = true)]
    sdcard: Option<PathBuf>,

    /// Swap upper/lower case in filenames and listings
    #[arg(long, global = true)]
    swap_case: bool,

    /// Enable KERNAL call tracing
    #[arg(short, long, global = true)]
    trace: bool,

    /// Print call results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Address (hex) of the BASIC DOS handler to trap; off unless given here or in the config
    #[arg(long, global = true, value_parser = parse_hex)]
    dos_trap: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// LOAD"$" and print the directory listing
    Dir,

    /// LOAD a file and hex-dump what arrived
    Load {
        name: String,

        /// Load address (hex), used with secondary address 0
        #[arg(long, value_parser = parse_hex)]
        addr: Option<u16>,

        /// Secondary address: 0 loads at --addr, otherwise at the file's address
        #[arg(long, default_value_t = 1)]
        sa: u8,

        /// Load into video RAM bank N instead of CPU memory
        #[arg(long)]
        vram_bank: Option<u8>,

        /// Bytes to dump
        #[arg(long, default_value_t = 64)]
        dump: usize,
    },

    /// LOAD a file at its own address, then SAVE the same range under a new name
    Copy { src: String, dst: String },

    /// Send a command string through the DOS trap (empty prints the status)
    Dos {
        #[arg(default_value = "")]
        command: String,
    },
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s
        .trim_start_matches('$')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address {s:?}: {e}"))
}

/// Register state after one trapped call.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CallReport {
    call: &'static str,
    filename: String,
    handled: bool,
    carry: bool,
    a: u8,
    status: u8,
    end: u16,
    ram_bank: u8,
}

/// Everything the blocking task hands back for rendering.
struct Run {
    machine: HeadlessMachine,
    reports: Vec<CallReport>,
    /// First byte of the loaded range, when known
    start: Option<u16>,
    /// Disk status after the last call
    status: String,
}

struct Runner {
    session: DosSession<HostDirFS>,
    machine: HeadlessMachine,
    reports: Vec<CallReport>,
}

impl Runner {
    fn new(session: DosSession<HostDirFS>) -> Self {
        Self {
            session,
            machine: HeadlessMachine::new(),
            reports: Vec::new(),
        }
    }

    /// Set up SETNAM/SETLFS and registers, then trap at `pc`.
    fn call(
        &mut self,
        name: &'static str,
        pc: u16,
        filename: &str,
        sa: u8,
        a: u8,
        xy: u16,
    ) -> bool {
        let symbols = self.session.config().symbols.clone();
        let device = self.session.config().device;
        let m = &mut self.machine;
        m.setnam(&symbols, NAME_BUFFER, filename.as_bytes());
        m.setlfs(&symbols, 1, device, sa);
        m.regs.a = a;
        m.set_xy(xy);
        m.regs.pc = pc;

        let result = self.session.handle_trap(m);
        let report = CallReport {
            call: name,
            filename: filename.to_string(),
            handled: result == TrapResult::Handled,
            carry: m.carry(),
            a: m.a(),
            status: m.read(symbols.status),
            end: m.xy(),
            ram_bank: m.ram_bank(),
        };
        let ok = report.handled && !report.carry;
        self.reports.push(report);
        ok
    }

    fn load(&mut self, filename: &str, sa: u8, a: u8, xy: u16) -> bool {
        let pc = self.session.config().symbols.load;
        self.call("load", pc, filename, sa, a, xy)
    }

    fn save(&mut self, filename: &str, start: u16, end: u16) -> bool {
        let pc = self.session.config().symbols.save;
        self.machine.poke(SAVE_POINTER as u16, &start.to_le_bytes());
        self.call("save", pc, filename, 0, SAVE_POINTER, end)
    }

    /// Equivalent of BASIC `DOS"<command>"`: command bytes at INDEX1, length in `a`.
    fn dos(&mut self, command: &str) -> DosResult<bool> {
        let symbols = self.session.config().symbols.clone();
        let Some(pc) = symbols.dos else {
            return Err(DosError::InvalidConfig(
                "no DOS trap address; pass --dos-trap or set symbols.dos".to_string(),
            ));
        };
        let bytes = command.as_bytes();
        let len = bytes.len().min(u8::MAX as usize);
        let m = &mut self.machine;
        m.poke(NAME_BUFFER, &bytes[..len]);
        m.poke(symbols.index1, &NAME_BUFFER.to_le_bytes());
        m.regs.a = len as u8;
        m.regs.status = 0;
        m.regs.pc = pc;

        let result = self.session.handle_trap(m);
        self.reports.push(CallReport {
            call: "dos",
            filename: command.to_string(),
            handled: result == TrapResult::Handled,
            carry: m.carry(),
            a: m.a(),
            status: m.read(symbols.status),
            end: m.xy(),
            ram_bank: m.ram_bank(),
        });
        Ok(result == TrapResult::Handled)
    }

    /// Load address embedded in a file's header.
    fn embedded_address(&self, filename: &str) -> DosResult<u16> {
        let name = if self.session.config().swap_case {
            swap_case(filename.as_bytes())
        } else {
            filename.as_bytes().to_vec()
        };
        let mut header = Vec::with_capacity(2);
        self.session
            .volume()
            .open_read(&name)?
            .take(2)
            .read_to_end(&mut header)?;
        header.resize(2, 0);
        Ok(u16::from_le_bytes([header[0], header[1]]))
    }

    fn finish(self, start: Option<u16>) -> Run {
        Run {
            status: self.session.last_status().to_string(),
            machine: self.machine,
            reports: self.reports,
            start,
        }
    }
}

fn run(session: DosSession<HostDirFS>, command: Command) -> DosResult<Run> {
    let mut runner = Runner::new(session);

    match command {
        Command::Dir => {
            runner.load("$", 0, 0, BASIC_START);
            Ok(runner.finish(Some(BASIC_START)))
        }

        Command::Load {
            name,
            addr,
            sa,
            vram_bank,
            ..
        } => {
            let override_start = addr.unwrap_or(BASIC_START);
            let mode = vram_bank.map_or(0, |bank| (bank & 0x0F) + 2);
            let start = if sa == 0 {
                Some(override_start)
            } else {
                runner.embedded_address(&name).ok()
            };
            let bank = runner.machine.ram_bank();
            runner.load(&name, sa, mode, override_start);
            // Dump from the bank the load started in
            runner.machine.set_ram_bank(bank);
            Ok(runner.finish(start))
        }

        Command::Copy { src, dst } => {
            if !runner.load(&src, 1, 0, BASIC_START) {
                return Ok(runner.finish(None));
            }
            let start = runner.embedded_address(&src)?;
            let end = runner.machine.xy();
            runner.save(&dst, start, end);
            Ok(runner.finish(Some(start)))
        }

        Command::Dos { command } => {
            runner.dos(&command)?;
            Ok(runner.finish(None))
        }
    }
}

/// Fold command-line flags over the file configuration.
fn apply_overrides(args: &Args, config: &mut DosConfig) {
    if let Some(dir) = &args.sdcard {
        config.sdcard_dir = dir.clone();
    }
    if args.swap_case {
        config.swap_case = true;
    }
    if let Some(pc) = args.dos_trap {
        config.symbols.dos = Some(pc);
    }
}

/// Print a listing the way BASIC's LIST shows it.
fn render_listing(out: &mut impl Write, data: &[u8]) -> std::io::Result<()> {
    for line in parse_listing(data) {
        queue!(out, Print(format!("{} ", line.number)))?;
        for &byte in &line.text {
            if byte == RVS_ON {
                queue!(out, SetAttribute(Attribute::Reverse))?;
            } else {
                queue!(out, Print(byte as char))?;
            }
        }
        queue!(out, SetAttribute(Attribute::Reset), Print("\n"))?;
    }
    out.flush()
}

fn hex_dump(out: &mut impl Write, base: u32, data: &[u8]) -> std::io::Result<()> {
    for (i, row) in data.chunks(16).enumerate() {
        let hex: Vec<String> = row.iter().map(|b| format!("{b:02X}")).collect();
        let text: String = row
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(out, "{:05X}: {:<47}  {}", base + (i * 16) as u32, hex.join(" "), text)?;
    }
    Ok(())
}

fn render_reports(out: &mut impl Write, reports: &[CallReport]) -> std::io::Result<()> {
    for r in reports {
        let result = if !r.handled {
            "declined".to_string()
        } else if r.carry {
            format!("error (a={}, status={})", r.a, r.status)
        } else {
            format!("ok, end ${:04X}", r.end)
        };
        writeln!(out, "{} \"{}\": {}", r.call.to_uppercase(), r.filename, result)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.trace { "trace" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match &args.config {
        Some(path) => DosConfig::from_json_file(path)?,
        None => DosConfig::default(),
    };
    apply_overrides(&args, &mut config);

    let session = DosSession::from_config(config)?;
    log::debug!("serving {}", session.volume().dir().display());

    // The session is synchronous; keep it off the async runtime
    let command = args.command.clone();
    let result = tokio::task::spawn_blocking(move || run(session, command)).await??;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result.reports)?)?;
        return Ok(());
    }

    let succeeded = result
        .reports
        .last()
        .is_some_and(|r| r.handled && !r.carry);

    match &args.command {
        Command::Dir if succeeded => {
            let end = result.machine.xy();
            let len = end.saturating_sub(BASIC_START) as usize;
            render_listing(&mut out, &result.machine.peek(BASIC_START, len))?;
        }

        Command::Load {
            vram_bank, dump, ..
        } if succeeded => {
            render_reports(&mut out, &result.reports)?;
            if let Some(start) = result.start {
                match vram_bank {
                    Some(bank) => {
                        let base = ((*bank as u32 & 0x01) << 16) | start as u32;
                        let vram = result.machine.vera().vram();
                        let from = base as usize;
                        let to = (from + dump).min(vram.len());
                        hex_dump(&mut out, base, &vram[from..to])?;
                    }
                    None => {
                        let end = result.machine.xy();
                        let len = if start >= addr::BANKED_RAM_START {
                            *dump
                        } else {
                            (*dump).min(end.saturating_sub(start) as usize)
                        };
                        hex_dump(&mut out, start as u32, &result.machine.peek(start, len))?;
                    }
                }
            }
        }

        Command::Dos { .. } => {
            render_reports(&mut out, &result.reports)?;
            writeln!(out, "{}", result.status)?;
        }

        _ => render_reports(&mut out, &result.reports)?,
    }

    Ok(())
}
