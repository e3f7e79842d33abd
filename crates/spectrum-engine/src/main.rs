//! Command-line tools for the engine's file formats.
//!
//! The engine needs a CPU unit to run a machine, so the binary sticks to
//! what can be done without one: inspecting snapshots and tapes, converting
//! between snapshot formats and rendering a tape's signal to audio.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use format_sna::SnaSnapshot;
use format_spectrum_tap::TapFile;
use format_z80::Z80Snapshot;
use log::LevelFilter;
use spectrum_engine::{EngineConfig, EngineError, SnapshotFormat, capture, tape};

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

enum Command {
    Info(PathBuf),
    TapeWav { input: PathBuf, output: PathBuf },
    Convert { input: PathBuf, output: PathBuf },
}

struct CliArgs {
    command: Command,
    config_path: Option<PathBuf>,
    log_level: LevelFilter,
}

fn usage() -> ! {
    eprintln!("Usage: spectrum-engine [OPTIONS] <COMMAND>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>                  Describe a .sna, .z80 or .tap file");
    eprintln!("  tape-wav <in.tap> <out.wav>  Render a tape's loading signal to WAV");
    eprintln!("  convert <in> <out>           Convert between .sna and .z80 snapshots");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>  JSON engine configuration");
    eprintln!("  -v               Debug logging");
    eprintln!("  -q               Errors only");
    process::exit(1);
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut log_level = LevelFilter::Info;
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = args.get(i).map(PathBuf::from);
            }
            "-v" => log_level = LevelFilter::Debug,
            "-q" => log_level = LevelFilter::Error,
            "--help" | "-h" => usage(),
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {other}");
                usage();
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let path = |n: usize| positional.get(n).map(PathBuf::from);
    let command = match (positional.first().map(String::as_str), path(1), path(2)) {
        (Some("info"), Some(file), None) => Command::Info(file),
        (Some("tape-wav"), Some(input), Some(output)) => Command::TapeWav { input, output },
        (Some("convert"), Some(input), Some(output)) => Command::Convert { input, output },
        _ => usage(),
    };

    CliArgs {
        command,
        config_path,
        log_level,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn info(path: &Path) -> Result<(), EngineError> {
    let is_tap = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tap"));
    let data = fs::read(path)?;

    if is_tap {
        tape_info(&TapFile::parse(&data)?);
        return Ok(());
    }

    match SnapshotFormat::from_path(path)? {
        SnapshotFormat::Sna => {
            let sna = SnaSnapshot::parse(&data)?;
            let regs = &sna.registers;
            println!("SNA 48K snapshot");
            println!(
                "  SP=${:04X} stacked PC={} IM{} IFF={} border {}",
                regs.sp.word(),
                sna.stacked_pc()
                    .map_or_else(|| "(in ROM)".to_string(), |pc| format!("${pc:04X}")),
                regs.im,
                regs.iff1,
                sna.border
            );
        }
        SnapshotFormat::Z80 => {
            let z80 = Z80Snapshot::parse(&data)?;
            let regs = &z80.registers;
            println!("Z80 {:?} snapshot, hardware mode {}", z80.version, z80.hardware_mode);
            println!(
                "  PC=${:04X} SP=${:04X} IM{} IFF={}",
                regs.pc.word(),
                regs.sp.word(),
                regs.im,
                regs.iff1
            );
            for block in &z80.blocks {
                println!("  {} bytes at ${:04X}", block.data.len(), block.address);
            }
        }
    }
    Ok(())
}

fn tape_info(tap: &TapFile) {
    println!("TAP image, {} blocks", tap.blocks.len());
    for (index, block) in tap.blocks.iter().enumerate() {
        let checksum = if block.checksum_valid() { "ok" } else { "BAD" };
        match block.header() {
            Some(header) => println!(
                "  {index:3}: header {:?} \"{}\" length {} param1 {} param2 {} [{checksum}]",
                header.kind, header.name, header.data_length, header.param1, header.param2
            ),
            None => println!(
                "  {index:3}: flag ${:02X}, {} bytes [{checksum}]",
                block.flag(),
                block.len()
            ),
        }
    }
}

fn tape_wav(input: &Path, output: &Path, config: &EngineConfig) -> Result<(), EngineError> {
    let image = tape::read_image(input)?;
    let tap = TapFile::parse(&image)?;
    capture::save_tape_audio(&tap, config, output)?;
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<(), EngineError> {
    let from = SnapshotFormat::from_path(input)?;
    let to = SnapshotFormat::from_path(output)?;
    let data = fs::read(input)?;

    let bytes = match (from, to) {
        (SnapshotFormat::Sna, SnapshotFormat::Sna) => SnaSnapshot::parse(&data)?.to_bytes(),
        (SnapshotFormat::Sna, SnapshotFormat::Z80) => {
            Z80Snapshot::from_sna(&SnaSnapshot::parse(&data)?)?.to_v3_bytes()
        }
        (SnapshotFormat::Z80, SnapshotFormat::Sna) => {
            Z80Snapshot::parse(&data)?.to_sna()?.to_bytes()
        }
        (SnapshotFormat::Z80, SnapshotFormat::Z80) => Z80Snapshot::parse(&data)?.to_v3_bytes(),
    };

    fs::write(output, &bytes)?;
    log::info!(
        "{} ({from:?}) -> {} ({to:?}), {} bytes",
        input.display(),
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn run(cli: &CliArgs) -> Result<(), EngineError> {
    let config = match &cli.config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match &cli.command {
        Command::Info(path) => info(path),
        Command::TapeWav { input, output } => tape_wav(input, output, &config),
        Command::Convert { input, output } => convert(input, output),
    }
}

fn main() {
    let cli = parse_args();

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(cli.log_level)
        .init()
    {
        eprintln!("Failed to start logging: {e}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
