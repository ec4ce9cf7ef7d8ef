use anyhow::{Context, Result};
use clap::Parser;
use emu_chip8::{Chip8Config, Chip8System};
use emu_core::logging::{LogConfig, LogLevel};
use emu_core::System;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Run a CHIP-8 program headless and print its screen")]
struct Args {
    /// Path to the program (.ch8)
    rom: PathBuf,

    /// Number of 1/60 s ticks to run
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Instructions per second
    #[arg(long, default_value_t = emu_chip8::constants::DEFAULT_IPS)]
    ips: u32,

    /// Disable phosphor decay in the rendered frame
    #[arg(long, default_value_t = false)]
    no_decay: bool,

    /// Hold a keypad key (0-F) for the whole run; repeatable
    #[arg(long = "key", value_parser = parse_key)]
    keys: Vec<u8>,

    /// Restore this JSON save state before running
    #[arg(long)]
    load: Option<PathBuf>,

    /// Dump save-state to this file as JSON after running
    #[arg(long)]
    save: Option<PathBuf>,

    /// Core log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Suppress the screen dump (still writes --save)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn parse_key(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    match u8::from_str_radix(digits, 16) {
        Ok(key) if key <= 0xF => Ok(key),
        _ => Err(format!("{:?} is not a keypad key (0-F)", s)),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Core logs stay off unless asked for; per-instruction tracing is very noisy.
    if let Some(name) = args.log_level.as_deref() {
        let level =
            LogLevel::from_str(name).with_context(|| format!("unknown log level {:?}", name))?;
        LogConfig::global().set_global_level(level);
    }

    let rom = fs::read(&args.rom)
        .with_context(|| format!("failed to read program {}", args.rom.display()))?;

    let mut sys = Chip8System::with_config(Chip8Config {
        ips: args.ips,
        decay_enabled: !args.no_decay,
        ..Chip8Config::default()
    });
    sys.mount("Program", &rom)?;
    log::info!("mounted {} ({} bytes)", args.rom.display(), rom.len());

    if let Some(path) = args.load.as_ref() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read save state {}", path.display()))?;
        let state: serde_json::Value = serde_json::from_str(&text)?;
        sys.load_state(&state)
            .with_context(|| format!("failed to load save state {}", path.display()))?;
        log::info!("restored save state from {}", path.display());
    }

    for &key in &args.keys {
        sys.set_key(key, true);
    }

    for tick in 1..=args.ticks {
        sys.run_tick()
            .with_context(|| format!("machine stopped during tick {}", tick))?;
    }
    let frame = sys.render();

    if !args.quiet {
        let machine = sys.machine();
        print!("{}", machine.framebuffer().to_text());
        println!(
            "Frame {}x{} after {} ticks: pc={:#05X} i={:#05X} delay={} sound={}",
            frame.width,
            frame.height,
            args.ticks,
            machine.pc(),
            machine.index(),
            machine.delay_timer(),
            machine.sound_timer()
        );
        println!("V: {:02X?}", machine.registers());
    }

    if let Some(path) = args.save.as_ref() {
        let state = sys.save_state();
        let mut f = File::create(path)?;
        write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
        log::info!("wrote save state to {}", path.display());
    }

    Ok(())
}
