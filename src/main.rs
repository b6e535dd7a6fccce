//! Headless front end: loads a cartridge image, runs it for a number of
//! frames (or forever) and forwards serial output to stdout. Video and audio
//! devices are deliberately absent; this binary exists to run test programs
//! and to exercise the core from the command line.

use std::fs::read;
use std::io::Write;

use anyhow::{Context, Result};
use gumdrop::Options;
use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode};

use ferroboi_core::hardware::apu::audio_buffer::NullSink;
use ferroboi_core::{Emulator, EmulatorOptions};

#[derive(Options, Debug)]
struct AppOptions {
    /// Print this help message
    #[options()]
    help: bool,
    /// The path to the rom which you want to run
    #[options(free, required)]
    rom_path: String,
    /// How many frames to run before exiting; 0 runs forever
    #[options(default = "600")]
    frames: u64,
    /// Emit a PC / opcode / mnemonic line per executed instruction
    #[options()]
    trace: bool,
    /// Log verbosity: off, error, warn, info, debug or trace
    #[options(default = "warn")]
    log_level: LevelFilter,
}

fn main() {
    let options: AppOptions = AppOptions::parse_args_default_or_exit();

    TermLogger::init(options.log_level, Config::default(), TerminalMode::Mixed)
        .expect("Failed to initialise the logger!");

    if let Err(error) = run(options) {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}

fn run(options: AppOptions) -> Result<()> {
    let rom = read(&options.rom_path).with_context(|| format!("Failed to read {}", options.rom_path))?;

    let emulator_options = EmulatorOptions::new()
        // No audio device is attached, so the mixer must never block.
        .with_audio_sink(Box::new(NullSink))
        .with_serial_hook(Box::new(|byte| {
            print!("{}", byte as char);
            let _ = std::io::stdout().flush();
        }));

    let mut emulator =
        Emulator::new(&rom, emulator_options).context("Failed to load the cartridge")?;
    emulator.set_tracing(options.trace);

    log::info!("Running [{}]", emulator.game_title());

    let mut frames_run = 0u64;
    loop {
        emulator.step_frame();
        frames_run += 1;
        if options.frames != 0 && frames_run >= options.frames {
            break;
        }
    }

    log::info!(
        "Finished after {} frames ({} machine cycles)",
        frames_run,
        emulator.cycles_performed() / 4
    );

    Ok(())
}
