use log::{debug, error, info};
use sfall_bridge::program::Program;
use sfall_bridge::script::{parse_script, run_script};
use sfall_bridge::settings::{BridgeSettings, DEFAULT_SETTINGS_FILE};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn print_usage(program_name: &str) {
    println!("sfall-bridge - run extension opcode scripts against an in-memory interpreter");
    println!();
    println!("Usage: {} <script_file> [--config settings.toml]", program_name);
    println!();
    println!("Without --config, {} is read from the working directory if present.", DEFAULT_SETTINGS_FILE);
    println!("Set RUST_LOG=debug to trace every opcode.");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Exit with success status since the user is asking for help
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        return Ok(());
    }

    let script_path = PathBuf::from(&args[1]);

    let mut config_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
    let mut explicit_config = false;
    if args.len() >= 4 && args[2] == "--config" {
        config_path = PathBuf::from(&args[3]);
        explicit_config = true;
    } else if args.len() > 2 {
        print_usage(&args[0]);
        return Err(format!("Unexpected arguments: {}", args[2..].join(" ")).into());
    }

    let settings = if explicit_config {
        BridgeSettings::load(&config_path)?
    } else {
        BridgeSettings::load_or_default(&config_path)?
    };

    let level = settings.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("Settings: {:?}", settings);

    let text = match fs::read_to_string(&script_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Cannot read script '{}': {}", script_path.display(), e);
            std::process::exit(1);
        }
    };

    let commands = parse_script(&text)?;
    info!("Loaded {} commands from {}", commands.len(), script_path.display());

    let mut program = Program::from_settings(&settings);
    let stdout = io::stdout();
    let result = run_script(&mut program, &commands, &mut stdout.lock());

    if let Err(e) = result {
        error!("Script stopped: {}", e);
        eprintln!("\nError during execution: {e}");
        std::process::exit(1);
    }

    for message in program.debug_output() {
        info!("debug: {}", message);
    }

    Ok(())
}
