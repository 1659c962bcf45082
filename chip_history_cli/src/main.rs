//! # chip_history_cli
//!
//! Part of the chip_history crate family.
//!
//! Command line access to chip timelines and cross-day selections.
//!
//! ```bash
//! chip_history_cli -p config.yaml new
//! chip_history_cli -p config.yaml chips
//! chip_history_cli -p config.yaml history
//! chip_history_cli -p config.yaml sessions
//! chip_history_cli -p config.yaml combine --seqs 52,57,58
//! ```
//!
//! Cross-day selections are always given as seq values from the `history` output, never as
//! the index in a file name.
use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use serde::Serialize;
use std::path::{Path, PathBuf};

use libchip_history::config::Config;
use libchip_history::day_table::DayTable;
use libchip_history::error::ProcessorError;
use libchip_history::history::discover_chips;
use libchip_history::process::{build_chip_timeline, combine_selection, load_day_tables};

fn make_template_config(path: &Path) -> Result<(), ProcessorError> {
    Config::default().write_config_file(path)?;
    Ok(())
}

fn print_yaml<T: Serialize>(value: &T) -> Result<(), ProcessorError> {
    let yaml_str = serde_yaml::to_string(value)?;
    println!("{yaml_str}");
    Ok(())
}

/// Load the day tables behind a progress bar
fn load_with_progress(
    config: &Config,
    pb_manager: &MultiProgress,
) -> Result<Vec<DayTable>, ProcessorError> {
    let pb = pb_manager.add(ProgressBar::new(0));
    let result = load_day_tables(config, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish();
    result
}

fn run(
    matches: &ArgMatches,
    config_path: &Path,
    pb_manager: &MultiProgress,
) -> Result<(), ProcessorError> {
    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(config_path)?;
        log::info!("Done.");
        return Ok(());
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = Config::read_config_file(config_path)?;
    log::info!("Config successfully loaded.");
    log::info!("Raw Data Path: {}", config.raw_data_root.to_string_lossy());
    log::info!("Chip: {}", config.chip());

    match matches.subcommand() {
        Some(("chips", _)) => {
            let tables = load_with_progress(&config, pb_manager)?;
            for chip in discover_chips(&tables) {
                println!("{chip}");
            }
        }
        Some(("history", _)) => {
            let tables = load_with_progress(&config, pb_manager)?;
            let history = build_chip_timeline(&tables, &config.chip())?;
            print_yaml(&history)?;
        }
        Some(("sessions", _)) => {
            let tables = load_with_progress(&config, pb_manager)?;
            let history = build_chip_timeline(&tables, &config.chip())?;
            print_yaml(&history.sessions())?;
        }
        Some(("combine", sub_matches)) => {
            let seqs: Vec<u32> = sub_matches
                .get_many::<u32>("seqs")
                .map(|values| values.copied().collect())
                .unwrap_or_default();
            let pb = pb_manager.add(ProgressBar::new(0));
            let result = combine_selection(&config, &seqs, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
            pb.finish();
            print_yaml(&result?)?;
        }
        _ => log::warn!("No command given, nothing to do."),
    }
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("chip_history_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(Command::new("chips").about("List every chip found in the raw data"))
        .subcommand(Command::new("history").about("Print the chronological history of the chip"))
        .subcommand(Command::new("sessions").about("Print the sessions of the chip"))
        .subcommand(
            Command::new("combine")
                .about("Combine a cross-day selection of seq values into one table")
                .arg(
                    Arg::new("seqs")
                        .short('s')
                        .long("seqs")
                        .required(true)
                        .value_delimiter(',')
                        .value_parser(clap::value_parser!(u32))
                        .help("Comma separated seq values, e.g. 52,57,58"),
                ),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Show debug messages"),
        )
        .get_matches();

    // Initialize feedback
    let level = if matches.get_flag("verbose") {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    let logger = simplelog::TermLogger::new(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        std::process::exit(1);
    }
    log::set_max_level(level);

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration path is required (--path)");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&matches, &config_path, &pb_manager) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
