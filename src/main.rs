#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use log::info;

use pipe_sched::common::{Config, Cycle, DEFAULT_LATENCY, DEFAULT_REG_COUNT};
use pipe_sched::system::system::{schedule_to_string, System};

#[derive(Parser, Debug)]
#[command(version, about = "Schedules register-transfer instructions onto a single-issue pipeline", long_about = None)]
struct SchedulerArgs {
    input_file: PathBuf,
    #[arg(long, short, default_value_t = DEFAULT_REG_COUNT, help = "Number of architectural registers (R0..R<n-1>)")]
    registers: usize,
    #[arg(long, short, default_value_t = DEFAULT_LATENCY, help = "Cycles until a result is fully available")]
    latency: Cycle,
    #[arg(long, help = "Skip the slot-filling reorder pass")]
    no_reorder: bool,
    #[arg(long, help = "Also print the schedule as issued, before reordering")]
    show_issued: bool,
    #[arg(long, help = "Print run statistics")]
    stats: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Verbose logging, repeat for more")]
    verbose: u8,
}

struct SchedulerOptions {
    input_path: PathBuf,
    config: Config,
    show_issued: bool,
    stats: bool,
    log_level: &'static str,
}

impl From<SchedulerArgs> for SchedulerOptions {
    fn from(value: SchedulerArgs) -> Self {
        let log_level = match value.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        SchedulerOptions {
            input_path: value.input_file,
            config: Config {
                register_count: value.registers,
                latency: value.latency,
                reorder: !value.no_reorder,
            },
            show_issued: value.show_issued,
            stats: value.stats,
            log_level,
        }
    }
}

fn read_input(opts: &SchedulerOptions) -> Result<String> {
    let path = opts.input_path.canonicalize()?;
    info!("Reading in file: {}", path.display());
    let data = std::fs::read_to_string(path)?;
    Ok(data)
}

fn schedule(opts: &SchedulerOptions) -> Result<()> {
    let system = System::new(opts.config)?;
    let conts = read_input(opts)?;
    let report = system.run_text(&conts)?;

    if opts.show_issued {
        println!("Issued:");
        print!("{}", schedule_to_string(&report.issued));
        println!();
        println!("Reordered:");
    }
    print!("{report}");
    if opts.stats {
        println!();
        println!("{}", report.stats);
    }

    Ok(())
}

fn main() {
    let args = SchedulerArgs::parse();
    let opts: SchedulerOptions = args.into();

    // the handle has to outlive every log call
    let _logger = match flexi_logger::Logger::try_with_env_or_str(opts.log_level)
        .and_then(flexi_logger::Logger::start)
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: failed to start logger: {e}");
            None
        }
    };

    if let Err(e) = schedule(&opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
