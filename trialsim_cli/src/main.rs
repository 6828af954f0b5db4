use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trialsim_core::config::RunConfig;
use trialsim_core::*;

#[derive(Parser)]
#[command(name = "trialsim")]
#[command(about = "Exercise-arm body-composition trial simulator", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a virtual cohort and write the per-day table
    Run {
        /// Number of weeks to simulate
        #[arg(long)]
        weeks: Option<u32>,

        /// Participants per arm
        #[arg(long = "n")]
        participants: Option<usize>,

        /// Arms to simulate (control, low-intensity|liss, sprint-interval|sit, mixed)
        #[arg(long, num_args = 1..)]
        arms: Option<Vec<String>>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Match energy per session instead of time (`--energy-matched false`
        /// turns off a config-enabled setting); replaces overridden session costs
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        energy_matched: Option<bool>,

        /// Override output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List arms and their protocol parameters
    Arms,
}

fn main() -> Result<()> {
    trialsim_core::logging::init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run {
            weeks,
            participants,
            arms,
            seed,
            energy_matched,
            output_dir,
        } => {
            let mut run = config.run.clone();
            if let Some(weeks) = weeks {
                run.weeks = weeks;
            }
            if let Some(participants) = participants {
                run.participants = participants;
            }
            if let Some(arms) = arms {
                run.arms = arms;
            }
            if let Some(seed) = seed {
                run.seed = seed;
            }
            if let Some(energy_matched) = energy_matched {
                run.energy_matched = energy_matched;
            }

            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            cmd_run(&config, &run, output_dir)
        }
        Commands::Arms => cmd_arms(&config),
    }
}

fn cmd_run(config: &Config, run: &RunConfig, output_dir: PathBuf) -> Result<()> {
    let params = run.to_params()?;
    let catalog = config.catalog()?;

    let table_path = output_dir.join(output_file_name(&params));
    let mut sink = CsvSink::create(&table_path)?;
    run_trial_with(&params, &catalog, &mut sink)?;
    let manifest = sink.finish(&params, &catalog)?;

    tracing::debug!("Run {} finished", manifest.run_id);
    println!("Saved: {}", table_path.display());
    println!(
        "  {} rows, {} arms, seed {}",
        manifest.rows,
        params.arms.len(),
        params.seed
    );

    Ok(())
}

fn cmd_arms(config: &Config) -> Result<()> {
    let catalog = config.catalog()?;

    println!(
        "{:<16} {:<16} {:>10} {:>8} {:>8}  schedule",
        "arm", "session", "kcal", "epoc", "neat-"
    );
    for (arm, protocol) in catalog.iter() {
        let schedule = WeeklySchedule::for_arm(*arm);
        let days: String = schedule
            .days()
            .iter()
            .map(|d| if *d { 'x' } else { '.' })
            .collect();
        println!(
            "{:<16} {:<16} {:>10.1} {:>8.1} {:>8.2}  {}",
            arm.as_str(),
            format!("{:?}", protocol.session_type),
            protocol.session_kcal(),
            protocol.epoc_kcal(),
            protocol.neat_compensation(),
            days
        );
    }

    Ok(())
}
