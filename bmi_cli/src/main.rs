mod chart;

use bmi_core::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bmitrack")]
#[command(about = "BMI calculator with per-user history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate BMI and save it to the user's history
    Record {
        /// Username (created on first use)
        #[arg(long)]
        user: String,

        /// Weight in kilograms
        #[arg(long, allow_hyphen_values = true)]
        weight: String,

        /// Height in meters (e.g. 1.75)
        #[arg(long, allow_hyphen_values = true)]
        height: String,

        /// Dry run - show the result without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// List a user's saved measurements (newest first)
    History {
        #[arg(long)]
        user: String,

        /// List oldest first instead
        #[arg(long)]
        oldest_first: bool,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all known users
    Users,

    /// Draw a BMI trend chart for a user
    Chart {
        #[arg(long)]
        user: String,

        /// Chart height in text rows
        #[arg(long, default_value_t = 12)]
        rows: usize,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    bmi_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_invalid_input() => {
            eprintln!("Input error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Commands::Record {
            user,
            weight,
            height,
            dry_run,
        } => cmd_record(&config, &user, &weight, &height, dry_run),
        Commands::History {
            user,
            oldest_first,
            json,
        } => cmd_history(&config, &user, oldest_first, json),
        Commands::Users => cmd_users(&config),
        Commands::Chart { user, rows } => cmd_chart(&config, &user, rows),
    }
}

fn open_store(config: &Config) -> Result<MeasurementStore> {
    // Ensure data directory exists
    std::fs::create_dir_all(&config.data.data_dir)?;
    MeasurementStore::from_config(config)
}

fn cmd_record(
    config: &Config,
    user: &str,
    weight: &str,
    height: &str,
    dry_run: bool,
) -> Result<()> {
    // Reject bad input before the database is opened
    let input = validate_input(user, weight, height)?;
    let measurement = assess(input.weight_kg, input.height_m)?;

    display_measurement(&measurement);

    if dry_run {
        println!("\n[Dry run - not saving measurement]");
        return Ok(());
    }

    let mut store = open_store(config)?;
    store.record_measurement(&input.username, &measurement)?;
    store.close()?;

    println!("\n✓ Measurement saved for {}", input.username);
    Ok(())
}

fn cmd_history(config: &Config, user: &str, oldest_first: bool, json: bool) -> Result<()> {
    let user = validation::validate_username(user)?;
    let order = if oldest_first {
        HistoryOrder::Ascending
    } else {
        HistoryOrder::Descending
    };

    let store = open_store(config)?;
    let records = store.history(user, order)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No BMI records found for this user.");
        return Ok(());
    }

    println!(
        "{:<17}  {:>11}  {:>10}  {:>6}  Category",
        "Date", "Weight (kg)", "Height (m)", "BMI"
    );
    for record in &records {
        println!(
            "{:<17}  {:>11.2}  {:>10.2}  {:>6.2}  {}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.weight_kg,
            record.height_m,
            record.bmi,
            record.category
        );
    }
    Ok(())
}

fn cmd_users(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let mut users = store.list_users()?;

    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }

    users.sort();
    for user in users {
        println!("{}", user);
    }
    Ok(())
}

fn cmd_chart(config: &Config, user: &str, rows: usize) -> Result<()> {
    let user = validation::validate_username(user)?;
    let store = open_store(config)?;
    let records = store.get_history(user)?;

    if records.is_empty() {
        println!("No BMI records found for this user.");
        return Ok(());
    }

    let series = TrendSeries::from_records(&records);
    println!("BMI Trend for {}\n", user);
    print!("{}", chart::render(&series, rows));
    Ok(())
}

fn display_measurement(measurement: &Measurement) {
    println!("BMI: {:.2}", measurement.bmi());
    println!("Category: {}", measurement.category());
}
