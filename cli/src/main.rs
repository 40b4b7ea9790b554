use std::fs;
use std::io::Read;
use std::path::PathBuf;

use chara_card_core::{classify_as_canonical, classify_as_legacy};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod check;
mod config;
mod report;

use check::{collect_card_paths, run_check, summary_to_table};
use config::{CheckConfig, CheckTarget};
use report::{
    BackfillStyle, OutputFormat, Report, backfill_report, format_examples, format_report,
    upgrade_report, validation_report,
};

#[derive(Debug, Parser)]
#[command(name = "chara-card")]
#[command(about = "Validate, backfill and upgrade V1/V2 character cards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a card is a valid V2 card.
    Validate(InputArgs),
    /// Backfill V1 fields in a V2 card.
    Backfill(BackfillArgs),
    /// Upgrade a V1 card to V2.
    Upgrade(InputArgs),
    /// Print example valid cards.
    Examples(ExamplesArgs),
    /// Classify card files and directories in bulk.
    Check(CheckArgs),
    /// Write a default check configuration file.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Card JSON file; reads stdin when omitted.
    input: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct BackfillArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Fill V1 fields with an obsolescence notice instead of the V2 values.
    #[arg(long)]
    notice: bool,
}

#[derive(Debug, Args)]
struct ExamplesArgs {
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Card files and/or directories containing card JSON files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Path to a check configuration YAML file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured target format.
    #[arg(long)]
    target: Option<CheckTarget>,
    /// Output format (text prints a table).
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination YAML path.
    output: PathBuf,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Backfill(args) => run_backfill(args),
        Command::Upgrade(args) => run_upgrade(args),
        Command::Examples(args) => run_examples(args),
        Command::Check(args) => run_check_command(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&PathBuf>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(text)
        }
    }
}

fn emit(report: &Report, format: OutputFormat) -> Result<(), String> {
    print!("{}", format_report(report, format)?);
    if report.is_valid() {
        Ok(())
    } else {
        Err("input is not a valid card".to_string())
    }
}

fn run_validate(args: InputArgs) -> Result<(), String> {
    let text = read_input(args.input.as_ref())?;
    let result = classify_as_canonical(&text);
    debug!(valid = result.is_valid(), "classified input as V2");
    emit(&validation_report(&result), args.format)
}

fn run_backfill(args: BackfillArgs) -> Result<(), String> {
    let text = read_input(args.input.input.as_ref())?;
    let style = if args.notice {
        BackfillStyle::Notice
    } else {
        BackfillStyle::Mirrored
    };
    let report = backfill_report(&classify_as_canonical(&text), style)?;
    emit(&report, args.input.format)
}

fn run_upgrade(args: InputArgs) -> Result<(), String> {
    let text = read_input(args.input.as_ref())?;
    let result = classify_as_legacy(&text);
    debug!(valid = result.is_valid(), "classified input as V1");
    emit(&upgrade_report(&result)?, args.format)
}

fn run_examples(args: ExamplesArgs) -> Result<(), String> {
    print!("{}", format_examples(args.format)?);
    Ok(())
}

fn run_check_command(args: CheckArgs) -> Result<(), String> {
    let mut config = match args.config {
        Some(ref path) => CheckConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => CheckConfig::default(),
    };
    if let Some(target) = args.target {
        config.policy.target = target;
    }

    let paths = collect_card_paths(&args.inputs, &config)?;
    let summary = run_check(&paths, &config);

    match args.format {
        OutputFormat::Text => print!("{}", summary_to_table(&summary)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&summary)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            print!("{yaml}");
        }
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(format!("{} card(s) failed the check", summary.failed))
    }
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            args.output.display()
        ));
    }
    CheckConfig::default()
        .save(&args.output)
        .map_err(|e| format!("Failed to write config '{}': {e}", args.output.display()))?;
    println!("Wrote default check config to '{}'.", args.output.display());
    Ok(())
}
