use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use iphone_messages_dump::config::AppConfig;
use iphone_messages_dump::logging::init_logging;
use iphone_messages_dump::merge::MergeOutcome;
use iphone_messages_dump::validation::InputValidator;
use iphone_messages_dump::DumpService;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump messages from backup databases to CSV or JSON
    Dump(DumpArgs),
    /// List the backup databases the input pattern matches
    Sources {
        /// Glob matching backup databases (defaults to the platform backup folder)
        #[arg(short, long)]
        input_pattern: Option<String>,
    },
}

#[derive(Args)]
struct DumpArgs {
    /// Glob matching backup databases (defaults to the platform backup folder)
    #[arg(short, long)]
    input_pattern: Option<String>,

    /// Output file or prefix; the format's extension is added when missing
    #[arg(short, long)]
    output: Option<String>,

    /// Output format (csv or json)
    #[arg(short, long, value_parser = ["csv", "json"])]
    format: Option<String>,

    /// Only keep messages you sent
    #[arg(short, long)]
    sent_only: bool,

    /// Only keep messages from this year (UTC)
    #[arg(short, long)]
    year: Option<i32>,

    /// Write real message text instead of the redaction placeholder
    #[arg(long)]
    include_text: bool,

    /// Text written in place of redacted messages
    #[arg(long)]
    placeholder: Option<String>,

    /// merge: add new messages to an existing output; create: refuse to touch it
    #[arg(short, long, value_parser = ["merge", "create"])]
    mode: Option<String>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }

    // Initialize logging
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    info!("Starting iphone-messages-dump");

    let result = match &cli.command {
        Commands::Dump(args) => dump_messages(config, args),
        Commands::Sources { input_pattern } => list_sources(config, input_pattern.as_deref()),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

/// Dump messages according to configuration and flags
fn dump_messages(mut config: AppConfig, args: &DumpArgs) -> Result<()> {
    apply_dump_args(&mut config, args)?;
    config.validate()?;

    let service = DumpService::new(config.to_dump_config()?);
    let summary = service
        .run()
        .with_context(|| format!("Failed to dump messages to {}", service.config().output_path.display()))?;

    info!(
        "found {} skipped {} across {} backup file(s)",
        summary.stats.found,
        summary.stats.skipped(),
        summary.sources.len()
    );
    match summary.outcome {
        MergeOutcome::Created(n) => info!("Wrote {} messages to {}", n, service.config().output_path.display()),
        MergeOutcome::Appended(n) => info!("Appended {} new messages to {}", n, service.config().output_path.display()),
        MergeOutcome::UpToDate => info!("No new messages; {} unchanged", service.config().output_path.display()),
    }

    Ok(())
}

/// Log every matched backup database with its detected schema
fn list_sources(mut config: AppConfig, input_pattern: Option<&str>) -> Result<()> {
    if let Some(pattern) = input_pattern {
        config.extract.input_pattern = pattern.to_string();
    }

    let service = DumpService::new(config.to_dump_config()?);
    for source in service.list_sources()? {
        match source.schema {
            Some(schema) => info!("{} ({} schema)", source.path.display(), schema.as_str()),
            None => warn!("{} (unrecognized)", source.path.display()),
        }
    }

    Ok(())
}

/// Command-line flags win over every configuration source
fn apply_dump_args(config: &mut AppConfig, args: &DumpArgs) -> Result<()> {
    if let Some(pattern) = &args.input_pattern {
        InputValidator::validate_input_pattern(pattern)?;
        config.extract.input_pattern.clone_from(pattern);
    }
    if let Some(output) = &args.output {
        config.export.output.clone_from(output);
    }
    if let Some(format) = &args.format {
        config.export.format.clone_from(format);
    }
    if let Some(mode) = &args.mode {
        config.export.mode.clone_from(mode);
    }
    if args.sent_only {
        config.extract.sent_only = true;
    }
    if let Some(year) = args.year {
        InputValidator::validate_year(year)?;
        config.extract.year = Some(year);
    }
    if args.include_text {
        config.export.redact_text = false;
    }
    if let Some(placeholder) = &args.placeholder {
        config.export.redaction_placeholder.clone_from(placeholder);
    }

    Ok(())
}
