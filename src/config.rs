use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::discovery::default_input_pattern;
use crate::error::DumpError;
use crate::extractor::ExtractOptions;
use crate::models::{OutputFormat, WriteMode};
use crate::privacy::{RedactionPolicy, DEFAULT_PLACEHOLDER};
use crate::service::DumpConfig;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log output settings
    pub logging: LoggingConfig,
    /// Source selection and filters
    pub extract: ExtractConfig,
    /// Output file settings
    pub export: ExportConfig,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Directory-qualified path of a rolling JSON log file
    pub file_path: Option<String>,
    /// Console format, "json" or "text"
    pub format: String,
}

/// Source selection and filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Glob matching backup databases; empty means the platform default
    pub input_pattern: String,
    /// Keep only sent messages
    pub sent_only: bool,
    /// Keep only messages from this year
    pub year: Option<i32>,
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// "csv" or "json"
    pub format: String,
    /// Output path or prefix; the format's extension is added when missing
    pub output: String,
    /// "merge" or "create"
    pub mode: String,
    /// Replace message text with the placeholder
    pub redact_text: bool,
    /// Text written in place of redacted messages
    pub redaction_placeholder: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            extract: ExtractConfig {
                input_pattern: String::new(),
                sent_only: false,
                year: None,
            },
            export: ExportConfig {
                format: "csv".to_string(),
                output: "txt_messages".to_string(),
                mode: "merge".to_string(),
                redact_text: true,
                redaction_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    ///
    /// Defaults, then `config/default.*` and `config/local.*`, then the given
    /// file, then `IPHONE_DUMP_<SECTION>__<KEY>` environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default()).context("Failed to serialize default configuration")?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("IPHONE_DUMP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate extract config
        if let Some(year) = self.extract.year {
            InputValidator::validate_year(year)?;
        }

        // Validate export config
        self.export.format.parse::<OutputFormat>().map_err(|e| anyhow!(e))?;
        self.export.mode.parse::<WriteMode>().map_err(|e| anyhow!(e))?;
        InputValidator::validate_output_path(Path::new(&self.export.output))?;
        InputValidator::validate_placeholder(&self.export.redaction_placeholder)?;

        Ok(())
    }

    /// Resolve into the explicit options the dump service runs with
    pub fn to_dump_config(&self) -> crate::error::Result<DumpConfig> {
        let format: OutputFormat = self.export.format.parse().map_err(DumpError::InvalidConfig)?;
        let mode: WriteMode = self.export.mode.parse().map_err(DumpError::InvalidConfig)?;

        let input_pattern = if self.extract.input_pattern.trim().is_empty() {
            default_input_pattern()
        } else {
            self.extract.input_pattern.clone()
        };
        InputValidator::validate_input_pattern(&input_pattern)
            .map_err(|e| DumpError::InvalidConfig(e.to_string()))?;

        Ok(DumpConfig {
            input_pattern,
            output_path: format.resolve_path(&PathBuf::from(&self.export.output)),
            format,
            mode,
            extract: ExtractOptions {
                sent_only: self.extract.sent_only,
                year: self.extract.year,
            },
            redaction: RedactionPolicy {
                enabled: self.export.redact_text,
                placeholder: self.export.redaction_placeholder.clone(),
            },
        })
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
