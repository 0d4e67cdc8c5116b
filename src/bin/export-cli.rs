//! # Export CLI
//!
//! Command-line interface for triggering exports against the export service
//! and inspecting the effective configuration.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use export_orchestrator::client::ExportApiClient;
use export_orchestrator::config::{ConfigManager, ConfigurationError};
use export_orchestrator::logging::init_structured_logging_with;
use export_orchestrator::models::{ExportArtifact, ExportFormat, ResourceKey, ResourceKind};
use export_orchestrator::orchestration::{ExportOrchestrator, LoggingOpener, TracingNotifier};
use export_orchestrator::{ExportOutcome, ExporterConfig};

#[derive(Parser, Debug)]
#[command(name = "export-cli")]
#[command(about = "Trigger and track asynchronous exports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: <config-dir>/export-orchestrator.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration directory (default: EXPORT_CONFIG_DIR or ./config)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Environment whose overrides apply (default: EXPORT_ENV, APP_ENV or development)
    #[arg(short, long)]
    environment: Option<String>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export a dashboard or insight and wait for the artifact
    Export {
        /// Dashboard id
        #[arg(long)]
        dashboard: Option<u64>,
        /// Insight id
        #[arg(long)]
        insight: Option<u64>,
        /// Resource kind, used together with --id
        #[arg(long, requires = "id", conflicts_with_all = ["dashboard", "insight"])]
        kind: Option<ResourceKind>,
        /// Resource id, used together with --kind
        #[arg(long, requires = "kind", conflicts_with_all = ["dashboard", "insight"])]
        id: Option<String>,
        /// Artifact format (png, pdf, csv); overrides the configured format
        #[arg(short, long)]
        format: Option<ExportFormat>,
        /// Download the finished artifact to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<(ExporterConfig, serde_json::Value)> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);

    let loaded = match &cli.config {
        Some(path) => Some(ConfigManager::load_from_file_with_env(path, &environment)?),
        None => match ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        {
            Ok(manager) => Some(manager),
            Err(ConfigurationError::ConfigFileNotFound { searched_paths }) => {
                warn!(?searched_paths, "No configuration file found, using defaults");
                None
            }
            Err(e) => return Err(e.into()),
        },
    };

    Ok(match loaded {
        Some(manager) => (manager.config().clone(), manager.debug_config()),
        None => {
            let config = ExporterConfig::default();
            let sanitized = ConfigManager::sanitize_config_for_logging(&config);
            (config, sanitized)
        }
    })
}

fn resource_key(
    dashboard: Option<u64>,
    insight: Option<u64>,
    kind: Option<ResourceKind>,
    id: Option<String>,
) -> anyhow::Result<ResourceKey> {
    let key = match (kind, id) {
        (Some(kind), Some(id)) => ResourceKey::resource(kind, id)?,
        (None, None) => ResourceKey::from_ids(dashboard, insight)?,
        _ => bail!("--kind and --id must be given together"),
    };
    Ok(key)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, sanitized) = load_config(&cli)?;

    let level = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    init_structured_logging_with(Some(&level), config.logging.json);

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&sanitized)?);
            Ok(())
        }
        Commands::Export {
            dashboard,
            insight,
            kind,
            id,
            format,
            output,
        } => {
            let key = resource_key(dashboard, insight, kind, id)?;

            let mut settings = config.orchestrator_settings();
            if let Some(format) = format {
                settings.export_format = format;
            }

            let client = Arc::new(
                ExportApiClient::new(config.api_config())
                    .context("Failed to build export API client")?,
            );
            let orchestrator = ExportOrchestrator::new(
                client.clone(),
                Arc::new(TracingNotifier),
                Arc::new(LoggingOpener),
                settings,
            );

            info!(resource = %key, base_url = %config.backend.base_url, "Export CLI starting");

            let outcome = orchestrator
                .export_item(
                    key,
                    Some(Box::new(|artifact: &ExportArtifact| {
                        println!("{}", artifact.url)
                    })),
                )
                .await;

            match outcome {
                ExportOutcome::Succeeded(artifact) => {
                    if let Some(path) = output {
                        let bytes = client
                            .download_artifact(&artifact.url, &path)
                            .await
                            .with_context(|| format!("Failed to download {}", artifact.url))?;
                        info!(path = %path.display(), bytes, "Artifact saved");
                    }
                    Ok(())
                }
                ExportOutcome::Failed { error } => bail!("Export failed: {error}"),
            }
        }
    }
}
