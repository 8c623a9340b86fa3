pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::Settings;
use pipeline::classification::{ClassificationError, YandexGptClient, YandexGptConfig};
use pipeline::{PipelineConfig, PipelineError, PipelineRunner, RunOutcome};
use storage::LocalObjectStore;

/// Anything that stops a run before or during the pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Completion client error: {0}")]
    Client(#[from] ClassificationError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// One pipeline pass wired from the environment: local store, remote model.
pub fn run() -> Result<RunOutcome, AppError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env()?;
    tracing::info!(
        store_root = %settings.store_root.display(),
        endpoint = %settings.endpoint,
        max_source_files = settings.max_source_files,
        "Settings loaded"
    );

    let store = LocalObjectStore::new(settings.store_root.clone());
    let llm = YandexGptClient::new(
        YandexGptConfig::new(settings.credentials.clone()).with_endpoint(&settings.endpoint),
    )?;

    let pipeline_config = PipelineConfig {
        max_source_files: settings.max_source_files,
        ..PipelineConfig::default()
    };

    let outcome = PipelineRunner::new(&store, &llm, pipeline_config).run()?;
    Ok(outcome)
}
