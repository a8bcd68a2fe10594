use std::process::ExitCode;
use std::sync::Arc;

use pagemagic_ai::{CssService, OpenRouterClient, OpenRouterConfig};
use pagemagic_app::{cli, commands, popup};
use pagemagic_config::{toml_loader, PageMagicConfig};
use pagemagic_storage::Storage;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "pagemagic=info";

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config comes first so its log level can seed the filter.
    let loaded = pagemagic_config::load_config(args.config.as_deref());

    let log_directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.directive(),
        (None, Err(_)) => DEFAULT_DIRECTIVE.to_string(),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| DEFAULT_DIRECTIVE.parse().unwrap()),
            ),
        )
        .init();

    tracing::debug!("PageMagic v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        PageMagicConfig::default()
    });

    let data_dir = match args.data_dir.or_else(|| config.storage.data_dir.clone()) {
        Some(dir) => dir,
        None => match toml_loader::default_data_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let storage = match Storage::open_dir(&data_dir).await {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to open storage in {}: {e}", data_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let client = match OpenRouterClient::new(OpenRouterConfig::from(&config.api)) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let service = Arc::new(CssService::new(client, &storage));
    service.initialize().await;

    let app = commands::App::new(storage, service);
    match app.run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{}", popup::format_error_message(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}
