use std::{process, sync::Arc};

use agency_content::{
    application::{content::ContentService, error::AppError, page_data::PageDataService},
    cache::{AssetWorker, CachePolicy},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        network::HttpNetwork,
        store::StoreClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Manifest(args) => run_manifest(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = StoreClient::read_only(&settings.store)?;
    info!(
        endpoint = %store.endpoint(),
        mode = ?settings.mode,
        "document store client ready"
    );

    let pages = PageDataService::new(ContentService::new(Arc::new(store)));

    let network = Arc::new(HttpNetwork::new()?);
    let policy = CachePolicy::from_settings(&settings.worker);
    let worker = if settings.worker.enabled {
        AssetWorker::new(policy, network)
    } else {
        info!("asset worker disabled, requests pass straight to the network");
        AssetWorker::disabled(policy, network)
    };

    let state = HttpState::new(pages, worker);
    let worker = Arc::clone(&state.worker);
    let result = serve_http(&settings, state).await;

    worker.settle().await;
    result
}

async fn run_manifest(
    settings: config::Settings,
    args: config::ManifestArgs,
) -> Result<(), AppError> {
    let manifest = CachePolicy::from_settings(&settings.worker).manifest();
    let json = serde_json::to_string_pretty(&manifest).map_err(InfraError::from)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, format!("{json}\n"))
                .await
                .map_err(InfraError::from)?;
            info!(path = %path.display(), rules = manifest.rules.len(), "cache manifest written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
