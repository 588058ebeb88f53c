//! `inventory-sync`: follow the configured inventory backend and log
//! snapshot summaries until interrupted.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use inventory::config::{Backend, InventorySettings};
use inventory::domain::{InventoryService, InventorySnapshot, low_stock};
use inventory::outbound::local::LocalInventoryStore;
use inventory::outbound::rest::{RestClient, RestInventoryStore};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        InventorySettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(settings))
}

async fn run(settings: InventorySettings) -> Result<()> {
    match settings.backend()? {
        Backend::Local => run_local(&settings).await,
        Backend::Remote => run_remote(&settings).await,
    }
}

async fn run_local(settings: &InventorySettings) -> Result<()> {
    let data_dir = settings.data_dir();
    let store = LocalInventoryStore::open_path(&data_dir, Arc::new(DefaultClock))
        .wrap_err_with(|| format!("failed to open local store at {data_dir}"))?;
    let service = InventoryService::new(Arc::new(store), Arc::new(DefaultClock));
    let snapshot = service.snapshot().await?;
    log_summary("local", &snapshot);
    Ok(())
}

async fn run_remote(settings: &InventorySettings) -> Result<()> {
    let client = RestClient::new(settings.rest_client_config()?)?;
    let store = Arc::new(RestInventoryStore::new(client));
    let service = InventoryService::new(Arc::clone(&store), Arc::new(DefaultClock));

    match service.snapshot().await {
        Ok(snapshot) => log_summary("remote", &snapshot),
        Err(error) => warn!(%error, "initial snapshot failed; waiting for the next poll"),
    }

    let subscription = store.subscribe(settings.poll_interval(), |snapshot| {
        log_summary("remote", &snapshot);
    });
    info!(
        interval_ms = settings.poll_interval().as_millis(),
        "polling remote inventory; press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for Ctrl-C")?;
    subscription.cancel();
    info!("polling stopped");
    Ok(())
}

fn log_summary(backend: &str, snapshot: &InventorySnapshot) {
    info!(
        backend,
        products = snapshot.products.len(),
        transactions = snapshot.transactions.len(),
        staged = snapshot.staging.len(),
        low_stock = low_stock(&snapshot.products).len(),
        "inventory snapshot"
    );
}
