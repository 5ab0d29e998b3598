use anyhow::Result;
use beacon_core::{
    client::BeaconClientBuilder, config::AppConfig, types::StateId, BeaconClient, ClientError,
};
use std::fmt::Display;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(config: &AppConfig) {
    let default_directives = format!(
        "warn,beacon_core={level},probe={level}",
        level = config.logging.level
    );
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json();
        registry.with(fmt_layer).init();
    } else {
        // "pretty" and any other format default to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("Shutdown signal received, cancelling queries");
    token.cancel();
}

fn report<T, D: Display>(query: &str, result: Result<T, ClientError>, describe: impl Fn(&T) -> D) {
    match result {
        Ok(value) => info!(query, result = %describe(&value), "query succeeded"),
        Err(e) => {
            for attempt in e.as_dispatch().map(|d| d.attempts()).unwrap_or_default() {
                debug!(
                    query,
                    backend = %attempt.backend,
                    error = %attempt.error,
                    "backend failure"
                );
            }
            error!(query, error = %e, "query failed");
        }
    }
}

async fn run(client: &BeaconClient, cancel: &CancellationToken) {
    report("fork", client.fork(cancel, StateId::Head).await, |fork| match fork {
        Some(fork) => format!("current_version={} epoch={}", fork.current_version, fork.epoch),
        None => "no fork for head state".to_string(),
    });

    report("spec", client.spec(cancel).await, |spec| {
        let slot = spec
            .duration("SECONDS_PER_SLOT")
            .map_or_else(|| "unknown".to_string(), |d| format!("{}s", d.as_secs()));
        format!("{} keys, seconds_per_slot={slot}", spec.len())
    });

    report("genesis", client.genesis(cancel).await, |genesis| {
        format!(
            "time={} fork_version={}",
            genesis.genesis_time.to_rfc3339(),
            genesis.genesis_fork_version
        )
    });

    report("node_version", client.node_version(cancel).await, Clone::clone);

    report("node_syncing", client.node_syncing(cancel).await, |state| {
        format!(
            "head_slot={} sync_distance={} syncing={}",
            state.head_slot, state.sync_distance, state.is_syncing
        )
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        AppConfig::load().map_err(|e| anyhow::anyhow!("Configuration loading failed: {e}"))?;

    init_logging(&config);
    info!("Starting beacon probe");
    debug!(
        backends = config.backends.len(),
        strategy = config.dispatch.strategy.as_str(),
        backend_timeout_ms = config.dispatch.backend_timeout_ms,
        "Configuration loaded"
    );

    let client = BeaconClientBuilder::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?
        .build();

    for identity in client.registry().identities() {
        if let Some(handle) = client.registry().get(&identity) {
            info!(backend = %identity, capabilities = %handle.capabilities(), "backend ready");
        }
    }

    let cancel = CancellationToken::new();
    let signal_handle = tokio::spawn(cancel_on_signal(cancel.clone()));

    run(&client, &cancel).await;

    signal_handle.abort();
    info!("Probe complete");

    Ok(())
}
