// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `colloquy serve` implementation.
//!
//! Opens storage, then runs the gateway, the outbox dispatcher and the
//! command intake workers until SIGINT/SIGTERM, and shuts them down in
//! that order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use colloquy_config::model::{ColloquyConfig, LogFormat};
use colloquy_core::{ColloquyError, PluginAdapter, StorageAdapter};
use colloquy_engine::{CommandIntake, DialogueEngine, OutboxDispatcher, shutdown};
use colloquy_gateway::{GatewayState, HealthState, ServerConfig};
use colloquy_storage::{SqliteCommandSource, SqliteStorage};
use colloquy_webhook::WebhookPublisher;
use tracing::{debug, info, warn};

/// Runs the service until a shutdown signal arrives.
pub async fn run_serve(config: ColloquyConfig) -> Result<(), ColloquyError> {
    init_tracing(&config.service.log_level, config.service.log_format);

    info!(service = %config.service.name, "starting colloquy serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let db = storage.database()?.clone();

    #[cfg(feature = "prometheus")]
    let prometheus_adapter = if config.prometheus.enabled {
        match colloquy_prometheus::PrometheusAdapter::new() {
            Ok(adapter) => {
                info!("prometheus metrics enabled");
                Some(Arc::new(adapter))
            }
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        debug!("prometheus metrics disabled by configuration");
        None
    };

    let engine = DialogueEngine::new(db.clone());
    let source = Arc::new(SqliteCommandSource::new(
        db.clone(),
        Duration::from_secs(config.intake.lock_timeout_secs),
        config.intake.max_attempts,
    ));
    // Crash recovery: deliveries locked by a previous process.
    source.reclaim_expired().await?;

    let mut adapters: Vec<Arc<dyn PluginAdapter>> = vec![
        storage.clone() as Arc<dyn PluginAdapter>,
        source.clone() as Arc<dyn PluginAdapter>,
    ];

    let cancel = shutdown::install_signal_handler();
    let mut tasks = Vec::new();

    if !config.outbox.enabled {
        info!("outbox dispatcher disabled by configuration");
    } else if config.broker.endpoint.is_none() {
        warn!("no broker endpoint configured, outbox dispatcher not started");
    } else {
        let publisher = Arc::new(WebhookPublisher::new(&config.broker)?);
        info!(endpoint = publisher.endpoint(), "publishing outbox to webhook");
        adapters.push(publisher.clone());
        let dispatcher = OutboxDispatcher::new(
            db.clone(),
            publisher,
            Duration::from_secs(config.outbox.poll_interval_secs),
        );
        tasks.push(tokio::spawn(dispatcher.run(cancel.clone())));
    }

    if config.intake.enabled {
        let intake = Arc::new(CommandIntake::new(
            engine.clone(),
            source.clone(),
            Duration::from_millis(config.intake.poll_interval_ms),
        ));
        tasks.extend(intake.spawn_workers(config.intake.workers, cancel.clone()));
    } else {
        info!("command intake disabled by configuration");
    }

    #[cfg(feature = "prometheus")]
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        prometheus_adapter.map(|adapter| {
            adapters.push(adapter.clone());
            Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
        });

    #[cfg(not(feature = "prometheus"))]
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> = None;

    let served = if config.gateway.enabled {
        let state = GatewayState {
            engine,
            commands: source,
            health: HealthState {
                start_time: Instant::now(),
                prometheus_render,
                adapters: Arc::new(adapters),
            },
        };
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        colloquy_gateway::start_server(&server_config, state, cancel.clone()).await
    } else {
        info!("gateway disabled by configuration");
        cancel.cancelled().await;
        Ok(())
    };

    // A gateway that failed to start still has to stop the background tasks.
    cancel.cancel();
    shutdown::await_tasks(
        tasks,
        Duration::from_secs(config.service.shutdown_timeout_secs),
    )
    .await;

    storage.close().await?;
    served?;

    info!("colloquy serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level and format.
///
/// `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("colloquy={log_level},warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
