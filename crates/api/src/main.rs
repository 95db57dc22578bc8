//! `thermo-api` -- temperature service.
//!
//! Registers with the local Consul agent, keeps its TTL check alive while
//! running, stores sensor readings in PostgreSQL and serves them over HTTP.
//!
//! # Environment variables
//!
//! | Variable       | Required | Default      | Description                              |
//! |----------------|----------|--------------|------------------------------------------|
//! | `CONFIG_PATH`  | no       | `config.yml` | YAML configuration file                  |
//! | `DATABASE_URL` | no       | --           | Overrides the `dbconfig` connection      |
//! | `RUST_LOG`     | no       | see below    | `tracing_subscriber::EnvFilter` directive |

use std::sync::Arc;
use std::time::Duration;

use thermo_core::health::HealthCheck;
use thermo_db::DbHealthCheck;
use thermo_registry::RegistrationHandle;
use thermo_sensor::{sampler, W1ThermSensor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thermo_api::background;
use thermo_api::config::AppConfig;
use thermo_api::router::build_app_router;
use thermo_api::state::AppState;

/// How long shutdown waits for each background task.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "thermo_api=debug,thermo_registry=info,thermo_db=info,thermo_sensor=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        std::process::exit(1);
    });
    let addr = config.listen_addr().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid listen address");
        std::process::exit(1);
    });
    let registration = config.consul_client.registration().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid consul-client configuration");
        std::process::exit(1);
    });
    let sampling = config.enabled_sensor().map(|sensor| {
        let interval = sensor.interval().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid sensor interval");
            std::process::exit(1);
        });
        (sensor.device_path.clone(), interval)
    });
    let retention = config.retention.as_ref().map(|retention| {
        let durations = retention
            .max_age()
            .and_then(|max_age| Ok((max_age, retention.interval()?)));
        durations.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid retention configuration");
            std::process::exit(1);
        })
    });
    let device_id: Arc<str> = Arc::from(config.device_id());
    tracing::info!(%addr, device_id = %device_id, "Loaded configuration");

    // --- Database ---
    let max_connections = config.dbconfig.max_connections;
    let pool = match &config.database_url {
        Some(url) => thermo_db::create_pool_from_url(url, max_connections).await,
        None => thermo_db::create_pool(config.dbconfig.connect_options(), max_connections).await,
    }
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to connect to database");
        std::process::exit(1);
    });
    tracing::info!("Database connection pool created");

    if let Err(e) = thermo_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }
    if let Err(e) = thermo_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    }
    tracing::info!("Database migrations applied");

    let health: Arc<dyn HealthCheck> = Arc::new(DbHealthCheck::new(pool.clone()));

    // --- Service registry ---
    let consul = config.consul_client.consul_client().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid consul-client configuration");
        std::process::exit(1);
    });
    let mut registration_handle = RegistrationHandle::register(Arc::new(consul), &registration)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to register with service registry");
            std::process::exit(1);
        });

    if let Err(e) = registration_handle.start_heartbeat(Arc::clone(&health)) {
        tracing::error!(error = %e, "Failed to start heartbeat");
        registration_handle.deregister().await;
        std::process::exit(1);
    }

    // --- Background jobs ---
    let cancel = CancellationToken::new();

    let mut sampler_handle = None;
    let mut ingest_handle = None;
    if let Some((device_path, interval)) = sampling {
        let sensor = Arc::new(W1ThermSensor::new(device_path));
        let (tx, rx) = sampler::channel();
        sampler_handle = Some(tokio::spawn(sampler::run(
            sensor,
            interval,
            tx,
            cancel.clone(),
        )));
        ingest_handle = Some(tokio::spawn(background::ingest::run(
            pool.clone(),
            Arc::clone(&device_id),
            rx,
        )));
    } else {
        tracing::info!("Sensor sampling disabled");
    }

    let retention_handle = retention.map(|(max_age, interval)| {
        tokio::spawn(background::retention::run(
            pool.clone(),
            Arc::clone(&device_id),
            max_age,
            interval,
            cancel.clone(),
        ))
    });

    // --- Start server ---
    let state = AppState::new(pool.clone(), Arc::clone(&device_id), Arc::clone(&health));
    let app = build_app_router(state, &config.server);

    let mut bind_failed = false;
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!(%addr, "Starting server");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                tracing::error!(error = %e, "Server error");
            }
            tracing::info!("Server stopped accepting connections, cleaning up");
        }
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            bind_failed = true;
        }
    }

    // --- Shutdown ---
    cancel.cancel();
    if let Some(handle) = sampler_handle {
        match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => tracing::info!("Sampler stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Sampler failed"),
            Err(_) => tracing::warn!("Sampler did not stop in time"),
        }
    }
    if let Some(handle) = retention_handle {
        match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => tracing::info!("Retention job stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Retention job failed"),
            Err(_) => tracing::warn!("Retention job did not stop in time"),
        }
    }
    // The sampler dropped its sender, so the consumer ends once drained.
    if let Some(handle) = ingest_handle {
        match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(stored)) => tracing::info!(stored, "Ingest consumer drained"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Ingest consumer failed"),
            Err(_) => tracing::warn!("Ingest consumer did not drain in time"),
        }
    }

    registration_handle.deregister().await;

    pool.close().await;

    if bind_failed {
        std::process::exit(1);
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by systemd.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
