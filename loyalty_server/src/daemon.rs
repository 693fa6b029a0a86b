use std::{future::Future, path::Path};

use log::*;
use loyalty_engine::{
    accrual::AccrualClient,
    reconciliation::{PoolHandle, ReconciliationPool},
    LedgerDatabase,
    SqliteDatabase,
};

use crate::{config::ServerConfig, errors::ServerError};

/// Connects to the ledger database, creating the file (and its directory) if needed and bringing the schema up to
/// date when `run_migrations` is set.
pub async fn open_database(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    if let Some(dir) = sqlite_file_dir(&config.database_url) {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
    }
    let db = SqliteDatabase::create_if_missing(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not open {}. {e}", config.database_url)))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    } else {
        info!("🗃️ Skipping database migrations");
    }
    Ok(db)
}

/// Starts the reconciliation pool against `db`. Do not forget to call [`PoolHandle::shutdown`] on the result.
pub fn start_reconciliation(db: SqliteDatabase, config: &ServerConfig) -> Result<PoolHandle, ServerError> {
    if config.accrual_url.trim().is_empty() {
        return Err(ServerError::ConfigurationError("LOYALTY_ACCRUAL_URL must be set".into()));
    }
    let client = AccrualClient::new(&config.accrual_url).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🧾️ Using the accrual service at {}", client.base_url());
    let pool = ReconciliationPool::new(config.reconciliation.clone(), db, client);
    Ok(pool.start())
}

/// Runs the daemon until `shutdown` completes, and then stops the pool and closes the database.
pub async fn run_daemon_until<F>(config: ServerConfig, shutdown: F) -> Result<(), ServerError>
where F: Future<Output = ()> {
    let mut db = open_database(&config).await?;
    let handle = match start_reconciliation(db.clone(), &config) {
        Ok(handle) => handle,
        Err(e) => {
            close_database(&mut db).await;
            return Err(e);
        },
    };
    info!("🚀️ Loyalty daemon is running");
    shutdown.await;
    info!("🚀️ Shutdown signal received");
    let stats = handle.stats();
    info!(
        "🚀️ {} lookups made, {} orders resolved, {} rate limits hit",
        stats.lookups, stats.resolved, stats.rate_limited
    );
    handle.shutdown().await;
    close_database(&mut db).await;
    Ok(())
}

async fn close_database(db: &mut SqliteDatabase) {
    if let Err(e) = db.close().await {
        warn!("🗃️ Error closing the database. {e}");
    }
}

/// Runs the daemon until the process receives Ctrl-C.
pub async fn run_daemon(config: ServerConfig) -> Result<(), ServerError> {
    run_daemon_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("🚀️ Could not listen for the shutdown signal. {e}");
        }
    })
    .await
}

/// The directory holding the database file for a file-backed `sqlite:` URL.
fn sqlite_file_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path).parent()
}
