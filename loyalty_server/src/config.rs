use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use loyalty_common::{parse_boolean_flag, parse_env_value};
use loyalty_engine::{reconciliation::ReconciliationConfig, sqlite::db::DEFAULT_DATABASE_URL};

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// The SQLite URL of the ledger database, e.g. `sqlite://data/loyalty_ledger.db`
    pub database_url: String,
    /// The base URL of the accrual service, e.g. `http://localhost:8081`
    pub accrual_url: String,
    pub db_max_connections: u32,
    /// If true, outstanding database migrations are applied at startup.
    pub run_migrations: bool,
    pub reconciliation: ReconciliationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            accrual_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            run_migrations: true,
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(database_url: &str, accrual_url: &str) -> Self {
        Self { database_url: database_url.to_string(), accrual_url: accrual_url.to_string(), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from the values that `lookup` returns for each variable name. Invalid values are
    /// logged and replaced with their defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        let database_url = lookup("LOYALTY_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ LOYALTY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let accrual_url = lookup("LOYALTY_ACCRUAL_URL").unwrap_or_else(|| {
            error!("🪛️ LOYALTY_ACCRUAL_URL is not set. Please set it to the base URL of the accrual service.");
            String::default()
        });
        let db_max_connections =
            env_or_default(&lookup, "LOYALTY_DB_MAX_CONNECTIONS", defaults.db_max_connections, |v| *v > 0);
        let run_migrations = parse_boolean_flag(lookup("LOYALTY_RUN_MIGRATIONS"), defaults.run_migrations);

        let workers = env_or_default(&lookup, "LOYALTY_WORKERS", defaults.reconciliation.workers, |v| *v > 0);
        let mut reconciliation = ReconciliationConfig::new(workers);
        let poll_interval = env_or_default(
            &lookup,
            "LOYALTY_POLL_INTERVAL",
            defaults.reconciliation.poll_interval.as_secs(),
            |v| *v > 0,
        );
        reconciliation = reconciliation.with_poll_interval(Duration::from_secs(poll_interval));
        let cool_down =
            env_or_default(&lookup, "LOYALTY_COOL_DOWN", defaults.reconciliation.cool_down.as_secs(), |_| true);
        reconciliation = reconciliation.with_cool_down(Duration::from_secs(cool_down));
        if let Some(capacity) = env_or_none(&lookup, "LOYALTY_QUEUE_CAPACITY", |v: &usize| *v > 0) {
            reconciliation = reconciliation.with_queue_capacity(capacity);
        }

        Self { database_url, accrual_url, db_max_connections, run_migrations, reconciliation }
    }
}

fn env_or_default<T, F, V>(lookup: &F, name: &str, default: T, valid: V) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    env_or_none(lookup, name, valid).unwrap_or(default)
}

fn env_or_none<T, F, V>(lookup: &F, name: &str, valid: V) -> Option<T>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    match parse_env_value::<T>(lookup(name)) {
        Ok(Some(value)) if valid(&value) => Some(value),
        Ok(Some(value)) => {
            warn!("🪛️ {value} is not a valid value for {name}. Using the default instead.");
            None
        },
        Ok(None) => None,
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name}. {e}. Using the default instead.");
            None
        },
    }
}
