use std::sync::Arc;

use anyhow::Context;

use stockflow_infra::{Dispatcher, DispatcherSettings, InMemoryStore, SqliteOptions, SqliteStore};

use crate::config::{Config, DEV_CREDENTIALS};

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppServices {
    pub dispatcher: Dispatcher,
}

/// Open the configured backend and wire the dispatcher to it.
pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let settings = DispatcherSettings {
        call_timeout: config.call_timeout,
        audit_timeout: config.audit_timeout,
    };

    let dispatcher = if config.use_in_memory_store {
        let store = Arc::new(InMemoryStore::new());
        if config.seed_dev_credentials {
            for (key, role) in DEV_CREDENTIALS {
                store.provision_credential(*key, role.clone());
            }
        }
        tracing::info!(backend = "memory", "store ready");
        Dispatcher::new(store, settings)
    } else {
        let options = SqliteOptions {
            url: config.database_url.clone(),
            max_connections: config.db_max_connections,
            busy_timeout: config.db_busy_timeout,
        };
        let store = Arc::new(
            SqliteStore::connect(&options)
                .await
                .with_context(|| format!("failed to open database {}", config.database_url))?,
        );
        if config.seed_dev_credentials {
            for (key, role) in DEV_CREDENTIALS {
                store
                    .provision_credential(key, role)
                    .await
                    .context("failed to seed dev credentials")?;
            }
        }
        tracing::info!(backend = "sqlite", max_connections = config.db_max_connections, "store ready");
        Dispatcher::new(store, settings)
    };

    if config.seed_dev_credentials {
        tracing::warn!(keys = DEV_CREDENTIALS.len(), "dev credentials seeded");
    }

    Ok(AppServices { dispatcher })
}
