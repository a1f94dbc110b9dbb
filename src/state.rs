use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{LogNotifier, Notifier, SmtpNotifier};

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub notifier: Arc<dyn Notifier>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let notifier: Arc<dyn Notifier> = if config.email.enabled {
            Arc::new(SmtpNotifier::new(
                &config.email,
                config.auth.reset_code_ttl_minutes,
            )?)
        } else {
            tracing::warn!("Email delivery disabled; recovery codes will be logged");
            Arc::new(LogNotifier)
        };

        Self::with_notifier(config, notifier).await
    }

    /// Wire the state around an externally supplied notifier. Tests use this
    /// to capture deliveries instead of reaching an SMTP server.
    pub async fn with_notifier(
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self {
            config,
            store,
            notifier,
        })
    }
}
