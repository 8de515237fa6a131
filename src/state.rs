use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::notify::{LogNotifier, Notifier, SmtpNotifier};
use crate::store::{MemoryStore, NoteStore, OtpStore, PgStore, Store, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub otps: Arc<dyn OtpStore>,
    pub notes: Arc<dyn NoteStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpNotifier::new(smtp)?),
            None => {
                warn!("SMTP_HOST not set; one-time codes are only logged");
                Arc::new(LogNotifier)
            }
        };

        match config.backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set for the postgres backend")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;

                info!("using postgres store");
                Ok(Self::from_parts(config, Arc::new(PgStore::new(db)), notifier))
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on restart");
                Ok(Self::from_parts(config, Arc::new(MemoryStore::new()), notifier))
            }
        }
    }

    pub fn from_parts<S: Store + 'static>(
        config: Arc<AppConfig>,
        store: Arc<S>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            users: store.clone(),
            otps: store.clone(),
            notes: store,
            notifier,
        }
    }

    #[cfg(test)]
    pub fn fake(notifier: Arc<dyn Notifier>) -> Self {
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryStore::new()),
            notifier,
        )
    }
}
