use std::sync::Arc;

use crate::availability::repo::AvailabilityRepo;
use crate::config::{AppConfig, StoreBackend};
use crate::email::{create_mailer, Mailer};
use crate::interactions::repo::InteractionRepo;
use crate::meetings::repo::MeetingRepo;
use crate::signaling::roster::RoomRoster;
use crate::store::{memory::MemoryStore, postgres::PgStore, Store};
use crate::timezones::repo::TimeZoneRepo;
use crate::users::repo::UserRepo;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub time_zones: Arc<dyn TimeZoneRepo>,
    pub availability: Arc<dyn AvailabilityRepo>,
    pub interactions: Arc<dyn InteractionRepo>,
    pub meetings: Arc<dyn MeetingRepo>,
    pub mailer: Arc<dyn Mailer>,
    pub rooms: Arc<RoomRoster>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let mailer = create_mailer(&config.email)?;

        let state = match (config.store, config.database_url.as_deref()) {
            (StoreBackend::Postgres, Some(url)) => {
                let store = PgStore::connect(url).await?;
                store.migrate().await?;
                Self::from_store(Arc::new(store), config.clone(), mailer)
            }
            (StoreBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL is required when STORE_BACKEND=postgres")
            }
            (StoreBackend::Memory, _) => {
                tracing::warn!("using the in-memory store; data is lost on restart");
                Self::from_store(Arc::new(MemoryStore::new()), config.clone(), mailer)
            }
        };
        Ok(state)
    }

    pub fn from_store<S: Store + 'static>(
        store: Arc<S>,
        config: Arc<AppConfig>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users: store.clone(),
            time_zones: store.clone(),
            availability: store.clone(),
            interactions: store.clone(),
            meetings: store,
            mailer,
            rooms: Arc::new(RoomRoster::new()),
        }
    }
}
