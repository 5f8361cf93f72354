pub mod cache;
pub mod clock;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;
use tokio::task;

use clock::{Clock, SystemClock};
use repository::{PgSeatRepository, SeatRepository};
use services::{AuthService, JwtKeys, ReservationEngine, SeatService, SettlementEngine};

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub auth: AuthService,
    pub seats: SeatService,
    pub reservations: ReservationEngine,
    pub settlement: SettlementEngine,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let cache = cache::CacheService::connect(&config.redis, db.clone()).await?;
        tracing::info!("Redis connected");

        let repo: Arc<dyn SeatRepository> = Arc::new(PgSeatRepository::new(
            db.pool.clone(),
            config.database.lock_timeout_ms,
        ));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let state = Arc::new(Self {
            auth: AuthService::new(db.clone(), JwtKeys::new(&config.jwt)),
            seats: SeatService::new(repo.clone(), clock.clone(), &config.booking),
            reservations: ReservationEngine::new(repo.clone(), clock.clone(), &config.booking),
            settlement: SettlementEngine::new(repo, clock, &config.booking),
            db,
            cache,
            config,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            // Warm up the catalog cache in the background
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
