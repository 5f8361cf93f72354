use redis::{aio::MultiplexedConnection, Client};
use tracing::{info, warn};

use crate::config::RedisConfig;
use crate::database::Database;

pub mod movies;

/// Read-through redis cache for catalog data. Seat state is never cached:
/// the seat map is read from the database on every request.
#[derive(Clone)]
pub struct CacheService {
    conn: MultiplexedConnection,
    db: Database,
    catalog_ttl_secs: u64,
}

impl CacheService {
    pub async fn connect(config: &RedisConfig, db: Database) -> redis::RedisResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        Ok(Self {
            conn,
            db,
            catalog_ttl_secs: config.catalog_ttl_secs,
        })
    }

    // Warm up on startup
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");
        match self.get_movies().await {
            Ok(movies) => info!("Cached {} movies", movies.len()),
            Err(e) => warn!("Cache warmup skipped: {:?}", e),
        }
    }
}
