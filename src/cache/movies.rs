use redis::AsyncCommands;
use tracing::debug;

use crate::cache::CacheService;
use crate::models::Movie;

const MOVIES_KEY: &str = "catalog:movies";

impl CacheService {
    /// Movie list, from redis when possible. Redis failures fall through to the database.
    pub async fn get_movies(&self) -> Result<Vec<Movie>, sqlx::Error> {
        if let Ok(movies) = self.get_movies_from_cache().await {
            debug!("movies served from cache");
            return Ok(movies);
        }

        let movies = Movie::all(&self.db).await?;
        if let Err(e) = self.save_movies_to_cache(&movies).await {
            debug!("failed to cache movies: {:?}", e);
        }
        Ok(movies)
    }

    async fn get_movies_from_cache(&self) -> Result<Vec<Movie>, redis::RedisError> {
        let mut conn = self.conn.clone();
        let data: String = conn.get(MOVIES_KEY).await?;
        serde_json::from_str(&data).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
        })
    }

    async fn save_movies_to_cache(&self, movies: &[Movie]) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(movies).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.conn.clone();
        conn.set_ex(MOVIES_KEY, data, self.catalog_ttl_secs).await
    }
}
