use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub theatre_id: i64,
    pub theatre_name: String,
    pub theatre_location: Option<String>,
    pub start_time: DateTime<Utc>,
}

impl Show {
    pub async fn for_movie(movie_id: i64, db: &Database) -> Result<Vec<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(
            "SELECT s.id, s.movie_id, s.theatre_id, t.name AS theatre_name,
                    t.location AS theatre_location, s.start_time
             FROM shows s
             JOIN theatres t ON t.id = s.theatre_id
             WHERE s.movie_id = $1
             ORDER BY s.start_time"
        )
        .bind(movie_id)
        .fetch_all(&db.pool)
        .await
    }
}
