use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_mins: i32,
    #[serde(rename = "rating")]
    pub content_rating: Option<String>,
}

impl Movie {
    pub async fn all(db: &Database) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, duration_mins, content_rating
             FROM movies
             ORDER BY title"
        )
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(id: i64, db: &Database) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, duration_mins, content_rating
             FROM movies
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }
}
