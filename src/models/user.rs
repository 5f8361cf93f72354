use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_email(email: &str, db: &crate::database::Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&db.pool)
        .await
    }

    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
