//! Populates a development database with movies, shows, seats and users.

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::info;

use seat_booking::{config::DatabaseConfig, database::Database};

const MOVIES: &[(&str, &str, i32, &str)] = &[
    ("The Long Night", "A lighthouse keeper waits out a storm.", 112, "PG-13"),
    ("Paper Orbit", "Two students build a satellite in a garage.", 98, "PG"),
    ("Quiet Harbour", "A fishing town and the summer that changed it.", 124, "R"),
];

const USERS: &[(&str, &str, &str)] = &[
    ("alice@example.com", "password123", "Alice"),
    ("bob@example.com", "password123", "Bob"),
    ("carol@example.com", "password123", "Carol"),
];

const ROWS: &[char] = &['A', 'B', 'C', 'D', 'E'];
const SEATS_PER_ROW: i32 = 10;
const SHOWS_PER_MOVIE: i64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
        pool_size: 5,
        acquire_timeout_secs: 5,
        lock_timeout_ms: 5_000,
    };
    let db = Database::new(&config).await?;
    db.run_migrations().await?;

    let mut tx = db.pool.begin().await?;

    let theatre_id: i64 = sqlx::query_scalar(
        "INSERT INTO theatres (name, location) VALUES ($1, $2) RETURNING id"
    )
    .bind("Grand Cinema")
    .bind("Main Street 1")
    .fetch_one(&mut *tx)
    .await?;

    let mut seat_count = 0;
    for &(title, description, duration, rating) in MOVIES {
        let movie_id: i64 = sqlx::query_scalar(
            "INSERT INTO movies (title, description, duration_mins, content_rating)
             VALUES ($1, $2, $3, $4)
             RETURNING id"
        )
        .bind(title)
        .bind(description)
        .bind(duration)
        .bind(rating)
        .fetch_one(&mut *tx)
        .await?;

        for slot in 0..SHOWS_PER_MOVIE {
            let start_time = Utc::now() + Duration::days(1) + Duration::hours(3 * slot);
            let show_id: i64 = sqlx::query_scalar(
                "INSERT INTO shows (movie_id, theatre_id, start_time) VALUES ($1, $2, $3) RETURNING id"
            )
            .bind(movie_id)
            .bind(theatre_id)
            .bind(start_time)
            .fetch_one(&mut *tx)
            .await?;

            for row in ROWS {
                for number in 1..=SEATS_PER_ROW {
                    sqlx::query("INSERT INTO show_seats (show_id, seat_name) VALUES ($1, $2)")
                        .bind(show_id)
                        .bind(format!("{row}{number}"))
                        .execute(&mut *tx)
                        .await?;
                    seat_count += 1;
                }
            }
        }
    }

    for &(email, password, name) in USERS {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        sqlx::query(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3)
             ON CONFLICT (email) DO NOTHING"
        )
        .bind(email)
        .bind(hash)
        .bind(name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        movies = MOVIES.len(),
        seats = seat_count,
        users = USERS.len(),
        "seed data inserted"
    );
    Ok(())
}
