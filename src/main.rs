use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sportmeet::database::schema;
use sportmeet::web::{self, AppState};

#[tokio::main]
async fn main() {
    // Laad .env bestand
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Verbind met de database
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sportmeet.db".to_string());
    let options = SqliteConnectOptions::from_str(&db_url)
        .expect("DATABASE_URL is geen geldige sqlite URL")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("Kan niet verbinden met DB");

    schema::ensure_schema(&pool).await.expect("schema bootstrap failed");

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        warn!("JWT_SECRET not set; falling back to a development-only secret");
        "sportmeet-dev-secret".to_string()
    });

    // 3. Routes + middleware
    let state = AppState { pool, jwt_secret };
    let app = web::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:7001".to_string())
        .parse()
        .expect("BIND_ADDR is invalid");
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("cannot bind listener");
    axum::serve(listener, app).await.expect("server error");
}
