use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashy::{config::Config, db, routes, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flashy=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");

  std::fs::create_dir_all(&config.media_dir)
    .unwrap_or_else(|e| panic!("Failed to create media directory {}: {}", config.media_dir.display(), e));

  let app = routes::app(AppState::new(pool, config.media_dir.clone()));

  let listener = tokio::net::TcpListener::bind(&config.bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", config.bind_addr));

  tracing::info!("Server running on http://{}", config.bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
