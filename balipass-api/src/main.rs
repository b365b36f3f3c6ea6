use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use balipass_api::{config, router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balipass_api=debug,tower_http=info".into()),
        )
        .init();

    let settings = config::read_config().expect("Failed to read configuration");

    let connection_pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_with(settings.database.with_db())
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to run database migrations");

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let app = router::create(connection_pool, settings).await;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .await
        .expect("Failed to run server");
}
