mod adapters;
mod app;
pub mod auth;
pub mod config;
pub mod error;
mod ports;
pub mod push;
mod state;
pub mod types;

pub use app::app;
pub use push::vapid::{VapidCredentials, generate_vapid_credentials};

pub async fn serve(config: config::AppConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!("listening on http://{}", config.listen);
    axum::serve(listener, app(config)).await
}
