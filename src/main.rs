use rusty_pairs::feeds::yahoo::YahooChartSource;
use rusty_pairs::state::AppState;
use rusty_pairs::{config, server};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Early stderr so the host captures something even if tracing fails
    eprintln!("[rusty_pairs] binary started, setting up logging...");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("rusty_pairs service starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let source = YahooChartSource::new(&cfg.market_data_base_url, cfg.fetch_timeout_secs);
    tracing::info!(
        base_url = %cfg.market_data_base_url,
        symbols = cfg.symbols.len(),
        significance = cfg.analysis.significance,
        entry = cfg.analysis.entry_threshold,
        exit = cfg.analysis.exit_threshold,
        "market data source ready"
    );

    let port = cfg.server_port;
    let app_state = AppState::new(cfg, Arc::new(source));
    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
