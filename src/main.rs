use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use vc_scout_dashboard::app_state::AppState;
use vc_scout_dashboard::config::AppConfig;
use vc_scout_dashboard::routes;
use vc_scout_dashboard::services::api::{HttpRemoteApi, RemoteApi};
use vc_scout_dashboard::services::dashboard::Dashboard;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing vc-scout-dashboard");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("search_jobs_submitted_total", "Search jobs created from this client");
    metrics::describe_counter!("search_polls_started_total", "Selected-job poll timers armed");
    metrics::describe_counter!(
        "search_polls_expired_total",
        "Poll timers stopped by their hard deadline"
    );
    metrics::describe_counter!("search_poll_ticks_total", "Poll ticks fired");
    metrics::describe_counter!(
        "memory_filter_batches_total",
        "Memory filter batches processed"
    );
    metrics::describe_counter!(
        "memory_filter_runs_total",
        "Memory filter runs by outcome"
    );
    metrics::describe_counter!(
        "remote_api_errors_total",
        "Failed research API calls by error kind"
    );

    // Initialize research API client
    tracing::info!(base_url = %config.api_base_url, "Initializing research API client");
    let api: Arc<dyn RemoteApi> = Arc::new(
        HttpRemoteApi::new(
            &config.api_base_url,
            config.api_token.clone(),
            config.request_timeout(),
        )
        .expect("Failed to initialize research API client"),
    );

    let dashboard = Dashboard::new(Arc::clone(&api), config.dashboard_settings());

    // Landing view: job list and suggestions from the latest completed search
    dashboard.load_overview().await;

    let state = AppState::new(api, dashboard);
    let app = routes::router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Dashboard listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
