use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use apollo_marketplace::config::AppConfig;
use apollo_marketplace::error::AppError;
use apollo_marketplace::marketplace::{
    demo, marketplace_router, InMemoryMarketplace, MarketplaceService, Money, PricingPolicy,
    SessionDuration, StaticIdentity,
};
use apollo_marketplace::telemetry;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Apollo Marketplace",
    about = "Run the tutoring marketplace service or price a session from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a session and show the platform fee split
    Quote(QuoteArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    /// Tutor's hourly rate in dollars (e.g. 45 or 45.50)
    #[arg(long, value_parser = parse_rate)]
    hourly_rate: Money,
    /// Session length in minutes (30, 60, or 120)
    #[arg(long, value_parser = parse_duration)]
    duration: SessionDuration,
    /// Platform fee in basis points (defaults to the configured 4%)
    #[arg(long)]
    fee_bps: Option<u32>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Quote(args) => run_quote(args),
    }
}

fn parse_rate(raw: &str) -> Result<Money, String> {
    let dollars: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as a dollar amount ({err})"))?;
    match Money::from_dollars(dollars) {
        Some(rate) if rate.is_positive() => Ok(rate),
        _ => Err(format!("'{raw}' is not a positive dollar amount")),
    }
}

fn parse_duration(raw: &str) -> Result<SessionDuration, String> {
    let minutes: u32 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as minutes ({err})"))?;
    SessionDuration::try_from(minutes)
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    // Backend collaborators are stubbed in-process: a seeded repository, an
    // auto-approving processor, and a fixed student identity.
    let (student_user, student) = demo::sample_student();
    let repository = Arc::new(InMemoryMarketplace::seeded(
        demo::sample_tutors(),
        vec![student],
    ));
    let identity = Arc::new(StaticIdentity::signed_in(
        student_user.id,
        student_user.user_type,
    ));
    let processor = Arc::new(demo::AutoApproveProcessor);
    let service = Arc::new(MarketplaceService::new(
        repository,
        processor,
        identity,
        config.marketplace.pricing_policy(),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(marketplace_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "apollo marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let policy = match args.fee_bps {
        Some(bps) => PricingPolicy::new(bps),
        None => config.marketplace.pricing_policy(),
    };

    let total = policy.session_total(args.hourly_rate, args.duration);
    let split = policy.fee_split(total);

    println!("Session quote");
    println!(
        "Rate ${}/hr for {} -> total ${}",
        args.hourly_rate,
        args.duration.label(),
        total
    );
    println!(
        "Platform fee ${} ({} bps), tutor earns ${}",
        split.platform_fee, policy.platform_fee_basis_points, split.tutor_earnings
    );

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
