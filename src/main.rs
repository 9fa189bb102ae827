use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use physio_srs::config::{AppConfig, IntakeMode};
use physio_srs::error::AppError;
use physio_srs::telemetry;
use physio_srs::workflows::recovery::{
    recovery_router, AssessmentSubmission, ClinicianOverride, InMemoryRecoveryRepository,
    RecoveryService, ScoreEngine, TracingAlertPublisher,
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Signature Recovery Score Service",
    about = "Run the recovery scoring and risk-triage service, or score assessments offline",
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
    /// Evaluate an assessment fixture and print the score breakdown
    Score(ScoreArgs),
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
struct ScoreArgs {
    /// JSON file holding the current submission and, for follow-ups, the prior one
    #[arg(long)]
    input: PathBuf,
}

/// Offline scoring input: a submission, its optional baseline, and optional
/// clinician sign-offs.
#[derive(Debug, Deserialize)]
struct ScoreFixture {
    current: AssessmentSubmission,
    #[serde(default)]
    prior: Option<AssessmentSubmission>,
    #[serde(default)]
    overrides: Option<ClinicianOverride>,
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
        Command::Score(args) => run_score(args),
    }
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

    let repository = Arc::new(InMemoryRecoveryRepository::default());
    let alerts = Arc::new(TracingAlertPublisher);
    // Rule-set integrity is verified here; a bad table aborts startup.
    let service = Arc::new(RecoveryService::new(
        repository,
        alerts,
        config.intake_mode,
    )?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(recovery_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recovery scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let fixture: ScoreFixture = serde_json::from_str(&raw)?;

    let engine = ScoreEngine::new()?;
    let current = fixture.current.sanitize(IntakeMode::Strict)?;
    let prior = fixture
        .prior
        .as_ref()
        .map(|submission| submission.sanitize(IntakeMode::Strict))
        .transpose()?;
    let overrides = fixture.overrides.unwrap_or_default();

    let result = engine.evaluate(
        &current.snapshot,
        prior.as_ref().map(|sanitized| &sanitized.snapshot),
        &overrides,
    )?;
    let phase = engine.classify_phase(result.total);

    println!(
        "Signature Recovery Score ({}) for {}: {}/{} -> {}",
        current.snapshot.form_kind.label(),
        fixture.current.patient_id.0,
        result.total,
        result.max,
        phase.label()
    );
    for item in &result.breakdown {
        let mark = if item.achieved { 'x' } else { ' ' };
        println!(
            "  [{mark}] +{} {:<50} {}",
            item.points_awarded, item.description, item.observed_value
        );
    }

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
    state.metrics.render()
}
