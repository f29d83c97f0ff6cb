use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskpick_core::domain::contract::{QuizAnswers, RunRequest};
use riskpick_core::domain::next_step::NextStep;
use riskpick_core::domain::risk::{self, QuizQuestion, RiskBucket, QUIZ};
use riskpick_core::domain::universe;
use riskpick_core::domain::window::TradingStrategy;
use riskpick_core::error::ValidationError;
use riskpick_core::forecast::trend::TrendForecaster;
use riskpick_core::forecast::Forecaster;
use riskpick_core::market::yahoo::YahooChartSource;
use riskpick_core::market::MarketDataSource;
use riskpick_core::pipeline::{self, RunOptions, RunReport};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = riskpick_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = match YahooChartSource::from_settings(&settings) {
        Ok(source) => source,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    };

    let state = AppState {
        source: Arc::new(source),
        forecaster: Arc::new(TrendForecaster::default()),
        opts: RunOptions::from_settings(&settings),
    };

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = settings.port.unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/quiz", get(get_quiz).post(post_quiz))
        .route("/universe", get(get_universe))
        .route("/strategies", get(get_strategies))
        .route("/recommendations", post(post_recommendations))
        .route("/next-steps", get(get_next_steps).post(post_next_step))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn MarketDataSource>,
    forecaster: Arc<dyn Forecaster>,
    opts: RunOptions,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn reject(err: ValidationError) -> (StatusCode, Json<ApiError>) {
    tracing::info!(error = %err, "request rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiError {
            error: err.to_string(),
            message: err.user_message(),
        }),
    )
}

async fn get_quiz() -> Json<&'static [QuizQuestion]> {
    Json(&QUIZ[..])
}

#[derive(Debug, Deserialize)]
struct QuizSubmission {
    answers: QuizAnswers,
}

#[derive(Debug, Serialize)]
struct QuizResult {
    score: u32,
    bucket: RiskBucket,
    message: String,
}

async fn post_quiz(Json(body): Json<QuizSubmission>) -> ApiResult<QuizResult> {
    let weights = body.answers.weights().map_err(reject)?;
    let score = risk::risk_score(&weights).map_err(reject)?;
    let bucket = risk::bucket_for_score(score);

    Ok(Json(QuizResult {
        score,
        bucket,
        message: format!("Your Risk Tolerance Score is: {score}. Risk level: {bucket}"),
    }))
}

async fn get_universe() -> Json<BTreeMap<RiskBucket, Vec<&'static str>>> {
    Json(
        universe::all()
            .map(|(bucket, tickers)| (bucket, tickers.to_vec()))
            .collect(),
    )
}

#[derive(Debug, Serialize)]
struct StrategyInfo {
    strategy: TradingStrategy,
    label: &'static str,
    active: bool,
    min_days: Option<u32>,
    max_days: Option<u32>,
}

async fn get_strategies() -> Json<Vec<StrategyInfo>> {
    Json(
        TradingStrategy::ALL
            .iter()
            .map(|&strategy| {
                let range = strategy.day_range();
                StrategyInfo {
                    strategy,
                    label: strategy.label(),
                    active: strategy.is_active(),
                    min_days: range.map(|r| r.0),
                    max_days: range.map(|r| r.1),
                }
            })
            .collect(),
    )
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> ApiResult<RunReport> {
    let plan = req.validate_and_into_plan().map_err(reject)?;

    let report = pipeline::run(
        &plan,
        Arc::clone(&state.source),
        Arc::clone(&state.forecaster),
        &state.opts,
        chrono::Utc::now(),
    )
    .await;

    Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct NextStepOption {
    choice: NextStep,
    label: &'static str,
}

async fn get_next_steps() -> Json<Vec<NextStepOption>> {
    Json(
        NextStep::ALL
            .iter()
            .map(|&choice| NextStepOption {
                choice,
                label: choice.label(),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct NextStepChoice {
    choice: NextStep,
}

async fn post_next_step(Json(body): Json<NextStepChoice>) -> Json<NextStepOption> {
    tracing::info!(choice = ?body.choice, "next step chosen");
    Json(NextStepOption {
        choice: body.choice,
        label: body.choice.label(),
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &riskpick_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
