use anyhow::Context;
use clap::{Parser, ValueEnum};
use riskpick_core::domain::contract::{QuizAnswers, RunRequest, DEFAULT_INVESTMENT_AMOUNT};
use riskpick_core::domain::next_step::NextStep;
use riskpick_core::domain::risk::RiskSelection;
use riskpick_core::domain::window::{TradingStrategy, DEFAULT_DAYS};
use riskpick_core::error::ValidationError;
use riskpick_core::forecast::trend::TrendForecaster;
use riskpick_core::market::yahoo::YahooChartSource;
use riskpick_core::pipeline::{self, RunOptions, RunReport};
use riskpick_core::report;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod quiz;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RiskArg {
    High,
    Medium,
    Low,
    Quiz,
}

impl From<RiskArg> for RiskSelection {
    fn from(v: RiskArg) -> Self {
        match v {
            RiskArg::High => RiskSelection::High,
            RiskArg::Medium => RiskSelection::Medium,
            RiskArg::Low => RiskSelection::Low,
            RiskArg::Quiz => RiskSelection::QuizMe,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    DayTrading,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl From<StrategyArg> for TradingStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::DayTrading => TradingStrategy::DayTrading,
            StrategyArg::ShortTerm => TradingStrategy::ShortTerm,
            StrategyArg::MediumTerm => TradingStrategy::MediumTerm,
            StrategyArg::LongTerm => TradingStrategy::LongTerm,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NextStepArg {
    TradingPlatform,
    Expert,
}

impl From<NextStepArg> for NextStep {
    fn from(v: NextStepArg) -> Self {
        match v {
            NextStepArg::TradingPlatform => NextStep::TradingPlatform,
            NextStepArg::Expert => NextStep::ExpertConsult,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "riskpick", about = "Forecast-ranked stock picks for a risk level")]
struct Args {
    /// Risk level, or `quiz` to derive it from the five-question quiz.
    #[arg(long, value_enum)]
    risk: RiskArg,

    /// Quiz answers as five comma-separated weights (1-3) or choice labels.
    /// Prompts interactively when omitted with `--risk quiz`.
    #[arg(long)]
    answers: Option<String>,

    /// Amount to invest, in USD.
    #[arg(long, default_value_t = DEFAULT_INVESTMENT_AMOUNT)]
    amount: f64,

    #[arg(long, value_enum, default_value = "short-term")]
    strategy: StrategyArg,

    /// Trading window in days.
    #[arg(long, default_value_t = i64::from(DEFAULT_DAYS), allow_negative_numbers = true)]
    days: i64,

    #[arg(long, value_enum)]
    next_step: Option<NextStepArg>,

    /// Print the full run report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = riskpick_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let risk = RiskSelection::from(args.risk);

    let quiz_answers = match (risk, args.answers.as_deref()) {
        (RiskSelection::QuizMe, Some(raw)) => Some(quiz::parse_answers(raw)),
        (RiskSelection::QuizMe, None) => {
            let stdin = std::io::stdin();
            let weights = quiz::prompt_answers(&mut stdin.lock(), &mut std::io::stderr())?;
            Some(QuizAnswers::from_weights(&weights))
        }
        (_, Some(_)) => {
            tracing::warn!("--answers is ignored unless --risk quiz");
            None
        }
        (_, None) => None,
    };

    let request = RunRequest {
        risk,
        quiz_answers,
        investment_amount: args.amount,
        strategy: args.strategy.into(),
        days: args.days,
    };

    let plan = match request.validate_and_into_plan() {
        Ok(plan) => plan,
        Err(err @ ValidationError::InvalidInput { .. }) => {
            eprintln!("{}", err.user_message());
            return Err(err).context("quiz answers rejected");
        }
        Err(err) => return Err(err.into()),
    };

    let source = match YahooChartSource::from_settings(&settings) {
        Ok(source) => source,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    };
    let report = pipeline::run(
        &plan,
        Arc::new(source),
        Arc::new(TrendForecaster::default()),
        &RunOptions::from_settings(&settings),
        chrono::Utc::now(),
    )
    .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(choice) = args.next_step {
        let choice = NextStep::from(choice);
        tracing::info!(?choice, "next step chosen");
        if !args.json {
            println!("\nNext step: {}", choice.label());
        }
    } else if !args.json {
        println!("\nHow do you want to proceed? (--next-step)");
        for step in NextStep::ALL {
            println!("  - {}", step.label());
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    if let Some(score) = report.quiz_score {
        println!("Your Risk Tolerance Score is: {score}");
        println!("Risk level: {}", report.bucket);
        println!();
    }

    if let Some(warning) = &report.warning {
        println!("Warning: {warning}");
        println!("Please ensure you have selected a timeframe and entered a valid investment amount.");
        return;
    }

    println!(
        "Top {} Stock Recommendations ({} risk, {} days)",
        report.recommendations.len(),
        report.bucket,
        report.horizon_days
    );
    println!();
    print!("{}", report::render_table(&report.recommendations));
    if report.recommendations.is_empty() {
        println!();
    }

    for chart in &report.charts {
        println!();
        print!("{}", report::render_chart_summary(chart));
    }

    if !report.skipped.is_empty() {
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.ticker.as_str()).collect();
        println!();
        println!("Skipped: {}", skipped.join(", "));
    }
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
