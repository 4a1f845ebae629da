use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdict_core::advisory::{advise, AdvisoryReport};
use verdict_core::decision::{decide_security, InvestmentDecision};
use verdict_core::domain::investor::{Horizon, InvestorContext, RiskProfile};
use verdict_core::domain::universe::Universe;
use verdict_core::explain::{explain, ExplainableResult};
use verdict_core::ingest::provider::{
    HttpJsonUniverseProvider, JsonFileUniverseProvider, UniverseProvider,
};
use verdict_core::portfolio::{build_portfolio, PortfolioAllocation};
use verdict_core::scoring::{score_universe, ScoreBreakdown};

mod universe;

#[derive(Debug, Parser)]
#[command(name = "verdict_worker")]
struct Args {
    /// Universe snapshot JSON file. Falls back to UNIVERSE_PATH, then to the
    /// HTTP provider at UNIVERSE_BASE_URL.
    #[arg(long)]
    universe: Option<PathBuf>,

    /// Market as-of date (YYYY-MM-DD) the snapshot must describe.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Capital to deploy, in rupees.
    #[arg(long, default_value_t = 1_000_000.0)]
    capital: f64,

    #[arg(long, default_value = "medium")]
    horizon: Horizon,

    #[arg(long, default_value = "moderate")]
    risk_profile: RiskProfile,

    /// Decide and explain one security instead of building a portfolio.
    #[arg(long)]
    symbol: Option<String>,

    /// Attach the advisory report to a portfolio run.
    #[arg(long)]
    advisory: bool,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Load and validate the universe, then stop.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report {
    Decision {
        as_of_date: Option<NaiveDate>,
        score: ScoreBreakdown,
        decision: InvestmentDecision,
        explanation: ExplainableResult,
    },
    Portfolio {
        as_of_date: Option<NaiveDate>,
        allocation: PortfolioAllocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        advisory: Option<AdvisoryReport>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = verdict_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "worker run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: &verdict_core::config::Settings) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.capital.is_finite() && args.capital > 0.0,
        "--capital must be positive (got {})",
        args.capital
    );

    let file = args
        .universe
        .clone()
        .or_else(|| settings.universe_path.as_ref().map(PathBuf::from));

    let (provider, as_of_date): (Box<dyn UniverseProvider>, Option<NaiveDate>) = match file {
        Some(path) => {
            let as_of_date = args
                .as_of_date
                .as_deref()
                .map(|s| verdict_core::time::resolve_as_of_date(Some(s), Utc::now()))
                .transpose()?;
            (Box::new(JsonFileUniverseProvider::new(path)), as_of_date)
        }
        None => {
            // A live provider is asked for the latest closed market date.
            let as_of_date =
                verdict_core::time::resolve_as_of_date(args.as_of_date.as_deref(), Utc::now())?;
            let provider = HttpJsonUniverseProvider::from_settings(settings)
                .context("no --universe or UNIVERSE_PATH given and the HTTP provider is not configured")?;
            (Box::new(provider), Some(as_of_date))
        }
    };

    let universe = verdict_core::ingest::load_universe(provider.as_ref(), as_of_date).await?;
    let universe = universe::screen_universe(universe, &universe::UniverseOptions::from_env())?;

    if args.dry_run {
        tracing::info!(
            as_of_date = ?as_of_date,
            dry_run = true,
            securities = universe.len(),
            "universe validated (dry-run)"
        );
        return Ok(());
    }

    let ctx = InvestorContext::new(args.capital, args.horizon, args.risk_profile);
    let report = match args.symbol.as_deref() {
        Some(symbol) => decision_report(&universe, symbol, &ctx, as_of_date)?,
        None => portfolio_report(&universe, &ctx, as_of_date, args.advisory),
    };

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn decision_report(
    universe: &Universe,
    symbol: &str,
    ctx: &InvestorContext,
    as_of_date: Option<NaiveDate>,
) -> anyhow::Result<Report> {
    let security = universe
        .get(symbol.trim())
        .with_context(|| format!("symbol {symbol:?} is not in the universe"))?;

    let (score, decision) = decide_security(security, ctx, None);
    let explanation = explain(security, &score, &decision, Utc::now());
    tracing::info!(
        %symbol,
        verdict = %decision.verdict,
        decision_score = decision.decision_score,
        confidence = decision.confidence,
        "decision made"
    );

    Ok(Report::Decision {
        as_of_date,
        score,
        decision,
        explanation,
    })
}

fn portfolio_report(
    universe: &Universe,
    ctx: &InvestorContext,
    as_of_date: Option<NaiveDate>,
    with_advisory: bool,
) -> Report {
    let ranked = score_universe(universe);
    let allocation = build_portfolio(&ranked, ctx);
    if allocation.recommendations.is_empty() {
        tracing::warn!(
            risk_profile = %ctx.risk_profile,
            horizon = %ctx.horizon,
            "no security passed the screens; portfolio is empty"
        );
    }
    let advisory = with_advisory.then(|| advise(&allocation, &ranked));

    Report::Portfolio {
        as_of_date,
        allocation,
        advisory,
    }
}

fn init_sentry(settings: &verdict_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::domain::contract::parse_snapshot;

    fn sample() -> Universe {
        parse_snapshot(include_str!("../../../data/universe.sample.json"), None).unwrap()
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "verdict_worker",
            "--universe",
            "data/universe.sample.json",
            "--capital",
            "500000",
            "--horizon",
            "long",
            "--risk-profile",
            "Aggressive",
            "--advisory",
        ])
        .unwrap();
        assert_eq!(args.horizon, Horizon::Long);
        assert_eq!(args.risk_profile, RiskProfile::Aggressive);
        assert!(args.advisory && !args.dry_run);
        assert!(Args::try_parse_from(["verdict_worker", "--horizon", "forever"]).is_err());
    }

    #[test]
    fn decision_report_rejects_unknown_symbol() {
        let ctx = InvestorContext::new(1_000_000.0, Horizon::Medium, RiskProfile::Moderate);
        assert!(decision_report(&sample(), "NOPE", &ctx, None).is_err());
        let report = decision_report(&sample(), "TCS", &ctx, None).unwrap();
        let v = serde_json::to_value(report).unwrap();
        assert_eq!(v["explanation"]["symbol"], "TCS");
        assert!(v["decision"]["verdict"].is_string());
    }

    #[test]
    fn portfolio_report_attaches_advisory_on_request() {
        let ctx = InvestorContext::new(1_000_000.0, Horizon::Long, RiskProfile::Aggressive);
        let v = serde_json::to_value(portfolio_report(&sample(), &ctx, None, true)).unwrap();
        assert!(v["allocation"]["recommendations"].is_array());
        assert!(v["advisory"]["investment_strategy"].is_string());

        let v = serde_json::to_value(portfolio_report(&sample(), &ctx, None, false)).unwrap();
        assert!(v.get("advisory").is_none());
    }
}
