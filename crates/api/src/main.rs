use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use verdict_core::advisory::{advise, AdvisoryReport};
use verdict_core::analytics::{build_matrix, CorrelationPair};
use verdict_core::decision::{decide, InvestmentDecision};
use verdict_core::domain::investor::{Horizon, InvestorContext, RiskProfile};
use verdict_core::domain::security::CapTier;
use verdict_core::domain::universe::Universe;
use verdict_core::explain::{explain, ExplainableResult};
use verdict_core::ingest::provider::{
    HttpJsonUniverseProvider, JsonFileUniverseProvider, UniverseProvider,
};
use verdict_core::portfolio::rebalance::{
    rebalance_signals, PositionDrift, RebalanceSignal, DEFAULT_DRIFT_TOLERANCE,
};
use verdict_core::portfolio::{build_portfolio, PortfolioAllocation};
use verdict_core::scoring::{score_universe, ScoreBreakdown, ScoredSecurity};

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

    let market = match load_market(&settings).await {
        Ok(market) => Some(Arc::new(market)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "universe load failed; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { market });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn load_market(settings: &verdict_core::config::Settings) -> anyhow::Result<Market> {
    let provider: Box<dyn UniverseProvider> = match settings.universe_path.as_deref() {
        Some(path) => Box::new(JsonFileUniverseProvider::new(path)),
        None => Box::new(HttpJsonUniverseProvider::from_settings(settings)?),
    };
    let universe = verdict_core::ingest::load_universe(provider.as_ref(), None).await?;
    Ok(Market::new(universe))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/securities", get(list_securities))
        .route("/securities/:symbol/score", get(get_score))
        .route("/decisions", post(create_decision))
        .route("/portfolios", post(create_portfolio))
        .route("/correlations", get(list_correlations))
        .route("/rebalance", post(create_rebalance))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Universe plus its ranking, computed once at start-up.
#[derive(Debug)]
struct Market {
    universe: Universe,
    ranked: Vec<ScoredSecurity>,
}

impl Market {
    fn new(universe: Universe) -> Self {
        let ranked = score_universe(&universe);
        Self { universe, ranked }
    }

    fn scored(&self, symbol: &str) -> Option<&ScoredSecurity> {
        self.ranked.iter().find(|s| s.symbol() == symbol)
    }
}

#[derive(Debug, Clone)]
struct AppState {
    market: Option<Arc<Market>>,
}

impl AppState {
    fn market(&self) -> Result<&Market, StatusCode> {
        self.market
            .as_deref()
            .ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[derive(Debug, Serialize)]
struct SecuritySummary {
    rank: usize,
    symbol: String,
    name: String,
    sector: String,
    cap_tier: CapTier,
    composite: f64,
}

async fn list_securities(
    State(state): State<AppState>,
) -> Result<Json<Vec<SecuritySummary>>, StatusCode> {
    let market = state.market()?;
    let out = market
        .ranked
        .iter()
        .enumerate()
        .map(|(i, s)| SecuritySummary {
            rank: i + 1,
            symbol: s.security.symbol.clone(),
            name: s.security.name.clone(),
            sector: s.security.sector.clone(),
            cap_tier: s.security.cap_tier,
            composite: s.score.composite,
        })
        .collect();
    Ok(Json(out))
}

async fn get_score(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ScoreBreakdown>, StatusCode> {
    let market = state.market()?;
    let scored = market.scored(&symbol).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(scored.score.clone()))
}

#[derive(Debug, Deserialize)]
struct DecisionRequest {
    symbol: String,
    capital: f64,
    horizon: Horizon,
    risk_profile: RiskProfile,
    #[serde(default)]
    explain: bool,
}

#[derive(Debug, Serialize)]
struct DecisionResponse {
    request_id: Uuid,
    decision: InvestmentDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<ExplainableResult>,
}

async fn create_decision(
    State(state): State<AppState>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, StatusCode> {
    let market = state.market()?;
    let ctx = investor_context(req.capital, req.horizon, req.risk_profile)?;
    let scored = market
        .scored(req.symbol.trim())
        .ok_or(StatusCode::NOT_FOUND)?;

    let request_id = Uuid::new_v4();
    let decision = decide(&scored.security, &scored.score, &ctx, None);
    let explanation = req
        .explain
        .then(|| explain(&scored.security, &scored.score, &decision, Utc::now()));

    tracing::info!(
        %request_id,
        symbol = %scored.security.symbol,
        verdict = %decision.verdict,
        decision_score = decision.decision_score,
        "decision served"
    );

    Ok(Json(DecisionResponse {
        request_id,
        decision,
        explanation,
    }))
}

#[derive(Debug, Deserialize)]
struct PortfolioRequest {
    capital: f64,
    horizon: Horizon,
    risk_profile: RiskProfile,
    #[serde(default)]
    advisory: bool,
}

#[derive(Debug, Serialize)]
struct PortfolioResponse {
    request_id: Uuid,
    allocation: PortfolioAllocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<AdvisoryReport>,
}

async fn create_portfolio(
    State(state): State<AppState>,
    Json(req): Json<PortfolioRequest>,
) -> Result<Json<PortfolioResponse>, StatusCode> {
    let market = state.market()?;
    let ctx = investor_context(req.capital, req.horizon, req.risk_profile)?;

    let request_id = Uuid::new_v4();
    let allocation = build_portfolio(&market.ranked, &ctx);
    let advisory = req.advisory.then(|| advise(&allocation, &market.ranked));

    tracing::info!(
        %request_id,
        positions = allocation.recommendations.len(),
        universe_len = market.universe.len(),
        "portfolio served"
    );

    Ok(Json(PortfolioResponse {
        request_id,
        allocation,
        advisory,
    }))
}

#[derive(Debug, Deserialize)]
struct CorrelationQuery {
    symbol: Option<String>,
}

/// Pairwise correlations across the universe, strongest first. `?symbol=`
/// keeps only the pairs that include that security.
async fn list_correlations(
    State(state): State<AppState>,
    Query(query): Query<CorrelationQuery>,
) -> Result<Json<Vec<CorrelationPair>>, StatusCode> {
    let market = state.market()?;
    let mut pairs = build_matrix(market.ranked.iter().map(|s| &s.security));
    if let Some(symbol) = query.symbol.as_deref().map(str::trim) {
        if market.scored(symbol).is_none() {
            return Err(StatusCode::NOT_FOUND);
        }
        pairs.retain(|p| p.involves(symbol));
    }
    Ok(Json(pairs))
}

#[derive(Debug, Deserialize)]
struct RebalanceRequest {
    positions: Vec<PositionDrift>,
    tolerance: Option<f64>,
}

async fn create_rebalance(
    Json(req): Json<RebalanceRequest>,
) -> Result<Json<Vec<RebalanceSignal>>, StatusCode> {
    let tolerance = req.tolerance.unwrap_or(DEFAULT_DRIFT_TOLERANCE);
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let signals = rebalance_signals(&req.positions, tolerance);
    tracing::info!(
        positions = req.positions.len(),
        signals = signals.len(),
        "rebalance served"
    );
    Ok(Json(signals))
}

fn investor_context(
    capital: f64,
    horizon: Horizon,
    risk_profile: RiskProfile,
) -> Result<InvestorContext, StatusCode> {
    if !capital.is_finite() || capital <= 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(InvestorContext::new(capital, horizon, risk_profile))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

    fn ready() -> AppState {
        let universe =
            parse_snapshot(include_str!("../../../data/universe.sample.json"), None).unwrap();
        AppState {
            market: Some(Arc::new(Market::new(universe))),
        }
    }

    fn degraded() -> AppState {
        AppState { market: None }
    }

    fn unfiltered() -> Query<CorrelationQuery> {
        Query(CorrelationQuery { symbol: None })
    }

    #[tokio::test]
    async fn degraded_mode_returns_503() {
        let err = list_securities(State(degraded())).await.unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);
        let err = get_score(State(degraded()), Path("TCS".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn securities_are_ranked() {
        let Json(list) = list_securities(State(ready())).await.unwrap();
        assert!(list.len() >= 10);
        assert_eq!(list[0].rank, 1);
        assert!(list.windows(2).all(|w| w[0].composite >= w[1].composite));
    }

    #[tokio::test]
    async fn unknown_symbol_is_404() {
        let err = get_score(State(ready()), Path("NOPE".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn decision_with_explanation() {
        let req = DecisionRequest {
            symbol: "TCS".to_string(),
            capital: 500_000.0,
            horizon: Horizon::Long,
            risk_profile: RiskProfile::Conservative,
            explain: true,
        };
        let Json(resp) = create_decision(State(ready()), Json(req)).await.unwrap();
        let explanation = resp.explanation.unwrap();
        assert_eq!(explanation.symbol, "TCS");
        assert_eq!(explanation.verdict, resp.decision.verdict);
    }

    #[tokio::test]
    async fn non_positive_capital_is_400() {
        let req = PortfolioRequest {
            capital: 0.0,
            horizon: Horizon::Medium,
            risk_profile: RiskProfile::Moderate,
            advisory: false,
        };
        let err = create_portfolio(State(ready()), Json(req)).await.unwrap_err();
        assert_eq!(err, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn portfolio_with_advisory() {
        let req = PortfolioRequest {
            capital: 1_000_000.0,
            horizon: Horizon::Medium,
            risk_profile: RiskProfile::Aggressive,
            advisory: true,
        };
        let Json(resp) = create_portfolio(State(ready()), Json(req)).await.unwrap();
        assert!(resp.advisory.is_some());
        let sum: f64 = resp
            .allocation
            .recommendations
            .iter()
            .map(|r| r.allocated_percentage)
            .sum();
        assert!(sum <= 100.0 + 1e-9);
    }

    #[tokio::test]
    async fn correlations_are_strongest_first() {
        let Json(pairs) = list_correlations(State(ready()), unfiltered())
            .await
            .unwrap();
        assert!(!pairs.is_empty());
        assert!(pairs
            .windows(2)
            .all(|w| w[0].correlation.abs() >= w[1].correlation.abs()));
        assert!(pairs.iter().all(|p| p.correlation.is_finite()));
    }

    #[tokio::test]
    async fn correlations_filter_by_symbol() {
        let all = list_correlations(State(ready()), unfiltered())
            .await
            .unwrap()
            .0;
        let query = CorrelationQuery {
            symbol: Some("TCS".to_string()),
        };
        let Json(pairs) = list_correlations(State(ready()), Query(query)).await.unwrap();
        let market_len = ready().market().unwrap().ranked.len();
        assert_eq!(pairs.len(), market_len - 1);
        assert!(pairs.iter().all(|p| p.involves("TCS")));
        assert!(pairs.len() < all.len());

        let unknown = CorrelationQuery {
            symbol: Some("NOPE".to_string()),
        };
        let err = list_correlations(State(ready()), Query(unknown)).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);

        let err = list_correlations(State(degraded()), unfiltered())
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rebalance_uses_default_tolerance() {
        let req: RebalanceRequest = serde_json::from_value(serde_json::json!({
            "positions": [
                {"symbol": "TCS", "current_allocation": 21.0, "target_allocation": 15.0, "current_price": 4000.0},
                {"symbol": "INFY", "current_allocation": 14.0, "target_allocation": 15.0, "current_price": 1500.0},
                {"symbol": "ITC", "current_allocation": 7.0, "target_allocation": 10.0, "current_price": 450.0}
            ]
        }))
        .unwrap();
        let Json(signals) = create_rebalance(Json(req)).await.unwrap();
        let symbols: Vec<_> = signals.iter().map(|s| s.stock_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["TCS", "ITC"]);

        let bad = RebalanceRequest {
            positions: Vec::new(),
            tolerance: Some(-1.0),
        };
        assert_eq!(
            create_rebalance(Json(bad)).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn request_body_uses_lowercase_enums() {
        let req: DecisionRequest = serde_json::from_value(serde_json::json!({
            "symbol": "INFY",
            "capital": 250000,
            "horizon": "short",
            "risk_profile": "moderate"
        }))
        .unwrap();
        assert_eq!(req.horizon, Horizon::Short);
        assert!(!req.explain);
    }
}
