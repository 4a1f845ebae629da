pub mod error;
pub mod provider;

use crate::domain::universe::Universe;
use chrono::NaiveDate;
use provider::UniverseProvider;

/// Fetches a snapshot and validates it into a `Universe`.
pub async fn load_universe(
    provider: &dyn UniverseProvider,
    as_of_date: Option<NaiveDate>,
) -> anyhow::Result<Universe> {
    let snapshot = provider.fetch_universe(as_of_date).await?;
    let snapshot_date = snapshot.as_of_date;
    let universe = snapshot.validate_and_into_universe(as_of_date)?;
    tracing::info!(
        provider = provider.provider_name(),
        %snapshot_date,
        securities = universe.len(),
        sectors = universe.sectors().len(),
        "universe loaded"
    );
    Ok(universe)
}
