use verdict_core::domain::security::Security;
use verdict_core::domain::universe::Universe;

#[derive(Debug, Clone, Default)]
pub struct UniverseOptions {
    /// Drop securities trading fewer shares than this on average.
    pub min_avg_volume: Option<f64>,

    /// Keep ETFs and index funds, which are excluded by default.
    pub include_funds: bool,
}

impl UniverseOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("UNIVERSE_MIN_AVG_VOLUME") {
            if let Ok(n) = s.parse::<f64>() {
                out.min_avg_volume = Some(n);
            }
        }

        if let Ok(s) = std::env::var("UNIVERSE_INCLUDE_FUNDS") {
            out.include_funds = matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        out
    }
}

/// Applies the screening options, keeping the original order.
pub fn screen_universe(universe: Universe, opts: &UniverseOptions) -> anyhow::Result<Universe> {
    let before = universe.len();
    let screened = universe.retain(|s| {
        (opts.include_funds || !is_fund(s))
            && opts.min_avg_volume.map_or(true, |min| s.price.avg_volume >= min)
    });

    anyhow::ensure!(
        !screened.is_empty(),
        "no securities left after screening ({before} before; min_avg_volume={:?}, include_funds={})",
        opts.min_avg_volume,
        opts.include_funds
    );

    if screened.len() < before {
        tracing::info!(
            before,
            after = screened.len(),
            "universe screened"
        );
    }
    Ok(screened)
}

fn is_fund(security: &Security) -> bool {
    // Snapshots carry no instrument type, so go by name and classification.
    let name = security.name.to_ascii_lowercase();
    let industry = security.industry.to_ascii_lowercase();
    let sector = security.sector.to_ascii_lowercase();

    name.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| matches!(word, "etf" | "etn" | "bees" | "fof"))
        || name.contains("index fund")
        || industry.contains("exchange traded")
        || sector == "index fund"
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::domain::contract::parse_snapshot;

    fn sample() -> Universe {
        parse_snapshot(
            include_str!("../../../data/universe.sample.json"),
            None,
        )
        .unwrap()
    }

    #[test]
    fn excludes_funds_unless_included() {
        let universe = sample();
        assert!(universe.get("NIFTYBEES").is_some());

        let screened = screen_universe(universe.clone(), &UniverseOptions::default()).unwrap();
        assert!(screened.get("NIFTYBEES").is_none());
        assert_eq!(screened.len(), universe.len() - 1);

        let opts = UniverseOptions {
            include_funds: true,
            ..Default::default()
        };
        let kept = screen_universe(universe.clone(), &opts).unwrap();
        assert_eq!(kept.len(), universe.len());
    }

    #[test]
    fn fund_names_are_recognised() {
        let universe = sample();
        let name_of = |sym: &str| universe.get(sym).unwrap().clone();
        assert!(is_fund(&name_of("NIFTYBEES")));
        assert!(!is_fund(&name_of("TCS")));
        // "Bees" inside a word is not a fund marker.
        let mut honey = name_of("TCS");
        honey.name = "Honeybees Agro Ltd".to_string();
        assert!(!is_fund(&honey));
    }

    #[test]
    fn volume_floor_applies_and_empty_result_errors() {
        let opts = UniverseOptions {
            min_avg_volume: Some(5_000_000.0),
            ..Default::default()
        };
        let screened = screen_universe(sample(), &opts).unwrap();
        assert!(screened.iter().all(|s| s.price.avg_volume >= 5_000_000.0));

        let opts = UniverseOptions {
            min_avg_volume: Some(f64::MAX),
            ..Default::default()
        };
        assert!(screen_universe(sample(), &opts).is_err());
    }
}
