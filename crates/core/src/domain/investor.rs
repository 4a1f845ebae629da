use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "moderate" => Ok(RiskProfile::Moderate),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => anyhow::bail!("unknown risk profile: {other}"),
        }
    }
}

/// Investment duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    pub fn as_str(self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Medium => "medium",
            Horizon::Long => "long",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Horizon::Short),
            "medium" => Ok(Horizon::Medium),
            "long" => Ok(Horizon::Long),
            other => anyhow::bail!("unknown horizon: {other}"),
        }
    }
}

/// Caller-supplied investor inputs. Range validation (capital > 0) belongs to
/// the caller; the engine tolerates boundary values such as zero capital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestorContext {
    pub capital: f64,
    pub horizon: Horizon,
    pub risk_profile: RiskProfile,
}

impl InvestorContext {
    pub fn new(capital: f64, horizon: Horizon, risk_profile: RiskProfile) -> Self {
        Self {
            capital,
            horizon,
            risk_profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("Conservative".parse::<RiskProfile>().unwrap(), RiskProfile::Conservative);
        assert_eq!(" long ".parse::<Horizon>().unwrap(), Horizon::Long);
        assert!("reckless".parse::<RiskProfile>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let ctx = InvestorContext::new(1_000_000.0, Horizon::Medium, RiskProfile::Aggressive);
        let v = serde_json::to_value(ctx).unwrap();
        assert_eq!(v["horizon"], "medium");
        assert_eq!(v["risk_profile"], "aggressive");
    }
}
