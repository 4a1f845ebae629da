use crate::domain::security::Security;
use std::collections::{BTreeSet, HashMap};

/// Read-only, ordered collection of securities queryable by symbol.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    securities: Vec<Security>,
    by_symbol: HashMap<String, usize>,
}

impl Universe {
    /// Later duplicates of a symbol are ignored; validated snapshots never contain any.
    pub fn new(securities: Vec<Security>) -> Self {
        let mut by_symbol = HashMap::with_capacity(securities.len());
        let mut kept = Vec::with_capacity(securities.len());
        for security in securities {
            if by_symbol.contains_key(&security.symbol) {
                continue;
            }
            by_symbol.insert(security.symbol.clone(), kept.len());
            kept.push(security);
        }
        Self {
            securities: kept,
            by_symbol,
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Security> {
        self.by_symbol
            .get(symbol.trim())
            .map(|&idx| &self.securities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Security> {
        self.securities.iter()
    }

    pub fn as_slice(&self) -> &[Security] {
        &self.securities
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn sectors(&self) -> BTreeSet<&str> {
        self.securities.iter().map(|s| s.sector.as_str()).collect()
    }

    /// Keeps only the securities matching `keep`, preserving order.
    pub fn retain(self, keep: impl Fn(&Security) -> bool) -> Self {
        Self::new(self.securities.into_iter().filter(|s| keep(s)).collect())
    }
}

impl FromIterator<Security> for Universe {
    fn from_iter<T: IntoIterator<Item = Security>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SecurityBuilder;

    #[test]
    fn looks_up_by_trimmed_symbol() {
        let universe: Universe = vec![
            SecurityBuilder::new("TCS").build(),
            SecurityBuilder::new("INFY").sector("Technology").build(),
        ]
        .into_iter()
        .collect();

        assert_eq!(universe.len(), 2);
        assert_eq!(universe.get(" INFY ").map(|s| s.symbol.as_str()), Some("INFY"));
        assert!(universe.get("WIPRO").is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let universe = Universe::new(vec![
            SecurityBuilder::new("TCS").name("First").build(),
            SecurityBuilder::new("TCS").name("Second").build(),
        ]);
        assert_eq!(universe.len(), 1);
        assert_eq!(universe.get("TCS").unwrap().name, "First");
    }
}
