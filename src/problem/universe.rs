//! Ordered asset universe.

use std::collections::HashSet;
use std::fmt;

use crate::error::{QuboError, Result};

/// An ordered, non-empty sequence of unique asset identifiers.
///
/// Index `i` of the universe is the index of the `i`-th binary decision
/// variable, of `mu[i]` and of row/column `i` of the covariance matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUniverse {
    symbols: Vec<String>,
}

impl AssetUniverse {
    /// Create a universe from a sequence of identifiers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the sequence is empty, contains an
    /// empty identifier, or contains duplicates.
    pub fn new<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();

        if symbols.is_empty() {
            return Err(QuboError::Configuration(
                "Asset universe must contain at least one asset".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for (i, s) in symbols.iter().enumerate() {
            if s.trim().is_empty() {
                return Err(QuboError::Configuration(format!(
                    "Asset identifier at position {} is empty",
                    i
                )));
            }
            if !seen.insert(s.as_str()) {
                return Err(QuboError::Configuration(format!(
                    "Duplicate asset identifier '{}'",
                    s
                )));
            }
        }

        Ok(AssetUniverse { symbols })
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed universe.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All identifiers in universe order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Iterate over identifiers in universe order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }
}

impl fmt::Display for AssetUniverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.symbols.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_order_preserved() {
        let u = AssetUniverse::new(["AAPL", "TSLA", "JPM"]).unwrap();
        assert_eq!(u.len(), 3);
        assert_eq!(u.symbols()[1], "TSLA");
        assert_eq!(u.to_string(), "[AAPL, TSLA, JPM]");
    }

    #[test]
    fn test_empty_universe_rejected() {
        let err = AssetUniverse::new(Vec::<String>::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = AssetUniverse::new(["AAPL", "AAPL"]).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_blank_identifier_rejected() {
        assert!(AssetUniverse::new(["AAPL", " "]).is_err());
    }
}
