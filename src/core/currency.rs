use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::HedgingError;

/// ISO 4217-style currency code.
///
/// # Examples
///
/// ```
/// use fx_hedging_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let dkk = CurrencyCode::new("DKK");
/// assert_ne!(usd, dkk);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Quote convention of an exchange rate: a price is the number of `quote`
/// units paid for one unit of `base`.
///
/// `USD/DKK` at 7.0 means one US dollar costs seven Danish kroner.
///
/// # Examples
///
/// ```
/// use fx_hedging_engine::core::currency::CurrencyPair;
///
/// let pair: CurrencyPair = "DKK/USD".parse().unwrap();
/// assert_eq!(pair.inverted().to_string(), "USD/DKK");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self { base, quote }
    }

    /// The reciprocal convention (base and quote swapped).
    pub fn inverted(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    /// True if `other` quotes the same two currencies in the opposite direction.
    pub fn is_inverse_of(&self, other: &CurrencyPair) -> bool {
        self.base == other.quote && self.quote == other.base
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = HedgingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .filter(|(b, q)| !b.trim().is_empty() && !q.trim().is_empty())
            .ok_or_else(|| {
                HedgingError::invalid_config(format!(
                    "currency pair must look like BASE/QUOTE, got '{}'",
                    s
                ))
            })?;
        Ok(Self::new(
            CurrencyCode::new(base.trim().to_uppercase()),
            CurrencyCode::new(quote.trim().to_uppercase()),
        ))
    }
}
