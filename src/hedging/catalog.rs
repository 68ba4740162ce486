use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{HedgingError, HedgingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Put,
    Call,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "put"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// A bank-quoted FX option on USD/DKK.
///
/// `strike` is in DKK per USD; `notional` and `premium` are in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionProduct {
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub maturity_months: u32,
    pub strike: f64,
    pub notional: f64,
    pub premium: f64,
}

impl OptionProduct {
    pub fn put(maturity_months: u32, strike: f64, notional: f64, premium: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            maturity_months,
            strike,
            notional,
            premium,
        }
    }

    /// Intrinsic value per unit of notional at terminal rate `rate`.
    pub fn payoff(&self, rate: f64) -> f64 {
        match self.option_type {
            OptionType::Put => (self.strike - rate).max(0.0),
            OptionType::Call => (rate - self.strike).max(0.0),
        }
    }

    /// Premium per unit of notional, in USD.
    pub fn premium_rate(&self) -> f64 {
        self.premium / self.notional
    }

    /// Same product resized to `new_notional`; see [`scale_option_product`].
    pub fn scaled(&self, new_notional: f64) -> HedgingResult<Self> {
        scale_option_product(self, new_notional)
    }

    fn validate(&self) -> HedgingResult<()> {
        if !(self.notional.is_finite() && self.notional > 0.0) {
            return Err(HedgingError::InvalidNotional(self.notional));
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(HedgingError::invalid_config(format!(
                "{}m {} strike must be positive, got {}",
                self.maturity_months, self.option_type, self.strike
            )));
        }
        if !(self.premium.is_finite() && self.premium >= 0.0) {
            return Err(HedgingError::invalid_config(format!(
                "{}m {} premium must be non-negative, got {}",
                self.maturity_months, self.option_type, self.premium
            )));
        }
        Ok(())
    }
}

/// Resize an option to `new_notional`, scaling the premium by the same
/// ratio and leaving strike, type and maturity untouched.
///
/// # Examples
///
/// ```
/// use fx_hedging_engine::hedging::catalog::{scale_option_product, OptionProduct};
///
/// let original = OptionProduct::put(3, 7.0753, 500_000.0, 10_000.0);
/// let scaled = scale_option_product(&original, 1_000_000.0).unwrap();
/// assert_eq!(scaled.premium, 20_000.0);
/// assert_eq!(scaled.strike, original.strike);
/// assert_eq!(original.notional, 500_000.0);
/// ```
pub fn scale_option_product(
    product: &OptionProduct,
    new_notional: f64,
) -> HedgingResult<OptionProduct> {
    if !(new_notional.is_finite() && new_notional > 0.0) {
        return Err(HedgingError::InvalidNotional(new_notional));
    }
    if !(product.notional.is_finite() && product.notional > 0.0) {
        return Err(HedgingError::InvalidNotional(product.notional));
    }
    let ratio = new_notional / product.notional;
    Ok(OptionProduct {
        notional: new_notional,
        premium: product.premium * ratio,
        ..*product
    })
}

/// Immutable table of option products keyed by maturity in months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionProductCatalog {
    products: BTreeMap<u32, OptionProduct>,
}

impl Default for OptionProductCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl OptionProductCatalog {
    /// Build a catalog, rejecting invalid or duplicate-tenor products.
    pub fn new(products: impl IntoIterator<Item = OptionProduct>) -> HedgingResult<Self> {
        let mut map = BTreeMap::new();
        for product in products {
            product.validate()?;
            if map.insert(product.maturity_months, product).is_some() {
                return Err(HedgingError::invalid_config(format!(
                    "duplicate {}m product in catalog",
                    product.maturity_months
                )));
            }
        }
        if map.is_empty() {
            return Err(HedgingError::invalid_config("option catalog is empty"));
        }
        Ok(Self { products: map })
    }

    /// Retail USD/DKK put products: quoted 3m and 12m puts with a 10 000 USD
    /// premium, and a 6m product interpolated between them.
    pub fn standard() -> Self {
        let (strike_3m, notional_3m) = (7.0753, 526_315.79);
        let (strike_12m, notional_12m) = (6.9457, 270_270.27);
        let premium = 10_000.0;

        let mut products = BTreeMap::new();
        products.insert(3, OptionProduct::put(3, strike_3m, notional_3m, premium));
        products.insert(
            6,
            OptionProduct::put(
                6,
                (strike_3m + strike_12m) / 2.0,
                notional_3m + (3.0 / 9.0) * (notional_12m - notional_3m),
                premium,
            ),
        );
        products.insert(12, OptionProduct::put(12, strike_12m, notional_12m, premium));
        Self { products }
    }

    pub fn get(&self, maturity_months: u32) -> Option<&OptionProduct> {
        self.products.get(&maturity_months)
    }

    /// Product whose tenor is closest to `months`; ties go to the shorter tenor.
    pub fn select(&self, months: f64) -> HedgingResult<&OptionProduct> {
        if !(months.is_finite() && months > 0.0) {
            return Err(HedgingError::invalid_exposure(format!(
                "horizon must be positive, got {} months",
                months
            )));
        }
        self.products
            .values()
            .min_by(|a, b| {
                let da = (a.maturity_months as f64 - months).abs();
                let db = (b.maturity_months as f64 - months).abs();
                da.total_cmp(&db)
                    .then(a.maturity_months.cmp(&b.maturity_months))
            })
            .ok_or_else(|| HedgingError::invalid_config("option catalog is empty"))
    }

    pub fn tenors(&self) -> Vec<u32> {
        self.products.keys().copied().collect()
    }

    pub fn products(&self) -> impl Iterator<Item = &OptionProduct> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
