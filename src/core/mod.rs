pub mod currency;
pub mod error;
pub mod quote;
pub mod series;
