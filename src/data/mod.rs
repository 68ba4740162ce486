//! Price-history and forward-quote collaborators.
//!
//! The simulation core only sees the [`source::PriceHistorySource`] and
//! [`source::ForwardQuoteSource`] traits. File ingestion, caching and retry
//! policy live here, independent of the numerics.

pub mod cache;
pub mod csv_file;
pub mod retry;
pub mod source;
