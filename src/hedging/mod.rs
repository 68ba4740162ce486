pub mod catalog;
pub mod payoff;
pub mod stats;
