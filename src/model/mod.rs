pub mod garch;
pub mod optimizer;
