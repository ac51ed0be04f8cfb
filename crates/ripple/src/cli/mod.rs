//! CLI command implementations.

mod display;

pub mod affected;
pub mod graph;
pub mod rebuild;
pub mod run;
