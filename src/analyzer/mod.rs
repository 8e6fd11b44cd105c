// Analyzer module: indicator math, snapshot derivation and the candidate filter.

pub mod enrich;
pub mod filter;
pub mod indicators;
