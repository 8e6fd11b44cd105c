pub mod analyzer;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod utils;
