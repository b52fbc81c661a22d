pub mod cache;
pub mod config;
pub mod error;
pub mod finder;
pub mod models;
pub mod resolver;
pub mod sink;
pub mod sync;
