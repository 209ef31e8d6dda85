//! Day-by-day activity pattern: which days are active, how many events each
//! gets, and when during business hours they land.

pub mod config;
pub mod generator;
pub mod random;

pub use config::ActivityConfig;
pub use generator::{ActivityGenerator, RunReport, RunSummary};
pub use random::Sampler;
