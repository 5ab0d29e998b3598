//! Multi-backend dispatch.
//!
//! - [`engine`]: [`DispatchEngine`], which runs one query against the eligible backends
//! - [`strategy`]: pass-through, first-success and best-of-N strategies plus rankings
//! - [`errors`]: [`DispatchError`] and the [`Dispatched`] success envelope
//! - [`config`]: runtime-tunable [`DispatchConfig`]

pub mod config;
pub mod engine;
pub mod errors;
pub mod strategy;

pub use config::{DispatchConfig, StrategyKind};
pub use engine::DispatchEngine;
pub use errors::{Attempt, DispatchError, Dispatched};
pub use strategy::{HighestBy, LowestBy, Majority, Ranking, Strategy};
