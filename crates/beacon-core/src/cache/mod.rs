//! Process-lifetime caching of immutable query results.

pub mod single_flight;

pub use single_flight::SingleFlight;
