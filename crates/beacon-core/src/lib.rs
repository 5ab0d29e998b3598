//! # Beacon Core
//!
//! Multi-backend access layer for the beacon node REST API.
//!
//! Callers get one strongly-typed query surface whether they talk to a single node or to
//! several redundant ones. The crate hides which backend answered, absorbs transient backend
//! failures and smooths over differences in how implementations encode the same value.
//!
//! - **[`registry`]**: capability-indexed table of active backends, lock-free for readers.
//!
//! - **[`dispatch`]**: runs one query against eligible backends under a pass-through,
//!   first-success or best-of-N strategy and aggregates per-backend failures.
//!
//! - **[`normalize`]**: ordered decode rules turning the raw chain configuration into typed
//!   values, with defaults for constants some implementations omit.
//!
//! - **[`cache`]**: single-flight compute-once cache for immutable answers.
//!
//! - **[`client`]**: the typed [`BeaconClient`] tying the pieces together.
//!
//! - **[`backend`]**: the [`BeaconNode`] transport trait and the reference [`HttpNode`].
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       BeaconClient                        │
//! │  ┌──────────────────┐  ┌────────────────┐  ┌───────────┐  │
//! │  │  DispatchEngine  │  │  SingleFlight  │  │ normalize │  │
//! │  └────────┬─────────┘  └────────────────┘  └───────────┘  │
//! │           │                                               │
//! │  ┌────────▼─────────┐                                     │
//! │  │CapabilityRegistry│                                     │
//! │  └────────┬─────────┘                                     │
//! └───────────┼───────────────────────────────────────────────┘
//!             │ handles_for(capability)
//!      ┌──────┴───────┬──────────────┐
//!      ▼              ▼              ▼
//!  BeaconNode     BeaconNode     BeaconNode
//!  (HttpNode)     (HttpNode)     (custom)
//! ```
//!
//! ## Query Flow
//!
//! ```text
//! client.spec(&cancel)
//!       │
//!       ▼
//! ┌──────────────┐
//! │ SingleFlight │ ─── Stored ──► Arc<ChainSpec>
//! └──────┬───────┘
//!        │ First caller (others join the flight)
//!        ▼
//! ┌────────────────┐
//! │ DispatchEngine │ ─── No backend ──► Unsupported
//! └──────┬─────────┘
//!        │ Strategy
//!        ▼
//!  backend A ── fail ──► backend B ── ok ──► normalize ──► stored
//! ```

pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod normalize;
pub mod registry;
pub mod types;
pub mod utils;

pub use backend::{BackendError, BeaconNode, Capability, CapabilitySet, HttpNode};
pub use client::{BeaconClient, BeaconClientBuilder, ClientError};
pub use dispatch::{DispatchEngine, DispatchError, Dispatched, Strategy};
pub use normalize::{ChainSpec, SpecValue};
pub use registry::CapabilityRegistry;
