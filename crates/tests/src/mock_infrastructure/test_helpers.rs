//! Test Helper Functions and Utilities
//!
//! Typed fixtures for scripted nodes and their JSON wire forms for HTTP mocks.

use beacon_core::{
    backend::RawSpec,
    types::{Fork, Genesis, Root, SyncState, Version},
};
use chrono::DateTime;
use serde_json::{json, Value};

/// Mainnet genesis time.
pub const MAINNET_GENESIS_TIME: i64 = 1_606_824_023;

/// Creates fork information with the given epoch and current version byte.
#[must_use]
pub fn create_test_fork(epoch: u64, current: u8) -> Fork {
    Fork {
        previous_version: Version([current.saturating_sub(1), 0, 0, 0]),
        current_version: Version([current, 0, 0, 0]),
        epoch,
    }
}

/// Creates mainnet-like genesis information.
#[must_use]
pub fn create_test_genesis() -> Genesis {
    Genesis {
        genesis_time: DateTime::from_timestamp(MAINNET_GENESIS_TIME, 0).unwrap_or_default(),
        genesis_validators_root: Root([0x4b; 32]),
        genesis_fork_version: Version([0, 0, 0, 0]),
    }
}

/// Creates a sync state `distance` slots behind a head at slot 10 000.
#[must_use]
pub fn create_sync_state(distance: u64) -> SyncState {
    SyncState {
        head_slot: 10_000 - distance,
        sync_distance: distance,
        is_syncing: distance > 0,
        is_optimistic: false,
    }
}

/// Creates a raw chain configuration the way a node that omits the sync committee
/// constants reports it.
#[must_use]
pub fn create_raw_spec() -> RawSpec {
    [
        ("CONFIG_NAME", "mainnet"),
        ("PRESET_BASE", "mainnet"),
        ("SLOTS_PER_EPOCH", "32"),
        ("SECONDS_PER_SLOT", "12"),
        ("GENESIS_DELAY", "604800"),
        ("MIN_GENESIS_TIME", "1606824000"),
        ("GENESIS_FORK_VERSION", "0x00000000"),
        ("ALTAIR_FORK_VERSION", "0x01000000"),
        ("ALTAIR_FORK_EPOCH", "74240"),
        ("DOMAIN_BEACON_PROPOSER", "0x00000000"),
        ("DOMAIN_BEACON_ATTESTER", "0x01000000"),
        ("DOMAIN_DEPOSIT", "0x03000000"),
        ("DEPOSIT_CONTRACT_ADDRESS", "0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        ("TERMINAL_TOTAL_DIFFICULTY", "58750000000000000000000"),
        ("MIN_DEPOSIT_AMOUNT", "1000000000"),
        ("PROPOSER_SCORE_BOOST", "40"),
        ("INACTIVITY_SCORE_BIAS", "4"),
        ("BELLATRIX_FORK_EPOCH", "144896"),
        ("SAFE_SLOTS_TO_UPDATE_JUSTIFIED", "8"),
        ("EPOCHS_PER_HISTORICAL_VECTOR", "65536"),
        ("MAX_COMMITTEES_PER_SLOT", "64"),
        ("SHARD_COMMITTEE_PERIOD", "256"),
        ("ZERO_VALUE", "0"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Wraps `data` in the beacon API response envelope.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "data": data })
}

/// Wire form of [`create_test_fork`].
#[must_use]
pub fn create_fork_json(epoch: u64, current: u8) -> Value {
    json!({
        "previous_version": format!("0x{:02x}000000", current.saturating_sub(1)),
        "current_version": format!("0x{current:02x}000000"),
        "epoch": epoch.to_string(),
    })
}

/// Wire form of [`create_test_genesis`].
#[must_use]
pub fn create_genesis_json() -> Value {
    json!({
        "genesis_time": MAINNET_GENESIS_TIME.to_string(),
        "genesis_validators_root": format!("0x{}", "4b".repeat(32)),
        "genesis_fork_version": "0x00000000",
    })
}

/// Wire form of [`create_sync_state`].
#[must_use]
pub fn create_syncing_json(distance: u64) -> Value {
    json!({
        "head_slot": (10_000 - distance).to_string(),
        "sync_distance": distance.to_string(),
        "is_syncing": distance > 0,
        "is_optimistic": false,
    })
}

/// Wire form of [`create_raw_spec`], plus a numeric and a nested entry the way some
/// nodes report them.
#[must_use]
pub fn create_spec_json() -> Value {
    let mut data: serde_json::Map<String, Value> = create_raw_spec()
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    data.insert("MAX_BLOBS_PER_BLOCK".to_string(), json!(6));
    data.insert(
        "BLOB_SCHEDULE".to_string(),
        json!([{ "EPOCH": "269568", "MAX_BLOBS_PER_BLOCK": "6" }]),
    );
    Value::Object(data)
}
