//! Fuzz target for device-set reconciliation
//!
//! Prevent misreported device topology
//!
//! # Strategy
//!
//! - Arbitrary authoritative device tables with enabled and disabled devices
//! - Arbitrary claims, including unknown devices and outdated registration
//!   ids
//!
//! # Invariants
//!
//! - `Match` only when the claim equals the enabled set exactly
//! - `Mismatched` lists are sorted, disjoint and non-empty in total
//! - `Stale` only when the id sets are equal, and lists only claimed devices
//! - NEVER panic

#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealpost_core::{ClaimedDevices, DeviceSet, DeviceState, Reconciliation, reconcile};

#[derive(Debug, Arbitrary)]
struct Input {
    devices: Vec<(u8, u16, bool)>,
    claimed: Vec<(u8, u16)>,
}

fuzz_target!(|input: Input| {
    let devices = DeviceSet::new(input.devices.iter().map(|&(id, registration_id, enabled)| {
        (u64::from(id), DeviceState { registration_id, enabled })
    }));
    let claimed: ClaimedDevices =
        input.claimed.iter().map(|&(id, registration_id)| (u64::from(id), registration_id)).collect();

    let enabled: BTreeMap<u64, u16> = devices.enabled().collect();
    let enabled_ids: BTreeSet<u64> = enabled.keys().copied().collect();
    let claimed_ids: BTreeSet<u64> = claimed.keys().copied().collect();

    match reconcile(&devices, &claimed) {
        Reconciliation::Match => {
            assert_eq!(enabled, claimed);
        },
        Reconciliation::Mismatched { missing, extra } => {
            assert!(!missing.is_empty() || !extra.is_empty());
            assert!(missing.windows(2).all(|w| w[0] < w[1]));
            assert!(extra.windows(2).all(|w| w[0] < w[1]));
            assert!(missing.iter().all(|id| enabled_ids.contains(id) && !claimed_ids.contains(id)));
            assert!(extra.iter().all(|id| claimed_ids.contains(id) && !enabled_ids.contains(id)));
        },
        Reconciliation::Stale { stale } => {
            assert_eq!(enabled_ids, claimed_ids);
            assert!(!stale.is_empty());
            assert!(stale.iter().all(|id| enabled.get(id) != claimed.get(id)));
        },
    }
});
