//! Model world - the reference implementation of dispatch.
//!
//! The world tracks accounts as plain device tables and decides every
//! request with straight-line rules. It is the oracle the real engine is
//! verified against.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use sealpost_proto::{DeviceId, RegistrationId, ServiceIdentifier};

use super::operation::{
    AccountIndex, AccountSpec, KeyChoice, MAX_MODEL_DEVICES, ModelDevice, ModelIdentifier,
    ModelRecipient, Operation, OperationResult, registration_id,
};

/// Device as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDeviceState {
    /// Current registration id
    pub registration_id: RegistrationId,
    /// Device counts for reconciliation
    pub enabled: bool,
}

/// Account as the model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAccount {
    /// Devices by id
    pub devices: BTreeMap<DeviceId, ModelDeviceState>,
    /// Whether the account accepts sealed sender
    pub has_access_key: bool,
}

impl ModelAccount {
    fn new(index: AccountIndex, spec: AccountSpec) -> Self {
        let devices = spec
            .device_ids()
            .map(|id| (id, ModelDeviceState { registration_id: registration_id(index, id), enabled: true }))
            .collect();
        Self { devices, has_access_key: spec.has_access_key }
    }

    fn enabled(&self) -> impl Iterator<Item = (DeviceId, RegistrationId)> + '_ {
        self.devices.iter().filter(|(_, d)| d.enabled).map(|(id, d)| (*id, d.registration_id))
    }

    fn is_enabled(&self) -> bool {
        self.devices.get(&1).is_some_and(|d| d.enabled)
    }
}

/// Outcome of comparing claims with an account.
enum Verdict {
    Match,
    Mismatched,
    Stale,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    accounts: Vec<ModelAccount>,
    unregistered: HashSet<(AccountIndex, DeviceId)>,
}

impl ModelWorld {
    /// Create a world with one account per spec.
    pub fn new(specs: &[AccountSpec]) -> Self {
        let accounts = specs
            .iter()
            .zip(0..)
            .map(|(spec, index)| ModelAccount::new(index, *spec))
            .collect();
        Self { accounts, unregistered: HashSet::new() }
    }

    /// Number of accounts.
    pub fn num_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Get an account by index.
    pub fn account(&self, index: AccountIndex) -> Option<&ModelAccount> {
        self.accounts.get(usize::from(index))
    }

    /// Apply an operation and return the result the real engine must match.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::SendMulti { recipients, key, story } => {
                self.apply_multi(recipients, *key, *story)
            },
            Operation::SendSingle { destination, sender, key, devices, story } => {
                self.apply_single(*destination, *sender, *key, devices, *story)
            },
            Operation::DisableDevice { account, device } => {
                let device_id = reduce_device(*device);
                if let Some(state) = self
                    .accounts
                    .get_mut(usize::from(*account))
                    .and_then(|a| a.devices.get_mut(&device_id))
                {
                    state.enabled = false;
                }
                OperationResult::Updated
            },
            Operation::UnregisterDevice { account, device } => {
                self.unregistered.insert((*account, reduce_device(*device)));
                OperationResult::Updated
            },
        }
    }

    fn apply_multi(&self, recipients: &[ModelRecipient], key: KeyChoice, story: bool) -> OperationResult {
        let mut seen = HashSet::new();
        if !recipients.iter().all(|r| seen.insert((r.identifier, r.device.device_id()))) {
            return OperationResult::Rejected(422);
        }

        let mut groups: BTreeMap<ModelIdentifier, Vec<ModelDevice>> = BTreeMap::new();
        for recipient in recipients {
            groups.entry(recipient.identifier).or_default().push(recipient.device);
        }

        let mut mismatched = false;
        let mut stale = false;
        let mut unresolved = false;
        for (identifier, devices) in &groups {
            match self.account(identifier.account) {
                Some(account) => match verdict(account, identifier.account, devices, None) {
                    Verdict::Match => {},
                    Verdict::Mismatched => mismatched = true,
                    Verdict::Stale => stale = true,
                },
                None => unresolved = true,
            }
        }

        if mismatched {
            return OperationResult::Rejected(409);
        }
        if stale {
            return OperationResult::Rejected(410);
        }

        if !story {
            if unresolved {
                return OperationResult::Rejected(404);
            }
            let all_have_keys = groups
                .keys()
                .filter_map(|id| self.account(id.account))
                .all(|account| account.has_access_key);
            if !all_have_keys || key != KeyChoice::Correct {
                return OperationResult::Rejected(401);
            }
        }

        let mut uuids404 = BTreeSet::new();
        let mut deliveries = 0;
        for (identifier, devices) in &groups {
            if self.account(identifier.account).is_none() {
                continue;
            }
            for device in devices {
                if self.unregistered.contains(&(identifier.account, device.device_id())) {
                    uuids404.insert(identifier.service_identifier());
                } else {
                    deliveries += 1;
                }
            }
        }

        OperationResult::Multi { uuids404: uuids404.into_iter().collect(), deliveries }
    }

    fn apply_single(
        &self,
        destination: ModelIdentifier,
        sender: Option<(AccountIndex, u8)>,
        key: KeyChoice,
        devices: &[ModelDevice],
        story: bool,
    ) -> OperationResult {
        let sender = sender.map(|(account, device)| (account, reduce_device(device)));
        if sender.is_some() && key != KeyChoice::Missing {
            return OperationResult::Rejected(400);
        }

        let mut seen = HashSet::new();
        if !devices.iter().all(|d| seen.insert(d.device_id())) {
            return OperationResult::Rejected(422);
        }

        let target = self.account(destination.account);
        let sync_device = sender.filter(|(account, _)| *account == destination.account).map(|(_, device)| device);

        if let Some(account) = target {
            match verdict(account, destination.account, devices, sync_device) {
                Verdict::Match => {},
                Verdict::Mismatched => return OperationResult::Rejected(409),
                Verdict::Stale => return OperationResult::Rejected(410),
            }
        }

        if !story {
            let allowed = match sender {
                Some((account, _)) => self.account(account).is_some_and(ModelAccount::is_enabled),
                None => match target {
                    Some(account) => account.has_access_key && key == KeyChoice::Correct,
                    None => key != KeyChoice::Missing,
                },
            };
            if !allowed {
                return OperationResult::Rejected(401);
            }
        }

        if target.is_none() {
            return OperationResult::Single { needs_sync: false, deliveries: 0 };
        }

        let needs_sync = match sender {
            Some((account, _)) if sync_device.is_none() => {
                self.account(account).is_some_and(|a| a.enabled().count() > 1)
            },
            _ => false,
        };

        let deliveries = devices
            .iter()
            .filter(|d| !self.unregistered.contains(&(destination.account, d.device_id())))
            .count();

        OperationResult::Single { needs_sync, deliveries }
    }
}

/// Reconcile claimed devices against an account, ignoring `exclude`.
fn verdict(
    account: &ModelAccount,
    index: AccountIndex,
    devices: &[ModelDevice],
    exclude: Option<DeviceId>,
) -> Verdict {
    let enabled: BTreeMap<DeviceId, RegistrationId> =
        account.enabled().filter(|(id, _)| Some(*id) != exclude).collect();
    let claimed: BTreeSet<DeviceId> = devices.iter().map(|d| d.device_id()).collect();

    let extra = claimed.iter().any(|id| !enabled.contains_key(id));
    let missing = enabled.keys().any(|id| !claimed.contains(id));
    if extra || missing {
        return Verdict::Mismatched;
    }

    let stale = devices
        .iter()
        .any(|d| enabled.get(&d.device_id()) != Some(&d.claimed_registration_id(index)));
    if stale { Verdict::Stale } else { Verdict::Match }
}

/// Device id named by an operation's raw device byte.
pub fn reduce_device(device: u8) -> DeviceId {
    ModelDevice { device, stale: false }.device_id()
}

/// Identifier for an account index, used when reporting.
pub fn identifier(account: AccountIndex, pni: bool) -> ServiceIdentifier {
    ModelIdentifier { account, pni }.service_identifier()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> ModelWorld {
        ModelWorld::new(&[
            AccountSpec { devices: 1, has_access_key: true },
            AccountSpec { devices: 0, has_access_key: false },
        ])
    }

    fn device(device: u8) -> ModelDevice {
        ModelDevice { device, stale: false }
    }

    fn record(account: AccountIndex, device: u8) -> ModelRecipient {
        ModelRecipient { identifier: ModelIdentifier { account, pni: false }, device: self::device(device) }
    }

    #[test]
    fn multi_to_every_device_delivers() {
        let mut world = world();
        let result = world.apply(&Operation::SendMulti {
            recipients: vec![record(0, 0), record(0, 1)],
            key: KeyChoice::Correct,
            story: false,
        });
        assert_eq!(result, OperationResult::Multi { uuids404: vec![], deliveries: 2 });
    }

    #[test]
    fn multi_statuses() {
        let mut world = world();
        let send = |world: &mut ModelWorld, recipients, key, story| {
            world.apply(&Operation::SendMulti { recipients, key, story }).status()
        };

        assert_eq!(send(&mut world, vec![record(0, 0), record(0, 0)], KeyChoice::Correct, false), 422);
        assert_eq!(send(&mut world, vec![record(0, 0)], KeyChoice::Correct, false), 409);
        assert_eq!(send(&mut world, vec![record(0, 0), record(0, 1), record(2, 0)], KeyChoice::Correct, false), 404);
        assert_eq!(send(&mut world, vec![record(0, 0), record(0, 1), record(2, 0)], KeyChoice::Missing, true), 200);
        assert_eq!(send(&mut world, vec![record(1, 0)], KeyChoice::Correct, false), 401);
        assert_eq!(send(&mut world, vec![record(0, 0), record(0, 1)], KeyChoice::Wrong, false), 401);
    }

    #[test]
    fn disabled_device_becomes_extra() {
        let mut world = world();
        world.apply(&Operation::DisableDevice { account: 0, device: 1 });

        let result = world.apply(&Operation::SendMulti {
            recipients: vec![record(0, 0), record(0, 1)],
            key: KeyChoice::Correct,
            story: false,
        });
        assert_eq!(result, OperationResult::Rejected(409));
    }

    #[test]
    fn unregistered_device_is_reported() {
        let mut world = world();
        world.apply(&Operation::UnregisterDevice { account: 0, device: 1 });

        let result = world.apply(&Operation::SendMulti {
            recipients: vec![record(0, 0), record(0, 1)],
            key: KeyChoice::Missing,
            story: true,
        });
        assert_eq!(result, OperationResult::Multi { uuids404: vec![identifier(0, false)], deliveries: 1 });
    }

    #[test]
    fn single_sync_and_needs_sync() {
        let mut world = world();

        let sync = world.apply(&Operation::SendSingle {
            destination: ModelIdentifier { account: 0, pni: false },
            sender: Some((0, 0)),
            key: KeyChoice::Missing,
            devices: vec![device(1)],
            story: false,
        });
        assert_eq!(sync, OperationResult::Single { needs_sync: false, deliveries: 1 });

        let other = world.apply(&Operation::SendSingle {
            destination: ModelIdentifier { account: 1, pni: true },
            sender: Some((0, 0)),
            key: KeyChoice::Missing,
            devices: vec![device(0)],
            story: false,
        });
        assert_eq!(other, OperationResult::Single { needs_sync: true, deliveries: 1 });
    }

    #[test]
    fn single_unknown_destination_is_masked() {
        let mut world = world();
        let result = world.apply(&Operation::SendSingle {
            destination: ModelIdentifier { account: 2, pni: false },
            sender: None,
            key: KeyChoice::Wrong,
            devices: vec![device(0)],
            story: false,
        });
        assert_eq!(result, OperationResult::Single { needs_sync: false, deliveries: 0 });
        assert_eq!(world.num_accounts(), 2);
        assert!(MAX_MODEL_DEVICES >= 2);
    }
}
