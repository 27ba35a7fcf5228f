//! In-memory account directory.

use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use sealpost_core::{Account, AccountDirectory};
use sealpost_proto::ServiceIdentifier;

/// Account directory backed by a hash map.
///
/// Every account is reachable under both its ACI and its PNI. Lookups are
/// counted so tests can assert how often the store was consulted.
#[derive(Debug, Default)]
pub struct MemoryAccountDirectory {
    accounts: RwLock<HashMap<ServiceIdentifier, Arc<Account>>>,
    lookups: AtomicUsize,
}

impl MemoryAccountDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `accounts`.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let directory = Self::new();
        for account in accounts {
            directory.insert(account);
        }
        directory
    }

    /// Register or replace an account under both of its identifiers.
    pub fn insert(&self, account: Account) -> Arc<Account> {
        let account = Arc::new(account);
        let mut accounts = self.accounts.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        accounts.insert(account.aci_identifier(), Arc::clone(&account));
        accounts.insert(account.pni_identifier(), Arc::clone(&account));
        account
    }

    /// Look up an account without counting it as a lookup.
    pub fn get(&self, identifier: &ServiceIdentifier) -> Option<Arc<Account>> {
        let accounts = self.accounts.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        accounts.get(identifier).cloned()
    }

    /// Number of [`resolve`](AccountDirectory::resolve) calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountDirectory for MemoryAccountDirectory {
    async fn resolve(&self, identifier: &ServiceIdentifier) -> Option<Arc<Account>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.get(identifier)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn account() -> Account {
        Account { aci: Uuid::from_u128(1), pni: Uuid::from_u128(2), devices: vec![], access_key: None }
    }

    #[tokio::test]
    async fn resolves_both_identifiers_to_one_account() {
        let directory = MemoryAccountDirectory::with_accounts([account()]);

        let by_aci = directory.resolve(&ServiceIdentifier::Aci(Uuid::from_u128(1))).await;
        let by_pni = directory.resolve(&ServiceIdentifier::Pni(Uuid::from_u128(2))).await;

        let (by_aci, by_pni) = (by_aci.expect("aci"), by_pni.expect("pni"));
        assert!(Arc::ptr_eq(&by_aci, &by_pni));
        assert_eq!(directory.lookups(), 2);
    }

    #[tokio::test]
    async fn namespaces_do_not_cross() {
        let directory = MemoryAccountDirectory::with_accounts([account()]);

        assert!(directory.resolve(&ServiceIdentifier::Pni(Uuid::from_u128(1))).await.is_none());
        assert!(directory.get(&ServiceIdentifier::Aci(Uuid::from_u128(1))).is_some());
        assert_eq!(directory.lookups(), 1);
    }
}
