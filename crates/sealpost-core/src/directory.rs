//! Account resolution.

use std::sync::Arc;

use async_trait::async_trait;
use sealpost_proto::ServiceIdentifier;

use crate::account::Account;

/// Read-only view of the account store.
///
/// The engine calls [`resolve`](Self::resolve) at most once per distinct
/// identifier per request.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Look up the account addressed by `identifier`.
    ///
    /// ACI and PNI forms of the same account resolve to the same account.
    async fn resolve(&self, identifier: &ServiceIdentifier) -> Option<Arc<Account>>;
}
