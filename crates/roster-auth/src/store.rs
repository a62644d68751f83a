//! In-memory identity store seeded at startup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::AuthError;
use crate::types::{IdentityStore, PrincipalRecord};

/// Fixed set of principals held in memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    principals: HashMap<String, PrincipalRecord>,
}

impl InMemoryIdentityStore {
    /// Build a store from records; a later duplicate name replaces an earlier one.
    pub fn new(records: impl IntoIterator<Item = PrincipalRecord>) -> Self {
        Self {
            principals: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
        }
    }

    /// Number of known principals.
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Whether the store knows no principals.
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn lookup_principal(&self, name: &str) -> Result<PrincipalRecord, AuthError> {
        self.principals
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::UnknownPrincipal(name.to_string()))
    }
}
