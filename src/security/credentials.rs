//! Proxy user credentials.

use std::collections::HashMap;

use crate::config::AuthConfig;

/// Immutable username to password map.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new<I>(users: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.users.clone())
    }

    /// The stored password for `user`.
    pub fn password(&self, user: &str) -> Option<&str> {
        self.users.get(user).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
