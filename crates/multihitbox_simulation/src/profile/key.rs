//! ResourceKey — `namespace:path` идентификатор контента
//!
//! Ключ таблиц синхронизации и тип актора (`ActorTypeId`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProfileError;

/// Namespace для ключей без явного `namespace:`
pub const DEFAULT_NAMESPACE: &str = "multihitbox";

/// Content key (`namespace:path`)
///
/// # Examples
/// - "multihitbox:dragon"
/// - "bosses:golem/stone"
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey(String);

/// Тип актора = ключ его профиля
pub type ActorTypeId = ResourceKey;

impl ResourceKey {
    /// Parse `namespace:path` (или просто `path` → default namespace)
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, raw),
        };

        if namespace.is_empty() {
            return Err(invalid(raw, "empty namespace"));
        }
        if path.is_empty() {
            return Err(invalid(raw, "empty path"));
        }
        if !namespace.chars().all(is_namespace_char) {
            return Err(invalid(raw, "namespace allows only [a-z0-9_.-]"));
        }
        if !path.chars().all(|c| is_namespace_char(c) || c == '/') {
            return Err(invalid(raw, "path allows only [a-z0-9_.-/]"));
        }

        Ok(Self(format!("{}:{}", namespace, path)))
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, path)| path).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_namespace_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')
}

fn invalid(raw: &str, reason: &'static str) -> ProfileError {
    ProfileError::InvalidResourceKey {
        key: raw.to_string(),
        reason,
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for ResourceKey {
    type Error = ProfileError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
