mod config;
pub mod database;
pub mod layout;
pub mod memory;

pub use config::{Config, DisplayConfig, EngineConfig, NotificationsConfig, MAX_INTERVAL_MS};
pub use database::SqliteStore;
pub use layout::StateStore;
pub use memory::MemoryStore;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};

/// Flat string-keyed store.
///
/// Keys are raw; namespacing is applied by [`StateStore`] through an
/// explicit [`Namespace`].
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Apply a batch of writes; `None` removes the key. Backends that can
    /// should make this atomic.
    fn write_batch(&mut self, batch: &[(String, Option<String>)]) -> Result<(), StoreError> {
        for (key, value) in batch {
            match value {
                Some(v) => self.set(key, v)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn write_batch(&mut self, batch: &[(String, Option<String>)]) -> Result<(), StoreError> {
        (**self).write_batch(batch)
    }
}

/// Isolated bucket of settings and timer state ("mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    #[default]
    Default,
    Alternate,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Default, Namespace::Alternate];

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Default => "",
            Namespace::Alternate => "alt_",
        }
    }

    /// Fully qualified store key for `name` in this namespace.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix(), name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Default => "default",
            Namespace::Alternate => "alternate",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Namespace::Default),
            "alternate" | "alt" => Ok(Namespace::Alternate),
            other => Err(ValidationError::UnknownNamespace(other.to_string())),
        }
    }
}

/// Returns the paytick data directory.
///
/// `PAYTICK_HOME` overrides the location outright. Otherwise it is
/// `~/.config/paytick`, or `~/.config/paytick-dev` when `PAYTICK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("PAYTICK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PAYTICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("paytick-dev")
            } else {
                base_dir.join("paytick")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_keys_are_prefixed() {
        assert_eq!(Namespace::Default.key("elapsed"), "elapsed");
        assert_eq!(Namespace::Alternate.key("elapsed"), "alt_elapsed");
    }

    #[test]
    fn namespace_parses_aliases() {
        assert_eq!("Alternate".parse::<Namespace>().unwrap(), Namespace::Alternate);
        assert_eq!("alt".parse::<Namespace>().unwrap(), Namespace::Alternate);
        assert_eq!("default".parse::<Namespace>().unwrap(), Namespace::Default);
        assert!("night".parse::<Namespace>().is_err());
    }
}
