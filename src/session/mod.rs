//! AWS session abstraction consulted while resolving a remote.
//!
//! Everything the resolver needs to know about the user's AWS setup is
//! read through the `Session` trait, so that profile files, region
//! metadata and credential providers can all be swapped out in tests.
use std::future::Future;
use std::pin::Pin;

use crate::types::{Credentials, UtilResult};

pub mod aws;
pub mod cache;
pub mod credentials;
pub mod endpoints;
pub mod profile;

/// Boxed future returned from credential lookups.
pub type CredentialsFuture<'a> =
    Pin<Box<dyn Future<Output = UtilResult<Option<Credentials>>> + 'a>>;

/// Read-only view over an AWS configuration.
pub trait Session {
    /// Returns the profile in use when a remote names none.
    fn active_profile(&self) -> String;

    /// Returns the names of all profiles which can be selected.
    fn available_profiles(&self) -> Vec<String>;

    /// Returns the region configured for a profile, if any.
    fn region(&self, profile: &str) -> Option<String>;

    /// Returns the names of all known partitions.
    fn available_partitions(&self) -> Vec<String>;

    /// Returns the regions offering a service within a partition.
    fn available_regions(&self, service: &str, partition: &str) -> Vec<String>;

    /// Runs any session plugins configured for a profile.
    ///
    /// This is best-effort only; the return value signals whether a
    /// plugin hook was actually available.
    fn load_plugins(&self, _profile: &str) -> bool {
        false
    }

    /// Attempts to fetch credentials for a profile.
    ///
    /// A named profile is resolved from its own configuration only, while
    /// `None` selects the active profile along with any ambient sources
    /// such as the environment. `Ok(None)` means no credentials exist;
    /// errors are reserved for failures of the lookup itself.
    fn credentials<'a>(&'a self, profile: Option<&'a str>) -> CredentialsFuture<'a>;
}

/// Serialises tests which modify process environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
