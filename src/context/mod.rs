//! Resolution of a git remote url into a CodeCommit repository context.
//!
//! Our remote helper accepts two distinct types of urls:
//!
//! * `codecommit://<profile>@<repository>`
//! * `codecommit::<region>://<profile>@<repository>`
//!
//! If provided the former we get the whole url, but with the latter git
//! strips the leading `codecommit::` for us. The `<profile>@` portion is
//! optional in both cases, falling back to the session's active profile.
use crate::session::Session;
use crate::types::{ContextError, Credentials, UtilResult};

pub mod remote;

use self::remote::Scheme;

/// Protocol version of the CodeCommit git endpoint.
pub const VERSION: &str = "v1";

/// Name of the CodeCommit service in AWS metadata.
pub const SERVICE: &str = "codecommit";

/// Repository information derived from a remote url and AWS profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub repository: String,
    pub version: String,
    pub region: String,
    pub credentials: Credentials,
}

impl Context {
    /// Parses repository information from a remote url, filling in the
    /// remaining attributes from the provided `Session`.
    ///
    /// Recognised failures are returned as `UtilError::Context`; anything
    /// raised by the session itself is passed through untouched.
    pub async fn from_url(remote_url: &str, session: &dyn Session) -> UtilResult<Context> {
        let malformed = || ContextError::MalformedUrl(remote_url.to_string());
        let remote = remote::split(remote_url).ok_or_else(malformed)?;

        // named profiles must exist, otherwise use the active one
        let profile = match remote.profile {
            Some(profile) => {
                let available = session.available_profiles();
                if !available.iter().any(|p| p == profile) {
                    return Err(ContextError::ProfileNotFound {
                        profile: profile.to_string(),
                        available,
                    }
                    .into());
                }
                profile.to_string()
            }
            None => session.active_profile(),
        };

        debug!("Resolving {} with profile {}", remote.repository, profile);

        // give any session plugins a chance to run first
        if session.load_plugins(&profile) {
            debug!("Loaded session plugins for profile {}", profile);
        }

        let region = match remote::classify(&remote.scheme)? {
            Scheme::CodeCommit => {
                let region = session
                    .region(&profile)
                    .ok_or_else(|| ContextError::RegionNotFound(profile.clone()))?;
                ensure_available(session, region)?
            }
            Scheme::Region(region) => ensure_available(session, region)?,
            Scheme::Unknown => return Err(malformed().into()),
        };

        debug!("Resolved region {} for {}", region, remote.repository);

        // named profiles resolve alone, the active one uses the full chain
        let credentials = session
            .credentials(remote.profile)
            .await?
            .ok_or_else(|| ContextError::CredentialsNotFound(profile.clone()))?;

        Ok(Context {
            repository: remote.repository.to_string(),
            version: VERSION.to_string(),
            region,
            credentials,
        })
    }
}

/// Verifies CodeCommit is offered in a region across all partitions.
fn ensure_available(session: &dyn Session, region: String) -> Result<String, ContextError> {
    let available = session
        .available_partitions()
        .iter()
        .any(|partition| {
            session
                .available_regions(SERVICE, partition)
                .iter()
                .any(|r| *r == region)
        });

    if available {
        Ok(region)
    } else {
        Err(ContextError::RegionNotAvailable(region))
    }
}
