//! Credential resolution for a single profile.
//!
//! A profile named explicitly in a remote url is resolved from the shared
//! files alone, so that environment credentials can't take its place. The
//! implicit active profile goes through the whole provider chain instead:
//! environment, shared files, then container and instance metadata.
//!
//! Profiles carrying a `role_arn` assume that role using the credentials
//! of their `source_profile` (or `credential_source`), caching the result.
use chrono::{Duration as ChronoDuration, Utc};
use rusoto_core::credential::{
    AwsCredentials, ChainProvider, ContainerProvider, EnvironmentProvider,
    InstanceMetadataProvider, ProfileProvider, ProvideAwsCredentials, StaticProvider,
};
use rusoto_core::{HttpClient, Region};
use rusoto_sts::{StsAssumeRoleSessionCredentialsProvider, StsClient};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::cache::{CacheKey, JsonFileCache};
use super::profile::Profiles;
use super::CredentialsFuture;
use crate::types::{Credentials, UtilError, UtilResult};

/// Timeout applied to providers which reach out over the network.
const PROVIDER_TIMEOUT: Duration = Duration::from_millis(500);

/// Where the credentials of a profile come from.
#[derive(Debug, PartialEq, Eq)]
pub enum Source {
    /// Keys of a profile in the shared files.
    Profile(String),
    /// Credentials of the process environment.
    Environment,
    /// The ECS container credentials endpoint.
    Container,
    /// The EC2 instance metadata service.
    InstanceMetadata,
    /// A role assumed using credentials from another source.
    AssumeRole(AssumeRole),
}

/// Everything needed to assume a role.
#[derive(Debug, PartialEq, Eq)]
pub struct AssumeRole {
    pub role_arn: String,
    pub session_name: Option<String>,
    pub external_id: Option<String>,
    pub duration_seconds: Option<i64>,
    pub region: Option<String>,
    pub source: Box<Source>,
}

/// Works out where the credentials of a profile come from.
///
/// Broken role configuration (loops, unknown sources, MFA) is an error of
/// the configuration rather than missing credentials.
pub fn plan(profiles: &Profiles, profile: &str) -> UtilResult<Source> {
    plan_chain(profiles, profile, &mut Vec::new())
}

fn plan_chain(profiles: &Profiles, profile: &str, visited: &mut Vec<String>) -> UtilResult<Source> {
    let role_arn = match profiles.get(profile, "role_arn") {
        Some(role_arn) => role_arn,
        None => return Ok(Source::Profile(profile.to_string())),
    };

    if visited.iter().any(|p| p == profile) {
        visited.push(profile.to_string());
        return Err(UtilError::from(format!(
            "Infinite loop in profile configuration: {}",
            visited.join(" -> ")
        )));
    }
    visited.push(profile.to_string());

    if profiles.get(profile, "mfa_serial").is_some() {
        return Err(UtilError::from(format!(
            "The profile {} requires an MFA token, which cannot be prompted for by a git remote helper",
            profile
        )));
    }

    let source = match (
        profiles.get(profile, "source_profile"),
        profiles.get(profile, "credential_source"),
    ) {
        // a role sourcing itself uses the profile's own keys
        (Some(source), None) if source == profile => Source::Profile(source.to_string()),
        (Some(source), None) => plan_chain(profiles, source, visited)?,
        (None, Some("Environment")) => Source::Environment,
        (None, Some("EcsContainer")) => Source::Container,
        (None, Some("Ec2InstanceMetadata")) => Source::InstanceMetadata,
        (None, Some(other)) => {
            return Err(UtilError::from(format!(
                "The profile {} has an unsupported credential_source: {}",
                profile, other
            )))
        }
        _ => {
            return Err(UtilError::from(format!(
                "The profile {} must set exactly one of source_profile or credential_source",
                profile
            )))
        }
    };

    Ok(Source::AssumeRole(AssumeRole {
        role_arn: role_arn.to_string(),
        session_name: profiles.get(profile, "role_session_name").map(str::to_string),
        external_id: profiles.get(profile, "external_id").map(str::to_string),
        duration_seconds: profiles
            .get(profile, "duration_seconds")
            .and_then(|d| d.parse().ok()),
        region: profiles.get(profile, "region").map(str::to_string),
        source: Box::new(source),
    }))
}

/// Resolves credentials from the shared files and providers.
pub struct Resolver<'a> {
    profiles: &'a Profiles,
    cache: JsonFileCache,
}

impl<'a> Resolver<'a> {
    /// Constructs a new `Resolver` over a set of profiles.
    pub fn new(profiles: &'a Profiles, cache: JsonFileCache) -> Self {
        Self { profiles, cache }
    }

    /// Resolves a profile named in a remote url, using nothing but its
    /// own configuration.
    pub async fn explicit(&self, profile: &str) -> UtilResult<Option<Credentials>> {
        let source = plan(self.profiles, profile)?;
        self.resolve(&source).await
    }

    /// Resolves the implicit active profile through the provider chain.
    pub async fn implicit(&self, profile: &str) -> UtilResult<Option<Credentials>> {
        // environment credentials always win for the implicit profile
        if let Some(creds) = self.resolve(&Source::Environment).await? {
            return Ok(Some(creds));
        }

        if let Some(creds) = self.explicit(profile).await? {
            return Ok(Some(creds));
        }

        // finally the container and instance providers
        let mut chain = ChainProvider::new();
        chain.set_timeout(PROVIDER_TIMEOUT);

        Ok(found(chain.credentials().await, "the provider chain"))
    }

    /// Resolves a single credential source.
    pub fn resolve<'b>(&'b self, source: &'b Source) -> CredentialsFuture<'b> {
        Box::pin(async move {
            match source {
                Source::Profile(profile) => Ok(self.profile(profile).await),
                Source::Environment => Ok(found(
                    EnvironmentProvider::default().credentials().await,
                    "the environment",
                )),
                Source::Container => {
                    let mut provider = ContainerProvider::new();
                    provider.set_timeout(PROVIDER_TIMEOUT);
                    Ok(found(provider.credentials().await, "the container"))
                }
                Source::InstanceMetadata => {
                    let mut provider = InstanceMetadataProvider::new();
                    provider.set_timeout(PROVIDER_TIMEOUT);
                    Ok(found(provider.credentials().await, "instance metadata"))
                }
                Source::AssumeRole(role) => self.assume_role(role).await,
            }
        })
    }

    /// Reads a profile from the credentials file, falling back to keys
    /// written into the config file.
    async fn profile(&self, profile: &str) -> Option<Credentials> {
        let provider =
            ProfileProvider::with_configuration(self.profiles.credentials_path(), profile);

        let from_file = found(provider.credentials().await, "the credentials file");
        if from_file.is_some() {
            return from_file;
        }

        let keys = self.profiles.config_credentials(profile)?;
        let provider = StaticProvider::new(keys.access_key, keys.secret_key, keys.token, None);

        found(provider.credentials().await, "the config file")
    }

    /// Assumes a role, reusing cached credentials where possible.
    async fn assume_role(&self, role: &AssumeRole) -> UtilResult<Option<Credentials>> {
        let key = CacheKey {
            role_arn: role.role_arn.clone(),
            external_id: role.external_id.clone(),
            duration_seconds: role.duration_seconds,
        };

        if let Some(cached) = self.cache.get(&key, Utc::now()) {
            debug!("Using cached credentials for {}", role.role_arn);
            return Ok(Some(cached));
        }

        let source = match self.resolve(&role.source).await? {
            Some(source) => source,
            None => return Ok(None),
        };

        let region = role
            .region
            .as_ref()
            .and_then(|r| r.parse::<Region>().ok())
            .unwrap_or(Region::UsEast1);

        let provider = StaticProvider::new(source.access_key, source.secret_key, source.token, None);
        let client = StsClient::new_with(HttpClient::new()?, provider, region);

        let session_name = role
            .session_name
            .clone()
            .map_or_else(default_session_name, Ok)?;

        debug!("Assuming role {} as {}", role.role_arn, session_name);

        let assumed = StsAssumeRoleSessionCredentialsProvider::new(
            client,
            role.role_arn.clone(),
            session_name,
            role.external_id.clone(),
            role.duration_seconds.map(ChronoDuration::seconds),
            None,
            None,
        )
        .credentials()
        .await?;

        let credentials = convert(&assumed);

        if let Some(expiration) = *assumed.expires_at() {
            if let Err(err) = self.cache.put(&key, &credentials, expiration) {
                debug!("Unable to cache credentials for {}: {}", role.role_arn, err);
            }
        }

        Ok(Some(credentials))
    }
}

/// Converts a provider result, treating failures as missing credentials.
fn found<E>(result: Result<AwsCredentials, E>, source: &str) -> Option<Credentials>
where
    E: std::fmt::Display,
{
    match result {
        Ok(creds) => Some(convert(&creds)),
        Err(err) => {
            debug!("No credentials found in {}: {}", source, err);
            None
        }
    }
}

/// Converts Rusoto credentials into our own type.
fn convert(creds: &AwsCredentials) -> Credentials {
    Credentials::new(
        creds.aws_access_key_id(),
        creds.aws_secret_access_key(),
        creds.token().clone(),
    )
}

/// Generates a role session name based on the current time.
fn default_session_name() -> UtilResult<String> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(format!("git-remote-codecommit-{}", secs))
}
