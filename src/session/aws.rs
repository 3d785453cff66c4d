//! Production `Session` backed by the shared AWS files and Rusoto.
//!
//! Profiles and regions are read straight from the shared config files,
//! while credentials go through `credentials::Resolver` so that profile,
//! role, environment, container and instance credentials all work.
use std::env;
use std::path::PathBuf;

use super::cache::JsonFileCache;
use super::credentials::Resolver;
use super::profile::Profiles;
use super::{endpoints, CredentialsFuture, Session};
use crate::types::UtilResult;

/// Environment variables selecting the active profile, in priority order.
const PROFILE_ENVS: [&str; 2] = ["AWS_PROFILE", "AWS_DEFAULT_PROFILE"];

/// Environment variables overriding the configured region, in priority order.
const REGION_ENVS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Config file entry which points at plugin sources rather than a plugin.
const PLUGIN_PATH_KEY: &str = "cli_legacy_plugin_path";

/// `Session` implementation reading the user's real AWS setup.
pub struct AwsSession {
    profiles: Profiles,
    active: String,
    region_override: Option<String>,
    cache_dir: Option<PathBuf>,
}

impl AwsSession {
    /// Constructs a new `AwsSession` from the environment and shared files.
    pub fn new() -> UtilResult<Self> {
        let profiles = Profiles::load()?;
        let active = first_env(&PROFILE_ENVS).unwrap_or_else(|| "default".to_string());

        let mut session = Self::with_profiles(profiles, active);
        session.region_override = first_env(&REGION_ENVS);

        Ok(session)
    }

    /// Constructs a new `AwsSession` over already loaded profiles.
    pub fn with_profiles(profiles: Profiles, active: String) -> Self {
        Self {
            profiles,
            active,
            region_override: None,
            cache_dir: None,
        }
    }

    /// Returns the names of configured plugins, skipping the plugin path.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.profiles
            .plugins()
            .map(|plugins| {
                plugins
                    .iter()
                    .map(|(name, _)| name)
                    .filter(|name| *name != PLUGIN_PATH_KEY)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Creates the role credential cache for this session.
    fn cache(&self) -> JsonFileCache {
        match self.cache_dir {
            Some(ref dir) => JsonFileCache::with_dir(dir.clone()),
            None => JsonFileCache::new(),
        }
    }
}

impl Session for AwsSession {
    fn active_profile(&self) -> String {
        self.active.clone()
    }

    fn available_profiles(&self) -> Vec<String> {
        self.profiles.names()
    }

    fn region(&self, profile: &str) -> Option<String> {
        self.region_override.clone().or_else(|| {
            self.profiles
                .get(profile, "region")
                .filter(|r| !r.is_empty())
                .map(str::to_string)
        })
    }

    fn available_partitions(&self) -> Vec<String> {
        endpoints::partitions()
    }

    fn available_regions(&self, service: &str, partition: &str) -> Vec<String> {
        endpoints::regions(service, partition)
    }

    /// Checks the `[plugins]` config section.
    ///
    /// Plugins are modules of the AWS CLI itself and cannot be loaded from
    /// here, so each one is only reported.
    fn load_plugins(&self, profile: &str) -> bool {
        for name in self.plugin_names() {
            debug!(
                "Skipping plugin {} for profile {}: plugin loading is unavailable",
                name, profile
            );
        }
        false
    }

    fn credentials<'a>(&'a self, profile: Option<&'a str>) -> CredentialsFuture<'a> {
        Box::pin(async move {
            let resolver = Resolver::new(&self.profiles, self.cache());
            match profile {
                Some(profile) => resolver.explicit(profile).await,
                None => resolver.implicit(&self.active).await,
            }
        })
    }
}

/// Returns the first non-empty value of a set of environment variables.
fn first_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::AwsSession;
    use crate::session::profile::tests::profiles_from;
    use crate::session::profile::{ProfileFile, Profiles};
    use crate::session::{env_lock, Session};
    use crate::types::Credentials;

    use std::env;
    use std::fs;

    fn session(config: &str, credentials: &str) -> AwsSession {
        AwsSession::with_profiles(profiles_from(config, credentials), "default".to_string())
    }

    #[test]
    fn reading_profiles_and_regions() {
        let session = session(
            "[default]\nregion = us-west-2\n[profile work]\nregion = cn-north-1\n[profile empty]\nregion =\n",
            "[ci]\naws_access_key_id = AKID\n",
        );

        assert_eq!(session.active_profile(), "default");
        assert_eq!(session.available_profiles(), vec!["default", "work", "empty", "ci"]);
        assert_eq!(session.region("default"), Some("us-west-2".to_string()));
        assert_eq!(session.region("work"), Some("cn-north-1".to_string()));
        assert_eq!(session.region("empty"), None);
        assert_eq!(session.region("ci"), None);
    }

    #[test]
    fn overriding_regions() {
        let mut session = session("[default]\nregion = us-west-2\n", "");
        session.region_override = Some("eu-west-1".to_string());

        assert_eq!(session.region("default"), Some("eu-west-1".to_string()));
        assert_eq!(session.region("missing"), Some("eu-west-1".to_string()));
    }

    #[test]
    fn exposing_codecommit_regions() {
        let session = session("", "");
        let regions: Vec<String> = session
            .available_partitions()
            .iter()
            .flat_map(|p| session.available_regions("codecommit", p))
            .collect();

        assert!(regions.contains(&"us-gov-west-1".to_string()));
        assert!(regions.contains(&"cn-northwest-1".to_string()));
    }

    #[test]
    fn listing_plugins() {
        let with_plugins = session(
            "[plugins]\ncli_legacy_plugin_path = /opt\nsso = awscli_sso\nextra = awscli_extra\n",
            "",
        );
        let without_plugins = session("[default]\nregion = us-west-2\n", "");

        assert_eq!(with_plugins.plugin_names(), vec!["sso", "extra"]);
        assert!(without_plugins.plugin_names().is_empty());

        assert!(!with_plugins.load_plugins("default"));
        assert!(!without_plugins.load_plugins("default"));
    }

    #[tokio::test]
    async fn preferring_named_profiles_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        let content = "[default]\naws_access_key_id = DEFAULTKEY\naws_secret_access_key = default-secret\n\
                       [work]\naws_access_key_id = WORKKEY\naws_secret_access_key = work-secret\n";

        fs::write(&path, content).unwrap();

        let profiles = Profiles::new(
            ProfileFile::default(),
            ProfileFile::parse(content).unwrap(),
            path,
        );
        let mut session = AwsSession::with_profiles(profiles, "default".to_string());
        session.cache_dir = Some(dir.path().join("cache"));

        let _guard = env_lock();
        env::set_var("AWS_ACCESS_KEY_ID", "ENVKEY");
        env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");

        let named = session.credentials(Some("work")).await.unwrap();
        let implicit = session.credentials(None).await.unwrap();

        env::remove_var("AWS_ACCESS_KEY_ID");
        env::remove_var("AWS_SECRET_ACCESS_KEY");

        // the implicit profile keeps the full chain, environment first
        assert_eq!(named, Some(Credentials::new("WORKKEY", "work-secret", None)));
        assert_eq!(implicit, Some(Credentials::new("ENVKEY", "env-secret", None)));
    }

    #[tokio::test]
    async fn reading_named_profile_keys_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = Profiles::new(
            ProfileFile::parse(
                "[profile cfg]\naws_access_key_id = CFGKEY\naws_secret_access_key = cfg-secret\naws_session_token = cfg-token\n",
            )
            .unwrap(),
            ProfileFile::default(),
            dir.path().join("credentials"),
        );
        let session = AwsSession::with_profiles(profiles, "default".to_string());

        assert_eq!(
            session.credentials(Some("cfg")).await.unwrap(),
            Some(Credentials::new("CFGKEY", "cfg-secret", Some("cfg-token".to_string())))
        );
    }
}
