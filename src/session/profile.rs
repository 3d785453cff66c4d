//! Reader for the shared AWS `config` and `credentials` files.
//!
//! Both files are INI files read through `rust-ini`; the config file
//! prefixes named profiles with `profile ` (`default` may appear with or
//! without it) while the credentials file does not.
use ini::{Ini, ParseOption, Properties};

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::types::{Credentials, UtilResult};

/// Environment variable pointing at the shared config file.
pub const CONFIG_FILE_ENV: &str = "AWS_CONFIG_FILE";

/// Environment variable pointing at the shared credentials file.
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Parsed representation of a single profile file.
pub struct ProfileFile {
    ini: Ini,
}

impl Default for ProfileFile {
    fn default() -> Self {
        Self { ini: Ini::new() }
    }
}

impl ProfileFile {
    /// Parses the contents of a profile file.
    ///
    /// Quotes and escapes are kept verbatim, as the AWS tools do.
    pub fn parse(content: &str) -> UtilResult<Self> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options)?;
        Ok(Self { ini })
    }

    /// Loads and parses a profile file, treating a missing file as empty.
    pub fn load(path: &Path) -> UtilResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Finds a section by exact header name.
    pub fn section(&self, name: &str) -> Option<&Properties> {
        self.ini.section(Some(name))
    }

    /// Returns all section headers in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.ini.sections().flatten()
    }
}

/// The pair of shared files making up a user's AWS profiles.
#[derive(Default)]
pub struct Profiles {
    config: ProfileFile,
    credentials: ProfileFile,
    credentials_path: PathBuf,
}

impl Profiles {
    /// Constructs a new `Profiles` from already parsed files.
    pub fn new(config: ProfileFile, credentials: ProfileFile, credentials_path: PathBuf) -> Self {
        Self {
            config,
            credentials,
            credentials_path,
        }
    }

    /// Loads both shared files from their configured locations.
    pub fn load() -> UtilResult<Self> {
        let credentials_path = config_path(CREDENTIALS_FILE_ENV, "credentials");
        let config = ProfileFile::load(&config_path(CONFIG_FILE_ENV, "config"))?;
        let credentials = ProfileFile::load(&credentials_path)?;
        Ok(Self::new(config, credentials, credentials_path))
    }

    /// Returns the location the credentials file was read from.
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Returns every profile name found across both files.
    ///
    /// Names are de-duplicated, keeping the order they first appear in.
    pub fn names(&self) -> Vec<String> {
        let from_config = self.config.section_names().filter_map(config_profile_name);
        let from_credentials = self.credentials.section_names();

        let mut names: Vec<String> = Vec::new();
        for name in from_config.chain(from_credentials) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Looks up a key for a profile, preferring the config file.
    pub fn get(&self, profile: &str, key: &str) -> Option<&str> {
        self.config_section(profile)
            .and_then(|s| s.get(key))
            .or_else(|| self.credentials.section(profile).and_then(|s| s.get(key)))
            .filter(|v| !v.is_empty())
    }

    /// Reads static keys stored against a profile in the config file.
    pub fn config_credentials(&self, profile: &str) -> Option<Credentials> {
        let section = self.config_section(profile)?;
        let access_key = section.get("aws_access_key_id").filter(|v| !v.is_empty())?;
        let secret_key = section.get("aws_secret_access_key").filter(|v| !v.is_empty())?;
        let token = section
            .get("aws_session_token")
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Some(Credentials::new(access_key, secret_key, token))
    }

    /// Returns the `[plugins]` section of the config file, if any.
    pub fn plugins(&self) -> Option<&Properties> {
        self.config.section("plugins")
    }

    /// Finds the config file section of a profile.
    ///
    /// `default` may be written as either `[default]` or `[profile default]`.
    fn config_section(&self, profile: &str) -> Option<&Properties> {
        let named = self.config.section(&format!("profile {}", profile));
        if profile == "default" {
            return self.config.section("default").or(named);
        }
        named
    }
}

/// Maps a config file section header to a profile name.
fn config_profile_name(header: &str) -> Option<&str> {
    if header == "default" {
        return Some(header);
    }
    header
        .strip_prefix("profile ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Resolves the location of a shared file, honouring its override.
fn config_path(var: &str, file: &str) -> PathBuf {
    if let Ok(path) = env::var(var) {
        return expand_home(&path);
    }
    dirs::home_dir()
        .unwrap_or_default()
        .join(".aws")
        .join(file)
}

/// Expands a leading `~` in a path to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ProfileFile, Profiles};
    use crate::types::Credentials;
    use std::io::Write;
    use std::path::PathBuf;

    const CONFIG: &str = "
# leading comment
[default]
region = us-west-2

[profile work]
region=eu-west-1
output = json

[profile static]
aws_access_key_id = AKIDSTATIC
aws_secret_access_key = static-secret
aws_session_token = static-token

[plugins]
cli_legacy_plugin_path = /opt/plugins
custom = custom_plugin

[sso-session corp]
sso_region = us-east-1
";

    const CREDENTIALS: &str = "
[default]
aws_access_key_id = AKIDEXAMPLE
aws_secret_access_key = secret

; another comment
[personal]
aws_access_key_id = AKIDPERSONAL
region = ap-south-1
";

    /// Builds `Profiles` from in-memory file contents.
    pub fn profiles_from(config: &str, credentials: &str) -> Profiles {
        Profiles::new(
            ProfileFile::parse(config).unwrap(),
            ProfileFile::parse(credentials).unwrap(),
            PathBuf::from("/nonexistent/credentials"),
        )
    }

    fn profiles() -> Profiles {
        profiles_from(CONFIG, CREDENTIALS)
    }

    #[test]
    fn parsing_sections() {
        let file = ProfileFile::parse(CONFIG).unwrap();
        let names: Vec<&str> = file.section_names().collect();

        assert_eq!(
            names,
            vec!["default", "profile work", "profile static", "plugins", "sso-session corp"]
        );
    }

    #[test]
    fn keeping_values_verbatim() {
        let file = ProfileFile::parse("[profile odd]\nkey = \"quoted\\value\"\n").unwrap();
        let odd = file.section("profile odd").unwrap();

        assert_eq!(odd.get("key"), Some("\"quoted\\value\""));
    }

    #[test]
    fn listing_profile_names() {
        assert_eq!(
            profiles().names(),
            vec!["default", "work", "static", "personal"]
        );
    }

    #[test]
    fn looking_up_profile_values() {
        let profiles = profiles();

        assert_eq!(profiles.get("default", "region"), Some("us-west-2"));
        assert_eq!(profiles.get("work", "region"), Some("eu-west-1"));
        assert_eq!(profiles.get("personal", "region"), Some("ap-south-1"));
        assert_eq!(profiles.get("missing", "region"), None);
    }

    #[test]
    fn looking_up_prefixed_default_profile() {
        let profiles = profiles_from("[profile default]\nregion = us-west-2\n", "");

        assert_eq!(profiles.names(), vec!["default"]);
        assert_eq!(profiles.get("default", "region"), Some("us-west-2"));
    }

    #[test]
    fn reading_config_credentials() {
        let profiles = profiles();

        assert_eq!(
            profiles.config_credentials("static"),
            Some(Credentials::new(
                "AKIDSTATIC",
                "static-secret",
                Some("static-token".to_string())
            ))
        );
        assert_eq!(profiles.config_credentials("work"), None);
        assert_eq!(profiles.config_credentials("personal"), None);
    }

    #[test]
    fn finding_plugins() {
        let profiles = profiles();
        let plugins = profiles.plugins().unwrap();

        assert_eq!(plugins.iter().count(), 2);
        assert_eq!(plugins.get("custom"), Some("custom_plugin"));
    }

    #[test]
    fn loading_files_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CREDENTIALS.as_bytes()).unwrap();

        let parsed = ProfileFile::load(file.path()).unwrap();

        assert!(parsed.section("personal").is_some());
    }

    #[test]
    fn loading_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = ProfileFile::load(&dir.path().join("missing")).unwrap();

        assert_eq!(parsed.section_names().count(), 0);
    }
}
