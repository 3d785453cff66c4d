//! File cache for credentials obtained by assuming a role.
//!
//! Entries share the layout and naming of the AWS CLI's own cache under
//! `~/.aws/cli/cache`, so a role assumed by either tool is reused by the
//! other until it gets close to expiry.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use std::fs;
use std::path::PathBuf;

use crate::types::{Credentials, UtilResult};

/// Entries expiring within this many minutes are treated as stale.
const EXPIRY_WINDOW_MINUTES: i64 = 10;

/// Arguments of an `AssumeRole` call which identify a cache entry.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheKey {
    pub role_arn: String,
    pub external_id: Option<String>,
    pub duration_seconds: Option<i64>,
}

impl CacheKey {
    /// Computes the file name of this entry.
    ///
    /// This is the SHA-1 of the sorted JSON arguments, formatted the way
    /// the AWS CLI formats them.
    pub fn file_name(&self) -> UtilResult<String> {
        let mut args: Vec<(&str, String)> = Vec::new();

        if let Some(duration) = self.duration_seconds {
            args.push(("DurationSeconds", duration.to_string()));
        }
        if let Some(ref external_id) = self.external_id {
            args.push(("ExternalId", serde_json::to_string(external_id)?));
        }
        args.push(("RoleArn", serde_json::to_string(&self.role_arn)?));

        let json = args
            .iter()
            .map(|(k, v)| format!("\"{}\": {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");

        let digest = Sha1::digest(format!("{{{}}}", json).as_bytes());
        Ok(format!("{}.json", hex::encode(digest)))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CacheEntry {
    credentials: CachedCredentials,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CachedCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: String,
}

/// JSON file cache rooted at a directory.
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    /// Constructs a cache rooted at the AWS CLI cache directory.
    pub fn new() -> Self {
        Self::with_dir(
            dirs::home_dir()
                .unwrap_or_default()
                .join(".aws")
                .join("cli")
                .join("cache"),
        )
    }

    /// Constructs a cache rooted at the provided directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Fetches unexpired credentials for a key.
    ///
    /// Unreadable or malformed entries count as a miss.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Credentials> {
        let path = self.dir.join(key.file_name().ok()?);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Ignoring cache entry {}: {}", path.display(), err);
                return None;
            }
        };

        let expiration = DateTime::parse_from_rfc3339(&entry.credentials.expiration).ok()?;
        if expiration.with_timezone(&Utc) <= now + Duration::minutes(EXPIRY_WINDOW_MINUTES) {
            debug!("Cache entry {} has expired", path.display());
            return None;
        }

        let creds = entry.credentials;
        Some(Credentials::new(
            creds.access_key_id,
            creds.secret_access_key,
            creds.session_token,
        ))
    }

    /// Stores credentials against a key until their expiration.
    pub fn put(
        &self,
        key: &CacheKey,
        credentials: &Credentials,
        expiration: DateTime<Utc>,
    ) -> UtilResult<()> {
        let entry = CacheEntry {
            credentials: CachedCredentials {
                access_key_id: credentials.access_key.clone(),
                secret_access_key: credentials.secret_key.clone(),
                session_token: credentials.token.clone(),
                expiration: expiration.to_rfc3339(),
            },
        };

        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(key.file_name()?), serde_json::to_string(&entry)?)?;

        Ok(())
    }
}
