//! Types module for the main runtime, exposing error and result types.
//!
//! Most code in this module is based around coercion of error types into
//! a common error type, to be used as the general "Error" of this crate.
//! Errors which the user can act upon are kept apart from everything else,
//! so that only those receive a friendly message.
use logger::SetLoggerError;
use rusoto_core::credential::CredentialsError;
use rusoto_core::request::TlsError;

use std::fmt::{self, Debug, Display, Formatter};
use std::{io, time};

/// Public type alias for a result with a `UtilError` error type.
pub type UtilResult<T> = Result<T, UtilError>;

/// Delegating error wrapper for errors raised by the main runtime.
pub enum UtilError {
    /// The hook was invoked with the wrong number of arguments.
    Usage(String),
    /// The remote could not be resolved into a `Context`.
    Context(ContextError),
    /// Anything else; these are never given a friendly message.
    Fatal(String),
}

impl UtilError {
    /// Returns whether this error is one we can explain to the user.
    pub fn is_recognised(&self) -> bool {
        match self {
            UtilError::Usage(_) | UtilError::Context(_) => true,
            UtilError::Fatal(_) => false,
        }
    }
}

/// Debug implementation for `UtilError`.
impl Debug for UtilError {
    /// Formats an `UtilError` by delegating to `Display`.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Display implementation for `UtilError`.
impl Display for UtilError {
    /// Formats an `UtilError` by writing out the inner representation.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            UtilError::Usage(msg) => write!(f, "{}", msg),
            UtilError::Context(err) => write!(f, "{}", err),
            UtilError::Fatal(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<ContextError> for UtilError {
    fn from(err: ContextError) -> UtilError {
        UtilError::Context(err)
    }
}

/// Macro to implement `From` for provided types.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for UtilError {
            fn from(t: $type) -> UtilError {
                UtilError::Fatal(t.to_string())
            }
        }
    };
}

// Easy derivations of derive_from.
derive_from!(&'a str);
derive_from!(io::Error);
derive_from!(clap::Error);
derive_from!(SetLoggerError);
derive_from!(regex::Error);
derive_from!(CredentialsError);
derive_from!(TlsError);
derive_from!(ini::ParseError);
derive_from!(serde_json::Error);
derive_from!(time::SystemTimeError);
derive_from!(String);

/// Failures to resolve a remote url into a repository context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// The url is not in a shape we accept.
    MalformedUrl(String),
    /// The url names a profile that doesn't exist.
    ProfileNotFound {
        profile: String,
        available: Vec<String>,
    },
    /// The profile has no region configured.
    RegionNotFound(String),
    /// The region doesn't offer CodeCommit.
    RegionNotAvailable(String),
    /// No credentials could be found for the profile.
    CredentialsNotFound(String),
}

/// Display implementation for `ContextError`.
impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ContextError::MalformedUrl(url) => write!(
                f,
                "The following URL is malformed: {}. A URL must be in one of the two following formats: \
                 codecommit://<profile>@<repository> or codecommit::<region>://<profile>@<repository>",
                url
            ),
            ContextError::ProfileNotFound { profile, available } => write!(
                f,
                "The following profile was not found: {}. Available profiles are: {}. Either use one of \
                 the available profiles, or create an AWS CLI profile to use and then try again. For more \
                 information, see Configure an AWS CLI Profile in the AWS CLI User Guide.",
                profile,
                available.join(", ")
            ),
            ContextError::RegionNotFound(profile) => write!(
                f,
                "The following profile does not have an AWS Region: {}. You must set an AWS Region for \
                 this profile. For more information, see Configure An AWS CLI Profile in the AWS CLI User Guide.",
                profile
            ),
            ContextError::RegionNotAvailable(region) => write!(
                f,
                "The following AWS Region is not available for use with AWS CodeCommit: {}. For more \
                 information about CodeCommit's availability in AWS Regions, see the AWS CodeCommit User \
                 Guide. If an AWS Region is listed as supported but you receive this error, try updating \
                 your version of the AWS CLI or the AWS SDKs.",
                region
            ),
            ContextError::CredentialsNotFound(profile) => write!(
                f,
                "The following profile does not have credentials configured: {}. You must configure the \
                 access key and secret key for the profile. For more information, see Configure an AWS CLI \
                 Profile in the AWS CLI User Guide.",
                profile
            ),
        }
    }
}

/// Credentials used to sign a request, as handed over by a `Session`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl Credentials {
    /// Constructs a new set of `Credentials`.
    pub fn new<A, S>(access_key: A, secret_key: S, token: Option<String>) -> Self
    where
        A: Into<String>,
        S: Into<String>,
    {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            token,
        }
    }
}

// Keep secrets out of any debug output.
impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ContextError, Credentials, UtilError};
    use std::io::{Error, ErrorKind};

    #[test]
    fn converting_io_to_error() {
        let message = "My fake access key failed message";
        let io_errs = Error::new(ErrorKind::Other, message);
        let convert = UtilError::from(io_errs);

        assert_eq!(convert.to_string(), message);
        assert!(!convert.is_recognised());
    }

    #[test]
    fn converting_string_to_error() {
        let message = "My fake access key failed message".to_string();
        let convert = UtilError::from(message.clone());

        assert_eq!(convert.to_string(), message);
    }

    #[test]
    fn converting_context_to_error() {
        let convert = UtilError::from(ContextError::RegionNotFound("default".to_string()));

        assert!(convert.is_recognised());
        assert!(convert.to_string().starts_with(
            "The following profile does not have an AWS Region: default."
        ));
    }

    #[test]
    fn listing_profiles_in_error() {
        let err = ContextError::ProfileNotFound {
            profile: "missing".to_string(),
            available: vec!["default".to_string(), "work".to_string()],
        };

        assert!(err
            .to_string()
            .starts_with("The following profile was not found: missing. Available profiles are: default, work."));
    }

    #[test]
    fn hiding_secrets_from_debug() {
        let creds = Credentials::new("access", "secret", Some("token".to_string()));
        let debug = format!("{:?}", creds);

        assert!(debug.contains("access"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("token\""));
    }
}
