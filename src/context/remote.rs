//! Splitting of git remote urls into their relevant pieces.
//!
//! Only the scheme and authority of a url matter to us; anything after
//! the authority (a path, query or fragment) is ignored.
use regex::Regex;

use crate::types::UtilResult;

/// Scheme used when the region should come from the profile.
pub const CODECOMMIT_SCHEME: &str = "codecommit";

/// Pattern a scheme must match to be treated as a region.
const REGION_PATTERN: &str = r"^[a-z]{2}-\w*.*-\d{1}";

/// The parts of a remote url we care about.
#[derive(Debug, PartialEq, Eq)]
pub struct RemoteUrl<'a> {
    pub scheme: String,
    pub profile: Option<&'a str>,
    pub repository: &'a str,
}

/// How the region of a remote should be determined.
#[derive(Debug, PartialEq, Eq)]
pub enum Scheme {
    /// Look the region up in the profile configuration.
    CodeCommit,
    /// The scheme itself names the region.
    Region(String),
    /// Neither of the above.
    Unknown,
}

/// Splits a remote url into scheme, profile and repository.
///
/// Returns `None` when either the scheme or the authority is missing,
/// or when the authority names no repository.
pub fn split(url: &str) -> Option<RemoteUrl<'_>> {
    // scheme is everything before the first colon
    let idx = url.find(':')?;
    let (scheme, rest) = (&url[..idx], &url[idx + 1..]);

    if !is_scheme(scheme) {
        return None;
    }

    // authority has to follow a double slash
    let rest = rest.strip_prefix("//")?;
    let authority = match rest.find(|c: char| c == '/' || c == '?' || c == '#') {
        Some(end) => &rest[..end],
        None => rest,
    };

    if authority.is_empty() {
        return None;
    }

    // optional profile comes before the first `@`
    let (profile, repository) = match authority.find('@') {
        Some(at) => (Some(&authority[..at]), &authority[at + 1..]),
        None => (None, authority),
    };

    if repository.is_empty() {
        return None;
    }

    Some(RemoteUrl {
        scheme: scheme.to_ascii_lowercase(),
        profile,
        repository,
    })
}

/// Classifies a (lowercase) scheme.
pub fn classify(scheme: &str) -> UtilResult<Scheme> {
    if scheme == CODECOMMIT_SCHEME {
        return Ok(Scheme::CodeCommit);
    }

    if Regex::new(REGION_PATTERN)?.is_match(scheme) {
        return Ok(Scheme::Region(scheme.to_string()));
    }

    Ok(Scheme::Unknown)
}

/// Determines whether a string is a syntactically valid url scheme.
fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}
