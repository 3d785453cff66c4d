//! Hand-off to git's own HTTP remote helper.
use std::process::Command;

use crate::types::UtilResult;

/// Something able to run a remote helper command against a url.
pub trait Transport {
    /// Executes the helper, returning its exit code.
    fn exec(&self, command: &str, url: &str) -> UtilResult<i32>;
}

/// Transport running `git remote-http` as a child process.
///
/// The child inherits all stdio, so it speaks the remote helper protocol
/// with git directly.
pub struct GitTransport;

impl Transport for GitTransport {
    fn exec(&self, command: &str, url: &str) -> UtilResult<i32> {
        let status = Command::new("git")
            .arg("remote-http")
            .arg(command)
            .arg(url)
            .status()?;

        // a signal has no exit code, treat as a failure
        Ok(status.code().unwrap_or(1))
    }
}
