//! CLI bindings for the remote helper.
//!
//! Git invokes us as `git-remote-codecommit <remote> <url>`, so the CLI
//! only passes those through; the argument count is checked here rather
//! than by Clap so that git users receive consistent messages.
use clap::{App, AppSettings, Arg, ArgMatches};

use crate::context::Context;
use crate::session::Session;
use crate::signer;
use crate::transport::Transport;
use crate::types::{UtilError, UtilResult};

/// Message emitted when git hands us too few arguments.
const TOO_FEW_ARGUMENTS: &str =
    "Too few arguments. This hook requires the git command and remote.";

/// Constructs a new CLI application using Clap.
///
/// All metadata is fetched dynamically from Cargo and shouldn't require
/// to be updated (ever).
pub fn build<'a, 'b>() -> App<'a, 'b> {
    App::new("")
        .name(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .arg(
            Arg::with_name("args")
                .help("The git command and remote url, as passed by git")
                .multiple(true)
                .allow_hyphen_values(true),
        )
        .settings(&[
            AppSettings::DisableHelpSubcommand,
            AppSettings::TrailingVarArg,
        ])
}

/// Reconstructs the full argument vector from parsed arguments.
pub fn argv(program: String, args: &ArgMatches<'_>) -> Vec<String> {
    let mut argv = vec![program];
    if let Some(values) = args.values_of("args") {
        argv.extend(values.map(str::to_string));
    }
    argv
}

/// Executes the hook for a full argument vector.
///
/// The session is only constructed once the arguments are known to be
/// valid. On success the exit code of the transport is returned.
pub async fn exec<S, F>(argv: &[String], session: F, transport: &dyn Transport) -> UtilResult<i32>
where
    S: Session,
    F: FnOnce() -> UtilResult<S>,
{
    let (command, remote_url) = validate(argv)?;

    // resolve the remote against the AWS session
    let session = session()?;
    let context = Context::from_url(remote_url, &session).await?;

    // sign the url and hand over to git
    let url = signer::build_url(
        &context.repository,
        &context.version,
        &context.region,
        &context.credentials,
    )?;

    info!("Handing {} over to git remote-http", command);

    transport.exec(command, &url)
}

/// Validates the argument count, returning the command and remote.
fn validate(argv: &[String]) -> UtilResult<(&str, &str)> {
    match argv {
        [_, command, remote_url] => Ok((command.as_str(), remote_url.as_str())),
        _ if argv.len() < 3 => Err(UtilError::Usage(TOO_FEW_ARGUMENTS.to_string())),
        _ => Err(UtilError::Usage(format!(
            "Too many arguments. Hook only accepts the git command and remote, but argv was: '{}'",
            argv.join("', '")
        ))),
    }
}
