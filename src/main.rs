//! Git remote helper providing push/pull access to AWS CodeCommit.
//!
//! This tool is invoked by git itself for remotes of the form
//! `codecommit://[profile@]repository` or
//! `codecommit::<region>://[profile@]repository`, and hands a signed
//! HTTPS url over to `git remote-http`.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
#[macro_use]
extern crate log as logger;

use std::{env, process};

mod cli;
mod context;
mod log;
mod session;
mod signer;
mod transport;
mod types;

use session::aws::AwsSession;
use transport::GitTransport;

#[tokio::main(basic_scheduler)]
async fn main() -> types::UtilResult<()> {
    // build the CLI and grab all arguments
    let args = cli::build().get_matches();

    // initialize logging
    log::init()?;

    // git passes the remote name and url through
    let program = env::args().next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let argv = cli::argv(program, &args);

    // delegate to the cli mod
    match cli::exec(&argv, AwsSession::new, &GitTransport).await {
        Ok(code) => process::exit(code),
        Err(err) if err.is_recognised() => {
            error!("{}", err);
            process::exit(1)
        }
        Err(err) => Err(err),
    }
}
