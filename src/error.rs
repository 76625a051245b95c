use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors that occur when configuring or running an `ssh`/`scp` invocation.
///
/// A remote command that exits with a non-zero status is _not_ an error. The exit status is
/// reported through [`ProcessOutput`](crate::ProcessOutput) and it is up to the caller to act
/// on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The port given to [`Ssh::use_port`](crate::Ssh::use_port) was negative (or too large).
    #[error("port must be a positive integer, got {0}")]
    InvalidPort(i64),

    /// Failed to start the local shell that runs the command line.
    #[error("the local shell could not be started")]
    Spawn(#[source] io::Error),

    /// IO error while reading the standard output or standard error of the local process.
    #[error("failure while reading output of the local process")]
    ChildIo(#[source] io::Error),

    /// Failed to wait for the local process to exit.
    #[error("failure while waiting for the local process to exit")]
    Wait(#[source] io::Error),

    /// The process ran longer than its configured timeout and was killed.
    #[error("the process exceeded the timeout of {0:?}")]
    Timeout(Duration),
}
