//! Run commands and copy files on remote hosts through the `ssh` and `scp` binaries.
//!
//! This crate does not speak the SSH protocol. It builds command lines for the OpenSSH client
//! programs (`ssh` and `scp` on most machines) and runs them through the local shell. Since
//! everything goes through those programs, all your existing configuration (e.g., in
//! `.ssh/config`, or a running `ssh-agent`) continues to work as expected.
//!
//! All configuration for one remote account lives in an [`Ssh`] value. From it you can build
//! three kinds of command lines, and either inspect them or run them:
//!
//!  - [`execute_command`](Ssh::execute_command) / [`execute`](Ssh::execute) run a list of
//!    command lines on the remote host. The lines are joined with newlines and sent to
//!    `bash -se` through a quoted here-document, so nothing in them is expanded locally and
//!    no extra quoting is needed.
//!  - [`upload_command`](Ssh::upload_command) / [`upload`](Ssh::upload) copy a local file or
//!    directory to the remote host with `scp -r`.
//!  - [`download_command`](Ssh::download_command) / [`download`](Ssh::download) copy a
//!    remote file or directory to the local host with `scp -r`.
//!
//! Running a command waits for it to finish, with no timeout, and returns a
//! [`ProcessOutput`]. Output is streamed line by line to the handler set with
//! [`Ssh::on_output`] while the command runs, and each [`Process`] can be adjusted (working
//! directory, environment, timeout) by the hook set with [`Ssh::configure_process`] before it
//! starts. Use [`Ssh::spawn`] to get a [`RunningProcess`] handle that can be killed.
//!
//! # Authentication
//!
//! Interactive authentication is not supported: the local process gets no standard input. Set
//! up keypair-based authentication, and point at the key with [`Ssh::use_private_key`] if it is
//! not one ssh picks up by default.
//!
//! # Errors
//!
//! The only configuration error is an invalid port ([`Error::InvalidPort`]). A remote command
//! that fails, an unreachable host or a rejected login are _not_ errors of this crate: they
//! show up as an unsuccessful [`ProcessOutput::status`], with whatever `ssh`/`scp` printed about
//! it in [`ProcessOutput::stderr`]. [`Error`] is only returned when the local process cannot be
//! started, read from or waited for, or when it runs past its timeout.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), ssh_command::Error> {
//! use ssh_command::{OutputKind, Ssh};
//!
//! let mut ssh = Ssh::create("me", "ssh.example.com", None);
//! ssh.use_private_key("/home/me/.ssh/deploy")
//!     .on_output(|kind, line| match kind {
//!         OutputKind::Stdout => println!("{}", line),
//!         OutputKind::Stderr => eprintln!("{}", line),
//!     });
//!
//! let deploy = ssh.execute(["cd /srv/app", "git pull", "make install"]).await?;
//! assert!(deploy.success());
//!
//! ssh.download("/var/log/app", "./logs").await?;
//! # Ok(()) }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
pub use builder::Ssh;

mod command;
pub use command::{Commands, DELIMITER};

mod process;
pub use process::Process;

mod child;
pub use child::{ProcessOutput, RunningProcess};

mod stdio;
pub use stdio::OutputKind;

mod error;
pub use error::Error;
