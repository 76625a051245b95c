use super::stdio::{self, OutputHandler, OutputKind};
use super::{Error, ProcessOutput, RunningProcess};

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process;

/// A local shell invocation of a single command line, not yet started.
///
/// This is what the hook registered with
/// [`Ssh::configure_process`](crate::Ssh::configure_process) receives, so it can adjust the
/// working directory, the environment or the timeout before anything runs.
///
/// On Unix the command line is run through `/bin/sh -c`, in a process group of its own, so that
/// [`RunningProcess::signal`] and timeouts reach `ssh`/`scp` and not just the shell. On Windows it
/// is run through `cmd /C`.
///
/// Standard input is [`Stdio::null`], standard output and standard error are always piped so
/// that they can be streamed line by line.
#[derive(Debug)]
pub struct Process {
    command_line: String,
    builder: process::Command,
    timeout: Option<Duration>,
}

impl Process {
    /// Prepares `command_line` to run in the local shell, with no timeout.
    pub fn new<S: Into<String>>(command_line: S) -> Self {
        let command_line = command_line.into();

        #[cfg(unix)]
        let shell = {
            use std::os::unix::process::CommandExt;

            let mut shell = std::process::Command::new("/bin/sh");
            shell.arg("-c").arg(&command_line).process_group(0);
            shell
        };

        #[cfg(windows)]
        let shell = {
            let mut shell = std::process::Command::new("cmd");
            shell.arg("/C").arg(&command_line);
            shell
        };

        let mut builder = process::Command::from(shell);
        builder
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Self {
            command_line,
            builder,
            timeout: None,
        }
    }

    /// The full shell command line this process will run.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Sets the working directory of the local shell.
    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.builder.current_dir(dir);
        self
    }

    /// Sets an environment variable for the local shell.
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.builder.env(key, val);
        self
    }

    /// Sets several environment variables for the local shell.
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.builder.envs(vars);
        self
    }

    /// Removes an environment variable from the local shell's environment.
    pub fn env_remove<K: AsRef<OsStr>>(&mut self, key: K) -> &mut Self {
        self.builder.env_remove(key);
        self
    }

    /// Clears the entire environment of the local shell.
    pub fn env_clear(&mut self) -> &mut Self {
        self.builder.env_clear();
        self
    }

    /// Limits how long [`RunningProcess::wait`] lets the process run.
    ///
    /// `None` (the default) means no limit.
    pub fn timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// The currently configured timeout, if any.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Direct access to the underlying [`tokio::process::Command`].
    ///
    /// Changing the program arguments or the stdio configuration through this breaks output
    /// streaming; it is meant for settings that `Process` does not expose itself.
    pub fn as_command_mut(&mut self) -> &mut process::Command {
        &mut self.builder
    }

    /// Starts the process without waiting for it, returning a handle to it instead.
    ///
    /// `handler` is called for every line of output once [`RunningProcess::wait`] is polled.
    pub fn spawn<F>(self, handler: F) -> Result<RunningProcess, Error>
    where
        F: Fn(OutputKind, &str) + Send + Sync + 'static,
    {
        self.spawn_with(Arc::new(handler))
    }

    /// Starts the process and waits for it to finish, streaming its output to `handler`.
    pub async fn run<F>(self, handler: F) -> Result<ProcessOutput, Error>
    where
        F: Fn(OutputKind, &str) + Send + Sync + 'static,
    {
        self.spawn(handler)?.wait().await
    }

    /// Starts the process and waits for it to finish, discarding output as it streams.
    ///
    /// The output is still captured in the returned [`ProcessOutput`].
    pub async fn output(self) -> Result<ProcessOutput, Error> {
        self.spawn_with(stdio::discard())?.wait().await
    }

    pub(crate) fn spawn_with(mut self, handler: OutputHandler) -> Result<RunningProcess, Error> {
        tracing::debug!(command = %self.command_line, timeout = ?self.timeout, "spawning process");

        let child = self.builder.spawn().map_err(Error::Spawn)?;

        Ok(RunningProcess::new(
            child,
            self.command_line,
            self.timeout,
            handler,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = Process::new("echo hi");
        assert_eq!(p.command_line(), "echo hi");
        assert_eq!(p.get_timeout(), None);
    }

    #[test]
    fn timeout() {
        let mut p = Process::new("true");
        p.timeout(Some(Duration::from_secs(3)));
        assert_eq!(p.get_timeout(), Some(Duration::from_secs(3)));
        p.timeout(None);
        assert_eq!(p.get_timeout(), None);
    }

    #[cfg(unix)]
    #[test]
    fn runs_through_sh() {
        let p = Process::new("echo hi");
        let cmd = p.builder.as_std();
        assert_eq!(cmd.get_program(), "/bin/sh");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-c", "echo hi"]);
    }
}
