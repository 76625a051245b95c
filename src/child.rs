use super::stdio::{OutputHandler, Streams};
use super::Error;

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process;
use tokio::time;

/// Representation of a running or exited local `ssh`/`scp` process.
///
/// Created by [`Ssh::spawn`](crate::Ssh::spawn) or [`Process::spawn`](crate::Process::spawn).
/// Output is only read, and handed to the output handler, while [`wait`](RunningProcess::wait)
/// is being polled. `wait` can be dropped at any point and called again later without losing
/// output. To cancel a long running remote operation, race `wait` against your own signal and
/// then [`kill`](RunningProcess::kill) the process:
///
/// ```no_run
/// # async fn foo(ssh: &ssh_command::Ssh) -> Result<(), ssh_command::Error> {
/// let mut child = ssh.spawn(ssh.execute_command("sleep 600"))?;
/// tokio::select! {
///     output = child.wait() => println!("finished: {:?}", output?.code()),
///     _ = tokio::signal::ctrl_c() => child.kill().await.map_err(ssh_command::Error::Wait)?,
/// }
/// # Ok(()) }
/// ```
///
/// Like [`tokio::process::Child`] with `kill_on_drop`, dropping a `RunningProcess` kills the
/// local process. Note that this does _not_ necessarily terminate the remote command.
pub struct RunningProcess {
    child: process::Child,
    command_line: String,
    streams: Streams,
    // the configured timeout and the instant it runs out, counted from spawn
    limit: Option<(Duration, time::Instant)>,
    handler: OutputHandler,
}

impl fmt::Debug for RunningProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningProcess")
            .field("child", &self.child)
            .field("command_line", &self.command_line)
            .field("streams", &self.streams)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl RunningProcess {
    pub(crate) fn new(
        mut child: process::Child,
        command_line: String,
        timeout: Option<Duration>,
        handler: OutputHandler,
    ) -> Self {
        let streams = Streams::new(child.stdout.take(), child.stderr.take());
        let limit = timeout.map(|timeout| (timeout, time::Instant::now() + timeout));

        Self {
            child,
            command_line,
            streams,
            limit,
            handler,
        }
    }

    /// The shell command line this process is running.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// The OS process id of the local shell, or `None` once it has been waited for.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Sends `signal` to the process group of the local shell, which includes `ssh`/`scp`.
    #[cfg(unix)]
    #[cfg_attr(docsrs, doc(cfg(unix)))]
    pub fn signal(&self, signal: libc::c_int) -> io::Result<()> {
        let pid = self
            .id()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "process has exited"))?;

        // the process was spawned as the leader of its own group, so -pid addresses the group
        let ret = unsafe { libc::kill(-(pid as libc::pid_t), signal) };
        if ret == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    /// Forces the process to exit without waiting for it.
    pub fn start_kill(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        if self.signal(libc::SIGKILL).is_ok() {
            return Ok(());
        }

        self.child.start_kill()
    }

    /// Forces the process to exit and waits for it to do so.
    pub async fn kill(&mut self) -> io::Result<()> {
        self.start_kill()?;
        self.child.wait().await?;
        Ok(())
    }

    /// Waits for the process to exit, streaming each line of its output to the output handler
    /// as it arrives, and returns the exit status along with everything it wrote.
    ///
    /// If a timeout was configured and it runs out first, the process is killed and
    /// [`Error::Timeout`] is returned. The timeout counts from when the process was spawned, not
    /// from this call.
    ///
    /// The returned future may be dropped (for example by `tokio::select!`) without affecting
    /// the process; a later call picks up where the dropped one left off. Once the process has
    /// exited, every call returns the same output.
    pub async fn wait(&mut self) -> Result<ProcessOutput, Error> {
        let (timeout, deadline) = match self.limit {
            Some(limit) => limit,
            None => return self.drive().await,
        };

        match time::timeout_at(deadline, self.drive()).await {
            Ok(output) => output,
            Err(_) => {
                tracing::warn!(command = %self.command_line, ?timeout, "process timed out, killing it");
                self.kill().await.map_err(Error::Wait)?;
                Err(Error::Timeout(timeout))
            }
        }
    }

    // every await in here is cancel safe, which is what makes `wait` resumable
    async fn drive(&mut self) -> Result<ProcessOutput, Error> {
        self.streams.forward_lines(&*self.handler).await?;

        let status = self.child.wait().await.map_err(Error::Wait)?;
        tracing::debug!(command = %self.command_line, %status, "process exited");

        let captured = self.streams.captured();
        Ok(ProcessOutput {
            status,
            stdout: captured.stdout.clone(),
            stderr: captured.stderr.clone(),
        })
    }
}

/// The result of a finished `ssh`/`scp` invocation.
///
/// A failed remote command, a rejected login or a missing file all show up here as an
/// unsuccessful [`status`](ProcessOutput::status); the text `ssh`/`scp` printed about it is in
/// [`stderr`](ProcessOutput::stderr).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// The exit status of the local shell, which is the exit status of `ssh`/`scp`.
    pub status: ExitStatus,
    /// Everything written to standard output, one `\n` terminated line at a time.
    pub stdout: String,
    /// Everything written to standard error, one `\n` terminated line at a time.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The exit code of the process, if it was not terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}
