use super::stdio::{self, OutputHandler, OutputKind};
use super::{Commands, Error, Process, ProcessOutput, RunningProcess};

use std::fmt;
use std::sync::Arc;

type ProcessConfigurator = Arc<dyn Fn(&mut Process) + Send + Sync>;

/// Builds and runs `ssh`/`scp` command lines for one remote account.
///
/// Configuration methods take `&mut self` and return `&mut Self`, so they can be chained. The
/// `*_command` methods only build the command line; [`execute`](Ssh::execute),
/// [`upload`](Ssh::upload) and [`download`](Ssh::download) also run it through the local shell
/// and wait for it to finish.
///
/// ```
/// use ssh_command::Ssh;
///
/// let cmd = Ssh::create("root", "1.2.3.4", 2222)
///     .use_private_key("/id_rsa")
///     .download_command("/remote/f", "/local/f");
/// assert_eq!(cmd, "scp -i /id_rsa -r -P 2222 root@1.2.3.4:/remote/f /local/f");
/// ```
#[derive(Clone)]
pub struct Ssh {
    user: String,
    host: String,
    port: Option<u16>,
    private_key: String,
    strict_host_key_checking: bool,
    process_configurator: ProcessConfigurator,
    output_handler: OutputHandler,
}

impl fmt::Debug for Ssh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ssh")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("private_key", &self.private_key)
            .field("strict_host_key_checking", &self.strict_host_key_checking)
            .finish_non_exhaustive()
    }
}

impl Ssh {
    /// Targets `user@host`, optionally on a non-default `port`.
    ///
    /// `port` is anything that converts into an `Option<u16>`, so both `2222` and `None` work.
    ///
    /// Strict host key checking is enabled, no private key is passed and output is discarded as
    /// it streams (it is still captured in the returned [`ProcessOutput`]).
    pub fn create<U, H, P>(user: U, host: H, port: P) -> Self
    where
        U: Into<String>,
        H: Into<String>,
        P: Into<Option<u16>>,
    {
        Self {
            user: user.into(),
            host: host.into(),
            port: port.into(),
            private_key: String::new(),
            strict_host_key_checking: true,
            process_configurator: Arc::new(|_| {}),
            output_handler: stdio::discard(),
        }
    }

    /// Set the private key to authenticate with (`-i`).
    ///
    /// An empty path means no key is passed and ssh falls back to the agent and its defaults.
    pub fn use_private_key<P: Into<String>>(&mut self, path: P) -> &mut Self {
        self.private_key = path.into();
        self
    }

    /// Set the port to connect on (`ssh -p`, `scp -P`).
    ///
    /// Ports are `u16`, the same as for [`create`](Ssh::create). Fails with
    /// [`Error::InvalidPort`] if `port` is negative or above `65535`, in which case the
    /// previously configured port is kept. `0` is accepted and passed on as is.
    pub fn use_port(&mut self, port: i64) -> Result<&mut Self, Error> {
        let port = u16::try_from(port).map_err(|_| Error::InvalidPort(port))?;
        self.port = Some(port);
        Ok(self)
    }

    /// Set a hook that can adjust each [`Process`] before it is started.
    ///
    /// The hook runs exactly once per invocation, e.g. to set a working directory, environment
    /// variables or a [timeout](Process::timeout). Replaces any previously set hook.
    pub fn configure_process<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Process) + Send + Sync + 'static,
    {
        self.process_configurator = Arc::new(hook);
        self
    }

    /// Set a handler that is called with every line of output as it streams in.
    ///
    /// Lines from standard output and standard error arrive in the order they are read. Replaces
    /// any previously set handler.
    pub fn on_output<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(OutputKind, &str) + Send + Sync + 'static,
    {
        self.output_handler = Arc::new(handler);
        self
    }

    /// Verify the remote host key against the known hosts file. This is the default.
    pub fn enable_strict_host_key_checking(&mut self) -> &mut Self {
        self.strict_host_key_checking = true;
        self
    }

    /// Accept any host key and do not record it
    /// (`-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null`).
    pub fn disable_strict_host_key_checking(&mut self) -> &mut Self {
        self.strict_host_key_checking = false;
        self
    }

    /// The remote login account.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The remote host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured port, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The configured private key path; empty if none.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Whether strict host key checking is enabled.
    pub fn strict_host_key_checking(&self) -> bool {
        self.strict_host_key_checking
    }

    /// `user@host`.
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Builds the `ssh` command line that runs `commands` on the remote host.
    ///
    /// The lines are joined with newlines and fed to `bash -se` through a quoted here-document,
    /// so they reach the remote shell verbatim:
    ///
    /// ```text
    /// ssh {options} {user}@{host} 'bash -se' << \EOF-SPATIE-SSH
    /// {commands}
    /// EOF-SPATIE-SSH
    /// ```
    pub fn execute_command<C: Into<Commands>>(&self, commands: C) -> String {
        format!(
            "ssh {} {} {}",
            self.ssh_options(),
            self.target(),
            commands.into().heredoc()
        )
    }

    /// Runs `commands` on the remote host and waits for them to finish.
    ///
    /// A non-zero exit status is not an error; check [`ProcessOutput::success`].
    pub async fn execute<C: Into<Commands>>(&self, commands: C) -> Result<ProcessOutput, Error> {
        self.run(self.execute_command(commands)).await
    }

    /// Builds the `scp` command line that copies remote `source` to local `destination`.
    pub fn download_command<S, D>(&self, source: S, destination: D) -> String
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        format!(
            "scp {} {}:{} {}",
            self.scp_options(),
            self.target(),
            source.as_ref(),
            destination.as_ref()
        )
    }

    /// Copies remote `source` to local `destination` and waits for it to finish.
    pub async fn download<S, D>(&self, source: S, destination: D) -> Result<ProcessOutput, Error>
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        self.run(self.download_command(source, destination)).await
    }

    /// Builds the `scp` command line that copies local `source` to remote `destination`.
    pub fn upload_command<S, D>(&self, source: S, destination: D) -> String
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        format!(
            "scp {} {} {}:{}",
            self.scp_options(),
            source.as_ref(),
            self.target(),
            destination.as_ref()
        )
    }

    /// Copies local `source` to remote `destination` and waits for it to finish.
    pub async fn upload<S, D>(&self, source: S, destination: D) -> Result<ProcessOutput, Error>
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        self.run(self.upload_command(source, destination)).await
    }

    /// Prepares `command_line` to run locally, with the process configuration hook applied.
    ///
    /// The process has no timeout unless the hook sets one.
    pub fn process<S: Into<String>>(&self, command_line: S) -> Process {
        let mut process = Process::new(command_line);
        (self.process_configurator)(&mut process);
        process
    }

    /// Starts `command_line` (typically one of the `*_command` strings) without waiting for it.
    ///
    /// Use this over [`execute`](Ssh::execute) and friends when the process needs to be
    /// cancellable; see [`RunningProcess`].
    pub fn spawn<S: Into<String>>(&self, command_line: S) -> Result<RunningProcess, Error> {
        self.process(command_line)
            .spawn_with(Arc::clone(&self.output_handler))
    }

    async fn run(&self, command_line: String) -> Result<ProcessOutput, Error> {
        self.spawn(command_line)?.wait().await
    }

    fn ssh_options(&self) -> String {
        let mut options = self.common_options();
        if let Some(port) = self.port {
            options.push(format!("-p {}", port));
        }
        options.join(" ")
    }

    fn scp_options(&self) -> String {
        let mut options = self.common_options();
        // always recursive so that directories can be copied as well
        options.push(String::from("-r"));
        if let Some(port) = self.port {
            options.push(format!("-P {}", port));
        }
        options.join(" ")
    }

    fn common_options(&self) -> Vec<String> {
        let mut options = Vec::new();

        if !self.private_key.is_empty() {
            options.push(format!("-i {}", self.private_key));
        }

        if !self.strict_host_key_checking {
            options.push(String::from("-o StrictHostKeyChecking=no"));
            options.push(String::from("-o UserKnownHostsFile=/dev/null"));
        }

        options
    }
}
