use super::Error;

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};

/// Which output stream of the local process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Standard output.
    Stdout,
    /// Standard error. For `ssh` this carries both the remote stderr and ssh's own messages.
    Stderr,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OutputKind::Stdout => write!(f, "out"),
            OutputKind::Stderr => write!(f, "err"),
        }
    }
}

pub(crate) type OutputHandler = Arc<dyn Fn(OutputKind, &str) + Send + Sync>;

pub(crate) fn discard() -> OutputHandler {
    Arc::new(|_, _| {})
}

/// Everything a process wrote, one `\n` terminated line at a time.
#[derive(Debug, Default)]
pub(crate) struct Captured {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl Captured {
    fn push(&mut self, kind: OutputKind, line: &str) {
        let buf = match kind {
            OutputKind::Stdout => &mut self.stdout,
            OutputKind::Stderr => &mut self.stderr,
        };
        buf.push_str(line);
        buf.push('\n');
    }
}

/// The piped stdout and stderr of a child, with any partially read lines.
///
/// All read state lives here rather than in the future driving it, so that
/// [`forward_lines`](Streams::forward_lines) can be dropped at any await point and picked up
/// again without losing output or closing the pipes.
#[derive(Debug)]
pub(crate) struct Streams {
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<BufReader<ChildStderr>>,
    stdout_buf: Vec<u8>,
    stderr_buf: Vec<u8>,
    captured: Captured,
}

impl Streams {
    pub(crate) fn new(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> Self {
        Self {
            stdout: stdout.map(BufReader::new),
            stderr: stderr.map(BufReader::new),
            stdout_buf: Vec::new(),
            stderr_buf: Vec::new(),
            captured: Captured::default(),
        }
    }

    /// Everything read so far.
    pub(crate) fn captured(&self) -> &Captured {
        &self.captured
    }

    /// Reads stdout and stderr concurrently until both reach EOF, handing every line to
    /// `handler` as soon as it is complete.
    ///
    /// Cancel safe: a line is either fully delivered and captured, or stays buffered.
    pub(crate) async fn forward_lines(
        &mut self,
        handler: &(dyn Fn(OutputKind, &str) + Send + Sync),
    ) -> Result<(), Error> {
        while self.stdout.is_some() || self.stderr.is_some() {
            let (kind, line) = tokio::select! {
                line = read_line(&mut self.stdout, &mut self.stdout_buf), if self.stdout.is_some() => {
                    (OutputKind::Stdout, line)
                }
                line = read_line(&mut self.stderr, &mut self.stderr_buf), if self.stderr.is_some() => {
                    (OutputKind::Stderr, line)
                }
            };

            match line.map_err(Error::ChildIo)? {
                Some(line) => {
                    tracing::trace!(stream = %kind, line = %line, "process output");
                    handler(kind, &line);
                    self.captured.push(kind, &line);
                }
                None => match kind {
                    OutputKind::Stdout => self.stdout = None,
                    OutputKind::Stderr => self.stderr = None,
                },
            }
        }

        Ok(())
    }
}

// read_until appends partial data to `buf` when cancelled by select!, so the buffer is only
// cleared once a whole line has been taken out of it.
async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    let reader = match reader {
        Some(reader) => reader,
        None => return Ok(None),
    };

    reader.read_until(b'\n', buf).await?;
    if buf.is_empty() {
        return Ok(None);
    }

    let mut line: &[u8] = &buf[..];
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest.strip_suffix(b"\r").unwrap_or(rest);
    }
    let line = String::from_utf8_lossy(line).into_owned();
    buf.clear();
    Ok(Some(line))
}
