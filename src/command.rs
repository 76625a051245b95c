/// The sentinel line that terminates the here-document carrying a remote script.
pub const DELIMITER: &str = "EOF-SPATIE-SSH";

/// An ordered list of command lines making up a remote script.
///
/// `Commands` is what [`Ssh::execute`](crate::Ssh::execute) and
/// [`Ssh::execute_command`](crate::Ssh::execute_command) accept. It converts from a single
/// command (`&str` or `String`) as well as from any vector, slice or array of string-likes, so
/// both of these work:
///
/// ```
/// use ssh_command::Ssh;
///
/// let ssh = Ssh::create("root", "example.com", None);
/// let one = ssh.execute_command("whoami");
/// let many = ssh.execute_command(["cd /srv/app", "git pull", "make"]);
/// assert!(one.contains("\nwhoami\n"));
/// assert!(many.contains("\ncd /srv/app\ngit pull\nmake\n"));
/// ```
///
/// Lines are sent verbatim. No quoting or escaping is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands(Vec<String>);

impl Commands {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command line to the script.
    pub fn push<S: Into<String>>(&mut self, line: S) -> &mut Self {
        self.0.push(line.into());
        self
    }

    /// The command lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Whether the script has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Joins the command lines with a newline.
    pub fn join(&self) -> String {
        self.0.join("\n")
    }

    /// Wraps the script in a quoted here-document that feeds `bash -se` on the remote side.
    ///
    /// The delimiter is quoted (`\EOF-SPATIE-SSH`), so neither the local nor the remote shell
    /// expands anything inside the body.
    pub(crate) fn heredoc(&self) -> String {
        format!("'bash -se' << \\{0}\n{1}\n{0}", DELIMITER, self.join())
    }
}

impl From<&str> for Commands {
    fn from(line: &str) -> Self {
        Self(vec![line.to_owned()])
    }
}

impl From<String> for Commands {
    fn from(line: String) -> Self {
        Self(vec![line])
    }
}

impl From<&String> for Commands {
    fn from(line: &String) -> Self {
        Self(vec![line.clone()])
    }
}

impl<S: AsRef<str>> From<Vec<S>> for Commands {
    fn from(lines: Vec<S>) -> Self {
        lines.iter().collect()
    }
}

impl<S: AsRef<str>> From<&[S]> for Commands {
    fn from(lines: &[S]) -> Self {
        lines.iter().collect()
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for Commands {
    fn from(lines: [S; N]) -> Self {
        lines.iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Commands {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_owned()).collect())
    }
}

impl Extend<String> for Commands {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
