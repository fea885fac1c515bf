/// Struct to represent a shell command to be executed
/// inside a read folder
///
/// # Example
///
/// ``` rust
/// use nanoamp::executor::job::Job;
///
/// let job = Job::new()
///     .task("filtlong")
///     .arg("--min_length")
///     .arg("1000");
///
/// assert_eq!(job.cmd(), "filtlong --min_length 1000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    cmd: String,
}

impl Job {
    pub fn new() -> Self {
        Self { cmd: String::new() }
    }

    /// Start the job with a binary name.
    pub fn task(mut self, binary: &str) -> Self {
        self.cmd.push_str(binary);
        self
    }

    /// Add an argument to the job.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.cmd.push(' ');
        self.cmd.push_str(arg.as_ref());
        self
    }

    /// Add multiple arguments to the job.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.push(' ');
            self.cmd.push_str(arg.as_ref());
        }
        self
    }

    /// Chain another job after this one; the second command only runs if
    /// the first succeeded.
    pub fn then(mut self, next: Job) -> Self {
        self.cmd.push_str(" && ");
        self.cmd.push_str(&next.cmd);
        self
    }

    /// Redirect this job's stdout to a file.
    pub fn stdout(mut self, file: &str) -> Self {
        self.cmd.push_str(" > ");
        self.cmd.push_str(file);
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
