//! Version-control capability used to obtain add-on sources.
//!
//! The build only needs two operations: clone a repository into a directory
//! and check out a named ref inside that clone. [`SourceControl`] captures
//! them so workers can be driven by the real `git` executable ([`GitCli`]) or
//! by an in-process fake in tests.

use crate::error::FetchError;
use camino::Utf8Path;
use log::debug;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for a single git operation (5 minutes).
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Clone-and-checkout capability shared by all package workers.
#[cfg_attr(test, mockall::automock)]
pub trait SourceControl: Send + Sync {
    /// Clone `address` into the empty directory `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the clone fails or times out.
    fn clone_repository(&self, address: &str, destination: &Utf8Path) -> Result<(), FetchError>;

    /// Check out `reference` inside the clone at `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the checkout fails or times out.
    fn checkout(&self, repository: &Utf8Path, reference: &str) -> Result<(), FetchError>;
}

/// [`SourceControl`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone, Copy)]
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    /// Create a git runner whose operations are bounded by `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The per-operation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_TIMEOUT)
    }
}

impl SourceControl for GitCli {
    fn clone_repository(&self, address: &str, destination: &Utf8Path) -> Result<(), FetchError> {
        let invocation = GitInvocation {
            args: &["clone", "--quiet", "--", address, destination.as_str()],
            working_dir: None,
            operation: "clone",
            address,
        };
        self.run(&invocation)
    }

    fn checkout(&self, repository: &Utf8Path, reference: &str) -> Result<(), FetchError> {
        let invocation = GitInvocation {
            args: &["checkout", "--quiet", "--end-of-options", reference],
            working_dir: Some(repository),
            operation: "checkout",
            address: repository.as_str(),
        };
        self.run(&invocation)
    }
}

struct GitInvocation<'a> {
    args: &'a [&'a str],
    working_dir: Option<&'a Utf8Path>,
    operation: &'static str,
    address: &'a str,
}

impl GitCli {
    fn run(&self, invocation: &GitInvocation<'_>) -> Result<(), FetchError> {
        debug!("git {}", invocation.args.join(" "));
        let output = self.run_with_timeout(invocation)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Git {
                operation: invocation.operation,
                address: invocation.address.to_owned(),
                message: stderr.trim().to_owned(),
            });
        }
        Ok(())
    }

    /// Run git, killing it if it outlives the timeout.
    fn run_with_timeout(&self, invocation: &GitInvocation<'_>) -> Result<Output, FetchError> {
        let mut cmd = Command::new("git");
        cmd.args(invocation.args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = invocation.working_dir {
            cmd.current_dir(dir.as_std_path());
        }

        let mut child = cmd.spawn().map_err(FetchError::Spawn)?;

        match child.wait_timeout(self.timeout).map_err(FetchError::Spawn)? {
            Some(status) => {
                let stdout = child
                    .stdout
                    .take()
                    .map(std::io::read_to_string)
                    .transpose()
                    .map_err(FetchError::Spawn)?
                    .unwrap_or_default();
                let stderr = child
                    .stderr
                    .take()
                    .map(std::io::read_to_string)
                    .transpose()
                    .map_err(FetchError::Spawn)?
                    .unwrap_or_default();

                Ok(Output {
                    status,
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(FetchError::Timeout {
                    operation: invocation.operation,
                    address: invocation.address.to_owned(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
