//! User-facing progress and summary text for the CLI.
//!
//! Progress goes straight to stderr, separate from diagnostic logging, so
//! `--quiet` can silence it without hiding errors.

use camino::Utf8Path;
use kodi_repo_common::locator::PackageLocator;
use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format the message printed after a successful build.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use kodi_repo::output::success_message;
///
/// let message = success_message(1, Utf8Path::new("/srv/repo"));
/// assert_eq!(message, "Published 1 add-on to /srv/repo");
/// ```
#[must_use]
pub fn success_message(count: usize, target: &Utf8Path) -> String {
    let plural = if count == 1 { "add-on" } else { "add-ons" };
    format!("Published {count} {plural} to {target}")
}

/// What a `--dry-run` would have built.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Target directory.
    pub target: &'a Utf8Path,
    /// Locators in submission order.
    pub locators: &'a [PackageLocator],
    /// Per-operation git timeout.
    pub git_timeout: Duration,
}

impl DryRunInfo<'_> {
    /// Render the plan as multi-line text.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - nothing will be cloned or written".to_owned(),
            String::new(),
            format!("Target directory: {}", self.target),
            format!("Git timeout: {}s", self.git_timeout.as_secs()),
            String::new(),
            format!("Add-ons ({}):", self.locators.len()),
        ];
        for locator in self.locators {
            let reference = locator.reference().unwrap_or("default branch");
            lines.push(format!(
                "  - {} [{}] {}",
                locator.address(),
                reference,
                locator.subpath()
            ));
        }
        lines.join("\n")
    }
}
