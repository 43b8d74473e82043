//! CLI argument definitions for kodi-repo.
//!
//! Kept apart from the entrypoint so tests can parse argument vectors
//! directly.

use camino::Utf8PathBuf;
use clap::Parser;

/// Build a Kodi add-on repository from version-controlled add-on sources.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "kodi-repo")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build a Kodi add-on repository from version-controlled add-on sources.\n\n",
    "Each add-on is named by a locator, ADDRESS[#REF][:SUBPATH]. Every locator is ",
    "cloned, validated and zipped concurrently; once all of them have succeeded ",
    "the add-ons, addons.xml and addons.xml.md5 are written to the target directory. ",
    "If any add-on fails, nothing is written and the first failure in the order the ",
    "locators were given is reported.",
))]
#[command(after_help = concat!(
    "LOCATORS:\n",
    "  https://github.com/org/repo.git                    default branch, repository root\n",
    "  https://github.com/org/repo.git#v1.2.0             tag or branch v1.2.0\n",
    "  https://github.com/org/repo.git#v1.2.0:plugin.x    add-on in subdirectory plugin.x\n\n",
    "EXAMPLES:\n",
    "  Build a repository from two add-ons:\n",
    "    $ kodi-repo --target ./repo \\\n",
    "        --addon https://github.com/org/plugin.video.a.git#v1.0.0 \\\n",
    "        --addon https://github.com/org/addons.git:plugin.audio.b\n\n",
    "  Build from a manifest:\n",
    "    $ kodi-repo --target ./repo --manifest repository.toml\n\n",
    "  Preview without cloning anything:\n",
    "    $ kodi-repo --target ./repo --manifest repository.toml --dry-run",
))]
pub struct Cli {
    /// Directory the repository is written to (created if missing).
    #[arg(short, long, value_name = "DIR")]
    pub target: Utf8PathBuf,

    /// Add-on locator, ADDRESS[#REF][:SUBPATH] (can be repeated).
    #[arg(short, long, value_name = "LOCATOR")]
    pub addon: Vec<String>,

    /// TOML manifest listing add-ons; its add-ons come before --addon ones.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Timeout in seconds for each git clone or checkout [default: 300].
    #[arg(long, value_name = "SECS")]
    pub git_timeout: Option<u64>,

    /// Show the resolved build plan and exit without cloning.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
