//! kodi-repo CLI entrypoint.
//!
//! Builds a Kodi add-on repository from the add-on locators given on the
//! command line or in a manifest, and publishes it to the target directory.

use clap::Parser;
use kodi_repo::cli::Cli;
use kodi_repo::config::BuildSettings;
use kodi_repo::error::Result;
use kodi_repo::git::GitCli;
use kodi_repo::logging;
use kodi_repo::output::{DryRunInfo, write_stderr_line};
use kodi_repo::pipeline::{PipelineContext, create_repository};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let settings = BuildSettings::resolve(cli)?;

    if settings.dry_run {
        let info = DryRunInfo {
            target: &settings.target,
            locators: &settings.locators,
            git_timeout: settings.git_timeout,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let git = GitCli::new(settings.git_timeout);
    let context = PipelineContext {
        target: &settings.target,
        locators: &settings.locators,
        quiet: settings.quiet,
    };
    create_repository(&context, &git, stderr)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use kodi_repo::error::BuildError;
    use kodi_repo_common::error::LocatorParseError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = BuildError::Locator(LocatorParseError::EmptyAddress {
            locator: ":plugin.x".to_owned(),
        });

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert_eq!(stderr_text.lines().count(), 1);
        assert!(stderr_text.contains("empty address"));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let target = Utf8PathBuf::try_from(temp_dir.path().join("repo")).expect("utf-8 path");
        let cli = Cli::parse_from([
            "kodi-repo",
            "--target",
            target.as_str(),
            "--addon",
            "https://host/unreachable.git#v1:plugin.x",
            "--dry-run",
        ]);

        let mut stderr = Vec::new();
        run(&cli, &mut stderr).expect("dry run succeeds");

        assert!(!target.exists());
        let text = String::from_utf8(stderr).expect("utf-8 output");
        assert!(text.contains("https://host/unreachable.git [v1] plugin.x"));
    }
}
