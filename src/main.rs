//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use gettextrs::{bind_textdomain_codeset, setlocale, textdomain, LocaleCategory};

use crore::config::{split_hook, Config};
use crore::daemon::Daemon;
use crore::error::CroreError;
use crore::job::CronJob;
use crore::log::{Logger, Verbosity};
use crore::PROJECT_NAME;

/// crore - a lightweight cron daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Command to run after every cronjob
    #[arg(short = 'a', value_name = "CMD")]
    after: Option<String>,

    /// Command to run before every cronjob
    #[arg(short = 'b', value_name = "CMD")]
    before: Option<String>,

    /// Environment variable for child processes
    #[arg(short = 'e', value_name = "K=V", action = ArgAction::Append)]
    env: Vec<String>,

    /// Capture and log child output instead of its exit status
    #[arg(short = 'l')]
    legacy: bool,

    /// Do not read any tab file
    #[arg(short = 'n')]
    notabfile: bool,

    /// Log activity with command strings and env values redacted
    #[arg(short = 'p')]
    private: bool,

    /// Log nothing
    #[arg(short = 's')]
    silent: bool,

    /// Tab file path
    #[arg(short = 't', value_name = "PATH")]
    tabfile: Option<PathBuf>,

    /// Print version and exit
    #[arg(short = 'v', action = ArgAction::Version)]
    version: (),

    /// Extra cron line appended to the loaded tab
    #[arg(short = 'x', value_name = "EXPR", action = ArgAction::Append)]
    extra: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setlocale(LocaleCategory::LcAll, "");
    textdomain(PROJECT_NAME)?;
    bind_textdomain_codeset(PROJECT_NAME, "UTF-8")?;

    if let Err(err) = run(args) {
        eprintln!("crore: {err}");
        process::exit(1);
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CroreError> {
    let mut config = match config_path() {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_args(&mut config, &args)?;

    let log = Logger::new(config.verbosity);
    for (key, val) in &config.envs {
        log.gated(&format!("env: {key}={{redacted}}"), &format!("env: {key}={val}"));
    }
    if !config.before.is_empty() {
        log.gated(
            "registered before-hook",
            &format!("registered before-hook: {}", config.before.join(" ")),
        );
    }
    if !config.after.is_empty() {
        log.gated(
            "registered after-hook",
            &format!("registered after-hook: {}", config.after.join(" ")),
        );
    }

    let jobs = load_tab(&config, &args.extra)?;
    Daemon::new(jobs, config).run()
}

/// Fold the command-line flags over the file-loaded config; flags win.
fn apply_args(config: &mut Config, args: &Args) -> Result<(), CroreError> {
    if let Some(after) = &args.after {
        config.after = split_hook(after)?;
    }
    if let Some(before) = &args.before {
        config.before = split_hook(before)?;
    }
    for entry in &args.env {
        let Some((key, val)) = entry.split_once('=') else {
            return Err(CroreError::InvalidArgument(format!(
                "expected K=V, got '{entry}'"
            )));
        };
        config.envs.push((key.to_string(), val.to_string()));
    }
    if args.legacy {
        config.legacy = true;
    }
    if args.notabfile {
        config.notabfile = true;
    }
    if let Some(tabfile) = &args.tabfile {
        config.tabfile = Some(tabfile.clone());
    }
    if args.private {
        config.verbosity = Verbosity::Private;
    }
    if args.silent {
        config.verbosity = Verbosity::Silent;
    }
    Ok(())
}

/// Build the job set from the tab file (unless disabled) plus any `-x` lines.
fn load_tab(config: &Config, extra: &[String]) -> Result<Vec<CronJob>, CroreError> {
    let mut lines: Vec<String> = Vec::new();
    if !config.notabfile {
        let path = match &config.tabfile {
            Some(path) => path.clone(),
            None => tab_path()?,
        };
        let text = fs::read_to_string(&path)?;
        lines.extend(text.lines().map(str::to_string));
    }
    lines.extend(extra.iter().cloned());

    let mut jobs = Vec::new();
    for (number, line) in lines.iter().enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let job = CronJob::new(line).map_err(|err| CroreError::AtLine {
            line: number + 1,
            source: Box::new(err),
        })?;
        jobs.push(job);
    }
    if jobs.is_empty() {
        return Err(CroreError::EmptyTab);
    }
    Ok(jobs)
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/crore/config"))
}

fn tab_path() -> Result<PathBuf, CroreError> {
    match dirs::home_dir() {
        Some(home) => Ok(home.join(".config/crore/tab")),
        None => Err(CroreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "home directory not found",
        ))),
    }
}
