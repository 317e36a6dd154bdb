//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CroreError;
use crate::log::Verbosity;

/// Everything the daemon needs besides the tab itself. Built once from the
/// config file and command-line flags, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub verbosity: Verbosity,
    pub legacy: bool,
    /// Applied in order to every child; later entries override earlier ones.
    pub envs: Vec<(String, String)>,
    /// Hook argv vectors; empty means no hook.
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub tabfile: Option<PathBuf>,
    pub notabfile: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: Verbosity::Normal,
            legacy: false,
            envs: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            tabfile: None,
            notabfile: false,
        }
    }
}

impl Config {
    /// Read the config file at `path` if it exists; a missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, CroreError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Config::parse(&fs::read_to_string(path)?)
    }

    /// Parse config file text: `#` lines and blank lines are ignored, every
    /// other line is `key = val` split on the first ` = `. Unrecognized keys
    /// register environment variables for child processes.
    pub fn parse(text: &str) -> Result<Self, CroreError> {
        let mut config = Config::default();
        let mut private = false;
        let mut silent = false;

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once(" = ") else {
                return Err(CroreError::Config {
                    line: number,
                    reason: format!("missing ' = ' delimiter in '{line}'"),
                });
            };

            match key {
                "after" => config.after = split_hook(val)?,
                "before" => config.before = split_hook(val)?,
                "legacy" => config.legacy = parse_bool(number, key, val)?,
                "notabfile" => config.notabfile = parse_bool(number, key, val)?,
                "private" => private = parse_bool(number, key, val)?,
                "silent" => silent = parse_bool(number, key, val)?,
                "tabfile" => config.tabfile = Some(PathBuf::from(val)),
                _ => config.envs.push((key.to_string(), val.to_string())),
            }
        }

        if silent {
            config.verbosity = Verbosity::Silent;
        } else if private {
            config.verbosity = Verbosity::Private;
        }
        Ok(config)
    }
}

/// Word-split a hook command from the config file or a flag.
pub fn split_hook(raw: &str) -> Result<Vec<String>, CroreError> {
    shlex::split(raw).ok_or_else(|| CroreError::BadCommand(raw.to_string()))
}

fn parse_bool(line: usize, key: &str, val: &str) -> Result<bool, CroreError> {
    match val {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CroreError::Config {
            line,
            reason: format!("'{key}' expects true or false, got '{val}'"),
        }),
    }
}
