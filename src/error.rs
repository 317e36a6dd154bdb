//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io;

use thiserror::Error;

/// Errors surfaced before the scheduling loop starts. Everything here is
/// fatal; failures inside the loop (spawn errors, nonzero children) are log
/// events, not errors.
#[derive(Debug, Error)]
pub enum CroreError {
    /// A cron field failed the grammar or range checks, or a schedule can
    /// never produce a calendar date.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// The command portion of a tab line could not be split into words.
    #[error("bad command: {0}")]
    BadCommand(String),

    /// A command-line argument did not have the expected shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A config file line failed to parse.
    #[error("config line {line}: {reason}")]
    Config { line: usize, reason: String },

    /// Wraps a parse failure with the tab line it came from.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<CroreError>,
    },

    #[error("tab is empty")]
    EmptyTab,

    #[error(transparent)]
    Io(#[from] io::Error),
}
