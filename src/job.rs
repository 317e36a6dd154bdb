//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fmt;

use chrono::{NaiveDateTime, Utc};

use crate::error::CroreError;
use crate::schedule::Schedule;

/// One line of the tab: a parsed schedule, the tokenized command, and the
/// memoized next firing instant. The expression and command never change
/// after construction; `next_run` is rewritten by the resolver after every
/// execution.
#[derive(Debug, Clone)]
pub struct CronJob {
    pub schedule: Schedule,
    pub command: Vec<String>,
    command_text: String,
    pub next_run: NaiveDateTime,
}

impl CronJob {
    /// Parse a tab line: five schedule fields, then the command as the
    /// remainder of the line.
    pub fn new(line: &str) -> Result<Self, CroreError> {
        let mut fields = line.splitn(6, ' ');
        let mut field = || {
            fields.next().ok_or_else(|| {
                CroreError::InvalidExpression(format!("too few fields in '{line}'"))
            })
        };
        let minute = field()?;
        let hour = field()?;
        let day = field()?;
        let month = field()?;
        let weekday = field()?;
        let command_text = field()?;

        let command = shlex::split(command_text)
            .ok_or_else(|| CroreError::BadCommand(command_text.to_string()))?;
        if command.is_empty() {
            return Err(CroreError::BadCommand(command_text.to_string()));
        }

        let schedule = Schedule::parse([minute, hour, day, month, weekday])?;
        let next_run = schedule.next_fire(Utc::now().naive_utc())?;

        Ok(CronJob {
            schedule,
            command,
            command_text: command_text.to_string(),
            next_run,
        })
    }

    /// Recompute `next_run` from the current instant. Cannot fail for
    /// expressions that resolved at construction time.
    pub fn reschedule(&mut self) -> Result<(), CroreError> {
        self.next_run = self.schedule.next_fire(Utc::now().naive_utc())?;
        Ok(())
    }

    /// Seconds-since-epoch view of `next_run`.
    pub fn next_unix(&self) -> i64 {
        self.next_run.and_utc().timestamp()
    }

    /// The command portion as it appeared in the tab, for log lines.
    pub fn command_text(&self) -> &str {
        &self.command_text
    }
}

impl fmt::Display for CronJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.schedule, self.command_text)
    }
}
