//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use chrono::Utc;

use crate::config::Config;
use crate::error::CroreError;
use crate::exec::{exec, exec_legacy, Status};
use crate::job::CronJob;
use crate::log::Logger;

/// The scheduling loop. Owns the job set for the lifetime of the process;
/// jobs run sequentially, one child at a time, in insertion order within a
/// tick.
pub struct Daemon {
    jobs: Vec<CronJob>,
    config: Config,
    log: Logger,
}

impl Daemon {
    pub fn new(jobs: Vec<CronJob>, config: Config) -> Self {
        let log = Logger::new(config.verbosity);
        Daemon { jobs, config, log }
    }

    /// Select the earliest job, sleep until it is due, run everything due,
    /// reschedule, repeat. Only returns on an empty job set.
    pub fn run(&mut self) -> Result<(), CroreError> {
        if self.jobs.is_empty() {
            return Err(CroreError::EmptyTab);
        }
        loop {
            self.tick()?;
        }
    }

    fn tick(&mut self) -> Result<(), CroreError> {
        let now = unix_now();
        let (earliest, coincident) = self.earliest();
        let delta = self.jobs[earliest].next_unix() - now;
        if delta > 0 {
            if coincident > 1 {
                self.log.gated(
                    &format!("sleeping {delta}s"),
                    &format!("sleeping {delta}s until: {coincident} coincident jobs"),
                );
            } else {
                self.log.gated(
                    &format!("sleeping {delta}s"),
                    &format!(
                        "sleeping {delta}s until: {}",
                        self.jobs[earliest].command_text()
                    ),
                );
            }
            sleep(delta as u64);
        }

        // Dispatch must finish for every due job before any reschedule runs,
        // so a cascade of instant-due jobs cannot starve the others.
        let now = unix_now();
        let due = self.dispatch(now);
        for idx in due {
            self.jobs[idx].reschedule()?;
        }
        Ok(())
    }

    /// Index of the job with the minimum `next_run`, and how many jobs share
    /// that instant.
    fn earliest(&self) -> (usize, usize) {
        let mut idx = 0;
        let mut count = 1;
        for (i, job) in self.jobs.iter().enumerate().skip(1) {
            if job.next_run < self.jobs[idx].next_run {
                idx = i;
                count = 1;
            } else if job.next_run == self.jobs[idx].next_run {
                count += 1;
            }
        }
        (idx, count)
    }

    /// Run every job whose `next_run` has arrived, in insertion order.
    /// Returns the indices that ran.
    fn dispatch(&self, now: i64) -> Vec<usize> {
        let mut ran = Vec::new();
        for (idx, job) in self.jobs.iter().enumerate() {
            if job.next_unix() <= now {
                self.run_job(job);
                ran.push(idx);
            }
        }
        ran
    }

    fn run_job(&self, job: &CronJob) {
        self.log
            .gated("awake", &format!("awake for: {}", job.command_text()));

        self.run_hook(&self.config.before, "before-hook", None);

        let (status, duration) = if self.config.legacy {
            exec_legacy(&job.command, &self.config.envs)
        } else {
            exec(&job.command, &self.config.envs)
        };

        match &status {
            Status::Exited(code) if *code != 0 => self.log.plain(&format!(
                "cronjob exited status {code} ({})",
                job.command_text()
            )),
            Status::Exited(_) => {}
            Status::Signaled(signo) => self.log.plain(&format!(
                "cronjob exited from signal {signo} ({})",
                job.command_text()
            )),
            Status::Output { stdout, stderr } => {
                if !stdout.is_empty() || !stderr.is_empty() {
                    self.log.gated(
                        "got non-empty output (check logs)",
                        &format!(
                            "got non-empty output from `{}`:\n{stdout}{stderr}",
                            job.command_text()
                        ),
                    );
                }
            }
            Status::SpawnFailed(err) => self.log.plain(&format!(
                "cronjob failed to spawn ({}): {err}",
                job.command_text()
            )),
        }

        // The after-hook only fires when the child actually ran.
        let result = match &status {
            Status::Exited(code) => Some(code.to_string()),
            Status::Signaled(signo) => Some(signo.to_string()),
            Status::Output { stderr, .. } => Some(stderr.clone()),
            Status::SpawnFailed(_) => None,
        };
        if let Some(result) = result {
            self.run_hook(&self.config.after, "after-hook", Some((result, duration)));
        }
    }

    /// Run a hook synchronously; its output and status are ignored. The hook
    /// sees the configured envs plus `CRORE_COMMAND`, and after-hooks also
    /// `CRORE_RESULT` and `CRORE_DURATION` (microseconds).
    fn run_hook(&self, argv: &[String], label: &str, result: Option<(String, Duration)>) {
        if argv.is_empty() {
            return;
        }
        self.log.plain(label);

        let mut envs = self.config.envs.clone();
        envs.push(("CRORE_COMMAND".to_string(), argv.join(" ")));
        if let Some((result, duration)) = result {
            envs.push(("CRORE_RESULT".to_string(), result));
            envs.push(("CRORE_DURATION".to_string(), duration.as_micros().to_string()));
        }
        let _ = exec(argv, &envs);
    }
}

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

fn sleep(seconds: u64) {
    unsafe { libc::sleep(seconds.min(u32::MAX as u64) as u32) };
}
