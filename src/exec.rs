//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How a child ended. `Output` only occurs in legacy mode, where the exit
/// status is discarded in favor of the captured streams.
#[derive(Debug)]
pub enum Status {
    Exited(i32),
    Signaled(i32),
    Output { stdout: String, stderr: String },
    SpawnFailed(io::Error),
}

fn command(argv: &[String], envs: &[(String, String)]) -> Option<Command> {
    let (program, args) = argv.split_first()?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    // Later entries override earlier ones on the same key.
    for (key, val) in envs {
        cmd.env(key, val);
    }
    Some(cmd)
}

fn empty_argv() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "empty argv")
}

/// Spawn `argv` with the given environment, wait for it, and report how it
/// ended along with the wall-clock duration (monotonic, so clock adjustments
/// during the run do not distort it). Spawn failures report a zero duration.
pub fn exec(argv: &[String], envs: &[(String, String)]) -> (Status, Duration) {
    let Some(mut cmd) = command(argv, envs) else {
        return (Status::SpawnFailed(empty_argv()), Duration::ZERO);
    };

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return (Status::SpawnFailed(err), Duration::ZERO),
    };
    let status = match child.wait() {
        Ok(status) => status,
        Err(err) => return (Status::SpawnFailed(err), start.elapsed()),
    };
    let elapsed = start.elapsed();

    let status = match status.code() {
        Some(code) => Status::Exited(code),
        None => Status::Signaled(status.signal().unwrap_or_default()),
    };
    (status, elapsed)
}

/// As [`exec`], but capture the child's stdout and stderr instead of its exit
/// status. Both streams are drained in full before the wait returns, and the
/// drain interleaves them so a child filling one pipe while the other is
/// still open cannot block.
pub fn exec_legacy(argv: &[String], envs: &[(String, String)]) -> (Status, Duration) {
    let Some(mut cmd) = command(argv, envs) else {
        return (Status::SpawnFailed(empty_argv()), Duration::ZERO);
    };
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let start = Instant::now();
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return (Status::SpawnFailed(err), Duration::ZERO),
    };
    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(err) => return (Status::SpawnFailed(err), start.elapsed()),
    };
    let elapsed = start.elapsed();

    let (stdout, stderr) = match (
        String::from_utf8(output.stdout),
        String::from_utf8(output.stderr),
    ) {
        (Ok(stdout), Ok(stderr)) => (stdout, stderr),
        _ => (String::new(), String::from("output not valid utf-8")),
    };
    (Status::Output { stdout, stderr }, elapsed)
}
