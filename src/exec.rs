// Copyright (c) 2026 MCU-Debug Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Blocking execution of [`Invocation`]s.
//!
//! Exit codes are logged and otherwise ignored; a failing bap shows up as
//! whatever it managed to write to the output file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::command::Invocation;

pub trait Executor {
    /// Run to completion. Errors only when the redirect target cannot be opened.
    fn execute(&mut self, invocation: &Invocation) -> Result<()>;
}

/// Runs invocations as child processes of the current process.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<()> {
        log::debug!("Executing: {}", invocation);

        let mut command = Command::new(invocation.program());
        command.args(invocation.args()).stdin(Stdio::null());

        let mut sink = match invocation.redirect() {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                command.stdout(file.try_clone()?).stderr(file.try_clone()?);
                Some(file)
            }
            None => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
                None
            }
        };

        match command.status() {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("{} exited with {}", invocation.program().display(), status),
            Err(e) => {
                log::warn!("Failed to start {}: {}", invocation.program().display(), e);
                // Same place a shell would put "command not found" under 2>&1
                if let Some(file) = sink.as_mut() {
                    writeln!(file, "{}: {}", invocation.program().display(), e)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    #[test]
    fn redirects_stdout_and_stderr_into_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.out");
        let invocation = Invocation::new(Path::new("/bin/sh"))
            .flag("-c")
            .extra("'echo to-stdout; echo to-stderr >&2; exit 3'")
            .redirect_to(&out);

        ProcessExecutor.execute(&invocation).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("to-stdout"));
        assert!(text.contains("to-stderr"));
    }

    #[test]
    fn missing_program_is_reported_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.out");
        let invocation = Invocation::new(&dir.path().join("no-such-bap")).redirect_to(&out);

        ProcessExecutor.execute(&invocation).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("no-such-bap"), "unexpected output {:?}", text);
    }
}
