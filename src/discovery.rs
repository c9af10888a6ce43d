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

//! Best-effort discovery of the `bap` executable, used only to pre-fill the
//! path prompt. Every failure here just means "no suggestion".

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

pub const BAP_BINARY_NAME: &str = "bap";

/// Runs a locator command and returns its stdout.
#[cfg_attr(test, mockall::automock)]
pub trait Probe {
    /// Fails if the command cannot be started or exits unsuccessfully.
    fn run(&self, program: &str, args: Vec<String>) -> Result<String>;
}

/// Runs probes as real processes.
pub struct SystemProbe;

impl Probe for SystemProbe {
    fn run(&self, program: &str, args: Vec<String>) -> Result<String> {
        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Running {}", program))?;
        if !output.status.success() {
            bail!("{} exited with {}", program, output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Suggest a default executable path: `which bap` first, then opam's `bap:bin`
/// directory. Anything that does not end in `bap` is discarded.
pub fn suggest_executable(probe: &dyn Probe) -> String {
    let candidate = locate_with_which(probe).or_else(|| locate_with_opam(probe));
    match candidate {
        Some(path) if path.ends_with(BAP_BINARY_NAME) => path,
        Some(path) => {
            log::debug!("Ignoring implausible bap location {:?}", path);
            String::new()
        }
        None => String::new(),
    }
}

fn locate_with_which(probe: &dyn Probe) -> Option<String> {
    match probe.run("which", vec![BAP_BINARY_NAME.to_string()]) {
        Ok(out) if out.trim().is_empty() => None,
        Ok(out) => Some(out.trim().to_string()),
        Err(e) => {
            log::debug!("which probe failed: {:#}", e);
            None
        }
    }
}

fn locate_with_opam(probe: &dyn Probe) -> Option<String> {
    let args = ["config", "var", "bap:bin"].map(String::from).to_vec();
    match probe.run("opam", args) {
        Ok(out) => {
            let bin_dir = out.trim();
            if bin_dir.is_empty() {
                return None;
            }
            Some(
                Path::new(bin_dir)
                    .join(BAP_BINARY_NAME)
                    .to_string_lossy()
                    .into_owned(),
            )
        }
        Err(e) => {
            log::debug!("opam probe failed: {:#}", e);
            None
        }
    }
}
