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

//! Runs bap against the binary currently open in the host and shows what it
//! printed.
//!
//! A run is strictly sequential: configure, stage temporary files, export
//! from the host, execute, display, then tear everything down. Nothing here
//! treats a failing bap as an error; the report is the feedback channel.

use anyhow::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{self, Invocation};
use crate::config::Config;
use crate::discovery::Probe;
use crate::exec::Executor;
use crate::host::Host;
use crate::report::{Report, PANEL_TITLE};
use crate::resolver;
use crate::staging::StagedFiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Export symbols (and the C API header when enabled) and run bap with
    /// the file symbolizer and rooter.
    #[default]
    Full,
    /// Just `bap <input> <args>`.
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The user declined to configure bap. Nothing ran.
    NotConfigured,
    Completed(Report),
}

pub struct Runner<'a, H: ?Sized, E: ?Sized> {
    config: &'a mut Config,
    host: &'a mut H,
    executor: &'a mut E,
    probe: &'a dyn Probe,
    temp_dir: PathBuf,
}

impl<'a, H, E> Runner<'a, H, E>
where
    H: Host + ?Sized,
    E: Executor + ?Sized,
{
    pub fn new(
        config: &'a mut Config,
        host: &'a mut H,
        executor: &'a mut E,
        probe: &'a dyn Probe,
    ) -> Self {
        Self {
            config,
            host,
            executor,
            probe,
            temp_dir: env::temp_dir(),
        }
    }

    /// Stage temporary files under `dir` instead of the system temp directory.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn run(&mut self, argument_string: &str, mode: RunMode) -> Result<RunOutcome> {
        resolver::ensure_configured(&mut *self.config, &mut *self.host, self.probe)?;
        let Some(exe) = self.config.executable_path() else {
            log::info!("bap is not configured, nothing to run");
            return Ok(RunOutcome::NotConfigured);
        };

        let staged = StagedFiles::create_in(&self.temp_dir)?;
        let input = self.host.input_file();
        let mut api_registered = false;

        let main = match mode {
            RunMode::Minimal => {
                command::minimal_run(&exe, &input, argument_string, staged.output())
            }
            RunMode::Full => {
                if let Err(e) = self.host.export_symbols(staged.symbols()) {
                    log::warn!("Symbol export failed, bap gets an empty symbol file: {:#}", e);
                }
                if self.config.api_enabled() {
                    api_registered = self.register_api(&exe, staged.header());
                }
                command::full_run(
                    &exe,
                    &input,
                    staged.symbols(),
                    argument_string,
                    staged.output(),
                )
            }
        };

        self.execute(&main);
        let report = Report::new(main.to_string(), read_output(staged.output()));
        self.host.display_report(&report);

        // The host hands back a different panel object than the one it
        // registered, so close any open panel and let the next display
        // open a fresh one.
        if self.host.close_panel(PANEL_TITLE) {
            log::debug!("Closed stale {}", PANEL_TITLE);
        }

        if api_registered {
            self.execute(&command::api_remove(&exe, staged.header()));
        }
        staged.cleanup()?;
        Ok(RunOutcome::Completed(report))
    }

    fn register_api(&mut self, exe: &Path, header: &Path) -> bool {
        if let Err(e) = self.host.export_header(header) {
            log::warn!("Header export failed, skipping API registration: {:#}", e);
            return false;
        }
        self.execute(&command::api_add(exe, header));
        true
    }

    fn execute(&mut self, invocation: &Invocation) {
        if let Err(e) = self.executor.execute(invocation) {
            log::warn!("{:#}", e);
        }
    }
}

fn read_output(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("Could not read bap output {}: {}", path.display(), e);
            String::new()
        }
    }
}
