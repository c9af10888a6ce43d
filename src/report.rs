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

/// What the output panel shows after a run.
use serde::Serialize;
use std::fmt;

/// Title of the host panel that displays reports.
pub const PANEL_TITLE: &str = "BAP View";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The command that was run, in shell form.
    pub command: String,
    /// Everything bap wrote to stdout and stderr.
    pub output: String,
}

impl Report {
    pub fn new(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "BAP execution string\n\
             --------------------\n\
             \n\
             {}\n\
             \n\
             Output\n\
             ------\n\
             \n\
             {}",
            format_transcript(&self.command),
            self.output
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Put every `--` on its own indented line. Cosmetic only, and it does not
/// care whether the `--` starts a flag or sits inside a path.
pub fn format_transcript(command: &str) -> String {
    command.trim().split("--").collect::<Vec<_>>().join("\n    --")
}
