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

//! The narrow interfaces through which the orchestration talks to the host
//! disassembler. Nothing in here knows about a particular host; the terminal
//! host in [`crate::terminal`] is one implementation, a disassembler plugin
//! shim is another.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::report::Report;

/// Interactive dialogs used while configuring.
#[cfg_attr(test, mockall::automock)]
pub trait PromptForPath {
    /// Ask for a file path, pre-filled with `default`. `None` means the user cancelled.
    fn ask_path(&mut self, default: &str, title: &str) -> Option<String>;
    /// Yes/no question.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Dumps the host's current symbol knowledge in BAP's symbol file format.
pub trait ExportSymbols {
    fn export_symbols(&mut self, destination: &Path) -> Result<()>;
}

/// Dumps the host's known types and prototypes as a C header.
pub trait ExportHeader {
    fn export_header(&mut self, destination: &Path) -> Result<()>;
}

/// Replaces the contents of the output panel.
pub trait DisplayReport {
    fn display_report(&mut self, report: &Report);
}

pub trait ClosePanel {
    /// Close the panel titled `title` if one is open. Returns whether one was closed.
    fn close_panel(&mut self, title: &str) -> bool;
}

/// Everything a run needs from the host.
pub trait Host: PromptForPath + ExportSymbols + ExportHeader + DisplayReport + ClosePanel {
    /// The binary currently loaded in the host.
    fn input_file(&self) -> PathBuf;
}
