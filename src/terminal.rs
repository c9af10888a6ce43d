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

//! A host for running outside a disassembler: dialogs on a terminal, symbols
//! read straight from the input binary, reports printed to stdout.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::host::{ClosePanel, DisplayReport, ExportHeader, ExportSymbols, Host, PromptForPath};
use crate::report::Report;
use crate::symbols::SymbolTable;

const EMPTY_HEADER: &str = "/* no declarations exported */\n";

pub struct TerminalHost<R, W> {
    input: R,
    out: W,
    prompts: Option<Box<dyn Write>>,
    input_file: PathBuf,
    header_source: Option<PathBuf>,
    json: bool,
    exhausted: bool,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    pub fn new(input: R, out: W, input_file: PathBuf) -> Self {
        Self {
            input,
            out,
            prompts: None,
            input_file,
            header_source: None,
            json: false,
            exhausted: false,
        }
    }

    /// Header to register with bap's C API instead of an empty one.
    pub fn header_source(mut self, path: Option<PathBuf>) -> Self {
        self.header_source = path;
        self
    }

    /// Send prompts somewhere other than the report writer, so that
    /// reports piped from stdout stay clean.
    pub fn prompt_to(mut self, prompts: Box<dyn Write>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Print reports as JSON.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    // None once input is exhausted
    fn read_answer(&mut self, prompt: &str) -> Option<String> {
        if self.exhausted {
            return None;
        }
        let sink: &mut dyn Write = match self.prompts.as_mut() {
            Some(prompts) => prompts.as_mut(),
            None => &mut self.out,
        };
        if write!(sink, "{}", prompt).and_then(|_| sink.flush()).is_err() {
            log::warn!("Could not write prompt");
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.exhausted = true;
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> PromptForPath for TerminalHost<R, W> {
    /// An empty answer takes the default, `-` cancels.
    fn ask_path(&mut self, default: &str, title: &str) -> Option<String> {
        let prompt = if default.is_empty() {
            format!("{}: ", title)
        } else {
            format!("{} [{}]: ", title, default)
        };
        let answer = self.read_answer(&prompt)?;
        match answer.as_str() {
            "-" => None,
            "" if default.is_empty() => None,
            "" => Some(default.to_string()),
            _ => Some(answer),
        }
    }

    /// Only `y`/`yes` is a yes. Once input runs out every question is
    /// answered yes, so a closed stdin cannot keep the path prompt looping.
    fn confirm(&mut self, message: &str) -> bool {
        match self.read_answer(&format!("{} [y/N] ", message)) {
            Some(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            None => true,
        }
    }
}

impl<R, W> ExportSymbols for TerminalHost<R, W> {
    fn export_symbols(&mut self, destination: &Path) -> Result<()> {
        let table = SymbolTable::from_object_file(&self.input_file)?;
        let file = File::create(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let mut writer = BufWriter::new(file);
        let count = table.write_bap_symbols(&mut writer)?;
        writer.flush()?;
        log::info!("Exported {} function symbols", count);
        Ok(())
    }
}

impl<R, W> ExportHeader for TerminalHost<R, W> {
    fn export_header(&mut self, destination: &Path) -> Result<()> {
        match &self.header_source {
            Some(source) => {
                fs::copy(source, destination).with_context(|| {
                    format!("Failed to copy header {}", source.display())
                })?;
            }
            None => fs::write(destination, EMPTY_HEADER)
                .with_context(|| format!("Failed to write {}", destination.display()))?,
        }
        Ok(())
    }
}

impl<R, W: Write> DisplayReport for TerminalHost<R, W> {
    fn display_report(&mut self, report: &Report) {
        let written = if self.json {
            serde_json::to_writer_pretty(&mut self.out, report)
                .map_err(std::io::Error::from)
                .and_then(|_| writeln!(self.out))
        } else {
            let text = report.render();
            if text.ends_with('\n') {
                write!(self.out, "{}", text)
            } else {
                writeln!(self.out, "{}", text)
            }
        };
        if let Err(e) = written.and_then(|_| self.out.flush()) {
            log::warn!("Could not print report: {}", e);
        }
    }
}

impl<R, W> ClosePanel for TerminalHost<R, W> {
    fn close_panel(&mut self, _title: &str) -> bool {
        false
    }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
    fn input_file(&self) -> PathBuf {
        self.input_file.clone()
    }
}
