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

//! Temporary files shared between the host exporters, `bap` and the report.
//!
//! All three files are created up front, whether or not the run ends up
//! writing them, and are removed when the [`StagedFiles`] goes away, on every
//! exit path.

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tempfile::{Builder, TempPath};

pub const TEMP_PREFIX: &str = "ida-bap-";

pub struct StagedFiles {
    output: TempPath,
    symbols: TempPath,
    header: TempPath,
}

impl StagedFiles {
    pub fn create_in(dir: &Path) -> Result<Self> {
        Ok(Self {
            output: stage(dir, ".out")?,
            symbols: stage(dir, ".sym")?,
            header: stage(dir, ".h")?,
        })
    }

    /// Combined stdout/stderr of the main `bap` run.
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn symbols(&self) -> &Path {
        &self.symbols
    }

    pub fn header(&self) -> &Path {
        &self.header
    }

    /// Remove all three files now. A file that is already gone is fine.
    pub fn cleanup(self) -> Result<()> {
        let Self {
            output,
            symbols,
            header,
        } = self;
        for staged in [symbols, header, output] {
            let path = staged.to_path_buf();
            match staged.close() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to remove {}", path.display()))
                }
            }
        }
        log::debug!("Removed staged files");
        Ok(())
    }
}

fn stage(dir: &Path, suffix: &str) -> Result<TempPath> {
    let file = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    Ok(file.into_temp_path())
}
