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

/// Logger setup for the command line tool.
use anyhow::{anyhow, Result};
use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};
use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Start logging to stderr. `RUST_LOG` wins over the level picked here.
/// Keep the returned handle alive for as long as logging is wanted.
pub fn init(debug: bool) -> Result<LoggerHandle> {
    DEBUG_ENABLED.set(debug).ok();
    let level = if debug { "debug" } else { "info" };
    start(level).map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

/// Whether `-d/--debug` was given.
pub fn is_debug() -> bool {
    *DEBUG_ENABLED.get().unwrap_or(&false)
}

fn start(level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
}
