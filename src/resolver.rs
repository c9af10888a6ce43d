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

//! Makes sure the executable path and the API flag are configured, asking the
//! user only for what is missing.

use anyhow::Result;
use std::path::Path;

use crate::config::{Config, API_SECTION, DEFAULT_SECTION, ENABLED_KEY, EXECUTABLE_PATH_KEY};
use crate::discovery::{suggest_executable, Probe, BAP_BINARY_NAME};
use crate::host::PromptForPath;

pub const PATH_PROMPT_TITLE: &str = "Path to bap";
pub const CONFIRM_UNSET: &str = "Are you sure you don't want to set path?";
pub const CONFIRM_NAME_MISMATCH: &str = "Path does not end with bap. Confirm?";
pub const CONFIRM_NOT_A_FILE: &str = "Path does not point to a file. Confirm?";

/// Idempotent. Leaving the executable unset is a valid outcome, not an error:
/// callers check [`Config::executable_path`] afterwards. Errors only come from
/// persisting the configuration.
pub fn ensure_configured<D>(config: &mut Config, dialogs: &mut D, probe: &dyn Probe) -> Result<()>
where
    D: PromptForPath + ?Sized,
{
    if config.get(EXECUTABLE_PATH_KEY, DEFAULT_SECTION).is_none() {
        let suggestion = suggest_executable(probe);
        match ask_for_executable(dialogs, &suggestion) {
            Some(path) => {
                log::info!("Using bap executable {}", path);
                config.set(EXECUTABLE_PATH_KEY, &path, DEFAULT_SECTION)?;
            }
            None => log::info!("bap executable path left unset"),
        }
    }

    if config.get(ENABLED_KEY, API_SECTION).is_none() {
        config.set(ENABLED_KEY, "1", API_SECTION)?;
    }
    Ok(())
}

// Loops until the user either gives a path or explicitly confirms leaving it
// unset. The two sanity checks only ask for confirmation, they never refuse.
fn ask_for_executable<D>(dialogs: &mut D, suggestion: &str) -> Option<String>
where
    D: PromptForPath + ?Sized,
{
    loop {
        let Some(path) = dialogs.ask_path(suggestion, PATH_PROMPT_TITLE) else {
            if dialogs.confirm(CONFIRM_UNSET) {
                return None;
            }
            continue;
        };
        if !path.ends_with(BAP_BINARY_NAME) && !dialogs.confirm(CONFIRM_NAME_MISMATCH) {
            continue;
        }
        if !Path::new(&path).is_file() && !dialogs.confirm(CONFIRM_NOT_A_FILE) {
            continue;
        }
        return Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryBackend;
    use crate::discovery::MockProbe;
    use crate::host::MockPromptForPath;
    use anyhow::anyhow;
    use mockall::Sequence;
    use std::path::PathBuf;

    fn failing_probe() -> MockProbe {
        let mut probe = MockProbe::new();
        probe
            .expect_run()
            .returning(|program, _| Err(anyhow!("{} not installed", program)));
        probe
    }

    #[test]
    fn configured_path_skips_discovery_and_dialogs() {
        let mut config = Config::in_memory();
        config
            .set(EXECUTABLE_PATH_KEY, "/usr/bin/bap", DEFAULT_SECTION)
            .unwrap();
        let mut probe = MockProbe::new();
        probe.expect_run().times(0);
        let mut dialogs = MockPromptForPath::new();

        ensure_configured(&mut config, &mut dialogs, &probe).unwrap();

        assert_eq!(config.executable_path(), Some(PathBuf::from("/usr/bin/bap")));
        assert_eq!(config.get(ENABLED_KEY, API_SECTION), Some("1"));
    }

    #[test]
    fn declining_leaves_path_absent() {
        let backend = MemoryBackend::default();
        let mut config = Config::load(Box::new(backend.clone())).unwrap();
        let mut dialogs = MockPromptForPath::new();
        let mut seq = Sequence::new();
        dialogs
            .expect_ask_path()
            .withf(|default, title| default.is_empty() && title == PATH_PROMPT_TITLE)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| None);
        dialogs
            .expect_confirm()
            .withf(|message| message == CONFIRM_UNSET)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| false);
        dialogs
            .expect_ask_path()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| None);
        dialogs
            .expect_confirm()
            .withf(|message| message == CONFIRM_UNSET)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);

        ensure_configured(&mut config, &mut dialogs, &failing_probe()).unwrap();

        assert_eq!(config.executable_path(), None);
        let saved = backend.snapshot();
        assert!(!saved.contains_key(DEFAULT_SECTION));
        assert_eq!(saved[API_SECTION][ENABLED_KEY], "1");
    }

    #[test]
    fn existing_api_flag_is_never_overwritten() {
        let mut config = Config::in_memory();
        config
            .set(EXECUTABLE_PATH_KEY, "/usr/bin/bap", DEFAULT_SECTION)
            .unwrap();
        config.set(ENABLED_KEY, "no", API_SECTION).unwrap();
        let mut probe = MockProbe::new();
        probe.expect_run().times(0);

        ensure_configured(&mut config, &mut MockPromptForPath::new(), &probe).unwrap();

        assert_eq!(config.get(ENABLED_KEY, API_SECTION), Some("no"));
        assert!(!config.api_enabled());
    }

    #[test]
    fn suggestion_is_offered_and_real_file_accepted_without_questions() {
        let dir = tempfile::tempdir().unwrap();
        let bap = dir.path().join("bap");
        std::fs::write(&bap, "").unwrap();
        let bap_str = bap.to_string_lossy().into_owned();

        let mut probe = MockProbe::new();
        let found = format!("{}\n", bap_str);
        probe
            .expect_run()
            .withf(|program, _| program == "which")
            .returning(move |_, _| Ok(found.clone()));

        let mut dialogs = MockPromptForPath::new();
        let expected_default = bap_str.clone();
        dialogs
            .expect_ask_path()
            .withf(move |default, _| default == expected_default)
            .times(1)
            .returning(|default, _| Some(default.to_string()));
        dialogs.expect_confirm().times(0);

        let mut config = Config::in_memory();
        ensure_configured(&mut config, &mut dialogs, &probe).unwrap();

        assert_eq!(config.executable_path(), Some(bap));
    }

    #[test]
    fn rejected_soft_check_asks_again() {
        let mut dialogs = MockPromptForPath::new();
        let mut seq = Sequence::new();
        dialogs
            .expect_ask_path()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Some("/usr/bin/objdump".to_string()));
        dialogs
            .expect_confirm()
            .withf(|message| message == CONFIRM_NAME_MISMATCH)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| false);
        dialogs
            .expect_ask_path()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Some("/not/installed/yet/bap".to_string()));
        dialogs
            .expect_confirm()
            .withf(|message| message == CONFIRM_NOT_A_FILE)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);

        let mut config = Config::in_memory();
        ensure_configured(&mut config, &mut dialogs, &failing_probe()).unwrap();

        assert_eq!(
            config.executable_path(),
            Some(PathBuf::from("/not/installed/yet/bap"))
        );
    }
}
