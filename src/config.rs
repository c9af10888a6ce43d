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

//! Persistent plugin configuration.
//!
//! Values are plain strings addressed by `(section, key)`. Keys that are not
//! under an explicit section live in [`DEFAULT_SECTION`]. Every `set`/`unset`
//! is written through to the backend immediately, so a crash mid-run never
//! loses the executable path the user just entered.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const DEFAULT_SECTION: &str = "default";
pub const API_SECTION: &str = "bap_api";
pub const EXECUTABLE_PATH_KEY: &str = "bap_executable_path";
pub const ENABLED_KEY: &str = "enabled";
pub const CONFIG_FILE_NAME: &str = "bap.cfg";

pub type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Where configuration is loaded from and saved to.
pub trait ConfigBackend {
    fn load(&self) -> Result<Sections>;
    fn save(&self, sections: &Sections) -> Result<()>;
}

pub struct Config {
    sections: Sections,
    backend: Box<dyn ConfigBackend>,
}

impl Config {
    pub fn load(backend: Box<dyn ConfigBackend>) -> Result<Self> {
        let sections = backend.load()?;
        Ok(Self { sections, backend })
    }

    /// An empty configuration that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            sections: Sections::new(),
            backend: Box::new(MemoryBackend::default()),
        }
    }

    pub fn get(&self, key: &str, section: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, section: &str, default: &'a str) -> &'a str {
        self.get(key, section).unwrap_or(default)
    }

    /// Keys and section names are limited to `[A-Za-z0-9_.-]`; values must
    /// fit on one line without surrounding whitespace, so that the file
    /// reads back exactly what was set.
    pub fn set(&mut self, key: &str, value: &str, section: &str) -> Result<()> {
        if !is_valid_name(key) {
            bail!("Invalid config key {:?}", key);
        }
        if !is_valid_name(section) {
            bail!("Invalid config section {:?}", section);
        }
        if value.contains(['\n', '\r']) || value.trim() != value {
            bail!("Config value for {} must be a single line without surrounding whitespace", key);
        }
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.backend.save(&self.sections)
    }

    /// Remove a key. Returns whether it was present.
    pub fn unset(&mut self, key: &str, section: &str) -> Result<bool> {
        let removed = match self.sections.get_mut(section) {
            Some(entries) => entries.remove(key).is_some(),
            None => false,
        };
        if !removed {
            return Ok(false);
        }
        if self.sections.get(section).is_some_and(BTreeMap::is_empty) {
            self.sections.remove(section);
        }
        self.backend.save(&self.sections)?;
        Ok(true)
    }

    pub fn executable_path(&self) -> Option<PathBuf> {
        self.get(EXECUTABLE_PATH_KEY, DEFAULT_SECTION)
            .map(PathBuf::from)
    }

    pub fn api_enabled(&self) -> bool {
        is_enabled_value(self.get_or(ENABLED_KEY, API_SECTION, "0"))
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// `"1"`, `"true"` and `"yes"` (any case) count as enabled, anything else does not.
pub fn is_enabled_value(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// INI-style file backend.
///
/// ```text
/// # comment
/// bap_executable_path = /usr/local/bin/bap
///
/// [bap_api]
/// enabled = 1
/// ```
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$IDAUSR/cfg/bap.cfg`, falling back to `~/.idapro/cfg/bap.cfg`.
    pub fn default_location() -> Option<PathBuf> {
        if let Some(user_dirs) = env::var_os("IDAUSR") {
            // IDAUSR is a search path; the first entry is the writable one
            if let Some(dir) = env::split_paths(&user_dirs).find(|p| !p.as_os_str().is_empty()) {
                return Some(dir.join("cfg").join(CONFIG_FILE_NAME));
            }
        }
        dirs::home_dir().map(|home| home.join(".idapro").join("cfg").join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigBackend for FileBackend {
    fn load(&self) -> Result<Sections> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_sections(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Sections::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config {}", self.path.display()))
            }
        }
    }

    fn save(&self, sections: &Sections) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;

        // Write next to the target and rename over it so readers never see a partial file
        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage config in {}", dir.display()))?;
        staged.write_all(render_sections(sections).as_bytes())?;
        staged
            .persist(&self.path)
            .with_context(|| format!("Failed to write config {}", self.path.display()))?;
        log::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

fn parse_sections(text: &str) -> Result<Sections> {
    let section_re = Regex::new(r"^\[\s*([^\]]+?)\s*\]$")?;
    let entry_re = Regex::new(r"^([A-Za-z0-9_.\-]+)\s*=\s*(.*)$")?;

    let mut sections = Sections::new();
    let mut current = DEFAULT_SECTION.to_string();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(caps) = section_re.captures(line) {
            current = caps[1].to_string();
            continue;
        }
        match entry_re.captures(line) {
            Some(caps) => {
                sections
                    .entry(current.clone())
                    .or_default()
                    .insert(caps[1].to_string(), caps[2].to_string());
            }
            None => log::warn!("Ignoring malformed config line {}: {}", index + 1, raw),
        }
    }
    Ok(sections)
}

fn render_sections(sections: &Sections) -> String {
    let mut out = String::new();
    if let Some(entries) = sections.get(DEFAULT_SECTION) {
        for (key, value) in entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    for (name, entries) in sections.iter().filter(|(name, _)| name.as_str() != DEFAULT_SECTION) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", name));
        for (key, value) in entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    out
}

/// Keeps configuration in memory. Clones share the same store, so a test can
/// hand one clone to [`Config`] and inspect what was saved through another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    stored: Arc<Mutex<Sections>>,
}

impl MemoryBackend {
    pub fn with_sections(sections: Sections) -> Self {
        Self {
            stored: Arc::new(Mutex::new(sections)),
        }
    }

    pub fn snapshot(&self) -> Sections {
        self.stored
            .lock()
            .map(|sections| sections.clone())
            .unwrap_or_default()
    }
}

impl ConfigBackend for MemoryBackend {
    fn load(&self) -> Result<Sections> {
        Ok(self.snapshot())
    }

    fn save(&self, sections: &Sections) -> Result<()> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| anyhow!("In-memory config store is poisoned"))?;
        *stored = sections.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_the_plugin_rules() {
        for value in ["1", "true", "TRUE", "Yes", "yes"] {
            assert!(is_enabled_value(value), "{} should enable", value);
        }
        for value in ["0", "", "no", "on", "2", " 1"] {
            assert!(!is_enabled_value(value), "{} should not enable", value);
        }
    }

    #[test]
    fn api_is_disabled_when_flag_absent() {
        let config = Config::in_memory();
        assert!(!config.api_enabled());
        assert_eq!(config.executable_path(), None);
    }

    #[test]
    fn set_writes_through_to_backend() {
        let backend = MemoryBackend::default();
        let mut config = Config::load(Box::new(backend.clone())).unwrap();
        config.set(ENABLED_KEY, "yes", API_SECTION).unwrap();
        config
            .set(EXECUTABLE_PATH_KEY, "/opt/bap/bin/bap", DEFAULT_SECTION)
            .unwrap();

        let saved = backend.snapshot();
        assert_eq!(saved[API_SECTION][ENABLED_KEY], "yes");
        assert_eq!(saved[DEFAULT_SECTION][EXECUTABLE_PATH_KEY], "/opt/bap/bin/bap");
        assert!(config.api_enabled());
    }

    #[test]
    fn unset_drops_empty_sections() {
        let backend = MemoryBackend::default();
        let mut config = Config::load(Box::new(backend.clone())).unwrap();
        config.set(ENABLED_KEY, "1", API_SECTION).unwrap();

        assert!(config.unset(ENABLED_KEY, API_SECTION).unwrap());
        assert!(!config.unset(ENABLED_KEY, API_SECTION).unwrap());
        assert!(backend.snapshot().is_empty());
    }

    #[test]
    fn file_backend_reads_what_it_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join(CONFIG_FILE_NAME);

        let mut config = Config::load(Box::new(FileBackend::new(&path))).unwrap();
        config
            .set(EXECUTABLE_PATH_KEY, "/home/me/.opam/default/bin/bap", DEFAULT_SECTION)
            .unwrap();
        config.set(ENABLED_KEY, "1", API_SECTION).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "bap_executable_path = /home/me/.opam/default/bin/bap\n\n[bap_api]\nenabled = 1\n"
        );

        let reloaded = Config::load(Box::new(FileBackend::new(&path))).unwrap();
        assert_eq!(
            reloaded.executable_path(),
            Some(PathBuf::from("/home/me/.opam/default/bin/bap"))
        );
        assert!(reloaded.api_enabled());
    }

    #[test]
    fn parser_skips_comments_and_junk() {
        let sections = parse_sections(
            "# written by hand\n; another comment\n\n  bap_executable_path=/usr/bin/bap  \n\
             not a key value line\n[ bap_api ]\nenabled = a=b\n",
        )
        .unwrap();
        assert_eq!(sections[DEFAULT_SECTION][EXECUTABLE_PATH_KEY], "/usr/bin/bap");
        assert_eq!(sections[API_SECTION][ENABLED_KEY], "a=b");
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn set_rejects_entries_that_would_not_read_back() {
        let backend = MemoryBackend::default();
        let mut config = Config::load(Box::new(backend.clone())).unwrap();

        assert!(config.set("bad key", "1", DEFAULT_SECTION).is_err());
        assert!(config.set("k=v", "1", DEFAULT_SECTION).is_err());
        assert!(config.set("", "1", DEFAULT_SECTION).is_err());
        assert!(config.set(ENABLED_KEY, "1", "bap]api").is_err());
        assert!(config
            .set(EXECUTABLE_PATH_KEY, "/usr/bin/bap\nenabled = 0", DEFAULT_SECTION)
            .is_err());
        assert!(config.set(EXECUTABLE_PATH_KEY, "/usr/bin/bap\r", DEFAULT_SECTION).is_err());
        assert!(config.set(EXECUTABLE_PATH_KEY, " /usr/bin/bap", DEFAULT_SECTION).is_err());

        assert!(backend.snapshot().is_empty());
        assert_eq!(config.executable_path(), None);
    }

    #[test]
    fn accepted_values_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = Config::load(Box::new(FileBackend::new(&path))).unwrap();
        config
            .set(EXECUTABLE_PATH_KEY, "/opt/my tools/bap", DEFAULT_SECTION)
            .unwrap();
        config.set("plugin.timeout-ms", "= 5", API_SECTION).unwrap();

        let reloaded = Config::load(Box::new(FileBackend::new(&path))).unwrap();
        assert_eq!(
            reloaded.get(EXECUTABLE_PATH_KEY, DEFAULT_SECTION),
            Some("/opt/my tools/bap")
        );
        assert_eq!(reloaded.get("plugin.timeout-ms", API_SECTION), Some("= 5"));
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.cfg"));
        assert!(backend.load().unwrap().is_empty());
    }
}
