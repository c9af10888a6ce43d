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

//! Command lines handed to `bap`.
//!
//! An [`Invocation`] carries the real argument vector, passed to the OS
//! without a shell, and a transcript that renders the same call in shell
//! form for the report and the logs. Flag names and their order are part of
//! bap's CLI contract and must not change.

use std::ffi::OsString;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    transcript: Vec<String>,
    redirect: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
            transcript: vec![quoted(program)],
            redirect: None,
        }
    }

    pub fn path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self.transcript.push(quoted(path));
        self
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.into());
        self.transcript.push(flag.to_string());
        self
    }

    /// `--key=<path>`, with the path quoted in the transcript.
    pub fn keyed_path(mut self, key: &str, path: &Path) -> Self {
        let mut arg = OsString::from(key);
        arg.push(path.as_os_str());
        self.args.push(arg);
        self.transcript.push(format!("{}{}", key, quoted(path)));
        self
    }

    /// Caller-supplied arguments. Split like a shell would, shown as typed.
    pub fn extra(mut self, raw: &str) -> Self {
        self.args
            .extend(split_arguments(raw).into_iter().map(OsString::from));
        let shown = raw.trim();
        if !shown.is_empty() {
            self.transcript.push(shown.to_string());
        }
        self
    }

    /// Send stdout and stderr to `path`.
    pub fn redirect_to(mut self, path: &Path) -> Self {
        self.redirect = Some(path.to_path_buf());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn redirect(&self) -> Option<&Path> {
        self.redirect.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.transcript.join(" "))?;
        if let Some(out) = &self.redirect {
            write!(f, " > {} 2>&1", quoted(out))?;
        }
        Ok(())
    }
}

/// `"<exe>" "<input>" <args> > "<out>" 2>&1`
pub fn minimal_run(exe: &Path, input: &Path, extra: &str, output: &Path) -> Invocation {
    Invocation::new(exe)
        .path(input)
        .extra(extra)
        .redirect_to(output)
}

/// `"<exe>" "<input>" --read-symbols-from="<sym>" --symbolizer=file --rooter=file <args> -d > "<out>" 2>&1`
pub fn full_run(exe: &Path, input: &Path, symbols: &Path, extra: &str, output: &Path) -> Invocation {
    Invocation::new(exe)
        .path(input)
        .keyed_path("--read-symbols-from=", symbols)
        .flag("--symbolizer=file")
        .flag("--rooter=file")
        .extra(extra)
        .flag("-d")
        .redirect_to(output)
}

/// Register `header` as a C API definition source.
pub fn api_add(exe: &Path, header: &Path) -> Invocation {
    Invocation::new(exe).keyed_path("--api-add=c:", header)
}

/// bap stores registered headers by file name, so removal takes only that.
pub fn api_remove(exe: &Path, header: &Path) -> Invocation {
    let name = header
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Invocation::new(exe).flag(&format!("--api-remove=c:{}", name))
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

/// Shell-style word splitting: whitespace separates words, single quotes are
/// literal, double quotes allow `\` escapes, and quotes may start mid-word
/// (`--opt="a b"`). An unterminated quote runs to the end of the input.
pub fn split_arguments(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => current.push(chars.next().unwrap_or('\\')),
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
