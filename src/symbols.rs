//! Symbol table of the input binary, for hosts that have no analysis
//! database of their own to dump.

use anyhow::{Context, Result};
use object::{Object, ObjectSymbol, SymbolKind};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    Function,
    Data,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub kind: SymbolType,
}

impl Symbol {
    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.size)
    }
}

pub struct SymbolTable {
    // Map start_addr -> Symbol, so output comes out in address order
    symbols_by_addr: std::collections::BTreeMap<u64, Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols_by_addr: std::collections::BTreeMap::new(),
        }
    }

    /// Read the static and dynamic symbol tables of an ELF, PE or Mach-O file.
    /// Undefined and zero-sized symbols are skipped.
    pub fn from_object_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file = object::File::parse(&*data)
            .with_context(|| format!("{} is not a recognised object file", path.display()))?;

        let mut table = Self::new();
        for sym in file.symbols().chain(file.dynamic_symbols()) {
            if sym.is_undefined() || sym.size() == 0 {
                continue;
            }
            let name = match sym.name() {
                Ok(name) if !name.is_empty() => name,
                _ => continue,
            };
            let kind = match sym.kind() {
                SymbolKind::Text => SymbolType::Function,
                SymbolKind::Data => SymbolType::Data,
                _ => SymbolType::Unknown,
            };
            table.insert(Symbol {
                name: name.to_string(),
                address: sym.address(),
                size: sym.size(),
                kind,
            });
        }
        log::debug!("Read {} symbols from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, symbol: Symbol) {
        // If there are duplicate start addresses, this overwrites.
        // The dynamic table repeats exported names from the static one.
        self.symbols_by_addr.insert(symbol.address, symbol);
    }

    pub fn len(&self) -> usize {
        self.symbols_by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols_by_addr.is_empty()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols_by_addr
            .values()
            .filter(|s| s.kind == SymbolType::Function)
    }

    /// Write functions in the format `--read-symbols-from` expects, one
    /// `(name 0xstart 0xend)` per line. Returns how many were written.
    pub fn write_bap_symbols<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        let mut count = 0;
        for func in self.functions() {
            writeln!(out, "({} 0x{:x} 0x{:x})", func.name, func.address, func.end())?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, address: u64, size: u64) -> Symbol {
        Symbol {
            name: name.to_string(),
            address,
            size,
            kind: SymbolType::Function,
        }
    }

    #[test]
    fn writes_functions_in_address_order() {
        let mut table = SymbolTable::new();
        table.insert(func("main", 0x401130, 0x2c));
        table.insert(func("_start", 0x401020, 0x26));
        table.insert(Symbol {
            name: "counter".to_string(),
            address: 0x404028,
            size: 4,
            kind: SymbolType::Data,
        });

        let mut out = Vec::new();
        let written = table.write_bap_symbols(&mut out).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "(_start 0x401020 0x401046)\n(main 0x401130 0x40115c)\n"
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn rejects_files_that_are_not_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just text").unwrap();

        assert!(SymbolTable::from_object_file(&path).is_err());
        assert!(SymbolTable::from_object_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn reads_functions_from_the_test_binary() {
        let exe = std::env::current_exe().unwrap();
        let table = SymbolTable::from_object_file(&exe).unwrap();
        assert!(!table.is_empty());
        assert!(table.functions().all(|f| f.end() > f.address));
    }
}
