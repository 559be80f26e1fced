//! ROM symbol table: label addresses and named sections.
//!
//! A symbol table is the ROM-side counterpart of the labels in an assembly
//! project. Most entries are plain addresses, a few are constants (asset sizes
//! share the same namespace, as they do in an assembler listing), and sections
//! describe byte ranges reserved for groups of relocatable assets.
//!
//! Symbol tables are usually read from TOML:
//!
//! ```toml
//! [addresses]
//! SysFont = 0x0000F4A2
//! SysFontSize = 0x800
//!
//! [sections]
//! RegionCheckData = { begin = 0x0000F600, end = 0x00010000 }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::fs::{MAX_CONFIG_BYTES, read_file_with_limit};

/// A named byte range `[begin, end)` in the ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section {
    pub begin: u32,
    pub end: u32,
}

impl Section {
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    /// Capacity of the section in bytes (zero if the bounds are inverted).
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.begin && address < self.end
    }
}

/// Label → address and label → section lookups for one ROM revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    pub addresses: HashMap<String, u32>,
    pub sections: HashMap<String, Section>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a symbol table from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse symbol table")
    }

    /// Load a symbol table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_file_with_limit(path, MAX_CONFIG_BYTES)
            .with_context(|| format!("Failed to read symbol table: {}", path.display()))?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("Symbol table is not UTF-8: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid symbol table: {}", path.display()))
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize symbol table")
    }

    pub fn address(&self, label: &str) -> Option<u32> {
        self.addresses.get(label).copied()
    }

    pub fn section(&self, label: &str) -> Option<Section> {
        self.sections.get(label).copied()
    }

    pub fn insert_address(&mut self, label: impl Into<String>, address: u32) -> &mut Self {
        self.addresses.insert(label.into(), address);
        self
    }

    pub fn insert_section(&mut self, label: impl Into<String>, begin: u32, end: u32) -> &mut Self {
        self.sections.insert(label.into(), Section::new(begin, end));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let table = SymbolTable::from_toml_str(
            r#"
            [addresses]
            SysFont = 0x1000
            SysFontSize = 2048

            [sections]
            RegionCheckData = { begin = 0x2000, end = 0x2800 }
            "#,
        )
        .unwrap();

        assert_eq!(table.address("SysFont"), Some(0x1000));
        assert_eq!(table.address("SysFontSize"), Some(0x800));
        assert_eq!(table.section("RegionCheckData"), Some(Section::new(0x2000, 0x2800)));
        assert_eq!(table.address("Missing"), None);
    }

    #[test]
    fn test_missing_tables_default_to_empty() {
        let table = SymbolTable::from_toml_str("[addresses]\nA = 1\n").unwrap();
        assert!(table.sections.is_empty());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut table = SymbolTable::new();
        table
            .insert_address("InvFont", 0x1234)
            .insert_section("InvGraphicsSection", 0x4000, 0x4800);

        let text = table.to_toml_string().unwrap();
        assert_eq!(SymbolTable::from_toml_str(&text).unwrap(), table);
    }

    #[test]
    fn test_section_bounds() {
        let section = Section::new(0x1000, 0x1800);
        assert_eq!(section.len(), 0x800);
        assert!(section.contains(0x1000));
        assert!(section.contains(0x17FF));
        assert!(!section.contains(0x1800));
        assert!(Section::new(0x10, 0x8).is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let err = SymbolTable::from_toml_str("[addresses]\nA = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse symbol table"));
    }
}
