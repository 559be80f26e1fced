//! Named binary assets and the store that indexes them.
//!
//! Every asset is a byte buffer plus enough structure to validate edits. The
//! buffer is snapshotted at load and at each commit; an asset counts as
//! modified when its bytes or its name differ from that snapshot.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use hashbrown::HashMap;
use landstalker_shared::fs::write_file_atomic;
use landstalker_shared::paths::is_safe_relative_path;
use landstalker_shared::{BlockLayout, PaletteType};

use crate::error::{DataError, Result};
use crate::palette;

// ============================================================================
// Asset kinds
// ============================================================================

/// Tile geometry of a tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilesetFormat {
    pub tile_width: u8,
    pub tile_height: u8,
    pub bpp: u8,
    pub block_layout: BlockLayout,
    /// Compressed tilesets are opaque and never size-checked
    pub compressed: bool,
}

impl TilesetFormat {
    pub fn new(tile_width: u8, tile_height: u8, bpp: u8) -> Self {
        Self {
            tile_width,
            tile_height,
            bpp,
            block_layout: BlockLayout::None,
            compressed: false,
        }
    }

    pub fn with_blocks(mut self, block_layout: BlockLayout) -> Self {
        self.block_layout = block_layout;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    /// Bytes per uncompressed tile.
    pub fn tile_bytes(&self) -> usize {
        usize::from(self.tile_width) * usize::from(self.tile_height) * usize::from(self.bpp) / 8
    }
}

impl Default for TilesetFormat {
    fn default() -> Self {
        Self::new(8, 8, 4)
    }
}

/// What an asset's bytes represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Tileset(TilesetFormat),
    Palette(PaletteType),
    /// Compressed room map
    Tilemap,
}

impl AssetKind {
    fn validate(&self, name: &str, bytes: &[u8]) -> Result<()> {
        match self {
            AssetKind::Tileset(format) if !format.compressed => {
                let tile = format.tile_bytes();
                if tile == 0 || bytes.len() % tile != 0 {
                    return Err(DataError::size_mismatch(
                        name,
                        format!("a multiple of {tile} bytes"),
                        bytes.len(),
                    ));
                }
            }
            AssetKind::Palette(kind) => {
                if bytes.len() != kind.size_bytes() {
                    return Err(DataError::size_mismatch(
                        name,
                        format!("{} bytes", kind.size_bytes()),
                        bytes.len(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

// ============================================================================
// Asset entry
// ============================================================================

/// One named asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    name: String,
    committed_name: String,
    symbol: String,
    bytes: Vec<u8>,
    snapshot: Vec<u8>,
    path: String,
    start_address: Option<u32>,
    kind: AssetKind,
}

impl AssetEntry {
    fn create(name: &str, bytes: Vec<u8>, path: &str, kind: AssetKind) -> Result<Self> {
        kind.validate(name, &bytes)?;
        Ok(Self {
            name: name.to_string(),
            committed_name: name.to_string(),
            symbol: name.to_string(),
            snapshot: bytes.clone(),
            bytes,
            path: path.to_string(),
            start_address: None,
            kind,
        })
    }

    /// Tileset asset. Uncompressed data must be a whole number of tiles.
    pub fn tileset(name: &str, bytes: Vec<u8>, path: &str, format: TilesetFormat) -> Result<Self> {
        Self::create(name, bytes, path, AssetKind::Tileset(format))
    }

    /// Palette asset. Data must be exactly the palette type's size.
    pub fn palette(name: &str, bytes: Vec<u8>, path: &str, kind: PaletteType) -> Result<Self> {
        Self::create(name, bytes, path, AssetKind::Palette(kind))
    }

    /// Compressed tilemap, stored as an opaque blob.
    pub fn tilemap(name: &str, bytes: Vec<u8>, path: &str) -> Result<Self> {
        Self::create(name, bytes, path, AssetKind::Tilemap)
    }

    /// Bind the asset to a label other than its name.
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    pub fn with_start_address(mut self, address: u32) -> Self {
        self.start_address = Some(address);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Address the asset was read from, for assets extracted from a ROM.
    pub fn start_address(&self) -> Option<u32> {
        self.start_address
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Replace the asset's bytes after validating them against its kind.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.kind.validate(&self.name, &bytes)?;
        self.bytes = bytes;
        Ok(())
    }

    /// True if the bytes or the name differ from the last load or commit.
    pub fn has_data_changed(&self) -> bool {
        self.bytes != self.snapshot || self.name != self.committed_name
    }

    pub fn commit(&mut self) {
        if self.has_data_changed() {
            self.snapshot = self.bytes.clone();
            self.committed_name = self.name.clone();
        }
    }

    /// Bytes as they would be written to disk.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        match self.kind {
            AssetKind::Palette(kind) => palette::normalise(&self.bytes, kind),
            _ => Ok(self.bytes.clone()),
        }
    }

    /// Write the asset to `dir/path`, creating missing directories.
    pub fn save(&self, dir: &Path) -> Result<()> {
        if !is_safe_relative_path(&self.path) {
            return Err(DataError::io(
                &self.path,
                io::Error::new(io::ErrorKind::InvalidInput, "path escapes the project directory"),
            ));
        }
        let target = dir.join(&self.path);
        write_file_atomic(&target, &self.encoded()?).map_err(|e| DataError::io(&target, e))
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

// ============================================================================
// Asset store
// ============================================================================

/// Handle to an asset in an [`AssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(usize);

/// Arena of assets with independent name and symbol indices.
///
/// Names are user-facing and may change; symbols are fixed at load and bind
/// an asset to the code that references it.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    entries: Vec<AssetEntry>,
    by_name: BTreeMap<String, AssetId>,
    by_symbol: HashMap<String, AssetId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset. Names and symbols must both be unique.
    pub fn insert(&mut self, entry: AssetEntry) -> Result<AssetId> {
        if self.by_name.contains_key(entry.name()) {
            return Err(DataError::DuplicateName(entry.name().to_string()));
        }
        if self.by_symbol.contains_key(entry.symbol()) {
            return Err(DataError::DuplicateName(entry.symbol().to_string()));
        }
        let id = AssetId(self.entries.len());
        self.by_name.insert(entry.name().to_string(), id);
        self.by_symbol.insert(entry.symbol().to_string(), id);
        self.entries.push(entry);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: AssetId) -> &AssetEntry {
        &self.entries[id.0]
    }

    pub fn get_mut(&mut self, id: AssetId) -> &mut AssetEntry {
        &mut self.entries[id.0]
    }

    pub fn id_by_name(&self, name: &str) -> Option<AssetId> {
        self.by_name.get(name).copied()
    }

    pub fn id_by_symbol(&self, symbol: &str) -> Option<AssetId> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&AssetEntry> {
        self.id_by_name(name).map(|id| self.get(id))
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&AssetEntry> {
        self.id_by_symbol(symbol).map(|id| self.get(id))
    }

    /// Asset bound to `symbol`, or `MissingAsset`.
    pub fn require_symbol(&self, symbol: &str) -> Result<&AssetEntry> {
        self.by_symbol(symbol)
            .ok_or_else(|| DataError::MissingAsset(symbol.to_string()))
    }

    /// Rename an asset. Only the name index changes.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let id = self
            .id_by_name(old)
            .ok_or_else(|| DataError::MissingAsset(old.to_string()))?;
        if self.by_name.contains_key(new) {
            return Err(DataError::DuplicateName(new.to_string()));
        }
        self.by_name.remove(old);
        self.by_name.insert(new.to_string(), id);
        self.entries[id.0].set_name(new.to_string());
        Ok(())
    }

    /// Assets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetEntry> {
        self.entries.iter()
    }

    /// Assets ordered by name.
    pub fn iter_by_name(&self) -> impl Iterator<Item = &AssetEntry> {
        self.by_name.values().map(|&id| self.get(id))
    }

    pub fn has_been_modified(&self) -> bool {
        self.entries.iter().any(AssetEntry::has_data_changed)
    }

    pub fn commit_all(&mut self) {
        self.entries.iter_mut().for_each(AssetEntry::commit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(name: &str, tiles: usize) -> AssetEntry {
        AssetEntry::tileset(name, vec![0; tiles * 32], "gfx/font.bin", TilesetFormat::default()).unwrap()
    }

    #[test]
    fn test_tileset_size_validation() {
        let format = TilesetFormat::new(8, 8, 2);
        assert_eq!(format.tile_bytes(), 16);
        assert!(AssetEntry::tileset("A", vec![0; 48], "a.bin", format).is_ok());
        assert!(matches!(
            AssetEntry::tileset("A", vec![0; 47], "a.bin", format),
            Err(DataError::SizeMismatch { actual: 47, .. })
        ));
        // Compressed data is opaque
        assert!(AssetEntry::tileset("A", vec![0; 47], "a.bin", format.compressed()).is_ok());
        // 8x11 tiles at 2bpp are 22 bytes
        let odd = TilesetFormat::new(8, 11, 2);
        assert!(AssetEntry::tileset("A", vec![0; 44], "a.bin", odd).is_ok());
    }

    #[test]
    fn test_palette_size_validation() {
        assert!(AssetEntry::palette("P", vec![0; 16], "p.pal", PaletteType::Low8).is_ok());
        assert!(AssetEntry::palette("P", vec![0; 16], "p.pal", PaletteType::Full).is_err());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut entry = font("Font", 2);
        assert!(!entry.has_data_changed());

        let mut edited = entry.bytes().to_vec();
        edited[0] = 1;
        entry.set_bytes(edited).unwrap();
        assert!(entry.has_data_changed());

        // Restoring the original bytes clears the flag
        entry.set_bytes(vec![0; 64]).unwrap();
        assert!(!entry.has_data_changed());

        entry.set_bytes(vec![0; 96]).unwrap();
        entry.commit();
        assert!(!entry.has_data_changed());
    }

    #[test]
    fn test_set_bytes_revalidates() {
        let mut entry = font("Font", 1);
        assert!(entry.set_bytes(vec![0; 33]).is_err());
        assert_eq!(entry.len(), 32);
    }

    #[test]
    fn test_store_indices() {
        let mut store = AssetStore::new();
        let a = store.insert(font("Beta", 1)).unwrap();
        let b = store.insert(font("Alpha", 1).with_symbol("AlphaSym")).unwrap();

        assert_eq!(store.id_by_name("Beta"), Some(a));
        assert_eq!(store.id_by_symbol("AlphaSym"), Some(b));
        assert!(store.by_symbol("Alpha").is_none());

        let by_name: Vec<_> = store.iter_by_name().map(AssetEntry::name).collect();
        assert_eq!(by_name, ["Alpha", "Beta"]);
        let inserted: Vec<_> = store.iter().map(AssetEntry::name).collect();
        assert_eq!(inserted, ["Beta", "Alpha"]);
    }

    #[test]
    fn test_store_rejects_duplicates() {
        let mut store = AssetStore::new();
        store.insert(font("Font", 1)).unwrap();
        assert!(matches!(store.insert(font("Font", 1)), Err(DataError::DuplicateName(_))));
        assert!(matches!(
            store.insert(font("Other", 1).with_symbol("Font")),
            Err(DataError::DuplicateName(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rename_marks_modified() {
        let mut store = AssetStore::new();
        store.insert(font("Font", 1)).unwrap();
        store.insert(font("Other", 1)).unwrap();

        store.rename("Font", "MenuFont").unwrap();
        assert!(store.has_been_modified());
        assert!(store.by_name("Font").is_none());
        assert_eq!(store.by_symbol("Font").unwrap().name(), "MenuFont");

        assert!(matches!(store.rename("MenuFont", "Other"), Err(DataError::DuplicateName(_))));
        assert!(matches!(store.rename("Missing", "X"), Err(DataError::MissingAsset(_))));

        store.commit_all();
        assert!(!store.has_been_modified());

        // Renaming back is a change relative to the committed name
        store.rename("MenuFont", "Font").unwrap();
        assert!(store.has_been_modified());
    }

    #[test]
    fn test_save_writes_under_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut bytes = vec![0u8; 32];
        bytes[0] = 0xFF;
        let pal = AssetEntry::palette("Pal", bytes, "nested/pal.pal", PaletteType::Full).unwrap();
        pal.save(dir.path()).unwrap();

        let written = std::fs::read(dir.path().join("nested/pal.pal")).unwrap();
        assert_eq!(written.len(), 32);
        // Re-encoded through the palette codec
        assert_eq!(written[0], 0x0E);

        let escaping = AssetEntry::tilemap("Map", vec![1], "../escape.cmp").unwrap();
        assert!(matches!(escaping.save(dir.path()), Err(DataError::Io { .. })));
    }
}
