//! Graphics data manager
//!
//! Owns the system font, the region check strings stored alongside it, and
//! the inventory graphics (fonts, miscellaneous tilesets and palettes). The
//! inventory asset list comes from [`InventoryLayout`]; every asset is bound
//! to the label of the `LEA` that loads it.
//!
//! # Project files
//!
//! ```text
//! <root>.asm
//!   RegionCheck:        include "code/system/regioncheck.asm"
//!   InvGraphicsSection: include "code/graphics/inventorygraphics.asm"
//! regioncheck.asm
//!   RegionCheckRoutine: include ...
//!   RegionCheckStrings: include ...   (one dc.b string per label)
//!   SysFont:            incbin ...
//! inventorygraphics.asm
//!   <label>:            incbin ...    (one per inventory asset)
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use landstalker_shared::{AssetCategory, GraphicsLayout, InventoryAsset, InventoryLayout, PaletteType};

use crate::asm::{AsmFile, FileType};
use crate::entry::{AssetEntry, AssetId, AssetKind, AssetStore, TilesetFormat};
use crate::error::{DataError, Result};
use crate::manager::{DataManager, ManagerCore, Source};
use crate::pending::{PendingWrite, PendingWrites, SectionWriter};
use crate::project;
use crate::rom::{Rom, decode_string, encode_string};

#[cfg(test)]
mod tests;

/// Palette choices offered for a tileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteAssociations {
    /// Every palette, by name
    pub all: Vec<String>,
    pub recommended: Vec<String>,
    pub default: Option<String>,
}

/// Project-relative paths of the source files this manager writes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GraphicsFiles {
    region_check: String,
    routine: String,
    strings: String,
    inventory: String,
}

impl GraphicsFiles {
    fn from_layout(layout: &GraphicsLayout) -> Self {
        Self {
            region_check: layout.region_check.file.clone(),
            routine: layout.region_check.routine_file.clone(),
            strings: layout.region_check.strings_file.clone(),
            inventory: layout.inventory.file.clone(),
        }
    }
}

/// Fonts, inventory graphics and system strings.
#[derive(Debug, Clone)]
pub struct GraphicsData {
    core: ManagerCore,
    layout: GraphicsLayout,
    files: GraphicsFiles,
    assets: AssetStore,
    system_font: AssetId,
    /// Parallel to `layout.inventory.assets`
    inventory: Vec<AssetId>,
    strings: Vec<String>,
    committed_strings: Vec<String>,
}

/// Everything a load path produces.
struct Loaded {
    files: GraphicsFiles,
    system_font: AssetEntry,
    strings: Vec<String>,
    inventory: Vec<AssetEntry>,
}

impl GraphicsData {
    /// Load graphics from a project or a ROM.
    pub fn load(source: Source<'_>, layout: &GraphicsLayout) -> Result<Self> {
        let mut core = ManagerCore::new();
        let loaded = core.load("graphics", source, |source| match source {
            Source::Project(root) => load_from_project(root, layout),
            Source::Rom(rom) => load_from_rom(rom, layout),
        })?;

        let mut assets = AssetStore::new();
        let system_font = assets.insert(loaded.system_font)?;
        let inventory = loaded
            .inventory
            .into_iter()
            .map(|entry| assets.insert(entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            core,
            layout: layout.clone(),
            files: loaded.files,
            assets,
            system_font,
            inventory,
            committed_strings: loaded.strings.clone(),
            strings: loaded.strings,
        })
    }

    pub fn layout(&self) -> &GraphicsLayout {
        &self.layout
    }

    /// Every asset, in load order.
    pub fn assets(&self) -> impl Iterator<Item = &AssetEntry> {
        self.assets.iter()
    }

    pub fn system_font(&self) -> &AssetEntry {
        self.assets.get(self.system_font)
    }

    /// Fonts, ordered by name.
    pub fn fonts(&self) -> Vec<&AssetEntry> {
        let mut ids = vec![self.system_font];
        ids.extend(self.inventory_ids(AssetCategory::Font));
        self.sorted_by_name(ids)
    }

    /// Miscellaneous tilesets, ordered by name.
    pub fn misc_graphics(&self) -> Vec<&AssetEntry> {
        self.sorted_by_name(self.inventory_ids(AssetCategory::Misc).collect())
    }

    /// Palettes, ordered by name.
    pub fn palettes(&self) -> Vec<&AssetEntry> {
        self.sorted_by_name(self.inventory_ids(AssetCategory::Palette).collect())
    }

    /// Fonts and miscellaneous tilesets keyed by name.
    pub fn all_tilesets(&self) -> BTreeMap<String, &AssetEntry> {
        self.fonts()
            .into_iter()
            .chain(self.misc_graphics())
            .map(|e| (e.name().to_string(), e))
            .collect()
    }

    /// Palettes keyed by name.
    pub fn all_palettes(&self) -> BTreeMap<String, &AssetEntry> {
        self.palettes()
            .into_iter()
            .map(|e| (e.name().to_string(), e))
            .collect()
    }

    pub fn entry(&self, name: &str) -> Option<&AssetEntry> {
        self.assets.by_name(name)
    }

    pub fn entry_by_symbol(&self, symbol: &str) -> Option<&AssetEntry> {
        self.assets.by_symbol(symbol)
    }

    /// Replace the bytes of the asset called `name`.
    pub fn set_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let id = self
            .assets
            .id_by_name(name)
            .ok_or_else(|| DataError::MissingAsset(name.to_string()))?;
        self.assets.get_mut(id).set_bytes(bytes)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        self.assets.rename(old, new)
    }

    pub fn system_strings(&self) -> &[String] {
        &self.strings
    }

    pub fn set_system_string(&mut self, index: usize, text: &str) -> Result<()> {
        let count = self.strings.len();
        let slot = self
            .strings
            .get_mut(index)
            .ok_or(DataError::InvalidIndex { index, count })?;
        encode_string(text)?;
        *slot = text.to_string();
        Ok(())
    }

    /// Palettes offered for the tileset called `name`. Every palette is
    /// recommended; the first one is the default.
    pub fn palette_associations(&self, name: &str) -> Result<PaletteAssociations> {
        let entry = self
            .assets
            .by_name(name)
            .filter(|e| matches!(e.kind(), AssetKind::Tileset(_)))
            .ok_or_else(|| DataError::MissingAsset(name.to_string()))?;

        let all: Vec<String> = self.palettes().iter().map(|p| p.name().to_string()).collect();
        let recommended = all.clone();
        let default = recommended.first().or_else(|| all.first()).cloned();
        tracing::trace!(tileset = entry.name(), palettes = all.len(), "Computed palette associations");
        Ok(PaletteAssociations {
            all,
            recommended,
            default,
        })
    }

    /// Append this manager's includes to a project root file.
    pub fn write_root_includes(&self, root: &mut AsmFile) {
        root.label(&self.layout.region_check.label)
            .include(&self.files.region_check, FileType::Assembler)
            .label(&self.layout.inventory.section)
            .include(&self.files.inventory, FileType::Assembler);
    }

    fn inventory_ids(&self, category: AssetCategory) -> impl Iterator<Item = AssetId> + '_ {
        self.layout
            .inventory
            .assets
            .iter()
            .zip(&self.inventory)
            .filter(move |(asset, _)| asset.category == category)
            .map(|(_, &id)| id)
    }

    fn sorted_by_name(&self, ids: Vec<AssetId>) -> Vec<&AssetEntry> {
        let mut entries: Vec<_> = ids.into_iter().map(|id| self.assets.get(id)).collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }

    // ========================================================================
    // Project output
    // ========================================================================

    fn write_region_check(&self, dir: &Path) -> Result<()> {
        let rc = &self.layout.region_check;
        let font = self.system_font();

        let mut file = AsmFile::new();
        file.write_file_header(&self.files.region_check, "Region Check")
            .label(&rc.routine_label)
            .include(&self.files.routine, FileType::Assembler)
            .label(&rc.strings_label)
            .include(&self.files.strings, FileType::Assembler)
            .align(2)
            .label(font.symbol())
            .include(font.path(), FileType::Binary);
        file.write_file(&dir.join(&self.files.region_check))?;

        let mut strings = AsmFile::new();
        strings.write_file_header(&self.files.strings, "Region Check System Strings");
        for (label, text) in rc.string_labels.iter().zip(&self.strings) {
            let mut bytes = encode_string(text)?;
            bytes.push(0);
            strings.label(label).data(&bytes);
        }
        strings.write_file(&dir.join(&self.files.strings))
    }

    fn write_inventory(&self, dir: &Path) -> Result<()> {
        let mut file = AsmFile::new();
        file.write_file_header(&self.files.inventory, "Inventory Graphics Data");
        for &id in &self.inventory {
            let entry = self.assets.get(id);
            file.label(entry.symbol()).include(entry.path(), FileType::Binary);
        }
        file.write_file(&dir.join(&self.files.inventory))
    }

    // ========================================================================
    // ROM output
    // ========================================================================

    /// Strings followed by the system font in the region check data section.
    fn build_region_check_writes(&self, rom: &Rom, writes: &mut PendingWrites) -> Result<()> {
        let rc = &self.layout.region_check;
        let font_layout = &self.layout.system_font;
        let section = rom.get_section(&rc.data_section)?;

        let mut data = SectionWriter::new(section.begin);
        let mut string_addresses = Vec::with_capacity(self.strings.len());
        for text in &self.strings {
            let mut bytes = encode_string(text)?;
            bytes.push(0);
            string_addresses.push(data.push(&bytes));
        }
        data.align(2, 0xFF);
        let font_address = data.push(self.system_font().bytes());
        writes.push(PendingWrite::to_label(&rc.data_section, data.into_bytes()));

        for (label, &address) in rc.string_labels.iter().zip(&string_addresses) {
            writes.push(PendingWrite::lea(rom, label, rc.register, address)?);
        }
        writes.push(PendingWrite::lea(
            rom,
            &font_layout.label,
            font_layout.register,
            font_address,
        )?);
        Ok(())
    }

    /// Inventory assets packed back to back from the start of their section.
    fn build_inventory_writes(&self, rom: &Rom, writes: &mut PendingWrites) -> Result<()> {
        let inventory = &self.layout.inventory;
        if inventory.assets.is_empty() {
            return Ok(());
        }
        let section = rom.get_section(&inventory.section)?;

        let mut data = SectionWriter::new(section.begin);
        let mut leas = Vec::new();
        for (asset, &id) in inventory.assets.iter().zip(&self.inventory) {
            data.align(2, 0xFF);
            let address = data.push(self.assets.get(id).bytes());
            leas.push((asset.label.as_str(), asset.register, address));
            for extra in &asset.extra_refs {
                let target = address.checked_add(extra.offset).ok_or_else(|| {
                    DataError::CapacityOverflow {
                        target: extra.label.clone(),
                        needed: address as usize + extra.offset as usize,
                        available: u32::MAX as usize,
                    }
                })?;
                leas.push((extra.label.as_str(), asset.register, target));
            }
        }
        writes.push(PendingWrite::to_label(&inventory.section, data.into_bytes()));

        for (label, register, address) in leas {
            writes.push(PendingWrite::lea(rom, label, register, address)?);
        }
        Ok(())
    }
}

impl DataManager for GraphicsData {
    fn name(&self) -> &'static str {
        "graphics"
    }

    fn core(&self) -> &ManagerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ManagerCore {
        &mut self.core
    }

    fn write_project(&self, dir: &Path) -> Result<()> {
        self.write_region_check(dir)?;
        for entry in self.assets.iter() {
            entry.save(dir)?;
        }
        self.write_inventory(dir)
    }

    fn commit_model(&mut self) {
        self.assets.commit_all();
        self.committed_strings = self.strings.clone();
    }

    fn has_been_modified(&self) -> bool {
        self.assets.has_been_modified() || self.strings != self.committed_strings
    }

    fn build_pending_writes(&self, rom: &Rom) -> Result<PendingWrites> {
        let mut writes = Vec::new();
        self.build_region_check_writes(rom, &mut writes)?;
        self.build_inventory_writes(rom, &mut writes)?;
        Ok(writes)
    }
}

// ============================================================================
// Loading
// ============================================================================

fn system_font_format(layout: &GraphicsLayout) -> TilesetFormat {
    let font = &layout.system_font;
    TilesetFormat::new(font.tile_width, font.tile_height, font.bpp)
}

fn inventory_kind(asset: &InventoryAsset) -> AssetKind {
    match (asset.category, asset.palette) {
        (AssetCategory::Palette, kind) => AssetKind::Palette(kind.unwrap_or(PaletteType::Full)),
        (_, Some(kind)) => AssetKind::Palette(kind),
        (_, None) => AssetKind::Tileset(
            TilesetFormat::new(asset.tile_width, asset.tile_height, asset.bpp).with_blocks(asset.block_layout),
        ),
    }
}

fn create_entry(label: &str, bytes: Vec<u8>, path: &str, kind: AssetKind) -> Result<AssetEntry> {
    match kind {
        AssetKind::Tileset(format) => AssetEntry::tileset(label, bytes, path, format),
        AssetKind::Palette(palette) => AssetEntry::palette(label, bytes, path, palette),
        AssetKind::Tilemap => AssetEntry::tilemap(label, bytes, path),
    }
}

fn load_from_project(root: &Path, layout: &GraphicsLayout) -> Result<Loaded> {
    let base = root.parent().unwrap_or_else(|| Path::new("."));
    let rc = &layout.region_check;

    let mut root_file = AsmFile::load(root)?;
    let region_check = project::include_path(&mut root_file, &rc.label, FileType::Assembler)?;
    let inventory = project::include_path(&mut root_file, &layout.inventory.section, FileType::Assembler)?;

    let mut rc_file = project::load_asm(base, &region_check)?;
    let routine = project::include_path(&mut rc_file, &rc.routine_label, FileType::Assembler)?;
    let strings_file = project::include_path(&mut rc_file, &rc.strings_label, FileType::Assembler)?;
    let font_file = project::include_path(&mut rc_file, &layout.system_font.label, FileType::Binary)?;

    let system_font = AssetEntry::tileset(
        &layout.system_font.label,
        project::read_binary(base, &font_file)?,
        &font_file,
        system_font_format(layout),
    )?;

    let mut strings_asm = project::load_asm(base, &strings_file)?;
    let strings = rc
        .string_labels
        .iter()
        .map(|label| -> Result<String> {
            strings_asm.goto(label).map_err(|_| DataError::MissingAsset(label.clone()))?;
            Ok(decode_string(&strings_asm.read_cstring()?))
        })
        .collect::<Result<Vec<_>>>()?;

    let inventory_entries = load_inventory_from_project(base, &inventory, &layout.inventory)?;

    Ok(Loaded {
        files: GraphicsFiles {
            region_check,
            routine,
            strings: strings_file,
            inventory,
        },
        system_font,
        strings,
        inventory: inventory_entries,
    })
}

fn load_inventory_from_project(base: &Path, file: &str, layout: &InventoryLayout) -> Result<Vec<AssetEntry>> {
    let mut asm = project::load_asm(base, file)?;
    layout
        .assets
        .iter()
        .map(|asset| {
            let path = project::include_path(&mut asm, &asset.label, FileType::Binary)?;
            let bytes = project::read_binary(base, &path)?;
            create_entry(&asset.label, bytes, &path, inventory_kind(asset))
        })
        .collect()
}

fn load_from_rom(rom: &Rom, layout: &GraphicsLayout) -> Result<Loaded> {
    let font_layout = &layout.system_font;
    let font_address = rom.lea_target(&font_layout.label)?;
    let font_size = rom.get_address(&font_layout.size_label)?;
    let system_font = AssetEntry::tileset(
        &font_layout.label,
        rom.read_bytes(font_address, font_size as usize)?.to_vec(),
        &font_layout.file,
        system_font_format(layout),
    )?
    .with_start_address(font_address);
    tracing::debug!(asset = %font_layout.label, address = font_address, size = font_size, "Read system font");

    let strings = layout
        .region_check
        .string_labels
        .iter()
        .map(|label| rom.read_string(rom.lea_target(label)?))
        .collect::<Result<Vec<_>>>()?;

    let inventory = layout
        .inventory
        .assets
        .iter()
        .map(|asset| -> Result<AssetEntry> {
            let kind = inventory_kind(asset);
            let address = rom.lea_target(&asset.label)?;
            let size = match kind {
                AssetKind::Palette(palette) => palette.size_bytes(),
                _ => {
                    let size_label = asset
                        .size_label
                        .as_deref()
                        .ok_or_else(|| DataError::MissingAsset(format!("size of {}", asset.label)))?;
                    rom.get_address(size_label)? as usize
                }
            };
            let bytes = rom.read_bytes(address, size)?.to_vec();
            tracing::debug!(asset = %asset.label, address, size, "Read inventory asset");
            Ok(create_entry(&asset.label, bytes, &asset.file, kind)?.with_start_address(address))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Loaded {
        files: GraphicsFiles::from_layout(layout),
        system_font,
        strings,
        inventory,
    })
}
