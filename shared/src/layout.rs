//! Game layout configuration.
//!
//! Describes which assets exist, which labels bind them, what structure their
//! bytes have and which section each group is relocated into. The defaults
//! match the retail Landstalker disassembly; table sizes and asset lists can be
//! overridden from TOML for other revisions:
//!
//! ```toml
//! [rooms]
//! room_count = 816
//!
//! [[graphics.inventory.assets]]
//! label = "InvFont"
//! file = "assets_packed/graphics/fonts/menufont.bin"
//! category = "font"
//! size_label = "InvFontSize"
//! bpp = 1
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fs::{MAX_CONFIG_BYTES, read_file_with_limit};
use crate::labels::{graphics, rooms, strings};

// ============================================================================
// Shared enums
// ============================================================================

/// 68000 address register used as the destination of a `LEA` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressRegister {
    #[default]
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
}

impl AddressRegister {
    pub const ALL: [AddressRegister; 8] = [
        AddressRegister::A0,
        AddressRegister::A1,
        AddressRegister::A2,
        AddressRegister::A3,
        AddressRegister::A4,
        AddressRegister::A5,
        AddressRegister::A6,
        AddressRegister::A7,
    ];

    /// Register number (0-7) as encoded in instruction words.
    pub const fn index(self) -> u16 {
        self as u16
    }

    pub fn from_index(index: u16) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// How tiles are grouped into larger blocks when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLayout {
    #[default]
    None,
    Block2x2,
    Block4x4,
}

/// Palette byte format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteType {
    /// Partial palette holding the eight low-brightness colours.
    Low8,
    /// All sixteen colours.
    Full,
}

impl PaletteType {
    pub const fn colour_count(self) -> usize {
        match self {
            PaletteType::Low8 => 8,
            PaletteType::Full => 16,
        }
    }

    /// Encoded size: one big-endian word per colour.
    pub const fn size_bytes(self) -> usize {
        self.colour_count() * 2
    }
}

/// Which collection an inventory asset is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Font,
    Misc,
    Palette,
}

// ============================================================================
// Layout
// ============================================================================

/// Complete layout for one game revision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLayout {
    pub graphics: GraphicsLayout,
    pub rooms: RoomLayout,
}

impl GameLayout {
    /// Parse a layout from TOML text. Missing sections keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse game layout")
    }

    /// Load a layout from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_file_with_limit(path, MAX_CONFIG_BYTES)
            .with_context(|| format!("Failed to read game layout: {}", path.display()))?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("Game layout is not UTF-8: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid game layout: {}", path.display()))
    }
}

/// Graphics assets owned by the graphics manager.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsLayout {
    pub region_check: RegionCheckLayout,
    pub system_font: FontLayout,
    pub inventory: InventoryLayout,
}

/// The region check source file, its strings and the data section they share
/// with the system font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionCheckLayout {
    pub label: String,
    pub file: String,
    pub routine_label: String,
    pub routine_file: String,
    pub strings_label: String,
    pub strings_file: String,
    pub data_section: String,
    /// One label per system string, in table order.
    pub string_labels: Vec<String>,
    pub register: AddressRegister,
}

impl Default for RegionCheckLayout {
    fn default() -> Self {
        Self {
            label: strings::REGION_CHECK.to_string(),
            file: strings::REGION_CHECK_FILE.to_string(),
            routine_label: strings::REGION_CHECK_ROUTINE.to_string(),
            routine_file: strings::REGION_CHECK_ROUTINE_FILE.to_string(),
            strings_label: strings::REGION_CHECK_STRINGS.to_string(),
            strings_file: strings::REGION_CHECK_STRINGS_FILE.to_string(),
            data_section: strings::REGION_CHECK_DATA_SECTION.to_string(),
            string_labels: vec![
                strings::REGION_ERROR_LINE1.to_string(),
                strings::REGION_ERROR_NTSC.to_string(),
                strings::REGION_ERROR_PAL.to_string(),
                strings::REGION_ERROR_LINE3.to_string(),
            ],
            register: AddressRegister::A0,
        }
    }
}

/// The system font, stored right after the region check strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontLayout {
    pub label: String,
    pub size_label: String,
    pub file: String,
    pub tile_width: u8,
    pub tile_height: u8,
    pub bpp: u8,
    pub register: AddressRegister,
}

impl Default for FontLayout {
    fn default() -> Self {
        Self {
            label: graphics::SYS_FONT.to_string(),
            size_label: graphics::SYS_FONT_SIZE.to_string(),
            file: graphics::SYS_FONT_FILE.to_string(),
            tile_width: 8,
            tile_height: 8,
            bpp: 4,
            register: AddressRegister::A0,
        }
    }
}

/// Inventory graphics: one include file listing every asset, one section
/// they are packed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryLayout {
    pub section: String,
    pub file: String,
    /// Assets in file and section order.
    pub assets: Vec<InventoryAsset>,
}

impl Default for InventoryLayout {
    fn default() -> Self {
        use AddressRegister::{A0, A1};

        let tiles = |label: &str, size_label: &str, file: &str, category, bpp, height, block| {
            InventoryAsset {
                label: label.to_string(),
                file: file.to_string(),
                category,
                size_label: Some(size_label.to_string()),
                tile_width: 8,
                tile_height: height,
                bpp,
                block_layout: block,
                palette: None,
                register: A1,
                extra_refs: Vec::new(),
            }
        };
        let palette = |label: &str, file: &str, palette_type| InventoryAsset {
            label: label.to_string(),
            file: file.to_string(),
            category: AssetCategory::Palette,
            size_label: None,
            tile_width: 8,
            tile_height: 8,
            bpp: 4,
            block_layout: BlockLayout::None,
            palette: Some(palette_type),
            register: A0,
            extra_refs: Vec::new(),
        };

        let mut unused1 = tiles(
            graphics::INV_UNUSED1,
            graphics::INV_UNUSED1_SIZE,
            graphics::INV_UNUSED1_FILE,
            AssetCategory::Misc,
            2,
            11,
            BlockLayout::None,
        );
        unused1.extra_refs.push(OffsetReference {
            label: graphics::INV_UNUSED1_PLUS6.to_string(),
            offset: 12,
        });
        let mut unused2 = tiles(
            graphics::INV_UNUSED2,
            graphics::INV_UNUSED2_SIZE,
            graphics::INV_UNUSED2_FILE,
            AssetCategory::Misc,
            2,
            10,
            BlockLayout::None,
        );
        unused2.extra_refs.push(OffsetReference {
            label: graphics::INV_UNUSED2_PLUS4.to_string(),
            offset: 8,
        });

        Self {
            section: graphics::INV_SECTION.to_string(),
            file: graphics::INV_GRAPHICS_FILE.to_string(),
            assets: vec![
                tiles(
                    graphics::INV_FONT,
                    graphics::INV_FONT_SIZE,
                    graphics::INV_FONT_FILE,
                    AssetCategory::Font,
                    1,
                    8,
                    BlockLayout::None,
                ),
                tiles(
                    graphics::INV_CURSOR,
                    graphics::INV_CURSOR_SIZE,
                    graphics::INV_CURSOR_FILE,
                    AssetCategory::Misc,
                    2,
                    8,
                    BlockLayout::Block4x4,
                ),
                tiles(
                    graphics::INV_ARROW,
                    graphics::INV_ARROW_SIZE,
                    graphics::INV_ARROW_FILE,
                    AssetCategory::Misc,
                    2,
                    8,
                    BlockLayout::Block2x2,
                ),
                unused1,
                unused2,
                palette(graphics::INV_PAL1, graphics::INV_PAL1_FILE, PaletteType::Low8),
                palette(graphics::INV_PAL2, graphics::INV_PAL2_FILE, PaletteType::Full),
            ],
        }
    }
}

/// One asset in the inventory graphics file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAsset {
    /// Label of the asset (and of the `LEA` that loads it).
    pub label: String,
    pub file: String,
    pub category: AssetCategory,
    /// Symbol holding the byte size; palettes derive it from their type.
    #[serde(default)]
    pub size_label: Option<String>,
    #[serde(default = "default_tile_size")]
    pub tile_width: u8,
    #[serde(default = "default_tile_size")]
    pub tile_height: u8,
    #[serde(default = "default_bpp")]
    pub bpp: u8,
    #[serde(default)]
    pub block_layout: BlockLayout,
    #[serde(default)]
    pub palette: Option<PaletteType>,
    #[serde(default)]
    pub register: AddressRegister,
    /// Additional `LEA`s pointing into the middle of the asset.
    #[serde(default)]
    pub extra_refs: Vec<OffsetReference>,
}

/// A `LEA` at `label` that points `offset` bytes past the start of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetReference {
    pub label: String,
    pub offset: u32,
}

fn default_tile_size() -> u8 {
    8
}

fn default_bpp() -> u8 {
    4
}

/// A relocatable table referenced by a single `LEA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReference {
    pub label: String,
    pub file: String,
    #[serde(default)]
    pub register: AddressRegister,
}

impl TableReference {
    fn new(label: &str, file: &str, register: AddressRegister) -> Self {
        Self {
            label: label.to_string(),
            file: file.to_string(),
            register,
        }
    }
}

/// Room table, tilemaps and per-room tables owned by the room manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomLayout {
    pub room_count: usize,

    /// Project label of the room parameter include.
    pub room_table: String,
    /// ROM label of the long holding the room parameter table address.
    pub room_table_ptr: String,
    pub room_table_file: String,

    /// ROM: absolute map pointer per room. Project: map index per room.
    pub map_table: String,
    pub map_table_file: String,

    pub tilemap_section: String,
    /// ROM label marking the end of the last tilemap.
    pub tilemaps_end: String,
    pub tilemap_list_file: String,
    pub tilemap_dir: String,

    /// Section the per-room tables are packed into, in field order below.
    pub extra_section: String,
    pub door_offsets: TableReference,
    pub doors: TableReference,
    pub tile_swap_offsets: TableReference,
    pub tile_swaps: TableReference,
    pub fall_destinations: TableReference,
    pub climb_destinations: TableReference,
}

impl Default for RoomLayout {
    fn default() -> Self {
        use AddressRegister::{A0, A1};

        Self {
            room_count: rooms::ROOM_COUNT,
            room_table: rooms::ROOM_TABLE.to_string(),
            room_table_ptr: rooms::ROOM_DATA_PTR.to_string(),
            room_table_file: rooms::ROOM_TABLE_FILE.to_string(),
            map_table: rooms::ROOM_MAP_TABLE.to_string(),
            map_table_file: rooms::ROOM_MAP_TABLE_FILE.to_string(),
            tilemap_section: rooms::TILEMAP_SECTION.to_string(),
            tilemaps_end: rooms::TILEMAPS_END.to_string(),
            tilemap_list_file: rooms::TILEMAP_LIST_FILE.to_string(),
            tilemap_dir: rooms::TILEMAP_DIR.to_string(),
            extra_section: rooms::ROOM_EXTRA_SECTION.to_string(),
            door_offsets: TableReference::new(rooms::DOOR_OFFSETS, rooms::DOOR_OFFSETS_FILE, A0),
            doors: TableReference::new(rooms::DOORS, rooms::DOORS_FILE, A1),
            tile_swap_offsets: TableReference::new(
                rooms::TILE_SWAP_OFFSETS,
                rooms::TILE_SWAP_OFFSETS_FILE,
                A0,
            ),
            tile_swaps: TableReference::new(rooms::TILE_SWAPS, rooms::TILE_SWAPS_FILE, A1),
            fall_destinations: TableReference::new(
                rooms::FALL_DESTINATIONS,
                rooms::FALL_DESTINATIONS_FILE,
                A0,
            ),
            climb_destinations: TableReference::new(
                rooms::CLIMB_DESTINATIONS,
                rooms::CLIMB_DESTINATIONS_FILE,
                A0,
            ),
        }
    }
}

impl RoomLayout {
    /// Per-room tables in the order they are packed into the extra section.
    pub fn extra_tables(&self) -> [&TableReference; 6] {
        [
            &self.door_offsets,
            &self.doors,
            &self.tile_swap_offsets,
            &self.tile_swaps,
            &self.fall_destinations,
            &self.climb_destinations,
        ]
    }
}
