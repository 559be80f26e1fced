//! Synthetic ROM images for unit and integration tests.
//!
//! [`fixture_rom`] lays out a small cartridge containing every label, section
//! and table the managers read: region check strings and the system font,
//! the inventory graphics, and the room tables for [`ROOM_COUNT`] rooms.
//! Only `std` and `landstalker_shared` are used so integration tests can pull
//! this file in with `#[path]`.

#![allow(dead_code)]

use std::path::Path;

use landstalker_shared::{
    AddressRegister, AssetCategory, GameLayout, InventoryAsset, PaletteType, SymbolTable,
};

// ============================================================================
// Fixture layout
// ============================================================================

pub const ROM_SIZE: usize = 0x8000;
pub const CODE_BASE: u32 = 0x0100;

pub const REGION_DATA: (u32, u32) = (0x0F00, 0x1900);
pub const SYS_FONT_ADDR: u32 = 0x1000;
pub const SYS_FONT_SIZE: u32 = 0x800;

pub const INV_SECTION: (u32, u32) = (0x2000, 0x2400);
/// Uncompressed tiles per inventory tileset
pub const INV_TILES: usize = 3;

pub const ROOM_COUNT: usize = 4;
pub const ROOM_TABLE_ADDR: u32 = 0x3000;
pub const MAP_TABLE_ADDR: u32 = 0x3100;
pub const TILEMAP_SECTION: (u32, u32) = (0x3200, 0x3600);
pub const EXTRA_SECTION: (u32, u32) = (0x4000, 0x4400);

pub const SYSTEM_STRINGS: [&str; 4] = [
    "DEVELOPED FOR USE ONLY WITH",
    "NTSC MEGA DRIVE",
    "PAL AND FRENCH SECAM MEGA DRIVE",
    "SYSTEMS.",
];

pub const ROOM_PARAMS: [[u8; 4]; ROOM_COUNT] = [
    [0x20, 0x05, 0x13, 0x21],
    [0x01, 0x02, 0x34, 0x45],
    [0xC3, 0x7F, 0xFF, 0xFF],
    [0x00, 0x00, 0x00, 0x00],
];

pub const MAP_SIZES: [usize; 3] = [10, 6, 20];
/// Map index used by each room; map 0 is shared
pub const ROOM_MAPS: [usize; ROOM_COUNT] = [0, 1, 0, 2];

pub const DOORS: [&[u8]; ROOM_COUNT] = [&[0x01, 0x02, 0x43, 0x04], &[], &[0x85, 0x06], &[0xC0, 0xFF]];
pub const TILE_SWAPS: [&[u8]; ROOM_COUNT] = [
    &[],
    &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0x80, 0x01],
    &[],
    &[9, 9, 8, 8, 2, 2, 9, 9, 8, 8, 2, 2, 0x00, 0x02],
];
pub const FALL_DESTINATIONS: [(u16, u16); 1] = [(0, 2)];
pub const CLIMB_DESTINATIONS: [(u16, u16); 2] = [(1, 3), (2, 0)];

/// Default layout sized for the fixture.
pub fn fixture_layout() -> GameLayout {
    let mut layout = GameLayout::default();
    layout.rooms.room_count = ROOM_COUNT;
    layout
}

/// Deterministic filler bytes.
pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// Palette bytes with every unused bit clear.
pub fn palette_bytes(seed: u8, kind: PaletteType) -> Vec<u8> {
    let mut bytes = pattern(seed, kind.size_bytes());
    for word in bytes.chunks_exact_mut(2) {
        word[0] &= 0x0E;
        word[1] &= 0xEE;
    }
    bytes
}

/// Bytes the fixture stores for inventory asset `index`.
pub fn inventory_bytes(asset: &InventoryAsset, index: usize) -> Vec<u8> {
    let seed = 0x40 + index as u8;
    match (asset.category, asset.palette) {
        (AssetCategory::Palette, kind) => palette_bytes(seed, kind.unwrap_or(PaletteType::Full)),
        (_, Some(kind)) => palette_bytes(seed, kind),
        (_, None) => {
            let tile = usize::from(asset.tile_width) * usize::from(asset.tile_height) * usize::from(asset.bpp) / 8;
            pattern(seed, tile * INV_TILES)
        }
    }
}

pub fn map_bytes(index: usize) -> Vec<u8> {
    pattern(0x80 + index as u8, MAP_SIZES[index])
}

// ============================================================================
// Builder
// ============================================================================

/// Incrementally assembles a ROM image and its symbol table.
pub struct RomBuilder {
    data: Vec<u8>,
    symbols: SymbolTable,
    code: u32,
}

impl RomBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            symbols: SymbolTable::new(),
            code: CODE_BASE,
        }
    }

    pub fn bytes(&mut self, address: u32, bytes: &[u8]) -> &mut Self {
        let start = address as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Place `LEA (target,PC),register` in the code area under `label`.
    pub fn lea(&mut self, label: &str, register: AddressRegister, target: u32) -> &mut Self {
        let pc = self.code;
        self.code += 4;
        let displacement = i64::from(target) - i64::from(pc);
        assert!(displacement.abs() <= 0x7FFF, "fixture LEA out of range");
        let opcode = u32::from(0x41FA | (register.index() << 9));
        let instruction = (opcode << 16) | u32::from(displacement as i16 as u16);
        self.symbols.insert_address(label, pc);
        self.bytes(pc, &instruction.to_be_bytes())
    }

    /// Place a long holding `value` in the code area under `label`.
    pub fn long(&mut self, label: &str, value: u32) -> &mut Self {
        let pc = self.code;
        self.code += 4;
        self.symbols.insert_address(label, pc);
        self.bytes(pc, &value.to_be_bytes())
    }

    pub fn symbol(&mut self, label: &str, value: u32) -> &mut Self {
        self.symbols.insert_address(label, value);
        self
    }

    pub fn section(&mut self, label: &str, (begin, end): (u32, u32)) -> &mut Self {
        self.symbols.insert_section(label, begin, end);
        self
    }

    pub fn build(self) -> (Vec<u8>, SymbolTable) {
        (self.data, self.symbols)
    }
}

fn align2(address: u32) -> u32 {
    (address + 1) & !1
}

/// Build the fixture image for `layout`, which must have [`ROOM_COUNT`] rooms.
pub fn fixture_rom(layout: &GameLayout) -> (Vec<u8>, SymbolTable) {
    assert_eq!(layout.rooms.room_count, ROOM_COUNT);
    let mut b = RomBuilder::new(ROM_SIZE);
    build_graphics(&mut b, layout);
    build_rooms(&mut b, layout);
    b.build()
}

fn build_graphics(b: &mut RomBuilder, layout: &GameLayout) {
    let rc = &layout.graphics.region_check;
    b.section(&rc.data_section, REGION_DATA);
    let mut cursor = REGION_DATA.0;
    for (label, text) in rc.string_labels.iter().zip(SYSTEM_STRINGS) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        b.bytes(cursor, &bytes).lea(label, rc.register, cursor);
        cursor += bytes.len() as u32;
    }

    let font = &layout.graphics.system_font;
    b.bytes(SYS_FONT_ADDR, &pattern(1, SYS_FONT_SIZE as usize))
        .lea(&font.label, font.register, SYS_FONT_ADDR)
        .symbol(&font.size_label, SYS_FONT_SIZE);

    let inventory = &layout.graphics.inventory;
    b.section(&inventory.section, INV_SECTION);
    let mut cursor = INV_SECTION.0;
    for (index, asset) in inventory.assets.iter().enumerate() {
        let bytes = inventory_bytes(asset, index);
        b.bytes(cursor, &bytes).lea(&asset.label, asset.register, cursor);
        for extra in &asset.extra_refs {
            b.lea(&extra.label, asset.register, cursor + extra.offset);
        }
        if let Some(size_label) = &asset.size_label {
            b.symbol(size_label, bytes.len() as u32);
        }
        cursor = align2(cursor + bytes.len() as u32);
    }
}

fn build_rooms(b: &mut RomBuilder, layout: &GameLayout) {
    let rooms = &layout.rooms;

    b.long(&rooms.room_table_ptr, ROOM_TABLE_ADDR);
    b.bytes(ROOM_TABLE_ADDR, &ROOM_PARAMS.concat());

    b.section(&rooms.tilemap_section, TILEMAP_SECTION);
    let mut cursor = TILEMAP_SECTION.0;
    let mut map_addresses = Vec::new();
    for index in 0..MAP_SIZES.len() {
        map_addresses.push(cursor);
        b.bytes(cursor, &map_bytes(index));
        cursor += MAP_SIZES[index] as u32;
    }
    b.symbol(&rooms.tilemaps_end, cursor);

    b.symbol(&rooms.map_table, MAP_TABLE_ADDR);
    let pointers: Vec<u8> = ROOM_MAPS
        .iter()
        .flat_map(|&map| map_addresses[map].to_be_bytes())
        .collect();
    b.bytes(MAP_TABLE_ADDR, &pointers);

    let (door_offsets, doors) = record_table(&DOORS);
    let (swap_offsets, swaps) = record_table(&TILE_SWAPS);
    let blobs = [
        door_offsets,
        doors,
        swap_offsets,
        swaps,
        destination_table(&FALL_DESTINATIONS),
        destination_table(&CLIMB_DESTINATIONS),
    ];

    b.section(&rooms.extra_section, EXTRA_SECTION);
    let mut cursor = EXTRA_SECTION.0;
    for (table, blob) in rooms.extra_tables().into_iter().zip(&blobs) {
        cursor = align2(cursor);
        b.bytes(cursor, blob).lea(&table.label, table.register, cursor);
        cursor += blob.len() as u32;
    }
}

fn record_table(rooms: &[&[u8]]) -> (Vec<u8>, Vec<u8>) {
    let mut offsets = Vec::new();
    let mut records = Vec::new();
    for room in rooms {
        offsets.extend_from_slice(&(records.len() as u16).to_be_bytes());
        records.extend_from_slice(room);
    }
    offsets.extend_from_slice(&(records.len() as u16).to_be_bytes());
    (offsets, records)
}

fn destination_table(pairs: &[(u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (source, destination) in pairs {
        out.extend_from_slice(&source.to_be_bytes());
        out.extend_from_slice(&destination.to_be_bytes());
    }
    out.extend_from_slice(&[0xFF, 0xFF]);
    out
}

/// Write a file under `dir`, creating parents.
pub fn write_file(dir: &Path, relative: &str, contents: &[u8]) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
