//! Room data manager
//!
//! Owns the room parameter table, the room tilemaps and the per-room tables
//! packed into the room extra section: door offsets and doors, tile swap
//! offsets and tile swaps, and the fall and climb destination lists.
//!
//! # ROM layout
//!
//! ```text
//! RoomDataPtr:     dc.l  <room table>     room_count x 4-byte params
//! RoomMapTable:    dc.l  <map> ...        one absolute map pointer per room
//! TilemapSection:  maps back to back      a map ends where the next begins
//! TilemapsEnd                             end of the last map
//! RoomExtraSection:                       six tables, each on an even address
//! ```
//!
//! Maps are opaque compressed blobs. Rooms sharing a pointer share a map.
//!
//! # Project files
//!
//! ```text
//! <root>.asm
//!   RoomTable:       incbin params            room_count x 4 bytes
//!   RoomMapTable:    incbin map indices       room_count x u16
//!   TilemapSection:  include "tilemaps.asm"   MapNNN: incbin ... per map
//!   <table label>:   incbin ...               one per extra table
//! ```

use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use hashbrown::HashSet;
use landstalker_shared::labels::rooms::TILEMAP_EXT;
use landstalker_shared::{RoomLayout, TableReference};

use crate::asm::{AsmFile, FileType};
use crate::entry::{AssetEntry, AssetId, AssetStore};
use crate::error::{DataError, Result};
use crate::manager::{DataManager, ManagerCore, Source};
use crate::pending::{PendingWrite, PendingWrites, SectionWriter};
use crate::project;
use crate::records::{DestinationTable, Door, PackedRecord, RoomParams, RoomRecordTable, TileSwap};
use crate::rom::Rom;


/// One room of the room table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub index: usize,
    pub name: String,
    /// Symbol of the room's tilemap
    pub map: String,
    pub params: RoomParams,
}

impl Room {
    fn new(index: usize, map: String, params: RoomParams) -> Self {
        Self {
            index,
            name: format!("Room{index:03}"),
            map,
            params,
        }
    }
}

/// Everything except the maps; compared against its committed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RoomTables {
    rooms: Vec<Room>,
    doors: RoomRecordTable<Door>,
    tile_swaps: RoomRecordTable<TileSwap>,
    fall: DestinationTable,
    climb: DestinationTable,
}

/// Project-relative paths of the files this manager writes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RoomFiles {
    room_table: String,
    map_table: String,
    tilemap_list: String,
    /// Parallel to [`RoomLayout::extra_tables`]
    tables: [String; 6],
}

impl RoomFiles {
    fn from_layout(layout: &RoomLayout) -> Self {
        Self {
            room_table: layout.room_table_file.clone(),
            map_table: layout.map_table_file.clone(),
            tilemap_list: layout.tilemap_list_file.clone(),
            tables: layout.extra_tables().map(|t| t.file.clone()),
        }
    }
}

/// Rooms, tilemaps and per-room tables.
#[derive(Debug, Clone)]
pub struct RoomData {
    core: ManagerCore,
    layout: RoomLayout,
    files: RoomFiles,
    maps: AssetStore,
    /// Maps in section order
    map_order: Vec<AssetId>,
    tables: RoomTables,
    committed: RoomTables,
}

struct Loaded {
    files: RoomFiles,
    maps: Vec<AssetEntry>,
    tables: RoomTables,
}

impl RoomData {
    /// Load rooms from a project or a ROM.
    pub fn load(source: Source<'_>, layout: &RoomLayout) -> Result<Self> {
        let mut core = ManagerCore::new();
        let loaded = core.load("rooms", source, |source| match source {
            Source::Project(root) => load_from_project(root, layout),
            Source::Rom(rom) => load_from_rom(rom, layout),
        })?;

        let mut maps = AssetStore::new();
        let map_order = loaded
            .maps
            .into_iter()
            .map(|entry| maps.insert(entry))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(rooms = loaded.tables.rooms.len(), maps = map_order.len(), "Built room model");

        Ok(Self {
            core,
            layout: layout.clone(),
            files: loaded.files,
            maps,
            map_order,
            committed: loaded.tables.clone(),
            tables: loaded.tables,
        })
    }

    pub fn layout(&self) -> &RoomLayout {
        &self.layout
    }

    pub fn rooms(&self) -> &[Room] {
        &self.tables.rooms
    }

    pub fn room(&self, index: usize) -> Result<&Room> {
        let count = self.tables.rooms.len();
        self.tables
            .rooms
            .get(index)
            .ok_or(DataError::InvalidIndex { index, count })
    }

    /// Mutable access to a room's params and map binding.
    pub fn room_mut(&mut self, index: usize) -> Result<&mut Room> {
        let count = self.tables.rooms.len();
        self.tables
            .rooms
            .get_mut(index)
            .ok_or(DataError::InvalidIndex { index, count })
    }

    /// Tilemaps in section order.
    pub fn maps(&self) -> Vec<&AssetEntry> {
        self.map_order.iter().map(|&id| self.maps.get(id)).collect()
    }

    pub fn map(&self, name: &str) -> Option<&AssetEntry> {
        self.maps.by_name(name)
    }

    pub fn map_for_room(&self, index: usize) -> Result<&AssetEntry> {
        let room = self.room(index)?;
        self.maps.require_symbol(&room.map)
    }

    /// Replace the compressed bytes of the map called `name`.
    pub fn set_map_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let id = self
            .maps
            .id_by_name(name)
            .ok_or_else(|| DataError::MissingAsset(name.to_string()))?;
        self.maps.get_mut(id).set_bytes(bytes)
    }

    pub fn doors_for_room(&self, index: usize) -> Result<&[Door]> {
        self.tables.doors.for_room(index)
    }

    pub fn set_room_doors(&mut self, index: usize, doors: Vec<Door>) -> Result<()> {
        self.tables.doors.set_room(index, doors)
    }

    pub fn tile_swaps_for_room(&self, index: usize) -> Result<&[TileSwap]> {
        self.tables.tile_swaps.for_room(index)
    }

    pub fn set_room_tile_swaps(&mut self, index: usize, swaps: Vec<TileSwap>) -> Result<()> {
        self.tables.tile_swaps.set_room(index, swaps)
    }

    /// Room a player falling out of `room` lands in.
    pub fn fall_destination(&self, room: u16) -> Option<u16> {
        self.tables.fall.get(room)
    }

    pub fn set_fall_destination(&mut self, room: u16, destination: Option<u16>) -> Result<()> {
        self.check_warp(room, destination)?;
        self.tables.fall.set(room, destination);
        Ok(())
    }

    /// Room a player climbing out of `room` arrives in.
    pub fn climb_destination(&self, room: u16) -> Option<u16> {
        self.tables.climb.get(room)
    }

    pub fn set_climb_destination(&mut self, room: u16, destination: Option<u16>) -> Result<()> {
        self.check_warp(room, destination)?;
        self.tables.climb.set(room, destination);
        Ok(())
    }

    /// Append this manager's includes to a project root file.
    pub fn write_root_includes(&self, root: &mut AsmFile) {
        root.label(&self.layout.room_table)
            .include(&self.files.room_table, FileType::Binary)
            .label(&self.layout.map_table)
            .include(&self.files.map_table, FileType::Binary)
            .label(&self.layout.tilemap_section)
            .include(&self.files.tilemap_list, FileType::Assembler);
        for (table, file) in self.layout.extra_tables().into_iter().zip(&self.files.tables) {
            root.label(&table.label).include(file, FileType::Binary);
        }
    }

    fn check_warp(&self, room: u16, destination: Option<u16>) -> Result<()> {
        let count = self.tables.rooms.len();
        for index in std::iter::once(room).chain(destination) {
            if usize::from(index) >= count {
                return Err(DataError::InvalidIndex {
                    index: usize::from(index),
                    count,
                });
            }
        }
        Ok(())
    }

    /// Position of each room's map in section order.
    fn room_map_indices(&self) -> Result<Vec<usize>> {
        self.tables
            .rooms
            .iter()
            .map(|room| {
                let id = self
                    .maps
                    .id_by_symbol(&room.map)
                    .ok_or_else(|| DataError::MissingAsset(room.map.clone()))?;
                self.map_order
                    .iter()
                    .position(|&other| other == id)
                    .ok_or_else(|| DataError::MissingAsset(room.map.clone()))
            })
            .collect()
    }

    /// The six extra tables in packing order.
    fn encode_extra_tables(&self) -> Result<[Vec<u8>; 6]> {
        let doors = self.tables.doors.encode()?;
        let swaps = self.tables.tile_swaps.encode()?;
        Ok([
            doors.offsets,
            doors.records,
            swaps.offsets,
            swaps.records,
            self.tables.fall.to_bytes(),
            self.tables.climb.to_bytes(),
        ])
    }

    // ========================================================================
    // Project output
    // ========================================================================

    fn write_tilemap_list(&self, dir: &Path) -> Result<()> {
        let mut file = AsmFile::new();
        file.write_file_header(&self.files.tilemap_list, "Room Tilemaps");
        for map in self.maps() {
            file.label(map.symbol()).include(map.path(), FileType::Binary);
        }
        file.write_file(&dir.join(&self.files.tilemap_list))
    }

    // ========================================================================
    // ROM output
    // ========================================================================

    fn build_map_writes(&self, rom: &Rom, writes: &mut PendingWrites) -> Result<()> {
        let section = rom.get_section(&self.layout.tilemap_section)?;
        let mut data = SectionWriter::new(section.begin);
        let addresses: Vec<u32> = self
            .map_order
            .iter()
            .map(|&id| data.push(self.maps.get(id).bytes()))
            .collect();
        writes.push(PendingWrite::to_label(&self.layout.tilemap_section, data.into_bytes()));

        let mut pointers = vec![0u8; self.tables.rooms.len() * 4];
        for (slot, index) in pointers.chunks_exact_mut(4).zip(self.room_map_indices()?) {
            BigEndian::write_u32(slot, addresses[index]);
        }
        writes.push(PendingWrite::to_label(&self.layout.map_table, pointers));
        Ok(())
    }

    fn build_extra_writes(&self, rom: &Rom, writes: &mut PendingWrites) -> Result<()> {
        let section = rom.get_section(&self.layout.extra_section)?;
        let mut data = SectionWriter::new(section.begin);
        let mut leas = Vec::with_capacity(6);
        for (table, bytes) in self.layout.extra_tables().into_iter().zip(self.encode_extra_tables()?) {
            data.align(2, 0xFF);
            leas.push((table, data.push(&bytes)));
        }
        writes.push(PendingWrite::to_label(&self.layout.extra_section, data.into_bytes()));

        for (table, address) in leas {
            writes.push(PendingWrite::lea(rom, &table.label, table.register, address)?);
        }
        Ok(())
    }
}

impl DataManager for RoomData {
    fn name(&self) -> &'static str {
        "rooms"
    }

    fn core(&self) -> &ManagerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ManagerCore {
        &mut self.core
    }

    fn write_project(&self, dir: &Path) -> Result<()> {
        let params: Vec<RoomParams> = self.tables.rooms.iter().map(|r| r.params).collect();
        project::write_binary(dir, &self.files.room_table, &RoomParams::pack_all(&params))?;

        let mut indices = Vec::with_capacity(self.tables.rooms.len() * 2);
        for i in self.room_map_indices()? {
            let index = project_map_index(&self.files.map_table, i)?;
            indices.extend_from_slice(&index.to_be_bytes());
        }
        project::write_binary(dir, &self.files.map_table, &indices)?;

        self.write_tilemap_list(dir)?;
        for map in self.maps() {
            map.save(dir)?;
        }

        for (file, bytes) in self.files.tables.iter().zip(self.encode_extra_tables()?) {
            project::write_binary(dir, file, &bytes)?;
        }
        Ok(())
    }

    fn commit_model(&mut self) {
        self.maps.commit_all();
        self.committed = self.tables.clone();
    }

    fn has_been_modified(&self) -> bool {
        self.tables != self.committed || self.maps.has_been_modified()
    }

    fn build_pending_writes(&self, rom: &Rom) -> Result<PendingWrites> {
        let params: Vec<RoomParams> = self.tables.rooms.iter().map(|r| r.params).collect();
        let table_address = rom.read::<u32>(&self.layout.room_table_ptr)?;

        let mut writes = vec![PendingWrite::to_address(table_address, RoomParams::pack_all(&params))];
        self.build_map_writes(rom, &mut writes)?;
        self.build_extra_writes(rom, &mut writes)?;
        Ok(writes)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Project map tables hold one big-endian word per room.
fn project_map_index(file: &str, index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| DataError::CapacityOverflow {
        target: file.to_string(),
        needed: index + 1,
        available: usize::from(u16::MAX) + 1,
    })
}

fn map_name(index: usize) -> String {
    format!("Map{index:03}")
}

fn map_path(layout: &RoomLayout, name: &str) -> String {
    format!("{}/{}.{}", layout.tilemap_dir, name, TILEMAP_EXT)
}

fn expect_len(name: &str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(DataError::size_mismatch(name, format!("{expected} bytes"), bytes.len()));
    }
    Ok(())
}

fn load_from_rom(rom: &Rom, layout: &RoomLayout) -> Result<Loaded> {
    let count = layout.room_count;

    let table_address = rom.read::<u32>(&layout.room_table_ptr)?;
    let params = RoomParams::unpack_all(rom.read_bytes(table_address, count * RoomParams::SIZE)?);

    // Maps are identified by pointer; the sorted, deduplicated pointers give
    // each map's extent
    let pointers = rom.read_array::<u32>(&layout.map_table, count)?;
    let mut starts = pointers.clone();
    starts.sort_unstable();
    starts.dedup();
    let end = rom.get_address(&layout.tilemaps_end)?;

    let maps = starts
        .iter()
        .enumerate()
        .map(|(index, &start)| -> Result<AssetEntry> {
            let next = starts.get(index + 1).copied().unwrap_or(end);
            let size = next.checked_sub(start).ok_or(DataError::OutOfRange {
                offset: start,
                len: 0,
                size: end as usize,
            })?;
            let name = map_name(index);
            let bytes = rom.read_bytes(start, size as usize)?.to_vec();
            Ok(AssetEntry::tilemap(&name, bytes, &map_path(layout, &name))?.with_start_address(start))
        })
        .collect::<Result<Vec<_>>>()?;

    let rooms = params
        .into_iter()
        .zip(&pointers)
        .enumerate()
        .map(|(index, (params, pointer))| {
            let map = starts.binary_search(pointer).map_or_else(|_| String::new(), map_name);
            Room::new(index, map, params)
        })
        .collect();

    let doors = read_record_table(rom, &layout.door_offsets, &layout.doors, count)?;
    let tile_swaps = read_record_table(rom, &layout.tile_swap_offsets, &layout.tile_swaps, count)?;
    let fall = DestinationTable::from_bytes(rom.data(rom.lea_target(&layout.fall_destinations.label)?)?);
    let climb = DestinationTable::from_bytes(rom.data(rom.lea_target(&layout.climb_destinations.label)?)?);
    tracing::debug!(
        rooms = count,
        maps = maps.len(),
        fall = fall.len(),
        climb = climb.len(),
        "Read room tables"
    );

    Ok(Loaded {
        files: RoomFiles::from_layout(layout),
        maps,
        tables: RoomTables {
            rooms,
            doors,
            tile_swaps,
            fall,
            climb,
        },
    })
}

/// Follow the offset and record table references and decode the pair.
fn read_record_table<R: PackedRecord + Clone>(
    rom: &Rom,
    offsets: &TableReference,
    records: &TableReference,
    count: usize,
) -> Result<RoomRecordTable<R>> {
    let offsets_address = rom.lea_target(&offsets.label)?;
    let offsets = rom.read_bytes(offsets_address, RoomRecordTable::<R>::offsets_len(count))?;
    let stream_len = RoomRecordTable::<R>::declared_stream_len(offsets, count)?;
    let records_address = rom.lea_target(&records.label)?;
    RoomRecordTable::decode(offsets, rom.read_bytes(records_address, stream_len)?, count)
}

fn load_from_project(root: &Path, layout: &RoomLayout) -> Result<Loaded> {
    let base = root.parent().unwrap_or_else(|| Path::new("."));
    let count = layout.room_count;

    let mut root_file = AsmFile::load(root)?;
    let room_table = project::include_path(&mut root_file, &layout.room_table, FileType::Binary)?;
    let map_table = project::include_path(&mut root_file, &layout.map_table, FileType::Binary)?;
    let tilemap_list = project::include_path(&mut root_file, &layout.tilemap_section, FileType::Assembler)?;
    let mut table_files = Vec::with_capacity(6);
    for table in layout.extra_tables() {
        table_files.push(project::include_path(&mut root_file, &table.label, FileType::Binary)?);
    }
    let tables: [String; 6] = table_files
        .try_into()
        .map_err(|_| DataError::MissingAsset("room extra tables".into()))?;

    let params_bytes = project::read_binary(base, &room_table)?;
    expect_len(&layout.room_table, &params_bytes, count * RoomParams::SIZE)?;

    let maps = load_tilemaps(base, &tilemap_list)?;
    let index_bytes = project::read_binary(base, &map_table)?;
    expect_len(&layout.map_table, &index_bytes, count * 2)?;

    let rooms = RoomParams::unpack_all(&params_bytes)
        .into_iter()
        .zip(index_bytes.chunks_exact(2))
        .enumerate()
        .map(|(index, (params, word))| -> Result<Room> {
            let map_index = usize::from(BigEndian::read_u16(word));
            let map = maps.get(map_index).ok_or(DataError::InvalidIndex {
                index: map_index,
                count: maps.len(),
            })?;
            Ok(Room::new(index, map.symbol().to_string(), params))
        })
        .collect::<Result<Vec<_>>>()?;

    let blobs = tables
        .iter()
        .map(|file| project::read_binary(base, file))
        .collect::<Result<Vec<_>>>()?;
    let doors = RoomRecordTable::decode(&blobs[0], &blobs[1], count)?;
    let tile_swaps = RoomRecordTable::decode(&blobs[2], &blobs[3], count)?;
    let fall = DestinationTable::from_bytes(&blobs[4]);
    let climb = DestinationTable::from_bytes(&blobs[5]);

    Ok(Loaded {
        files: RoomFiles {
            room_table,
            map_table,
            tilemap_list,
            tables,
        },
        maps,
        tables: RoomTables {
            rooms,
            doors,
            tile_swaps,
            fall,
            climb,
        },
    })
}

/// Read every `label: incbin` pair of the tilemap list, in order.
fn load_tilemaps(base: &Path, file: &str) -> Result<Vec<AssetEntry>> {
    let mut asm = project::load_asm(base, file)?;
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    while !asm.at_end() {
        let label = asm.read_label()?;
        if !seen.insert(label.clone()) {
            return Err(DataError::DuplicateName(label));
        }
        let path = project::next_include_path(&mut asm, &label, FileType::Binary)?;
        entries.push((label, path));
    }

    let mut maps = Vec::with_capacity(entries.len());
    for (label, path) in entries {
        let bytes = project::read_binary(base, &path)?;
        maps.push(AssetEntry::tilemap(&label, bytes, &path)?);
    }
    tracing::debug!(file, maps = maps.len(), "Read tilemap list");
    Ok(maps)
}
