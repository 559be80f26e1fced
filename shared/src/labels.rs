//! Well-known labels and default filenames for the Landstalker disassembly.
//!
//! Labels name the same thing in both representations: in a ROM symbol table
//! they resolve to the address of the instruction (or section) that refers to
//! an asset, and in an assembly project they mark the include directive or
//! data that holds it. Default filenames are used when assets are extracted
//! from a ROM and later written out as a project.

/// Region check routine and its system strings.
pub mod strings {
    pub const REGION_CHECK: &str = "RegionCheck";
    pub const REGION_CHECK_ROUTINE: &str = "RegionCheckRoutine";
    pub const REGION_CHECK_STRINGS: &str = "RegionCheckStrings";
    pub const REGION_ERROR_LINE1: &str = "RegionErrorLine1";
    pub const REGION_ERROR_NTSC: &str = "RegionErrorNTSC";
    pub const REGION_ERROR_PAL: &str = "RegionErrorPAL";
    pub const REGION_ERROR_LINE3: &str = "RegionErrorLine3";

    /// Section holding the strings followed by the system font.
    pub const REGION_CHECK_DATA_SECTION: &str = "RegionCheckData";

    pub const REGION_CHECK_FILE: &str = "code/system/regioncheck.asm";
    pub const REGION_CHECK_ROUTINE_FILE: &str = "code/system/regioncheckroutine.asm";
    pub const REGION_CHECK_STRINGS_FILE: &str = "code/system/regioncheckstrings.asm";
}

/// Fonts and inventory graphics.
pub mod graphics {
    pub const SYS_FONT: &str = "SysFont";
    pub const SYS_FONT_SIZE: &str = "SysFontSize";
    pub const SYS_FONT_FILE: &str = "assets_packed/graphics/fonts/sysfont.bin";

    pub const INV_SECTION: &str = "InvGraphicsSection";
    pub const INV_GRAPHICS_FILE: &str = "code/graphics/inventorygraphics.asm";

    pub const INV_FONT: &str = "InvFont";
    pub const INV_FONT_SIZE: &str = "InvFontSize";
    pub const INV_FONT_FILE: &str = "assets_packed/graphics/fonts/menufont.bin";

    pub const INV_CURSOR: &str = "InvCursor";
    pub const INV_CURSOR_SIZE: &str = "InvCursorSize";
    pub const INV_CURSOR_FILE: &str = "assets_packed/graphics/static/hud/menucursor.bin";

    pub const INV_ARROW: &str = "InvArrow";
    pub const INV_ARROW_SIZE: &str = "InvArrowSize";
    pub const INV_ARROW_FILE: &str = "assets_packed/graphics/static/hud/menuarrow.bin";

    pub const INV_UNUSED1: &str = "InvUnused1";
    pub const INV_UNUSED1_PLUS6: &str = "InvUnused1Plus6";
    pub const INV_UNUSED1_SIZE: &str = "InvUnused1Size";
    pub const INV_UNUSED1_FILE: &str = "assets_packed/graphics/static/hud/unused1.bin";

    pub const INV_UNUSED2: &str = "InvUnused2";
    pub const INV_UNUSED2_PLUS4: &str = "InvUnused2Plus4";
    pub const INV_UNUSED2_SIZE: &str = "InvUnused2Size";
    pub const INV_UNUSED2_FILE: &str = "assets_packed/graphics/static/hud/unused2.bin";

    pub const INV_PAL1: &str = "InvPal1";
    pub const INV_PAL1_FILE: &str = "assets_packed/graphics/static/hud/invpal1.pal";

    pub const INV_PAL2: &str = "InvPal2";
    pub const INV_PAL2_FILE: &str = "assets_packed/graphics/static/hud/invpal2.pal";
}

/// Room table, tilemaps and per-room tables.
pub mod rooms {
    /// Number of rooms in the retail game.
    pub const ROOM_COUNT: usize = 816;

    /// Project label for the packed room parameter table.
    pub const ROOM_TABLE: &str = "RoomTable";
    /// ROM label of the long holding the room parameter table address.
    pub const ROOM_DATA_PTR: &str = "RoomDataPtr";
    pub const ROOM_TABLE_FILE: &str = "assets_packed/roomdata/roomparams.bin";

    pub const ROOM_MAP_TABLE: &str = "RoomMapTable";
    pub const ROOM_MAP_TABLE_FILE: &str = "assets_packed/roomdata/roommaps.bin";

    pub const TILEMAP_SECTION: &str = "TilemapSection";
    pub const TILEMAPS_END: &str = "TilemapsEnd";
    pub const TILEMAP_LIST_FILE: &str = "code/roomdata/tilemaps.asm";
    pub const TILEMAP_DIR: &str = "assets_packed/maps";
    pub const TILEMAP_EXT: &str = "cmp";

    pub const ROOM_EXTRA_SECTION: &str = "RoomExtraSection";

    pub const DOOR_OFFSETS: &str = "DoorOffsetTable";
    pub const DOOR_OFFSETS_FILE: &str = "assets_packed/roomdata/dooroffsets.bin";
    pub const DOORS: &str = "DoorTable";
    pub const DOORS_FILE: &str = "assets_packed/roomdata/doors.bin";

    pub const TILE_SWAP_OFFSETS: &str = "TileSwapOffsetTable";
    pub const TILE_SWAP_OFFSETS_FILE: &str = "assets_packed/roomdata/tileswapoffsets.bin";
    pub const TILE_SWAPS: &str = "TileSwapTable";
    pub const TILE_SWAPS_FILE: &str = "assets_packed/roomdata/tileswaps.bin";

    pub const FALL_DESTINATIONS: &str = "FallDestTable";
    pub const FALL_DESTINATIONS_FILE: &str = "assets_packed/roomdata/falldest.bin";
    pub const CLIMB_DESTINATIONS: &str = "ClimbDestTable";
    pub const CLIMB_DESTINATIONS_FILE: &str = "assets_packed/roomdata/climbdest.bin";
}
