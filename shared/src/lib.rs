//! Shared types for the Landstalker asset tools.
//!
//! Everything in this crate is plain data: ROM symbol tables, the game layout
//! configuration, well-known labels and filenames, and the filesystem helpers
//! used by both the project loaders and writers. The engine itself lives in
//! `landstalker-core`.

pub mod fs;
pub mod labels;
pub mod layout;
pub mod paths;
pub mod symbols;

pub use layout::{
    AddressRegister, AssetCategory, BlockLayout, FontLayout, GameLayout, GraphicsLayout,
    InventoryAsset, InventoryLayout, OffsetReference, PaletteType, RegionCheckLayout, RoomLayout,
    TableReference,
};
pub use symbols::{Section, SymbolTable};
