//! Landstalker Core - Asset repository and ROM injection engine
//!
//! Loads the game's data from either a ROM image or an assembly project,
//! tracks edits, and writes them back as project files or as byte-exact ROM
//! patches with every PC-relative reference re-encoded.
//!
//! # Architecture
//!
//! - [`Rom`] - ROM image with symbol resolution and big-endian access
//! - [`AsmFile`] - Reader and writer for assembly project sources
//! - [`relocate`] - `LEA (d16,PC),An` encoding
//! - [`AssetEntry`] / [`AssetStore`] - Named binary assets with dirty tracking
//! - [`records`] - Bit-packed room, door, tile swap and warp records
//! - [`DataManager`] - Shared load/save/inject lifecycle
//! - [`GraphicsData`] / [`RoomData`] - Concrete managers
//! - [`GameData`] - Facade owning both managers

pub mod asm;
pub mod entry;
pub mod error;
pub mod game;
pub mod graphics;
pub mod manager;
pub mod palette;
pub mod pending;
pub mod project;
pub mod records;
pub mod relocate;
pub mod rom;
pub mod rooms;
#[cfg(test)]
pub mod test_utils;

pub use asm::{AsmFile, FileType, Include, Token};
pub use entry::{AssetEntry, AssetId, AssetKind, AssetStore, TilesetFormat};
pub use error::{DataError, Result};
pub use game::GameData;
pub use graphics::{GraphicsData, PaletteAssociations};
pub use manager::{DataManager, ManagerCore, ManagerState, Source};
pub use palette::{Colour, Palette};
pub use pending::{PendingWrite, PendingWrites, SectionWriter, WriteTarget};
pub use rom::{Location, Rom, RomValue};
pub use rooms::{Room, RoomData};

// Re-export configuration types for convenience
pub use landstalker_shared::{AddressRegister, GameLayout, PaletteType, Section, SymbolTable};
