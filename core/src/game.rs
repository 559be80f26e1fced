//! Whole-game facade over the graphics and room managers.

use std::collections::BTreeMap;
use std::path::Path;

use landstalker_shared::GameLayout;

use crate::asm::AsmFile;
use crate::entry::AssetEntry;
use crate::error::Result;
use crate::graphics::GraphicsData;
use crate::manager::{DataManager, ManagerCore, ManagerState, Source};
use crate::pending::PendingWrites;
use crate::rom::Rom;
use crate::rooms::{Room, RoomData};

/// One graphics manager and one room manager loaded from the same source.
///
/// Implements [`DataManager`] by aggregation: pending writes are the
/// concatenation of both managers' writes, so an injection either patches
/// everything or nothing.
#[derive(Debug, Clone)]
pub struct GameData {
    core: ManagerCore,
    graphics: GraphicsData,
    rooms: RoomData,
}

impl GameData {
    pub fn load(source: Source<'_>, layout: &GameLayout) -> Result<Self> {
        let mut core = ManagerCore::new();
        let (graphics, rooms) = core.load("game", source, |source| {
            Ok((
                GraphicsData::load(source, &layout.graphics)?,
                RoomData::load(source, &layout.rooms)?,
            ))
        })?;
        Ok(Self { core, graphics, rooms })
    }

    pub fn graphics(&self) -> &GraphicsData {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut GraphicsData {
        &mut self.graphics
    }

    pub fn rooms(&self) -> &RoomData {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut RoomData {
        &mut self.rooms
    }

    pub fn get_room(&self, index: usize) -> Result<&Room> {
        self.rooms.room(index)
    }

    pub fn get_map_for_room(&self, index: usize) -> Result<&AssetEntry> {
        self.rooms.map_for_room(index)
    }

    pub fn get_palette(&self, name: &str) -> Option<&AssetEntry> {
        self.graphics.all_palettes().get(name).copied()
    }

    pub fn get_tileset(&self, name: &str) -> Option<&AssetEntry> {
        self.graphics.all_tilesets().get(name).copied()
    }

    pub fn all_palettes(&self) -> BTreeMap<String, &AssetEntry> {
        self.graphics.all_palettes()
    }

    pub fn all_tilesets(&self) -> BTreeMap<String, &AssetEntry> {
        self.graphics.all_tilesets()
    }

    /// Write a project root file including every file the managers save.
    pub fn write_root_file(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut root = AsmFile::new();
        root.write_file_header(&name, "Landstalker Data");
        self.graphics.write_root_includes(&mut root);
        self.rooms.write_root_includes(&mut root);
        root.write_file(path)?;
        tracing::info!(path = %path.display(), "Wrote project root file");
        Ok(())
    }
}

impl DataManager for GameData {
    fn name(&self) -> &'static str {
        "game"
    }

    fn core(&self) -> &ManagerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ManagerCore {
        &mut self.core
    }

    fn write_project(&self, dir: &Path) -> Result<()> {
        self.graphics.write_project(dir)?;
        self.rooms.write_project(dir)
    }

    /// Save both managers so each reports `Saved`.
    fn save(&mut self, dir: &Path) -> Result<()> {
        self.graphics.save(dir)?;
        self.rooms.save(dir)?;
        self.core.set_state(ManagerState::Saved);
        Ok(())
    }

    fn commit_model(&mut self) {
        self.graphics.commit_all_changes();
        self.rooms.commit_all_changes();
    }

    fn has_been_modified(&self) -> bool {
        self.graphics.has_been_modified() || self.rooms.has_been_modified()
    }

    fn build_pending_writes(&self, rom: &Rom) -> Result<PendingWrites> {
        let mut writes = self.graphics.build_pending_writes(rom)?;
        writes.extend(self.rooms.build_pending_writes(rom)?);
        Ok(writes)
    }
}
