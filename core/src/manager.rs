//! Shared load/save/inject skeleton for the data managers.
//!
//! A manager owns one slice of the game's data. It is built from either an
//! assembly project or a ROM, edited through its own API, and written back
//! either as project files ([`DataManager::save`]) or as a batch of ROM
//! patches ([`DataManager::inject_into_rom`]).
//!
//! # State machine
//!
//! ```text
//! Unloaded -> Loading -> Loaded | Failed
//! Loaded <-> Dirty                       (derived from has_been_modified)
//! Loaded | Dirty -> Saved                (save does not clear the dirty flag)
//! Loaded | Dirty -> Injecting -> Loaded | Failed
//! ```

use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};
use crate::pending::{self, PendingWrite, PendingWrites};
use crate::rom::Rom;

/// Where a manager loads its data from. Chosen once, at construction.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Root assembly file of a project; its directory is the project base
    Project(&'a Path),
    Rom(&'a Rom),
}

impl Source<'_> {
    fn describe(&self) -> String {
        match self {
            Source::Project(path) => path.display().to_string(),
            Source::Rom(rom) => format!("ROM ({} bytes)", rom.len()),
        }
    }
}

/// Lifecycle state reported by [`DataManager::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerState {
    Unloaded,
    Loading,
    Loaded,
    Dirty,
    Saved,
    Injecting,
    Failed,
}

/// State shared by every manager: lifecycle, project location and the
/// pending write list.
#[derive(Debug, Clone)]
pub struct ManagerCore {
    state: ManagerState,
    root_file: Option<PathBuf>,
    pending: PendingWrites,
}

impl Default for ManagerCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerCore {
    pub fn new() -> Self {
        Self {
            state: ManagerState::Unloaded,
            root_file: None,
            pending: Vec::new(),
        }
    }

    /// Run `load` with the core in the `Loading` state, ending in `Loaded` on
    /// success. A failed load is reported to the caller and never observed.
    pub fn load<T>(
        &mut self,
        name: &str,
        source: Source<'_>,
        load: impl FnOnce(Source<'_>) -> Result<T>,
    ) -> Result<T> {
        self.state = ManagerState::Loading;
        if let Source::Project(root) = source {
            self.root_file = Some(root.to_path_buf());
        }
        match load(source) {
            Ok(value) => {
                self.state = ManagerState::Loaded;
                tracing::info!(manager = name, source = %source.describe(), "Loaded data");
                Ok(value)
            }
            Err(e) => {
                self.state = ManagerState::Failed;
                tracing::warn!(manager = name, source = %source.describe(), error = %e, "Load failed");
                Err(e)
            }
        }
    }

    /// Root assembly file the manager was loaded from, if any.
    pub fn root_file(&self) -> Option<&Path> {
        self.root_file.as_deref()
    }

    /// Directory of the project the manager was loaded from.
    pub fn base_path(&self) -> Result<&Path> {
        let root = self
            .root_file
            .as_deref()
            .ok_or_else(|| DataError::MissingAsset("project directory".into()))?;
        Ok(root.parent().unwrap_or_else(|| Path::new(".")))
    }

    pub fn pending(&self) -> &[PendingWrite] {
        &self.pending
    }

    pub fn set_pending(&mut self, writes: PendingWrites) {
        self.pending = writes;
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn set_state(&mut self, state: ManagerState) {
        self.state = state;
    }

    /// Stored state, with `Loaded` reported as `Dirty` while modified.
    pub fn state(&self, modified: bool) -> ManagerState {
        match self.state {
            ManagerState::Loaded if modified => ManagerState::Dirty,
            state => state,
        }
    }
}

/// Common operations of every data manager.
pub trait DataManager {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    fn core(&self) -> &ManagerCore;
    fn core_mut(&mut self) -> &mut ManagerCore;

    /// Write every file this manager owns under `dir`.
    fn write_project(&self, dir: &Path) -> Result<()>;

    /// Snapshot the current model as the new baseline.
    fn commit_model(&mut self);

    /// True if anything differs from the last load or commit.
    fn has_been_modified(&self) -> bool;

    /// Compute the writes that would inject the current model into `rom`.
    /// Pure: depends only on the model and the ROM's symbol table.
    fn build_pending_writes(&self, rom: &Rom) -> Result<PendingWrites>;

    fn save(&mut self, dir: &Path) -> Result<()> {
        match self.write_project(dir) {
            Ok(()) => {
                self.core_mut().set_state(ManagerState::Saved);
                tracing::info!(manager = self.name(), dir = %dir.display(), "Saved project data");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(manager = self.name(), dir = %dir.display(), error = %e, "Save failed");
                Err(e)
            }
        }
    }

    /// Save back into the project the manager was loaded from.
    fn save_to_base(&mut self) -> Result<()> {
        let base = self.core().base_path()?.to_path_buf();
        self.save(&base)
    }

    fn commit_all_changes(&mut self) {
        self.commit_model();
        self.core_mut().clear_pending();
        self.core_mut().set_state(ManagerState::Loaded);
    }

    /// Recompute and store the pending writes.
    fn refresh_pending_writes(&mut self, rom: &Rom) -> Result<()> {
        let writes = self.build_pending_writes(rom)?;
        tracing::debug!(manager = self.name(), writes = writes.len(), "Refreshed pending writes");
        self.core_mut().set_pending(writes);
        Ok(())
    }

    /// Writes produced by the last refresh.
    fn pending_writes(&self) -> &[PendingWrite] {
        self.core().pending()
    }

    /// True if every write for the current model fits in `rom`.
    fn will_fit_in_rom(&self, rom: &Rom) -> bool {
        self.build_pending_writes(rom)
            .and_then(|writes| pending::check_fit(&writes, rom))
            .is_ok()
    }

    /// Recompute pending writes and apply them all, or none of them.
    fn inject_into_rom(&mut self, rom: &mut Rom) -> Result<()> {
        self.core_mut().set_state(ManagerState::Injecting);
        let result = self.build_pending_writes(rom).and_then(|writes| {
            pending::apply_all(&writes, rom)?;
            Ok(writes.len())
        });

        match result {
            Ok(count) => {
                self.commit_all_changes();
                tracing::info!(manager = self.name(), writes = count, "Injected into ROM");
                Ok(())
            }
            Err(e) => {
                self.core_mut().set_state(ManagerState::Failed);
                tracing::warn!(manager = self.name(), error = %e, "Injection failed");
                Err(e)
            }
        }
    }

    fn state(&self) -> ManagerState {
        self.core().state(self.has_been_modified())
    }
}
