use std::path::PathBuf;

use landstalker_shared::{GameLayout, PaletteType};
use tempfile::TempDir;

use super::*;
use crate::manager::ManagerState;
use crate::test_utils::*;

fn rom(layout: &GameLayout) -> Rom {
    let (data, symbols) = fixture_rom(layout);
    Rom::new(data, symbols)
}

fn load(layout: &GameLayout, rom: &Rom) -> GraphicsData {
    GraphicsData::load(Source::Rom(rom), &layout.graphics).unwrap()
}

/// Save `graphics` as a project under `dir` and return the root file path.
fn save_project(graphics: &mut GraphicsData, dir: &Path) -> PathBuf {
    graphics.save(dir).unwrap();
    let mut root = AsmFile::new();
    root.write_file_header("landstalker.asm", "Root");
    graphics.write_root_includes(&mut root);
    let path = dir.join("landstalker.asm");
    root.write_file(&path).unwrap();
    path
}

fn names(entries: Vec<&AssetEntry>) -> Vec<&str> {
    entries.into_iter().map(AssetEntry::name).collect()
}

#[test]
fn test_system_font_only() {
    let mut layout = fixture_layout();
    layout.graphics.inventory.assets.clear();
    let rom = rom(&layout);

    let graphics = load(&layout, &rom);
    let fonts = graphics.fonts();
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].name(), "SysFont");
    assert_eq!(fonts[0].len(), 0x800);
    assert_eq!(fonts[0].start_address(), Some(SYS_FONT_ADDR));
    assert_eq!(fonts[0].bytes(), pattern(1, 0x800).as_slice());
    assert!(graphics.misc_graphics().is_empty());
    assert!(graphics.palettes().is_empty());
}

#[test]
fn test_load_from_rom() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let graphics = load(&layout, &rom);

    assert_eq!(graphics.state(), ManagerState::Loaded);
    assert_eq!(graphics.system_strings(), SYSTEM_STRINGS);
    assert_eq!(names(graphics.fonts()), ["InvFont", "SysFont"]);
    assert_eq!(
        names(graphics.misc_graphics()),
        ["InvArrow", "InvCursor", "InvUnused1", "InvUnused2"]
    );
    assert_eq!(names(graphics.palettes()), ["InvPal1", "InvPal2"]);
    assert_eq!(graphics.all_tilesets().len(), 6);
    assert_eq!(graphics.all_palettes().len(), 2);

    let pal1 = graphics.entry("InvPal1").unwrap();
    assert_eq!(pal1.kind(), AssetKind::Palette(PaletteType::Low8));
    assert_eq!(pal1.len(), 16);

    let inventory = &layout.graphics.inventory.assets;
    let unused1 = graphics.entry("InvUnused1").unwrap();
    assert_eq!(unused1.bytes(), inventory_bytes(&inventory[3], 3).as_slice());
    assert_eq!(unused1.start_address(), Some(rom.lea_target("InvUnused1").unwrap()));
}

#[test]
fn test_missing_label_fails_load() {
    let layout = fixture_layout();
    let (data, _) = fixture_rom(&layout);
    let rom = Rom::new(data, landstalker_shared::SymbolTable::new());
    assert!(matches!(
        GraphicsData::load(Source::Rom(&rom), &layout.graphics),
        Err(DataError::UnknownSymbol(label)) if label == "SysFont"
    ));
}

#[test]
fn test_palette_associations() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let graphics = load(&layout, &rom);

    let associations = graphics.palette_associations("InvCursor").unwrap();
    assert_eq!(associations.all, ["InvPal1", "InvPal2"]);
    assert_eq!(associations.recommended, associations.all);
    assert_eq!(associations.default.as_deref(), Some("InvPal1"));

    assert!(matches!(
        graphics.palette_associations("InvPal1"),
        Err(DataError::MissingAsset(_))
    ));
    assert!(graphics.palette_associations("Nothing").is_err());
}

#[test]
fn test_edits_mark_modified() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let mut graphics = load(&layout, &rom);
    assert!(!graphics.has_been_modified());

    // Wrong palette size is rejected and leaves the model untouched
    assert!(matches!(
        graphics.set_bytes("InvPal2", vec![0; 16]),
        Err(DataError::SizeMismatch { .. })
    ));
    assert!(!graphics.has_been_modified());

    graphics.set_system_string(1, "NTSC GENESIS").unwrap();
    assert_eq!(graphics.state(), ManagerState::Dirty);
    assert!(matches!(
        graphics.set_system_string(4, "X"),
        Err(DataError::InvalidIndex { index: 4, count: 4 })
    ));

    graphics.set_system_string(1, SYSTEM_STRINGS[1]).unwrap();
    assert!(!graphics.has_been_modified());

    // Strings are zero-terminated single bytes
    for text in ["AB\0CD", "\u{263A}"] {
        assert!(matches!(
            graphics.set_system_string(0, text),
            Err(DataError::Unencodable { .. })
        ));
    }
    assert_eq!(graphics.system_strings()[0], SYSTEM_STRINGS[0]);
    assert!(!graphics.has_been_modified());

    graphics.rename("InvFont", "MenuFont").unwrap();
    assert!(graphics.has_been_modified());
    assert!(graphics.entry("InvFont").is_none());
    assert_eq!(graphics.entry_by_symbol("InvFont").unwrap().name(), "MenuFont");
    assert_eq!(names(graphics.fonts()), ["MenuFont", "SysFont"]);

    graphics.commit_all_changes();
    assert!(!graphics.has_been_modified());
}

#[test]
fn test_refresh_is_idempotent() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let mut graphics = load(&layout, &rom);

    graphics.refresh_pending_writes(&rom).unwrap();
    let first = graphics.pending_writes().to_vec();
    graphics.refresh_pending_writes(&rom).unwrap();
    assert_eq!(graphics.pending_writes(), first.as_slice());

    // Two sections, four strings, the font and nine inventory references
    assert_eq!(first.len(), 2 + 4 + 1 + 9);
    assert!(graphics.will_fit_in_rom(&rom));
}

#[test]
fn test_inject_and_reload() {
    let layout = fixture_layout();
    let mut rom = rom(&layout);
    let mut graphics = load(&layout, &rom);

    graphics.set_system_string(3, "SYSTEM.").unwrap();
    // One extra font tile shifts every later inventory asset
    let mut font = graphics.entry("InvFont").unwrap().bytes().to_vec();
    font.extend_from_slice(&[0x5A; 8]);
    graphics.set_bytes("InvFont", font.clone()).unwrap();

    graphics.inject_into_rom(&mut rom).unwrap();
    assert_eq!(graphics.state(), ManagerState::Loaded);
    assert!(!graphics.has_been_modified());

    // Sizes are assembler constants, so patch the one that changed
    let mut symbols = rom.symbols().clone();
    symbols.insert_address("InvFontSize", font.len() as u32);
    let rom = Rom::new(rom.as_bytes().to_vec(), symbols);

    let reloaded = load(&layout, &rom);
    assert_eq!(reloaded.system_strings()[3], "SYSTEM.");
    assert_eq!(reloaded.system_strings()[0], SYSTEM_STRINGS[0]);
    assert_eq!(reloaded.system_font().bytes(), graphics.system_font().bytes());
    assert_eq!(reloaded.entry("InvFont").unwrap().bytes(), font.as_slice());
    for entry in graphics.assets() {
        assert_eq!(reloaded.entry(entry.name()).unwrap().bytes(), entry.bytes(), "{}", entry.name());
    }

    // Font follows the strings on an even address
    let font_address = rom.lea_target("SysFont").unwrap();
    assert_eq!(font_address % 2, 0);
    assert!(font_address >= REGION_DATA.0 && font_address < SYS_FONT_ADDR);

    // Offset references move with their asset
    let unused1 = rom.lea_target("InvUnused1").unwrap();
    assert_eq!(rom.lea_target("InvUnused1Plus6").unwrap(), unused1 + 12);
    let unused2 = rom.lea_target("InvUnused2").unwrap();
    assert_eq!(rom.lea_target("InvUnused2Plus4").unwrap(), unused2 + 8);
}

#[test]
fn test_overflow_leaves_rom_untouched() {
    let layout = fixture_layout();
    let mut rom = rom(&layout);
    let before = rom.clone();
    let mut graphics = load(&layout, &rom);

    // Larger than the whole inventory section
    let span = (INV_SECTION.1 - INV_SECTION.0) as usize;
    graphics.set_bytes("InvCursor", vec![0x11; span + 16]).unwrap();

    assert!(!graphics.will_fit_in_rom(&rom));
    let err = graphics.inject_into_rom(&mut rom).unwrap_err();
    assert!(matches!(err, DataError::CapacityOverflow { .. }));
    assert_eq!(rom, before);
    assert_eq!(graphics.state(), ManagerState::Failed);
    assert!(graphics.has_been_modified());
}

#[test]
fn test_offset_reference_past_address_space() {
    let mut layout = fixture_layout();
    let rom = rom(&layout);
    let extra = layout
        .graphics
        .inventory
        .assets
        .iter_mut()
        .flat_map(|asset| asset.extra_refs.iter_mut())
        .next()
        .unwrap();
    extra.offset = u32::MAX;
    let label = extra.label.clone();

    let mut graphics = load(&layout, &rom);
    assert!(matches!(
        graphics.refresh_pending_writes(&rom),
        Err(DataError::CapacityOverflow { target, .. }) if target == label
    ));
}

#[test]
fn test_project_round_trip() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let mut graphics = load(&layout, &rom);
    graphics.set_system_string(0, "LICENSED; \"QUOTED\" TEXT").unwrap();

    let dir = TempDir::new().unwrap();
    let root = save_project(&mut graphics, dir.path());
    assert_eq!(graphics.state(), ManagerState::Saved);
    assert!(dir.path().join("assets_packed/graphics/fonts/sysfont.bin").exists());

    let reloaded = GraphicsData::load(Source::Project(&root), &layout.graphics).unwrap();
    assert_eq!(reloaded.system_strings(), graphics.system_strings());
    assert_eq!(reloaded.core().base_path().unwrap(), dir.path());
    for entry in graphics.assets() {
        let other = reloaded.entry(entry.name()).unwrap();
        assert_eq!(other.bytes(), entry.bytes(), "{}", entry.name());
        assert_eq!(other.path(), entry.path());
        assert_eq!(other.kind(), entry.kind());
        assert_eq!(other.start_address(), None);
    }

    // A project-loaded manager injects like a ROM-loaded one
    let mut patched = rom.clone();
    let mut reloaded = reloaded;
    reloaded.inject_into_rom(&mut patched).unwrap();
    assert_eq!(load(&layout, &patched).system_strings(), graphics.system_strings());
}

#[test]
fn test_project_missing_asset() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let mut graphics = load(&layout, &rom);
    let dir = TempDir::new().unwrap();
    let root = save_project(&mut graphics, dir.path());

    // Drop the inventory section from the root file
    let mut trimmed = AsmFile::new();
    trimmed
        .label(&layout.graphics.region_check.label)
        .include(&layout.graphics.region_check.file, FileType::Assembler);
    trimmed.write_file(&root).unwrap();

    assert!(matches!(
        GraphicsData::load(Source::Project(&root), &layout.graphics),
        Err(DataError::MissingAsset(label)) if label == "InvGraphicsSection"
    ));
}

#[test]
fn test_save_to_base_requires_project() {
    let layout = fixture_layout();
    let rom = rom(&layout);
    let mut graphics = load(&layout, &rom);
    assert!(matches!(graphics.save_to_base(), Err(DataError::MissingAsset(_))));
}
