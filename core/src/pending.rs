//! Staged ROM patches.
//!
//! Managers never write to a ROM directly. They describe their injection as a
//! list of [`PendingWrite`]s, which are checked as a batch and applied only if
//! every one of them fits.

use std::fmt;

use landstalker_shared::AddressRegister;

use crate::error::{DataError, Result};
use crate::relocate;
use crate::rom::Rom;

/// Where a pending write lands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    /// A section (written at its start, fenced by its end) or an address
    /// label (fenced by the end of the image)
    Label(String),
    Address(u32),
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteTarget::Label(label) => f.write_str(label),
            WriteTarget::Address(address) => write!(f, "{address:#08X}"),
        }
    }
}

/// Bytes staged for a location in the ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub target: WriteTarget,
    pub bytes: Vec<u8>,
}

impl PendingWrite {
    pub fn to_label(label: &str, bytes: Vec<u8>) -> Self {
        Self {
            target: WriteTarget::Label(label.to_string()),
            bytes,
        }
    }

    pub fn to_address(address: u32, bytes: Vec<u8>) -> Self {
        Self {
            target: WriteTarget::Address(address),
            bytes,
        }
    }

    /// Re-encode the `LEA` at `label` so that it loads `data_address`.
    pub fn lea(rom: &Rom, label: &str, register: AddressRegister, data_address: u32) -> Result<Self> {
        let symbol = rom.get_address(label)?;
        let instruction = relocate::encode(register, symbol, data_address)?;
        Ok(Self::to_label(label, instruction.to_be_bytes().to_vec()))
    }

    /// Start offset and exclusive limit of the region this write may use.
    fn region(&self, rom: &Rom) -> Result<(u32, usize)> {
        let image_end = rom.len();
        match &self.target {
            WriteTarget::Label(label) => match rom.symbols().section(label) {
                Some(section) => Ok((section.begin, (section.end as usize).min(image_end))),
                None => Ok((rom.get_address(label)?, image_end)),
            },
            WriteTarget::Address(address) => Ok((*address, image_end)),
        }
    }
}

/// Ordered batch of writes produced by one refresh.
pub type PendingWrites = Vec<PendingWrite>;

/// Verify that every write fits its section or the image.
pub fn check_fit(writes: &[PendingWrite], rom: &Rom) -> Result<()> {
    for write in writes {
        let (start, limit) = write.region(rom)?;
        let available = limit.saturating_sub(start as usize);
        if write.bytes.len() > available {
            return Err(DataError::CapacityOverflow {
                target: write.target.to_string(),
                needed: write.bytes.len(),
                available,
            });
        }
    }
    Ok(())
}

/// Check the whole batch, then apply it. On error nothing has been written.
pub fn apply_all(writes: &[PendingWrite], rom: &mut Rom) -> Result<()> {
    check_fit(writes, rom)?;
    for write in writes {
        let (start, _) = write.region(rom)?;
        rom.write_bytes(start, &write.bytes)?;
    }
    Ok(())
}

/// Lays assets out back to back from a base address.
#[derive(Debug, Clone)]
pub struct SectionWriter {
    base: u32,
    bytes: Vec<u8>,
}

impl SectionWriter {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            bytes: Vec::new(),
        }
    }

    /// Address the next byte will land at.
    pub fn cursor(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }

    /// Append `bytes` and return the address they start at.
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let address = self.cursor();
        self.bytes.extend_from_slice(bytes);
        address
    }

    /// Pad with `fill` until the cursor is a multiple of `alignment`.
    pub fn align(&mut self, alignment: u32, fill: u8) {
        while alignment > 1 && self.cursor() % alignment != 0 {
            self.bytes.push(fill);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landstalker_shared::SymbolTable;

    fn rom() -> Rom {
        let mut symbols = SymbolTable::new();
        symbols
            .insert_address("Code", 0x100)
            .insert_section("Data", 0x1000, 0x1800);
        Rom::new(vec![0; 0x2000], symbols)
    }

    #[test]
    fn test_section_write_fits_exactly() {
        let mut rom = rom();
        let writes = vec![PendingWrite::to_label("Data", vec![0xAA; 0x800])];
        apply_all(&writes, &mut rom).unwrap();
        assert_eq!(rom.as_bytes()[0x1000], 0xAA);
        assert_eq!(rom.as_bytes()[0x17FF], 0xAA);
        assert_eq!(rom.as_bytes()[0x1800], 0x00);
    }

    #[test]
    fn test_section_overflow_rejects_batch() {
        let mut rom = rom();
        let before = rom.clone();
        let writes = vec![
            PendingWrite::to_label("Code", vec![1, 2, 3, 4]),
            PendingWrite::to_label("Data", vec![0xAA; 0x900]),
        ];

        let err = check_fit(&writes, &rom).unwrap_err();
        assert!(matches!(
            err,
            DataError::CapacityOverflow { needed: 0x900, available: 0x800, .. }
        ));
        assert!(apply_all(&writes, &mut rom).is_err());
        assert_eq!(rom, before);
    }

    #[test]
    fn test_address_writes_are_fenced_by_image() {
        let rom = rom();
        assert!(check_fit(&[PendingWrite::to_address(0x1FFC, vec![0; 4])], &rom).is_ok());
        assert!(check_fit(&[PendingWrite::to_address(0x1FFD, vec![0; 4])], &rom).is_err());
        assert!(check_fit(&[PendingWrite::to_address(0x3000, vec![0; 1])], &rom).is_err());
        assert!(matches!(
            check_fit(&[PendingWrite::to_label("Nowhere", vec![0])], &rom),
            Err(DataError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_lea_write() {
        let mut rom = rom();
        let write = PendingWrite::lea(&rom, "Code", AddressRegister::A1, 0x1000).unwrap();
        assert_eq!(write.bytes, vec![0x43, 0xFA, 0x0F, 0x00]);
        apply_all(&[write], &mut rom).unwrap();
        assert_eq!(rom.lea_target("Code").unwrap(), 0x1000);
    }

    #[test]
    fn test_section_writer() {
        let mut writer = SectionWriter::new(0x1000);
        assert_eq!(writer.push(&[1, 2, 3]), 0x1000);
        writer.align(2, 0xFF);
        assert_eq!(writer.push(&[4]), 0x1004);
        assert_eq!(writer.cursor(), 0x1005);
        assert_eq!(writer.into_bytes(), vec![1, 2, 3, 0xFF, 4]);
    }
}
