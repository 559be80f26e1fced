//! Byte-addressable ROM image with symbol resolution.
//!
//! All multi-byte values on the cartridge are big-endian. Reads and writes
//! accept either a raw offset or a label resolved through the image's
//! [`SymbolTable`].

use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use landstalker_shared::fs::{MAX_ROM_BYTES, read_file_with_limit, write_file_atomic};
use landstalker_shared::{Section, SymbolTable};

use crate::error::{DataError, Result};
use crate::relocate;

/// A fixed-width value that can be read from (and written to) the image.
pub trait RomValue: Copy {
    const SIZE: usize;

    fn read_be(bytes: &[u8]) -> Self;
    fn write_be(self, out: &mut [u8]);
}

impl RomValue for u8 {
    const SIZE: usize = 1;

    fn read_be(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_be(self, out: &mut [u8]) {
        out[0] = self;
    }
}

impl RomValue for i8 {
    const SIZE: usize = 1;

    fn read_be(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_be(self, out: &mut [u8]) {
        out[0] = self as u8;
    }
}

macro_rules! impl_rom_value {
    ($ty:ty, $size:expr, $read:ident, $write:ident) => {
        impl RomValue for $ty {
            const SIZE: usize = $size;

            fn read_be(bytes: &[u8]) -> Self {
                BigEndian::$read(bytes)
            }

            fn write_be(self, out: &mut [u8]) {
                BigEndian::$write(out, self)
            }
        }
    };
}

impl_rom_value!(u16, 2, read_u16, write_u16);
impl_rom_value!(i16, 2, read_i16, write_i16);
impl_rom_value!(u32, 4, read_u32, write_u32);
impl_rom_value!(i32, 4, read_i32, write_i32);

/// Where to read from: a raw offset or a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    Offset(u32),
    Label(&'a str),
}

impl From<u32> for Location<'_> {
    fn from(offset: u32) -> Self {
        Location::Offset(offset)
    }
}

impl<'a> From<&'a str> for Location<'a> {
    fn from(label: &'a str) -> Self {
        Location::Label(label)
    }
}

impl<'a> From<&'a String> for Location<'a> {
    fn from(label: &'a String) -> Self {
        Location::Label(label.as_str())
    }
}

/// In-memory ROM image plus the symbol table describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rom {
    data: Vec<u8>,
    symbols: SymbolTable,
}

impl Rom {
    pub fn new(data: Vec<u8>, symbols: SymbolTable) -> Self {
        Self { data, symbols }
    }

    /// Read a ROM image from disk.
    pub fn load(path: &Path, symbols: SymbolTable) -> Result<Self> {
        let data =
            read_file_with_limit(path, MAX_ROM_BYTES).map_err(|e| DataError::io(path, e))?;
        tracing::info!(path = %path.display(), size = data.len(), "Loaded ROM image");
        Ok(Self::new(data, symbols))
    }

    /// Write the image back to disk atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_file_atomic(path, &self.data).map_err(|e| DataError::io(path, e))?;
        tracing::info!(path = %path.display(), size = self.data.len(), "Saved ROM image");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Address bound to `label`.
    pub fn get_address(&self, label: &str) -> Result<u32> {
        self.symbols
            .address(label)
            .ok_or_else(|| DataError::UnknownSymbol(label.to_string()))
    }

    /// Section bound to `label`.
    pub fn get_section(&self, label: &str) -> Result<Section> {
        self.symbols
            .section(label)
            .ok_or_else(|| DataError::UnknownSymbol(label.to_string()))
    }

    /// Resolve a location to an offset.
    pub fn resolve<'a>(&self, location: impl Into<Location<'a>>) -> Result<u32> {
        match location.into() {
            Location::Offset(offset) => Ok(offset),
            Location::Label(label) => self.get_address(label),
        }
    }

    /// Borrow everything from `offset` to the end of the image.
    pub fn data(&self, offset: u32) -> Result<&[u8]> {
        self.data
            .get(offset as usize..)
            .ok_or_else(|| self.out_of_range(offset, 0))
    }

    /// Borrow `len` bytes at `offset`.
    pub fn read_bytes(&self, offset: u32, len: usize) -> Result<&[u8]> {
        let start = offset as usize;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| self.out_of_range(offset, len))
    }

    /// Read one big-endian value.
    pub fn read<'a, T: RomValue>(&self, location: impl Into<Location<'a>>) -> Result<T> {
        let offset = self.resolve(location)?;
        Ok(T::read_be(self.read_bytes(offset, T::SIZE)?))
    }

    /// Read `count` consecutive big-endian values.
    pub fn read_array<'a, T: RomValue>(
        &self,
        location: impl Into<Location<'a>>,
        count: usize,
    ) -> Result<Vec<T>> {
        let offset = self.resolve(location)?;
        let len = count
            .checked_mul(T::SIZE)
            .ok_or_else(|| self.out_of_range(offset, usize::MAX))?;
        let bytes = self.read_bytes(offset, len)?;
        Ok(bytes.chunks_exact(T::SIZE).map(T::read_be).collect())
    }

    /// Read a zero-terminated string. Bytes map one-to-one onto characters.
    pub fn read_string<'a>(&self, location: impl Into<Location<'a>>) -> Result<String> {
        let offset = self.resolve(location)?;
        let tail = self.data(offset)?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.out_of_range(offset, tail.len() + 1))?;
        Ok(decode_string(&tail[..end]))
    }

    /// Follow the PC-relative `LEA` stored at `label` to the address it loads.
    pub fn lea_target(&self, label: &str) -> Result<u32> {
        let pc = self.get_address(label)?;
        let instruction = self.read::<u32>(pc)?;
        Ok(relocate::decode(instruction, pc))
    }

    /// Overwrite bytes at `offset`. Fails without writing if any byte falls
    /// outside the image.
    pub fn write_bytes(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let start = offset as usize;
        let size = self.data.len();
        let dest = start
            .checked_add(bytes.len())
            .and_then(|end| self.data.get_mut(start..end))
            .ok_or(DataError::OutOfRange {
                offset,
                len: bytes.len(),
                size,
            })?;
        dest.copy_from_slice(bytes);
        Ok(())
    }

    /// Write one big-endian value.
    pub fn write<'a, T: RomValue>(
        &mut self,
        location: impl Into<Location<'a>>,
        value: T,
    ) -> Result<()> {
        let offset = self.resolve(location)?;
        let mut buf = [0u8; 4];
        value.write_be(&mut buf[..T::SIZE]);
        self.write_bytes(offset, &buf[..T::SIZE])
    }

    fn out_of_range(&self, offset: u32, len: usize) -> DataError {
        DataError::OutOfRange {
            offset,
            len,
            size: self.data.len(),
        }
    }
}

/// Decode game text. Every byte is one character.
pub fn decode_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode game text, one byte per character. The result is not terminated.
///
/// Text is stored zero-terminated, so NUL is rejected along with characters
/// that have no single-byte form.
pub fn encode_string(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .ok()
                .filter(|&b| b != 0)
                .ok_or_else(|| DataError::Unencodable {
                    text: text.to_string(),
                    character: c,
                })
        })
        .collect()
}
