//! Palette byte formats.
//!
//! Each colour is one big-endian word laid out as `0000 BBB0 GGG0 RRR0`,
//! giving three bits per channel. Unused bits are dropped on decode, so
//! re-encoding a palette normalises them to zero.

use byteorder::{BigEndian, ByteOrder};
use landstalker_shared::PaletteType;

use crate::error::{DataError, Result};

/// One 9-bit colour. Channels range over 0-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_word(word: u16) -> Self {
        Self {
            r: ((word >> 1) & 0x07) as u8,
            g: ((word >> 5) & 0x07) as u8,
            b: ((word >> 9) & 0x07) as u8,
        }
    }

    pub fn to_word(self) -> u16 {
        (u16::from(self.b & 0x07) << 9) | (u16::from(self.g & 0x07) << 5) | (u16::from(self.r & 0x07) << 1)
    }
}

/// A decoded palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    kind: PaletteType,
    colours: Vec<Colour>,
}

impl Palette {
    /// Decode `bytes`, which must be exactly `kind.size_bytes()` long.
    pub fn from_bytes(bytes: &[u8], kind: PaletteType) -> Result<Self> {
        if bytes.len() != kind.size_bytes() {
            return Err(DataError::size_mismatch(
                "palette",
                format!("{} bytes", kind.size_bytes()),
                bytes.len(),
            ));
        }
        let colours = bytes
            .chunks_exact(2)
            .map(|word| Colour::from_word(BigEndian::read_u16(word)))
            .collect();
        Ok(Self { kind, colours })
    }

    pub fn kind(&self) -> PaletteType {
        self.kind
    }

    pub fn colours(&self) -> &[Colour] {
        &self.colours
    }

    /// Replace colour `index`.
    pub fn set_colour(&mut self, index: usize, colour: Colour) -> Result<()> {
        let count = self.colours.len();
        let slot = self
            .colours
            .get_mut(index)
            .ok_or(DataError::InvalidIndex { index, count })?;
        *slot = colour;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.colours.len() * 2];
        for (colour, word) in self.colours.iter().zip(out.chunks_exact_mut(2)) {
            BigEndian::write_u16(word, colour.to_word());
        }
        out
    }
}

/// Decode and re-encode palette bytes, clearing unused bits.
pub fn normalise(bytes: &[u8], kind: PaletteType) -> Result<Vec<u8>> {
    Palette::from_bytes(bytes, kind).map(|palette| palette.to_bytes())
}
