//! Tile swap record.

use byteorder::{BigEndian, ByteOrder};

use super::PackedRecord;

/// Rectangle copied from `src` to `dst` when a swap triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SwapRegion {
    pub src_x: u8,
    pub src_y: u8,
    pub dst_x: u8,
    pub dst_y: u8,
    pub width: u8,
    pub height: u8,
}

impl SwapRegion {
    const SIZE: usize = 6;

    fn unpack(bytes: &[u8]) -> Self {
        Self {
            src_x: bytes[0],
            src_y: bytes[1],
            dst_x: bytes[2],
            dst_y: bytes[3],
            width: bytes[4],
            height: bytes[5],
        }
    }

    fn pack_into(&self, out: &mut [u8]) {
        out[..Self::SIZE].copy_from_slice(&[
            self.src_x,
            self.src_y,
            self.dst_x,
            self.dst_y,
            self.width,
            self.height,
        ]);
    }
}

/// Which layer a swap edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapMode {
    #[default]
    Block,
    Wall,
    Floor,
    Reserved,
}

impl SwapMode {
    const MASK: u16 = 0x0003;

    fn from_bits(bits: u16) -> Self {
        match bits & Self::MASK {
            0 => SwapMode::Block,
            1 => SwapMode::Wall,
            2 => SwapMode::Floor,
            _ => SwapMode::Reserved,
        }
    }

    fn bits(self) -> u16 {
        self as u16
    }
}

/// A tile swap: map and heightmap regions plus the mode word.
///
/// Only the low two bits of the mode word are interpreted; the remaining bits
/// are kept in `flags` and written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileSwap {
    pub map: SwapRegion,
    pub heightmap: SwapRegion,
    pub mode: SwapMode,
    /// Mode word with the mode bits cleared
    pub flags: u16,
}

impl PackedRecord for TileSwap {
    const SIZE: usize = 14;

    fn unpack(bytes: &[u8]) -> Self {
        let word = BigEndian::read_u16(&bytes[12..14]);
        Self {
            map: SwapRegion::unpack(&bytes[0..6]),
            heightmap: SwapRegion::unpack(&bytes[6..12]),
            mode: SwapMode::from_bits(word),
            flags: word & !SwapMode::MASK,
        }
    }

    fn pack_into(&self, out: &mut [u8]) {
        self.map.pack_into(&mut out[0..6]);
        self.heightmap.pack_into(&mut out[6..12]);
        BigEndian::write_u16(&mut out[12..14], (self.flags & !SwapMode::MASK) | self.mode.bits());
    }
}
