//! Door record.

use std::fmt;

use super::PackedRecord;

/// Door footprint, selected by the top two bits of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DoorSize {
    #[default]
    Door1x4,
    Door2x4,
    Door2x5,
    Door1x0,
}

impl DoorSize {
    pub const ALL: [DoorSize; 4] = [
        DoorSize::Door1x4,
        DoorSize::Door2x4,
        DoorSize::Door2x5,
        DoorSize::Door1x0,
    ];

    pub fn from_selector(selector: u8) -> Self {
        Self::ALL[usize::from(selector & 0x03)]
    }

    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Width and height in tiles.
    pub fn dimensions(self) -> (u8, u8) {
        match self {
            DoorSize::Door1x4 => (1, 4),
            DoorSize::Door2x4 => (2, 4),
            DoorSize::Door2x5 => (2, 5),
            DoorSize::Door1x0 => (1, 0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DoorSize::Door1x4 => "1x4 Door",
            DoorSize::Door2x4 => "2x4 Door",
            DoorSize::Door2x5 => "2x5 Door",
            DoorSize::Door1x0 => "1x0 Door",
        }
    }
}

impl fmt::Display for DoorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A door placed in a room.
///
/// ```text
/// byte 0: ss xxxxxx
/// byte 1: yyyyyyyy
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Door {
    pub x: u8,
    pub y: u8,
    pub size: DoorSize,
}

impl Door {
    pub fn new(x: u8, y: u8, size: DoorSize) -> Self {
        Self { x, y, size }
    }
}

impl PackedRecord for Door {
    const SIZE: usize = 2;

    fn unpack(bytes: &[u8]) -> Self {
        Self {
            x: bytes[0] & 0x3F,
            y: bytes[1],
            size: DoorSize::from_selector(bytes[0] >> 6),
        }
    }

    fn pack_into(&self, out: &mut [u8]) {
        out[0] = (self.size.selector() << 6) | (self.x & 0x3F);
        out[1] = self.y;
    }
}
