//! Room parameter record.

use super::PackedRecord;

/// Four bytes of per-room parameters.
///
/// ```text
/// byte 0: uu p ttttt   unknown1, pri_blockset, tileset
/// byte 1: uu pppppp    unknown2, room_palette
/// byte 2: zzzz zzzz    z_end, z_begin
/// byte 3: sss bbbbb    sec_blockset, bgm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoomParams {
    pub unknown1: u8,
    pub pri_blockset: u8,
    pub tileset: u8,
    pub unknown2: u8,
    pub room_palette: u8,
    pub z_end: u8,
    pub z_begin: u8,
    pub sec_blockset: u8,
    pub bgm: u8,
}

impl RoomParams {
    /// Combined primary blockset index used to look up the blockset.
    pub fn blockset_id(&self) -> u8 {
        ((self.pri_blockset & 0x01) << 5) | (self.tileset & 0x1F)
    }
}

impl PackedRecord for RoomParams {
    const SIZE: usize = 4;

    fn unpack(bytes: &[u8]) -> Self {
        Self {
            unknown1: bytes[0] >> 6,
            pri_blockset: (bytes[0] >> 5) & 0x01,
            tileset: bytes[0] & 0x1F,
            unknown2: bytes[1] >> 6,
            room_palette: bytes[1] & 0x3F,
            z_end: bytes[2] >> 4,
            z_begin: bytes[2] & 0x0F,
            sec_blockset: bytes[3] >> 5,
            bgm: bytes[3] & 0x1F,
        }
    }

    fn pack_into(&self, out: &mut [u8]) {
        out[0] = ((self.unknown1 & 0x03) << 6) | ((self.pri_blockset & 0x01) << 5) | (self.tileset & 0x1F);
        out[1] = ((self.unknown2 & 0x03) << 6) | (self.room_palette & 0x3F);
        out[2] = ((self.z_end & 0x0F) << 4) | (self.z_begin & 0x0F);
        out[3] = ((self.sec_blockset & 0x07) << 5) | (self.bgm & 0x1F);
    }
}
