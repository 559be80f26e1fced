//! Bit-packed record codecs
//!
//! Fixed-size records hand-packed by the game's developers. Decoding never
//! fails; encoding masks every field to its declared width so that
//! `unpack(pack(r)) == r` whenever the fields are in range.

mod destination;
mod door;
mod room;
mod table;
mod tile_swap;

pub use destination::{Destination, DestinationTable};
pub use door::{Door, DoorSize};
pub use room::RoomParams;
pub use table::{EncodedTable, RoomRecordTable};
pub use tile_swap::{SwapMode, SwapRegion, TileSwap};

/// A record with a fixed packed size.
pub trait PackedRecord: Sized {
    /// Packed size in bytes
    const SIZE: usize;

    /// Decode from the first `SIZE` bytes of `bytes`.
    fn unpack(bytes: &[u8]) -> Self;

    /// Encode into the first `SIZE` bytes of `out`.
    fn pack_into(&self, out: &mut [u8]);

    fn pack(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE];
        self.pack_into(&mut out);
        out
    }

    /// Decode consecutive records. Trailing bytes short of a record are ignored.
    fn unpack_all(bytes: &[u8]) -> Vec<Self> {
        bytes.chunks_exact(Self::SIZE).map(Self::unpack).collect()
    }

    fn pack_all(records: &[Self]) -> Vec<u8> {
        let mut out = vec![0u8; records.len() * Self::SIZE];
        for (record, chunk) in records.iter().zip(out.chunks_exact_mut(Self::SIZE)) {
            record.pack_into(chunk);
        }
        out
    }
}
