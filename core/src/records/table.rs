//! Per-room record tables.
//!
//! A table is stored as two blobs: `room_count + 1` big-endian byte offsets,
//! then a stream of packed records. Room `i` owns the records between
//! `offsets[i]` and `offsets[i + 1]`.

use byteorder::{BigEndian, ByteOrder};

use super::PackedRecord;
use crate::error::{DataError, Result};

/// Encoded form of a [`RoomRecordTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTable {
    pub offsets: Vec<u8>,
    pub records: Vec<u8>,
}

/// Records grouped by room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecordTable<R> {
    rooms: Vec<Vec<R>>,
}

impl<R: PackedRecord + Clone> RoomRecordTable<R> {
    /// Table with no records for each of `room_count` rooms.
    pub fn new(room_count: usize) -> Self {
        Self {
            rooms: vec![Vec::new(); room_count],
        }
    }

    /// Size in bytes of the offsets blob for `room_count` rooms.
    pub fn offsets_len(room_count: usize) -> usize {
        (room_count + 1) * 2
    }

    /// Stream length declared by an offsets blob (its final entry).
    pub fn declared_stream_len(offsets: &[u8], room_count: usize) -> Result<usize> {
        let expected = Self::offsets_len(room_count);
        if offsets.len() < expected {
            return Err(DataError::size_mismatch(
                "record offsets",
                format!("{expected} bytes"),
                offsets.len(),
            ));
        }
        Ok(usize::from(BigEndian::read_u16(&offsets[expected - 2..expected])))
    }

    /// Decode a table from its offsets and record stream.
    pub fn decode(offsets: &[u8], records: &[u8], room_count: usize) -> Result<Self> {
        Self::declared_stream_len(offsets, room_count)?;

        let bounds: Vec<usize> = offsets[..Self::offsets_len(room_count)]
            .chunks_exact(2)
            .map(|w| usize::from(BigEndian::read_u16(w)))
            .collect();

        let mut rooms = Vec::with_capacity(room_count);
        for (room, pair) in bounds.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            if start > end || end > records.len() || (end - start) % R::SIZE != 0 {
                return Err(DataError::size_mismatch(
                    format!("records for room {room}"),
                    format!("a multiple of {} bytes within {} bytes", R::SIZE, records.len()),
                    end.saturating_sub(start),
                ));
            }
            rooms.push(R::unpack_all(&records[start..end]));
        }
        Ok(Self { rooms })
    }

    /// Encode the table. Fails if the stream outgrows 16-bit offsets.
    pub fn encode(&self) -> Result<EncodedTable> {
        let mut offsets = Vec::with_capacity(Self::offsets_len(self.rooms.len()));
        let mut records = Vec::new();
        for room in &self.rooms {
            offsets.extend_from_slice(&stream_offset(records.len())?.to_be_bytes());
            records.extend_from_slice(&R::pack_all(room));
        }
        offsets.extend_from_slice(&stream_offset(records.len())?.to_be_bytes());
        Ok(EncodedTable { offsets, records })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn for_room(&self, room: usize) -> Result<&[R]> {
        self.rooms
            .get(room)
            .map(Vec::as_slice)
            .ok_or(DataError::InvalidIndex {
                index: room,
                count: self.rooms.len(),
            })
    }

    pub fn set_room(&mut self, room: usize, records: Vec<R>) -> Result<()> {
        let count = self.rooms.len();
        let slot = self
            .rooms
            .get_mut(room)
            .ok_or(DataError::InvalidIndex { index: room, count })?;
        *slot = records;
        Ok(())
    }
}

fn stream_offset(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| DataError::CapacityOverflow {
        target: "record offsets".into(),
        needed: len,
        available: usize::from(u16::MAX),
    })
}
