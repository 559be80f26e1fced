//! Fall and climb destinations.

use byteorder::{BigEndian, ByteOrder};

use super::PackedRecord;

/// Table terminator, stored where the next source room would be.
pub const TERMINATOR: u16 = 0xFFFF;

/// Warp from one room to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Destination {
    pub source: u16,
    pub destination: u16,
}

impl PackedRecord for Destination {
    const SIZE: usize = 4;

    fn unpack(bytes: &[u8]) -> Self {
        Self {
            source: BigEndian::read_u16(&bytes[0..2]),
            destination: BigEndian::read_u16(&bytes[2..4]),
        }
    }

    fn pack_into(&self, out: &mut [u8]) {
        BigEndian::write_u16(&mut out[0..2], self.source);
        BigEndian::write_u16(&mut out[2..4], self.destination);
    }
}

/// A `0xFFFF`-terminated list of destination pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DestinationTable {
    entries: Vec<Destination>,
}

impl DestinationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode pairs up to the terminator or the end of `bytes`, whichever
    /// comes first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks(Destination::SIZE)
            .take_while(|chunk| chunk.len() >= 2 && BigEndian::read_u16(&chunk[0..2]) != TERMINATOR)
            .filter(|chunk| chunk.len() == Destination::SIZE)
            .map(Destination::unpack)
            .collect();
        Self { entries }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Destination::pack_all(&self.entries);
        out.extend_from_slice(&TERMINATOR.to_be_bytes());
        out
    }

    pub fn entries(&self) -> &[Destination] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destination for `source`, if the room has one.
    pub fn get(&self, source: u16) -> Option<u16> {
        self.entries
            .iter()
            .find(|e| e.source == source)
            .map(|e| e.destination)
    }

    /// Set or clear the destination for `source`. New entries are appended.
    pub fn set(&mut self, source: u16, destination: Option<u16>) {
        let existing = self.entries.iter().position(|e| e.source == source);
        match (existing, destination) {
            (Some(i), Some(destination)) => self.entries[i].destination = destination,
            (Some(i), None) => {
                self.entries.remove(i);
            }
            (None, Some(destination)) => self.entries.push(Destination {
                source,
                destination,
            }),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stops_at_terminator() {
        let bytes = [0x00, 0x10, 0x00, 0x20, 0x01, 0x00, 0x02, 0x00, 0xFF, 0xFF, 0x12, 0x34];
        let table = DestinationTable::from_bytes(&bytes);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0x10), Some(0x20));
        assert_eq!(table.get(0x100), Some(0x200));
        assert_eq!(table.get(0x11), None);
        assert_eq!(table.to_bytes(), bytes[..10]);
    }

    #[test]
    fn test_empty_table() {
        let table = DestinationTable::from_bytes(&[0xFF, 0xFF]);
        assert!(table.is_empty());
        assert_eq!(table.to_bytes(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_set_and_clear() {
        let mut table = DestinationTable::new();
        table.set(5, Some(6));
        table.set(7, Some(8));
        table.set(5, Some(9));
        assert_eq!(table.get(5), Some(9));
        table.set(5, None);
        assert_eq!(table.get(5), None);
        table.set(1, None);
        assert_eq!(table.entries(), &[Destination { source: 7, destination: 8 }]);

        let round_trip = DestinationTable::from_bytes(&table.to_bytes());
        assert_eq!(round_trip, table);
    }
}
