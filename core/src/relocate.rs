//! PC-relative `LEA` encoding.
//!
//! Assets are referenced from code through `LEA (d16,PC),An`. The instruction
//! is one opcode word followed by a signed 16-bit displacement, so the pair is
//! read and written as a single big-endian long:
//!
//! ```text
//! 0100 rrr1 1111 1010 dddd dddd dddd dddd
//!      An              displacement
//! ```
//!
//! The displacement is measured from the address of the instruction itself.

use landstalker_shared::AddressRegister;

use crate::error::{DataError, Result};

/// Opcode word of `LEA (d16,PC),A0`.
pub const LEA_PC_RELATIVE: u16 = 0x41FA;

/// Register field mask within the opcode word.
const REGISTER_MASK: u16 = 0x0E00;

/// Target address of the `LEA` found at `pc`.
pub fn decode(instruction: u32, pc: u32) -> u32 {
    let displacement = instruction as u16 as i16;
    pc.wrapping_add_signed(i32::from(displacement))
}

/// Encode `LEA (data_address - symbol_address, PC), register`.
pub fn encode(register: AddressRegister, symbol_address: u32, data_address: u32) -> Result<u32> {
    let delta = i64::from(data_address) - i64::from(symbol_address);
    if !(-i64::from(i16::MAX)..=i64::from(i16::MAX)).contains(&delta) {
        return Err(DataError::DisplacementOverflow {
            symbol: symbol_address,
            data: data_address,
        });
    }
    let opcode = LEA_PC_RELATIVE | (register.index() << 9);
    Ok((u32::from(opcode) << 16) | u32::from(delta as i16 as u16))
}

/// Destination register of a PC-relative `LEA`, or `None` for any other
/// instruction.
pub fn register_of(instruction: u32) -> Option<AddressRegister> {
    let opcode = (instruction >> 16) as u16;
    if opcode & !REGISTER_MASK != LEA_PC_RELATIVE {
        return None;
    }
    AddressRegister::from_index((opcode & REGISTER_MASK) >> 9)
}
