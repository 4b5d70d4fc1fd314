/*!
    64 bits 1-Wire ROM code identifying a device on the bus

    on the wire the family code comes first, then the 6 bytes serial number least significant byte first, then the CRC of the 7 previous bytes
*/

use core::fmt;
use bilge::prelude::*;

use crate::{
    crc::checksum,
    command::FAMILY_CODE,
    };


/// size of a ROM code on the wire
pub const ROM_SIZE: usize = 8;

#[bitsize(64)]
#[derive(Copy, Clone, FromBits, DebugBits, PartialEq, Eq, Hash)]
pub struct Rom {
    /// kind of device, [FAMILY_CODE] for GPIO responders
    pub family: u8,
    /// unique number of this device in its family
    pub serial: u48,
    /// checksum of family and serial
    pub crc: u8,
}

impl Rom {
    /// build a ROM code from its identifier, computing its checksum
    pub fn from_id(family: u8, serial: [u8; 6]) -> Self {
        let mut bytes = [0; ROM_SIZE];
        bytes[0] = family;
        bytes[1 .. 7].copy_from_slice(&serial);
        bytes[7] = checksum(&bytes[.. 7]);
        Self::from_bytes(bytes)
    }
    /// ROM code of a GPIO responder with the given serial number
    pub fn responder(serial: [u8; 6]) -> Self {
        Self::from_id(FAMILY_CODE, serial)
    }
    pub fn from_bytes(bytes: [u8; ROM_SIZE]) -> Self {
        Self::from(u64::from_le_bytes(bytes))
    }
    /// bytes in the order they travel on the bus
    pub fn to_bytes(self) -> [u8; ROM_SIZE] {
        u64::from(self).to_le_bytes()
    }
    /// true when the trailing checksum matches
    pub fn is_valid(self) -> bool {
        checksum(&self.to_bytes()) == 0
    }
}

impl fmt::Display for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
/// parse the hexadecimal form given by [Display](fmt::Display)
impl TryFrom<&str> for Rom {
    type Error = &'static str;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 2*ROM_SIZE || !value.bytes().all(|b| b.is_ascii_hexdigit())
            {return Err("ROM code must be 16 hexadecimal digits");}
        let mut bytes = [0; ROM_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&value[2*i ..][.. 2], 16)
                .map_err(|_| "invalid hexadecimal digit in ROM code")?;
        }
        Ok(Self::from_bytes(bytes))
    }
}
