/*!
    8 bits checksum used by every frame on the bus

    this is the usual Dallas/Maxim 1-Wire CRC, the same that protects ROM codes. Appending the checksum of a message to itself gives a message whose checksum is zero, which is how received frames are validated.
*/

use ::crc::{Crc, CRC_8_MAXIM_DOW};

const MAXIM: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// checksum of the given bytes
pub fn checksum(bytes: &[u8]) -> u8 {
    MAXIM.checksum(bytes)
}

/// true if the bytes end with their own valid checksum
pub fn is_valid(frame: &[u8]) -> bool {
    checksum(frame) == 0
}
