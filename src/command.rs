use bilge::prelude::*;
use packbytes::{FromBytes, ToBytes};

use crate::crc::checksum;


/// family code announced in the ROM of GPIO responders
pub const FAMILY_CODE: u8 = 0xc4;
/// size of a complete transaction: command, up to 7 bytes of payload, checksum
pub const FRAME: usize = 9;
/// largest payload a command can carry
pub const MAX_PAYLOAD: usize = FRAME - 2;

/// marker of the short answer to commands that return no data
pub const SUCCESS: u8 = 0xee;
/// checksum of [SUCCESS] alone
pub const SUCCESS_CRC: u8 = 0xf6;
/// marker of the optional answer to requests failing their checksum
pub const NACK: u8 = 0xe1;
/// checksum of [NACK] alone
pub const NACK_CRC: u8 = 0xb7;

/// 1-Wire ROM command selecting one device by its ROM code
pub const MATCH_ROM: u8 = 0x55;
/// 1-Wire ROM command addressing the only device on the bus
pub const SKIP_ROM: u8 = 0xcc;


/// command opening a transaction
#[bitsize(8)]
#[derive(Copy, Clone, FromBits, Debug, PartialEq)]
pub enum Opcode {
    /// set the mode of a pin
    PinMode = 0x10,
    /// read a digital pin
    DigitalRead = 0x22,
    /// write a digital pin
    DigitalWrite = 0x32,
    /// read an analog input
    AnalogRead = 0x44,
    /// set the PWM duty of a pin
    AnalogWrite = 0x54,
    /// number of digital pins
    DigitalPins = 0xaa,
    /// number of analog inputs
    AnalogPins = 0xbc,
    /// store 7 bytes in the scratchpad
    WriteScratchpad = 0x4e,
    /// read back the whole scratchpad
    ReadScratchpad = 0xbe,
    /// version of the responder firmware
    ReadVersion = 0xce,
    /// any byte that is not a known command
    #[fallback]
    Unknown = 0x00,
}

/// shape of the answer to a valid request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// [SUCCESS] followed by [SUCCESS_CRC]
    Success,
    /// the full scratchpad with a fresh checksum
    Scratchpad,
}

impl Opcode {
    /// number of payload bytes following this command, `None` for unknown commands
    pub const fn payload_len(self) -> Option<usize> {
        match self {
            Self::PinMode => Some(2),
            Self::DigitalRead | Self::AnalogRead => Some(1),
            Self::DigitalWrite | Self::AnalogWrite => Some(3),
            Self::DigitalPins | Self::AnalogPins => Some(0),
            Self::WriteScratchpad => Some(MAX_PAYLOAD),
            Self::ReadScratchpad | Self::ReadVersion => Some(0),
            Self::Unknown => None,
        }
    }
    /// answer sent back once the command is executed
    pub const fn answer(self) -> Option<Answer> {
        match self {
            Self::PinMode
            | Self::DigitalWrite
            | Self::AnalogWrite
            | Self::WriteScratchpad => Some(Answer::Success),
            Self::DigitalRead
            | Self::AnalogRead
            | Self::DigitalPins
            | Self::AnalogPins
            | Self::ReadScratchpad
            | Self::ReadVersion => Some(Answer::Scratchpad),
            Self::Unknown => None,
        }
    }
}
impl Answer {
    /// number of bytes of this answer on the wire
    pub const fn len(self) -> usize {
        match self {
            Self::Success => 2,
            Self::Scratchpad => FRAME,
        }
    }
}

/// arguments of [Opcode::PinMode]
#[derive(Copy, Clone, FromBytes, ToBytes, Debug, Default, PartialEq)]
pub struct PinModeArgs {
    pub pin: u8,
    /// platform specific mode, see [PinMode] for the common ones
    pub mode: u8,
}

/// arguments of [Opcode::DigitalWrite] and [Opcode::AnalogWrite]
#[derive(Copy, Clone, FromBytes, ToBytes, Debug, Default, PartialEq)]
pub struct PinWrite {
    pub pin: u8,
    /// logic level or PWM duty, big endian on the wire
    pub value: u16,
}

/// usual pin modes of arduino-like platforms
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input = 0,
    Output = 1,
    InputPullup = 2,
}
impl From<PinMode> for u8 {
    fn from(mode: PinMode) -> u8 {
        mode as u8
    }
}


/// request frame as sent by a controller: command, payload, checksum
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    opcode: Opcode,
    frame: heapless::Vec<u8, FRAME>,
}
impl Request {
    /// build a request, the payload size must match what the command expects
    pub fn new(opcode: Opcode, payload: &[u8]) -> Result<Self, &'static str> {
        let expected = opcode.payload_len().ok_or("unknown command")?;
        if payload.len() != expected
            {return Err("payload size does not match command");}
        let mut frame = heapless::Vec::new();
        frame.push(u8::from(opcode)) .map_err(|_| "frame overflow")?;
        frame.extend_from_slice(payload) .map_err(|_| "frame overflow")?;
        frame.push(checksum(&frame)) .map_err(|_| "frame overflow")?;
        Ok(Self {opcode, frame})
    }
    pub fn opcode(&self) -> Opcode {self.opcode}
    /// bytes to put on the bus
    pub fn as_bytes(&self) -> &[u8] {&self.frame}
}
