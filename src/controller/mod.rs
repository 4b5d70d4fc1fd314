/*!
    controller side of the GPIO protocol, running on the bus master in a `std` environment.

    The central resource is the [Controller] struct which owns the 1-Wire [Bus] and performs the exchanges, retrying corrupted ones.

    - methods at [Controller] level take the ROM of the device to address, or `None` when a single device is on the bus
    - for repeated access to one device, use [Device] which remembers its ROM and pin counts and checks pin numbers before sending anything
*/

/// implementation of the bus exchanges and retries
mod networking;
/// convenient methods for each command
mod accessing;
/// discovery of the responders on the bus
mod scanning;


pub use networking::Controller;
pub use accessing::*;

use std::{
    io,
    time::Duration,
    vec::Vec,
    };
use thiserror::Error;

use crate::rom::Rom;


/// error regarding communication with a responder
#[derive(Error, Debug)]
pub enum Error {
    #[error("problem with onewire bus")]
    Bus(io::Error),
    #[error("no device answered the reset pulse")]
    NoPresence,
    #[error("answer checksum mismatch")]
    Checksum,
    #[error("device reported a checksum mismatch in the request")]
    Rejected,
    #[error("answer does not belong to the request")]
    Mismatch,
    #[error("pin {pin} out of range, device has {available}")]
    PinRange { pin: u8, available: u8 },
    #[error("missing {0} devices")]
    Missing(usize),
    #[error("problem detected on controller side")]
    Controller(&'static str),
}
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Bus(error)
    }
}

/**
    1-Wire bus master primitives

    reset, ROM selection and bit timings are the business of the implementation, typically a bus master chip or a bit-banged pin
*/
#[allow(async_fn_in_trait)]
pub trait Bus {
    /// send a reset pulse, return true if some device answered with a presence pulse
    async fn reset(&mut self) -> io::Result<bool>;
    /// write bytes on the bus
    async fn write(&mut self, data: &[u8]) -> io::Result<()>;
    /// read bytes from the bus, an idle bus reads as `0xff`
    async fn read(&mut self, data: &mut [u8]) -> io::Result<()>;
    /// search ROM codes of all devices on the bus
    async fn search(&mut self) -> io::Result<Vec<Rom>>;
}

/// devices a scan is expected to find
#[derive(Clone, Debug, PartialEq)]
pub enum Expected {
    /// some number of GPIO responders
    Count(usize),
    /// these exact responders
    Roms(Vec<Rom>),
}

/// controller settings
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// number of tries of one exchange before giving up
    pub attempts: usize,
    /// pause between two tries
    pub retry_delay: Duration,
    /// devices expected on the bus, used to warn about missing ones
    pub expected: Option<Expected>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            attempts: 4,
            retry_delay: Duration::from_millis(10),
            expected: None,
        }
    }
}
impl Config {
    pub fn with_attempts(self, attempts: usize) -> Self {
        Self {attempts, ..self}
    }
    pub fn with_retry_delay(self, retry_delay: Duration) -> Self {
        Self {retry_delay, ..self}
    }
    pub fn with_expected(self, expected: Expected) -> Self {
        Self {expected: Some(expected), ..self}
    }
}
