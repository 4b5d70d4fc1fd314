/*!
    responder side: the command interpreter running on the microcontroller

    the 1-Wire hub handles reset, presence and ROM selection, then hands the bus over to [BusItem::duty] for one transaction. The responder reads the command, the payload and its checksum, acts on the GPIO and answers.
*/

use embedded_io::{Read, Write, ReadExactError};
use log::*;

use crate::{
    crc::is_valid,
    command::*,
    registers::{self, Scratchpad},
    rom::Rom,
    };


/// bus side of the responder, provided by the 1-Wire hub once this device is selected
pub trait Hub: Read + Write {
    /// account a command this responder does not know
    fn raise_slave_error(&mut self, command: u8);
}

/**
    pin access of the platform

    calls are expected to return quickly, their duration extends the transaction on the bus
*/
pub trait Gpio {
    /// number of digital pins of the platform
    const DIGITAL_PINS: u8;
    /// number of analog inputs of the platform
    const ANALOG_INPUTS: u8;

    fn set_pin_mode(&mut self, pin: u8, mode: u8);
    fn digital_read(&mut self, pin: u8) -> bool;
    fn digital_write(&mut self, pin: u8, value: u16);
    /// ADC reading, 10 or 12 bits depending on the platform
    fn analog_read(&mut self, pin: u8) -> u16;
    /// set the PWM duty of the pin
    fn analog_write(&mut self, pin: u8, duty: u16);
}

/// a device living on the bus, as seen by the hub
pub trait BusItem {
    fn rom(&self) -> Rom;
    /// process exactly one transaction
    fn duty<H: Hub>(&mut self, hub: &mut H) -> Result<Response, Fault<H::Error>>;
}


/// answer sent by a completed transaction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// short acknowledgment of an action
    Success,
    /// data carried by the scratchpad
    Scratchpad,
    /// request checksum failed and negative acknowledgment is enabled
    NegativeAck,
}

/// reason a transaction ended without its normal answer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault<E> {
    /// bus went quiet before the expected bytes arrived
    Underrun,
    /// error reported by the hub, usually loss of selection
    Transport(E),
    /// the request with this command failed its checksum
    Checksum(u8),
    /// this command is unknown, the hub has been notified
    UnknownCommand(u8),
}
impl<E> From<ReadExactError<E>> for Fault<E> {
    fn from(error: ReadExactError<E>) -> Self {
        match error {
            ReadExactError::UnexpectedEof => Self::Underrun,
            ReadExactError::Other(io) => Self::Transport(io),
        }
    }
}

/// responder settings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// firmware version answered to [Opcode::ReadVersion]
    pub version: u16,
    /// answer [NACK] to requests failing their checksum instead of staying silent
    pub negative_ack: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            version: 100,
            negative_ack: false,
        }
    }
}
impl Config {
    pub fn with_version(self, version: u16) -> Self {
        Self {version, ..self}
    }
    pub fn with_negative_ack(self, negative_ack: bool) -> Self {
        Self {negative_ack, ..self}
    }
}


/// GPIO responder, owner of the transaction scratchpad
pub struct Responder<G> {
    rom: Rom,
    gpio: G,
    config: Config,
    scratchpad: Scratchpad,
}

impl<G: Gpio> Responder<G> {
    /// create a responder with the given serial number, its ROM gets the GPIO family code
    pub fn new(serial: [u8; 6], gpio: G, config: Config) -> Self {
        Self {
            rom: Rom::responder(serial),
            gpio,
            config,
            scratchpad: Scratchpad::new(),
        }
    }
    pub fn config(&self) -> &Config {&self.config}
    pub fn gpio(&self) -> &G {&self.gpio}
    pub fn gpio_mut(&mut self) -> &mut G {&mut self.gpio}
    /// current content of the scratchpad
    pub fn scratchpad(&self) -> &Scratchpad {&self.scratchpad}

    /// value staged in the scratchpad
    pub fn value(&self) -> u16 {self.scratchpad.value()}
    /// stage a value in the scratchpad
    pub fn set_value(&mut self, value: u16) {self.scratchpad.set_value(value)}

    /**
        receive the payload of `command` and its checksum, commit them to the scratchpad only if the checksum is good

        a rejected request leaves the scratchpad untouched. The received checksum byte itself is never stored, so it does not show up at offset `length+1` in later scratchpad answers as it does with firmwares copying the whole request
    */
    fn check_crc<H: Hub>(&mut self, hub: &mut H, command: u8, length: usize) -> Result<(), Fault<H::Error>> {
        let mut frame = [0u8; FRAME];
        frame[0] = command;
        hub.read_exact(&mut frame[1 ..][..= length])?;
        if !is_valid(&frame[..= length+1]) {
            warn!("checksum mismatch on command {:#04x}", command);
            return Err(Fault::Checksum(command));
        }
        self.scratchpad[..= length] .copy_from_slice(&frame[..= length]);
        Ok(())
    }

    fn execute<H: Hub>(&mut self, hub: &mut H, command: u8) -> Result<Response, Fault<H::Error>> {
        match Opcode::from(command) {
            Opcode::WriteScratchpad => {
                debug!("wrote scratchpad");
                self.send_success(hub)
            },
            Opcode::ReadScratchpad => self.send_scratchpad(hub),
            Opcode::PinMode => {
                let args = self.scratchpad.get(registers::PIN_MODE);
                debug!("pin {} mode {}", args.pin, args.mode);
                self.gpio.set_pin_mode(args.pin, args.mode);
                self.send_success(hub)
            },
            Opcode::DigitalRead => {
                let pin = self.scratchpad.get(registers::PIN);
                let value = u16::from(self.gpio.digital_read(pin));
                debug!("pin {} digital read {}", pin, value);
                self.scratchpad.set_value(value);
                self.send_scratchpad(hub)
            },
            Opcode::DigitalWrite => {
                let args = self.scratchpad.get(registers::PIN_WRITE);
                debug!("pin {} digital write {}", args.pin, args.value);
                self.gpio.digital_write(args.pin, args.value);
                self.send_success(hub)
            },
            Opcode::AnalogRead => {
                let pin = self.scratchpad.get(registers::PIN);
                let value = self.gpio.analog_read(pin);
                debug!("pin {} analog read {}", pin, value);
                self.scratchpad.set_value(value);
                self.send_scratchpad(hub)
            },
            Opcode::AnalogWrite => {
                let args = self.scratchpad.get(registers::PIN_WRITE);
                debug!("pin {} analog write {}", args.pin, args.value);
                self.gpio.analog_write(args.pin, args.value);
                self.send_success(hub)
            },
            Opcode::DigitalPins => {
                self.scratchpad.set(registers::COUNT, G::DIGITAL_PINS);
                self.send_scratchpad(hub)
            },
            Opcode::AnalogPins => {
                self.scratchpad.set(registers::COUNT, G::ANALOG_INPUTS);
                self.send_scratchpad(hub)
            },
            Opcode::ReadVersion => {
                self.scratchpad.set_value(self.config.version);
                self.send_scratchpad(hub)
            },
            Opcode::Unknown => Err(Fault::UnknownCommand(command)),
        }
    }

    fn send_success<H: Hub>(&mut self, hub: &mut H) -> Result<Response, Fault<H::Error>> {
        hub.write_all(&[SUCCESS, SUCCESS_CRC]) .map_err(Fault::Transport)?;
        Ok(Response::Success)
    }
    fn send_negative_ack<H: Hub>(&mut self, hub: &mut H) -> Result<Response, Fault<H::Error>> {
        hub.write_all(&[NACK, NACK_CRC]) .map_err(Fault::Transport)?;
        Ok(Response::NegativeAck)
    }
    fn send_scratchpad<H: Hub>(&mut self, hub: &mut H) -> Result<Response, Fault<H::Error>> {
        self.scratchpad.update_checksum();
        hub.write_all(&self.scratchpad[..]) .map_err(Fault::Transport)?;
        Ok(Response::Scratchpad)
    }
}

impl<G: Gpio> BusItem for Responder<G> {
    fn rom(&self) -> Rom {self.rom}

    fn duty<H: Hub>(&mut self, hub: &mut H) -> Result<Response, Fault<H::Error>> {
        let mut command = [0u8];
        hub.read_exact(&mut command)?;
        let [command] = command;

        let opcode = Opcode::from(command);
        let Some(length) = opcode.payload_len() else {
            debug!("unknown command {:#04x}", command);
            hub.raise_slave_error(command);
            return Err(Fault::UnknownCommand(command));
        };
        match self.check_crc(hub, command, length) {
            Err(Fault::Checksum(_)) if self.config.negative_ack => self.send_negative_ack(hub),
            Err(fault) => Err(fault),
            Ok(()) => self.execute(hub, command),
        }
    }
}
