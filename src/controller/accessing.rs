use packbytes::ToBytes;

use crate::{
    command::{Opcode, PinModeArgs, PinWrite, MAX_PAYLOAD},
    registers::{self, Scratchpad},
    rom::Rom,
    };
use super::{
    Bus, Error,
    networking::Controller,
    };


/// full scale of the 10 bits ADC of usual responders
pub const ADC_FULL_SCALE: f32 = 1023.;


impl<B: Bus> Controller<B> {
    /// version of the responder firmware
    pub async fn client_version(&mut self, rom: Option<Rom>) -> Result<u16, Error> {
        Ok(self.query(rom, Opcode::ReadVersion, &[]).await?.value())
    }
    /// scratchpad as currently stored by the responder
    pub async fn read_scratchpad(&mut self, rom: Option<Rom>) -> Result<Scratchpad, Error> {
        self.query(rom, Opcode::ReadScratchpad, &[]).await
    }
    /// store bytes in the responder scratchpad, they can be read back with [Self::read_scratchpad]
    pub async fn write_scratchpad(&mut self, rom: Option<Rom>, data: [u8; MAX_PAYLOAD]) -> Result<(), Error> {
        self.command(rom, Opcode::WriteScratchpad, &data).await
    }
    /// set the mode of a pin, the mode number is the one of the responder's platform, see [PinMode](crate::command::PinMode)
    pub async fn pin_mode(&mut self, rom: Option<Rom>, pin: u8, mode: impl Into<u8>) -> Result<(), Error> {
        let args = PinModeArgs {pin, mode: mode.into()};
        self.command(rom, Opcode::PinMode, &args.to_be_bytes()).await
    }
    pub async fn digital_write(&mut self, rom: Option<Rom>, pin: u8, value: u16) -> Result<(), Error> {
        let args = PinWrite {pin, value};
        self.command(rom, Opcode::DigitalWrite, &args.to_be_bytes()).await
    }
    pub async fn digital_read(&mut self, rom: Option<Rom>, pin: u8) -> Result<bool, Error> {
        Ok(self.query(rom, Opcode::DigitalRead, &[pin]).await?.value() != 0)
    }
    /// raw ADC reading
    pub async fn analog_read(&mut self, rom: Option<Rom>, pin: u8) -> Result<u16, Error> {
        Ok(self.query(rom, Opcode::AnalogRead, &[pin]).await?.value())
    }
    /// set the PWM duty of a pin
    pub async fn analog_write(&mut self, rom: Option<Rom>, pin: u8, duty: u16) -> Result<(), Error> {
        let args = PinWrite {pin, value: duty};
        self.command(rom, Opcode::AnalogWrite, &args.to_be_bytes()).await
    }
    pub async fn digital_pins(&mut self, rom: Option<Rom>) -> Result<u8, Error> {
        Ok(self.query(rom, Opcode::DigitalPins, &[]).await?.get(registers::COUNT))
    }
    pub async fn analog_pins(&mut self, rom: Option<Rom>) -> Result<u8, Error> {
        Ok(self.query(rom, Opcode::AnalogPins, &[]).await?.get(registers::COUNT))
    }

    /// handle on one responder, its pin counts are retreived once here
    pub async fn device(&mut self, rom: Option<Rom>) -> Result<Device<'_, B>, Error> {
        let digital_pins = self.digital_pins(rom).await?;
        let analog_pins = self.analog_pins(rom).await?;
        Ok(Device {
            controller: self,
            rom,
            digital_pins,
            analog_pins,
        })
    }
}


/**
    lightweight reference to one responder through its controller

    pin numbers are checked against the responder's pin counts before any request is sent
*/
pub struct Device<'c, B> {
    controller: &'c mut Controller<B>,
    rom: Option<Rom>,
    digital_pins: u8,
    analog_pins: u8,
}
impl<B: Bus> Device<'_, B> {
    pub fn rom(&self) -> Option<Rom> {self.rom}
    pub fn digital_pins(&self) -> u8 {self.digital_pins}
    pub fn analog_pins(&self) -> u8 {self.analog_pins}

    fn check_digital(&self, pin: u8) -> Result<(), Error> {
        if pin >= self.digital_pins
            {return Err(Error::PinRange {pin, available: self.digital_pins});}
        Ok(())
    }
    fn check_analog(&self, pin: u8) -> Result<(), Error> {
        if pin >= self.analog_pins
            {return Err(Error::PinRange {pin, available: self.analog_pins});}
        Ok(())
    }

    pub async fn client_version(&mut self) -> Result<u16, Error> {
        self.controller.client_version(self.rom).await
    }
    pub async fn pin_mode(&mut self, pin: u8, mode: impl Into<u8>) -> Result<(), Error> {
        self.check_digital(pin)?;
        self.controller.pin_mode(self.rom, pin, mode).await
    }
    pub async fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), Error> {
        self.check_digital(pin)?;
        self.controller.digital_write(self.rom, pin, u16::from(value)).await
    }
    pub async fn digital_read(&mut self, pin: u8) -> Result<bool, Error> {
        self.check_digital(pin)?;
        self.controller.digital_read(self.rom, pin).await
    }
    pub async fn analog_read(&mut self, pin: u8) -> Result<u16, Error> {
        self.check_analog(pin)?;
        self.controller.analog_read(self.rom, pin).await
    }
    /// PWM is available on digital pins
    pub async fn analog_write(&mut self, pin: u8, duty: u16) -> Result<(), Error> {
        self.check_digital(pin)?;
        self.controller.analog_write(self.rom, pin, duty).await
    }
    /// analog reading converted to a voltage, `vcc` being the reference voltage of the responder
    pub async fn analog_voltage(&mut self, pin: u8, vcc: f32) -> Result<f32, Error> {
        let value = self.analog_read(pin).await?;
        Ok(f32::from(value) / ADC_FULL_SCALE * vcc)
    }
}
