use log::*;

use crate::{
    crc::is_valid,
    command::*,
    registers::Scratchpad,
    rom::{Rom, ROM_SIZE},
    };
use super::{Bus, Config, Error};


/**
    GPIO controller owning a 1-Wire bus

    each exchange is a complete 1-Wire transaction: reset, ROM selection, request, answer. Exchanges failing for reasons that can be caused by noise on the bus are retried as configured.
*/
pub struct Controller<B> {
    pub(super) bus: B,
    pub(super) config: Config,
}

impl<B: Bus> Controller<B> {
    pub fn new(bus: B, config: Config) -> Self {
        Self {bus, config}
    }
    pub fn config(&self) -> &Config {&self.config}
    pub fn bus(&self) -> &B {&self.bus}
    pub fn bus_mut(&mut self) -> &mut B {&mut self.bus}
    pub fn into_inner(self) -> B {self.bus}

    /// send a request expecting a success acknowledgment
    pub async fn command(&mut self, rom: Option<Rom>, opcode: Opcode, payload: &[u8]) -> Result<(), Error> {
        if opcode.answer() != Some(Answer::Success)
            {return Err(Error::Controller("command does not answer with an acknowledgment"));}
        let mut answer = [0u8; 2];
        self.transact(rom, opcode, payload, &mut answer).await
    }
    /// send a request expecting the scratchpad back
    pub async fn query(&mut self, rom: Option<Rom>, opcode: Opcode, payload: &[u8]) -> Result<Scratchpad, Error> {
        if opcode.answer() != Some(Answer::Scratchpad)
            {return Err(Error::Controller("command does not answer with the scratchpad"));}
        let mut scratchpad = Scratchpad::new();
        self.transact(rom, opcode, payload, &mut scratchpad[..]).await?;
        Ok(scratchpad)
    }

    async fn transact(&mut self, rom: Option<Rom>, opcode: Opcode, payload: &[u8], answer: &mut [u8]) -> Result<(), Error> {
        let request = Request::new(opcode, payload) .map_err(Error::Controller)?;
        let mut last = Error::Controller("no attempt allowed by config");
        for attempt in 0 .. self.config.attempts {
            if attempt != 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }
            match self.exchange(rom, &request, answer).await {
                Ok(()) => return Ok(()),
                Err(error) if retryable(&error) => {
                    warn!("{:?} failed: {}, retrying", opcode, error);
                    last = error;
                },
                Err(error) => return Err(error),
            }
        }
        Err(last)
    }

    async fn exchange(&mut self, rom: Option<Rom>, request: &Request, answer: &mut [u8]) -> Result<(), Error> {
        self.select(rom).await?;
        self.bus.write(request.as_bytes()).await?;
        self.bus.read(answer).await?;
        check_answer(request.opcode(), answer)
    }

    /// reset the bus and address the given device, or all devices
    async fn select(&mut self, rom: Option<Rom>) -> Result<(), Error> {
        if !self.bus.reset().await?
            {return Err(Error::NoPresence);}
        match rom {
            Some(rom) => {
                let mut frame = [0u8; 1+ROM_SIZE];
                frame[0] = MATCH_ROM;
                frame[1 ..].copy_from_slice(&rom.to_bytes());
                self.bus.write(&frame).await?;
            },
            None => self.bus.write(&[SKIP_ROM]).await?,
        }
        Ok(())
    }
}

/// failures that a new attempt may not reproduce
fn retryable(error: &Error) -> bool {
    matches!(error,
        Error::Bus(_)
        | Error::NoPresence
        | Error::Checksum
        | Error::Rejected
        | Error::Mismatch)
}

fn check_answer(opcode: Opcode, answer: &[u8]) -> Result<(), Error> {
    // a negative acknowledgment is shorter than a scratchpad, so look at its bytes before the checksum
    if answer.starts_with(&[NACK, NACK_CRC])
        {return Err(Error::Rejected);}
    if !is_valid(answer)
        {return Err(Error::Checksum);}
    let expected = match answer.len() {
        2 => SUCCESS,
        _ => u8::from(opcode),
    };
    if answer[0] != expected
        {return Err(Error::Mismatch);}
    Ok(())
}
