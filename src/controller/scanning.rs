use std::{
    time::Duration,
    vec::Vec,
    };
use log::*;

use crate::{
    command::FAMILY_CODE,
    rom::Rom,
    };
use super::{
    Bus, Error, Expected,
    networking::Controller,
    };


impl Expected {
    /// number of expected devices absent from `found`
    pub fn missing(&self, found: &[Rom]) -> usize {
        match self {
            Self::Count(count) => count.saturating_sub(found.len()),
            Self::Roms(roms) => roms.iter() .filter(|rom| !found.contains(rom)) .count(),
        }
    }
}

impl<B: Bus> Controller<B> {
    /// ROM codes of the GPIO responders on the bus, other devices and corrupted codes are ignored
    pub async fn scan(&mut self) -> Result<Vec<Rom>, Error> {
        let roms = self.bus.search().await?;
        Ok(roms.into_iter()
            .filter(|rom| rom.family() == FAMILY_CODE && rom.is_valid())
            .collect())
    }

    /**
        repeat scans and gather their results, a single search often misses devices

        scanning stops early once all the devices set in [Config::expected](super::Config::expected) are found. Missing devices are logged, and reported as an error if `fail_on_missing` is set.
    */
    pub async fn scan_safely(&mut self, iterations: usize, wait: Duration, fail_on_missing: bool) -> Result<Vec<Rom>, Error> {
        let mut found = Vec::new();
        for iteration in 0 .. iterations {
            if iteration != 0 {
                tokio::time::sleep(wait).await;
            }
            for rom in self.scan().await? {
                if !found.contains(&rom)
                    {found.push(rom);}
            }
            if let Some(expected) = &self.config.expected {
                if expected.missing(&found) == 0
                    {break}
            }
        }
        debug!("scan found {} devices", found.len());

        let missing = match &self.config.expected {
            Some(expected) => {
                if let Expected::Roms(roms) = expected {
                    for rom in roms .iter().filter(|rom| !found.contains(rom)) {
                        warn!("missing device {}", rom);
                    }
                }
                expected.missing(&found)
            },
            None => 0,
        };
        if missing != 0 {
            warn!("missing {} devices", missing);
            if fail_on_missing
                {return Err(Error::Missing(missing));}
        }
        Ok(found)
    }
}
