//! controller against real responders through an in-memory 1-Wire bus

use std::{
    convert::Infallible,
    io,
    time::Duration,
    };
use embedded_io::{ErrorType, Read, Write};

use onewire_gpio::{
    command::{PinMode, MATCH_ROM, SKIP_ROM, MAX_PAYLOAD},
    controller::{Bus, Config, Controller, Error, Expected},
    responder::{self, BusItem, Gpio, Hub, Responder},
    rom::{Rom, ROM_SIZE},
    };


/// simulated arduino-like board
#[derive(Default)]
struct Board {
    modes: [u8; 20],
    levels: [u16; 20],
    adc: [u16; 6],
}
impl Gpio for Board {
    const DIGITAL_PINS: u8 = 20;
    const ANALOG_INPUTS: u8 = 6;

    fn set_pin_mode(&mut self, pin: u8, mode: u8) {
        self.modes[usize::from(pin)] = mode;
    }
    fn digital_read(&mut self, pin: u8) -> bool {
        self.levels[usize::from(pin)] != 0
    }
    fn digital_write(&mut self, pin: u8, value: u16) {
        self.levels[usize::from(pin)] = value;
    }
    fn analog_read(&mut self, pin: u8) -> u16 {
        self.adc[usize::from(pin)]
    }
    fn analog_write(&mut self, pin: u8, duty: u16) {
        self.levels[usize::from(pin)] = duty;
    }
}

/// hub side of one transaction, once the device is selected
struct Wire<'b> {
    request: &'b [u8],
    answer: Vec<u8>,
}
impl ErrorType for Wire<'_> {
    type Error = Infallible;
}
impl Read for Wire<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let size = self.request.len().min(buf.len());
        buf[.. size].copy_from_slice(&self.request[.. size]);
        self.request = &self.request[size ..];
        Ok(size)
    }
}
impl Write for Wire<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.answer.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> Result<(), Self::Error> {Ok(())}
}
impl Hub for Wire<'_> {
    fn raise_slave_error(&mut self, _command: u8) {}
}

/// bus with responders and foreign devices attached
#[derive(Default)]
struct Loopback {
    responders: Vec<Responder<Board>>,
    foreign: Vec<Rom>,
    written: Vec<u8>,
    /// number of coming requests to corrupt
    corrupt: usize,
    /// number of transactions that reached a responder
    transactions: usize,
}
impl Loopback {
    fn with(configs: &[([u8; 6], responder::Config)]) -> Self {
        Self {
            responders: configs.iter()
                .map(|&(serial, config)|  Responder::new(serial, Board::default(), config))
                .collect(),
            ..Default::default()
        }
    }
    fn single() -> Self {
        Self::with(&[([1, 2, 3, 4, 5, 6], responder::Config::default())])
    }
    fn board(&self, index: usize) -> &Board {
        self.responders[index].gpio()
    }
}
impl Bus for Loopback {
    async fn reset(&mut self) -> io::Result<bool> {
        self.written.clear();
        Ok(!self.responders.is_empty() || !self.foreign.is_empty())
    }
    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(data);
        Ok(())
    }
    async fn read(&mut self, data: &mut [u8]) -> io::Result<()> {
        data.fill(0xff);
        let (selected, start) = match self.written.first() {
            Some(&SKIP_ROM) if self.responders.len() == 1 => (Some(0), 1),
            Some(&MATCH_ROM) if self.written.len() > ROM_SIZE => {
                let rom = Rom::from_bytes(self.written[1 ..][.. ROM_SIZE].try_into().unwrap());
                (self.responders.iter().position(|responder| responder.rom() == rom), 1+ROM_SIZE)
            },
            _ => (None, 0),
        };
        let Some(selected) = selected else {return Ok(())};

        let mut request = self.written[start ..].to_vec();
        if self.corrupt != 0 {
            self.corrupt -= 1;
            if let Some(last) = request.last_mut() {
                *last ^= 0x01;
            }
        }
        let mut wire = Wire {request: &request, answer: Vec::new()};
        let _ = self.responders[selected].duty(&mut wire);
        self.transactions += 1;

        let size = wire.answer.len().min(data.len());
        data[.. size].copy_from_slice(&wire.answer[.. size]);
        self.written.clear();
        Ok(())
    }
    async fn search(&mut self) -> io::Result<Vec<Rom>> {
        Ok(self.responders.iter()
            .map(|responder| responder.rom())
            .chain(self.foreign.iter().copied())
            .collect())
    }
}

fn controller(bus: Loopback) -> Controller<Loopback> {
    let _ = env_logger::builder().is_test(true).try_init();
    Controller::new(bus, Config::default().with_retry_delay(Duration::from_millis(1)))
}


#[tokio::test]
async fn version_and_counts() {
    let mut controller = controller(Loopback::single());
    assert_eq!(controller.client_version(None).await.unwrap(), 100);
    assert_eq!(controller.digital_pins(None).await.unwrap(), 20);
    assert_eq!(controller.analog_pins(None).await.unwrap(), 6);
}

#[tokio::test]
async fn digital_pins() {
    let mut controller = controller(Loopback::single());
    controller.pin_mode(None, 13, PinMode::Output).await.unwrap();
    controller.digital_write(None, 13, 1).await.unwrap();
    assert_eq!(controller.bus().board(0).modes[13], 1);
    assert_eq!(controller.bus().board(0).levels[13], 1);
    assert!(controller.digital_read(None, 13).await.unwrap());
    assert!(!controller.digital_read(None, 12).await.unwrap());

    controller.digital_write(None, 13, 0).await.unwrap();
    assert!(!controller.digital_read(None, 13).await.unwrap());
}

#[tokio::test]
async fn analog_pins() {
    let mut bus = Loopback::single();
    bus.responders[0].gpio_mut().adc[2] = 512;
    let mut controller = controller(bus);

    assert_eq!(controller.analog_read(None, 2).await.unwrap(), 512);
    controller.analog_write(None, 9, 0x1ff).await.unwrap();
    assert_eq!(controller.bus().board(0).levels[9], 0x1ff);

    let mut device = controller.device(None).await.unwrap();
    let voltage = device.analog_voltage(2, 5.).await.unwrap();
    assert!((voltage - 2.5024).abs() < 1e-3, "voltage {}", voltage);
}

#[tokio::test]
async fn scratchpad_round_trip() {
    let mut controller = controller(Loopback::single());
    let data = [9, 8, 7, 6, 5, 4, 3];
    controller.write_scratchpad(None, data).await.unwrap();
    let scratchpad = controller.read_scratchpad(None).await.unwrap();
    assert_eq!(&scratchpad[1 ..= MAX_PAYLOAD], &data);
}

#[tokio::test]
async fn device_checks_pins() {
    let mut controller = controller(Loopback::single());
    let mut device = controller.device(None).await.unwrap();
    assert_eq!(device.digital_pins(), 20);
    assert_eq!(device.analog_pins(), 6);

    assert!(matches!(device.digital_write(20, true).await, Err(Error::PinRange {pin: 20, available: 20})));
    assert!(matches!(device.analog_read(6).await, Err(Error::PinRange {pin: 6, available: 6})));
    device.digital_write(19, true).await.unwrap();
    assert_eq!(device.client_version().await.unwrap(), 100);
    drop(device);
    // pin counts, one write and the version, nothing sent for rejected pins
    assert_eq!(controller.bus().transactions, 4);
    assert_eq!(controller.bus().board(0).levels[19], 1);
}

#[tokio::test]
async fn retries_corrupted_requests() {
    let mut bus = Loopback::single();
    bus.corrupt = 2;
    let mut controller = controller(bus);
    controller.digital_write(None, 4, 1).await.unwrap();
    assert_eq!(controller.bus().transactions, 3);
    assert_eq!(controller.bus().board(0).levels[4], 1);

    controller.bus_mut().corrupt = 10;
    assert!(matches!(controller.client_version(None).await, Err(Error::Checksum)));
    assert_eq!(controller.bus().transactions, 3 + 4);
}

#[tokio::test]
async fn negative_acknowledgment() {
    let mut bus = Loopback::with(&[([1, 1, 1, 1, 1, 1], responder::Config::default().with_negative_ack(true))]);
    bus.corrupt = 1;
    let mut controller = controller(bus);
    assert_eq!(controller.analog_read(None, 0).await.unwrap(), 0);

    controller.bus_mut().corrupt = 10;
    assert!(matches!(controller.digital_write(None, 1, 1).await, Err(Error::Rejected)));
    assert_eq!(controller.bus().board(0).levels[1], 0);
}

#[tokio::test]
async fn addressing_and_scan() {
    let first = [1, 0, 0, 0, 0, 0];
    let second = [2, 0, 0, 0, 0, 0];
    let mut bus = Loopback::with(&[
        (first, responder::Config::default()),
        (second, responder::Config::default().with_version(101)),
        ]);
    // a temperature sensor sharing the bus, and a device with a broken ROM
    bus.foreign.push(Rom::from_id(0x28, [3, 0, 0, 0, 0, 0]));
    let mut broken = Rom::responder([4, 0, 0, 0, 0, 0]).to_bytes();
    broken[7] ^= 0xff;
    bus.foreign.push(Rom::from_bytes(broken));
    let mut controller = controller(bus);

    let roms = controller.scan().await.unwrap();
    assert_eq!(roms, [Rom::responder(first), Rom::responder(second)]);

    assert_eq!(controller.client_version(Some(roms[0])).await.unwrap(), 100);
    assert_eq!(controller.client_version(Some(roms[1])).await.unwrap(), 101);
    controller.digital_write(Some(roms[1]), 7, 1).await.unwrap();
    assert_eq!(controller.bus().board(0).levels[7], 0);
    assert_eq!(controller.bus().board(1).levels[7], 1);

    // several devices cannot share a skipped ROM selection
    assert!(controller.client_version(None).await.is_err());
}

#[tokio::test]
async fn scan_expected_devices() {
    let present = Rom::responder([1, 0, 0, 0, 0, 0]);
    let absent = Rom::responder([9, 0, 0, 0, 0, 0]);
    let bus = Loopback::with(&[([1, 0, 0, 0, 0, 0], responder::Config::default())]);
    let config = Config::default().with_expected(Expected::Roms(vec![present, absent]));
    let mut controller = Controller::new(bus, config);

    let wait = Duration::from_millis(1);
    assert!(matches!(controller.scan_safely(3, wait, true).await, Err(Error::Missing(1))));
    assert_eq!(controller.scan_safely(3, wait, false).await.unwrap(), [present]);

    let bus = controller.into_inner();
    let mut controller = Controller::new(bus, Config::default().with_expected(Expected::Count(1)));
    assert_eq!(controller.scan_safely(3, wait, true).await.unwrap(), [present]);
}

#[tokio::test]
async fn empty_bus() {
    let mut controller = controller(Loopback::default());
    assert!(matches!(controller.digital_pins(None).await, Err(Error::NoPresence)));
    assert!(controller.scan().await.unwrap().is_empty());
}
