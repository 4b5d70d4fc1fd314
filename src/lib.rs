/*!
    remote GPIO of a microcontroller over a 1-Wire bus

    a controller sends one command per transaction to a selected responder, every transaction is a 9 bytes scratchpad at most, protected by a CRC-8

    - [responder] runs on the microcontroller, behind a 1-Wire hub which already handled reset, presence and ROM selection
    - [controller] runs on the bus master and turns calls into requests, retrying corrupted exchanges
*/

#![no_std]
#[cfg(any(feature = "std", test))]
extern crate std;

pub mod crc;
pub mod command;
pub mod registers;
pub mod rom;
#[cfg(feature = "responder")]
pub mod responder;
#[cfg(feature = "controller")]
pub mod controller;
