/*!
    layout of the transaction scratchpad

    each field is described by a [Register], a typed offset in the 9 bytes of the scratchpad, so the same buffer can be read as command arguments or written with results
*/

use core::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    };
use packbytes::{FromBytes, ToBytes, ByteArray};

use crate::{
    crc::checksum,
    command::{FRAME, MAX_PAYLOAD, PinModeArgs, PinWrite},
    };


/// byte order of a multi-byte register
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Order {
    Big,
    Little,
}

/**
    a register is a typed pointer in the scratchpad

    it only holds the offset of the starting byte and the byte order of the referenced value, hence can be created, copied or destroyed at no cost
*/
#[derive(PartialEq, Eq, Hash)]
pub struct Register<T> {
    offset: usize,
    order: Order,
    ty: PhantomData<T>,
}
impl<T> Register<T> {
    /// create a register from its starting byte
    pub const fn new(offset: usize, order: Order) -> Self {
        Self {offset, order, ty: PhantomData}
    }
    /// starting byte in scratchpad
    pub const fn offset(&self) -> usize {self.offset}
    pub const fn order(&self) -> Order {self.order}
}
impl<T: FromBytes> Register<T> {
    pub const fn size(&self) -> usize {T::Bytes::SIZE}
}
impl<T> Clone for Register<T> {
    fn clone(&self) -> Self {*self}
}
impl<T> Copy for Register<T> {}


/// command that opened the transaction
pub const COMMAND: Register<u8> = Register::new(0, Order::Big);
/// pin targeted by a pin command
pub const PIN: Register<u8> = Register::new(1, Order::Big);
/// arguments of a pin mode command
pub const PIN_MODE: Register<PinModeArgs> = Register::new(1, Order::Big);
/// arguments of a digital or analog write
pub const PIN_WRITE: Register<PinWrite> = Register::new(1, Order::Big);
/// raw payload area
pub const PAYLOAD: Register<[u8; MAX_PAYLOAD]> = Register::new(1, Order::Big);
/// pin count answered to pin count queries
pub const COUNT: Register<u8> = Register::new(3, Order::Big);
/// value register, result of reads and firmware version
pub const VALUE: Register<u16> = Register::new(4, Order::Little);
/// checksum of all the preceding bytes
pub const CHECKSUM: Register<u8> = Register::new(FRAME - 1, Order::Big);


/// the fixed transaction buffer, reused by every transaction
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scratchpad {
    buffer: [u8; FRAME],
}
impl Scratchpad {
    pub const fn new() -> Self {
        Self {buffer: [0; FRAME]}
    }
    /// get the current register's value
    pub fn get<T: FromBytes>(&self, register: Register<T>) -> T {
        let mut dst = T::Bytes::zeroed();
        dst.as_mut().copy_from_slice(&self.buffer[register.offset() ..][.. T::Bytes::SIZE]);
        match register.order() {
            Order::Big => T::from_be_bytes(dst),
            Order::Little => T::from_le_bytes(dst),
        }
    }
    /// set the given register's value
    pub fn set<T: ToBytes>(&mut self, register: Register<T>, value: T) {
        let src = match register.order() {
            Order::Big => value.to_be_bytes(),
            Order::Little => value.to_le_bytes(),
        };
        self.buffer[register.offset() ..][.. src.as_ref().len()].copy_from_slice(src.as_ref());
    }
    /// value staged for the controller
    pub fn value(&self) -> u16 {self.get(VALUE)}
    /// stage a value for the controller
    pub fn set_value(&mut self, value: u16) {self.set(VALUE, value)}

    /// recompute the trailing checksum over all the other bytes
    pub fn update_checksum(&mut self) {
        let crc = checksum(&self.buffer[.. FRAME-1]);
        self.set(CHECKSUM, crc);
    }
}
impl Deref for Scratchpad {
    type Target = [u8; FRAME];
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}
impl DerefMut for Scratchpad {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}
