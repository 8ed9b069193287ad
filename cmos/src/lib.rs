#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(unused_variables)]

#![allow(clippy::missing_safety_doc)]
#![no_std]

use x86::io;

/// Byte-register bus of the MC146818 CMOS/RTC chip.
/// The time and wait services are generic over this trait,
/// the tests substitute an in-memory fake for the real chip.
pub trait Cmos {
    fn read(
        &mut self,
        address: u8,
    ) -> u8;

    fn write(
        &mut self,
        address: u8,
        data: u8,
    );
}

/// The real chip behind I/O ports `0x70` and `0x71`.
///
/// The select port latches the register address,
/// the data port transfers the register byte.
/// The addresses have nothing to do with main memory,
/// they index the internal memory of the chip.
pub struct PortCmos;

impl Cmos for PortCmos {
    fn read(
        &mut self,
        address: u8,
    ) -> u8 {
        unsafe {
            io::outb(SELECT_PORT, address);
            io::inb(DATA_PORT)
        }
    }

    fn write(
        &mut self,
        address: u8,
        data: u8,
    ) {
        unsafe {
            io::outb(SELECT_PORT, address);
            io::outb(DATA_PORT, data);
        }
    }
}

const SELECT_PORT: u16 = 0x0070;
const DATA_PORT: u16 = 0x0071;
