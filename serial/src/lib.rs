#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(unused_variables)]

#![allow(clippy::unusual_byte_groupings)]
#![no_std]

use core::{
    fmt,
    hint,
};

use x86::io;

/// A 16550-compatible UART at a fixed base port.
/// Only register-level operations live here;
/// timeouts and port bookkeeping belong to the caller.
#[derive(Clone, Copy)]
pub struct Uart {
    base: u16,
}

impl Uart {
    pub const fn new(base: u16) -> Self {
        Self { base }
    }

    pub const fn base(&self) -> u16 {
        self.base
    }

    /// Checks that a UART responds at the base port.
    /// Writes a scratch value into the interrupt enable register and expects
    /// both it and the interrupt identification register to read back sanely,
    /// then leaves all UART interrupts disabled.
    pub fn detect(&mut self) -> bool {
        const SCRATCH_ENABLE: u8 = 0x02;
        const IDENTIFICATION_MASK: u8 = 0x3F;

        unsafe {
            io::outb(self.base + INTERRUPT_ENABLE, SCRATCH_ENABLE);
            if io::inb(self.base + INTERRUPT_ENABLE) != SCRATCH_ENABLE {
                return false;
            }
            if io::inb(self.base + INTERRUPT_IDENTIFICATION) & IDENTIFICATION_MASK != SCRATCH_ENABLE
            {
                return false;
            }

            io::outb(self.base + INTERRUPT_ENABLE, 0x00);
        }

        true
    }

    /// Programs the baud divisor and the line parameters.
    /// The divisor latch shares ports with the data and interrupt enable
    /// registers and is only visible while the latch bit is set.
    pub fn set_mode(
        &mut self,
        divisor: u16,
        line_control: u8,
    ) {
        const DIVISOR_LATCH: u8 = 1 << 7;
        const LINE_PARAMETER_BITS: u8 = 0b_0001_1111;

        unsafe {
            let control = io::inb(self.base + LINE_CONTROL);
            io::outb(self.base + LINE_CONTROL, control | DIVISOR_LATCH);
            io::outb(self.base + DIVISOR_LSB, divisor as u8);
            io::outb(self.base + DIVISOR_MSB, (divisor >> 8) as u8);
            io::outb(self.base + LINE_CONTROL, line_control & LINE_PARAMETER_BITS);
        }
    }

    pub fn line_status(&mut self) -> u8 {
        unsafe { io::inb(self.base + LINE_STATUS) }
    }

    pub fn modem_status(&mut self) -> u8 {
        unsafe { io::inb(self.base + MODEM_STATUS) }
    }

    /// Both the transmitter holding register and the shift register are empty.
    pub fn transmitter_idle(&mut self) -> bool {
        const TRANSMITTER_IDLE: u8 = 0b_0110_0000;

        self.line_status() & TRANSMITTER_IDLE == TRANSMITTER_IDLE
    }

    pub fn receiver_ready(&mut self) -> bool {
        const DATA_READY: u8 = 1 << 0;

        self.line_status() & DATA_READY != 0
    }

    pub fn write_octet(
        &mut self,
        octet: u8,
    ) {
        unsafe {
            io::outb(self.base + DATA, octet);
        }
    }

    pub fn read_octet(&mut self) -> u8 {
        unsafe { io::inb(self.base + DATA) }
    }
}

/// Base port of the first serial port.
pub const COM1: u16 = 0x03F8;

/// Blocking console on the first serial port, the sink of the firmware log.
pub struct Com {
    uart: Uart,
}

impl Com {
    pub fn new() -> Self {
        // (msb << 8) | lsb == 1.8432 MHz / (16 * speed_in_bauds) ==
        //   1843200 / (16 * speed_in_bauds) == 115200 / speed_in_bauds.
        const BASE_NUMERATOR: u32 = 115200;
        const SPEED_IN_BAUDS: u32 = 9600;

        // 8 data bits, 1 stop bit, no parity.
        const LINE_PARAMETERS: u8 = 0b_000_0_11;

        // Reset and clear the FIFO buffers.
        const FIFO_RESET: u8 = 0x07;

        let mut uart = Uart::new(COM1);
        uart.set_mode((BASE_NUMERATOR / SPEED_IN_BAUDS) as u16, LINE_PARAMETERS);

        unsafe {
            io::outb(COM1 + INTERRUPT_IDENTIFICATION, FIFO_RESET);
        }

        Self { uart }
    }

    pub fn print_octet(
        &mut self,
        octet: u8,
    ) {
        const TRANSMITTER_HOLDING_REGISTER_EMPTY: u8 = 1 << 5;

        while self.uart.line_status() & TRANSMITTER_HOLDING_REGISTER_EMPTY == 0 {
            hint::spin_loop();
        }

        self.uart.write_octet(octet);
    }
}

impl Default for Com {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for Com {
    fn write_str(
        &mut self,
        string: &str,
    ) -> fmt::Result {
        for octet in string.bytes() {
            if octet == b'\n' {
                self.print_octet(b'\r');
            }
            self.print_octet(octet);
        }

        Ok(())
    }
}

/// Register offsets from the UART base port.
/// The divisor latch registers share offsets 0 and 1,
/// see [`Uart::set_mode()`].
const DATA: u16 = 0;
const INTERRUPT_ENABLE: u16 = 1;
const INTERRUPT_IDENTIFICATION: u16 = 2;
const LINE_CONTROL: u16 = 3;
const MODEM_CONTROL: u16 = 4;
const LINE_STATUS: u16 = 5;
const MODEM_STATUS: u16 = 6;
const DIVISOR_LSB: u16 = 0;
const DIVISOR_MSB: u16 = 1;
