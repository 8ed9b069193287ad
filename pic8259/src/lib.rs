#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(unused_variables)]

#![allow(clippy::missing_safety_doc)]
#![allow(clippy::unusual_byte_groupings)]
#![no_std]

use x86::io;

const INTERRUPT_LINE_COUNT: u8 = 8;
pub const PIC_INTERRUPT_COUNT: u8 = INTERRUPT_LINE_COUNT * 2;

/// The interrupt line of the cascaded second controller on the first one.
const CASCADE_LINE: u8 = 2;

/// Remaps the cascaded pair of controllers to the given vector bases
/// and masks every interrupt line.
/// The classic BIOS mapping is `0x08` for the first controller
/// and `0x70` for the second one; unlike in protected mode setups
/// the two ranges are not adjacent.
pub unsafe fn init(
    first_vector_base: u8,
    second_vector_base: u8,
) {
    const ICW1_USE_ICW4: u8 = 0b_1 << 0;
    const ICW1_CASCADE: u8 = 0b_0 << 1;
    const ICW1_LEVEL_TRIGGERED: u8 = 0b_0 << 3;
    const ICW1_MANDATORY_BITS: u8 = 0b_1 << 4;
    const ICW1: u8 = ICW1_USE_ICW4 | ICW1_CASCADE | ICW1_LEVEL_TRIGGERED | ICW1_MANDATORY_BITS;

    unsafe {
        io::outb(PIC0_COMMAND, ICW1);
        io::outb(PIC1_COMMAND, ICW1);
    }

    unsafe {
        io::outb(PIC0_DATA, first_vector_base);
        io::outb(PIC1_DATA, second_vector_base);
    }

    const CASCADE_LINES_BITMASK: u8 = 1 << CASCADE_LINE;
    const ICW3_FOR_PIC0: u8 = CASCADE_LINES_BITMASK;
    const ICW3_FOR_PIC1: u8 = CASCADE_LINE;

    unsafe {
        io::outb(PIC0_DATA, ICW3_FOR_PIC0);
        io::outb(PIC1_DATA, ICW3_FOR_PIC1);
    }

    // No automatic End Of Interrupt here.
    // Every handler sends an explicit End Of Interrupt itself,
    // on each of its exit paths, including the early-return ones.
    const ICW4_MANDATORY_BITS: u8 = 0b_1 << 0;
    const ICW4_EXPLICIT_END_OF_INTERRUPT: u8 = 0b_0 << 1;
    const ICW4_UNBUFFERED_MODE: u8 = 0b_00 << 2;
    const ICW4_NORMAL_NESTED_MODE: u8 = 0b_0 << 4;
    const ICW4: u8 = ICW4_MANDATORY_BITS |
        ICW4_EXPLICIT_END_OF_INTERRUPT |
        ICW4_UNBUFFERED_MODE |
        ICW4_NORMAL_NESTED_MODE;

    unsafe {
        io::outb(PIC0_DATA, ICW4);
        io::outb(PIC1_DATA, ICW4);
    }

    const ALL_LINES_MASKED: u8 = 0b_1111_1111;

    unsafe {
        io::outb(PIC0_DATA, ALL_LINES_MASKED);
        io::outb(PIC1_DATA, ALL_LINES_MASKED);
    }
}

/// Sends an explicit End Of Interrupt for `pic_interrupt_number`.
/// An interrupt of the second controller is acknowledged on both,
/// the request travels to the CPU through the cascade line.
pub unsafe fn end_of_interrupt(pic_interrupt_number: u8) {
    const EOI: u8 = 0x20;

    if pic_interrupt_number >= INTERRUPT_LINE_COUNT {
        unsafe {
            io::outb(PIC1_COMMAND, EOI);
        }
    }

    unsafe {
        io::outb(PIC0_COMMAND, EOI);
    }
}

/// Unmasks `pic_interrupt_number`.
/// For a line of the second controller also unmasks the cascade line,
/// without it the second controller can not deliver anything.
pub unsafe fn enable_line(pic_interrupt_number: u8) {
    if pic_interrupt_number < INTERRUPT_LINE_COUNT {
        unsafe {
            let mask = io::inb(PIC0_DATA);
            io::outb(PIC0_DATA, mask & !(1 << pic_interrupt_number));
        }
    } else {
        let line = pic_interrupt_number - INTERRUPT_LINE_COUNT;
        unsafe {
            let mask = io::inb(PIC1_DATA);
            io::outb(PIC1_DATA, mask & !(1 << line));

            let mask = io::inb(PIC0_DATA);
            io::outb(PIC0_DATA, mask & !(1 << CASCADE_LINE));
        }
    }
}

/// Masks `pic_interrupt_number`.
pub unsafe fn disable_line(pic_interrupt_number: u8) {
    if pic_interrupt_number < INTERRUPT_LINE_COUNT {
        unsafe {
            let mask = io::inb(PIC0_DATA);
            io::outb(PIC0_DATA, mask | (1 << pic_interrupt_number));
        }
    } else {
        let line = pic_interrupt_number - INTERRUPT_LINE_COUNT;
        unsafe {
            let mask = io::inb(PIC1_DATA);
            io::outb(PIC1_DATA, mask | (1 << line));
        }
    }
}

const PIC0_COMMAND: u16 = 0x20;
const PIC0_DATA: u16 = PIC0_COMMAND + 1;
const PIC1_COMMAND: u16 = 0xA0;
const PIC1_DATA: u16 = PIC1_COMMAND + 1;
