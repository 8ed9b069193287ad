#![allow(clippy::unusual_byte_groupings)]

use bitflags::bitflags;
use x86::io;


/// Инициализация таймера
/// [Intel 8253/8254](https://en.wikipedia.org/wiki/Intel_8253).
///
/// Программирует счётчик номер `0` на циклическую генерацию
/// прерывания [`super::ticks::interrupt()`] с делителем [`DIVISOR`],
/// то есть с частотой 18.2065 Гц.
pub(super) fn init() {
    let command_word = !CommandWord::BINARY_CODED_DECIMAL &
        (CommandWord::COUNTER_NUMBER_0 |
            CommandWord::LSB_THAN_MSB |
            CommandWord::REPETITIVE_MODE);

    /// Регистр команды.
    const COMMAND_WORD_REGISTER: u16 = 0x43;

    /// Регистр счётчика номер `0` таймера.
    const COUNTER_NUMBER_0_REGISTER: u16 = 0x40;

    unsafe {
        io::outb(COMMAND_WORD_REGISTER, command_word.bits());

        io::outb(COUNTER_NUMBER_0_REGISTER, DIVISOR as u8);
        io::outb(COUNTER_NUMBER_0_REGISTER, (DIVISOR >> 8) as u8);
    }
}

bitflags! {
    /// Параметры настроек таймера
    /// [Intel 8253/8254](https://en.wikipedia.org/wiki/Intel_8253).
    struct CommandWord: u8 {
        /// Выбрать счётчик номер `0` таймера.
        const COUNTER_NUMBER_0 = 0b_00 << 6;

        /// Первым передаётся младший байт [`DIVISOR`], затем старший.
        const LSB_THAN_MSB = 0b_11 << 4;

        /// Циклический режим таймера.
        const REPETITIVE_MODE = 0b_010 << 1;

        /// Использовать
        /// [двоично--десятичный](https://en.wikipedia.org/wiki/Binary-coded_decimal)
        /// формат.
        const BINARY_CODED_DECIMAL = 0b_1 << 0;
    }
}

/// Делитель базовой частоты таймера 1193182 Гц.
/// Значение `0` таймер трактует как 65536,
/// что даёт классические 18.2065 прерываний в секунду.
const DIVISOR: u16 = 0;
