use core::hint;

use enum_iterator::Sequence;
use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use x86::io;

use crate::{
    bda::Bda,
    error::{
        Error::PortNotPresent,
        Result,
    },
    log::info,
};


/// Обнаруживает параллельные порты по классическим базовым адресам
/// и записывает найденные в таблицу портов `bda`.
///
/// Порт считается присутствующим,
/// если его регистр данных защёлкивает записанный octet-образец.
pub(crate) fn setup(bda: &Bda) {
    let mut count = 0;

    for base in LPT_BASES {
        if detect(base) {
            bda.ports().lock().add_lpt(base, LPT_TIMEOUT_TICKS);
            count += 1;
        }
    }

    info!(count, "lpt init");
}


/// Передаёт октет `octet` принтеру через параллельный порт
/// номер `port`, дёргая линию строба.
///
/// Возвращает статус порта в
/// [классической кодировке](https://stanislavs.org/helppc/int_17-2.html),
/// см. [`report()`].
pub fn write(
    bda: &Bda,
    port: usize,
    octet: u8,
) -> Result<u8> {
    let base = base(bda, port)?;
    let mut spins = busy_spin_limit(bda, port)?;

    unsafe {
        io::outb(base + DATA, octet);

        let control = io::inb(base + CONTROL);
        io::outb(base + CONTROL, control | STROBE);
        hint::spin_loop();
        io::outb(base + CONTROL, control & !STROBE);
    }

    while raw_status(base) & ACKNOWLEDGE == ACKNOWLEDGE && spins > 0 {
        spins -= 1;
    }

    Ok(report(raw_status(base), spins == 0))
}


/// Сбрасывает принтер на параллельном порту номер `port`,
/// дёргая линию инициализации.
///
/// Возвращает статус порта, см. [`report()`].
pub fn initialize(
    bda: &Bda,
    port: usize,
) -> Result<u8> {
    let base = base(bda, port)?;

    unsafe {
        let control = io::inb(base + CONTROL);
        io::outb(base + CONTROL, control & !INITIALIZE);
        hint::spin_loop();
        io::outb(base + CONTROL, control | INITIALIZE);
    }

    Ok(report(raw_status(base), false))
}


/// Статус принтера на параллельном порту номер `port`,
/// см. [`report()`].
pub fn status(
    bda: &Bda,
    port: usize,
) -> Result<u8> {
    let base = base(bda, port)?;

    Ok(report(raw_status(base), false))
}


/// Проверяет, что по базовому адресу `base` присутствует
/// параллельный порт.
fn detect(base: u16) -> bool {
    /// Octet-образец для проверки защёлки регистра данных.
    const PROBE: u8 = 0xAA;

    unsafe {
        let control = io::inb(base + CONTROL);
        io::outb(base + CONTROL, control & !INPUT_MODE);

        io::outb(base + DATA, PROBE);

        io::inb(base + DATA) == PROBE
    }
}


/// Базовый адрес обнаруженного параллельного порта номер `port`.
fn base(
    bda: &Bda,
    port: usize,
) -> Result<u16> {
    Ok(bda.ports().lock().lpt(port).ok_or(PortNotPresent)?.base)
}


/// Лимит итераций активного ожидания принтера
/// для параллельного порта номер `port`.
fn busy_spin_limit(
    bda: &Bda,
    port: usize,
) -> Result<u16> {
    let lpt = bda.ports().lock().lpt(port).ok_or(PortNotPresent)?;

    Ok(u16::from(lpt.timeout_ticks) << BUSY_SPINS_PER_TICK_SHIFT)
}


/// Регистр статуса параллельного порта с базовым адресом `base`.
fn raw_status(base: u16) -> u8 {
    unsafe { io::inb(base + STATUS) }
}


/// Переводит значение `raw` регистра статуса параллельного порта в
/// [классическую кодировку](https://stanislavs.org/helppc/int_17-2.html):
/// биты занятости и подтверждения инвертируются,
/// а в младшем бите сообщается таймаут `timed_out`.
fn report(
    raw: u8,
    timed_out: bool,
) -> u8 {
    let status = raw ^ (IO_ERROR | ACKNOWLEDGE);

    if timed_out {
        status | TIMEOUT_BIT
    } else {
        status
    }
}


/// Номера функций
/// [сервиса принтера](https://stanislavs.org/helppc/int_17.html)
/// классического интерфейса `INT 17`.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    IntoPrimitive,
    PartialEq,
    Sequence,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum PrinterFunction {
    /// Передать октет --- [`write()`].
    Write = 0x00,

    /// Сбросить принтер --- [`initialize()`].
    Initialize = 0x01,

    /// Статус принтера --- [`status()`].
    Status = 0x02,
}


/// Бит таймаута в статусе, который возвращает [`report()`].
pub const TIMEOUT_BIT: u8 = 1 << 0;

/// Классические базовые адреса параллельных портов
/// в порядке обнаружения.
const LPT_BASES: [u16; 2] = [0x0378, 0x0278];

/// Таймаут операций с параллельным портом
/// в тиках системного таймера.
const LPT_TIMEOUT_TICKS: u8 = 0x14;

/// Количество итераций активного ожидания,
/// приходящихся на один тик таймаута, в виде сдвига.
const BUSY_SPINS_PER_TICK_SHIFT: u16 = 8;

/// Смещение регистра данных от базового адреса порта.
const DATA: u16 = 0;

/// Смещение регистра статуса от базового адреса порта.
const STATUS: u16 = 1;

/// Смещение регистра управления от базового адреса порта.
const CONTROL: u16 = 2;

/// Бит ошибки ввода--вывода в регистре статуса.
/// Активен нулём, поэтому [`report()`] его инвертирует.
const IO_ERROR: u8 = 1 << 3;

/// Бит подтверждения приёма октета в регистре статуса.
/// Активен нулём, поэтому [`report()`] его инвертирует.
const ACKNOWLEDGE: u8 = 1 << 6;

/// Бит строба в регистре управления.
const STROBE: u8 = 1 << 0;

/// Бит сброса принтера в регистре управления.
/// Активен нулём.
const INITIALIZE: u8 = 1 << 2;

/// Бит двунаправленного режима в регистре управления.
const INPUT_MODE: u8 = 1 << 5;

#[doc(hidden)]
pub mod test_scaffolding {
    pub fn report(
        raw: u8,
        timed_out: bool,
    ) -> u8 {
        super::report(raw, timed_out)
    }
}
