use core::hint;

use enum_iterator::Sequence;
use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use serial::Uart;

use crate::{
    bda::{
        Bda,
        TickCounter,
    },
    error::{
        Error::PortNotPresent,
        Result,
    },
    log::info,
};


/// Обнаруживает последовательные порты по классическим базовым адресам
/// и записывает найденные в таблицу портов `bda`.
pub(crate) fn setup(bda: &Bda) {
    let mut count = 0;

    for base in COM_BASES {
        if Uart::new(base).detect() {
            bda.ports().lock().add_com(base, COM_TIMEOUT_TICKS);
            count += 1;
        }
    }

    info!(count, "serial init");
}


/// Программирует последовательный порт номер `port`
/// в режим `mode` --- упакованные в байт скорость и параметры линии в
/// [классической кодировке](https://stanislavs.org/helppc/int_14-0.html).
///
/// Возвращает статус порта после программирования.
pub fn initialize(
    bda: &Bda,
    port: usize,
    mode: u8,
) -> Result<ComStatus> {
    let mut uart = uart(bda, port)?;

    let rate_code = mode >> MODE_RATE_SHIFT;
    let divisor = if rate_code == 0 {
        DEFAULT_DIVISOR
    } else {
        RATE_DIVISOR_BASE >> rate_code
    };

    uart.set_mode(divisor, mode & MODE_LINE_MASK);

    Ok(ComStatus {
        line: uart.line_status(),
        modem: uart.modem_status(),
    })
}


/// Передаёт октет `octet` через последовательный порт номер `port`.
///
/// Возвращает статус линии порта.
/// Если передатчик порта не освободился за отведённый порту таймаут,
/// октет не передаётся,
/// а в статусе дополнительно взводится бит [`TIMEOUT_BIT`].
pub fn write(
    bda: &Bda,
    port: usize,
    octet: u8,
) -> Result<u8> {
    let (mut uart, timeout_ticks) = uart_with_timeout(bda, port)?;

    if !wait_ready(bda.ticks(), timeout_ticks, || uart.transmitter_idle()) {
        return Ok(uart.line_status() | TIMEOUT_BIT);
    }

    uart.write_octet(octet);

    Ok(uart.line_status())
}


/// Принимает октет из последовательного порта номер `port`.
///
/// Если октет не пришёл за отведённый порту таймаут,
/// возвращает [`ComRead::Timeout`] со статусом линии порта.
pub fn read(
    bda: &Bda,
    port: usize,
) -> Result<ComRead> {
    let (mut uart, timeout_ticks) = uart_with_timeout(bda, port)?;

    if !wait_ready(bda.ticks(), timeout_ticks, || uart.receiver_ready()) {
        return Ok(ComRead::Timeout {
            line: uart.line_status(),
        });
    }

    Ok(ComRead::Data {
        octet: uart.read_octet(),
    })
}


/// Статус последовательного порта номер `port`.
pub fn status(
    bda: &Bda,
    port: usize,
) -> Result<ComStatus> {
    let mut uart = uart(bda, port)?;

    Ok(ComStatus {
        line: uart.line_status(),
        modem: uart.modem_status(),
    })
}


/// Микросхема обнаруженного последовательного порта номер `port`.
fn uart(
    bda: &Bda,
    port: usize,
) -> Result<Uart> {
    uart_with_timeout(bda, port).map(|(uart, _timeout_ticks)| uart)
}


/// Микросхема обнаруженного последовательного порта номер `port`
/// вместе с отведённым ему таймаутом.
fn uart_with_timeout(
    bda: &Bda,
    port: usize,
) -> Result<(Uart, u8)> {
    let com = bda.ports().lock().com(port).ok_or(PortNotPresent)?;

    Ok((Uart::new(com.base), com.timeout_ticks))
}


/// Ждёт готовности `ready`, отсчитывая таймаут тиками
/// системного таймера --- изменениями счётчика `ticks`.
///
/// Возвращает `false`, если за `timeout_ticks` тиков
/// готовность так и не наступила.
fn wait_ready(
    ticks: &TickCounter,
    mut timeout_ticks: u8,
    mut ready: impl FnMut() -> bool,
) -> bool {
    let mut last_ticks = ticks.current();

    while !ready() && timeout_ticks > 0 {
        let current_ticks = ticks.current();
        if current_ticks != last_ticks {
            last_ticks = current_ticks;
            timeout_ticks -= 1;
        }

        hint::spin_loop();
    }

    timeout_ticks > 0
}


/// Статус последовательного порта.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ComStatus {
    /// Статус линии.
    pub line: u8,

    /// Статус модема.
    pub modem: u8,
}


/// Результат приёма октета из последовательного порта.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComRead {
    /// Принятый октет.
    Data {
        /// Октет из приёмника порта.
        octet: u8,
    },

    /// Октет не пришёл за отведённый порту таймаут.
    Timeout {
        /// Статус линии порта.
        line: u8,
    },
}


/// Номера функций
/// [сервиса последовательного порта](https://stanislavs.org/helppc/int_14.html)
/// классического интерфейса `INT 14`.
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
pub enum SerialFunction {
    /// Запрограммировать порт --- [`initialize()`].
    Initialize = 0x00,

    /// Передать октет --- [`write()`].
    Write = 0x01,

    /// Принять октет --- [`read()`].
    Read = 0x02,

    /// Статус порта --- [`status()`].
    Status = 0x03,
}


/// Бит таймаута в статусе линии, который возвращает [`write()`].
pub const TIMEOUT_BIT: u8 = 1 << 7;

/// Классические базовые адреса последовательных портов
/// в порядке обнаружения.
const COM_BASES: [u16; 4] = [0x03F8, 0x02F8, 0x03E8, 0x02E8];

/// Таймаут операций с последовательным портом
/// в тиках системного таймера.
const COM_TIMEOUT_TICKS: u8 = 0x0A;

/// Смещение поля скорости в байте режима порта.
const MODE_RATE_SHIFT: u8 = 5;

/// Маска параметров линии в байте режима порта.
const MODE_LINE_MASK: u8 = 0x1F;

/// Делитель для кода скорости `0` --- исторические 110 бод.
const DEFAULT_DIVISOR: u16 = 0x0417;

/// База вычисления делителя по коду скорости:
/// делитель для кода `c` равен `0x600 >> c`.
const RATE_DIVISOR_BASE: u16 = 0x0600;

#[doc(hidden)]
pub mod test_scaffolding {
    use crate::bda::TickCounter;

    pub fn wait_ready(
        ticks: &TickCounter,
        timeout_ticks: u8,
        ready: impl FnMut() -> bool,
    ) -> bool {
        super::wait_ready(ticks, timeout_ticks, ready)
    }
}
