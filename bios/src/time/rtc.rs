use core::hint;

use bitflags::bitflags;
use derive_more::Display;

use cmos::Cmos;

use crate::error::{
    Error::{
        AlarmAlreadySet,
        ClockBusy,
    },
    Result,
};


/// Начальная настройка микросхемы
/// [часов реального времени (Real-time clock, RTC)](https://en.wikipedia.org/wiki/Real-time_clock).
///
/// Выставляет базовую частоту периодического прерывания 1024 Гц,
/// переводит микросхему в 24-часовой
/// [двоично--десятичный](https://en.wikipedia.org/wiki/Binary-coded_decimal)
/// формат и вычитывает регистры `C` и `D`,
/// сбрасывая возможный незавершённый запрос прерывания.
pub(super) fn init(cmos: &mut impl Cmos) {
    cmos.write(REGISTER_A, INITIAL_REGISTER_A);
    cmos.write(REGISTER_B, RegisterB::USE_24_HOUR_FORMAT.bits());

    cmos.read(REGISTER_C);
    cmos.read(REGISTER_D);
}


/// Считывает текущее время микросхемы RTC.
///
/// Возвращает ошибку [`ClockBusy`],
/// если микросхема не завершила обновление показаний за
/// [`UPDATE_POLL_LIMIT`] опросов регистра `A`.
pub fn read_time(cmos: &mut impl Cmos) -> Result<ClockTime> {
    wait_for_update_end(cmos)?;

    let settings = settings(cmos);

    Ok(ClockTime {
        hours: cmos.read(HOURS),
        minutes: cmos.read(MINUTES),
        seconds: cmos.read(SECONDS),
        daylight_saving: settings.contains(RegisterB::DAYLIGHT_SAVING),
    })
}


/// Записывает время `time` в микросхему RTC.
///
/// Если микросхема не завершила обновление показаний за
/// [`UPDATE_POLL_LIMIT`] опросов регистра `A`,
/// заново инициализирует её и всё равно записывает время.
///
/// Из прежних настроек микросхемы сохраняются только включённые
/// прерывания, формат времени принудительно выставляется в 24-часовой.
/// Возвращает получившееся значение регистра настроек.
pub fn write_time(
    cmos: &mut impl Cmos,
    time: ClockTime,
) -> RegisterB {
    if wait_for_update_end(cmos).is_err() {
        init(cmos);
    }

    cmos.write(SECONDS, time.seconds);
    cmos.write(MINUTES, time.minutes);
    cmos.write(HOURS, time.hours);

    let mut settings = settings(cmos) &
        (RegisterB::ALARM_INTERRUPT | RegisterB::PERIODIC_INTERRUPT) |
        RegisterB::USE_24_HOUR_FORMAT;
    settings.set(RegisterB::DAYLIGHT_SAVING, time.daylight_saving);

    cmos.write(REGISTER_B, settings.bits());

    settings
}


/// Считывает текущую дату микросхемы RTC.
///
/// Возвращает ошибку [`ClockBusy`],
/// если микросхема не завершила обновление показаний за
/// [`UPDATE_POLL_LIMIT`] опросов регистра `A`.
pub fn read_date(cmos: &mut impl Cmos) -> Result<ClockDate> {
    wait_for_update_end(cmos)?;

    Ok(ClockDate {
        century: cmos.read(CENTURY),
        year: cmos.read(YEAR),
        month: cmos.read(MONTH),
        day: cmos.read(DAY_OF_MONTH),
    })
}


/// Записывает дату `date` в микросхему RTC.
///
/// Если микросхема не завершила обновление показаний за
/// [`UPDATE_POLL_LIMIT`] опросов регистра `A`,
/// заново инициализирует её и возвращает ошибку [`ClockBusy`],
/// не записывая дату.
///
/// В случае успеха дополнительно сбрасывает флаг
/// [`RegisterB::SET_CLOCK`] и возвращает получившееся значение
/// регистра настроек.
pub fn write_date(
    cmos: &mut impl Cmos,
    date: ClockDate,
) -> Result<RegisterB> {
    if wait_for_update_end(cmos).is_err() {
        init(cmos);
        return Err(ClockBusy);
    }

    cmos.write(CENTURY, date.century);
    cmos.write(YEAR, date.year);
    cmos.write(MONTH, date.month);
    cmos.write(DAY_OF_MONTH, date.day);

    let settings = settings(cmos) - RegisterB::SET_CLOCK;
    cmos.write(REGISTER_B, settings.bits());

    Ok(settings)
}


/// Взводит будильник микросхемы RTC на время `alarm`
/// и включает прерывание будильника.
///
/// Если прерывание будильника уже включено,
/// возвращает ошибку [`AlarmAlreadySet`],
/// ничего не меняя в микросхеме.
///
/// Если микросхема не завершила обновление показаний за
/// [`UPDATE_POLL_LIMIT`] опросов регистра `A`,
/// заново инициализирует её и всё равно взводит будильник.
pub fn set_alarm(
    cmos: &mut impl Cmos,
    alarm: AlarmTime,
) -> Result<()> {
    let settings = settings(cmos);
    if settings.contains(RegisterB::ALARM_INTERRUPT) {
        return Err(AlarmAlreadySet);
    }

    if wait_for_update_end(cmos).is_err() {
        init(cmos);
    }

    cmos.write(SECONDS_ALARM, alarm.seconds);
    cmos.write(MINUTES_ALARM, alarm.minutes);
    cmos.write(HOURS_ALARM, alarm.hours);

    let settings =
        (settings - RegisterB::SET_CLOCK) | RegisterB::ALARM_INTERRUPT;
    cmos.write(REGISTER_B, settings.bits());

    Ok(())
}


/// Выключает прерывание будильника микросхемы RTC
/// вместе с флагом [`RegisterB::SET_CLOCK`].
///
/// Возвращает значение регистра настроек до его изменения.
pub fn clear_alarm(cmos: &mut impl Cmos) -> RegisterB {
    let old_settings = settings(cmos);
    let new_settings = old_settings -
        (RegisterB::SET_CLOCK | RegisterB::ALARM_INTERRUPT);

    cmos.write(REGISTER_B, new_settings.bits());

    old_settings
}


/// Включает или выключает периодическое прерывание микросхемы RTC.
pub(crate) fn set_periodic_interrupt(
    cmos: &mut impl Cmos,
    enabled: bool,
) {
    let mut settings = settings(cmos);
    settings.set(RegisterB::PERIODIC_INTERRUPT, enabled);

    cmos.write(REGISTER_B, settings.bits());
}


/// Текущие настройки микросхемы RTC --- регистр `B`.
pub(crate) fn settings(cmos: &mut impl Cmos) -> RegisterB {
    RegisterB::from_bits_truncate(cmos.read(REGISTER_B))
}


/// Читает регистр статуса прерывания RTC.
/// Чтение сбрасывает регистр и тем самым разрешает микросхеме
/// генерировать следующее прерывание.
pub(crate) fn interrupt_status(cmos: &mut impl Cmos) -> RegisterC {
    RegisterC::from_bits_truncate(cmos.read(REGISTER_C))
}


/// [Ждёт](https://wiki.osdev.org/CMOS#RTC_Update_In_Progress),
/// пока микросхема RTC завершит обновление показаний времени,
/// то есть пока в регистре `A` установлен флаг
/// [`RegisterA::UPDATE_IN_PROGRESS`].
///
/// Обновление занимает порядка 244 микросекунд,
/// поэтому ожидание ограничено [`UPDATE_POLL_LIMIT`] опросами.
/// Если флаг не сбросился за это время,
/// возвращает ошибку [`ClockBusy`].
fn wait_for_update_end(cmos: &mut impl Cmos) -> Result<()> {
    for _ in 0..UPDATE_POLL_LIMIT {
        let status = RegisterA::from_bits_truncate(cmos.read(REGISTER_A));
        if !status.contains(RegisterA::UPDATE_IN_PROGRESS) {
            return Ok(());
        }

        hint::spin_loop();
    }

    Err(ClockBusy)
}


/// Переводит значение `x` из
/// [двоично--десятичного](https://en.wikipedia.org/wiki/Binary-coded_decimal)
/// формата, в котором микросхема RTC хранит показания времени,
/// в двоичный.
pub(crate) fn bcd_to_binary(x: u8) -> u8 {
    (x / 16) * 10 + (x % 16)
}


bitflags! {
    /// Регистр статуса RTC.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct RegisterA: u8 {
        const UPDATE_IN_PROGRESS = 1 << 7;
    }
}

bitflags! {
    /// Регистр настроек RTC.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct RegisterB: u8 {
        /// Включает переход на летнее время.
        const DAYLIGHT_SAVING = 1 << 0;

        /// Время в микросхеме хранится
        /// в [24-часовом формате](https://en.wikipedia.org/wiki/24-hour_clock),
        /// а не в [12--часовом](https://en.wikipedia.org/wiki/12-hour_clock).
        const USE_24_HOUR_FORMAT = 1 << 1;

        /// Время в микросхеме хранится
        /// в [двоичном коде](https://en.wikipedia.org/wiki/Binary_number),
        /// а не в [двоично--десятичном](https://en.wikipedia.org/wiki/Binary-coded_decimal).
        const USE_BINARY_FORMAT = 1 << 2;

        /// Генерировать сигнал с конфигурируемой частотой на отдельном выходе микросхемы.
        const SQUARE_WAVE = 1 << 3;

        /// Включает
        /// [прерывание](https://en.wikipedia.org/wiki/Interrupt),
        /// посылаемое процессору микросхемой после обновления показаний времени при тике.
        const UPDATE_ENDED_INTERRUPT = 1 << 4;

        /// Включает
        /// [прерывание](https://en.wikipedia.org/wiki/Interrupt),
        /// посылаемое процессору при срабатывании будильника.
        const ALARM_INTERRUPT = 1 << 5;

        /// Включает периодическое
        /// [прерывание](https://en.wikipedia.org/wiki/Interrupt)
        /// с конфигурируемой частотой.
        const PERIODIC_INTERRUPT = 1 << 6;

        /// Сообщает микросхеме, что процессор меняет дату и время.
        /// Пока процессор не сбросит этот бит, микросхема не будет их обновлять.
        const SET_CLOCK = 1 << 7;
    }
}

bitflags! {
    /// Регистр статуса прерывания RTC. Сбрасывается при чтении.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct RegisterC: u8 {
        /// Микросхема сгенерировала прерывание как минимум одного из типов.
        const INTERRUPT = 1 << 7;

        /// Сгенерировано периодическое прерывание.
        const PERIODIC_INTERRUPT = 1 << 6;

        /// Сгенерировано прерывание будильника.
        const ALARM_INTERRUPT = 1 << 5;

        /// Сгенерировано прерывание после обновления показаний времени.
        const UPDATE_ENDED_INTERRUPT = 1 << 4;
    }
}

bitflags! {
    /// Регистр сохранности данных в памяти RTC при выключении.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct RegisterD: u8 {
        /// Есть заряд в батарейке.
        /// Поэтому данные в памяти RTC валидны, в том числе дата и время.
        const VALID_RAM_AND_TIME = 1 << 7;
    }
}


/// Показания времени микросхемы RTC в её родном
/// [двоично--десятичном](https://en.wikipedia.org/wiki/Binary-coded_decimal)
/// 24-часовом формате.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[display("{hours:02x}:{minutes:02x}:{seconds:02x}")]
pub struct ClockTime {
    /// Час в двоично--десятичном формате.
    pub hours: u8,

    /// Минута в двоично--десятичном формате.
    pub minutes: u8,

    /// Секунда в двоично--десятичном формате.
    pub seconds: u8,

    /// Включён ли переход на летнее время.
    pub daylight_saving: bool,
}


/// Показания даты микросхемы RTC в её родном
/// [двоично--десятичном](https://en.wikipedia.org/wiki/Binary-coded_decimal)
/// формате.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[display("{century:02x}{year:02x}-{month:02x}-{day:02x}")]
pub struct ClockDate {
    /// Век в двоично--десятичном формате.
    pub century: u8,

    /// Год внутри века в двоично--десятичном формате.
    pub year: u8,

    /// Месяц в двоично--десятичном формате.
    pub month: u8,

    /// День месяца в двоично--десятичном формате.
    pub day: u8,
}


/// Время срабатывания будильника микросхемы RTC в её родном
/// [двоично--десятичном](https://en.wikipedia.org/wiki/Binary-coded_decimal)
/// 24-часовом формате.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[display("{hours:02x}:{minutes:02x}:{seconds:02x}")]
pub struct AlarmTime {
    /// Час в двоично--десятичном формате.
    pub hours: u8,

    /// Минута в двоично--десятичном формате.
    pub minutes: u8,

    /// Секунда в двоично--десятичном формате.
    pub seconds: u8,
}


/// Максимальное количество опросов регистра `A`
/// в ожидании завершения обновления показаний времени.
pub const UPDATE_POLL_LIMIT: usize = 25_000;

/// Начальное значение регистра `A` ---
/// частота периодического прерывания 1024 Гц
/// при базовой частоте микросхемы 32768 Гц.
const INITIAL_REGISTER_A: u8 = 0x26;

/// Адрес регистра секунд в памяти RTC.
const SECONDS: u8 = 0x00;

/// Адрес регистра секунды срабатывания будильника в памяти RTC.
const SECONDS_ALARM: u8 = 0x01;

/// Адрес регистра минут в памяти RTC.
const MINUTES: u8 = 0x02;

/// Адрес регистра минуты срабатывания будильника в памяти RTC.
const MINUTES_ALARM: u8 = 0x03;

/// Адрес регистра часов в памяти RTC.
const HOURS: u8 = 0x04;

/// Адрес регистра часа срабатывания будильника в памяти RTC.
const HOURS_ALARM: u8 = 0x05;

/// Адрес регистра дня месяца в памяти RTC.
const DAY_OF_MONTH: u8 = 0x07;

/// Адрес регистра месяца в памяти RTC.
const MONTH: u8 = 0x08;

/// Адрес регистра года в памяти RTC.
const YEAR: u8 = 0x09;

/// Адрес регистра века в памяти RTC.
const CENTURY: u8 = 0x32;

/// Адрес регистра статуса RTC.
const REGISTER_A: u8 = 0xA;

/// Адрес регистра настроек RTC.
const REGISTER_B: u8 = 0xB;

/// Адрес регистра статуса прерывания RTC.
const REGISTER_C: u8 = 0xC;

/// Адрес регистра сохранности данных в памяти RTC при выключении.
const REGISTER_D: u8 = 0xD;

#[doc(hidden)]
pub mod test_scaffolding {
    use cmos::Cmos;

    pub use super::{
        RegisterB,
        RegisterC,
    };

    pub fn bcd_to_binary(x: u8) -> u8 {
        super::bcd_to_binary(x)
    }

    pub fn init(cmos: &mut impl Cmos) {
        super::init(cmos)
    }

    pub fn interrupt_status(cmos: &mut impl Cmos) -> RegisterC {
        super::interrupt_status(cmos)
    }

    pub fn set_periodic_interrupt(
        cmos: &mut impl Cmos,
        enabled: bool,
    ) {
        super::set_periodic_interrupt(cmos, enabled)
    }

    pub fn settings(cmos: &mut impl Cmos) -> RegisterB {
        super::settings(cmos)
    }
}
