use enum_iterator::Sequence;
use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use cmos::{
    Cmos,
    PortCmos,
};

use crate::{
    bda::{
        BDA,
        Bda,
        WaitTarget,
    },
    error::{
        Error::Unsupported,
        Result,
    },
    time::{
        rtc::{
            self,
            AlarmTime,
            ClockDate,
            ClockTime,
            RegisterB,
        },
        wait,
    },
};


/// Выполняет запрос `request` к службам времени
/// на состоянии [`BDA`] и настоящей микросхеме часов реального времени.
pub fn dispatch(request: Request) -> Result<Response> {
    dispatch_with(&mut PortCmos, &BDA, request)
}


/// Выполняет запрос `request` к службам времени
/// на явно заданных микросхеме `cmos` и состоянии `bda`.
pub fn dispatch_with(
    cmos: &mut impl Cmos,
    bda: &Bda,
    request: Request,
) -> Result<Response> {
    match request {
        Request::GetTicks => {
            let (ticks, midnight_rollovers) = bda.ticks().read();

            Ok(Response::Ticks {
                ticks,
                midnight_rollovers,
            })
        },
        Request::SetTicks { ticks } => {
            bda.ticks().set(ticks);

            Ok(Response::Done)
        },
        Request::ReadTime => Ok(Response::Time(rtc::read_time(cmos)?)),
        Request::WriteTime { time } => {
            Ok(Response::Settings(rtc::write_time(cmos, time)))
        },
        Request::ReadDate => Ok(Response::Date(rtc::read_date(cmos)?)),
        Request::WriteDate { date } => {
            Ok(Response::Settings(rtc::write_date(cmos, date)?))
        },
        Request::SetAlarm { alarm } => {
            rtc::set_alarm(cmos, alarm)?;

            Ok(Response::Done)
        },
        Request::ClearAlarm => {
            Ok(Response::Settings(rtc::clear_alarm(cmos)))
        },
        Request::Sleep { micros } => {
            wait::sleep(cmos, bda.wait(), micros)?;

            Ok(Response::Done)
        },
        Request::SetInterval { micros, target } => {
            wait::start(cmos, bda.wait(), micros, target)
                .map_err(|_| Unsupported)?;

            Ok(Response::Done)
        },
        Request::ClearInterval => {
            wait::stop(cmos, bda.wait());

            Ok(Response::Done)
        },
    }
}


/// Запрос к службам времени.
#[derive(Clone, Copy, Debug)]
pub enum Request {
    /// Текущее значение счётчика тиков
    /// вместе с количеством переходов через полночь,
    /// см. [`TimeFunction::GetTicks`].
    GetTicks,

    /// Установить счётчик тиков в значение `ticks`,
    /// см. [`TimeFunction::SetTicks`].
    SetTicks {
        /// Новое значение счётчика тиков.
        ticks: u32,
    },

    /// Текущее время часов реального времени,
    /// см. [`TimeFunction::ReadTime`].
    ReadTime,

    /// Установить время часов реального времени,
    /// см. [`TimeFunction::WriteTime`].
    WriteTime {
        /// Новое время.
        time: ClockTime,
    },

    /// Текущая дата часов реального времени,
    /// см. [`TimeFunction::ReadDate`].
    ReadDate,

    /// Установить дату часов реального времени,
    /// см. [`TimeFunction::WriteDate`].
    WriteDate {
        /// Новая дата.
        date: ClockDate,
    },

    /// Завести будильник часов реального времени,
    /// см. [`TimeFunction::SetAlarm`].
    SetAlarm {
        /// Время срабатывания будильника.
        alarm: AlarmTime,
    },

    /// Отменить будильник часов реального времени,
    /// см. [`TimeFunction::ClearAlarm`].
    ClearAlarm,

    /// Синхронно подождать `micros` микросекунд,
    /// см. [`WaitFunction::Sleep`].
    Sleep {
        /// Время ожидания в микросекундах.
        micros: u32,
    },

    /// Запустить отложенное ожидание на `micros` микросекунд
    /// со взведением флага `target` по его истечении,
    /// см. [`WaitFunction::SetInterval`].
    SetInterval {
        /// Время ожидания в микросекундах.
        micros: u32,

        /// Флаг, который нужно взвести по истечении времени ожидания.
        target: WaitTarget,
    },

    /// Отменить запущенное отложенное ожидание,
    /// см. [`WaitFunction::ClearInterval`].
    ClearInterval,
}


/// Результат запроса к службам времени.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Response {
    /// Показания счётчика тиков.
    Ticks {
        /// Количество тиков, прошедших с полуночи.
        ticks: u32,

        /// Количество переходов через полночь с момента
        /// предыдущего запроса [`Request::GetTicks`].
        midnight_rollovers: u8,
    },

    /// Показания времени часов реального времени.
    Time(ClockTime),

    /// Показания даты часов реального времени.
    Date(ClockDate),

    /// Получившееся значение регистра настроек часов реального времени.
    Settings(RegisterB),

    /// Запрос выполнен, данных в ответе нет.
    Done,
}


/// Номера функций
/// [сервиса времени](https://stanislavs.org/helppc/int_1a.html)
/// классического интерфейса `INT 1A`.
///
/// Неизвестный номер функции транслируется в ошибку
/// [`Unsupported`] конверсией из [`num_enum::TryFromPrimitiveError`].
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
pub enum TimeFunction {
    /// Прочитать счётчик тиков --- [`Request::GetTicks`].
    GetTicks = 0x00,

    /// Установить счётчик тиков --- [`Request::SetTicks`].
    SetTicks = 0x01,

    /// Прочитать время --- [`Request::ReadTime`].
    ReadTime = 0x02,

    /// Установить время --- [`Request::WriteTime`].
    WriteTime = 0x03,

    /// Прочитать дату --- [`Request::ReadDate`].
    ReadDate = 0x04,

    /// Установить дату --- [`Request::WriteDate`].
    WriteDate = 0x05,

    /// Завести будильник --- [`Request::SetAlarm`].
    SetAlarm = 0x06,

    /// Отменить будильник --- [`Request::ClearAlarm`].
    ClearAlarm = 0x07,
}


/// Номера функций ожидания
/// [сервиса системы](https://stanislavs.org/helppc/int_15.html)
/// классического интерфейса `INT 15`.
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
pub enum WaitFunction {
    /// Запустить или отменить отложенное ожидание ---
    /// [`Request::SetInterval`] и [`Request::ClearInterval`].
    SetInterval = 0x83,

    /// Синхронно подождать --- [`Request::Sleep`].
    Sleep = 0x86,
}
