use chrono::NaiveDate;

use cmos::PortCmos;

use crate::{
    bda::BDA,
    log::{
        info,
        warn,
    },
};


/// Таймер
/// [Intel 8253/8254](https://en.wikipedia.org/wiki/Intel_8253).
mod pit8254;

/// Микросхема
/// [часов реального времени (Real-time clock, RTC)](https://en.wikipedia.org/wiki/Real-time_clock).
pub mod rtc;

/// Счётчик тиков системного таймера.
pub mod ticks;

/// Отложенные уведомления по периодическому прерыванию
/// часов реального времени.
pub mod wait;


/// Инициализация служб времени.
///
/// Программирует таймер и часы реального времени,
/// засевает счётчик тиков по текущим показаниям часов
/// и разрешает прерывания обоих устройств
/// на контроллере прерываний.
pub(super) fn init() {
    let cmos = &mut PortCmos;

    pit8254::init();
    rtc::init(cmos);
    ticks::init(cmos, BDA.ticks());

    unsafe {
        pic8259::enable_line(TIMER_LINE);
        pic8259::enable_line(RTC_LINE);
    }

    log_boot_datetime(cmos);

    info!("time init");
}


/// Записывает в лог дату и время загрузки по показаниям
/// часов реального времени.
fn log_boot_datetime(cmos: &mut PortCmos) {
    let Ok(time) = rtc::read_time(cmos) else {
        warn!("RTC is busy, boot time is unknown");
        return;
    };
    let Ok(date) = rtc::read_date(cmos) else {
        warn!("RTC is busy, boot date is unknown");
        return;
    };

    let year = i32::from(rtc::bcd_to_binary(date.century)) * 100 +
        i32::from(rtc::bcd_to_binary(date.year));
    let datetime = NaiveDate::from_ymd_opt(
        year,
        rtc::bcd_to_binary(date.month).into(),
        rtc::bcd_to_binary(date.day).into(),
    )
    .and_then(|date| {
        date.and_hms_opt(
            rtc::bcd_to_binary(time.hours).into(),
            rtc::bcd_to_binary(time.minutes).into(),
            rtc::bcd_to_binary(time.seconds).into(),
        )
    });

    if let Some(datetime) = datetime {
        info!(%datetime, "booted at");
    } else {
        warn!(%date, %time, "RTC reports an invalid date");
    }
}


/// Линия системного таймера на контроллере прерываний.
pub(crate) const TIMER_LINE: u8 = 0;

/// Линия часов реального времени на контроллере прерываний.
pub(crate) const RTC_LINE: u8 = 8;
