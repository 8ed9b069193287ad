#![deny(warnings)]

use std::time::Duration;

use rstest::rstest;

use bios::{
    error::Error::{
        AlarmAlreadySet,
        ClockBusy,
    },
    log::debug,
    time::rtc::{
        self,
        AlarmTime,
        ClockDate,
        ClockTime,
        UPDATE_POLL_LIMIT,
        test_scaffolding,
        test_scaffolding::RegisterB,
    },
};

mod fake;
mod log;

use fake::FakeCmos;


#[rstest]
#[timeout(Duration::from_secs(1))]
fn init_sequence() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_C, 0xC0);

    test_scaffolding::init(&mut cmos);

    assert_eq!(cmos.register(REGISTER_A), 0x26);
    assert_eq!(cmos.register(REGISTER_B), RegisterB::USE_24_HOUR_FORMAT.bits());
    assert_eq!(
        cmos.register(REGISTER_C),
        0,
        "init should drain a pending interrupt status",
    );
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn read_time() {
    let mut cmos = FakeCmos::with_time(0x23, 0x59, 0x58);
    cmos.preset(REGISTER_B, RegisterB::DAYLIGHT_SAVING.bits());

    let time = rtc::read_time(&mut cmos).unwrap();
    debug!(%time, "RTC");

    assert_eq!(time, ClockTime {
        hours: 0x23,
        minutes: 0x59,
        seconds: 0x58,
        daylight_saving: true,
    });
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn read_time_from_busy_clock() {
    let mut cmos = FakeCmos::with_time(0x23, 0x59, 0x58).stick_update();

    assert_eq!(rtc::read_time(&mut cmos), Err(ClockBusy));
    assert_eq!(
        cmos.register_a_reads(),
        UPDATE_POLL_LIMIT,
        "the busy poll should give up after a fixed number of status reads",
    );
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn write_time_keeps_only_interrupt_settings() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_B, 0xFF);

    let time = ClockTime {
        hours: 0x12,
        minutes: 0x34,
        seconds: 0x56,
        daylight_saving: true,
    };
    let settings = rtc::write_time(&mut cmos, time);

    assert_eq!(settings.bits(), 0x63);
    assert_eq!(cmos.register(REGISTER_B), 0x63);
    assert_eq!(cmos.register(0x00), 0x56);
    assert_eq!(cmos.register(0x02), 0x34);
    assert_eq!(cmos.register(0x04), 0x12);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn write_time_reinitializes_busy_clock() {
    let mut cmos = FakeCmos::new().stick_update();

    let settings = rtc::write_time(&mut cmos, ClockTime::default());

    assert_eq!(cmos.register(REGISTER_A), 0x26);
    assert_eq!(
        settings,
        RegisterB::USE_24_HOUR_FORMAT,
        "nothing but the format flag should survive the reinit",
    );
    assert_eq!(cmos.register(0x00), 0, "the time should be written anyway");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn read_date() {
    let mut cmos = FakeCmos::new();
    cmos.preset(0x32, 0x20);
    cmos.preset(0x09, 0x26);
    cmos.preset(0x08, 0x08);
    cmos.preset(0x07, 0x29);

    let date = rtc::read_date(&mut cmos).unwrap();
    debug!(%date, "RTC");

    assert_eq!(date, ClockDate {
        century: 0x20,
        year: 0x26,
        month: 0x08,
        day: 0x29,
    });
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn write_date_clears_set_clock() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_B, 0xFF);

    let date = ClockDate {
        century: 0x20,
        year: 0x26,
        month: 0x08,
        day: 0x29,
    };
    let settings = rtc::write_date(&mut cmos, date).unwrap();

    assert_eq!(settings.bits(), 0x7F);
    assert_eq!(cmos.register(0x32), 0x20);
    assert_eq!(cmos.register(0x09), 0x26);
    assert_eq!(cmos.register(0x08), 0x08);
    assert_eq!(cmos.register(0x07), 0x29);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn write_date_to_busy_clock() {
    let mut cmos = FakeCmos::new().stick_update();
    cmos.preset(0x07, 0x11);

    let date = ClockDate {
        century: 0x20,
        year: 0x26,
        month: 0x08,
        day: 0x29,
    };

    assert_eq!(rtc::write_date(&mut cmos, date), Err(ClockBusy));
    assert_eq!(cmos.register(REGISTER_A), 0x26, "the clock should be reinitialized");
    assert_eq!(cmos.register(0x07), 0x11, "the date should stay untouched");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn set_alarm() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_B, 0x82);

    let alarm = AlarmTime {
        hours: 0x07,
        minutes: 0x30,
        seconds: 0x00,
    };
    rtc::set_alarm(&mut cmos, alarm).unwrap();

    assert_eq!(cmos.register(0x01), 0x00);
    assert_eq!(cmos.register(0x03), 0x30);
    assert_eq!(cmos.register(0x05), 0x07);
    assert_eq!(
        cmos.register(REGISTER_B),
        0x22,
        "the alarm interrupt should be on and the set-clock flag off",
    );
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn set_alarm_reinitializes_busy_clock() {
    let mut cmos = FakeCmos::new().stick_update();
    cmos.preset(REGISTER_B, 0x02);

    let alarm = AlarmTime {
        hours: 0x07,
        minutes: 0x30,
        seconds: 0x00,
    };
    rtc::set_alarm(&mut cmos, alarm).unwrap();

    assert_eq!(cmos.register(REGISTER_A), 0x26);
    assert_eq!(cmos.register(0x05), 0x07, "the alarm should be set anyway");
    assert_eq!(cmos.register(REGISTER_B), 0x22);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn only_one_alarm_at_a_time() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_B, RegisterB::ALARM_INTERRUPT.bits());
    cmos.preset(0x05, 0x07);

    let alarm = AlarmTime {
        hours: 0x09,
        minutes: 0x00,
        seconds: 0x00,
    };

    assert_eq!(rtc::set_alarm(&mut cmos, alarm), Err(AlarmAlreadySet));
    assert_eq!(cmos.register(0x05), 0x07, "the pending alarm should stay untouched");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn clear_alarm_reports_previous_settings() {
    let mut cmos = FakeCmos::new();
    cmos.preset(REGISTER_B, 0xB2);

    let previous = rtc::clear_alarm(&mut cmos);

    assert_eq!(previous.bits(), 0xB2);
    assert_eq!(cmos.register(REGISTER_B), 0x12);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
#[case(0x00, 0)]
#[case(0x09, 9)]
#[case(0x10, 10)]
#[case(0x59, 59)]
#[case(0x23, 23)]
fn bcd(
    #[case] value: u8,
    #[case] binary: u8,
) {
    assert_eq!(test_scaffolding::bcd_to_binary(value), binary);
}


const REGISTER_A: u8 = 0xA;
const REGISTER_B: u8 = 0xB;
const REGISTER_C: u8 = 0xC;


#[ctor::ctor(unsafe)]
fn init() {
    log::init();
}
