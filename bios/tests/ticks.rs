#![deny(warnings)]

use std::{
    sync::atomic::{
        AtomicUsize,
        Ordering,
    },
    time::Duration,
};

use rstest::rstest;

use bios::{
    bda::{
        TICKS_PER_DAY,
        TickCounter,
    },
    log::debug,
    time::ticks::test_scaffolding::{
        accumulate,
        init as seed,
        initial_ticks,
    },
};

mod fake;
mod log;

use fake::FakeCmos;


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance() {
    let ticks = TickCounter::new();

    for expected in 1 ..= 100 {
        accumulate(&ticks, None);
        assert_eq!(ticks.current(), expected);
    }

    assert_eq!(ticks.read(), (100, 0));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn midnight_rollover() {
    let ticks = TickCounter::new();

    ticks.set(TICKS_PER_DAY - 1);
    accumulate(&ticks, None);

    assert_eq!(ticks.read(), (0, 1));
    assert_eq!(ticks.read(), (0, 0), "reading should clear the rollover count");

    ticks.set(TICKS_PER_DAY - 1);
    accumulate(&ticks, None);
    accumulate(&ticks, None);
    assert_eq!(ticks.read(), (1, 1));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance_wraps_a_saturated_counter() {
    let ticks = TickCounter::new();

    ticks.set(u32::MAX);
    accumulate(&ticks, None);

    assert_eq!(
        ticks.read(),
        (0, 0),
        "a counter set past the daily limit should wrap without a rollover",
    );
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn set_clears_rollovers() {
    let ticks = TickCounter::new();

    ticks.set(TICKS_PER_DAY - 1);
    accumulate(&ticks, None);
    ticks.set(12_345);

    assert_eq!(ticks.read(), (12_345, 0));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn tick_hook() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn hook() {
        CALLS.fetch_add(1, Ordering::Relaxed);
    }

    let ticks = TickCounter::new();

    accumulate(&ticks, None);
    assert_eq!(CALLS.load(Ordering::Relaxed), 0);

    accumulate(&ticks, Some(hook));
    accumulate(&ticks, Some(hook));
    assert_eq!(CALLS.load(Ordering::Relaxed), 2);
    assert_eq!(ticks.current(), 3);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
#[case::midnight(0x00, 0x00, 0x00, 0)]
#[case::one_second(0x00, 0x00, 0x01, 18)]
#[case::noonish(0x12, 0x34, 0x56, 824_681)]
#[case::last_second(0x23, 0x59, 0x59, 1_573_023)]
fn seeding(
    #[case] hours: u8,
    #[case] minutes: u8,
    #[case] seconds: u8,
    #[case] expected: u32,
) {
    let mut cmos = FakeCmos::with_time(hours, minutes, seconds);
    let ticks = TickCounter::new();

    seed(&mut cmos, &ticks);

    debug!(hours, minutes, seconds, ticks = ticks.current(), "seeded");

    assert_eq!(ticks.current(), expected);
    assert!(ticks.current() < TICKS_PER_DAY);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn seeding_with_busy_clock() {
    let mut cmos = FakeCmos::with_time(0x12, 0x34, 0x56).stick_update();
    let ticks = TickCounter::new();

    seed(&mut cmos, &ticks);

    assert_eq!(ticks.current(), 0, "a busy clock should leave the counter at midnight");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn seeding_is_monotone() {
    let mut previous = 0;

    for hours in 0 .. 24 {
        for minutes in [0, 30, 59] {
            let ticks = initial_ticks(0, minutes, hours);
            assert!(ticks >= previous);
            previous = ticks;
        }
    }
}


#[ctor::ctor(unsafe)]
fn init() {
    log::init();
}
