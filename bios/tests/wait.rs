#![deny(warnings)]

use std::{
    sync::atomic::{
        AtomicBool,
        AtomicU8,
        AtomicUsize,
        Ordering,
    },
    thread,
    time::Duration,
};

use rstest::rstest;

use bios::{
    bda::{
        PendingWait,
        WaitTarget,
    },
    error::Error::{
        ClockInUse,
        InvalidArgument,
    },
    log::debug,
    sync::IrqSpinlock,
    time::{
        rtc::test_scaffolding::RegisterB,
        wait::{
            PERIODIC_INTERVAL_MICROS,
            test_scaffolding::{
                advance,
                service,
                sleep,
                start,
                stop,
            },
        },
    },
};

mod fake;
mod log;

use fake::FakeCmos;


#[rstest]
#[timeout(Duration::from_secs(1))]
fn target_mask_must_be_nonzero() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    assert_eq!(WaitTarget::from_static(&FLAG, 0).unwrap_err(), InvalidArgument);
    assert!(WaitTarget::from_static(&FLAG, 1 << 7).is_ok());
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn start_enables_the_periodic_interrupt() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 10_000, target).unwrap();

    assert!(wait.lock().is_active());
    assert_eq!(wait.lock().remaining_micros(), 10_000);
    assert!(settings(&mut cmos).contains(RegisterB::PERIODIC_INTERRUPT));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn only_one_wait_at_a_time() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 10_000, target).unwrap();

    assert_eq!(start(&mut cmos, &wait, 10_000, target), Err(ClockInUse));
    assert_eq!(
        wait.lock().remaining_micros(),
        10_000,
        "the active wait should stay untouched",
    );
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance_subtracts_one_period() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 5_000, target).unwrap();
    advance(&mut cmos, &mut wait.lock());

    assert_eq!(wait.lock().remaining_micros(), 5_000 - PERIODIC_INTERVAL_MICROS);
    assert_eq!(FLAG.load(Ordering::Acquire), 0);
    assert!(settings(&mut cmos).contains(RegisterB::PERIODIC_INTERRUPT));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance_completes_a_short_wait() {
    static FLAG: AtomicU8 = AtomicU8::new(0b0000_0100);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1 << 7).unwrap();

    start(&mut cmos, &wait, 500, target).unwrap();
    advance(&mut cmos, &mut wait.lock());

    assert_eq!(
        FLAG.load(Ordering::Acquire),
        0b1000_0100,
        "the mask should be merged into the flag byte",
    );
    assert!(!wait.lock().is_active());
    assert!(!settings(&mut cmos).contains(RegisterB::PERIODIC_INTERRUPT));
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance_completes_after_enough_periods() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 2_000, target).unwrap();

    let mut periods = 0;
    while wait.lock().is_active() {
        let remaining = wait.lock().remaining_micros();
        debug!(periods, remaining, "advancing");

        advance(&mut cmos, &mut wait.lock());
        periods += 1;

        assert!(periods <= 3, "a 2000 us wait should complete in three 977 us periods");
    }

    assert_eq!(periods, 3);
    assert_eq!(FLAG.load(Ordering::Acquire), 1);
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn advance_ignores_an_idle_wait() {
    let mut cmos = FakeCmos::new();
    let mut pending = PendingWait::new();

    advance(&mut cmos, &mut pending);

    assert!(!pending.is_active());
    assert!(cmos.writes().is_empty(), "an idle wait should not touch the clock");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn stop_cancels_without_completing() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 10_000, target).unwrap();
    stop(&mut cmos, &wait);

    assert!(!wait.lock().is_active());
    assert_eq!(FLAG.load(Ordering::Acquire), 0, "a cancelled wait should not raise its flag");
    assert!(!settings(&mut cmos).contains(RegisterB::PERIODIC_INTERRUPT));

    start(&mut cmos, &wait, 10_000, target).unwrap();
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn service_advances_on_a_periodic_interrupt() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 5_000, target).unwrap();

    cmos.preset(REGISTER_C, 0xC0);
    service(&mut cmos, &wait, None);

    assert_eq!(wait.lock().remaining_micros(), 5_000 - PERIODIC_INTERVAL_MICROS);
    assert_eq!(cmos.register(REGISTER_C), 0, "the interrupt status should be drained");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn service_ignores_an_unrequested_interrupt() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());

    wait.lock().arm(5_000, WaitTarget::from_static(&FLAG, 1).unwrap());

    cmos.preset(REGISTER_C, 0xC0);
    service(&mut cmos, &wait, None);

    assert_eq!(
        wait.lock().remaining_micros(),
        5_000,
        "neither interrupt is enabled in the settings, so nothing should advance",
    );
    assert_eq!(cmos.register(REGISTER_C), 0, "the interrupt status should be drained anyway");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn service_calls_the_alarm_hook() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn alarm() {
        CALLS.fetch_add(1, Ordering::Relaxed);
    }

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());

    cmos.preset(REGISTER_B, RegisterB::ALARM_INTERRUPT.bits());
    cmos.preset(REGISTER_C, 0xA0);
    service(&mut cmos, &wait, Some(alarm));

    assert_eq!(CALLS.load(Ordering::Relaxed), 1);

    service(&mut cmos, &wait, Some(alarm));
    assert_eq!(CALLS.load(Ordering::Relaxed), 1, "the drained status should not re-fire the hook");
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn sleep_completes_on_the_periodic_interrupt() {
    let wait = IrqSpinlock::new(PendingWait::new());
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            let mut cmos = FakeCmos::new();
            sleep(&mut cmos, &wait, 500).unwrap();
            done.store(true, Ordering::Release);
        });

        // Plays the periodic interrupt until the sleeper wakes up.
        let mut cmos = FakeCmos::new();
        while !done.load(Ordering::Acquire) {
            advance(&mut cmos, &mut wait.lock());
        }
    });

    assert!(!wait.lock().is_active());
}


#[rstest]
#[timeout(Duration::from_secs(1))]
fn sleep_reports_a_busy_wait() {
    static FLAG: AtomicU8 = AtomicU8::new(0);

    let mut cmos = FakeCmos::new();
    let wait = IrqSpinlock::new(PendingWait::new());
    let target = WaitTarget::from_static(&FLAG, 1).unwrap();

    start(&mut cmos, &wait, 10_000, target).unwrap();

    assert_eq!(sleep(&mut cmos, &wait, 500), Err(ClockInUse));
    assert_eq!(
        wait.lock().remaining_micros(),
        10_000,
        "the active wait should stay untouched",
    );
}


fn settings(cmos: &mut FakeCmos) -> RegisterB {
    bios::time::rtc::test_scaffolding::settings(cmos)
}


const REGISTER_B: u8 = 0xB;
const REGISTER_C: u8 = 0xC;


#[ctor::ctor(unsafe)]
fn init() {
    log::init();
}
