use scopeguard::defer;

use cmos::Cmos;

use crate::{
    bda::{
        BDA,
        TickCounter,
    },
    log::warn,
    sync::IrqSpinlock,
};

use super::{
    TIMER_LINE,
    rtc,
};


/// Обработчик прерываний системного таймера
/// [Intel 8253/8254](https://en.wikipedia.org/wiki/Intel_8253).
pub fn interrupt() {
    defer! {
        unsafe {
            pic8259::end_of_interrupt(TIMER_LINE);
        }
    }

    let hook = *TICK_HOOK.lock();

    accumulate(BDA.ticks(), hook);
}


/// Устанавливает пользовательский обработчик `hook`,
/// который будет вызываться на каждом тике системного таймера.
pub fn set_tick_hook(hook: TickHook) {
    *TICK_HOOK.lock() = Some(hook);
}


/// Снимает пользовательский обработчик тиков системного таймера.
pub fn clear_tick_hook() {
    *TICK_HOOK.lock() = None;
}


/// Продвигает счётчик тиков `ticks` на один тик
/// и вызывает пользовательский обработчик `hook`, если он установлен.
fn accumulate(
    ticks: &TickCounter,
    hook: Option<TickHook>,
) {
    ticks.advance();

    if let Some(hook) = hook {
        hook();
    }
}


/// Засевает счётчик тиков `ticks` по текущим показаниям
/// часов реального времени.
///
/// Если прочитать показания не удалось,
/// оставляет счётчик обнулённым, как будто сейчас полночь.
pub(super) fn init(
    cmos: &mut impl Cmos,
    ticks: &TickCounter,
) {
    match rtc::read_time(cmos) {
        Ok(time) => {
            let seconds = rtc::bcd_to_binary(time.seconds);
            let minutes = rtc::bcd_to_binary(time.minutes);
            let hours = rtc::bcd_to_binary(time.hours);

            ticks.set(initial_ticks(seconds, minutes, hours));
        },
        Err(error) => {
            warn!(?error, "failed to seed the tick counter from RTC");
        },
    }
}


/// Количество тиков системного таймера,
/// прошедших с полуночи до момента `hours:minutes:seconds`.
///
/// Множители подобраны так, чтобы при целочисленном вычислении
/// накопленная ошибка за сутки не превышала одного тика
/// частоты 18.2065 Гц.
fn initial_ticks(
    seconds: u8,
    minutes: u8,
    hours: u8,
) -> u32 {
    let second_ticks =
        u32::from(seconds) * SECOND_NUMERATOR / SECOND_DENOMINATOR;
    let minute_ticks =
        u32::from(minutes) * MINUTE_NUMERATOR / MINUTE_DENOMINATOR;
    let hour_ticks = u32::from(hours) * HOUR_NUMERATOR / HOUR_DENOMINATOR;

    second_ticks + minute_ticks + hour_ticks
}


/// Пользовательский обработчик, вызываемый на каждом тике
/// системного таймера.
pub type TickHook = fn();


/// Установленный пользовательский обработчик тиков системного таймера.
static TICK_HOOK: IrqSpinlock<Option<TickHook>> = IrqSpinlock::new(None);

/// Числитель количества тиков в секунде, 18.206507 тика.
const SECOND_NUMERATOR: u32 = 18_206_507;

/// Знаменатель количества тиков в секунде.
const SECOND_DENOMINATOR: u32 = 1_000_000;

/// Числитель количества тиков в минуте, 1092.3904 тика.
const MINUTE_NUMERATOR: u32 = 10_923_904;

/// Знаменатель количества тиков в минуте.
const MINUTE_DENOMINATOR: u32 = 10_000;

/// Числитель количества тиков в часе, 65543.427 тика.
const HOUR_NUMERATOR: u32 = 65_543_427;

/// Знаменатель количества тиков в часе.
const HOUR_DENOMINATOR: u32 = 1_000;

#[doc(hidden)]
pub mod test_scaffolding {
    use cmos::Cmos;

    use crate::bda::TickCounter;

    use super::TickHook;

    pub fn accumulate(
        ticks: &TickCounter,
        hook: Option<TickHook>,
    ) {
        super::accumulate(ticks, hook)
    }

    pub fn init(
        cmos: &mut impl Cmos,
        ticks: &TickCounter,
    ) {
        super::init(cmos, ticks)
    }

    pub fn initial_ticks(
        seconds: u8,
        minutes: u8,
        hours: u8,
    ) -> u32 {
        super::initial_ticks(seconds, minutes, hours)
    }
}
