use core::sync::atomic::{
    AtomicU8,
    Ordering,
};

use scopeguard::defer;

use cmos::{
    Cmos,
    PortCmos,
};

use crate::{
    bda::{
        BDA,
        PendingWait,
        WaitTarget,
    },
    error::{
        Error::ClockInUse,
        Result,
    },
    sync::IrqSpinlock,
};

use super::{
    RTC_LINE,
    rtc::{
        self,
        RegisterB,
        RegisterC,
    },
};


/// Обработчик прерываний часов реального времени.
pub fn interrupt() {
    defer! {
        unsafe {
            pic8259::end_of_interrupt(RTC_LINE);
        }
    }

    let alarm_hook = *ALARM_HOOK.lock();

    service(&mut PortCmos, BDA.wait(), alarm_hook);
}


/// Устанавливает пользовательский обработчик `hook`,
/// который будет вызываться при срабатывании будильника
/// часов реального времени.
pub fn set_alarm_hook(hook: AlarmHook) {
    *ALARM_HOOK.lock() = Some(hook);
}


/// Снимает пользовательский обработчик будильника
/// часов реального времени.
pub fn clear_alarm_hook() {
    *ALARM_HOOK.lock() = None;
}


/// Обслуживает прерывание часов реального времени.
///
/// Показание регистра `C` вычитывается безусловно,
/// иначе микросхема не сгенерирует следующее прерывание.
/// Но реагировать на него нужно лишь когда прерывания будильника или
/// периодическое включены в регистре `B`,
/// незапрошенные прерывания игнорируются.
fn service(
    cmos: &mut impl Cmos,
    wait: &IrqSpinlock<PendingWait>,
    alarm_hook: Option<AlarmHook>,
) {
    let settings = rtc::settings(cmos);
    let status = rtc::interrupt_status(cmos);

    if !settings.intersects(
        RegisterB::ALARM_INTERRUPT | RegisterB::PERIODIC_INTERRUPT,
    ) {
        return;
    }

    if status.contains(RegisterC::ALARM_INTERRUPT) &&
        let Some(hook) = alarm_hook
    {
        hook();
    }

    if status.contains(RegisterC::PERIODIC_INTERRUPT) {
        advance(cmos, &mut wait.lock());
    }
}


/// Продвигает активное отложенное ожидание `pending` на один период
/// периодического прерывания.
///
/// Если оставшееся время меньше периода [`PERIODIC_INTERVAL_MICROS`],
/// взводит флаг уведомления, деактивирует ожидание
/// и выключает периодическое прерывание.
fn advance(
    cmos: &mut impl Cmos,
    pending: &mut PendingWait,
) {
    if !pending.is_active() {
        return;
    }

    if pending.remaining_micros() < PERIODIC_INTERVAL_MICROS {
        if let Some(target) = pending.finish() {
            target.complete();
        }

        rtc::set_periodic_interrupt(cmos, false);
    } else {
        pending.decrement(PERIODIC_INTERVAL_MICROS);
    }
}


/// Запускает отложенное ожидание на `micros` микросекунд,
/// по истечении которых будет взведён флаг `target`.
///
/// Одновременно поддерживается только одно ожидание,
/// если оно уже запущено, возвращает ошибку [`ClockInUse`].
pub(crate) fn start(
    cmos: &mut impl Cmos,
    wait: &IrqSpinlock<PendingWait>,
    micros: u32,
    target: WaitTarget,
) -> Result<()> {
    let mut pending = wait.lock();

    if pending.is_active() {
        return Err(ClockInUse);
    }

    pending.arm(micros, target);
    rtc::set_periodic_interrupt(cmos, true);

    Ok(())
}


/// Отменяет запущенное отложенное ожидание,
/// не взводя его флаг уведомления.
/// Если ожидание не запущено, ничего не делает.
pub(crate) fn stop(
    cmos: &mut impl Cmos,
    wait: &IrqSpinlock<PendingWait>,
) {
    let mut pending = wait.lock();

    pending.finish();
    rtc::set_periodic_interrupt(cmos, false);
}


/// Синхронно ждёт `micros` микросекунд,
/// при ожидании усыпляя процессор до ближайшего прерывания.
///
/// Если отложенное ожидание уже запущено кем-то другим,
/// возвращает ошибку [`ClockInUse`].
pub(crate) fn sleep(
    cmos: &mut impl Cmos,
    wait: &IrqSpinlock<PendingWait>,
    micros: u32,
) -> Result<()> {
    let flag = AtomicU8::new(0);

    // SAFETY: `flag` живёт в текущем кадре стека,
    // а из функции нет выхода до тех пор,
    // пока обработчик прерывания не взведёт его и
    // тем самым не расстанется с указателем на него.
    // Если же `start()` вернёт ошибку, указатель никуда не сохранится.
    let target =
        unsafe { WaitTarget::new((&flag).into(), WAIT_COMPLETE_BIT)? };

    start(cmos, wait, micros, target)?;

    while flag.load(Ordering::Acquire) & WAIT_COMPLETE_BIT == 0 {
        wait_for_interrupt();
    }

    Ok(())
}


/// Усыпляет процессор до ближайшего прерывания,
/// после чего снова запрещает прерывания.
#[cfg(target_os = "none")]
fn wait_for_interrupt() {
    x86_64::instructions::interrupts::enable_and_hlt();
    x86_64::instructions::interrupts::disable();
}


/// В пользовательском режиме инструкция `hlt` недоступна.
#[cfg(not(target_os = "none"))]
fn wait_for_interrupt() {
    core::hint::spin_loop();
}


/// Пользовательский обработчик, вызываемый при срабатывании будильника
/// часов реального времени.
pub type AlarmHook = fn();


/// Установленный пользовательский обработчик будильника.
static ALARM_HOOK: IrqSpinlock<Option<AlarmHook>> = IrqSpinlock::new(None);

/// Период периодического прерывания часов реального времени
/// в микросекундах при частоте 1024 Гц.
pub const PERIODIC_INTERVAL_MICROS: u32 = 977;

/// Маска, которую [`sleep()`] использует во флаге уведомления.
pub const WAIT_COMPLETE_BIT: u8 = 1 << 7;

#[doc(hidden)]
pub mod test_scaffolding {
    use cmos::Cmos;

    use crate::{
        bda::{
            PendingWait,
            WaitTarget,
        },
        error::Result,
        sync::IrqSpinlock,
    };

    use super::AlarmHook;

    pub fn advance(
        cmos: &mut impl Cmos,
        pending: &mut PendingWait,
    ) {
        super::advance(cmos, pending)
    }

    pub fn service(
        cmos: &mut impl Cmos,
        wait: &IrqSpinlock<PendingWait>,
        alarm_hook: Option<AlarmHook>,
    ) {
        super::service(cmos, wait, alarm_hook)
    }

    pub fn sleep(
        cmos: &mut impl Cmos,
        wait: &IrqSpinlock<PendingWait>,
        micros: u32,
    ) -> Result<()> {
        super::sleep(cmos, wait, micros)
    }

    pub fn start(
        cmos: &mut impl Cmos,
        wait: &IrqSpinlock<PendingWait>,
        micros: u32,
        target: WaitTarget,
    ) -> Result<()> {
        super::start(cmos, wait, micros, target)
    }

    pub fn stop(
        cmos: &mut impl Cmos,
        wait: &IrqSpinlock<PendingWait>,
    ) {
        super::stop(cmos, wait)
    }
}
