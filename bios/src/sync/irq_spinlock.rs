use core::ops::{
    Deref,
    DerefMut,
};

use super::spinlock::{
    Spinlock,
    SpinlockGuard,
};


/// [Спин-блокировка](https://en.wikipedia.org/wiki/Spinlock)
/// для данных, которые разделяются с обработчиками прерываний.
///
/// На время захвата дополнительно запрещает прерывания на текущем
/// процессоре.
/// Иначе обработчик прерывания, выполнившись между захватом и
/// освобождением обычной [`Spinlock`], навсегда бы завис на попытке
/// захватить её повторно.
#[derive(Debug, Default)]
pub struct IrqSpinlock<T> {
    /// Спин-блокировка, которая защищает данные
    /// от конкурирующих процессоров.
    spinlock: Spinlock<T>,
}


impl<T> IrqSpinlock<T> {
    /// Создаёт [`IrqSpinlock`], защищающий данные `data`.
    pub const fn new(data: T) -> Self {
        Self {
            spinlock: Spinlock::new(data),
        }
    }


    /// Запрещает прерывания и захватывает блокировку.
    /// Прерывания будут разрешены обратно при уничтожении
    /// возвращаемой гарантии [`IrqSpinlockGuard`],
    /// если они были разрешены в момент вызова.
    pub fn lock(&self) -> IrqSpinlockGuard<'_, T> {
        let irq_guard = IrqGuard::new();

        IrqSpinlockGuard {
            guard: self.spinlock.lock(),
            _irq_guard: irq_guard,
        }
    }


    /// Даёт доступ к защищаемым данным
    /// через эксклюзивную ссылку на саму блокировку.
    pub fn get_mut(&mut self) -> &mut T {
        self.spinlock.get_mut()
    }
}


/// Гарантия того, что блокировка [`IrqSpinlock`] захвачена,
/// а прерывания на текущем процессоре запрещены.
pub struct IrqSpinlockGuard<'a, T> {
    /// Гарантия захвата вложенной [`Spinlock`].
    /// Должна быть уничтожена до разрешения прерываний,
    /// поэтому объявлена раньше поля [`IrqSpinlockGuard::_irq_guard`].
    guard: SpinlockGuard<'a, T>,

    /// Гарантия запрета прерываний.
    _irq_guard: IrqGuard,
}


impl<T> Deref for IrqSpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}


impl<T> DerefMut for IrqSpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}


/// Гарантия запрета прерываний на текущем процессоре.
/// При уничтожении восстанавливает их прежнее состояние.
struct IrqGuard {
    /// Были ли прерывания разрешены в момент создания гарантии.
    was_enabled: bool,
}


impl IrqGuard {
    /// Запрещает прерывания, запоминая их текущее состояние.
    #[cfg(target_os = "none")]
    fn new() -> Self {
        let was_enabled = x86_64::instructions::interrupts::are_enabled();

        x86_64::instructions::interrupts::disable();

        Self { was_enabled }
    }


    /// В пользовательском режиме инструкции `cli` и `sti` недоступны,
    /// взаимное исключение обеспечивает вложенная [`Spinlock`].
    #[cfg(not(target_os = "none"))]
    fn new() -> Self {
        Self { was_enabled: false }
    }
}


impl Drop for IrqGuard {
    fn drop(&mut self) {
        #[cfg(target_os = "none")]
        if self.was_enabled {
            x86_64::instructions::interrupts::enable();
        }
    }
}
