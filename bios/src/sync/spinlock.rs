use core::{
    cell::UnsafeCell,
    fmt,
    hint,
    ops::{
        Deref,
        DerefMut,
    },
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};


/// [Спин-блокировка](https://en.wikipedia.org/wiki/Spinlock),
/// которая предоставляет взаимное исключение потоков исполнения
/// при доступе к защищаемым ею данным типа `T`.
///
/// Не защищает от гонки с обработчиком прерывания на том же процессоре,
/// для таких данных предназначена
/// [`IrqSpinlock`](super::irq_spinlock::IrqSpinlock).
#[derive(Default)]
pub struct Spinlock<T> {
    /// Признак того, что блокировка захвачена.
    is_locked: AtomicBool,

    /// Защищаемые блокировкой данные.
    data: UnsafeCell<T>,
}


impl<T> Spinlock<T> {
    /// Создаёт [`Spinlock`], защищающий данные `data`.
    pub const fn new(data: T) -> Self {
        Self {
            is_locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }


    /// Захватывает блокировку, при необходимости ожидая её освобождения
    /// в [активном цикле](https://en.wikipedia.org/wiki/Busy_waiting).
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }

            while self.is_locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }


    /// Пытается захватить блокировку без ожидания.
    /// Если блокировка уже захвачена кем-то другим, возвращает [`None`].
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        self.is_locked
            .compare_exchange_weak(
                false,
                true,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
            .then(|| SpinlockGuard { lock: self })
    }


    /// Даёт доступ к защищаемым данным
    /// через эксклюзивную ссылку на саму блокировку.
    /// В этом случае захватывать её не нужно,
    /// эксклюзивность доступа гарантирует компилятор.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}


unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}


impl<T: fmt::Debug> fmt::Debug for Spinlock<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = formatter.debug_struct("Spinlock");

        match self.try_lock() {
            Some(guard) => debug_struct.field("data", &*guard),
            None => debug_struct.field("data", &"<locked>"),
        }
        .finish()
    }
}


/// Гарантия того, что блокировка [`Spinlock`] захвачена текущим
/// потоком исполнения.
/// Даёт доступ к защищаемым данным, а при уничтожении
/// освобождает блокировку.
pub struct SpinlockGuard<'a, T> {
    /// Захваченная блокировка.
    lock: &'a Spinlock<T>,
}


impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}


impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}


impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.is_locked.store(false, Ordering::Release);
    }
}
