/// Спин-блокировка [`IrqSpinlock`],
/// пригодная для данных, разделяемых с обработчиками прерываний.
pub mod irq_spinlock;

/// Спин-блокировка [`Spinlock`] для данных,
/// к которым обращается только обычный контекст исполнения.
pub mod spinlock;

pub use irq_spinlock::{
    IrqSpinlock,
    IrqSpinlockGuard,
};
pub use spinlock::{
    Spinlock,
    SpinlockGuard,
};
