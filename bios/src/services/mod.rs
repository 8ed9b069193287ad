use crate::bda::BDA;


/// Службы времени --- счётчик тиков,
/// часы реального времени и отложенные ожидания.
pub mod clock;

/// Службы принтера на параллельном порту.
pub mod parallel;

/// Службы последовательного порта.
pub mod serial;


/// Инициализация служб ввода--вывода:
/// обнаружение последовательных и параллельных портов.
pub(super) fn init() {
    serial::setup(&BDA);
    parallel::setup(&BDA);
}
