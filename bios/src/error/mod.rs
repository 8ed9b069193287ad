use core::result;

use num_enum::{
    TryFromPrimitive,
    TryFromPrimitiveError,
};

/// Перечисление для возможных ошибок.
///
/// Все ошибки возвращаются вызывающему как значения ---
/// BIOS обязан остаться работоспособным для продолжения загрузки,
/// поэтому аварийных остановов на этих путях нет.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Будильник уже заведён, а одновременно поддерживается только один.
    AlarmAlreadySet,

    /// Часы реального времени не завершили обновление показаний
    /// за отведённое на опрос число итераций.
    ClockBusy,

    /// Отложенное ожидание уже запущено,
    /// а одновременно поддерживается только одно.
    ClockInUse,

    /// Задано недопустимое значение аргумента.
    InvalidArgument,

    /// Порт с заданным номером не был обнаружен при инициализации.
    PortNotPresent,

    /// Запрошена неизвестная операция.
    Unsupported,
}

impl<Enum: TryFromPrimitive> From<TryFromPrimitiveError<Enum>> for Error {
    fn from(_error: TryFromPrimitiveError<Enum>) -> Self {
        Self::Unsupported
    }
}

/// Тип возвращаемого результата `T` или ошибки [`Error`] ---
/// мономорфизация [`result::Result`] по типу ошибки.
pub type Result<T> = result::Result<T, Error>;
