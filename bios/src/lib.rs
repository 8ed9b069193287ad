#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(unused_variables)]

//! Vremya --- BIOS для IBM PC--совместимых компьютеров.
//! Предоставляет службы времени, последовательных и параллельных портов
//! для следующих этапов загрузки.

#![deny(warnings)]
#![no_std]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(missing_docs)]

/// Область данных BIOS
/// ([BIOS Data Area](https://wiki.osdev.org/Memory_Map_(x86)#BIOS_Data_Area_.28BDA.29), BDA) ---
/// общее состояние всех служб:
/// счётчик тиков таймера, дескриптор отложенного ожидания и таблица портов.
pub mod bda;

/// Перечисление для возможных ошибок [`Error`] и соответствующий [`Result`].
pub mod error;

/// Поддержка журналирования макросами библиотеки [`tracing`].
pub mod log;

/// Службы, которые BIOS предоставляет внешним вызывающим:
/// часы и ожидания, последовательные порты, принтер.
pub mod services;

/// Примитивы синхронизации [`Spinlock`] и [`IrqSpinlock`].
pub mod sync;

/// Здесь находится работа со временем:
/// часы реального времени, системный таймер и отложенные ожидания.
pub mod time;

use log::info;

// Used in docs.
#[allow(unused)]
use {
    error::{
        Error,
        Result,
    },
    sync::{
        IrqSpinlock,
        Spinlock,
    },
};

/// Инициализация всех подсистем BIOS.
///
/// Таблицу векторов прерываний настраивает внешний код загрузки,
/// он обязан направить вектор [`FIRST_PIC_VECTOR_BASE`]` + 0` в
/// [`time::ticks::interrupt()`], а вектор [`SECOND_PIC_VECTOR_BASE`]` + 0` в
/// [`time::wait::interrupt()`].
#[cold]
#[inline(never)]
pub fn init() {
    log::init();

    unsafe {
        pic8259::init(FIRST_PIC_VECTOR_BASE, SECOND_PIC_VECTOR_BASE);
    }

    time::init();
    services::init();

    info!("Vremya is at your service");
}

/// Вектор первого прерывания первого контроллера
/// [PIC 8259](https://en.wikipedia.org/wiki/Intel_8259).
/// [Историческое размещение](https://wiki.osdev.org/Interrupts#Standard_ISA_IRQs)
/// для реального режима, конфликтующее с исключениями процессора.
pub const FIRST_PIC_VECTOR_BASE: u8 = 0x08;

/// Вектор первого прерывания второго контроллера
/// [PIC 8259](https://en.wikipedia.org/wiki/Intel_8259).
/// В отличие от защищённого режима диапазоны двух контроллеров не смежны.
pub const SECOND_PIC_VECTOR_BASE: u8 = 0x70;
