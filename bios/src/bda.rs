use core::{
    ptr::NonNull,
    sync::atomic::{
        AtomicU8,
        AtomicU32,
        Ordering,
    },
};

use crate::{
    error::{
        Error::InvalidArgument,
        Result,
    },
    sync::{
        IrqSpinlock,
        Spinlock,
    },
};


/// Аналог
/// [BIOS Data Area](https://wiki.osdev.org/Memory_Map_(x86)#BIOS_Data_Area_(BDA)) ---
/// область, в которой BIOS хранит своё изменяемое состояние.
///
/// В отличие от классической BIOS Data Area по физическому адресу `0x400`,
/// раскладка полей не зафиксирована, а доступ к ним защищён блокировками.
pub static BDA: Bda = Bda::new();


/// Изменяемое состояние BIOS, см. [`BDA`].
#[derive(Debug)]
pub struct Bda {
    /// Счётчик тиков системного таймера.
    ticks: TickCounter,

    /// Текущий запрос на отложенное уведомление,
    /// разделяемый с обработчиком прерывания часов реального времени.
    wait: IrqSpinlock<PendingWait>,

    /// Таблица обнаруженных последовательных и параллельных портов.
    ports: Spinlock<PortTable>,
}


impl Bda {
    /// Создаёт пустое состояние BIOS.
    pub const fn new() -> Self {
        Self {
            ticks: TickCounter::new(),
            wait: IrqSpinlock::new(PendingWait::new()),
            ports: Spinlock::new(PortTable::new()),
        }
    }


    /// Счётчик тиков системного таймера.
    pub fn ticks(&self) -> &TickCounter {
        &self.ticks
    }


    /// Текущий запрос на отложенное уведомление.
    pub fn wait(&self) -> &IrqSpinlock<PendingWait> {
        &self.wait
    }


    /// Таблица обнаруженных последовательных и параллельных портов.
    pub fn ports(&self) -> &Spinlock<PortTable> {
        &self.ports
    }
}


impl Default for Bda {
    fn default() -> Self {
        Self::new()
    }
}


/// Счётчик тиков системного таймера с частотой 18.2065 Гц
/// и флагом перехода через полночь.
#[derive(Debug, Default)]
pub struct TickCounter {
    /// Количество тиков, прошедших с полуночи.
    ticks: AtomicU32,

    /// Количество переходов счётчика [`TickCounter::ticks`] через
    /// суточный порог [`TICKS_PER_DAY`] с момента последнего чтения.
    rollovers: AtomicU8,
}


impl TickCounter {
    /// Создаёт обнулённый счётчик тиков.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            rollovers: AtomicU8::new(0),
        }
    }


    /// Текущее значение счётчика, не влияющее на флаг перехода
    /// через полночь.
    pub fn current(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }


    /// Возвращает текущее значение счётчика и количество переходов
    /// через полночь с момента предыдущего вызова.
    /// Зафиксированные переходы при этом сбрасываются.
    pub fn read(&self) -> (u32, u8) {
        let ticks = self.ticks.load(Ordering::Relaxed);
        let rollovers = self.rollovers.swap(0, Ordering::Relaxed);

        (ticks, rollovers)
    }


    /// Устанавливает значение счётчика и сбрасывает зафиксированные
    /// переходы через полночь.
    pub fn set(&self, ticks: u32) {
        self.ticks.store(ticks, Ordering::Relaxed);
        self.rollovers.store(0, Ordering::Relaxed);
    }


    /// Продвигает счётчик на один тик.
    /// При достижении суточного порога [`TICKS_PER_DAY`]
    /// обнуляет счётчик и фиксирует переход через полночь.
    ///
    /// Счётчик разрешено выставить в любое значение `u32`,
    /// поэтому инкремент заворачивается, а не переполняется.
    pub fn advance(&self) {
        let ticks = self.ticks.load(Ordering::Relaxed).wrapping_add(1);

        if ticks >= TICKS_PER_DAY {
            self.ticks.store(0, Ordering::Relaxed);
            self.rollovers.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ticks.store(ticks, Ordering::Relaxed);
        }
    }
}


/// Запрос на отложенное уведомление --- дескриптор, который описывает,
/// сколько микросекунд осталось ждать и какой флаг взвести по истечении
/// этого времени.
#[derive(Debug, Default)]
pub struct PendingWait {
    /// Оставшееся время ожидания в микросекундах.
    remaining_micros: u32,

    /// Флаг, который нужно взвести по истечении времени ожидания.
    /// [`None`], если активного запроса нет.
    target: Option<WaitTarget>,
}


impl PendingWait {
    /// Создаёт пустой запрос.
    pub const fn new() -> Self {
        Self {
            remaining_micros: 0,
            target: None,
        }
    }


    /// Есть ли активный запрос на отложенное уведомление.
    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }


    /// Оставшееся время ожидания в микросекундах.
    pub fn remaining_micros(&self) -> u32 {
        self.remaining_micros
    }


    /// Активирует запрос на уведомление через `remaining_micros`
    /// микросекунд посредством флага `target`.
    pub fn arm(
        &mut self,
        remaining_micros: u32,
        target: WaitTarget,
    ) {
        self.remaining_micros = remaining_micros;
        self.target = Some(target);
    }


    /// Уменьшает оставшееся время ожидания на `micros` микросекунд.
    pub fn decrement(
        &mut self,
        micros: u32,
    ) {
        self.remaining_micros -= micros;
    }


    /// Деактивирует запрос, возвращая флаг уведомления,
    /// если запрос был активен.
    pub fn finish(&mut self) -> Option<WaitTarget> {
        self.remaining_micros = 0;

        self.target.take()
    }
}


/// Флаг, который нужно взвести по истечении времени ожидания, ---
/// ненулевая битовая маска `mask` и адрес байта,
/// в который эту маску нужно вписать.
#[derive(Clone, Copy, Debug)]
pub struct WaitTarget {
    /// Байт, в который нужно вписать маску [`WaitTarget::mask`].
    byte: NonNull<AtomicU8>,

    /// Ненулевая битовая маска уведомления.
    mask: u8,
}


impl WaitTarget {
    /// Создаёт флаг уведомления по произвольному адресу `byte`
    /// с маской `mask`.
    ///
    /// Для нулевой маски `mask` возвращает ошибку
    /// [`InvalidArgument`],
    /// так как уведомление с такой маской неотличимо от его отсутствия.
    ///
    /// # Safety
    ///
    /// Вызывающий код должен гарантировать, что `byte` указывает на
    /// [`AtomicU8`], который будет жив вплоть до завершения или отмены
    /// запроса на отложенное уведомление.
    pub unsafe fn new(
        byte: NonNull<AtomicU8>,
        mask: u8,
    ) -> Result<Self> {
        if mask == 0 {
            return Err(InvalidArgument);
        }

        Ok(Self { byte, mask })
    }


    /// Создаёт флаг уведомления в статической переменной `byte`
    /// с маской `mask`.
    pub fn from_static(
        byte: &'static AtomicU8,
        mask: u8,
    ) -> Result<Self> {
        unsafe { Self::new(NonNull::from(byte), mask) }
    }


    /// Взводит флаг уведомления.
    pub fn complete(self) {
        unsafe {
            self.byte.as_ref().fetch_or(self.mask, Ordering::Release);
        }
    }
}


/// [`WaitTarget::new()`] требует от вызывающего кода гарантию того,
/// что адрес флага валиден в том числе и в контексте
/// обработчика прерывания.
unsafe impl Send for WaitTarget {}


/// Таблица обнаруженных последовательных и параллельных портов
/// вместе с соответствующим им
/// [словом оборудования](https://stanislavs.org/helppc/int_11.html).
#[derive(Debug, Default)]
pub struct PortTable {
    /// Базовые адреса обнаруженных последовательных портов.
    com: [Option<ComPort>; MAX_COM_PORTS],

    /// Базовые адреса обнаруженных параллельных портов.
    lpt: [Option<LptPort>; MAX_LPT_PORTS],

    /// Слово оборудования, в котором учтено количество
    /// обнаруженных портов.
    equipment: u16,
}


impl PortTable {
    /// Создаёт пустую таблицу портов.
    pub const fn new() -> Self {
        Self {
            com: [None; MAX_COM_PORTS],
            lpt: [None; MAX_LPT_PORTS],
            equipment: 0,
        }
    }


    /// Последовательный порт номер `index`, если он обнаружен.
    pub fn com(
        &self,
        index: usize,
    ) -> Option<ComPort> {
        self.com.get(index).copied().flatten()
    }


    /// Параллельный порт номер `index`, если он обнаружен.
    pub fn lpt(
        &self,
        index: usize,
    ) -> Option<LptPort> {
        self.lpt.get(index).copied().flatten()
    }


    /// Слово оборудования.
    pub fn equipment(&self) -> u16 {
        self.equipment
    }


    /// Записывает очередной обнаруженный последовательный порт
    /// с базовым адресом `base` и таймаутом `timeout_ticks`
    /// и учитывает его в слове оборудования.
    ///
    /// Возвращает `false`, если таблица последовательных портов
    /// уже заполнена.
    pub fn add_com(
        &mut self,
        base: u16,
        timeout_ticks: u8,
    ) -> bool {
        let Some(slot) = self.com.iter_mut().find(|slot| slot.is_none())
        else {
            return false;
        };

        *slot = Some(ComPort {
            base,
            timeout_ticks,
        });

        let count = self.com.iter().flatten().count() as u16;
        self.equipment = self.equipment & !EQUIPMENT_COM_MASK |
            count << EQUIPMENT_COM_SHIFT;

        true
    }


    /// Записывает очередной обнаруженный параллельный порт
    /// с базовым адресом `base` и таймаутом `timeout_ticks`
    /// и учитывает его в слове оборудования.
    ///
    /// Возвращает `false`, если таблица параллельных портов
    /// уже заполнена.
    pub fn add_lpt(
        &mut self,
        base: u16,
        timeout_ticks: u8,
    ) -> bool {
        let Some(slot) = self.lpt.iter_mut().find(|slot| slot.is_none())
        else {
            return false;
        };

        *slot = Some(LptPort {
            base,
            timeout_ticks,
        });

        let count = self.lpt.iter().flatten().count() as u16;
        self.equipment = self.equipment & !EQUIPMENT_LPT_MASK |
            count << EQUIPMENT_LPT_SHIFT;

        true
    }
}


/// Обнаруженный последовательный порт.
#[derive(Clone, Copy, Debug)]
pub struct ComPort {
    /// Базовый адрес порта в пространстве ввода--вывода.
    pub base: u16,

    /// Таймаут операций с портом в тиках системного таймера.
    pub timeout_ticks: u8,
}


/// Обнаруженный параллельный порт.
#[derive(Clone, Copy, Debug)]
pub struct LptPort {
    /// Базовый адрес порта в пространстве ввода--вывода.
    pub base: u16,

    /// Таймаут операций с портом в тиках системного таймера.
    pub timeout_ticks: u8,
}


/// Количество тиков системного таймера в сутках,
/// после которого счётчик [`TickCounter`] обнуляется.
pub const TICKS_PER_DAY: u32 = 0x0018_00B0;

/// Максимальное количество последовательных портов в таблице
/// [`PortTable`].
pub const MAX_COM_PORTS: usize = 4;

/// Максимальное количество параллельных портов в таблице
/// [`PortTable`].
pub const MAX_LPT_PORTS: usize = 3;

/// Маска поля количества последовательных портов
/// в слове оборудования.
const EQUIPMENT_COM_MASK: u16 = 0b111 << EQUIPMENT_COM_SHIFT;

/// Смещение поля количества последовательных портов
/// в слове оборудования.
const EQUIPMENT_COM_SHIFT: u16 = 9;

/// Маска поля количества параллельных портов в слове оборудования.
const EQUIPMENT_LPT_MASK: u16 = 0b11 << EQUIPMENT_LPT_SHIFT;

/// Смещение поля количества параллельных портов в слове оборудования.
const EQUIPMENT_LPT_SHIFT: u16 = 14;

static_assertions::const_assert!(MAX_COM_PORTS <= 0b111);
static_assertions::const_assert!(MAX_LPT_PORTS <= 0b11);
