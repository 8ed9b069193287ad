use core::fmt::{
    Debug,
    Write,
};

use tracing::{
    Event,
    Id,
    Level,
    Metadata,
    Subscriber,
    field::{
        Field,
        Visit,
    },
    span::{
        Attributes,
        Record,
    },
};

use serial::Com;

use crate::sync::Spinlock;

pub use tracing::{
    debug,
    error,
    info,
    trace,
    warn,
};


/// Инициализация журналирования.
/// Сообщения уходят в первый последовательный порт.
#[cfg(target_os = "none")]
pub(super) fn init() {
    use tracing_core::dispatcher::{
        self,
        Dispatch,
    };

    *LOG_COLLECTOR.console.lock() = Some(Com::new());

    dispatcher::set_global_default(Dispatch::from_static(&LOG_COLLECTOR))
        .expect("the log collector is initialized twice");
}


/// В тестах журналирование настраивает сам тест
/// библиотекой `tracing-subscriber`.
#[cfg(not(target_os = "none"))]
pub(super) fn init() {
}


/// Вспомогательная структура для печати полей сообщения
/// в консоль `console`.
struct LogEvent<'a> {
    /// Консоль, в которую печатается сообщение.
    console: &'a mut Com,

    /// Признак того, что нужно записать разделитель полей
    /// после ранее записанного поля.
    separator: bool,
}

impl<'a> LogEvent<'a> {
    /// Создаёт вспомогательную структуру для печати сообщения
    /// в консоль `console`.
    fn new(console: &'a mut Com) -> Self {
        Self {
            console,
            separator: false,
        }
    }
}

impl Visit for LogEvent<'_> {
    fn record_debug(
        &mut self,
        field: &Field,
        value: &dyn Debug,
    ) {
        if self.separator {
            let _ = write!(self.console, "; ");
        } else {
            self.separator = true;
        }

        // Поле с именем `message` --- текст сообщения,
        // для него имя опускается.
        let _ = if field.name() == "message" {
            write!(self.console, "{value:?}")
        } else {
            write!(self.console, "{} = {value:?}", field.name())
        };
    }
}


/// Сборщик сообщений журнала, печатающий сообщения в COM--порт.
struct LogCollector {
    /// Уровень журналирования.
    /// Печатаются только сообщения с уровнем журналирования,
    /// равным [`LogCollector::level`] и выше.
    level: Level,

    /// Консоль на COM--порту.
    /// Заполняется при инициализации журналирования.
    console: Spinlock<Option<Com>>,
}

impl LogCollector {
    /// Создаёт сборщик сообщений журнала,
    /// печатающий сообщения с уровнем журналирования `level` и выше.
    const fn new(level: Level) -> Self {
        Self {
            level,
            console: Spinlock::new(None),
        }
    }

    /// Возвращает односимвольное обозначение
    /// уровня журналирования `level`.
    const fn level_symbol(level: &Level) -> char {
        match *level {
            Level::ERROR => 'E',
            Level::WARN => 'W',
            Level::INFO => 'I',
            Level::DEBUG => 'D',
            Level::TRACE => 'T',
        }
    }
}

impl Subscriber for LogCollector {
    fn enabled(
        &self,
        metadata: &Metadata<'_>,
    ) -> bool {
        metadata.level() <= &self.level
    }

    fn new_span(
        &self,
        _span: &Attributes<'_>,
    ) -> Id {
        Id::from_u64(1)
    }

    fn record(
        &self,
        _span: &Id,
        _values: &Record<'_>,
    ) {
    }

    fn record_follows_from(
        &self,
        _span: &Id,
        _follows: &Id,
    ) {
    }

    fn event(
        &self,
        event: &Event<'_>,
    ) {
        let mut console = self.console.lock();
        if let Some(console) = console.as_mut() {
            let level = event.metadata().level();
            let _ = write!(console, "{} ", Self::level_symbol(level));

            event.record(&mut LogEvent::new(console));

            let _ = writeln!(console);
        }
    }

    fn enter(
        &self,
        _span: &Id,
    ) {
    }

    fn exit(
        &self,
        _span: &Id,
    ) {
    }
}


/// Сборщик сообщений журнала, печатающий сообщения в COM--порт.
static LOG_COLLECTOR: LogCollector = LogCollector::new(Level::DEBUG);
