#![allow(dead_code)]

use cmos::Cmos;

/// Модель памяти микросхемы часов реального времени для тестов.
///
/// Ведёт журнал записей, считает чтения регистра статуса `A`
/// и воспроизводит аппаратные особенности настоящей микросхемы:
/// чтение регистра `C` сбрасывает его,
/// а в режиме [`FakeCmos::stick_update()`] регистр `A`
/// бесконечно сообщает о незавершённом обновлении показаний.
pub struct FakeCmos {
    registers: [u8; 128],
    stuck_update: bool,
    register_a_reads: usize,
    writes: Vec<(u8, u8)>,
}

impl FakeCmos {
    pub fn new() -> Self {
        Self {
            registers: [0; 128],
            stuck_update: false,
            register_a_reads: 0,
            writes: Vec::new(),
        }
    }

    /// Модель с показаниями времени `hours:minutes:seconds`
    /// в двоично--десятичном формате.
    pub fn with_time(
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Self {
        let mut fake = Self::new();

        fake.registers[SECONDS] = seconds;
        fake.registers[MINUTES] = minutes;
        fake.registers[HOURS] = hours;

        fake
    }

    /// Переводит модель в режим вечно незавершённого
    /// обновления показаний.
    pub fn stick_update(mut self) -> Self {
        self.stuck_update = true;
        self
    }

    /// Значение байта `address`, минуя модель чтения.
    pub fn register(
        &self,
        address: u8,
    ) -> u8 {
        self.registers[usize::from(address)]
    }

    /// Записывает байт `address`, минуя журнал записей.
    pub fn preset(
        &mut self,
        address: u8,
        data: u8,
    ) {
        self.registers[usize::from(address)] = data;
    }

    /// Количество чтений регистра статуса `A`.
    pub fn register_a_reads(&self) -> usize {
        self.register_a_reads
    }

    /// Журнал записей в виде пар `(address, data)`.
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }
}

impl Cmos for FakeCmos {
    fn read(
        &mut self,
        address: u8,
    ) -> u8 {
        let index = usize::from(address);

        match address {
            REGISTER_A => {
                self.register_a_reads += 1;

                if self.stuck_update {
                    return UPDATE_IN_PROGRESS;
                }

                self.registers[index]
            },
            REGISTER_C => {
                let status = self.registers[index];
                self.registers[index] = 0;

                status
            },
            _ => self.registers[index],
        }
    }

    fn write(
        &mut self,
        address: u8,
        data: u8,
    ) {
        self.writes.push((address, data));
        self.registers[usize::from(address)] = data;
    }
}

const SECONDS: usize = 0x00;
const MINUTES: usize = 0x02;
const HOURS: usize = 0x04;

const REGISTER_A: u8 = 0xA;
const REGISTER_C: u8 = 0xC;

const UPDATE_IN_PROGRESS: u8 = 1 << 7;
