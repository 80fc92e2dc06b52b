//! Глобальный logger facade для combat движка
//!
//! Хост подключает свой LogPrinter (игровой движок, файл, консоль),
//! симуляция пишет через log/log_info/log_warning/log_error.
//! Отсутствие printer'а — валидное состояние: сообщения просто дропаются,
//! combat логика никогда не зависит от логгера.

use once_cell::sync::Lazy;
use std::sync::Mutex;

// Потокобезопасный глобальный printer (static, Arc не нужен)
static PRINTER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));

static LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

/// Уровень логирования (фильтрация на стороне facade, не printer'а)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Printer интерфейс — реализуется хостом
pub trait LogPrinter: Send + Sync {
    fn print(&self, level: LogLevel, message: &str);
}

pub fn set_printer(printer: Box<dyn LogPrinter>) {
    *PRINTER.lock().unwrap() = Some(printer);
}

pub fn set_printer_if_needed(printer: Box<dyn LogPrinter>) {
    let mut guard = PRINTER.lock().unwrap();
    if guard.is_none() {
        *guard = Some(printer);
    }
}

pub fn set_log_level(level: LogLevel) {
    *LEVEL.lock().unwrap() = level;
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    if level < *LEVEL.lock().unwrap() {
        return;
    }

    // Timestamp добавляем здесь, не в printer'е
    if let Some(printer) = PRINTER.lock().unwrap().as_ref() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        printer.print(level, &format!("[{}] {}", timestamp, message));
    }
}

/// Консольный printer по умолчанию (headless прогоны, тесты)
pub struct ConsolePrinter;

impl LogPrinter for ConsolePrinter {
    fn print(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_printer_if_needed(Box::new(ConsolePrinter));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_without_printer_is_noop() {
        // Не должно паниковать даже без printer'а
        log("no printer attached");
        log_error("still fine");
    }
}
