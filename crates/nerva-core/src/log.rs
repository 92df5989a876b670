use crate::config::Config;
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::VecDeque};

///
/// Level
///

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, CandidType, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug, // least severe
    Info,
    Ok,
    Warn,
    Error, // most severe
}

///
/// Topic
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum Topic {
    Config,
    Dissolve,
    Governance,
    Ledger,
    Nonce,
    Split,
    Stake,
    Transfer,
}

///
/// LogEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub topic: Option<String>,
    pub message: String,
}

thread_local! {
    static LOG_BUFFER: RefCell<VecDeque<LogEntry>> = const { RefCell::new(VecDeque::new()) };
}

///
/// LogBuffer
/// Bounded in-memory tail of recent entries; oldest entries are evicted.
///

pub struct LogBuffer;

impl LogBuffer {
    #[must_use]
    pub fn entries() -> Vec<LogEntry> {
        LOG_BUFFER.with(|buf| buf.borrow().iter().cloned().collect())
    }

    pub fn clear() {
        LOG_BUFFER.with(|buf| buf.borrow_mut().clear());
    }

    fn push(entry: LogEntry, max_entries: usize) {
        LOG_BUFFER.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.push_back(entry);
            while buf.len() > max_entries {
                buf.pop_front();
            }
        });
    }
}

#[macro_export]
macro_rules! log {
    // =========================================
    // (1) With topic (normal + trailing comma)
    // =========================================
    ($topic:expr, $level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        let topic = $topic.to_string();
        $crate::log::__emit(Some(topic.as_str()), $crate::log::Level::$level, format!($fmt $(, $arg)*));
    }};

    // =========================================
    // (2) No topic (normal + trailing comma)
    // =========================================
    ($level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log::__emit(None, $crate::log::Level::$level, format!($fmt $(, $arg)*));
    }};
}

///
/// Helpers
///

#[doc(hidden)]
pub fn __emit(topic: Option<&str>, level: Level, message: String) {
    let (min_level, max_entries) = Config::try_get().map_or((Level::Info, 1_000), |cfg| {
        (
            cfg.log.level,
            usize::try_from(cfg.log.max_entries).unwrap_or(usize::MAX),
        )
    });
    if level < min_level {
        return;
    }

    let final_msg = match topic {
        Some(t) => format!("[{t}] {message}"),
        None => message.clone(),
    };

    let (color, reset) = match level {
        Level::Ok => ("\x1b[32m", "\x1b[0m"),
        Level::Info => ("\x1b[34m", "\x1b[0m"),
        Level::Warn => ("\x1b[33m", "\x1b[0m"),
        Level::Error => ("\x1b[31m", "\x1b[0m"),
        Level::Debug => ("", ""),
    };

    let label = format!("{color}{:^5}{reset}", level.to_string().to_uppercase());
    let line = format!("{label}| {final_msg}");

    #[cfg(target_arch = "wasm32")]
    crate::cdk::println!("{line}");

    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{line}");

    LogBuffer::push(
        LogEntry {
            level,
            topic: topic.map(str::to_string),
            message,
        },
        max_entries,
    );
}

///
/// TESTS
///
