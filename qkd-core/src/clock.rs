//! Relógio injetável para timestamps de resultados e eventos

use chrono::{DateTime, Utc};

/// Fonte do instante atual
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Relógio do sistema
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Relógio parado, para testes determinísticos
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Relógio parado em `secs` segundos após a época Unix
    pub fn at_unix(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
