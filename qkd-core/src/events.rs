//! Log de eventos exibido ao operador (mais recente primeiro)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Máximo de eventos retidos
pub const EVENT_LOG_CAPACITY: usize = 10;

/// Evento da sessão
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Log limitado, ordenado do mais recente para o mais antigo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: VecDeque<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra evento no topo, descartando o mais antigo
    pub fn record(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.events.push_front(Event {
            at,
            message: message.into(),
        });
        self.events.truncate(EVENT_LOG_CAPACITY);
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&Event> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let at = DateTime::from_timestamp(45_296, 0).unwrap_or_default();
        let mut log = EventLog::new();
        for i in 0..15 {
            log.record(at, format!("event {i}"));
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log.latest().map(|e| e.message.as_str()), Some("event 14"));
        assert_eq!(log.iter().last().map(|e| e.message.as_str()), Some("event 5"));
    }

    #[test]
    fn test_display() {
        let at = DateTime::from_timestamp(45_296, 0).unwrap_or_default();
        let mut log = EventLog::new();
        log.record(at, "System reset.");
        assert_eq!(log.latest().map(|e| e.to_string()), Some("[12:34:56] System reset.".to_string()));
    }
}
