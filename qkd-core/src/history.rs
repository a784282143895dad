//! Histórico limitado de passes de medição
//!
//! FIFO simples: ao exceder [`HISTORY_CAPACITY`] o mais antigo sai primeiro
//! (`VecDeque::pop_front`, O(1)).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::measurement::MeasurementResult;

/// Máximo de resultados retidos
pub const HISTORY_CAPACITY: usize = 20;

/// Linha da série temporal exibida nos gráficos de QBER e de ruído
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub id: u64,
    pub qber: f64,
    /// Despolarização em %
    pub depolarization: f64,
    /// Amortecimento em %
    pub damping: f64,
}

/// Histórico ordenado por inserção (mais recente por último)
///
/// Serializa como lista simples; ao desserializar, só os últimos
/// [`HISTORY_CAPACITY`] resultados são mantidos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MeasurementResult>", into = "Vec<MeasurementResult>")]
pub struct HistoryLog {
    entries: VecDeque<MeasurementResult>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Adiciona resultado, descartando os mais antigos além da capacidade
    pub fn push(&mut self, entry: MeasurementResult) {
        self.entries.push_back(entry);
        self.truncate_front();
    }

    fn truncate_front(&mut self) {
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Forma funcional de [`push`](Self::push)
    pub fn appended(mut self, entry: MeasurementResult) -> Self {
        self.push(entry);
        self
    }

    /// Cópia dos resultados, do mais antigo ao mais recente
    pub fn to_vec(&self) -> Vec<MeasurementResult> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, MeasurementResult> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&MeasurementResult> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }

    /// Resultado mais recente
    pub fn latest(&self) -> Option<&MeasurementResult> {
        self.entries.back()
    }

    /// Resultado mais antigo retido
    pub fn oldest(&self) -> Option<&MeasurementResult> {
        self.entries.front()
    }

    /// Série para os gráficos (taxas convertidas para %)
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.entries
            .iter()
            .map(|r| {
                let noise = r.noise();
                ChartPoint {
                    id: r.id,
                    qber: r.qber,
                    depolarization: noise.depolarization_percent(),
                    damping: noise.damping_percent(),
                }
            })
            .collect()
    }

    /// QBER médio dos passes retidos
    pub fn mean_qber(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|r| r.qber).sum();
        Some(sum / self.entries.len() as f64)
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<MeasurementResult>> for HistoryLog {
    fn from(entries: Vec<MeasurementResult>) -> Self {
        let mut log = Self {
            entries: entries.into(),
        };
        log.truncate_front();
        log
    }
}

impl From<HistoryLog> for Vec<MeasurementResult> {
    fn from(log: HistoryLog) -> Self {
        log.entries.into()
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a MeasurementResult;
    type IntoIter = std::collections::vec_deque::Iter<'a, MeasurementResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Forma livre de [`HistoryLog::appended`]
pub fn append_history(log: HistoryLog, entry: MeasurementResult) -> HistoryLog {
    log.appended(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::DerivedKey;
    use chrono::DateTime;

    fn result(id: u64, qber: f64) -> MeasurementResult {
        MeasurementResult {
            id,
            qber,
            depolarization_rate: 0.08,
            damping_rate: 0.04,
            timestamp: DateTime::from_timestamp(id as i64, 0).unwrap_or_default(),
            qubit_count: 16,
            derived_key: DerivedKey::derive(
                &crate::qubit::QubitBank::random(&mut crate::rng::StdSource::seeded(id)),
                &mut crate::rng::StdSource::seeded(id),
            ),
        }
    }

    #[test]
    fn test_push_keeps_order() {
        let mut log = HistoryLog::new();
        for id in 1..=3 {
            log.push(result(id, 0.0));
        }
        let ids: Vec<u64> = log.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(log.latest().map(|r| r.id), Some(3));
        assert_eq!(log.oldest().map(|r| r.id), Some(1));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = HistoryLog::new();
        for id in 1..=25 {
            log.push(result(id, 0.0));
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.capacity(), HISTORY_CAPACITY);
        assert_eq!(log.get(0).map(|r| r.id), Some(6));
        assert_eq!(log.to_vec().last().map(|r| r.id), Some(25));
    }

    #[test]
    fn test_deserialize_keeps_last_twenty() {
        let entries: Vec<MeasurementResult> = (1..=31).map(|id| result(id, 0.0)).collect();
        let json = serde_json::to_string(&entries).unwrap();

        let mut log: HistoryLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.oldest().map(|r| r.id), Some(12));
        assert_eq!(log.latest().map(|r| r.id), Some(31));

        log.push(result(32, 0.0));
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.latest().map(|r| r.id), Some(32));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let log = HistoryLog::new().appended(result(1, 0.0)).appended(result(2, 6.25));
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[1]["id"], 2);
    }

    #[test]
    fn test_no_dedup() {
        let entry = result(1, 6.25);
        let log = append_history(append_history(HistoryLog::new(), entry.clone()), entry);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_chart_points_use_percent() {
        let log = HistoryLog::new().appended(result(1, 12.5));
        let points = log.chart_points();
        assert_eq!(points.len(), 1);
        assert!((points[0].depolarization - 8.0).abs() < 1e-9);
        assert!((points[0].damping - 4.0).abs() < 1e-9);
        assert_eq!(points[0].qber, 12.5);
    }

    #[test]
    fn test_mean_qber() {
        let mut log = HistoryLog::new();
        assert_eq!(log.mean_qber(), None);
        log.push(result(1, 0.0));
        log.push(result(2, 12.5));
        assert_eq!(log.mean_qber(), Some(6.25));
    }
}
