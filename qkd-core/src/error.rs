//! Tipos de erro para qkd-core

use thiserror::Error;

/// Resultado customizado para operações do kernel QKD
pub type QkdResult<T> = Result<T, QkdError>;

/// Erros que podem ocorrer em operações do kernel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QkdError {
    #[error("Qubit index {index} out of range (bank has {len} qubits)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid {parameter} rate {value}: must be within [0, {max}]")]
    InvalidNoiseRate {
        parameter: &'static str,
        value: f64,
        max: f64,
    },

    #[error("Invalid {field} {value}: qubit bits must be 0 or 1")]
    InvalidBit { field: &'static str, value: u8 },

    #[error("A measurement pass is already in progress")]
    MeasurementInProgress,

    #[error("No measurement pass has been started")]
    NoMeasurementPending,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Falhas do colaborador de auditoria (nunca escapam da sessão)
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("Analyst unavailable: {0}")]
    Unavailable(String),

    #[error("Analyst returned an empty report")]
    EmptyReport,
}
