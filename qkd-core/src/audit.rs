//! Auditoria narrativa de um passe
//!
//! O kernel só monta o pedido ([`AuditPrompt`]) e delega a um
//! [`SecurityAnalyst`]. O texto devolvido não altera nenhum estado do kernel
//! além do relatório em cache da sessão.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::measurement::{MeasurementResult, QBER_SAFETY_THRESHOLD};

/// Relatório usado quando o analista falha
pub const FALLBACK_REPORT: &str = "Fast audit is unavailable at the moment.";

/// Instrução de sistema enviada junto com cada pedido
pub const SYSTEM_INSTRUCTION: &str = "You are a low-latency quantum security analysis system. \
Answer briefly and concisely, focusing on man-in-the-middle (MITM) risk.";

/// Temperatura de amostragem pedida ao analista
pub const AUDIT_TEMPERATURE: f32 = 0.1;

/// Pedido de auditoria em texto plano
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPrompt {
    pub system_instruction: String,
    pub contents: String,
    pub temperature: f32,
    /// QBER que originou o pedido (em %)
    pub qber: f64,
}

impl AuditPrompt {
    /// Monta o pedido a partir de um resultado de medição
    pub fn from_result(result: &MeasurementResult) -> Self {
        let contents = format!(
            "Analyse the quantum security telemetry (quick summary):\n\
             - Current QBER: {:.2}%\n\
             - Noise level: {} (Depol) / {} (Damp)\n\
             \n\
             Summarise stability and any likely eavesdropping quickly (Low Latency Response mode).",
            result.qber, result.depolarization_rate, result.damping_rate
        );

        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            contents,
            temperature: AUDIT_TEMPERATURE,
            qber: result.qber,
        }
    }
}

/// Colaborador que transforma um pedido em prosa
pub trait SecurityAnalyst {
    fn analyze(&self, prompt: &AuditPrompt) -> Result<String, AnalysisError>;
}

/// Analista local determinístico baseado no limiar de QBER
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdAnalyst;

impl SecurityAnalyst for ThresholdAnalyst {
    fn analyze(&self, prompt: &AuditPrompt) -> Result<String, AnalysisError> {
        let qber = prompt.qber;
        let report = if qber < QBER_SAFETY_THRESHOLD {
            format!(
                "QBER {qber:.2}% is below the {QBER_SAFETY_THRESHOLD:.0}% threshold. \
                 The channel is stable and the error profile is consistent with ambient noise; \
                 no sign of an intercept-resend attack. Key material can be used."
            )
        } else {
            format!(
                "QBER {qber:.2}% exceeds the {QBER_SAFETY_THRESHOLD:.0}% threshold. \
                 Possible man-in-the-middle interference or excessive channel noise; \
                 discard this key and re-run the exchange."
            )
        };
        Ok(report)
    }
}
