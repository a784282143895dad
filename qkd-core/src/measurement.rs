//! Passe de medição: ruído, colapso, QBER e derivação da chave
//!
//! ## Computational Complexity
//!
//! **Noise + collapse — O(16):** one noise application per qubit.
//!
//! **Key derivation — O(64):** one uniform draw in [0, 8) per hex digit.
//!
//! A chave derivada é cosmética: cada dígito é `medido * 8 + uniforme[0, 8)`,
//! então o bit medido só decide a metade alta do nibble.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::clock::Clock;
use crate::noise::{NoiseParameters, apply_noise};
use crate::qubit::{QUBIT_COUNT, QubitBank};
use crate::rng::RandomSource;

/// Número de dígitos hexadecimais da chave derivada
pub const KEY_HEX_LENGTH: usize = 64;

/// Abaixo deste QBER (em %) o canal é considerado seguro
pub const QBER_SAFETY_THRESHOLD: f64 = 11.0;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Chave simétrica derivada (64 dígitos hex maiúsculos)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedKey(String);

impl DerivedKey {
    /// Deriva a chave a partir dos bits medidos do banco
    ///
    /// Qubits ainda não medidos contam como 0.
    pub fn derive(bank: &QubitBank, rng: &mut impl RandomSource) -> Self {
        let qubits = bank.qubits();
        let hex: String = (0..KEY_HEX_LENGTH)
            .map(|k| {
                let measured = qubits[k % QUBIT_COUNT].measured_value().unwrap_or(0) as u32 & 1;
                let nibble = measured * 8 + rng.uniform_int(8) % 8;
                HEX_DIGITS[nibble as usize] as char
            })
            .collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DerivedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resumo imutável de um passe de medição
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Sequência do passe dentro da sessão
    pub id: u64,
    /// Quantum bit error rate, em %
    pub qber: f64,
    /// Taxa de despolarização usada no passe
    pub depolarization_rate: f64,
    /// Taxa de amortecimento usada no passe
    pub damping_rate: f64,
    /// Instante do passe (UTC)
    pub timestamp: DateTime<Utc>,
    /// Sempre [`QUBIT_COUNT`]
    pub qubit_count: usize,
    /// Chave derivada do passe
    pub derived_key: DerivedKey,
}

impl MeasurementResult {
    /// Timestamp ISO-8601 com milissegundos (`2026-01-16T12:00:00.000Z`)
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parâmetros de ruído no momento do passe
    pub fn noise(&self) -> NoiseParameters {
        NoiseParameters {
            depolarization_rate: self.depolarization_rate,
            damping_rate: self.damping_rate,
        }
    }

    pub fn fidelity(&self) -> f64 {
        fidelity(self.qber)
    }

    pub fn status(&self) -> SecurityStatus {
        SecurityStatus::from_qber(Some(self.qber))
    }
}

/// Saída completa de um passe
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPass {
    /// Banco após ruído e colapso
    pub bank: QubitBank,
    pub qber: f64,
    pub derived_key: DerivedKey,
    pub result: MeasurementResult,
}

/// Classificação do canal a partir do último QBER
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurityStatus {
    /// Nenhum passe desde o último reset
    Idle,
    Safe,
    Risky,
}

impl SecurityStatus {
    pub fn from_qber(qber: Option<f64>) -> Self {
        match qber {
            None => SecurityStatus::Idle,
            Some(q) if q < QBER_SAFETY_THRESHOLD => SecurityStatus::Safe,
            Some(_) => SecurityStatus::Risky,
        }
    }
}

impl fmt::Display for SecurityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SecurityStatus::Idle => "IDLE",
            SecurityStatus::Safe => "SAFE",
            SecurityStatus::Risky => "RISKY",
        };
        f.write_str(label)
    }
}

/// Fidelidade do canal em % (`100 - qber`)
pub fn fidelity(qber: f64) -> f64 {
    100.0 - qber
}

/// QBER em % para um número de erros no banco
pub fn qber_for(error_count: usize) -> f64 {
    (error_count as f64 / QUBIT_COUNT as f64) * 100.0
}

/// Executa um passe completo sobre o banco
///
/// Ordem dos sorteios: ruído qubit a qubit (índice crescente), depois os 64
/// dígitos da chave.
pub fn run_measurement(
    bank: &QubitBank,
    params: &NoiseParameters,
    rng: &mut impl RandomSource,
    clock: &impl Clock,
    id: u64,
) -> MeasurementPass {
    let measured = bank.map(|qubit| apply_noise(qubit, params, rng).collapse());

    let errors = measured.error_count();
    let qber = qber_for(errors);
    let derived_key = DerivedKey::derive(&measured, rng);

    debug!(id, errors, qber, "measurement pass");

    let result = MeasurementResult {
        id,
        qber,
        depolarization_rate: params.depolarization_rate,
        damping_rate: params.damping_rate,
        timestamp: clock.now(),
        qubit_count: QUBIT_COUNT,
        derived_key: derived_key.clone(),
    };

    MeasurementPass {
        bank: measured,
        qber,
        derived_key,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::qubit::{Basis, Qubit};
    use crate::rng::{ScriptedSource, StdSource};

    fn all_ones() -> QubitBank {
        QubitBank::from_qubits([Qubit::new(1, Basis::Computational); QUBIT_COUNT])
    }

    #[test]
    fn test_key_digit_arithmetic() {
        let bank = all_ones().map(|q| q.collapse());
        let key = DerivedKey::derive(&bank, &mut ScriptedSource::constant(0.0, 7));
        assert_eq!(key.as_str(), "F".repeat(KEY_HEX_LENGTH));

        let bank = QubitBank::from_qubits([Qubit::new(0, Basis::Computational); QUBIT_COUNT])
            .map(|q| q.collapse());
        let key = DerivedKey::derive(&bank, &mut ScriptedSource::constant(0.0, 3));
        assert_eq!(key.as_str(), "3".repeat(KEY_HEX_LENGTH));
    }

    #[test]
    fn test_key_format() {
        let clock = FixedClock::at_unix(0);
        let bank = QubitBank::random(&mut StdSource::seeded(3));
        let pass = run_measurement(&bank, &NoiseParameters::default(), &mut StdSource::seeded(4), &clock, 1);
        assert_eq!(pass.derived_key.len(), KEY_HEX_LENGTH);
        assert!(pass.derived_key.as_str().chars().all(|c| matches!(c, '0'..='9' | 'A'..='F')));
    }

    #[test]
    fn test_damping_everything_gives_full_qber() {
        let params = NoiseParameters { depolarization_rate: 0.0, damping_rate: 1.0 };
        let pass = run_measurement(&all_ones(), &params, &mut ScriptedSource::constant(0.5, 0), &FixedClock::at_unix(0), 1);
        assert_eq!(pass.qber, 100.0);
        assert!(pass.bank.iter().all(|q| q.measured_value() == Some(0)));
        assert_eq!(pass.result.status(), SecurityStatus::Risky);
        assert_eq!(pass.result.fidelity(), 0.0);
    }

    #[test]
    fn test_result_snapshot() {
        let clock = FixedClock::at_unix(1_768_564_800);
        let params = NoiseParameters::new(0.1, 0.2).unwrap();
        let pass = run_measurement(&all_ones(), &params, &mut StdSource::seeded(5), &clock, 7);
        assert_eq!(pass.result.id, 7);
        assert_eq!(pass.result.qubit_count, QUBIT_COUNT);
        assert_eq!(pass.result.noise(), params);
        assert_eq!(pass.result.derived_key, pass.derived_key);
        assert_eq!(pass.result.timestamp_iso(), "2026-01-16T12:00:00.000Z");
    }

    #[test]
    fn test_status_threshold() {
        assert_eq!(SecurityStatus::from_qber(None), SecurityStatus::Idle);
        assert_eq!(SecurityStatus::from_qber(Some(6.25)), SecurityStatus::Safe);
        assert_eq!(SecurityStatus::from_qber(Some(12.5)), SecurityStatus::Risky);
        assert_eq!(qber_for(2), 12.5);
        assert_eq!(fidelity(12.5), 87.5);
    }
}
