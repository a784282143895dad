//! Modelo de ruído: amortecimento de amplitude seguido de despolarização
//!
//! ## Ordem dos eventos
//!
//! ```text
//! bit == 1 ──► draw < damping ──► bit = 0, Damped, erro
//!                 │
//!                 ▼
//!          draw < depolarization ──► bit = uniform{0,1}, Depolarized,
//!                                    erro só se o bit mudou
//! ```
//!
//! O sorteio de amortecimento só é consumido quando o bit vale 1. Um evento
//! posterior sobrescreve o rótulo do anterior.
//!
//! A despolarização só marca erro quando muda o bit que recebeu (já
//! amortecido) e nunca limpa a flag do amortecimento. Um qubit amortecido e
//! reamostrado de volta para 1 aparece como erro sem mudança líquida.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{QkdError, QkdResult};
use crate::qubit::{NoiseEffect, Qubit};
use crate::rng::RandomSource;

/// Limite superior aceito para a taxa de despolarização
pub const MAX_DEPOLARIZATION_RATE: f64 = 0.5;
/// Limite superior aceito para a taxa de amortecimento
pub const MAX_DAMPING_RATE: f64 = 0.3;
/// Taxa de despolarização padrão
pub const DEFAULT_DEPOLARIZATION_RATE: f64 = 0.08;
/// Taxa de amortecimento padrão
pub const DEFAULT_DAMPING_RATE: f64 = 0.04;

/// Parâmetros do canal ruidoso
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    /// Probabilidade de reamostrar o bit
    pub depolarization_rate: f64,
    /// Probabilidade de um bit 1 decair para 0
    pub damping_rate: f64,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            depolarization_rate: DEFAULT_DEPOLARIZATION_RATE,
            damping_rate: DEFAULT_DAMPING_RATE,
        }
    }
}

impl NoiseParameters {
    /// Cria parâmetros validando as faixas aceitas
    pub fn new(depolarization_rate: f64, damping_rate: f64) -> QkdResult<Self> {
        check_rate("depolarization", depolarization_rate, MAX_DEPOLARIZATION_RATE)?;
        check_rate("damping", damping_rate, MAX_DAMPING_RATE)?;
        Ok(Self {
            depolarization_rate,
            damping_rate,
        })
    }

    /// Canal sem ruído
    pub fn noiseless() -> Self {
        Self {
            depolarization_rate: 0.0,
            damping_rate: 0.0,
        }
    }

    /// Satura as taxas nas faixas aceitas (NaN vira 0)
    pub fn clamped(depolarization_rate: f64, damping_rate: f64) -> Self {
        Self {
            depolarization_rate: saturate(depolarization_rate, MAX_DEPOLARIZATION_RATE),
            damping_rate: saturate(damping_rate, MAX_DAMPING_RATE),
        }
    }

    /// Taxa de despolarização em pontos percentuais
    pub fn depolarization_percent(&self) -> f64 {
        self.depolarization_rate * 100.0
    }

    /// Taxa de amortecimento em pontos percentuais
    pub fn damping_percent(&self) -> f64 {
        self.damping_rate * 100.0
    }
}

fn check_rate(parameter: &'static str, value: f64, max: f64) -> QkdResult<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(QkdError::InvalidNoiseRate {
            parameter,
            value,
            max,
        })
    }
}

fn saturate(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Aplica o modelo de ruído a um qubit
///
/// Efeito e flag de erro são recalculados do zero; o valor medido e a base
/// são preservados.
pub fn apply_noise(qubit: &Qubit, params: &NoiseParameters, rng: &mut impl RandomSource) -> Qubit {
    let mut bit = qubit.bit_value();
    let mut effect = NoiseEffect::None;
    let mut is_error = false;

    if bit == 1 && rng.uniform_float() < params.damping_rate {
        bit = 0;
        effect = NoiseEffect::Damped;
        is_error = true;
    }

    if rng.uniform_float() < params.depolarization_rate {
        let old_bit = bit;
        bit = rng.uniform_int(2) as u8;
        effect = NoiseEffect::Depolarized;
        if old_bit != bit {
            is_error = true;
        }
    }

    if effect != NoiseEffect::None {
        trace!(?effect, from = qubit.bit_value(), to = bit, "noise event");
    }

    Qubit {
        bit_value: bit,
        noise_effect: effect,
        is_error,
        ..*qubit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::Basis;
    use crate::rng::ScriptedSource;

    #[test]
    fn test_new_validates_ranges() {
        assert!(NoiseParameters::new(0.5, 0.3).is_ok());
        assert!(NoiseParameters::new(0.0, 0.0).is_ok());
        assert!(matches!(
            NoiseParameters::new(0.6, 0.1),
            Err(QkdError::InvalidNoiseRate { parameter: "depolarization", .. })
        ));
        assert!(matches!(
            NoiseParameters::new(0.1, -0.01),
            Err(QkdError::InvalidNoiseRate { parameter: "damping", .. })
        ));
        assert!(NoiseParameters::new(f64::NAN, 0.1).is_err());
    }

    #[test]
    fn test_clamped() {
        let p = NoiseParameters::clamped(0.9, f64::NAN);
        assert_eq!(p.depolarization_rate, MAX_DEPOLARIZATION_RATE);
        assert_eq!(p.damping_rate, 0.0);
        let p = NoiseParameters::clamped(-1.0, 0.2);
        assert_eq!(p.depolarization_rate, 0.0);
        assert_eq!(p.damping_rate, 0.2);
    }

    #[test]
    fn test_noiseless_leaves_qubit() {
        let q = Qubit::new(1, Basis::Hadamard);
        let mut rng = ScriptedSource::constant(0.0, 1);
        let out = apply_noise(&q, &NoiseParameters::noiseless(), &mut rng);
        assert_eq!(out, q);
    }

    #[test]
    fn test_damping_only_draws_for_one_bits() {
        let params = NoiseParameters::noiseless();
        let mut rng = ScriptedSource::constant(0.5, 0);
        apply_noise(&Qubit::new(0, Basis::Computational), &params, &mut rng);
        assert_eq!(rng.floats_drawn(), 1);
        apply_noise(&Qubit::new(1, Basis::Computational), &params, &mut rng);
        assert_eq!(rng.floats_drawn(), 3);
    }

    #[test]
    fn test_damping_fires() {
        let params = NoiseParameters { depolarization_rate: 0.0, damping_rate: 0.3 };
        // damping draw 0.1 < 0.3, depolarization draw 0.9 >= 0
        let mut rng = ScriptedSource::new(vec![0.1, 0.9], vec![]);
        let out = apply_noise(&Qubit::new(1, Basis::Computational), &params, &mut rng);
        assert_eq!(out.bit_value(), 0);
        assert_eq!(out.noise_effect(), NoiseEffect::Damped);
        assert!(out.is_error());
    }

    #[test]
    fn test_depolarization_overwrites_damping_label() {
        let params = NoiseParameters { depolarization_rate: 0.5, damping_rate: 0.3 };
        // damped to 0, then depolarized back to 0: label changes, flag stays set
        let mut rng = ScriptedSource::new(vec![0.0, 0.0], vec![0]);
        let out = apply_noise(&Qubit::new(1, Basis::Computational), &params, &mut rng);
        assert_eq!(out.bit_value(), 0);
        assert_eq!(out.noise_effect(), NoiseEffect::Depolarized);
        assert!(out.is_error());
    }

    #[test]
    fn test_depolarization_without_change_is_not_error() {
        let params = NoiseParameters { depolarization_rate: 1.0, damping_rate: 0.0 };
        let mut rng = ScriptedSource::new(vec![0.5], vec![0]);
        let out = apply_noise(&Qubit::new(0, Basis::Computational), &params, &mut rng);
        assert_eq!(out.noise_effect(), NoiseEffect::Depolarized);
        assert!(!out.is_error());
    }

    #[test]
    fn test_depolarization_flip_is_error() {
        let params = NoiseParameters { depolarization_rate: 1.0, damping_rate: 0.0 };
        let mut rng = ScriptedSource::new(vec![0.5], vec![1]);
        let out = apply_noise(&Qubit::new(0, Basis::Computational), &params, &mut rng);
        assert_eq!(out.bit_value(), 1);
        assert!(out.is_error());
    }

    #[test]
    fn test_damped_then_restored_is_flagged() {
        // net bit unchanged (1 -> 0 -> 1) but still reported as an error
        let params = NoiseParameters { depolarization_rate: 0.5, damping_rate: 0.3 };
        let mut rng = ScriptedSource::new(vec![0.0, 0.0], vec![1]);
        let out = apply_noise(&Qubit::new(1, Basis::Computational), &params, &mut rng);
        assert_eq!(out.bit_value(), 1);
        assert!(out.is_error());
    }
}
