//! Qubits simulados e o banco fixo de 16 posições

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QkdError, QkdResult};
use crate::rng::RandomSource;

/// Número fixo de qubits no banco
pub const QUBIT_COUNT: usize = 16;

/// Base de medição nominal (apenas um rótulo clássico)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    /// Base computacional (Z)
    #[default]
    Computational,
    /// Base de Hadamard (X)
    Hadamard,
}

impl Basis {
    /// Converte do índice 0/1 (qualquer valor ímpar vira Hadamard)
    pub fn from_index(index: u32) -> Self {
        if index & 1 == 0 {
            Basis::Computational
        } else {
            Basis::Hadamard
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Basis::Computational => 0,
            Basis::Hadamard => 1,
        }
    }

    /// A outra base
    pub fn flipped(self) -> Self {
        match self {
            Basis::Computational => Basis::Hadamard,
            Basis::Hadamard => Basis::Computational,
        }
    }

    /// Rótulo curto para exibição
    pub fn label(self) -> &'static str {
        match self {
            Basis::Computational => "Z-Computational",
            Basis::Hadamard => "X-Hadamard",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evento de ruído que alterou o qubit no último passe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseEffect {
    #[default]
    None,
    Depolarized,
    Damped,
}

/// Qubit simulado: bit clássico + rótulo de base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQubit")]
pub struct Qubit {
    /// Bit clássico codificado (0 ou 1)
    pub(crate) bit_value: u8,
    /// Base escolhida antes da medição
    pub(crate) basis: Basis,
    /// Valor medido; presente só após um passe de medição
    pub(crate) measured_value: Option<u8>,
    /// Ruído aplicado no último passe
    pub(crate) noise_effect: NoiseEffect,
    /// Ruído mudou o bit final?
    pub(crate) is_error: bool,
}

impl Qubit {
    /// Cria qubit não medido (o bit é reduzido a 0/1)
    pub fn new(bit_value: u8, basis: Basis) -> Self {
        Self {
            bit_value: bit_value & 1,
            basis,
            measured_value: None,
            noise_effect: NoiseEffect::None,
            is_error: false,
        }
    }

    /// Qubit aleatório: bit e base uniformes em {0, 1}, nessa ordem
    pub fn random(rng: &mut impl RandomSource) -> Self {
        let bit = rng.uniform_int(2) as u8;
        let basis = Basis::from_index(rng.uniform_int(2));
        Self::new(bit, basis)
    }

    pub fn bit_value(&self) -> u8 {
        self.bit_value
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn measured_value(&self) -> Option<u8> {
        self.measured_value
    }

    pub fn noise_effect(&self) -> NoiseEffect {
        self.noise_effect
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn is_measured(&self) -> bool {
        self.measured_value.is_some()
    }

    /// Colapsa: fixa o valor medido no bit atual
    pub(crate) fn collapse(mut self) -> Self {
        self.measured_value = Some(self.bit_value);
        self
    }
}

/// Forma serializada de [`Qubit`], validada antes da conversão
#[derive(Deserialize)]
struct RawQubit {
    bit_value: u8,
    basis: Basis,
    measured_value: Option<u8>,
    noise_effect: NoiseEffect,
    is_error: bool,
}

fn check_bit(field: &'static str, value: u8) -> QkdResult<u8> {
    if value <= 1 {
        Ok(value)
    } else {
        Err(QkdError::InvalidBit { field, value })
    }
}

impl TryFrom<RawQubit> for Qubit {
    type Error = QkdError;

    fn try_from(raw: RawQubit) -> QkdResult<Self> {
        Ok(Self {
            bit_value: check_bit("bit_value", raw.bit_value)?,
            basis: raw.basis,
            measured_value: raw
                .measured_value
                .map(|v| check_bit("measured_value", v))
                .transpose()?,
            noise_effect: raw.noise_effect,
            is_error: raw.is_error,
        })
    }
}

/// Banco ordenado de exatamente [`QUBIT_COUNT`] qubits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitBank {
    qubits: [Qubit; QUBIT_COUNT],
}

impl QubitBank {
    /// Cria banco a partir de qubits já construídos
    pub fn from_qubits(qubits: [Qubit; QUBIT_COUNT]) -> Self {
        Self { qubits }
    }

    /// Banco novo: cada qubit sorteado em ordem de índice (bit, depois base)
    pub fn random(rng: &mut impl RandomSource) -> Self {
        let mut qubits = [Qubit::new(0, Basis::Computational); QUBIT_COUNT];
        for qubit in qubits.iter_mut() {
            *qubit = Qubit::random(rng);
        }
        Self { qubits }
    }

    pub fn len(&self) -> usize {
        QUBIT_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&Qubit> {
        self.qubits.get(index)
    }

    pub fn qubits(&self) -> &[Qubit; QUBIT_COUNT] {
        &self.qubits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Qubit> {
        self.qubits.iter()
    }

    /// Algum qubit já foi medido?
    pub fn is_measured(&self) -> bool {
        self.qubits.iter().any(Qubit::is_measured)
    }

    /// Número de qubits marcados com erro
    pub fn error_count(&self) -> usize {
        self.qubits.iter().filter(|q| q.is_error).count()
    }

    /// Aplica `f` a cada qubit, em ordem de índice
    pub(crate) fn map(&self, mut f: impl FnMut(&Qubit) -> Qubit) -> Self {
        let mut qubits = self.qubits;
        for qubit in qubits.iter_mut() {
            *qubit = f(qubit);
        }
        Self { qubits }
    }

    /// Inverte a base do qubit `index`
    ///
    /// Qubits já medidos ficam intactos. Índice fora do banco é erro.
    pub fn toggle_basis(&self, index: usize) -> QkdResult<QubitBank> {
        let qubit = self.qubits.get(index).ok_or(QkdError::IndexOutOfRange {
            index,
            len: QUBIT_COUNT,
        })?;

        let mut bank = self.clone();
        if !qubit.is_measured() {
            bank.qubits[index].basis = qubit.basis.flipped();
        }
        Ok(bank)
    }
}

impl<'a> IntoIterator for &'a QubitBank {
    type Item = &'a Qubit;
    type IntoIter = std::slice::Iter<'a, Qubit>;

    fn into_iter(self) -> Self::IntoIter {
        self.qubits.iter()
    }
}

/// Gera um banco recém-inicializado
pub fn reset_bank(rng: &mut impl RandomSource) -> QubitBank {
    QubitBank::random(rng)
}

/// Forma livre de [`QubitBank::toggle_basis`]
pub fn toggle_basis(bank: &QubitBank, index: usize) -> QkdResult<QubitBank> {
    bank.toggle_basis(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedSource, StdSource};

    #[test]
    fn test_new_qubit_masks_bit() {
        let q = Qubit::new(3, Basis::Hadamard);
        assert_eq!(q.bit_value(), 1);
        assert!(!q.is_measured());
        assert_eq!(q.noise_effect(), NoiseEffect::None);
        assert!(!q.is_error());
    }

    #[test]
    fn test_random_bank_draw_order() {
        // bit, base, bit, base, ...
        let mut rng = ScriptedSource::new(vec![], vec![1, 0, 0, 1]);
        let bank = QubitBank::random(&mut rng);
        assert_eq!(bank.get(0).map(|q| (q.bit_value(), q.basis())), Some((1, Basis::Computational)));
        assert_eq!(bank.get(1).map(|q| (q.bit_value(), q.basis())), Some((0, Basis::Hadamard)));
        assert_eq!(rng.ints_drawn(), 2 * QUBIT_COUNT);
    }

    #[test]
    fn test_toggle_flips_only_target() {
        let bank = QubitBank::random(&mut StdSource::seeded(1));
        let toggled = bank.toggle_basis(5).unwrap();
        for (i, (before, after)) in bank.iter().zip(toggled.iter()).enumerate() {
            if i == 5 {
                assert_eq!(after.basis(), before.basis().flipped());
            } else {
                assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn test_toggle_out_of_range() {
        let bank = QubitBank::random(&mut StdSource::seeded(1));
        assert_eq!(
            bank.toggle_basis(QUBIT_COUNT),
            Err(QkdError::IndexOutOfRange { index: QUBIT_COUNT, len: QUBIT_COUNT })
        );
    }

    #[test]
    fn test_toggle_measured_is_noop() {
        let bank = QubitBank::random(&mut StdSource::seeded(9)).map(|q| q.collapse());
        let toggled = toggle_basis(&bank, 2).unwrap();
        assert_eq!(toggled, bank);
    }

    #[test]
    fn test_deserialize_rejects_non_binary_bits() {
        let valid = r#"{"bit_value":1,"basis":"hadamard","measured_value":0,"noise_effect":"damped","is_error":true}"#;
        let q: Qubit = serde_json::from_str(valid).unwrap();
        assert_eq!(q.bit_value(), 1);
        assert_eq!(q.measured_value(), Some(0));

        let bad_bit = r#"{"bit_value":7,"basis":"hadamard","measured_value":null,"noise_effect":"none","is_error":false}"#;
        let err = serde_json::from_str::<Qubit>(bad_bit).unwrap_err();
        assert!(err.to_string().contains("bit_value 7"));

        let bad_measured = r#"{"bit_value":0,"basis":"computational","measured_value":2,"noise_effect":"none","is_error":false}"#;
        assert!(serde_json::from_str::<Qubit>(bad_measured).is_err());
    }

    #[test]
    fn test_bank_deserialize_validates_each_qubit() {
        let bank = QubitBank::random(&mut StdSource::seeded(4));
        let mut json = serde_json::to_value(&bank).unwrap();
        let back: QubitBank = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, bank);

        json["qubits"][15]["bit_value"] = 7.into();
        assert!(serde_json::from_value::<QubitBank>(json).is_err());
    }

    #[test]
    fn test_basis_index_round_trip() {
        assert_eq!(Basis::from_index(Basis::Hadamard.index() as u32), Basis::Hadamard);
        assert_eq!(Basis::from_index(0), Basis::Computational);
    }
}
