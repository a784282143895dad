//! Fontes de aleatoriedade injetáveis
//!
//! O kernel nunca chama um RNG global: toda amostragem passa por
//! [`RandomSource`], de modo que testes podem fixar a sequência de sorteios.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Capacidade mínima de aleatoriedade usada pelo kernel
pub trait RandomSource {
    /// Sorteio uniforme em [0, 1)
    fn uniform_float(&mut self) -> f64;

    /// Sorteio uniforme em [0, n). Retorna 0 quando `n == 0`.
    fn uniform_int(&mut self, n: u32) -> u32;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn uniform_float(&mut self) -> f64 {
        (**self).uniform_float()
    }

    fn uniform_int(&mut self, n: u32) -> u32 {
        (**self).uniform_int(n)
    }
}

/// Adaptador de qualquer [`rand::Rng`] para [`RandomSource`]
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

/// Fonte padrão: `StdRng`, semeado ou a partir de entropia do SO
pub type StdSource = RngSource<StdRng>;

impl<R: Rng> RngSource<R> {
    /// Envolve um RNG existente
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Fonte determinística a partir de uma seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Fonte não-determinística (entropia do SO)
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform_float(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn uniform_int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }
}

/// Fonte roteirizada: repete sequências fixas de sorteios
///
/// Floats e inteiros têm filas independentes, cada uma ciclando do início
/// quando se esgota. Floats são saturados em [0, 1) e inteiros reduzidos
/// módulo `n`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    floats: Vec<f64>,
    ints: Vec<u32>,
    float_cursor: usize,
    int_cursor: usize,
}

impl ScriptedSource {
    /// Cria fonte com as sequências dadas (sequência vazia equivale a `[0]`)
    pub fn new(floats: Vec<f64>, ints: Vec<u32>) -> Self {
        Self {
            floats: if floats.is_empty() { vec![0.0] } else { floats },
            ints: if ints.is_empty() { vec![0] } else { ints },
            float_cursor: 0,
            int_cursor: 0,
        }
    }

    /// Sempre devolve os mesmos valores
    pub fn constant(float: f64, int: u32) -> Self {
        Self::new(vec![float], vec![int])
    }

    /// Quantos floats foram consumidos
    pub fn floats_drawn(&self) -> usize {
        self.float_cursor
    }

    /// Quantos inteiros foram consumidos
    pub fn ints_drawn(&self) -> usize {
        self.int_cursor
    }
}

impl RandomSource for ScriptedSource {
    fn uniform_float(&mut self) -> f64 {
        let value = self.floats[self.float_cursor % self.floats.len()];
        self.float_cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }

    fn uniform_int(&mut self, n: u32) -> u32 {
        let value = self.ints[self.int_cursor % self.ints.len()];
        self.int_cursor += 1;
        if n == 0 { 0 } else { value % n }
    }
}
