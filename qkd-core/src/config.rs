//! Environment configuration loading from .env files
//!
//! Loads session defaults from .env or environment variables.
//!
//! | Variable                  | Default | Notes                    |
//! |---------------------------|---------|--------------------------|
//! | `QKD_DEPOLARIZATION_RATE` | 0.08    | clamped to [0, 0.5]      |
//! | `QKD_DAMPING_RATE`        | 0.04    | clamped to [0, 0.3]      |
//! | `QKD_AUTO_AUDIT`          | true    | `1/0`, `true/false`, `on/off` |
//! | `QKD_SEED`                | unset   | seeds the session RNG    |

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{QkdError, QkdResult};
use crate::noise::{DEFAULT_DAMPING_RATE, DEFAULT_DEPOLARIZATION_RATE, NoiseParameters};

// Automatically load .env when config module is accessed
static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

/// Ensure environment is loaded
#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

fn var(name: &str) -> Option<String> {
    ensure_loaded();
    env::var(name).ok()
}

/// Interpreta um float; ausente ou inválido usa o default
pub fn parse_rate(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Interpreta um booleano no estilo de variáveis de ambiente
pub fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Interpreta uma seed opcional; presente mas inválida é erro
pub fn parse_seed(raw: Option<&str>) -> QkdResult<Option<u64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| QkdError::Config(format!("QKD_SEED must be an unsigned integer, got '{v}'"))),
    }
}

/// Load depolarization rate from environment
/// Default: 0.08
pub fn depolarization_rate() -> f64 {
    parse_rate(var("QKD_DEPOLARIZATION_RATE").as_deref(), DEFAULT_DEPOLARIZATION_RATE)
}

/// Load amplitude damping rate from environment
/// Default: 0.04
pub fn damping_rate() -> f64 {
    parse_rate(var("QKD_DAMPING_RATE").as_deref(), DEFAULT_DAMPING_RATE)
}

/// Load auto-audit flag from environment
/// Default: true
pub fn auto_audit() -> bool {
    parse_flag(var("QKD_AUTO_AUDIT").as_deref(), true)
}

/// Load RNG seed from environment
/// Default: none (entropy)
pub fn seed() -> QkdResult<Option<u64>> {
    parse_seed(var("QKD_SEED").as_deref())
}

/// Configuração inicial de uma sessão
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub noise: NoiseParameters,
    pub auto_audit: bool,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            noise: NoiseParameters::default(),
            auto_audit: true,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Lê a configuração do ambiente (taxas saturadas nas faixas aceitas)
    pub fn from_env() -> QkdResult<Self> {
        Ok(Self {
            noise: NoiseParameters::clamped(depolarization_rate(), damping_rate()),
            auto_audit: auto_audit(),
            seed: seed()?,
        })
    }
}
