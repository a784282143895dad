//! # 🔑 qkd-core — QKD Noise Simulation Kernel
//!
//! Simula classicamente um passe de distribuição quântica de chaves: um banco
//! de 16 qubits fictícios, ruído de amortecimento e despolarização, cálculo
//! do QBER e uma chave hexadecimal cosmética. Não há criptografia real nem
//! simulação quântica real.
//!
//! ## Computational Complexity
//!
//! **Measurement pass — O(16 + 64):**
//! - 16 noise applications (at most 3 draws each)
//! - 64 key digits (1 draw each)
//!
//! **History — O(1) append:** `VecDeque` bounded at 20 entries.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          QkdSession                             │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  QubitBank (16) + NoiseParameters         │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  MeasurementPass (noise → collapse →      │  │
//! │  │  QBER → key)                              │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  HistoryLog (20) + EventLog (10)          │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//!        ▲ RandomSource          ▲ Clock
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use qkd_core::{FixedClock, QkdSession, StdSource};
//!
//! let mut session = QkdSession::new(StdSource::seeded(7), FixedClock::at_unix(0));
//! session.toggle_basis(3).unwrap();
//! let result = session.measure().unwrap();
//!
//! assert_eq!(result.derived_key.len(), 64);
//! assert!((0.0..=100.0).contains(&result.qber));
//! assert_eq!(session.history().len(), 1);
//! ```

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod measurement;
pub mod noise;
pub mod qubit;
pub mod rng;
pub mod session;

pub use audit::{AuditPrompt, FALLBACK_REPORT, SecurityAnalyst, ThresholdAnalyst};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SessionConfig;
pub use error::{AnalysisError, QkdError, QkdResult};
pub use events::{Event, EventLog, EVENT_LOG_CAPACITY};
pub use history::{ChartPoint, HistoryLog, HISTORY_CAPACITY, append_history};
pub use measurement::{
    DerivedKey, KEY_HEX_LENGTH, MeasurementPass, MeasurementResult, QBER_SAFETY_THRESHOLD,
    SecurityStatus, fidelity, qber_for, run_measurement,
};
pub use noise::{
    DEFAULT_DAMPING_RATE, DEFAULT_DEPOLARIZATION_RATE, MAX_DAMPING_RATE, MAX_DEPOLARIZATION_RATE,
    NoiseParameters, apply_noise,
};
pub use qubit::{Basis, NoiseEffect, QUBIT_COUNT, Qubit, QubitBank, reset_bank, toggle_basis};
pub use rng::{RandomSource, RngSource, ScriptedSource, StdSource};
pub use session::{QkdSession, SimulationObserver};
