//! Sessão do simulador: dono explícito de todo o estado mutável
//!
//! Cada operação mutável verifica a flag `busy` na entrada. Um passe é
//! `begin_measurement` seguido de `complete_measurement`; [`QkdSession::measure`]
//! faz os dois de forma síncrona.

use std::fmt;
use tracing::{error, info, warn};

use crate::audit::{AuditPrompt, FALLBACK_REPORT, SecurityAnalyst};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{AnalysisError, QkdError, QkdResult};
use crate::events::EventLog;
use crate::history::HistoryLog;
use crate::measurement::{
    DerivedKey, MeasurementResult, SecurityStatus, fidelity, run_measurement,
};
use crate::noise::NoiseParameters;
use crate::qubit::{QUBIT_COUNT, QubitBank, reset_bank};
use crate::rng::{RandomSource, StdSource};

/// Recebe notificações da sessão
pub trait SimulationObserver {
    /// Chave entregue pelo operador via [`QkdSession::export_key`]
    fn on_key_generated(&mut self, _key: &DerivedKey) {}

    /// Resumo do passe, já anexado ao histórico
    fn on_simulation_complete(&mut self, _result: &MeasurementResult) {}
}

/// Estado de uma sessão de simulação
pub struct QkdSession<R: RandomSource, C: Clock> {
    bank: QubitBank,
    noise: NoiseParameters,
    history: HistoryLog,
    events: EventLog,
    last_qber: Option<f64>,
    derived_key: Option<DerivedKey>,
    analysis: Option<String>,
    busy: bool,
    next_id: u64,
    auto_audit: bool,
    analyst: Option<Box<dyn SecurityAnalyst>>,
    observers: Vec<Box<dyn SimulationObserver>>,
    rng: R,
    clock: C,
}

impl QkdSession<StdSource, SystemClock> {
    /// Sessão com relógio do sistema; semeada se a configuração tiver seed
    pub fn from_config(config: &SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdSource::seeded(seed),
            None => StdSource::from_entropy(),
        };
        Self::with_parts(config, rng, SystemClock)
    }
}

impl<R: RandomSource, C: Clock> QkdSession<R, C> {
    /// Sessão com parâmetros padrão
    pub fn new(rng: R, clock: C) -> Self {
        Self::with_parts(&SessionConfig::default(), rng, clock)
    }

    /// Sessão com configuração, RNG e relógio explícitos
    pub fn with_parts(config: &SessionConfig, mut rng: R, clock: C) -> Self {
        let bank = reset_bank(&mut rng);
        let mut events = EventLog::new();
        events.record(clock.now(), "System reset. Qubits initialized in vacuum state.");

        Self {
            bank,
            noise: config.noise,
            history: HistoryLog::new(),
            events,
            last_qber: None,
            derived_key: None,
            analysis: None,
            busy: false,
            next_id: 1,
            auto_audit: config.auto_audit,
            analyst: None,
            observers: Vec::new(),
            rng,
            clock,
        }
    }

    /// Registra o analista usado pela auditoria automática
    pub fn with_analyst(mut self, analyst: impl SecurityAnalyst + 'static) -> Self {
        self.analyst = Some(Box::new(analyst));
        self
    }

    /// Registra um observador de passes
    pub fn subscribe(&mut self, observer: impl SimulationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn bank(&self) -> &QubitBank {
        &self.bank
    }

    pub fn noise(&self) -> NoiseParameters {
        self.noise
    }

    /// Histórico somente-leitura (mais recente por último)
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn last_qber(&self) -> Option<f64> {
        self.last_qber
    }

    pub fn derived_key(&self) -> Option<&DerivedKey> {
        self.derived_key.as_ref()
    }

    /// Relatório de auditoria em cache
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn auto_audit(&self) -> bool {
        self.auto_audit
    }

    pub fn set_auto_audit(&mut self, enabled: bool) {
        self.auto_audit = enabled;
    }

    pub fn status(&self) -> SecurityStatus {
        SecurityStatus::from_qber(self.last_qber)
    }

    pub fn fidelity(&self) -> Option<f64> {
        self.last_qber.map(fidelity)
    }

    /// Reinicia o banco e limpa chave, QBER e relatório
    ///
    /// Ignorado (retorna `false`) durante um passe.
    pub fn reset(&mut self) -> bool {
        if self.busy {
            warn!("reset ignored: measurement pass in progress");
            return false;
        }

        self.bank = reset_bank(&mut self.rng);
        self.derived_key = None;
        self.last_qber = None;
        self.analysis = None;
        self.log("System reset. Qubits initialized in vacuum state.");
        info!("qubit bank reset");
        true
    }

    /// Inverte a base do qubit `index`
    ///
    /// `Ok(false)` quando ignorado (qubit já medido ou passe em andamento).
    pub fn toggle_basis(&mut self, index: usize) -> QkdResult<bool> {
        let Some(qubit) = self.bank.get(index) else {
            return Err(QkdError::IndexOutOfRange {
                index,
                len: QUBIT_COUNT,
            });
        };

        if self.busy || qubit.is_measured() {
            warn!(index, busy = self.busy, "basis toggle ignored");
            return Ok(false);
        }

        self.bank = self.bank.toggle_basis(index)?;
        let basis = self.bank.qubits()[index].basis();
        self.log(format!("Qubit {index} basis manually set to {basis}"));
        Ok(true)
    }

    /// Altera os parâmetros de ruído (validados) entre passes
    pub fn set_noise(&mut self, depolarization_rate: f64, damping_rate: f64) -> QkdResult<()> {
        if self.busy {
            return Err(QkdError::MeasurementInProgress);
        }
        self.noise = NoiseParameters::new(depolarization_rate, damping_rate)?;
        Ok(())
    }

    /// Marca a sessão como ocupada e limpa o resultado anterior
    pub fn begin_measurement(&mut self) -> QkdResult<()> {
        if self.busy {
            return Err(QkdError::MeasurementInProgress);
        }

        self.busy = true;
        self.derived_key = None;
        self.last_qber = None;
        self.analysis = None;
        self.log("Applying selected bases and collapsing wavefunction...");
        Ok(())
    }

    /// Executa o passe iniciado por [`begin_measurement`](Self::begin_measurement)
    pub fn complete_measurement(&mut self) -> QkdResult<MeasurementResult> {
        if !self.busy {
            return Err(QkdError::NoMeasurementPending);
        }

        self.log("Executing projection measurements...");

        let id = self.next_id;
        let pass = run_measurement(&self.bank, &self.noise, &mut self.rng, &self.clock, id);
        self.next_id += 1;

        self.bank = pass.bank;
        self.last_qber = Some(pass.qber);
        self.derived_key = Some(pass.derived_key.clone());
        self.history.push(pass.result.clone());
        self.busy = false;

        info!(
            id,
            qber = pass.qber,
            status = %SecurityStatus::from_qber(Some(pass.qber)),
            "measurement complete"
        );

        for observer in self.observers.iter_mut() {
            observer.on_simulation_complete(&pass.result);
        }

        if self.auto_audit {
            self.audit(&pass.result);
        }

        Ok(pass.result)
    }

    /// Passe completo e síncrono
    pub fn measure(&mut self) -> QkdResult<MeasurementResult> {
        self.begin_measurement()?;
        self.complete_measurement()
    }

    /// Entrega a chave do último passe aos observadores
    ///
    /// `None` (sem notificação) quando não há chave: nenhum passe desde o
    /// último reset ou passe em andamento.
    pub fn export_key(&mut self) -> Option<DerivedKey> {
        let key = self.derived_key.clone()?;
        for observer in self.observers.iter_mut() {
            observer.on_key_generated(&key);
        }
        self.log("Key exported to session.");
        info!("derived key exported");
        Some(key)
    }

    /// Audita o resultado e guarda o relatório (ou o texto de fallback)
    ///
    /// Sem analista registrado nada acontece.
    pub fn audit(&mut self, result: &MeasurementResult) -> Option<&str> {
        let analyst = self.analyst.as_ref()?;
        let prompt = AuditPrompt::from_result(result);

        let report = analyst.analyze(&prompt).and_then(|text| {
            if text.trim().is_empty() {
                Err(AnalysisError::EmptyReport)
            } else {
                Ok(text)
            }
        });

        let report = report.unwrap_or_else(|e| {
            error!("fast audit failed: {e}");
            FALLBACK_REPORT.to_string()
        });

        self.analysis = Some(report);
        self.analysis.as_deref()
    }

    fn log(&mut self, message: impl Into<String>) {
        self.events.record(self.clock.now(), message);
    }
}

impl<R: RandomSource, C: Clock> fmt::Debug for QkdSession<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QkdSession")
            .field("bank", &self.bank)
            .field("noise", &self.noise)
            .field("history_len", &self.history.len())
            .field("last_qber", &self.last_qber)
            .field("busy", &self.busy)
            .field("auto_audit", &self.auto_audit)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
