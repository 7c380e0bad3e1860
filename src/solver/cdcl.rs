//! `varisat`-backed engine with a wall-clock bound.
//!
//! Selectors are passed as assumptions, so on UNSAT the solver's failed
//! assumption core names the responsible constraints directly. The search
//! runs on its own thread; the caller stops waiting after the timeout and
//! reports `Unknown`. varisat cannot be interrupted, so a timed-out search
//! keeps its thread until it finishes; the number of such threads per
//! engine is capped by `max_in_flight`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::{debug, warn};
use varisat::{Lit, Solver, Var};

use super::encode::Encoder;
use super::{SatEngine, SolveOutcome, TrackedFormula};
use crate::config::SolverConfig;
use crate::error::SolverError;

enum Verdict {
    Sat(Vec<Lit>),
    Unsat(Vec<Lit>),
    Failed(String),
}

/// Counts solver threads that have not finished yet.
#[derive(Debug, Clone)]
struct Slots {
    in_flight: Arc<AtomicUsize>,
    max: usize,
}

/// Releases its slot when the solver thread exits.
struct SlotGuard(Arc<AtomicUsize>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Slots {
    fn new(max: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    fn acquire(&self) -> Option<SlotGuard> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.max).then_some(n + 1))
            .ok()
            .map(|_| SlotGuard(Arc::clone(&self.in_flight)))
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// CDCL engine built on `varisat`.
///
/// Clones share the same in-flight limit.
#[derive(Debug, Clone)]
pub struct VarisatEngine {
    timeout: Duration,
    max_clauses: usize,
    slots: Slots,
}

impl VarisatEngine {
    /// Creates an engine with the given bounds.
    #[must_use]
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_clauses: config.max_clauses,
            slots: Slots::new(config.max_in_flight),
        }
    }

    /// Solver threads currently running, including ones abandoned after a
    /// timeout.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.slots.in_flight()
    }
}

impl Default for VarisatEngine {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl SatEngine for VarisatEngine {
    fn name(&self) -> &str {
        "varisat"
    }

    fn solve(&self, formula: &TrackedFormula) -> SolveOutcome {
        let mut encoder = Encoder::new();
        for name in &formula.variables {
            encoder.symbol(name);
        }

        let selectors: Vec<(Lit, &str)> = formula
            .tracked
            .iter()
            .map(|t| {
                let root = encoder.encode(&t.expr);
                (encoder.guard(root), t.label.as_str())
            })
            .collect();

        let clauses = encoder.clause_count();
        if clauses > self.max_clauses {
            warn!(clauses, max_clauses = self.max_clauses, "formula exceeds clause limit");
            return SolveOutcome::Unknown(SolverError::ResourceLimit {
                clauses,
                max_clauses: self.max_clauses,
            });
        }

        let (cnf, symbols) = encoder.finish();
        let assumptions: Vec<Lit> = selectors.iter().map(|(lit, _)| *lit).collect();
        debug!(
            variables = symbols.len(),
            clauses,
            tracked = assumptions.len(),
            "solving"
        );

        let Some(slot) = self.slots.acquire() else {
            warn!(max_in_flight = self.slots.max, "all solver threads busy");
            return SolveOutcome::Unknown(SolverError::Busy {
                max_in_flight: self.slots.max,
            });
        };

        let (tx, rx) = bounded::<Verdict>(1);
        let spawned = thread::Builder::new()
            .name("lexcheck-solver".to_string())
            .spawn(move || {
                let mut solver = Solver::new();
                solver.add_formula(&cnf);
                solver.assume(&assumptions);
                let verdict = match solver.solve() {
                    Ok(true) => Verdict::Sat(solver.model().unwrap_or_default()),
                    Ok(false) => Verdict::Unsat(solver.failed_core().map(<[Lit]>::to_vec).unwrap_or_default()),
                    Err(e) => Verdict::Failed(format!("{e:?}")),
                };
                // Free the slot before the caller can observe the verdict.
                drop(slot);
                // The caller may have stopped waiting.
                let _ = tx.send(verdict);
            });

        if let Err(e) = spawned {
            return SolveOutcome::Unknown(SolverError::Engine {
                message: format!("failed to spawn solver thread: {e}"),
            });
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Verdict::Sat(model)) => SolveOutcome::Sat(assignment(&symbols, &model)),
            Ok(Verdict::Unsat(core)) => SolveOutcome::Unsat(core_labels(&selectors, &core)),
            Ok(Verdict::Failed(message)) => SolveOutcome::Unknown(SolverError::Engine { message }),
            Err(RecvTimeoutError::Timeout) => {
                let duration_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(duration_ms, "solver timed out");
                SolveOutcome::Unknown(SolverError::Timeout { duration_ms })
            }
            Err(RecvTimeoutError::Disconnected) => SolveOutcome::Unknown(SolverError::Engine {
                message: "solver worker exited without a verdict".to_string(),
            }),
        }
    }
}

/// Values for every declared symbol; unconstrained ones default to false.
fn assignment(symbols: &[(String, Lit)], model: &[Lit]) -> BTreeMap<String, bool> {
    let values: HashMap<Var, bool> = model.iter().map(|lit| (lit.var(), lit.is_positive())).collect();
    symbols
        .iter()
        .map(|(name, lit)| {
            let value = values
                .get(&lit.var())
                .is_some_and(|&positive| positive == lit.is_positive());
            (name.clone(), value)
        })
        .collect()
}

fn core_labels(selectors: &[(Lit, &str)], core: &[Lit]) -> Vec<String> {
    let failed: HashSet<Lit> = core.iter().copied().collect();
    let labels = unique_labels(
        selectors
            .iter()
            .filter(|(lit, _)| failed.contains(lit))
            .map(|(_, label)| *label),
    );
    if !labels.is_empty() {
        return labels;
    }

    // An unsatisfiable result always fails some assumption; if the engine
    // reports none, blame the whole set rather than nothing.
    warn!("solver reported an empty core");
    unique_labels(selectors.iter().map(|(_, label)| *label))
}

fn unique_labels<'a>(candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in candidates {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}
