use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::CostSnapshot;
use crate::state::SceneState;

/// scalar objective the annealer minimizes. takes `&mut self` so
/// implementations can reuse scratch buffers between evaluations.
pub trait CostFn {
    fn cost(&mut self, state: &SceneState) -> f64;
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cooling factor must be in (0, 1), got {0}")]
    CoolingFactor(f64),

    #[error("initial temperature must be positive, got {0}")]
    InitialTemp(f64),

    #[error("minimum temperature must be positive, got {0}")]
    MinTemp(f64),

    #[error("iterations per step must be at least 1")]
    IterationsPerStep,
}

/// cooling schedule and proposal budget for one annealing run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnealConfig {
    pub initial_temp: f64,        // starting temperature
    pub min_temp: f64,            // run is finished once temp falls below this
    pub cooling_factor: f64,      // temperature multiplier per step, in (0, 1)
    pub iterations_per_step: u32, // proposals attempted per step
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temp: 100.0,
            min_temp: 0.001,
            cooling_factor: 0.98,
            iterations_per_step: 100,
        }
    }
}

impl AnnealConfig {
    /// comparisons are written so NaN fails them too.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cooling_factor > 0.0 && self.cooling_factor < 1.0) {
            return Err(ConfigError::CoolingFactor(self.cooling_factor));
        }
        if !(self.initial_temp > 0.0) {
            return Err(ConfigError::InitialTemp(self.initial_temp));
        }
        if !(self.min_temp > 0.0) {
            return Err(ConfigError::MinTemp(self.min_temp));
        }
        if self.iterations_per_step == 0 {
            return Err(ConfigError::IterationsPerStep);
        }
        Ok(())
    }
}

type Observer = Box<dyn FnMut(&SceneState, f64, f64)>;

/// metropolis-style simulated annealing over a triangle scene.
///
/// each step proposes `iterations_per_step` random mutations. a proposal
/// with candidate cost `c` replaces the current state with probability
/// `exp((current - c) / temp)`, so improvements and neutral moves always
/// pass and uphill moves pass less often as the temperature falls.
pub struct Annealer<C: CostFn> {
    state: SceneState,
    cost_fn: C,
    cfg: AnnealConfig,
    temp: f64,
    current_cost: Option<f64>,
    baseline_cost: Option<f64>,
    best_cost: Option<f64>,
    steps: u64,
    attempts: u64,
    accepted: u64,
    rng: Pcg32,
    observer: Option<Observer>,
}

impl<C: CostFn> Annealer<C> {
    pub fn new(state: SceneState, cost_fn: C, cfg: AnnealConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        debug!(
            initial_temp = cfg.initial_temp,
            min_temp = cfg.min_temp,
            cooling_factor = cfg.cooling_factor,
            iterations_per_step = cfg.iterations_per_step,
            "annealer ready"
        );
        Ok(Self {
            state,
            cost_fn,
            cfg,
            temp: cfg.initial_temp,
            current_cost: None,
            baseline_cost: None,
            best_cost: None,
            steps: 0,
            attempts: 0,
            accepted: 0,
            rng: Pcg32::seed_from_u64(0xDEADBEEF),
            observer: None,
        })
    }

    /// reseed the proposal stream, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    /// called after each step's proposals, before cooling, with the state,
    /// its cost and the temperature the step ran at.
    pub fn with_observer(mut self, observer: impl FnMut(&SceneState, f64, f64) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// true once the temperature has fallen below the configured minimum.
    #[inline]
    pub fn done(&self) -> bool {
        self.temp < self.cfg.min_temp
    }

    /// run one annealing step at the current temperature, then notify the
    /// observer and cool. no-op once `done`.
    ///
    /// the first call also evaluates the starting state to seed the
    /// baseline; that evaluation is not counted as an attempt.
    pub fn step(&mut self) {
        profiling::scope!("anneal_step");
        if self.done() {
            return;
        }
        let mut current = match self.current_cost {
            Some(cost) => cost,
            None => {
                let cost = self.cost_fn.cost(&self.state);
                self.baseline_cost = Some(cost);
                self.best_cost = Some(cost);
                cost
            }
        };
        for _ in 0..self.cfg.iterations_per_step {
            self.attempts += 1;
            let pending = self.state.random_mutation(&mut self.rng);
            let candidate = self.cost_fn.cost(pending.state());
            let ap = ((current - candidate) / self.temp).exp();
            if self.rng.random::<f64>() < ap {
                pending.accept();
                self.accepted += 1;
                current = candidate;
                if let Some(best) = self.best_cost.as_mut() {
                    if candidate < *best {
                        *best = candidate;
                    }
                }
            } else {
                pending.undo();
            }
        }
        self.current_cost = Some(current);
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.state, current, self.temp);
        }
        self.temp *= self.cfg.cooling_factor;
        self.steps += 1;
    }

    /// step until the schedule is exhausted.
    pub fn run(&mut self) {
        profiling::scope!("anneal_run");
        while !self.done() {
            self.step();
        }
        debug!(
            steps = self.steps,
            attempts = self.attempts,
            accepted = self.accepted,
            cost = self.current_cost,
            "annealing run finished"
        );
    }

    #[inline]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temp
    }

    /// cost of the current state, `None` until the first step runs.
    #[inline]
    pub fn current_cost(&self) -> Option<f64> {
        self.current_cost
    }

    /// cost of the starting state, `None` until the first step runs.
    #[inline]
    pub fn baseline_cost(&self) -> Option<f64> {
        self.baseline_cost
    }

    /// lowest cost any accepted state has had. never above `baseline_cost`.
    #[inline]
    pub fn best_cost(&self) -> Option<f64> {
        self.best_cost
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn config(&self) -> &AnnealConfig {
        &self.cfg
    }

    pub fn cost_fn(&self) -> &C {
        &self.cost_fn
    }

    pub fn cost_fn_mut(&mut self) -> &mut C {
        &mut self.cost_fn
    }

    /// quality metrics for the current cost, once a step has run.
    pub fn metrics(&self) -> Option<CostSnapshot> {
        let cost = self.current_cost?;
        let num_pixels = self.state.width() as usize * self.state.height() as usize;
        Some(CostSnapshot::from_cost(cost, num_pixels))
    }

    pub fn into_state(self) -> SceneState {
        self.state
    }
}
