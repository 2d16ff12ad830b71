//! Discrete-time compartment simulation
//!
//! The model advances in fixed one-second ticks: each tick applies the
//! transition operator (natural decay and redistribution) and then adds
//! the infusion rate to the central compartment. Disposition curves, the
//! rate solver and the scheduler are all built on
//! [`CompartmentModel::step`] and [`CompartmentModel::simulate`].

pub mod disposition;

use nalgebra::{Matrix4, Vector4};

use crate::error::TciError;
use crate::model::{transition_operator, ModelParameters, Site};

/// Drug amounts per compartment: central, peripheral-1, peripheral-2,
/// effect site
pub type State = Vector4<f64>;

/// Iteration cap for peak detection
pub const MAX_PEAK_TICKS: usize = 20_000;

/// Simulation horizon
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizon {
    /// Run a fixed number of ticks
    Ticks(usize),
    /// Run until the amount at the given site stops increasing, keeping
    /// only the rising part of the trajectory
    UntilPeak(Site),
}

/// A parameter record paired with its discretized transition operator
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentModel {
    params: ModelParameters,
    operator: Matrix4<f64>,
}

impl CompartmentModel {
    /// Build a model whose effect-site row uses the record's own `ke0`
    pub fn new(params: ModelParameters) -> Result<Self, TciError> {
        Self::with_site_rate(params, params.ke0())
    }

    /// Build a model with an overridden effect-site equilibration rate
    ///
    /// Calibration uses this to probe candidate rates without touching
    /// the rest of the record.
    pub fn with_site_rate(params: ModelParameters, site_rate: f64) -> Result<Self, TciError> {
        let operator = transition_operator(&params, site_rate)?;
        Ok(Self { params, operator })
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub(crate) fn operator(&self) -> &Matrix4<f64> {
        &self.operator
    }

    /// Advance one tick: natural decay and redistribution, then infusion
    /// of `rate` (amount per second) into the central compartment
    pub fn step(&self, state: &State, rate: f64) -> State {
        let mut next = self.operator * state;
        next[0] += rate;
        next
    }

    /// Concentration at a site, `amount / site volume`
    pub fn concentration(&self, state: &State, site: Site) -> f64 {
        let amount = match site {
            Site::Plasma => state[0],
            Site::Effect => state[3],
        };
        amount / self.params.site_volume(site)
    }

    /// Repeatedly [`step`](Self::step), injecting `doses[i]` at tick `i`
    /// (zero past the end of `doses`), and collect the visited states
    ///
    /// With [`Horizon::UntilPeak`] the walk stops *before* the first tick
    /// whose site amount is lower than the previous one, so the returned
    /// trajectory is the rising limb and its last entry is the peak. A
    /// response that never turns over within [`MAX_PEAK_TICKS`] fails
    /// with [`TciError::NonTermination`].
    pub fn simulate(
        &self,
        state0: &State,
        doses: &[f64],
        horizon: Horizon,
    ) -> Result<Vec<State>, TciError> {
        let dose_at = |i: usize| doses.get(i).copied().unwrap_or(0.0);

        match horizon {
            Horizon::Ticks(n) => {
                let mut states = Vec::with_capacity(n);
                let mut state = *state0;
                for i in 0..n {
                    state = self.step(&state, dose_at(i));
                    states.push(state);
                }
                Ok(states)
            }
            Horizon::UntilPeak(site) => {
                let idx = match site {
                    Site::Plasma => 0,
                    Site::Effect => 3,
                };
                let mut states = Vec::new();
                let mut state = *state0;
                let mut prev = state[idx];
                for i in 0..MAX_PEAK_TICKS {
                    let next = self.step(&state, dose_at(i));
                    if next[idx] < prev {
                        return Ok(states);
                    }
                    prev = next[idx];
                    state = next;
                    states.push(next);
                }
                Err(TciError::NonTermination {
                    max_ticks: MAX_PEAK_TICKS,
                })
            }
        }
    }

    /// Site concentrations along a trajectory
    pub fn concentrations(&self, states: &[State], site: Site) -> Vec<f64> {
        states
            .iter()
            .map(|state| self.concentration(state, site))
            .collect()
    }
}
