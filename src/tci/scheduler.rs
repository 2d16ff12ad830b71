//! Tick-by-tick infusion scheduling over a target sequence
//!
//! The scheduler owns the compartment state for the duration of one run.
//! It consults the rate solver at decision points (when the previous
//! decision's wait horizon expires, or immediately when the target
//! changes) and advances the model every tick, recording the observable
//! series.

use serde::Serialize;

use crate::error::TciError;
use crate::model::{ModelParameters, Site};
use crate::simulator::disposition::PULSE_TICKS;
use crate::simulator::{CompartmentModel, State};
use crate::tci::solver::TciSolver;

/// One tick of the observable series produced by a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    /// Target concentration (Ct) requested for this tick
    pub target: f64,
    /// Infusion rate applied this tick (amount per second)
    pub rate: f64,
    /// Plasma concentration (Cp) after the tick
    pub plasma: f64,
    /// Effect-site concentration (Ce) after the tick
    pub effect: f64,
    /// Cumulative infused amount through this tick
    pub infused: f64,
}

/// The full per-tick series of one scheduler run, in tick order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfusionSeries {
    records: Vec<TickRecord>,
}

impl InfusionSeries {
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickRecord> {
        self.records.iter()
    }

    /// Total amount infused over the run
    pub fn total_infused(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.infused)
    }

    /// Applied rates, one per tick
    pub fn rates(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.rate).collect()
    }

    /// Plasma concentrations, one per tick
    pub fn plasma(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.plasma).collect()
    }

    /// Effect-site concentrations, one per tick
    pub fn effect(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.effect).collect()
    }
}

impl<'a> IntoIterator for &'a InfusionSeries {
    type Item = &'a TickRecord;
    type IntoIter = std::slice::Iter<'a, TickRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Drives a target sequence through the solver and the model
pub struct InfusionScheduler {
    model: CompartmentModel,
    solver: TciSolver,
    max_rate: Option<f64>,
}

impl InfusionScheduler {
    /// Build a scheduler targeting the given site
    pub fn new(params: ModelParameters, site: Site) -> Result<Self, TciError> {
        let model = CompartmentModel::new(params)?;
        let solver = TciSolver::new(model.clone(), site)?;
        Ok(Self {
            model,
            solver,
            max_rate: None,
        })
    }

    /// Cap the deliverable infusion rate (pump limit)
    ///
    /// When a solved rate exceeds the cap it is clamped and the solver is
    /// re-consulted right after the full clamped pulse instead of at the
    /// solved wait horizon.
    pub fn with_max_rate(mut self, max_rate: f64) -> Self {
        self.max_rate = Some(max_rate);
        self
    }

    pub fn site(&self) -> Site {
        self.solver.site()
    }

    /// Run the full target sequence, one tick per entry
    ///
    /// Returns the complete observable series. Any solver or simulator
    /// failure aborts the run and carries the triggering tick index; no
    /// partial series is returned.
    pub fn run(&self, targets: &[f64]) -> Result<InfusionSeries, TciError> {
        let mut state = State::zeros();
        let mut records = Vec::with_capacity(targets.len());

        let mut last_target = 0.0_f64;
        let mut next_decision = 0_usize;
        let mut infuse_until = 0_usize;
        let mut rate = 0.0_f64;
        let mut infused = 0.0_f64;

        for (tick, &target) in targets.iter().enumerate() {
            if tick >= next_decision || target != last_target {
                last_target = target;
                let decision = self
                    .solver
                    .solve(&state, target)
                    .map_err(|e| e.at_tick(tick))?;
                rate = decision.rate;
                infuse_until = tick + PULSE_TICKS;
                if let Some(max_rate) = self.max_rate.filter(|&m| decision.rate > m) {
                    // unreachable target at this pump limit; deliver the
                    // full clamped pulse, then re-check
                    rate = max_rate;
                    next_decision = tick + PULSE_TICKS;
                } else {
                    next_decision = tick + decision.wait_ticks;
                }
                tracing::debug!(
                    tick,
                    target,
                    rate,
                    wait_ticks = decision.wait_ticks,
                    "infusion decision"
                );
            }

            if tick >= infuse_until {
                // the decided pulse has expired even if no new decision
                // has been made
                rate = 0.0;
            }

            state = self.model.step(&state, rate);
            infused += rate;
            records.push(TickRecord {
                target,
                rate,
                plasma: self.model.concentration(&state, Site::Plasma),
                effect: self.model.concentration(&state, Site::Effect),
                infused,
            });
        }

        Ok(InfusionSeries { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelParameters;

    fn params() -> ModelParameters {
        ModelParameters::new(4.27, 0.443, 0.302, 0.196, 0.057, 0.0033, 0.456).unwrap()
    }

    #[test]
    fn empty_target_sequence_yields_an_empty_series() {
        let scheduler = InfusionScheduler::new(params(), Site::Effect).unwrap();
        let series = scheduler.run(&[]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.total_infused(), 0.0);
    }

    #[test]
    fn pulse_expires_after_ten_ticks_without_a_new_decision() {
        let scheduler = InfusionScheduler::new(params(), Site::Effect).unwrap();
        let series = scheduler.run(&[2.0; 60]).unwrap();
        let rates = series.rates();
        assert!(rates[0] > 0.0);
        assert!(rates[..10].iter().all(|&r| r == rates[0]));
        // wait horizon exceeds the pulse length, so the pulse runs out
        assert_eq!(rates[10], 0.0);
    }

    #[test]
    fn clamped_rate_forces_a_re_decision_after_the_pulse() {
        let scheduler = InfusionScheduler::new(params(), Site::Effect)
            .unwrap()
            .with_max_rate(0.05);
        let series = scheduler.run(&[4.0; 40]).unwrap();
        let rates = series.rates();
        assert!(rates.iter().all(|&r| r <= 0.05));
        // without the forced re-check the pulse would expire at tick 10
        assert_eq!(rates[10], 0.05);
        assert_eq!(rates[25], 0.05);
    }

    #[test]
    fn underivable_udf_fails_at_construction() {
        // ke0 = 0 makes the effect-site udf underivable, so construction
        // itself must fail rather than a later run
        let flat = ModelParameters::new(1.69, 0.3, 0.4, 0.0, 0.04, 0.0, 0.0).unwrap();
        assert!(InfusionScheduler::new(flat, Site::Effect).is_err());

        // plasma targeting of the same model is fine
        let scheduler = InfusionScheduler::new(flat, Site::Plasma).unwrap();
        let series = scheduler.run(&[1.0; 30]).unwrap();
        assert!(series.rates()[0] > 0.0);
    }
}
