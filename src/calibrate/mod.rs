//! Offline back-calibration of the equilibration rate
//!
//! Published models report `ke0` inconsistently; a common way to
//! harmonize them is to pick the `ke0` that reproduces an observed
//! time-to-peak-effect after a bolus. This is a generic bracketing
//! root-find over the simulator, invoked rarely and kept fully decoupled
//! from the rate-solving core.

use argmin::core::{CostFunction, Error, Executor};
use argmin::solver::brent::BrentRoot;

use crate::error::TciError;
use crate::model::{ModelParameters, Site};
use crate::simulator::{CompartmentModel, Horizon, State};

/// Bracket for the equilibration rate, per minute
const KE0_MIN: f64 = 0.01;
const KE0_MAX: f64 = 20.0;

/// Seconds from a one-tick unit bolus to the peak effect-site amount,
/// with the record's `ke0` replaced by `ke0`
pub fn time_to_peak(params: &ModelParameters, ke0: f64) -> Result<f64, TciError> {
    let probed = params.with_ke0(ke0)?;
    let model = CompartmentModel::new(probed)?;
    let states = model.simulate(&State::zeros(), &[1.0], Horizon::UntilPeak(Site::Effect))?;
    Ok(states.len() as f64)
}

/// Residual between the simulated and the observed time to peak effect
struct TimeToPeakResidual<'a> {
    params: &'a ModelParameters,
    observed: f64,
}

impl CostFunction for TimeToPeakResidual<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, ke0: &Self::Param) -> Result<Self::Output, Error> {
        let tpeak = time_to_peak(self.params, *ke0)?;
        Ok(tpeak - self.observed)
    }
}

/// Find the `ke0` (per minute) whose simulated time-to-peak-effect
/// matches `observed_tpeak` seconds
///
/// Bracketing root-find over `ke0 ∈ [0.01, 20]`. The simulated time to
/// peak is a whole number of ticks, so the residual is piecewise
/// constant; the solver settles anywhere inside the matching plateau,
/// which is the resolution the discrete model supports.
pub fn calibrate_ke0(params: &ModelParameters, observed_tpeak: f64) -> Result<f64, TciError> {
    if !(observed_tpeak > 0.0) {
        return Err(TciError::invalid("observed_tpeak", observed_tpeak));
    }

    let cost = TimeToPeakResidual {
        params,
        observed: observed_tpeak,
    };
    let solver = BrentRoot::new(KE0_MIN, KE0_MAX, 1e-6);
    let res = Executor::new(cost, solver)
        .configure(|state| state.max_iters(100).param((KE0_MIN + KE0_MAX) / 2.0))
        .run()
        .map_err(|e| TciError::CalibrationFailed {
            reason: e.to_string(),
        })?;

    let ke0 = res.state.best_param.ok_or(TciError::CalibrationFailed {
        reason: "no parameter produced".to_string(),
    })?;
    tracing::debug!(ke0, observed_tpeak, "ke0 calibrated");
    Ok(ke0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParameters {
        ModelParameters::new(4.27, 0.443, 0.302, 0.196, 0.057, 0.0033, 0.456).unwrap()
    }

    #[test]
    fn faster_equilibration_peaks_earlier() {
        let p = params();
        let slow = time_to_peak(&p, 0.1).unwrap();
        let published = time_to_peak(&p, 0.456).unwrap();
        let fast = time_to_peak(&p, 2.0).unwrap();
        assert!(slow > published);
        assert!(published > fast);
        // the published Schnider ke0 peaks around 1.5 min
        assert!((published - 92.0).abs() <= 2.0);
    }

    #[test]
    fn calibration_reproduces_an_observed_time_to_peak() {
        let p = params();
        let observed = time_to_peak(&p, 0.456).unwrap();
        let ke0 = calibrate_ke0(&p, observed).unwrap();
        assert_eq!(time_to_peak(&p, ke0).unwrap(), observed);
    }

    #[test]
    fn out_of_bracket_observations_fail() {
        // no ke0 in the bracket peaks this fast
        let err = calibrate_ke0(&params(), 1.0).unwrap_err();
        assert!(matches!(err, TciError::CalibrationFailed { .. }));

        assert!(calibrate_ke0(&params(), 0.0).is_err());
    }
}
