//! Unit disposition functions
//!
//! The unit disposition function (udf) of a site is the concentration
//! trajectory produced by infusing at unit rate for [`PULSE_TICKS`] ticks
//! from a zero state, sampled up to its peak. Because the compartment
//! system is linear and time-invariant for fixed parameters, the response
//! to any rate sustained over the same window is `rate × udf`, which is
//! the superposition fact the rate solver exploits. The curve depends
//! only on the model and the site, so derivations are memoized.

use cached::proc_macro::cached;
use cached::UnboundCache;
use serde::{Deserialize, Serialize};

use crate::error::TciError;
use crate::model::Site;
use crate::simulator::{CompartmentModel, Horizon, State};

/// Length of the unit-rate pulse, and the cap on any scheduled infusion
pub const PULSE_TICKS: usize = 10;

/// Impulse response of a site to the unit-rate pulse
///
/// Valid only for the model and site it was derived from; the effect-site
/// curve keeps its leading zero sample (drug reaches the effect
/// compartment one tick after the pulse starts). The last sample is the
/// peak by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDisposition {
    site: Site,
    samples: Vec<f64>,
}

impl UnitDisposition {
    /// Derive the curve by simulating the unit pulse until the site peaks
    pub fn derive(model: &CompartmentModel, site: Site) -> Result<Self, TciError> {
        let doses = [1.0; PULSE_TICKS];
        let states = model.simulate(&State::zeros(), &doses, Horizon::UntilPeak(site))?;
        Ok(Self {
            site,
            samples: model.concentrations(&states, site),
        })
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Tick index of the unit response's peak (its last sample)
    pub fn peak_tick(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }
}

/// Hash a model's operator and volumes to a u64 for cache key generation.
#[inline(always)]
fn modelhash(model: &CompartmentModel) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    for &value in model
        .operator()
        .iter()
        .chain([model.params().v1(), model.params().v4()].iter())
    {
        // Normalize -0.0 to 0.0 for consistent hashing
        let bits = if value == 0.0 { 0u64 } else { value.to_bits() };
        bits.hash(&mut hasher);
    }
    hasher.finish()
}

/// Cached entry point for udf derivation
///
/// Keyed by the model's operator and the site, so a recomputation only
/// happens when the parameters or the site actually change.
#[cached(
    ty = "UnboundCache<(u64, Site), UnitDisposition>",
    create = "{ UnboundCache::with_capacity(64) }",
    convert = r#"{ (modelhash(model), site) }"#,
    result = "true"
)]
pub fn unit_disposition(model: &CompartmentModel, site: Site) -> Result<UnitDisposition, TciError> {
    UnitDisposition::derive(model, site)
}
