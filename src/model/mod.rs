//! Pharmacokinetic model parameters and the discrete transition operator
//!
//! A drug is modeled as three mass-conserving compartments (central plus
//! two peripheral) and a virtual effect-site compartment that tracks
//! concentration equilibration without draining mass from the central
//! compartment. All micro-rate constants are expressed per minute; the
//! transition operator discretizes them to the fixed one-second tick.

pub mod lbm;
pub mod presets;

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::error::TciError;

/// Default ratio between the central and effect-site volumes (`v4 = v1 / 1000`)
pub const DEFAULT_EFFECT_VOLUME_RATIO: f64 = 1000.0;

/// The sampling site for a concentration readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    /// Central (plasma) compartment, `a1 / v1`
    Plasma,
    /// Virtual effect-site compartment, `a4 / v4`
    Effect,
}

/// Immutable micro-rate parameterization of a three-compartment model
/// with an effect site
///
/// Construct from raw micro constants with [`ModelParameters::new`], or
/// from volumes and inter-compartment clearances with
/// [`ModelParameters::from_clearances`]. Both normalize to the same
/// record. Published per-drug parameterizations are available through
/// [`presets::Preset`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    v1: f64,
    k10: f64,
    k12: f64,
    k13: f64,
    k21: f64,
    k31: f64,
    ke0: f64,
    effect_volume_ratio: f64,
}

impl ModelParameters {
    /// Create a parameter record from micro-rate constants (per minute)
    ///
    /// Fails with [`TciError::InvalidParameter`] if `v1` is not strictly
    /// positive or any rate constant is negative or non-finite.
    pub fn new(
        v1: f64,
        k10: f64,
        k12: f64,
        k13: f64,
        k21: f64,
        k31: f64,
        ke0: f64,
    ) -> Result<Self, TciError> {
        let params = Self {
            v1,
            k10,
            k12,
            k13,
            k21,
            k31,
            ke0,
            effect_volume_ratio: DEFAULT_EFFECT_VOLUME_RATIO,
        };
        params.validate()?;
        Ok(params)
    }

    /// Create a parameter record from compartment volumes (L) and
    /// clearances (L/min)
    ///
    /// Micro constants are obtained by dividing each clearance by the
    /// volume of the compartment it drains: `k10 = cl1/v1`, `k12 = cl2/v1`,
    /// `k13 = cl3/v1`, `k21 = cl2/v2`, `k31 = cl3/v3`.
    pub fn from_clearances(
        v1: f64,
        v2: f64,
        v3: f64,
        cl1: f64,
        cl2: f64,
        cl3: f64,
        ke0: f64,
    ) -> Result<Self, TciError> {
        if !(v2 > 0.0) {
            return Err(TciError::invalid("v2", v2));
        }
        if !(v3 > 0.0) {
            return Err(TciError::invalid("v3", v3));
        }
        Self::new(v1, cl1 / v1, cl2 / v1, cl3 / v1, cl2 / v2, cl3 / v3, ke0)
    }

    fn validate(&self) -> Result<(), TciError> {
        if !(self.v1 > 0.0) || !self.v1.is_finite() {
            return Err(TciError::invalid("v1", self.v1));
        }
        if !(self.effect_volume_ratio > 0.0) {
            return Err(TciError::invalid(
                "effect_volume_ratio",
                self.effect_volume_ratio,
            ));
        }
        for (name, value) in [
            ("k10", self.k10),
            ("k12", self.k12),
            ("k13", self.k13),
            ("k21", self.k21),
            ("k31", self.k31),
            ("ke0", self.ke0),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(TciError::invalid(name, value));
            }
        }
        Ok(())
    }

    /// Central compartment volume (L)
    pub fn v1(&self) -> f64 {
        self.v1
    }

    /// Effect-site volume (L), `v1 / effect_volume_ratio`
    pub fn v4(&self) -> f64 {
        self.v1 / self.effect_volume_ratio
    }

    /// Plasma/effect-site equilibration rate constant (per minute)
    pub fn ke0(&self) -> f64 {
        self.ke0
    }

    /// Elimination rate constant from the central compartment (per minute)
    pub fn k10(&self) -> f64 {
        self.k10
    }

    /// Copy of this record with a replaced equilibration rate
    ///
    /// Used by calibration to probe candidate `ke0` values; everything
    /// else is unchanged.
    pub fn with_ke0(&self, ke0: f64) -> Result<Self, TciError> {
        let mut params = *self;
        params.ke0 = ke0;
        params.validate()?;
        Ok(params)
    }

    /// Volume of the compartment a [`Site`] is read from
    pub fn site_volume(&self, site: Site) -> f64 {
        match site {
            Site::Plasma => self.v1(),
            Site::Effect => self.v4(),
        }
    }
}

/// Build the 4×4 one-second transition operator for a parameter record
///
/// Rows 1–3 exchange mass between the physical compartments; the diagonal
/// holds `1 − (outflows)/60` and off-diagonal entries the matching
/// `inflow/60`. Row 4 is the effect-site sink: it couples only from the
/// central compartment, scaled by the volume ratio, and decays at
/// `site_rate/60`. `site_rate` is normally `params.ke0()`.
pub fn transition_operator(
    params: &ModelParameters,
    site_rate: f64,
) -> Result<Matrix4<f64>, TciError> {
    if !(params.v1() > 0.0) {
        return Err(TciError::invalid("v1", params.v1()));
    }
    if !(site_rate >= 0.0) || !site_rate.is_finite() {
        return Err(TciError::invalid("site_rate", site_rate));
    }

    let k10 = params.k10 / 60.0;
    let k12 = params.k12 / 60.0;
    let k13 = params.k13 / 60.0;
    let k21 = params.k21 / 60.0;
    let k31 = params.k31 / 60.0;
    let ke0 = site_rate / 60.0;
    let k14 = ke0 * params.v4() / params.v1();

    Ok(Matrix4::new(
        1.0 - k10 - k12 - k13,
        k21,
        k31,
        0.0,
        k12,
        1.0 - k21,
        0.0,
        0.0,
        k13,
        0.0,
        1.0 - k31,
        0.0,
        k14,
        0.0,
        0.0,
        1.0 - ke0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn schnider_like() -> ModelParameters {
        ModelParameters::new(4.27, 0.443, 0.302, 0.196, 0.057, 0.0033, 0.456).unwrap()
    }

    #[test]
    fn rejects_non_positive_v1() {
        assert!(ModelParameters::new(0.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1).is_err());
        assert!(ModelParameters::new(-4.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1).is_err());
    }

    #[test]
    fn rejects_negative_rate_constants() {
        let err = ModelParameters::new(4.27, -0.1, 0.1, 0.1, 0.1, 0.1, 0.1).unwrap_err();
        assert!(matches!(err, TciError::InvalidParameter { .. }));
    }

    #[test]
    fn clearance_form_normalizes_to_micro_constants() {
        let p = ModelParameters::from_clearances(4.27, 18.9, 238.0, 1.89, 1.29, 0.836, 0.456)
            .unwrap();
        assert_relative_eq!(p.k10, 1.89 / 4.27);
        assert_relative_eq!(p.k12, 1.29 / 4.27);
        assert_relative_eq!(p.k13, 0.836 / 4.27);
        assert_relative_eq!(p.k21, 1.29 / 18.9);
        assert_relative_eq!(p.k31, 0.836 / 238.0);
    }

    #[test]
    fn effect_volume_follows_the_ratio() {
        let p = schnider_like();
        assert_relative_eq!(p.v4(), 4.27 / 1000.0);
        assert_relative_eq!(p.site_volume(Site::Effect), p.v4());
        assert_relative_eq!(p.site_volume(Site::Plasma), 4.27);
    }

    #[test]
    fn operator_rows_hold_per_second_rates() {
        let p = schnider_like();
        let k = transition_operator(&p, p.ke0()).unwrap();

        assert_relative_eq!(k[(0, 0)], 1.0 - (0.443 + 0.302 + 0.196) / 60.0);
        assert_relative_eq!(k[(0, 1)], 0.057 / 60.0);
        assert_relative_eq!(k[(0, 2)], 0.0033 / 60.0);
        assert_eq!(k[(0, 3)], 0.0);
        assert_relative_eq!(k[(1, 0)], 0.302 / 60.0);
        assert_relative_eq!(k[(1, 1)], 1.0 - 0.057 / 60.0);
        assert_relative_eq!(k[(2, 2)], 1.0 - 0.0033 / 60.0);
        // effect-site row: coupled from the central compartment only
        assert_relative_eq!(k[(3, 0)], (0.456 / 60.0) / 1000.0);
        assert_eq!(k[(3, 1)], 0.0);
        assert_eq!(k[(3, 2)], 0.0);
        assert_relative_eq!(k[(3, 3)], 1.0 - 0.456 / 60.0);
    }

    #[test]
    fn with_ke0_replaces_only_the_equilibration_rate() {
        let p = schnider_like().with_ke0(1.2).unwrap();
        assert_relative_eq!(p.ke0(), 1.2);
        assert_relative_eq!(p.k10(), 0.443);
        assert!(schnider_like().with_ke0(-1.0).is_err());
    }
}
