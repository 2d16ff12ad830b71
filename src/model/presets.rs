//! Published per-drug, per-population parameter sets
//!
//! Each preset resolves patient demographics to a [`ModelParameters`]
//! record; the simulation core only ever sees the normalized record and
//! never branches on preset names. Coefficients are taken verbatim from
//! the published models (Marsh, Schnider, Paedfusor, Kataria, Kim, Minto).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TciError;
use crate::model::lbm::{lean_body_mass, LbmFormula, Sex};
use crate::model::ModelParameters;

/// Patient covariates consumed by the presets
///
/// `age` in years, `weight` in kg, `height` in cm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: f64,
    pub sex: Sex,
    pub weight: f64,
    pub height: f64,
}

/// The closed set of supported parameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    /// Marsh propofol model with the Diprifusor ke0
    Marsh,
    /// Marsh propofol model with the Stanpump/Orchestra ke0
    ModifiedMarsh,
    /// Schnider propofol model (adults, covariate-adjusted)
    Schnider,
    /// Paedfusor propofol model (children, age-banded)
    Paedfusor,
    /// Kataria propofol model (children)
    Kataria,
    /// Kim propofol model (plasma targeting only; no effect-site data)
    Kim,
    /// Minto remifentanil model
    Minto,
}

impl FromStr for Preset {
    type Err = TciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "marsh" => Ok(Preset::Marsh),
            "modified marsh" => Ok(Preset::ModifiedMarsh),
            "schnider" => Ok(Preset::Schnider),
            "paedfusor" => Ok(Preset::Paedfusor),
            "kataria" => Ok(Preset::Kataria),
            "kim" => Ok(Preset::Kim),
            "minto" => Ok(Preset::Minto),
            _ => Err(TciError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Marsh => "marsh",
            Preset::ModifiedMarsh => "modified marsh",
            Preset::Schnider => "schnider",
            Preset::Paedfusor => "paedfusor",
            Preset::Kataria => "kataria",
            Preset::Kim => "kim",
            Preset::Minto => "minto",
        };
        f.write_str(name)
    }
}

impl Preset {
    /// Resolve this preset to a parameter record for the given patient
    pub fn parameters(&self, demo: &Demographics) -> Result<ModelParameters, TciError> {
        let Demographics {
            age,
            sex,
            weight: wt,
            height: ht,
        } = *demo;
        if !(wt > 0.0) {
            return Err(TciError::invalid("weight", wt));
        }

        match self {
            Preset::Marsh => {
                ModelParameters::new(0.228 * wt, 0.119, 0.114, 0.0419, 0.055, 0.0033, 0.26)
            }
            Preset::ModifiedMarsh => {
                ModelParameters::new(0.228 * wt, 0.119, 0.114, 0.0419, 0.055, 0.0033, 1.2195)
            }
            Preset::Schnider => {
                let lbm = lean_body_mass(LbmFormula::James, sex, wt, ht)?;
                let v1 = 4.27;
                let v2 = 18.9 - 0.391 * (age - 53.0);
                let v3 = 238.0;
                let cl1 =
                    1.89 + 0.0456 * (wt - 77.0) - 0.0681 * (lbm - 59.0) + 0.0264 * (ht - 177.0);
                let cl2 = 1.29 - 0.024 * (age - 53.0);
                let cl3 = 0.836;
                ModelParameters::from_clearances(v1, v2, v3, cl1, cl2, cl3, 0.456)
            }
            Preset::Paedfusor => {
                // Age bands from the Paedfusor data set; ke0 from Munoz et al.
                // Anesthesiology 2004;101(6).
                if age < 1.0 {
                    return Err(TciError::invalid("age", age));
                }
                let (v1, k10) = if age < 13.0 {
                    (0.4584 * wt, 0.1527 * wt.powf(-0.3))
                } else if age <= 13.0 {
                    (0.4 * wt, 0.0678)
                } else if age <= 14.0 {
                    (0.342 * wt, 0.0792)
                } else if age <= 15.0 {
                    (0.284 * wt, 0.0954)
                } else if age <= 16.0 {
                    (0.22857 * wt, 0.119)
                } else {
                    return Err(TciError::invalid("age", age));
                };
                ModelParameters::new(v1, k10, 0.114, 0.0419, 0.055, 0.0033, 0.91)
            }
            Preset::Kataria => {
                let v1 = 0.41 * wt;
                let v2 = 0.78 * wt + 3.1 * age - 15.5;
                let v3 = 6.9 * wt;
                let cl1 = 0.035 * wt;
                let cl2 = 0.077 * wt;
                let cl3 = 0.026 * wt;
                // ke0 from Munoz et al. Anesthesiology 2004;101(6)
                ModelParameters::from_clearances(v1, v2, v3, cl1, cl2, cl3, 0.41)
            }
            Preset::Kim => {
                // Two-compartment model; no published effect-site data, so
                // ke0 = 0 and only plasma targeting is meaningful.
                let v1 = 1.69;
                let v2 = 27.2 + 0.93 * (wt - 25.0);
                let cl1 = 0.89 * (wt / 23.6).powf(0.97);
                let cl2 = 1.3;
                ModelParameters::new(v1, cl1 / v1, cl2 / v1, 0.0, cl2 / v2, 0.0, 0.0)
            }
            Preset::Minto => {
                let lbm = lean_body_mass(LbmFormula::James, sex, wt, ht)?;
                let v1 = 5.1 - 0.0201 * (age - 40.0) + 0.072 * (lbm - 55.0);
                let v2 = 9.82 - 0.0811 * (age - 40.0) + 0.108 * (lbm - 55.0);
                let v3 = 5.42;
                let cl1 = 2.6 - 0.0162 * (age - 40.0) + 0.0191 * (lbm - 55.0);
                let cl2 = 2.05 - 0.0301 * (age - 40.0);
                let cl3 = 0.076 - 0.00113 * (age - 40.0);
                let ke0 = 0.595 - 0.007 * (age - 40.0);
                ModelParameters::from_clearances(v1, v2, v3, cl1, cl2, cl3, ke0)
            }
        }
    }
}
