//! Target-controlled infusion (TCI) simulation
//!
//! `tcisol` models how a drug's concentration evolves under
//! computer-controlled infusion and computes the rate schedule that
//! drives a modeled concentration toward clinician-specified targets.
//! The simulator is a discrete-time (one-second tick) three-compartment
//! model with a virtual effect site; the rate solver inverts it with the
//! classic fixed-point search over the predicted peak tick.
//!
//! # Example
//!
//! ```rust,ignore
//! use tcisol::prelude::*;
//!
//! let patient = Demographics { age: 40.0, sex: Sex::Male, weight: 75.0, height: 172.0 };
//! let params = Preset::Schnider.parameters(&patient)?;
//!
//! // 200 s at 4 ug/ml, then let it wash out
//! let mut targets = vec![4.0; 200];
//! targets.extend(vec![0.0; 300]);
//!
//! let series = InfusionScheduler::new(params, Site::Effect)?.run(&targets)?;
//! tcisol::output::write_csv_file(&series, "result.csv")?;
//! ```

pub mod calibrate;
pub mod error;
pub mod model;
pub mod output;
pub mod simulator;
pub mod tci;

pub use error::TciError;
pub use model::lbm::{lean_body_mass, LbmFormula, Sex};
pub use model::presets::{Demographics, Preset};
pub use model::{transition_operator, ModelParameters, Site};
pub use simulator::disposition::{unit_disposition, UnitDisposition, PULSE_TICKS};
pub use simulator::{CompartmentModel, Horizon, State, MAX_PEAK_TICKS};
pub use tci::{InfusionScheduler, InfusionSeries, RateDecision, TciSolver, TickRecord};

pub mod prelude {
    pub use crate::calibrate::{calibrate_ke0, time_to_peak};
    pub use crate::error::TciError;
    pub use crate::model::lbm::{lean_body_mass, LbmFormula, Sex};
    pub use crate::model::presets::{Demographics, Preset};
    pub use crate::model::{ModelParameters, Site};
    pub use crate::output::{to_json, write_csv, write_csv_file};
    pub use crate::simulator::disposition::{UnitDisposition, PULSE_TICKS};
    pub use crate::simulator::{CompartmentModel, Horizon, State};
    pub use crate::tci::{InfusionScheduler, InfusionSeries, RateDecision, TciSolver, TickRecord};
}
