//! Error types for simulation, rate solving and calibration

use thiserror::Error;

/// Errors surfaced by the simulator core and its boundaries
///
/// These are deterministic failures: retrying with the same inputs will
/// fail again. Callers should treat them as configuration or parameter
/// errors.
#[derive(Error, Debug)]
pub enum TciError {
    /// Invalid model parameter value
    #[error("Invalid parameter: {param} = {value}")]
    InvalidParameter { param: String, value: String },

    /// The requested parameter preset is not in the published set
    #[error("Unknown model preset: {0}")]
    UnknownPreset(String),

    /// Peak detection never resolved within the simulation cap
    #[error("Site response never peaked within {max_ticks} ticks")]
    NonTermination { max_ticks: usize },

    /// The rate search oscillated without satisfying its tolerance
    #[error("Rate search for target {target} did not converge within {max_iters} iterations")]
    NonConvergence { target: f64, max_iters: usize },

    /// A scheduler run was aborted by a solver or simulator failure
    #[error("Run aborted at tick {tick}: {source}")]
    AbortedAtTick {
        tick: usize,
        #[source]
        source: Box<TciError>,
    },

    /// ke0 back-calibration failed
    #[error("ke0 calibration failed: {reason}")]
    CalibrationFailed { reason: String },

    /// An error writing the output series
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// An error serializing the output series
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error from an output sink
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TciError {
    /// Wrap a failure with the tick index that triggered it
    pub(crate) fn at_tick(self, tick: usize) -> Self {
        TciError::AbortedAtTick {
            tick,
            source: Box::new(self),
        }
    }

    /// Convenience constructor for invalid numeric parameters
    pub(crate) fn invalid(param: &str, value: f64) -> Self {
        TciError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
        }
    }
}
