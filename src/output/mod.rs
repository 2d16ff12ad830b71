//! Output sinks for a finished run
//!
//! Both sinks consume an [`InfusionSeries`] after `run` has completed;
//! they are never interleaved with simulation.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::TciError;
use crate::tci::{InfusionSeries, TickRecord};

/// CSV row layout: `Ct, Cp, Ce, Rate, Infused`
#[derive(Serialize)]
struct Row {
    #[serde(rename = "Ct")]
    ct: f64,
    #[serde(rename = "Cp")]
    cp: f64,
    #[serde(rename = "Ce")]
    ce: f64,
    #[serde(rename = "Rate")]
    rate: f64,
    #[serde(rename = "Infused")]
    infused: f64,
}

impl From<&TickRecord> for Row {
    fn from(r: &TickRecord) -> Self {
        Row {
            ct: r.target,
            cp: r.plasma,
            ce: r.effect,
            rate: r.rate,
            infused: r.infused,
        }
    }
}

/// Write the series as CSV, one row per tick
pub fn write_csv<W: Write>(series: &InfusionSeries, writer: W) -> Result<(), TciError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in series {
        csv.serialize(Row::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the series as CSV to a file path
pub fn write_csv_file<P: AsRef<Path>>(series: &InfusionSeries, path: P) -> Result<(), TciError> {
    let file = std::fs::File::create(path)?;
    write_csv(series, file)
}

/// Serialize the series to a JSON string
pub fn to_json(series: &InfusionSeries) -> Result<String, TciError> {
    Ok(serde_json::to_string(series)?)
}
