use serde::{Deserialize, Serialize};

/// One normalized row of the pipeline flow sheet.
///
/// Numeric fields are always finite; `km` is `None` when the sheet marks the
/// distance as not applicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub name: String,
    pub connection_point: String,
    pub mg: f64,
    pub km: Option<f64>,
    pub period: String,
    pub load_level: f64,
    pub actual_flow: f64,
    pub technical_flow: f64,
}

impl MeasurementRecord {
    /// True when every numeric field (and `km`, if present) is finite.
    pub fn is_finite(&self) -> bool {
        self.mg.is_finite()
            && self.km.map_or(true, f64::is_finite)
            && self.load_level.is_finite()
            && self.actual_flow.is_finite()
            && self.technical_flow.is_finite()
    }
}
