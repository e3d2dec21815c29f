pub mod measurement;

pub use measurement::MeasurementRecord;
