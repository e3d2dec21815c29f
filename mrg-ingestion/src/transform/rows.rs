use mrg_client::MeasurementRecord;

use super::{
    coerce::{coerce_km, coerce_measure, coerce_period, coerce_text, CoercionError},
    fields::{Field, FieldMap},
};
use crate::sheet::Cell;

/// A cell that failed coercion and was replaced by its field default.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionWarning {
    pub row: usize,
    pub field: Field,
    pub raw: String,
    pub reason: CoercionError,
}

#[derive(Debug, Clone)]
pub struct MappedRow {
    pub record: MeasurementRecord,
    pub warnings: Vec<CoercionWarning>,
}

/// Projects data rows onto [`MeasurementRecord`] through a resolved
/// [`FieldMap`].
#[derive(Debug, Clone)]
pub struct RowMapper {
    fields: FieldMap,
}

struct RowContext<'a> {
    fields: &'a FieldMap,
    row_index: usize,
    cells: &'a [Cell],
    warnings: Vec<CoercionWarning>,
}

impl RowContext<'_> {
    fn cell(&self, field: Field) -> Option<&Cell> {
        self.fields.lookup(field, self.cells)
    }

    fn or_default<T>(&mut self, field: Field, value: Result<T, CoercionError>, default: T) -> T {
        match value {
            Ok(v) => v,
            Err(reason) => {
                let raw = self.cell(field).map(Cell::display_text).unwrap_or_default();
                self.warnings.push(CoercionWarning {
                    row: self.row_index,
                    field,
                    raw,
                    reason,
                });
                default
            }
        }
    }

    fn measure(&mut self, field: Field) -> f64 {
        let value = coerce_measure(self.cell(field));
        self.or_default(field, value, 0.0)
    }
}

impl RowMapper {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn from_headers(headers: &[String]) -> Self {
        Self::new(FieldMap::resolve(headers))
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn map_row(&self, row_index: usize, cells: &[Cell]) -> MappedRow {
        let mut ctx = RowContext {
            fields: &self.fields,
            row_index,
            cells,
            warnings: Vec::new(),
        };

        let name = coerce_text(ctx.cell(Field::Name));
        let connection_point = coerce_text(ctx.cell(Field::ConnectionPoint));
        let mg = ctx.measure(Field::Mg);

        let km = coerce_km(ctx.cell(Field::Km));
        let km = ctx.or_default(Field::Km, km, None);

        let period = coerce_period(ctx.cell(Field::Period));
        let period_fallback = coerce_text(ctx.cell(Field::Period));
        let period = ctx.or_default(Field::Period, period, period_fallback);

        let load_level = ctx.measure(Field::LoadLevel);
        let actual_flow = ctx.measure(Field::ActualFlow);
        let technical_flow = ctx.measure(Field::TechnicalFlow);

        MappedRow {
            record: MeasurementRecord {
                name,
                connection_point,
                mg,
                km,
                period,
                load_level,
                actual_flow,
                technical_flow,
            },
            warnings: ctx.warnings,
        }
    }
}
