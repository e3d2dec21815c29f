use crate::{
    pipeline::PipelineError,
    sheet::{Cell, Grid},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Picks `;` when the first line has more semicolons than commas, as in
/// spreadsheets exported with a comma decimal separator.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Reads a CSV export of the sheet into a grid. Every non-empty field is
/// text; numeric interpretation is left to coercion.
pub fn read_csv_grid(bytes: &[u8]) -> Result<Grid, PipelineError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(bytes))
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| PipelineError::MalformedInput(format!("failed to read CSV record: {e}")))?;

        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Grid::from_rows(rows))
}
