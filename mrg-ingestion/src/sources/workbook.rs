use std::{io::Cursor, path::Path, sync::Arc};

use calamine::{open_workbook_auto_from_rs, Reader};
use mrg_client::MeasurementRecord;

use super::csv_sheet::read_csv_grid;
use crate::{
    pipeline::{Envelope, EnvelopeStream, PipelineError, Source},
    sheet::{is_blank_row, Grid},
    transform::{resolve_headers, HeaderRegion, MappedRow, RowMapper},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// xlsx, xlsm, xlsb, xls or ods; detected from the content.
    Workbook,
    Csv,
}

impl SheetFormat {
    pub fn from_file_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if n.to_ascii_lowercase().ends_with(".csv") => SheetFormat::Csv,
            _ => SheetFormat::Workbook,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SheetOptions {
    /// Sheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
    pub header: HeaderRegion,
}

/// Merged-header flow sheet as a source of [`MeasurementRecord`]s.
///
/// The sheet is decoded on the blocking pool when the stream is first
/// polled. Decoding and header errors are yielded before any record, so a
/// sink that stops at the first error never sees a partial sheet.
pub struct WorkbookSource {
    bytes: Arc<Vec<u8>>,
    format: SheetFormat,
    options: SheetOptions,
}

impl WorkbookSource {
    pub fn from_bytes(bytes: Vec<u8>, format: SheetFormat, options: SheetOptions) -> Self {
        Self {
            bytes: Arc::new(bytes),
            format,
            options,
        }
    }

    pub async fn from_path<P: AsRef<Path>>(path: P, options: SheetOptions) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::MalformedInput(format!("failed to read {}: {e}", path.display()))
        })?;
        let format = SheetFormat::from_file_name(path.file_name().and_then(|n| n.to_str()));

        Ok(Self::from_bytes(bytes, format, options))
    }
}

pub fn read_grid(bytes: &[u8], format: SheetFormat, sheet: Option<&str>) -> Result<Grid, PipelineError> {
    match format {
        SheetFormat::Csv => read_csv_grid(bytes),
        SheetFormat::Workbook => read_workbook_grid(bytes, sheet),
    }
}

fn read_workbook_grid(bytes: &[u8], sheet: Option<&str>) -> Result<Grid, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PipelineError::MalformedInput(format!("failed to open workbook: {e}")))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::MalformedInput("workbook has no sheets".to_string()))?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        PipelineError::MalformedInput(format!("failed to read sheet '{sheet_name}': {e}"))
    })?;

    Ok(Grid::from_range(&range))
}

/// Checks the header region and resolves the field map for the data rows.
pub fn prepare_mapper(grid: &Grid, header: HeaderRegion) -> Result<RowMapper, PipelineError> {
    if grid.is_empty() {
        return Err(PipelineError::MalformedInput("sheet is empty".to_string()));
    }
    let last_header_row = header.main_row.max(header.sub_row);
    if grid.height() <= last_header_row {
        return Err(PipelineError::MalformedInput(format!(
            "missing header row {} (sheet has {} rows)",
            last_header_row,
            grid.height()
        )));
    }

    let headers = resolve_headers(grid, header);
    tracing::debug!(?headers, "resolved merged headers");

    let mapper = RowMapper::from_headers(&headers);
    let unresolved = mapper.fields().unresolved();
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(|f| f.as_str()).collect();
        tracing::warn!(fields = ?names, "no header matched these fields; defaults will be used");
    }

    Ok(mapper)
}

#[async_trait::async_trait]
impl Source<MeasurementRecord> for WorkbookSource {
    async fn stream(&self) -> EnvelopeStream<MeasurementRecord> {
        let bytes = self.bytes.clone();
        let format = self.format;
        let sheet = self.options.sheet.clone();
        let header = self.options.header;

        let s = async_stream::try_stream! {
            let grid = tokio::task::spawn_blocking(move || read_grid(&bytes, format, sheet.as_deref()))
                .await
                .map_err(|e| PipelineError::MalformedInput(format!("sheet decoder task failed: {e}")))??;

            tracing::debug!(rows = grid.height(), columns = grid.width(), "sheet decoded");

            let mapper = prepare_mapper(&grid, header)?;

            for (row_index, cells) in grid.rows_from(header.first_data_row()) {
                if is_blank_row(cells) {
                    continue;
                }

                let MappedRow { record, warnings } = mapper.map_row(row_index, cells);
                let mut env = Envelope::new(record, row_index);
                env.warnings = warnings;
                yield env;
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::test_support::{flow_sheet_xlsx, Fx};

    async fn collect(source: &WorkbookSource) -> Result<Vec<Envelope<MeasurementRecord>>, PipelineError> {
        let mut out = Vec::new();
        let mut stream = source.stream().await;
        while let Some(item) = stream.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    #[test]
    fn format_is_detected_from_file_name() {
        assert_eq!(SheetFormat::from_file_name(Some("flows.CSV")), SheetFormat::Csv);
        assert_eq!(SheetFormat::from_file_name(Some("flows.xlsx")), SheetFormat::Workbook);
        assert_eq!(SheetFormat::from_file_name(None), SheetFormat::Workbook);
    }

    #[tokio::test]
    async fn xlsx_rows_become_records_and_blank_rows_are_skipped() {
        let bytes = flow_sheet_xlsx(&[
            vec![Fx::S("Союз"), Fx::N(101.0), Fx::S("12,5"), Fx::N(44927.0), Fx::S("0,85"), Fx::S("3,14"), Fx::N(20.0)],
            vec![],
            vec![Fx::S("Прогресс"), Fx::S("КС Сохрановка"), Fx::S("-"), Fx::S("Q1 2023"), Fx::E, Fx::E, Fx::S("2.5")],
        ]);
        let source = WorkbookSource::from_bytes(bytes, SheetFormat::Workbook, SheetOptions::default());

        let envs = collect(&source).await.unwrap();

        assert_eq!(envs.len(), 2);
        assert_eq!(envs[0].row, 2);
        assert_eq!(envs[0].payload.period, "01/01/2023");
        assert_eq!(envs[0].payload.km, Some(12.5));
        assert_eq!(envs[0].payload.mg, 101.0);
        assert_eq!(envs[1].row, 4);
        assert_eq!(envs[1].payload.name, "Прогресс");
        assert_eq!(envs[1].payload.actual_flow, 0.0);
        assert_eq!(envs[1].warnings.len(), 1);
        assert_eq!(envs[1].warnings[0].field, crate::transform::Field::Mg);
    }

    #[tokio::test]
    async fn whitespace_only_row_still_becomes_a_record() {
        let bytes = flow_sheet_xlsx(&[vec![Fx::S(" ")], vec![Fx::E, Fx::E]]);
        let source = WorkbookSource::from_bytes(bytes, SheetFormat::Workbook, SheetOptions::default());

        let envs = collect(&source).await.unwrap();

        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].row, 2);
        assert_eq!(envs[0].payload.name, " ");
        assert_eq!(envs[0].payload.technical_flow, 0.0);
    }

    #[tokio::test]
    async fn csv_source_uses_the_same_mapping() {
        let csv = "Магистральный распределительный газопровод;Точка подключения;;Период;Уровень загрузки;Факт. среднесут. расход, млн.м3/сут;ТВПС, млн. м3/сут\n\
                   ;МГ (РГ, КС, УРГ);км;;;;\n\
                   Союз;101;7.3;Q1 2023;0,9;1,5;3\n";
        let source = WorkbookSource::from_bytes(csv.as_bytes().to_vec(), SheetFormat::Csv, SheetOptions::default());

        let envs = collect(&source).await.unwrap();

        assert_eq!(envs.len(), 1);
        let r = &envs[0].payload;
        assert_eq!(r.connection_point, "101");
        assert_eq!(r.km, Some(7.3));
        assert_eq!(r.load_level, 0.9);
        assert_eq!(r.technical_flow, 3.0);
    }

    #[tokio::test]
    async fn garbage_bytes_are_malformed_input() {
        let source = WorkbookSource::from_bytes(b"not a workbook".to_vec(), SheetFormat::Workbook, SheetOptions::default());

        assert!(matches!(collect(&source).await, Err(PipelineError::MalformedInput(_))));
    }

    #[tokio::test]
    async fn unknown_sheet_name_is_malformed_input() {
        let options = SheetOptions {
            sheet: Some("Нет такого".to_string()),
            ..SheetOptions::default()
        };
        let source = WorkbookSource::from_bytes(flow_sheet_xlsx(&[]), SheetFormat::Workbook, options);

        assert!(matches!(collect(&source).await, Err(PipelineError::MalformedInput(_))));
    }

    #[tokio::test]
    async fn single_header_row_is_malformed_input() {
        let source = WorkbookSource::from_bytes(
            "Период;Уровень загрузки\n".as_bytes().to_vec(),
            SheetFormat::Csv,
            SheetOptions::default(),
        );

        let res = collect(&source).await;
        assert!(matches!(res, Err(PipelineError::MalformedInput(msg)) if msg.contains("missing header row")));
    }

    #[tokio::test]
    async fn header_only_sheet_yields_no_records() {
        let source = WorkbookSource::from_bytes(flow_sheet_xlsx(&[]), SheetFormat::Workbook, SheetOptions::default());

        assert!(collect(&source).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn from_path_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flows.xlsx");
        std::fs::write(&path, flow_sheet_xlsx(&[vec![Fx::S("Союз")]])).unwrap();

        let source = WorkbookSource::from_path(&path, SheetOptions::default()).await.unwrap();

        assert_eq!(collect(&source).await.unwrap().len(), 1);
    }
}
