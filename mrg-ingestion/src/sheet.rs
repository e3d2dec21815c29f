//! Cell grid shared by every sheet source.
//!
//! Rows are indexed from the top of the sheet (row 0 is the first sheet row,
//! even when it is empty); columns cover the used column range only.

use calamine::{Data, Range};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text as a spreadsheet would show it: whole numbers without a
    /// fractional part, text unchanged.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Grid {
    /// Builds a grid from rows of possibly uneven length; short rows are
    /// padded with [`Cell::Empty`].
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    /// Copies a worksheet range, keeping absolute row positions.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (Some((_, start_col)), Some((end_row, end_col))) = (range.start(), range.end()) else {
            return Self::default();
        };

        let rows = (0..=end_row)
            .map(|r| {
                (start_col..=end_col)
                    .map(|c| range.get_value((r, c)).map(Cell::from).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self::from_rows(rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Rows from `start` onward, with their absolute indices.
    pub fn rows_from(&self, start: usize) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .skip(start)
            .map(|(idx, row)| (idx, row.as_slice()))
    }
}

/// True when no cell in the row holds a value. Whitespace text is a value.
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(|c| matches!(c, Cell::Empty))
}
