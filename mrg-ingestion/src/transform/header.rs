use crate::sheet::{Cell, Grid};

/// The two stacked sheet rows that jointly label each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRegion {
    pub main_row: usize,
    pub sub_row: usize,
}

impl HeaderRegion {
    /// Header occupying `first_row` and the row below it.
    pub fn starting_at(first_row: usize) -> Self {
        Self {
            main_row: first_row,
            sub_row: first_row + 1,
        }
    }

    pub fn first_data_row(&self) -> usize {
        self.main_row.max(self.sub_row) + 1
    }
}

impl Default for HeaderRegion {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

fn header_text(cell: &Cell) -> String {
    cell.display_text().trim().to_string()
}

/// Merges the two header rows into one label per grid column.
pub fn resolve_headers(grid: &Grid, region: HeaderRegion) -> Vec<String> {
    (0..grid.width())
        .map(|col| {
            let main = header_text(grid.cell(region.main_row, col));
            let sub = header_text(grid.cell(region.sub_row, col));
            merge_labels(&main, &sub)
        })
        .collect()
}

fn merge_labels(main: &str, sub: &str) -> String {
    main.split_whitespace()
        .chain(sub.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn merges_main_and_sub_rows_per_column() {
        let grid = Grid::from_rows(vec![
            vec![t("Магистральный распределительный газопровод"), t("Точка подключения"), Cell::Empty, t("Период")],
            vec![Cell::Empty, t("МГ (РГ, КС, УРГ)"), t("км"), Cell::Empty],
        ]);

        let headers = resolve_headers(&grid, HeaderRegion::default());

        assert_eq!(
            headers,
            vec![
                "Магистральный распределительный газопровод",
                "Точка подключения МГ (РГ, КС, УРГ)",
                "км",
                "Период",
            ]
        );
    }

    #[test]
    fn collapses_whitespace_including_nbsp_and_newlines() {
        let grid = Grid::from_rows(vec![
            vec![t("  Факт.\u{a0}среднесут.\n расход,")],
            vec![t(" млн.м3/сут  ")],
        ]);

        assert_eq!(
            resolve_headers(&grid, HeaderRegion::default()),
            vec!["Факт. среднесут. расход, млн.м3/сут"]
        );
    }

    #[test]
    fn empty_columns_yield_empty_labels_and_length_matches_width() {
        let grid = Grid::from_rows(vec![
            vec![t("a"), Cell::Empty, Cell::Empty, t("a")],
            vec![Cell::Empty, Cell::Empty, Cell::Number(2024.0)],
        ]);

        let headers = resolve_headers(&grid, HeaderRegion::default());

        assert_eq!(headers.len(), grid.width());
        assert_eq!(headers, vec!["a", "", "2024", "a"]);
    }

    #[test]
    fn region_can_start_below_the_top() {
        let grid = Grid::from_rows(vec![
            vec![t("title")],
            vec![t("Уровень")],
            vec![t("загрузки")],
        ]);
        let region = HeaderRegion::starting_at(1);

        assert_eq!(resolve_headers(&grid, region), vec!["Уровень загрузки"]);
        assert_eq!(region.first_data_row(), 3);
    }
}
