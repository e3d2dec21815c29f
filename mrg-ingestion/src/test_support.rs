//! Fixtures shared by unit tests.

use rust_xlsxwriter::Workbook;

/// Fixture cell.
pub enum Fx {
    S(&'static str),
    N(f64),
    E,
}

pub const MAIN_HEADER: [&str; 7] = [
    "Магистральный распределительный газопровод",
    "Точка подключения",
    "",
    "Период",
    "Уровень загрузки",
    "Факт. среднесут. расход, млн.м3/сут",
    "ТВПС, млн. м3/сут",
];

pub const SUB_HEADER: [&str; 7] = ["", "МГ (РГ, КС, УРГ)", "км", "", "", "", ""];

/// An xlsx flow sheet: the two merged header rows, then `rows` from row 2.
pub fn flow_sheet_xlsx(rows: &[Vec<Fx>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (row, labels) in [MAIN_HEADER, SUB_HEADER].iter().enumerate() {
        for (col, label) in labels.iter().enumerate() {
            if !label.is_empty() {
                sheet.write_string(row as u32, col as u16, *label).unwrap();
            }
        }
    }

    for (i, cells) in rows.iter().enumerate() {
        let row = (i + 2) as u32;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Fx::S(s) => {
                    sheet.write_string(row, col as u16, *s).unwrap();
                }
                Fx::N(n) => {
                    sheet.write_number(row, col as u16, *n).unwrap();
                }
                Fx::E => {}
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}
