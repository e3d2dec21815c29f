pub mod csv_sheet;
pub mod workbook;

pub use workbook::{SheetFormat, SheetOptions, WorkbookSource};
