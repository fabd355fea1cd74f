use crate::error::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Reader};
use std::io::Cursor;
use tracing::debug;

/// Count the data rows of `sheet` in a workbook held in memory.
///
/// The first row of the sheet is a header and is not counted. Any format
/// calamine recognizes (xlsx, xlsm, xlsb, xls, ods) is accepted.
pub fn count_data_rows(bytes: &[u8], sheet: &str) -> Result<usize> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| Error::Parse(format!("cannot open workbook: {err}")))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(Error::Parse(format!("workbook has no sheet named {sheet:?}")));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|err| Error::Parse(format!("cannot read sheet {sheet:?}: {err}")))?;

    let rows = range.height().saturating_sub(1);
    debug!("Sheet {:?} has {} data rows", sheet, rows);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_with_rows(sheet: &str, data_rows: u32) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        worksheet.write_string(0, 0, "sample_id").unwrap();
        worksheet.write_string(0, 1, "volume").unwrap();
        for row in 1..=data_rows {
            worksheet.write_string(row, 0, format!("S{row}")).unwrap();
            worksheet.write_number(row, 1, row as f64).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_counts_rows_below_header() {
        let bytes = workbook_with_rows("Samples", 5);
        assert_eq!(count_data_rows(&bytes, "Samples").unwrap(), 5);
    }

    #[test]
    fn test_header_only_sheet_has_no_data_rows() {
        let bytes = workbook_with_rows("Samples", 0);
        assert_eq!(count_data_rows(&bytes, "Samples").unwrap(), 0);
    }

    #[test]
    fn test_missing_sheet_is_parse_error() {
        let bytes = workbook_with_rows("Runs", 3);
        let err = count_data_rows(&bytes, "Samples").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_corrupt_bytes_are_parse_error() {
        let err = count_data_rows(b"definitely not a workbook", "Samples").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
