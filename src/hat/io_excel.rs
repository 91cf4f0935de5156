use std::io::{Cursor, Read, Seek};

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::hat::*;

const UPLOADED_WORKBOOK: &str = "uploaded workbook";

pub fn read_rows(path: &str, worksheet_name: Option<&str>) -> HatResult<Vec<Vec<String>>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = get_range(&mut workbook, worksheet_name, path)?;
    Ok(range_to_rows(&wrange))
}

pub fn read_rows_from_bytes(
    data: &[u8],
    worksheet_name: Option<&str>,
) -> HatResult<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data)).context(OpeningExcelSnafu {
        path: UPLOADED_WORKBOOK,
    })?;
    let wrange = get_range(&mut workbook, worksheet_name, UPLOADED_WORKBOOK)?;
    Ok(range_to_rows(&wrange))
}

// Without a worksheet name, the first worksheet is used.
fn get_range<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    worksheet_name: Option<&str>,
    path: &str,
) -> HatResult<Range<DataType>> {
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        // Student ids are often stored as numbers: 1001.0 is printed as 1001.
        c => c.to_string(),
    }
}

fn range_to_rows(wrange: &Range<DataType>) -> Vec<Vec<String>> {
    wrange
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

/// Builds an xlsx workbook in memory. Cells that look like numbers are
/// stored as numbers, as spreadsheet programs do.
#[cfg(test)]
pub(crate) fn workbook_bytes(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    for (name, rows) in sheets.iter() {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(x) => worksheet.write_number(r as u32, c as u16, x).unwrap(),
                    Err(_) => worksheet.write_string(r as u32, c as u16, *cell).unwrap(),
                };
            }
        }
        workbook.push_worksheet(worksheet);
    }
    workbook.save_to_buffer().unwrap()
}

/// Writes a workbook to a fresh file of the temporary directory.
#[cfg(test)]
pub(crate) fn workbook_file(file_name: &str, sheets: &[(&str, Vec<Vec<&str>>)]) -> String {
    let dir = std::env::temp_dir().join(format!("sortinghat-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file_name);
    fs::write(&path, workbook_bytes(sheets)).unwrap();
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_sheets() -> Vec<(&'static str, Vec<Vec<&'static str>>)> {
        vec![
            ("Notes", vec![vec!["Exported from the survey"]]),
            (
                "Students",
                vec![
                    vec!["name", "sid", "Mode", "Mode Flexibility"],
                    vec!["Anna", "1001", "Online", "2"],
                    vec!["Bob", "1002", "In person", ""],
                ],
            ),
        ]
    }

    #[test]
    fn reads_the_first_worksheet_by_default() {
        let path = workbook_file("first_sheet.xlsx", &survey_sheets());
        let rows = read_rows(&path, None).unwrap();
        assert_eq!(rows, vec![vec!["Exported from the survey".to_string()]]);
    }

    #[test]
    fn reads_a_named_worksheet() {
        let path = workbook_file("named_sheet.xlsx", &survey_sheets());
        let rows = read_rows(&path, Some("Students")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["name", "sid", "Mode", "Mode Flexibility"]);
        assert_eq!(rows[1], vec!["Anna", "1001", "Online", "2"]);
        assert_eq!(rows[2], vec!["Bob", "1002", "In person", ""]);

        let rows = read_rows_from_bytes(&workbook_bytes(&survey_sheets()), Some("Students")).unwrap();
        assert_eq!(rows[1][1], "1001");
    }

    #[test]
    fn missing_worksheet_is_reported() {
        let path = workbook_file("missing_sheet.xlsx", &survey_sheets());
        let res = read_rows(&path, Some("Answers"));
        assert!(matches!(res, Err(HatError::MissingWorksheet { name }) if name == "Answers"));
    }

    #[test]
    fn missing_workbook_is_reported() {
        let res = read_rows("/nonexistent/students.xlsx", None);
        assert!(matches!(res, Err(HatError::OpeningExcel { .. })));
    }

    #[test]
    fn cells_as_text() {
        assert_eq!(cell_to_string(&DataType::Float(1001.0)), "1001");
        assert_eq!(cell_to_string(&DataType::Int(7)), "7");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(
            cell_to_string(&DataType::String("Online".to_string())),
            "Online"
        );
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        assert!(read_rows_from_bytes(b"name,sid\nAnna,1\n", None).is_err());
    }
}
