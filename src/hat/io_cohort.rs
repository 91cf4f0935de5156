// Cohort tables: a header, then one row per student.

use crate::hat::io_common::{clean_header, find_column, is_blank_row};
use crate::hat::*;

enum ColumnRole {
    Selection(String),
    Flexibility(String),
    Ignored,
}

fn column_roles(header: &[String], cfs: &FileSource, name_idx: usize, sid_idx: usize) -> Vec<ColumnRole> {
    let suffix = cfs.flexibility_suffix();
    header
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = clean_header(h);
            if idx == name_idx || idx == sid_idx || h.is_empty() {
                ColumnRole::Ignored
            } else if let Some(attr) = h.strip_suffix(suffix).filter(|a| !a.trim().is_empty()) {
                ColumnRole::Flexibility(attr.trim().to_string())
            } else {
                ColumnRole::Selection(h)
            }
        })
        .collect()
}

pub fn has_identity_columns(rows: &[Vec<String>], cfs: &FileSource) -> bool {
    match rows.first() {
        Some(header) => {
            find_column(header, cfs.name_column()).is_some()
                && find_column(header, cfs.sid_column()).is_some()
        }
        None => false,
    }
}

fn parse_flexibility(cell: &str) -> Option<u8> {
    if let Ok(x) = cell.parse::<u8>() {
        return Some(x);
    }
    // Spreadsheets tend to write integers as 3.0
    match cell.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (0.0..=255.0).contains(&f) => Some(f as u8),
        _ => None,
    }
}

pub fn read_cohort_rows(rows: &[Vec<String>], cfs: &FileSource) -> HatResult<Cohort> {
    let header = rows.first().context(MissingHeaderSnafu {})?;
    debug!("read_cohort_rows: header: {:?}", header);
    let name_idx = find_column(header, cfs.name_column()).context(MissingColumnSnafu {
        column: cfs.name_column(),
    })?;
    let sid_idx = find_column(header, cfs.sid_column()).context(MissingColumnSnafu {
        column: cfs.sid_column(),
    })?;
    let roles = column_roles(header, cfs, name_idx, sid_idx);

    let mut people: Vec<Person> = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let lineno = idx + 1;
        if is_blank_row(row) {
            continue;
        }
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let name = cell(name_idx);
        if name.is_empty() {
            warn!("read_cohort_rows: line {}: no name, skipping {:?}", lineno, row);
            continue;
        }
        let mut person = Person::new(name, cell(sid_idx));
        for (col, role) in roles.iter().enumerate() {
            let content = cell(col);
            if content.is_empty() {
                continue;
            }
            match role {
                ColumnRole::Selection(attr) => {
                    person.selections.insert(attr.clone(), content.to_string());
                }
                ColumnRole::Flexibility(attr) => {
                    let score = parse_flexibility(content).context(InvalidFlexibilityCellSnafu {
                        lineno,
                        column: format!("{}{}", attr, cfs.flexibility_suffix()),
                        content,
                    })?;
                    person.flexibility.insert(attr.clone(), score);
                }
                ColumnRole::Ignored => {}
            }
        }
        debug!("read_cohort_rows: lineno: {} person: {:?}", lineno, person);
        people.push(person);
    }

    let columns = roles
        .into_iter()
        .filter_map(|r| match r {
            ColumnRole::Selection(c) => Some(c),
            _ => None,
        })
        .collect();
    Ok(Cohort {
        people,
        columns,
        from_canvas: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn source() -> FileSource {
        FileSource::simple("csv", "students.csv")
    }

    #[test]
    fn reads_selections_and_flexibility() {
        let data = rows(&[
            &["name", "sid", "Mode", "Mode Flexibility", "Time"],
            &["Anna", "1001", "Online", "2", "Morning"],
            &["Bob", "1002", "In person", "", " Evening "],
            &["", "", "", "", ""],
        ]);
        let cohort = read_cohort_rows(&data, &source()).unwrap();
        assert_eq!(cohort.people.len(), 2);
        assert_eq!(cohort.columns, vec!["Mode".to_string(), "Time".to_string()]);
        let anna = &cohort.people[0];
        assert_eq!(anna.sid, "1001");
        assert_eq!(anna.selection("Mode"), Some("Online"));
        assert_eq!(anna.flexibility_for("Mode"), 2);
        let bob = &cohort.people[1];
        assert_eq!(bob.selection("Time"), Some("Evening"));
        assert_eq!(bob.flexibility_for("Mode"), DEFAULT_FLEXIBILITY);
        assert!(bob.flexibility.is_empty());
    }

    #[test]
    fn accepts_spreadsheet_integers() {
        assert_eq!(parse_flexibility("3.0"), Some(3));
        assert_eq!(parse_flexibility("3.5"), None);
        assert_eq!(parse_flexibility("high"), None);
    }

    #[test]
    fn rejects_bad_flexibility() {
        let data = rows(&[
            &["name", "sid", "Mode Flexibility"],
            &["Anna", "1001", "very"],
        ]);
        match read_cohort_rows(&data, &source()) {
            Err(HatError::InvalidFlexibilityCell { lineno, .. }) => assert_eq!(lineno, 2),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn requires_identity_columns() {
        let data = rows(&[&["student", "sid"], &["Anna", "1"]]);
        assert!(!has_identity_columns(&data, &source()));
        assert!(read_cohort_rows(&data, &source()).is_err());

        let mut cfs = source();
        cfs.name_column = Some("Student".to_string());
        assert!(has_identity_columns(&data, &cfs));
        let cohort = read_cohort_rows(&data, &cfs).unwrap();
        assert_eq!(cohort.people[0].name, "Anna");
    }
}
