// The quiz download of the Canvas learning platform.
// Only a few columns are used, the rest are quiz metadata.

use crate::hat::io_common::is_blank_row;
use crate::hat::*;

const MIN_COLUMNS: usize = 15;
const NAME_COLUMN: usize = 0;
const SID_COLUMN: usize = 2;
const TIMES_COLUMN: usize = 8;
const MODE_COLUMN: usize = 10;

pub fn read_canvas_rows(rows: &[Vec<String>]) -> HatResult<Cohort> {
    let mut people: Vec<Person> = Vec::new();
    // The first row is the header.
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let lineno = idx + 1;
        if is_blank_row(row) {
            continue;
        }
        if row.len() < MIN_COLUMNS {
            warn!(
                "read_canvas_rows: line {}: expected at least {} columns, found {}, skipping",
                lineno,
                MIN_COLUMNS,
                row.len()
            );
            continue;
        }
        let times: Vec<String> = row[TIMES_COLUMN]
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let mut person = Person::new(row[NAME_COLUMN].trim(), row[SID_COLUMN].trim());
        person.preferences = Some(StudyPreferences {
            times,
            mode: row[MODE_COLUMN].trim().to_string(),
        });
        debug!("read_canvas_rows: lineno: {} person: {:?}", lineno, person);
        people.push(person);
    }
    Ok(Cohort {
        people,
        columns: Vec::new(),
        from_canvas: true,
    })
}
