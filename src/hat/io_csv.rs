// Primitives for reading CSV files.

use std::io::Read;

use crate::hat::*;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

pub fn read_rows(path: &str) -> HatResult<Vec<Vec<String>>> {
    let rdr = reader_builder()
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    collect_rows(rdr)
}

pub fn read_rows_from_bytes(data: &[u8]) -> HatResult<Vec<Vec<String>>> {
    collect_rows(reader_builder().from_reader(data))
}

fn collect_rows<R: Read>(rdr: csv::Reader<R>) -> HatResult<Vec<Vec<String>>> {
    let mut res: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_rows: lineno: {:?} row: {:?}", lineno, row);
        res.push(row);
    }
    Ok(res)
}
