use std::path::Path;

use crate::hat::*;

/// Where the cells of an input come from.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Container {
    Csv,
    Excel,
}

/// How the rows of an input are interpreted.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TableKind {
    /// One row per student, with name, sid and attribute columns.
    Cohort,
    /// The quiz download of Canvas.
    Canvas,
    /// Cohort if the header has the name and sid columns, Canvas otherwise.
    Auto,
}

pub fn parse_provider(provider: &str) -> HatResult<(Container, TableKind)> {
    match provider.trim().to_lowercase().as_str() {
        "csv" => Ok((Container::Csv, TableKind::Cohort)),
        "xlsx" => Ok((Container::Excel, TableKind::Cohort)),
        "canvas" => Ok((Container::Csv, TableKind::Canvas)),
        "canvas_xlsx" => Ok((Container::Excel, TableKind::Canvas)),
        "auto" => Ok((Container::Csv, TableKind::Auto)),
        _ => UnknownProviderSnafu { provider }.fail(),
    }
}

pub fn container_for_file(file_name: &str) -> Container {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Container::Excel,
        _ => Container::Csv,
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Header cells exported by spreadsheets may carry a byte order mark.
pub fn clean_header(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}').trim().to_string()
}

pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| clean_header(h).eq_ignore_ascii_case(name.trim()))
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
