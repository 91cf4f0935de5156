// The table of formed groups, as exported to and edited from CSV files.

use crate::hat::io_common::is_blank_row;
use crate::hat::*;

pub const GROUP_NAME_HEADER: &str = "Group Name";
pub const STUDENT_NAMES_HEADER: &str = "Student Names";

/// The layouts of the CSV file of groups.
///
/// - Joined has a header and one row per group, with all the names in one cell
/// separated by commas.
///
/// - Wide has no header. Each row starts with the name of the group and every
/// member has a cell.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputLayout {
    Joined,
    Wide,
}

impl OutputLayout {
    pub fn parse(s: &str) -> HatResult<OutputLayout> {
        match s.trim().to_lowercase().as_str() {
            "joined" => Ok(OutputLayout::Joined),
            "wide" => Ok(OutputLayout::Wide),
            x => whatever!("Unknown output layout {:?}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupRow {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct GroupTable {
    pub groups: Vec<GroupRow>,
}

impl GroupTable {
    pub fn from_result(result: &GroupingResult) -> GroupTable {
        GroupTable {
            groups: result
                .groups
                .iter()
                .map(|g| GroupRow {
                    name: g.name.clone(),
                    members: g.members.clone(),
                })
                .collect(),
        }
    }

    /// Reads a file in either layout. The layout is detected from the header.
    pub fn parse_csv(text: &str) -> HatResult<(GroupTable, OutputLayout)> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut layout: Option<OutputLayout> = None;
        let mut groups: Vec<GroupRow> = Vec::new();
        for (idx, line_r) in rdr.into_records().enumerate() {
            let line = line_r.context(CsvLineParseSnafu { lineno: idx + 1 })?;
            let cells: Vec<String> = line.iter().map(|s| s.trim().to_string()).collect();
            if is_blank_row(&cells) {
                continue;
            }
            let current = match layout {
                Some(l) => l,
                None if cells[0].eq_ignore_ascii_case(GROUP_NAME_HEADER) => {
                    layout = Some(OutputLayout::Joined);
                    continue;
                }
                None => {
                    layout = Some(OutputLayout::Wide);
                    OutputLayout::Wide
                }
            };
            let members: Vec<String> = match current {
                OutputLayout::Joined => cells
                    .get(1)
                    .map(|s| s.as_str())
                    .unwrap_or("")
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect(),
                OutputLayout::Wide => cells[1..]
                    .iter()
                    .filter(|m| !m.is_empty())
                    .cloned()
                    .collect(),
            };
            groups.push(GroupRow {
                name: cells[0].clone(),
                members,
            });
        }
        Ok((GroupTable { groups }, layout.unwrap_or(OutputLayout::Joined)))
    }

    /// Moves a member to another position, possibly in the same group.
    ///
    /// The target index is taken after the removal of the member. An index past
    /// the end of the target group appends the member.
    pub fn move_member(
        &mut self,
        from_group: usize,
        from_index: usize,
        to_group: usize,
        to_index: usize,
    ) -> HatResult<()> {
        let num_groups = self.groups.len();
        if to_group >= num_groups {
            return InvalidMoveSnafu {
                description: format!("no group number {}", to_group + 1),
            }
            .fail();
        }
        let source = self
            .groups
            .get_mut(from_group)
            .context(InvalidMoveSnafu {
                description: format!("no group number {}", from_group + 1),
            })?;
        if from_index >= source.members.len() {
            return InvalidMoveSnafu {
                description: format!(
                    "{} has no member number {}",
                    source.name,
                    from_index + 1
                ),
            }
            .fail();
        }
        let member = source.members.remove(from_index);
        let target = &mut self.groups[to_group].members;
        let idx = to_index.min(target.len());
        debug!("move_member: {} to group {} at {}", member, to_group + 1, idx);
        target.insert(idx, member);
        Ok(())
    }

    pub fn to_csv(&self, layout: OutputLayout) -> HatResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        match layout {
            OutputLayout::Joined => {
                wtr.write_record([GROUP_NAME_HEADER, STUDENT_NAMES_HEADER])
                    .context(CsvWriteSnafu {})?;
                for g in self.groups.iter() {
                    wtr.write_record([g.name.as_str(), g.members.join(", ").as_str()])
                        .context(CsvWriteSnafu {})?;
                }
            }
            OutputLayout::Wide => {
                for g in self.groups.iter() {
                    let mut record: Vec<&str> = vec![g.name.as_str()];
                    record.extend(g.members.iter().map(|m| m.as_str()));
                    wtr.write_record(&record).context(CsvWriteSnafu {})?;
                }
            }
        }
        let data = match wtr.into_inner() {
            Ok(data) => data,
            Err(e) => whatever!("Error writing CSV: {}", e.error()),
        };
        match String::from_utf8(data) {
            Ok(s) => Ok(s),
            Err(e) => whatever!("Error writing CSV: {}", e),
        }
    }
}
