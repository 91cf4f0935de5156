use log::{debug, info, warn};

use cohort_grouping::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::hat::config_reader::*;
use crate::hat::io_common::{parse_provider, Container, TableKind};
use crate::hat::io_groups::{GroupTable, OutputLayout};

pub mod config_reader;
mod io_canvas;
mod io_cohort;
mod io_common;
mod io_csv;
mod io_excel;
pub mod io_groups;
pub mod server;

#[derive(Debug, Snafu)]
pub enum HatError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The spreadsheet has no worksheet named {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number, found {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("Error reading file {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("The student table has no header"))]
    MissingHeader {},
    #[snafu(display("The student table has no column named {column}"))]
    MissingColumn { column: String },
    #[snafu(display("Line {lineno}: invalid flexibility {content:?} in column {column}"))]
    InvalidFlexibilityCell {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Unknown input type {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Invalid move: {description}"))]
    InvalidMove { description: String },

    #[snafu(display("{source}"))]
    Grouping { source: GroupingErrors },

    #[snafu(display("Error serving on {addr}"))]
    Serving {
        source: std::io::Error,
        addr: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type HatResult<T> = Result<T, HatError>;

/// The students read from one or more input sources.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    pub people: Vec<Person>,
    /// The headers of the cohort tables. Attributes named in a header are activated.
    pub columns: Vec<String>,
    /// Some students come from a Canvas export, which has no attribute selections.
    pub from_canvas: bool,
}

impl Cohort {
    fn append(&mut self, mut other: Cohort) {
        self.people.append(&mut other.people);
        self.from_canvas |= other.from_canvas;
        for c in other.columns {
            if !self.columns.contains(&c) {
                self.columns.push(c);
            }
        }
    }
}

/// Rule values before validation. They come from the configuration file,
/// the command line or the upload form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleInputs {
    pub strategy: Option<String>,
    pub group_size: Option<u32>,
    pub min_group_size: Option<u32>,
    pub max_group_size: Option<u32>,
    pub use_flexibility: Option<bool>,
    pub seed: Option<u64>,
}

impl RuleInputs {
    /// Fills the values that are not set with the values of `fallback`.
    pub fn or(self, fallback: &RuleInputs) -> RuleInputs {
        RuleInputs {
            strategy: self.strategy.or_else(|| fallback.strategy.clone()),
            group_size: self.group_size.or(fallback.group_size),
            min_group_size: self.min_group_size.or(fallback.min_group_size),
            max_group_size: self.max_group_size.or(fallback.max_group_size),
            use_flexibility: self.use_flexibility.or(fallback.use_flexibility),
            seed: self.seed.or(fallback.seed),
        }
    }
}

/// Options of a grouping run given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
    pub rules: RuleInputs,
    pub layout: Option<String>,
    pub out: Option<String>,
    pub summary: Option<String>,
    pub reference: Option<String>,
}

pub fn parse_strategy(s: &str) -> HatResult<Strategy> {
    match s.trim().to_lowercase().as_str() {
        "chunk" => Ok(Strategy::Chunk),
        "preference" => Ok(Strategy::Preference),
        "greedy" => Ok(Strategy::Greedy),
        "annealing" | "sa" => Ok(Strategy::Annealing),
        x => whatever!("Unknown grouping strategy {:?}", x),
    }
}

fn strategy_name(s: Strategy) -> &'static str {
    match s {
        Strategy::Chunk => "chunk",
        Strategy::Preference => "preference",
        Strategy::Greedy => "greedy",
        Strategy::Annealing => "annealing",
    }
}

/// Turns the rule inputs into validated grouping rules.
///
/// When the bounds are missing, the largest group defaults to the desired
/// group size and the smallest group to two less (but at least 2).
pub fn validate_rules(
    inputs: &RuleInputs,
    annealing: AnnealingSchedule,
) -> HatResult<GroupingRules> {
    let defaults = GroupingRules::DEFAULT_RULES;
    let strategy = match &inputs.strategy {
        Some(s) => parse_strategy(s)?,
        None => defaults.strategy,
    };
    let group_size = inputs.group_size.unwrap_or(defaults.group_size);
    let max_group_size = inputs.max_group_size.unwrap_or(group_size);
    let min_group_size = inputs
        .min_group_size
        .unwrap_or_else(|| max_group_size.saturating_sub(2).max(MIN_GROUP_SIZE));
    let rules = GroupingRules {
        strategy,
        group_size,
        min_group_size,
        max_group_size,
        use_flexibility: inputs.use_flexibility.unwrap_or(defaults.use_flexibility),
        seed: inputs.seed.unwrap_or(defaults.seed),
        annealing,
    };
    rules.validate().context(GroupingSnafu {})?;
    Ok(rules)
}

/// Reads and interprets the rows of a table already split into cells.
pub fn interpret_rows(
    rows: &[Vec<String>],
    kind: TableKind,
    cfs: &FileSource,
) -> HatResult<Cohort> {
    match kind {
        TableKind::Cohort => io_cohort::read_cohort_rows(rows, cfs),
        TableKind::Canvas => io_canvas::read_canvas_rows(rows),
        TableKind::Auto if io_cohort::has_identity_columns(rows, cfs) => {
            debug!("interpret_rows: detected a cohort table");
            io_cohort::read_cohort_rows(rows, cfs)
        }
        TableKind::Auto => {
            debug!("interpret_rows: no name and sid columns, reading a Canvas export");
            io_canvas::read_canvas_rows(rows)
        }
    }
}

fn read_student_data(root_path: &Path, cfs: &FileSource) -> HatResult<Cohort> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read student file {:?}", p2);
    let (container, kind) = parse_provider(&cfs.provider)?;
    let rows = match container {
        Container::Csv => io_csv::read_rows(&p2)?,
        Container::Excel => io_excel::read_rows(&p2, cfs.excel_worksheet_name.as_deref())?,
    };
    interpret_rows(&rows, kind, cfs)
}

pub fn read_cohort(root_path: &Path, sources: &[FileSource]) -> HatResult<Cohort> {
    let mut cohort = Cohort::default();
    for cfs in sources.iter() {
        let part = read_student_data(root_path, cfs)?;
        info!(
            "Read {} students from {}",
            part.people.len(),
            io_common::simplify_file_name(&cfs.file_path)
        );
        cohort.append(part);
    }
    Ok(cohort)
}

/// Reads an uploaded file. Excel workbooks are recognized by their extension.
pub fn read_uploaded_cohort(
    file_name: &str,
    data: &[u8],
    input_type: &str,
) -> HatResult<Cohort> {
    let (_, kind) = parse_provider(input_type)?;
    let rows = match io_common::container_for_file(file_name) {
        Container::Csv => io_csv::read_rows_from_bytes(data)?,
        Container::Excel => io_excel::read_rows_from_bytes(data, None)?,
    };
    interpret_rows(&rows, kind, &FileSource::simple(input_type, file_name))
}

/// The attributes used to group a cohort.
///
/// Students read from a Canvas export only have meeting preferences, so such
/// a cohort is grouped without attributes.
pub fn cohort_attributes(cohort: &Cohort, settings: &[AttributeSetting]) -> Vec<Attribute> {
    if cohort.from_canvas {
        if settings.iter().any(|s| s.enabled) {
            info!("Canvas export: the attributes of the configuration are not used");
        }
        return Vec::new();
    }
    active_attributes(settings, &cohort.columns)
}

pub fn group_cohort(
    cohort: &Cohort,
    attributes: &[Attribute],
    rules: &GroupingRules,
) -> HatResult<GroupingResult> {
    run_grouping(&cohort.people, attributes, rules).context(GroupingSnafu {})
}

fn format_score(x: f64) -> String {
    format!("{:.4}", x)
}

fn pair_to_json(pair: &Option<PairStats>) -> JSValue {
    match pair {
        Some(p) => json!({
            "first": p.first,
            "second": p.second,
            "score": format_score(p.score)
        }),
        None => JSValue::Null,
    }
}

fn groups_to_json(result: &GroupingResult) -> Vec<JSValue> {
    result
        .groups
        .iter()
        .map(|g| {
            json!({
                "name": g.name,
                "members": g.members,
                "gcs": g.gcs.map(format_score),
                "pcsVariance": format_score(g.pcs_variance),
                "mostCompatible": pair_to_json(&g.most_compatible),
                "leastCompatible": pair_to_json(&g.least_compatible),
                "dominantTime": g.dominant_time,
                "dominantMode": g.dominant_mode,
            })
        })
        .collect()
}

pub fn build_summary_js(cohort_name: &str, rules: &GroupingRules, result: &GroupingResult) -> JSValue {
    json!({
        "config": {
            "cohort": cohort_name,
            "strategy": strategy_name(rules.strategy),
            "groupCount": result.groups.len(),
        },
        "results": {
            "gcsMean": format_score(result.gcs_mean),
            "gcsVariance": format_score(result.gcs_variance),
            "groups": groups_to_json(result),
        }
    })
}

/// Writes to a file, to the standard output with `stdout`, or nowhere with an empty path.
fn write_output(dest: &str, content: &str) -> HatResult<()> {
    match dest {
        "" => {}
        "stdout" => print!("{}", content),
        path => {
            info!("Writing {}", path);
            fs::write(path, content).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> HatResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// Forms the groups described by a configuration file and the command line.
pub fn run_sorting(config_path: Option<String>, opts: &RunOptions) -> HatResult<GroupingResult> {
    let (config, config_root) = match &config_path {
        Some(path) => {
            let config = read_config(path)?;
            let root = Path::new(path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (HatConfig::default(), PathBuf::from(".")),
    };
    info!("config: {:?}", config);

    // Files given on the command line are relative to the working directory.
    let (root, sources) = match &opts.input {
        Some(input) => {
            let provider = match (&opts.input_type, io_common::container_for_file(input)) {
                (Some(t), _) => t.as_str(),
                (None, Container::Excel) => "xlsx",
                (None, Container::Csv) => "csv",
            };
            let mut cfs = FileSource::simple(provider, input);
            cfs.excel_worksheet_name = opts.excel_worksheet_name.clone();
            (PathBuf::from("."), vec![cfs])
        }
        None => (config_root.clone(), config.input_sources.clone()),
    };
    if sources.is_empty() {
        whatever!("No input source: use --input or inputSources in the configuration")
    }
    let cohort = read_cohort(&root, &sources)?;
    debug!("cohort: {:?}", cohort);

    let settings = build_attributes(&config.attributes, &config.custom_settings)?;
    let attributes = cohort_attributes(&cohort, &settings);

    let rule_inputs = opts.rules.clone().or(&config.rules.to_inputs()?);
    let rules = validate_rules(&rule_inputs, config.rules.annealing_schedule()?)?;

    let result = group_cohort(&cohort, &attributes, &rules)?;
    info!("result: {:?}", result);

    let layout = match opts
        .layout
        .as_ref()
        .or(config.output_settings.output_layout.as_ref())
    {
        Some(s) => OutputLayout::parse(s)?,
        None => OutputLayout::Joined,
    };
    let groups_csv = GroupTable::from_result(&result).to_csv(layout)?;
    let out = match (&opts.out, &config.output_settings.output_directory) {
        (Some(out), _) => out.clone(),
        (None, Some(dir)) => config_root
            .join(dir)
            .join("groups.csv")
            .display()
            .to_string(),
        (None, None) => "stdout".to_string(),
    };
    write_output(&out, &groups_csv)?;

    let result_js = build_summary_js(&config.output_settings.cohort_name, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(summary_path) = &opts.summary {
        write_output(summary_path, &format!("{}\n", pretty_js_stats))?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &opts.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(result)
}

/// Parses a move of the form `GROUP:INDEX->GROUP:INDEX`, with 1-based numbers.
///
/// Returns the 0-based source group, source index, target group and target index.
pub fn parse_move(s: &str) -> HatResult<(usize, usize, usize, usize)> {
    let invalid = || HatError::InvalidMove {
        description: format!("{:?} is not of the form GROUP:INDEX->GROUP:INDEX", s),
    };
    let (from, to) = s.split_once("->").ok_or_else(invalid)?;
    let position = |p: &str| -> HatResult<(usize, usize)> {
        let (g, i) = p.split_once(':').ok_or_else(invalid)?;
        let g = g.trim().parse::<usize>().ok().filter(|x| *x >= 1);
        let i = i.trim().parse::<usize>().ok().filter(|x| *x >= 1);
        match (g, i) {
            (Some(g), Some(i)) => Ok((g - 1, i - 1)),
            _ => Err(invalid()),
        }
    };
    let (from_group, from_index) = position(from)?;
    let (to_group, to_index) = position(to)?;
    Ok((from_group, from_index, to_group, to_index))
}

/// Applies moves to a file of groups and writes the result.
pub fn run_group_edit(
    groups_path: &str,
    moves: &[String],
    layout: Option<&str>,
    out: Option<&str>,
) -> HatResult<GroupTable> {
    let contents = fs::read_to_string(groups_path).context(ReadingInputSnafu {
        path: groups_path,
    })?;
    let (mut table, detected) = GroupTable::parse_csv(&contents)?;
    for m in moves.iter() {
        let (from_group, from_index, to_group, to_index) = parse_move(m)?;
        debug!("run_group_edit: applying {}", m);
        table.move_member(from_group, from_index, to_group, to_index)?;
    }
    let layout = match layout {
        Some(s) => OutputLayout::parse(s)?,
        None => detected,
    };
    write_output(out.unwrap_or("stdout"), &table.to_csv(layout)?)?;
    Ok(table)
}
