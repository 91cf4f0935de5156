use clap::Parser;

/// This is a program that sorts students into groups.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the cohort: the attributes, the input files and the
    /// grouping rules. Only JSON descriptions are supported. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, sortinghat will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the groups will be written in CSV format to the
    /// given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the grouping will be written in
    /// JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path or empty) The file with the students. Setting this option overrides the input
    /// sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, xlsx, canvas, canvas_xlsx or auto.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default Sheet1) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (2 to 15) The desired size of each group, for the chunk and preference strategies.
    #[clap(short, long, value_parser)]
    pub group_size: Option<u32>,

    /// (2 to 15) The smallest allowed group, for the greedy and annealing strategies.
    #[clap(long, value_parser)]
    pub min_size: Option<u32>,

    /// (2 to 15) The largest allowed group, for the greedy and annealing strategies.
    #[clap(long, value_parser)]
    pub max_size: Option<u32>,

    /// (default greedy) The grouping strategy: chunk, preference, greedy or annealing.
    #[clap(long, value_parser)]
    pub strategy: Option<String>,

    /// (number) The random seed used by the annealing strategy.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (default joined) The layout of the groups in the CSV output: joined or wide.
    #[clap(long, value_parser)]
    pub layout: Option<String>,

    /// (file path) An existing CSV file of groups to edit with --move instead of forming new groups.
    #[clap(long, value_parser)]
    pub groups: Option<String>,

    /// (list of 'GROUP:INDEX->GROUP:INDEX') Moves a member between groups in the file given with
    /// --groups. Groups and indexes start at 1, like the group names.
    #[clap(long = "move", value_parser)]
    pub moves: Option<Vec<String>>,

    /// (address, for example 127.0.0.1:5000) If specified, runs the upload service instead.
    #[clap(long, value_parser)]
    pub serve: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
