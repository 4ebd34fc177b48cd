use clap::Parser;

/// Computes the average rank of each course from a course-preference survey,
/// and draws a bar chart for each type of course.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the survey: course types, markers in the column headers,
    /// categories and their priorities, output file names.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey responses, in Excel (.xlsx) or CSV format. The first row must contain the questions.
    /// Setting this option overrides what may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (directory) Where the CSV tables and the charts are written.
    /// Setting this option overrides what may be specified with the --config option.
    #[clap(long, value_parser)]
    pub out_dir: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of all the rankings will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, optional) A directory containing reference CSV tables. If provided, courserank will check that
    /// the tables it writes are identical to the reference ones.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
