use log::{debug, error, info, warn};

use course_ranking::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rankings::config_reader::*;

mod config_reader;
mod io_chart;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum RankingsError {
    #[snafu(display("Input file {path} not found"))]
    MissingInput { path: String },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("File {path} has no worksheet {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("File {path} is empty"))]
    EmptyInput { path: String },
    #[snafu(display(
        "File {path}: unsupported format (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)"
    ))]
    UnsupportedInput { path: String },
    #[snafu(display("Error opening CSV file {path}: {source}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV file {path} at line {lineno}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing CSV file {path}: {source}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing summary {path}: {source}"))]
    WritingSummary {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error accessing {path}: {source}"))]
    FileIo {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error drawing chart {path}: {message}"))]
    ChartRender { path: String, message: String },
    #[snafu(display("Error ranking {course_type} courses: {source}"))]
    Ranking {
        source: RankingErrors,
        course_type: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RankingsResult<T> = Result<T, RankingsError>;

/// The content of the survey file, before any interpretation of the columns.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyTable {
    pub headers: Vec<String>,
    pub rows: Vec<RespondentRow>,
}

/// Where the results of one course type are written.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CourseTypeOutput {
    pub name: String,
    pub title: String,
    pub csv_file: String,
    pub chart_file: String,
}

/// All the settings of a run, after merging the configuration file and the
/// command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub input: String,
    pub out_dir: String,
    pub excel_worksheet_name: Option<String>,
    pub rules: SurveyRules,
    pub outputs: Vec<CourseTypeOutput>,
    pub summary_out: Option<String>,
    pub reference_dir: Option<String>,
}

#[derive(Debug)]
pub struct SurveyReport {
    pub results: Vec<(CourseTypeOutput, RankingResult)>,
    /// The course types that could not be processed, with the reason.
    pub failures: Vec<(String, String)>,
    /// The CSV tables that were written.
    pub written_tables: Vec<PathBuf>,
}

pub fn read_survey(settings: &RunSettings) -> RankingsResult<SurveyTable> {
    let path = settings.input.as_str();
    ensure!(Path::new(path).exists(), MissingInputSnafu { path });
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    info!("Reading {} (format {:?})", path, extension);
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            io_excel::read_excel_table(path, settings.excel_worksheet_name.as_deref())
        }
        "csv" => io_csv::read_csv_table(path),
        _ => UnsupportedInputSnafu { path }.fail(),
    }
}

fn process_course_type(
    table: &SurveyTable,
    metadata: &HeaderMetadata,
    output: &CourseTypeOutput,
    settings: &RunSettings,
) -> RankingsResult<(RankingResult, PathBuf)> {
    println!("Processing {} courses...", output.name);
    let result = aggregate(&table.rows, metadata, &output.name, &settings.rules).context(
        RankingSnafu {
            course_type: output.name.clone(),
        },
    )?;
    if result.rejected_respondents > 0 {
        warn!(
            "{}: {} responses rated the same course more than once and were not counted",
            output.name, result.rejected_respondents
        );
    }
    println!("{}", io_common::format_table(&result.courses));

    let out_dir = Path::new(&settings.out_dir);
    let csv_path = out_dir.join(&output.csv_file);
    io_csv::write_rankings(&csv_path, &result.courses)?;
    info!("Saved table to {}", csv_path.display());

    if result.is_empty() {
        println!("No data for {}", output.title);
    } else {
        let chart_path = out_dir.join(&output.chart_file);
        match io_chart::render_chart(&chart_path, &output.title, &result.courses) {
            Ok(()) => println!("Saved plot to {}", chart_path.display()),
            // The table is already written, only the chart is missing.
            Err(e) => error!("{}", e),
        }
    }
    Ok((result, csv_path))
}

/// Runs the header parser and the aggregation for every course type.
///
/// A failure for one course type is reported and does not prevent the other
/// course types from being processed.
pub fn process_survey(table: &SurveyTable, settings: &RunSettings) -> RankingsResult<SurveyReport> {
    info!("Parsing columns...");
    let metadata = parse_headers(&table.headers, &settings.rules);
    info!(
        "{} of {} columns are course rankings",
        metadata.len(),
        table.headers.len()
    );
    fs::create_dir_all(&settings.out_dir).context(FileIoSnafu {
        path: settings.out_dir.clone(),
    })?;

    let mut report = SurveyReport {
        results: Vec::new(),
        failures: Vec::new(),
        written_tables: Vec::new(),
    };
    for output in settings.outputs.iter() {
        match process_course_type(table, &metadata, output, settings) {
            Ok((result, csv_path)) => {
                report.results.push((output.clone(), result));
                report.written_tables.push(csv_path);
            }
            Err(e) => {
                error!("Skipping {} courses: {}", output.name, e);
                report.failures.push((output.name.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

fn build_summary_js(settings: &RunSettings, report: &SurveyReport) -> JSValue {
    let results: Vec<JSValue> = report
        .results
        .iter()
        .map(|(output, res)| {
            let rankings: Vec<JSValue> = res
                .courses
                .iter()
                .map(|c| json!({"course": c.course, "averageRank": c.average_rank, "count": c.count}))
                .collect();
            json!({
                "courseType": output.name,
                "title": output.title,
                "respondents": res.respondents,
                "rejectedRespondents": res.rejected_respondents,
                "ignoredAnswers": res.ignored_answers,
                "rankings": rankings
            })
        })
        .collect();
    let errors: Vec<JSValue> = report
        .failures
        .iter()
        .map(|(name, msg)| json!({"courseType": name, "message": msg}))
        .collect();
    json!({"input": settings.input, "results": results, "errors": errors})
}

fn write_summary(settings: &RunSettings, report: &SurveyReport) -> RankingsResult<()> {
    if let Some(out) = settings.summary_out.as_deref() {
        let js = build_summary_js(settings, report);
        let pretty = serde_json::to_string_pretty(&js).context(WritingSummarySnafu { path: out })?;
        if out == "stdout" {
            println!("{}", pretty);
        } else {
            fs::write(out, pretty).context(FileIoSnafu { path: out })?;
            info!("Saved summary to {}", out);
        }
    }
    Ok(())
}

/// Compares the written tables with the tables of the same name in the
/// reference directory.
fn check_references(reference_dir: &str, report: &SurveyReport) -> RankingsResult<()> {
    let mut mismatches: Vec<String> = Vec::new();
    for table_path in report.written_tables.iter() {
        let file_name = io_common::simplify_file_name(&table_path.to_string_lossy());
        let ref_path: PathBuf = [reference_dir, file_name.as_str()].iter().collect();
        let ref_s = ref_path.display().to_string();
        debug!("check_references: {:?} against {:?}", table_path, ref_s);
        let expected = fs::read_to_string(&ref_path).context(FileIoSnafu { path: ref_s.clone() })?;
        let actual = fs::read_to_string(table_path).context(FileIoSnafu {
            path: table_path.display().to_string(),
        })?;
        if expected != actual {
            warn!("Found differences with the reference table {}", ref_s);
            print_diff(expected.as_str(), actual.as_str(), "\n");
            mismatches.push(file_name);
        }
    }
    if !mismatches.is_empty() {
        whatever!(
            "Difference detected between calculated tables and reference tables: {:?}",
            mismatches
        )
    }
    Ok(())
}

pub fn run_survey(args: &Args) -> RankingsResult<()> {
    let config = match args.config.as_deref() {
        Some(p) => Some((read_config(p)?, p)),
        None => None,
    };
    let settings = build_settings(args, config)?;
    debug!("run_survey: settings: {:?}", settings);

    let table = read_survey(&settings)?;
    info!(
        "Read {} responses and {} columns",
        table.rows.len(),
        table.headers.len()
    );

    let report = process_survey(&table, &settings)?;
    write_summary(&settings, &report)?;

    if let Some(reference_dir) = settings.reference_dir.as_deref() {
        check_references(reference_dir, &report)?;
    }
    Ok(())
}
