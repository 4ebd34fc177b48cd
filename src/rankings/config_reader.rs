use crate::rankings::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_INPUT: &str = "data/data.xlsx";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "outputs";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CourseTypeConfig {
    pub name: String,
    pub marker: String,
    pub title: Option<String>,
    #[serde(rename = "chartFile")]
    pub chart_file: Option<String>,
    #[serde(rename = "csvFile")]
    pub csv_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    pub priority: Option<u32>,
    pub skip: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "courseTypes")]
    pub course_types: Option<Vec<CourseTypeConfig>>,
    #[serde(rename = "rankingMarker")]
    pub ranking_marker: Option<String>,
    #[serde(rename = "rankFieldMarker")]
    pub rank_field_marker: Option<String>,
    #[serde(rename = "segmentDelimiter")]
    pub segment_delimiter: Option<String>,
    pub categories: Option<Vec<CategoryConfig>>,
    #[serde(rename = "duplicateCourseMode")]
    pub duplicate_course_mode: Option<String>,
}

pub fn read_config(path: &str) -> RankingsResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

fn default_output(name: &str) -> CourseTypeOutput {
    let lower = name.to_lowercase();
    CourseTypeOutput {
        name: name.to_string(),
        title: format!("MAcc {} Course Rankings", name.to_uppercase()),
        csv_file: format!("{}_rankings.csv", lower),
        chart_file: format!("{}_rank_order.png", lower),
    }
}

fn validate_course_types(
    cts: &[CourseTypeConfig],
) -> RankingsResult<(Vec<CourseTypeRule>, Vec<CourseTypeOutput>)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rules: Vec<CourseTypeRule> = Vec::new();
    let mut outputs: Vec<CourseTypeOutput> = Vec::new();
    for ct in cts {
        if !seen.insert(ct.name.as_str()) {
            whatever!("Course type {:?} is defined more than once", ct.name)
        }
        let default = default_output(&ct.name);
        rules.push(CourseTypeRule {
            name: ct.name.clone(),
            marker: ct.marker.clone(),
        });
        outputs.push(CourseTypeOutput {
            name: ct.name.clone(),
            title: ct.title.clone().unwrap_or(default.title),
            csv_file: ct.csv_file.clone().unwrap_or(default.csv_file),
            chart_file: ct.chart_file.clone().unwrap_or(default.chart_file),
        });
    }
    Ok((rules, outputs))
}

fn validate_duplicate_mode(mode: &str) -> RankingsResult<DuplicateCourseMode> {
    match mode {
        "reject" => Ok(DuplicateCourseMode::Reject),
        "keepBest" => Ok(DuplicateCourseMode::KeepBest),
        "keepAll" => Ok(DuplicateCourseMode::KeepAll),
        x => {
            whatever!(
                "Failed to understand duplicateCourseMode option {:?}: expected reject, keepBest or keepAll",
                x
            )
        }
    }
}

/// Converts the configuration file into rules for the library, filling the
/// missing parts with the defaults.
pub fn validate_rules(config: &SurveyConfig) -> RankingsResult<(SurveyRules, Vec<CourseTypeOutput>)> {
    let mut rules = SurveyRules::default();
    let mut outputs: Vec<CourseTypeOutput> = rules
        .course_types
        .iter()
        .map(|ct| default_output(&ct.name))
        .collect();

    if let Some(cts) = config.course_types.as_deref() {
        if cts.is_empty() {
            whatever!("courseTypes must contain at least one course type")
        }
        let (ct_rules, ct_outputs) = validate_course_types(cts)?;
        rules.course_types = ct_rules;
        outputs = ct_outputs;
    }
    if let Some(m) = config.ranking_marker.clone() {
        rules.ranking_marker = m;
    }
    if let Some(m) = config.rank_field_marker.clone() {
        rules.rank_field_marker = m;
    }
    if let Some(m) = config.segment_delimiter.clone() {
        rules.segment_delimiter = m;
    }
    if let Some(cats) = config.categories.as_deref() {
        rules.categories = Vec::new();
        rules.skipped_categories = Vec::new();
        rules.category_priorities = Vec::new();
        for c in cats {
            if rules.categories.contains(&c.label) {
                whatever!("Category {:?} is defined more than once", c.label)
            }
            rules.categories.push(c.label.clone());
            match (c.skip.unwrap_or(false), c.priority) {
                (true, Some(p)) => {
                    whatever!(
                        "Category {:?} cannot be both skipped and have priority {}",
                        c.label,
                        p
                    )
                }
                (true, None) => rules.skipped_categories.push(c.label.clone()),
                (false, Some(p)) => rules.category_priorities.push((c.label.clone(), p)),
                // Detected when the courses get ranked.
                (false, None) => {}
            }
        }
    }
    if let Some(mode) = config.duplicate_course_mode.as_deref() {
        rules.duplicate_course_mode = validate_duplicate_mode(mode)?;
    }
    if let Err(e) = rules.check() {
        whatever!("Invalid survey configuration: {}", e)
    }
    Ok((rules, outputs))
}

// Paths in the configuration file are relative to the file itself.
fn resolve(config_path: &str, p: &str) -> String {
    let parent = Path::new(config_path).parent().unwrap_or_else(|| Path::new(""));
    parent.join(p).display().to_string()
}

/// Merges the command line and the configuration file.
/// The command line takes precedence.
pub fn build_settings(args: &Args, config: Option<(SurveyConfig, &str)>) -> RankingsResult<RunSettings> {
    let (config, config_path) = match config {
        Some((c, p)) => (c, Some(p)),
        None => (SurveyConfig::default(), None),
    };
    let (rules, outputs) = validate_rules(&config)?;

    let from_config = |p: &Option<String>| -> Option<String> {
        match (p, config_path) {
            (Some(p), Some(cp)) => Some(resolve(cp, p)),
            (Some(p), None) => Some(p.clone()),
            (None, _) => None,
        }
    };

    let input = args
        .input
        .clone()
        .or_else(|| from_config(&config.input_file))
        .unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let out_dir = args
        .out_dir
        .clone()
        .or_else(|| from_config(&config.output_directory))
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_string());
    let excel_worksheet_name = args
        .excel_worksheet_name
        .clone()
        .or_else(|| config.excel_worksheet_name.clone());

    Ok(RunSettings {
        input,
        out_dir,
        excel_worksheet_name,
        rules,
        outputs,
        summary_out: args.out.clone(),
        reference_dir: args.reference.clone(),
    })
}
