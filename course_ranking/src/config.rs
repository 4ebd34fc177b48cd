// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One answer in a survey response, as read from a spreadsheet cell.
#[derive(PartialEq, Debug, Clone)]
pub enum Answer {
    /// The cell was left empty.
    Blank,
    /// A numeric rank within a category.
    Rank(f64),
    /// Some content that could not be understood as a number.
    Text(String),
}

/// A single survey submission.
///
/// The answers are positional: `answers[i]` is the content of the i-th column
/// of the header. Rows may be shorter than the header, missing cells are blank.
#[derive(PartialEq, Debug, Clone)]
pub struct RespondentRow {
    pub id: Option<String>,
    pub answers: Vec<Answer>,
}

static BLANK: Answer = Answer::Blank;

impl RespondentRow {
    pub fn answer(&self, column: usize) -> &Answer {
        self.answers.get(column).unwrap_or(&BLANK)
    }
}

/// The structured content recovered from one column header.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ColumnMeta {
    pub course_type: String,
    pub category: String,
    pub course: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnEntry {
    /// Position of the column in the header.
    pub column: usize,
    pub header: String,
    pub meta: ColumnMeta,
}

/// All the columns of a dataset that were recognized as ranking questions,
/// in header order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct HeaderMetadata {
    pub(crate) entries: Vec<ColumnEntry>,
}

impl HeaderMetadata {
    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, header: &str) -> Option<&ColumnMeta> {
        self.entries
            .iter()
            .find(|e| e.header == header)
            .map(|e| &e.meta)
    }

    pub fn for_course_type<'a>(
        &'a self,
        course_type: &'a str,
    ) -> impl Iterator<Item = &'a ColumnEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.meta.course_type == course_type)
    }
}

// ******** Output data structures *********

/// The final statistics for one course.
#[derive(PartialEq, Debug, Clone)]
pub struct CourseRank {
    pub course: String,
    /// Mean of the global ranks given by the respondents. Lower is better.
    pub average_rank: f64,
    /// Number of respondents who rated this course.
    pub count: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankingResult {
    pub course_type: String,
    /// Sorted by increasing average rank.
    pub courses: Vec<CourseRank>,
    /// Respondents who rated at least one course of this type.
    pub respondents: usize,
    /// Respondents whose ratings were discarded because of duplicate courses.
    pub rejected_respondents: usize,
    /// Cells in ranked columns that did not hold a number.
    pub ignored_answers: usize,
}

impl RankingResult {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Errors that prevent the aggregation from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingErrors {
    /// A category was produced by the header parser, but the aggregation rules
    /// do not know how to order it.
    UnrankedCategory {
        course_type: String,
        category: String,
    },
    EmptyLabel,
}

impl Error for RankingErrors {}

impl Display for RankingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingErrors::UnrankedCategory {
                course_type,
                category,
            } => write!(
                f,
                "category {:?} of course type {} has no priority: header rules and ranking rules are out of sync",
                category, course_type
            ),
            RankingErrors::EmptyLabel => write!(f, "empty label in the survey rules"),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CourseTypeRule {
    pub name: String,
    /// Substring identifying the course type in a header.
    pub marker: String,
}

/// What to do when a respondent rates the same course more than once.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateCourseMode {
    /// Flag the respondent and ignore all their ratings for this course type.
    Reject,
    /// Keep the best rated entry only.
    KeepBest,
    /// Every entry receives its own global rank.
    KeepAll,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyRules {
    pub course_types: Vec<CourseTypeRule>,
    pub ranking_marker: String,
    pub rank_field_marker: String,
    pub segment_delimiter: String,
    /// All the category labels understood by the header parser.
    pub categories: Vec<String>,
    /// Categories that never produce a rating.
    pub skipped_categories: Vec<String>,
    /// Lower is better.
    pub category_priorities: Vec<(String, u32)>,
    pub duplicate_course_mode: DuplicateCourseMode,
}

pub const MOST_BENEFICIAL: &str = "Most Beneficial";
pub const NEUTRAL: &str = "Neutral";
pub const LEAST_BENEFICIAL: &str = "Least Beneficial";
pub const DID_NOT_TAKE: &str = "Did not take";

impl SurveyRules {
    pub fn category_priority(&self, category: &str) -> Option<u32> {
        self.category_priorities
            .iter()
            .find(|(label, _)| label == category)
            .map(|(_, p)| *p)
    }

    pub fn is_skipped(&self, category: &str) -> bool {
        self.skipped_categories.iter().any(|c| c == category)
    }

    pub fn course_type_names(&self) -> Vec<String> {
        self.course_types.iter().map(|ct| ct.name.clone()).collect()
    }

    /// Checks that none of the markers and labels is empty.
    pub fn check(&self) -> Result<(), RankingErrors> {
        let labels = self
            .course_types
            .iter()
            .flat_map(|ct| [&ct.name, &ct.marker])
            .chain([
                &self.ranking_marker,
                &self.rank_field_marker,
                &self.segment_delimiter,
            ])
            .chain(self.categories.iter());
        for l in labels {
            if l.is_empty() {
                return Err(RankingErrors::EmptyLabel);
            }
        }
        Ok(())
    }
}

impl Default for SurveyRules {
    fn default() -> Self {
        SurveyRules {
            course_types: vec![
                CourseTypeRule {
                    name: "CORE".to_string(),
                    marker: "MAcc CORE courses".to_string(),
                },
                CourseTypeRule {
                    name: "ELECTIVE".to_string(),
                    marker: "MAcc Elective courses".to_string(),
                },
            ],
            ranking_marker: " - Ranks - ".to_string(),
            rank_field_marker: " - Rank".to_string(),
            segment_delimiter: " - ".to_string(),
            categories: [MOST_BENEFICIAL, NEUTRAL, LEAST_BENEFICIAL, DID_NOT_TAKE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skipped_categories: vec![DID_NOT_TAKE.to_string()],
            category_priorities: vec![
                (MOST_BENEFICIAL.to_string(), 1),
                (NEUTRAL.to_string(), 2),
                (LEAST_BENEFICIAL.to_string(), 3),
            ],
            duplicate_course_mode: DuplicateCourseMode::Reject,
        }
    }
}
