pub use crate::config::*;

use crate::header::parse_headers;
use crate::ranking::aggregate;

/// A builder for assembling survey responses without a spreadsheet.
///
/// Each response is a list of `(course, category, rank)` triples. The builder
/// generates one column per distinct `(course, category)` pair, with headers
/// following the layout expected by the header parser.
///
/// ```
/// use course_ranking::builder::Builder;
/// # use course_ranking::RankingErrors;
///
/// let mut builder = Builder::new("CORE");
/// builder.add_response(&[("Audit", "Most Beneficial", 1.0), ("Tax", "Neutral", 1.0)]);
/// builder.add_response(&[("Tax", "Most Beneficial", 1.0)]);
///
/// let result = builder.aggregate()?;
/// assert_eq!(result.courses[0].course, "Audit");
/// assert_eq!(result.courses[1].course, "Tax");
/// assert_eq!(result.courses[1].average_rank, 1.5);
///
/// # Ok::<(), RankingErrors>(())
/// ```
pub struct Builder {
    pub rules: SurveyRules,
    course_type: String,
    columns: Vec<(String, String)>,
    responses: Vec<Vec<(usize, f64)>>,
}

impl Builder {
    pub fn new(course_type: &str) -> Builder {
        Builder {
            rules: SurveyRules::default(),
            course_type: course_type.to_string(),
            columns: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Returns the position of the column for this course and category,
    /// creating it if needed.
    ///
    /// Columns are otherwise created in the order the responses mention them.
    pub fn column(&mut self, course: &str, category: &str) -> usize {
        let key = (course.to_string(), category.to_string());
        match self.columns.iter().position(|c| *c == key) {
            Some(idx) => idx,
            None => {
                self.columns.push(key);
                self.columns.len() - 1
            }
        }
    }

    /// Adds one response.
    pub fn add_response(&mut self, ratings: &[(&str, &str, f64)]) {
        let mut answers: Vec<(usize, f64)> = Vec::new();
        for (course, category, rank) in ratings {
            let column = self.column(course, category);
            answers.push((column, *rank));
        }
        self.responses.push(answers);
    }

    fn header(&self, course: &str, category: &str) -> String {
        let marker = self
            .rules
            .course_types
            .iter()
            .find(|ct| ct.name == self.course_type)
            .map(|ct| ct.marker.clone())
            .unwrap_or_else(|| self.course_type.clone());
        format!(
            "{}{}{}{}{}{}",
            marker,
            self.rules.ranking_marker,
            category,
            self.rules.segment_delimiter,
            course,
            self.rules.rank_field_marker
        )
    }

    /// The header and the rows, as they would be read from a spreadsheet.
    pub fn table(&self) -> (Vec<String>, Vec<RespondentRow>) {
        let headers: Vec<String> = self
            .columns
            .iter()
            .map(|(course, category)| self.header(course, category))
            .collect();
        let rows: Vec<RespondentRow> = self
            .responses
            .iter()
            .enumerate()
            .map(|(idx, answers)| {
                let mut cells = vec![Answer::Blank; headers.len()];
                for (column, rank) in answers {
                    cells[*column] = Answer::Rank(*rank);
                }
                RespondentRow {
                    id: Some(format!("response-{:04}", idx + 1)),
                    answers: cells,
                }
            })
            .collect();
        (headers, rows)
    }

    pub fn aggregate(&self) -> Result<RankingResult, RankingErrors> {
        let (headers, rows) = self.table();
        let metadata = parse_headers(&headers, &self.rules);
        aggregate(&rows, &metadata, &self.course_type, &self.rules)
    }
}
