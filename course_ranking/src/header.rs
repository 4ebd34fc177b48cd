use log::{debug, log, Level};

use crate::config::*;

/// Why a header was not accepted as a ranking column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Unmatched {
    /// None of the course type markers is present. Most likely a column that is
    /// not about courses at all (timestamp, respondent id, ...).
    NoCourseType,
    AmbiguousCourseType(Vec<String>),
    MissingRankingMarker,
    AmbiguousRankingMarker,
    /// Another kind of question about the course, not the numeric rank.
    MissingRankField,
    MissingCategory,
    AmbiguousCategory(Vec<String>),
    EmptyCourseName,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum HeaderMatch {
    Matched(ColumnMeta),
    Unmatched(Unmatched),
}

/// Matches a single header against the rules.
///
/// The expected layout is:
/// `<text with type marker><ranking marker><category><delimiter><course><rank field marker>`
/// Every marker must appear exactly once, otherwise the header is rejected.
/// The course name is kept as written between the category segment and the
/// rank field marker. A name made only of whitespace is rejected.
pub fn match_header(header: &str, rules: &SurveyRules) -> HeaderMatch {
    use HeaderMatch::Unmatched as U;

    let types: Vec<&CourseTypeRule> = rules
        .course_types
        .iter()
        .filter(|ct| header.contains(ct.marker.as_str()))
        .collect();
    let course_type = match types.as_slice() {
        [] => return U(Unmatched::NoCourseType),
        [ct] => ct.name.clone(),
        _ => {
            return U(Unmatched::AmbiguousCourseType(
                types.iter().map(|ct| ct.name.clone()).collect(),
            ))
        }
    };

    let body = match header.strip_suffix(rules.rank_field_marker.as_str()) {
        Some(b) => b,
        None => return U(Unmatched::MissingRankField),
    };

    let mut splits = body.match_indices(rules.ranking_marker.as_str());
    let start = match (splits.next(), splits.next()) {
        (None, _) => return U(Unmatched::MissingRankingMarker),
        (Some((idx, m)), None) => idx + m.len(),
        (Some(_), Some(_)) => return U(Unmatched::AmbiguousRankingMarker),
    };
    let tail = &body[start..];

    // The category is the segment right after the ranking marker.
    let candidates: Vec<(&String, &str)> = rules
        .categories
        .iter()
        .filter_map(|cat| {
            tail.strip_prefix(cat.as_str())
                .and_then(|rest| rest.strip_prefix(rules.segment_delimiter.as_str()))
                .map(|course| (cat, course))
        })
        .collect();
    let (category, course) = match candidates.as_slice() {
        [] => return U(Unmatched::MissingCategory),
        [(cat, course)] => ((*cat).clone(), *course),
        _ => {
            return U(Unmatched::AmbiguousCategory(
                candidates.iter().map(|(c, _)| (*c).clone()).collect(),
            ))
        }
    };

    if course.trim().is_empty() {
        return U(Unmatched::EmptyCourseName);
    }

    HeaderMatch::Matched(ColumnMeta {
        course_type,
        category,
        course: course.to_string(),
    })
}

// Columns without any course type are other survey questions: only a
// course column that fails to parse deserves a warning.
fn skip_level(reason: &Unmatched) -> Level {
    match reason {
        Unmatched::NoCourseType => Level::Debug,
        _ => Level::Warn,
    }
}

/// Builds the metadata for all the columns of a dataset.
///
/// Columns that cannot be understood are dropped. This is expected: surveys
/// carry plenty of other questions.
pub fn parse_headers<S: AsRef<str>>(headers: &[S], rules: &SurveyRules) -> HeaderMetadata {
    let mut entries: Vec<ColumnEntry> = Vec::new();
    for (column, h) in headers.iter().enumerate() {
        let header = h.as_ref();
        match match_header(header, rules) {
            HeaderMatch::Matched(meta) => {
                debug!("parse_headers: column {}: {:?}", column, meta);
                entries.push(ColumnEntry {
                    column,
                    header: header.to_string(),
                    meta,
                });
            }
            HeaderMatch::Unmatched(reason) => {
                log!(
                    skip_level(&reason),
                    "Skipping column {} {:?}: could not parse header: {:?}",
                    column,
                    header,
                    reason
                );
            }
        }
    }
    HeaderMetadata { entries }
}
