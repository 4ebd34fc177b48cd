// Primitives for reading and writing CSV files.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;

use crate::rankings::{
    io_common::{make_default_id, parse_answer},
    *,
};

pub fn read_csv_table(path: &str) -> RankingsResult<SurveyTable> {
    let default_id = make_default_id(path);
    let rdr = ReaderBuilder::new()
        .has_headers(false)
        // Trailing empty cells are sometimes dropped by the exporting tools.
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let headers: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { path, lineno: 1usize })?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => return EmptyInputSnafu { path }.fail(),
    };
    debug!("read_csv_table: header: {:?}", headers);

    let mut rows: Vec<RespondentRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, line);
        rows.push(RespondentRow {
            id: Some(default_id(lineno)),
            answers: line.iter().map(parse_answer).collect(),
        });
    }
    Ok(SurveyTable { headers, rows })
}

#[derive(Debug, Serialize)]
struct RankingRecord<'a> {
    #[serde(rename = "Course")]
    course: &'a str,
    #[serde(rename = "Average Rank")]
    average_rank: f64,
    #[serde(rename = "Count")]
    count: usize,
}

const TABLE_HEADER: [&str; 3] = ["Course", "Average Rank", "Count"];

/// Writes the rankings, best course first. The header is always written,
/// even when no course was rated.
pub fn write_rankings(path: &Path, courses: &[CourseRank]) -> RankingsResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(CsvWriteSnafu { path: path_s.clone() })?;
    wtr.write_record(TABLE_HEADER)
        .context(CsvWriteSnafu { path: path_s.clone() })?;
    for c in courses {
        let record = RankingRecord {
            course: c.course.as_str(),
            average_rank: c.average_rank,
            count: c.count,
        };
        wtr.serialize(record)
            .context(CsvWriteSnafu { path: path_s.clone() })?;
    }
    wtr.flush().context(FileIoSnafu { path: path_s })?;
    Ok(())
}
