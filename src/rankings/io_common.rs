use std::path::Path;

use course_ranking::{Answer, CourseRank};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Respondent ids are made of the file name and the line in the file.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Interprets the text content of a cell.
pub fn parse_answer(s: &str) -> Answer {
    let t = s.trim();
    if t.is_empty() {
        return Answer::Blank;
    }
    match t.parse::<f64>() {
        // Spreadsheet exports write missing values as NaN.
        Ok(x) if x.is_nan() => Answer::Blank,
        Ok(x) if x.is_finite() => Answer::Rank(x),
        _ => Answer::Text(s.to_string()),
    }
}

/// Formats the rankings as an aligned text table, for the console.
pub fn format_table(courses: &[CourseRank]) -> String {
    if courses.is_empty() {
        return "Empty table: no course was rated".to_string();
    }
    let headers = ["Course", "Average Rank", "Count"];
    let cells: Vec<[String; 3]> = courses
        .iter()
        .map(|c| {
            [
                c.course.clone(),
                format!("{:.6}", c.average_rank),
                c.count.to_string(),
            ]
        })
        .collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in cells.iter() {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{:<w0$}  {:>w1$}  {:>w2$}",
        headers[0],
        headers[1],
        headers[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    ));
    for row in cells.iter() {
        lines.push(format!(
            "{:<w0$}  {:>w1$}  {:>w2$}",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        ));
    }
    lines.join("\n")
}
