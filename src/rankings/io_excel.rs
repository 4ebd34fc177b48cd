use calamine::{open_workbook_auto, DataType, Reader};

use crate::rankings::{
    io_common::{make_default_id, parse_answer},
    *,
};

pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> RankingsResult<SurveyTable> {
    let default_id = make_default_id(path);
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyInputSnafu { path })?;
    let headers: Vec<String> = header.iter().map(read_header_cell).collect();
    debug!("read_excel_table: header: {:?}", headers);

    let mut rows: Vec<RespondentRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The first row is the header, and the rows start at 1 in spreadsheets.
        let lineno = idx + 2;
        debug!("read_excel_table: lineno: {:?} row: {:?}", lineno, row);
        rows.push(RespondentRow {
            id: Some(default_id(lineno)),
            answers: row.iter().map(read_answer).collect(),
        });
    }
    Ok(SurveyTable { headers, rows })
}

// The workbook format (xlsx, xlsb, xls, ods) is picked from the file extension.
fn get_range(path: &str, worksheet_name: Option<&str>) -> RankingsResult<calamine::Range<DataType>> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    debug!(
        "read_excel_table: path: {:?} worksheets: {:?}",
        path,
        workbook.sheet_names()
    );
    match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path }),
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyInputSnafu { path })?
            .context(OpeningExcelSnafu { path }),
    }
}

fn read_header_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => "".to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        x => format!("{:?}", x),
    }
}

fn read_answer(cell: &DataType) -> Answer {
    match cell {
        DataType::Empty => Answer::Blank,
        DataType::Float(f) if f.is_nan() => Answer::Blank,
        DataType::Float(f) => Answer::Rank(*f),
        DataType::Int(i) => Answer::Rank(*i as f64),
        DataType::String(s) => parse_answer(s),
        x => Answer::Text(format!("{:?}", x)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_answer(&DataType::Empty), Answer::Blank);
        assert_eq!(read_answer(&DataType::Float(2.0)), Answer::Rank(2.0));
        assert_eq!(read_answer(&DataType::Int(4)), Answer::Rank(4.0));
        assert_eq!(read_answer(&DataType::String("1".to_string())), Answer::Rank(1.0));
        assert_eq!(read_answer(&DataType::String(" ".to_string())), Answer::Blank);
        assert!(matches!(read_answer(&DataType::Bool(true)), Answer::Text(_)));
    }

    #[test]
    fn header_cells() {
        assert_eq!(read_header_cell(&DataType::String("Q1".to_string())), "Q1");
        assert_eq!(read_header_cell(&DataType::Empty), "");
        assert_eq!(read_header_cell(&DataType::Int(2024)), "2024");
    }

    fn fixture() -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/data/survey.xlsx")
            .display()
            .to_string()
    }

    #[test]
    fn read_first_worksheet() {
        let table = read_excel_table(&fixture(), None).unwrap();
        assert_eq!(
            table.headers,
            vec![
                "Timestamp",
                "MAcc CORE courses - Ranks - Most Beneficial - Audit - Rank",
                "MAcc CORE courses - Ranks - Most Beneficial - Tax - Rank",
                "MAcc CORE courses - Ranks - Neutral - Ethics - Rank",
                "MAcc Elective courses - Ranks - Neutral - Tax Research - Rank",
            ]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].id, Some("survey.xlsx-00000002".to_string()));
        assert_eq!(
            table.rows[0].answers,
            vec![
                Answer::Text("2024-01-01".to_string()),
                Answer::Rank(2.0),
                Answer::Rank(1.0),
                Answer::Rank(1.0),
                // Stored as text in the workbook.
                Answer::Rank(1.0),
            ]
        );
        assert_eq!(table.rows[1].id, Some("survey.xlsx-00000003".to_string()));
        assert_eq!(
            table.rows[1].answers,
            vec![
                Answer::Text("2024-01-02".to_string()),
                Answer::Rank(1.0),
                Answer::Blank,
                Answer::Text("n/a".to_string()),
                Answer::Rank(2.0),
            ]
        );
    }

    #[test]
    fn read_named_worksheet() {
        let table = read_excel_table(&fixture(), Some("Other")).unwrap();
        assert_eq!(table.headers, vec!["Notes"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].answer(0), &Answer::Text("x".to_string()));

        let first = read_excel_table(&fixture(), Some("Responses")).unwrap();
        assert_eq!(first.headers.len(), 5);
    }

    #[test]
    fn missing_worksheet() {
        let res = read_excel_table(&fixture(), Some("Form1"));
        assert!(matches!(
            res,
            Err(RankingsError::MissingWorksheet { ref name, .. }) if name == "Form1"
        ));
    }

    #[test]
    fn unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, "this is not a zip archive").unwrap();
        let res = read_excel_table(&path.display().to_string(), None);
        assert!(matches!(res, Err(RankingsError::OpeningExcel { .. })));
    }

    #[test]
    fn other_workbook_formats_are_opened() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["data.xls", "data.xlsb", "data.ods"] {
            let path = dir.path().join(name);
            fs::write(&path, "not a workbook").unwrap();
            let res = read_excel_table(&path.display().to_string(), None);
            assert!(
                matches!(res, Err(RankingsError::OpeningExcel { .. })),
                "{}: {:?}",
                name,
                res
            );
        }
    }
}
