/*!
Average course rankings from survey responses.

Respondents sort courses into qualitative buckets (`Most Beneficial`,
`Neutral`, `Least Beneficial`, `Did not take`) and rank the courses inside
each bucket. This crate recovers the structure of the survey from the column
headers, merges the buckets and the ranks of every respondent into one
ordering, and averages the resulting positions over all the respondents.

```
use course_ranking::*;

let rules = SurveyRules::default();
let headers = vec![
    "Rank the MAcc CORE courses - Ranks - Most Beneficial - Audit - Rank".to_string(),
    "Rank the MAcc CORE courses - Ranks - Neutral - Tax - Rank".to_string(),
];
let metadata = parse_headers(&headers, &rules);
let rows = vec![RespondentRow {
    id: None,
    answers: vec![Answer::Rank(3.0), Answer::Rank(1.0)],
}];
let result = aggregate(&rows, &metadata, "CORE", &rules)?;
assert_eq!(result.courses[0].course, "Audit");
assert_eq!(result.courses[1].average_rank, 2.0);
# Ok::<(), RankingErrors>(())
```
*/
mod config;
mod header;
mod ranking;

pub mod builder;

pub use crate::config::*;
pub use crate::header::{match_header, parse_headers, HeaderMatch, Unmatched};
pub use crate::ranking::{aggregate, global_ranks};
