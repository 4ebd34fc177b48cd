use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

use crate::config::*;

// One rated course for one respondent, before the global ordering.
#[derive(PartialEq, Debug, Clone)]
struct StudentRating<'a> {
    course: &'a str,
    priority: u32,
    rank: f64,
}

// Ranks in the order the courses were first seen.
#[derive(Debug, Default)]
struct RankAccumulator {
    positions: HashMap<String, usize>,
    ranks: Vec<(String, Vec<u32>)>,
}

impl RankAccumulator {
    fn push(&mut self, course: &str, global_rank: u32) {
        let idx = match self.positions.get(course) {
            Some(idx) => *idx,
            None => {
                self.ranks.push((course.to_string(), Vec::new()));
                self.positions
                    .insert(course.to_string(), self.ranks.len() - 1);
                self.ranks.len() - 1
            }
        };
        self.ranks[idx].1.push(global_rank);
    }

    fn finish(self) -> Vec<CourseRank> {
        let mut res: Vec<CourseRank> = self
            .ranks
            .into_iter()
            .filter(|(_, ranks)| !ranks.is_empty())
            .map(|(course, ranks)| {
                let total: u64 = ranks.iter().map(|r| *r as u64).sum();
                CourseRank {
                    course,
                    average_rank: total as f64 / ranks.len() as f64,
                    count: ranks.len(),
                }
            })
            .collect();
        // Stable: equal averages keep the first-seen order.
        res.sort_by(|a, b| a.average_rank.total_cmp(&b.average_rank));
        res
    }
}

/// Merges the ratings of one respondent into a single ordering.
///
/// Courses are sorted by category priority first, then by the rank given inside
/// the category. The sort is stable: complete ties keep the column order.
/// Returns the courses with their 1-based global rank.
pub fn global_ranks(ratings: &[(String, u32, f64)]) -> Vec<(String, u32)> {
    let mut sorted: Vec<StudentRating> = ratings
        .iter()
        .map(|(course, priority, rank)| StudentRating {
            course: course.as_str(),
            priority: *priority,
            rank: *rank,
        })
        .collect();
    sort_ratings(&mut sorted);
    sorted
        .iter()
        .enumerate()
        .map(|(idx, r)| (r.course.to_string(), (idx + 1) as u32))
        .collect()
}

fn sort_ratings(ratings: &mut [StudentRating]) {
    ratings.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.rank.total_cmp(&b.rank))
    });
}

/// Computes the average global rank of every course of the given type.
///
/// Arguments:
/// * `rows` the survey responses. Their order does not change the averages.
/// * `metadata` the columns recognized by the header parser
/// * `course_type` only the columns of this type are considered
/// * `rules` the category priorities and the policy for duplicated courses
///
/// A course type without any column returns an empty result. A category
/// that is neither skipped nor has a priority is an error: the header rules
/// and the ranking rules disagree.
pub fn aggregate(
    rows: &[RespondentRow],
    metadata: &HeaderMetadata,
    course_type: &str,
    rules: &SurveyRules,
) -> Result<RankingResult, RankingErrors> {
    // Resolve the priorities once, before looking at any answer.
    let mut columns: Vec<(&ColumnEntry, u32)> = Vec::new();
    for entry in metadata.for_course_type(course_type) {
        if rules.is_skipped(&entry.meta.category) {
            continue;
        }
        let priority = rules.category_priority(&entry.meta.category).ok_or_else(|| {
            RankingErrors::UnrankedCategory {
                course_type: course_type.to_string(),
                category: entry.meta.category.clone(),
            }
        })?;
        columns.push((entry, priority));
    }
    info!(
        "aggregate: course type {}: {} ranked columns, {} respondents",
        course_type,
        columns.len(),
        rows.len()
    );

    let mut acc = RankAccumulator::default();
    let mut respondents: usize = 0;
    let mut rejected: usize = 0;
    let mut ignored: usize = 0;

    for (row_idx, row) in rows.iter().enumerate() {
        let row_name = row.id.clone().unwrap_or_else(|| format!("row {}", row_idx + 1));
        let mut ratings: Vec<StudentRating> = Vec::new();
        for (entry, priority) in columns.iter() {
            match row.answer(entry.column) {
                Answer::Blank => {}
                Answer::Rank(r) if r.is_nan() => {}
                Answer::Rank(r) => ratings.push(StudentRating {
                    course: entry.meta.course.as_str(),
                    priority: *priority,
                    rank: *r,
                }),
                Answer::Text(s) => {
                    warn!(
                        "aggregate: {}: ignoring non-numeric rank {:?} in column {:?}",
                        row_name, s, entry.header
                    );
                    ignored += 1;
                }
            }
        }
        if ratings.is_empty() {
            continue;
        }

        sort_ratings(&mut ratings);

        let duplicates = duplicated_courses(&ratings);
        if !duplicates.is_empty() {
            match rules.duplicate_course_mode {
                DuplicateCourseMode::Reject => {
                    warn!(
                        "aggregate: {}: courses rated more than once, ignoring this response for {}: {:?}",
                        row_name, course_type, duplicates
                    );
                    rejected += 1;
                    continue;
                }
                DuplicateCourseMode::KeepBest => {
                    debug!(
                        "aggregate: {}: keeping the best rating for {:?}",
                        row_name, duplicates
                    );
                    let mut seen: HashSet<&str> = HashSet::new();
                    ratings.retain(|r| seen.insert(r.course));
                }
                DuplicateCourseMode::KeepAll => {}
            }
        }

        debug!("aggregate: {}: ordering {:?}", row_name, ratings);
        respondents += 1;
        for (idx, r) in ratings.iter().enumerate() {
            acc.push(r.course, (idx + 1) as u32);
        }
    }

    let courses = acc.finish();
    debug!("aggregate: course type {}: {:?}", course_type, courses);
    Ok(RankingResult {
        course_type: course_type.to_string(),
        courses,
        respondents,
        rejected_respondents: rejected,
        ignored_answers: ignored,
    })
}

fn duplicated_courses<'a>(ratings: &[StudentRating<'a>]) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<&str> = Vec::new();
    for r in ratings {
        if !seen.insert(r.course) && !res.contains(&r.course) {
            res.push(r.course);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::header::parse_headers;
    use proptest::prelude::*;

    fn test_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ranks_of(res: &RankingResult) -> Vec<(String, f64, usize)> {
        res.courses
            .iter()
            .map(|c| (c.course.clone(), c.average_rank, c.count))
            .collect()
    }

    #[test]
    fn global_ranks_category_dominates() {
        let ratings = vec![
            ("A".to_string(), 1, 2.0),
            ("B".to_string(), 1, 1.0),
            ("C".to_string(), 2, 1.0),
        ];
        assert_eq!(
            global_ranks(&ratings),
            vec![
                ("B".to_string(), 1),
                ("A".to_string(), 2),
                ("C".to_string(), 3)
            ]
        );
    }

    #[test]
    fn global_ranks_ties_keep_column_order() {
        let ratings = vec![
            ("X".to_string(), 2, 1.0),
            ("Y".to_string(), 2, 1.0),
            ("Z".to_string(), 1, 5.0),
        ];
        let names: Vec<String> = global_ranks(&ratings).into_iter().map(|p| p.0).collect();
        assert_eq!(names, vec!["Z", "X", "Y"]);
    }

    #[test]
    fn simple_average() {
        test_init();
        let mut b = Builder::new("CORE");
        b.add_response(&[("A", "Most Beneficial", 2.0), ("B", "Most Beneficial", 1.0), ("C", "Neutral", 1.0)]);
        b.add_response(&[("A", "Most Beneficial", 1.0), ("C", "Least Beneficial", 1.0)]);
        let res = b.aggregate().unwrap();
        assert_eq!(
            ranks_of(&res),
            vec![
                ("B".to_string(), 1.0, 1),
                ("A".to_string(), 1.5, 2),
                ("C".to_string(), 2.5, 2)
            ]
        );
        assert_eq!(res.respondents, 2);
        assert_eq!(res.rejected_respondents, 0);
    }

    #[test]
    fn did_not_take_is_ignored() {
        let mut b = Builder::new("CORE");
        b.add_response(&[("A", "Did not take", 1.0), ("B", "Least Beneficial", 4.0)]);
        let res = b.aggregate().unwrap();
        assert_eq!(ranks_of(&res), vec![("B".to_string(), 1.0, 1)]);
    }

    #[test]
    fn blank_and_text_answers() {
        test_init();
        let rules = SurveyRules::default();
        let headers = vec![
            "MAcc CORE courses - Ranks - Most Beneficial - A - Rank".to_string(),
            "MAcc CORE courses - Ranks - Neutral - B - Rank".to_string(),
            "MAcc CORE courses - Ranks - Neutral - C - Rank".to_string(),
        ];
        let md = parse_headers(&headers, &rules);
        let rows = vec![
            RespondentRow {
                id: Some("r1".to_string()),
                answers: vec![Answer::Blank, Answer::Text("n/a".to_string()), Answer::Rank(3.0)],
            },
            // Shorter than the header
            RespondentRow {
                id: None,
                answers: vec![Answer::Rank(1.0)],
            },
            RespondentRow {
                id: None,
                answers: vec![],
            },
        ];
        let res = aggregate(&rows, &md, "CORE", &rules).unwrap();
        assert_eq!(
            ranks_of(&res),
            vec![("C".to_string(), 1.0, 1), ("A".to_string(), 1.0, 1)]
        );
        assert_eq!(res.respondents, 2);
        assert_eq!(res.ignored_answers, 1);
    }

    #[test]
    fn unknown_course_type_is_empty() {
        let mut b = Builder::new("CORE");
        b.add_response(&[("A", "Neutral", 1.0)]);
        let rules = SurveyRules::default();
        let (headers, rows) = b.table();
        let md = parse_headers(&headers, &rules);
        let res = aggregate(&rows, &md, "ELECTIVE", &rules).unwrap();
        assert!(res.is_empty());
        assert_eq!(res.respondents, 0);
    }

    #[test]
    fn unranked_category_is_an_error() {
        let mut rules = SurveyRules::default();
        rules.categories.push("Essential".to_string());
        let headers = vec!["MAcc Elective courses - Ranks - Essential - Tax - Rank".to_string()];
        let md = parse_headers(&headers, &rules);
        assert_eq!(md.len(), 1);
        let res = aggregate(&[], &md, "ELECTIVE", &rules);
        assert_eq!(
            res,
            Err(RankingErrors::UnrankedCategory {
                course_type: "ELECTIVE".to_string(),
                category: "Essential".to_string()
            })
        );
        // The other course types are not affected.
        assert!(aggregate(&[], &md, "CORE", &rules).is_ok());
    }

    fn duplicate_builder(mode: DuplicateCourseMode) -> Builder {
        let mut b = Builder::new("CORE");
        b.rules.duplicate_course_mode = mode;
        b.add_response(&[("A", "Neutral", 1.0), ("A", "Most Beneficial", 1.0), ("B", "Neutral", 2.0)]);
        b.add_response(&[("A", "Neutral", 1.0), ("B", "Neutral", 2.0)]);
        b
    }

    #[test]
    fn duplicate_course_reject() {
        let res = duplicate_builder(DuplicateCourseMode::Reject).aggregate().unwrap();
        assert_eq!(
            ranks_of(&res),
            vec![("A".to_string(), 1.0, 1), ("B".to_string(), 2.0, 1)]
        );
        assert_eq!(res.rejected_respondents, 1);
        assert_eq!(res.respondents, 1);
    }

    #[test]
    fn duplicate_course_keep_best() {
        let res = duplicate_builder(DuplicateCourseMode::KeepBest).aggregate().unwrap();
        assert_eq!(
            ranks_of(&res),
            vec![("A".to_string(), 1.0, 2), ("B".to_string(), 2.0, 2)]
        );
    }

    #[test]
    fn duplicate_course_keep_all() {
        let res = duplicate_builder(DuplicateCourseMode::KeepAll).aggregate().unwrap();
        // First response: A(MB)=1, A(N)=2, B=3
        assert_eq!(
            ranks_of(&res),
            vec![("A".to_string(), 4.0 / 3.0, 3), ("B".to_string(), 2.5, 2)]
        );
    }

    #[test]
    fn equal_averages_keep_first_seen_order() {
        let mut b = Builder::new("CORE");
        b.add_response(&[("B", "Neutral", 1.0)]);
        b.add_response(&[("A", "Neutral", 1.0)]);
        let res = b.aggregate().unwrap();
        let names: Vec<&str> = res.courses.iter().map(|c| c.course.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    // ******** Properties *********

    const COURSES: [&str; 5] = ["A", "B", "C", "D", "E"];
    const CATEGORIES: [&str; 4] = [MOST_BENEFICIAL, NEUTRAL, LEAST_BENEFICIAL, DID_NOT_TAKE];

    // One response: for each course, an optional (category index, rank).
    fn response_strategy() -> impl Strategy<Value = Vec<Option<(usize, u8)>>> {
        prop::collection::vec(prop::option::of((0usize..4, 1u8..6)), COURSES.len())
    }

    // The columns do not depend on the order of the responses, like in a real survey.
    fn build(responses: &[Vec<Option<(usize, u8)>>]) -> Builder {
        let mut b = Builder::new("CORE");
        for course in COURSES {
            for category in CATEGORIES {
                b.column(course, category);
            }
        }
        for resp in responses {
            let answers: Vec<(&str, &str, f64)> = resp
                .iter()
                .enumerate()
                .filter_map(|(i, a)| a.map(|(cat, rank)| (COURSES[i], CATEGORIES[cat], rank as f64)))
                .collect();
            b.add_response(&answers);
        }
        b
    }

    fn ratings_of(resp: &[Option<(usize, u8)>]) -> Vec<(String, u32, f64)> {
        resp.iter()
            .enumerate()
            .filter_map(|(i, a)| match a {
                Some((cat, rank)) if *cat < 3 => {
                    Some((COURSES[i].to_string(), (*cat + 1) as u32, *rank as f64))
                }
                _ => None,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn global_ranks_are_a_permutation(resp in response_strategy()) {
            let ratings = ratings_of(&resp);
            let mut ranks: Vec<u32> = global_ranks(&ratings).into_iter().map(|p| p.1).collect();
            ranks.sort();
            let expected: Vec<u32> = (1..=ratings.len() as u32).collect();
            prop_assert_eq!(ranks, expected);
        }

        #[test]
        fn category_priority_is_respected(resp in response_strategy()) {
            let ratings = ratings_of(&resp);
            let ranks: HashMap<String, u32> = global_ranks(&ratings).into_iter().collect();
            for (c1, p1, _) in ratings.iter() {
                for (c2, p2, _) in ratings.iter() {
                    if p1 < p2 {
                        prop_assert!(ranks[c1] < ranks[c2]);
                    }
                }
            }
        }

        #[test]
        fn single_rating_average_is_the_global_rank(resp in response_strategy()) {
            let res = build(&[resp.clone()]).aggregate().unwrap();
            let ranks: HashMap<String, u32> = global_ranks(&ratings_of(&resp)).into_iter().collect();
            for c in res.courses.iter() {
                prop_assert_eq!(c.count, 1);
                prop_assert_eq!(c.average_rank, ranks[&c.course] as f64);
            }
        }

        #[test]
        fn order_independent(responses in prop::collection::vec(response_strategy(), 0..8)) {
            let forward = build(&responses).aggregate().unwrap();
            let mut reversed = responses.clone();
            reversed.reverse();
            let backward = build(&reversed).aggregate().unwrap();
            let as_map = |r: &RankingResult| -> HashMap<String, (u64, usize)> {
                r.courses
                    .iter()
                    .map(|c| (c.course.clone(), (c.average_rank.to_bits(), c.count)))
                    .collect()
            };
            prop_assert_eq!(as_map(&forward), as_map(&backward));
            prop_assert_eq!(forward.respondents, backward.respondents);
        }

        #[test]
        fn deterministic(responses in prop::collection::vec(response_strategy(), 0..8)) {
            let b = build(&responses);
            prop_assert_eq!(b.aggregate().unwrap(), b.aggregate().unwrap());
        }
    }
}
