use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{
    CourseDirectory, CourseRankEntry, DescriptiveStats, GradeDistribution, GradeRecord,
    StatisticsSnapshot, StudentDirectory, StudentRankEntry, StudentSummary, Totals, letter_grade,
};

const PASSING_SCORE: f64 = 60.0;

/// Mean, median, min, max and population standard deviation over a score
/// batch. An empty batch yields `count == 0` with every other field `None`.
pub fn descriptive_stats(scores: &[f64]) -> DescriptiveStats {
    if scores.is_empty() {
        return DescriptiveStats {
            count: 0,
            mean: None,
            median: None,
            min: None,
            max: None,
            stddev: None,
        };
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;

    DescriptiveStats {
        count,
        mean: Some(mean),
        median: Some(median),
        min: Some(sorted[0]),
        max: Some(sorted[count - 1]),
        stddev: Some(variance.sqrt()),
    }
}

/// Buckets every record into one letter band. Range validation is the
/// caller's job: 150 lands in A, -5 lands in F.
pub fn grade_distribution(records: &[GradeRecord]) -> GradeDistribution {
    let mut distribution = GradeDistribution::default();
    for record in records {
        match letter_grade(record.numeric_score) {
            "A" => distribution.grade_a += 1,
            "B" => distribution.grade_b += 1,
            "C" => distribution.grade_c += 1,
            "D" => distribution.grade_d += 1,
            _ => distribution.grade_f += 1,
        }
    }
    distribution
}

/// Top students by average score, descending, truncated to `limit`.
/// Records without a student id cannot be attributed and are skipped.
/// Ties on average are broken by student id ascending so the leaderboard
/// is reproducible across runs.
pub fn rank_students(
    records: &[GradeRecord],
    students: &StudentDirectory,
    limit: usize,
) -> Vec<StudentRankEntry> {
    let mut groups: HashMap<Uuid, (f64, usize)> = HashMap::new();
    for record in records {
        let Some(student_id) = record.student_id else {
            continue;
        };
        let entry = groups.entry(student_id).or_insert((0.0, 0));
        entry.0 += record.numeric_score;
        entry.1 += 1;
    }

    let mut ranked: Vec<StudentRankEntry> = groups
        .into_iter()
        .map(|(student_id, (total, count))| StudentRankEntry {
            student_id,
            student_name: students
                .get(&student_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            average_score: total / count as f64,
            grade_count: count,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Full course ranking by average score, descending, with a distinct
/// enrolled-student count per course. Same tie-break discipline as
/// [`rank_students`], keyed on course id.
pub fn rank_courses(records: &[GradeRecord], courses: &CourseDirectory) -> Vec<CourseRankEntry> {
    let mut groups: HashMap<Uuid, (f64, usize, HashSet<Uuid>)> = HashMap::new();
    for record in records {
        let Some(course_id) = record.course_id else {
            continue;
        };
        let entry = groups.entry(course_id).or_insert((0.0, 0, HashSet::new()));
        entry.0 += record.numeric_score;
        entry.1 += 1;
        if let Some(student_id) = record.student_id {
            entry.2.insert(student_id);
        }
    }

    let mut ranked: Vec<CourseRankEntry> = groups
        .into_iter()
        .map(|(course_id, (total, count, students))| {
            let (course_name, course_code) = match courses.get(&course_id) {
                Some(info) => (info.name.clone(), info.code.clone()),
                None => ("Unknown".to_string(), "Unknown".to_string()),
            };
            CourseRankEntry {
                course_id,
                course_name,
                course_code,
                average_score: total / count as f64,
                distinct_students: students.len(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.course_id.cmp(&b.course_id))
    });
    ranked
}

/// Roll-up for one student. A student with no records gets `None` for
/// average/highest/lowest and zero counts, never an error.
pub fn summarize_student(records: &[GradeRecord], student_id: Uuid) -> StudentSummary {
    let scores: Vec<f64> = records
        .iter()
        .filter(|r| r.student_id == Some(student_id))
        .map(|r| r.numeric_score)
        .collect();

    if scores.is_empty() {
        return StudentSummary {
            average: None,
            highest: None,
            lowest: None,
            total_grades: 0,
            passing: 0,
            failing: 0,
        };
    }

    let passing = scores.iter().filter(|s| **s >= PASSING_SCORE).count();
    StudentSummary {
        average: Some(scores.iter().sum::<f64>() / scores.len() as f64),
        highest: Some(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        lowest: Some(scores.iter().copied().fold(f64::INFINITY, f64::min)),
        total_grades: scores.len(),
        passing,
        failing: scores.len() - passing,
    }
}

/// Assembles the overall statistics view from one grade batch. Pure
/// orchestration: the externally supplied totals pass through untouched.
pub fn build_snapshot(
    records: &[GradeRecord],
    totals: Totals,
    students: &StudentDirectory,
    courses: &CourseDirectory,
    limit: usize,
) -> StatisticsSnapshot {
    let scores: Vec<f64> = records.iter().map(|r| r.numeric_score).collect();

    StatisticsSnapshot {
        totals,
        stats: descriptive_stats(&scores),
        distribution: grade_distribution(records),
        top_students: rank_students(records, students, limit),
        course_performance: rank_courses(records, courses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseInfo;
    use chrono::NaiveDate;

    fn grade(student_id: Option<Uuid>, course_id: Option<Uuid>, score: f64) -> GradeRecord {
        GradeRecord {
            student_id,
            course_id,
            numeric_score: score,
            assessment: "Midterm".to_string(),
            graded_on: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        }
    }

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn descriptive_stats_match_known_values() {
        let stats = descriptive_stats(&[100.0, 80.0, 60.0]);
        assert_eq!(stats.count, 3);
        assert!((stats.mean.unwrap() - 80.0).abs() < 0.001);
        assert!((stats.median.unwrap() - 80.0).abs() < 0.001);
        assert_eq!(stats.min, Some(60.0));
        assert_eq!(stats.max, Some(100.0));
        let expected_stddev = (800.0f64 / 3.0).sqrt();
        assert!((stats.stddev.unwrap() - expected_stddev).abs() < 0.001);
    }

    #[test]
    fn even_length_median_averages_the_middle_two() {
        let stats = descriptive_stats(&[70.0, 90.0]);
        assert!((stats.median.unwrap() - 80.0).abs() < 0.001);
    }

    #[test]
    fn empty_batch_leaves_all_fields_absent() {
        let stats = descriptive_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_none());
        assert!(stats.median.is_none());
        assert!(stats.min.is_none());
        assert!(stats.max.is_none());
        assert!(stats.stddev.is_none());
    }

    #[test]
    fn mean_and_median_stay_within_extrema() {
        let batches = [
            vec![55.0, 91.5, 73.0, 60.0],
            vec![100.0],
            vec![12.0, 12.0, 99.0],
        ];
        for scores in batches {
            let stats = descriptive_stats(&scores);
            let (min, max) = (stats.min.unwrap(), stats.max.unwrap());
            assert!(min <= stats.median.unwrap() && stats.median.unwrap() <= max);
            assert!(min <= stats.mean.unwrap() && stats.mean.unwrap() <= max);
        }
    }

    #[test]
    fn distribution_buckets_sum_to_record_count() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 95.0),
            grade(Some(uuid(1)), Some(uuid(10)), 85.0),
            grade(Some(uuid(2)), Some(uuid(10)), 75.0),
            grade(Some(uuid(2)), Some(uuid(11)), 65.0),
            grade(Some(uuid(3)), Some(uuid(11)), 30.0),
        ];
        let distribution = grade_distribution(&records);
        assert_eq!(distribution.total(), records.len());
        assert_eq!(distribution.grade_a, 1);
        assert_eq!(distribution.grade_b, 1);
        assert_eq!(distribution.grade_c, 1);
        assert_eq!(distribution.grade_d, 1);
        assert_eq!(distribution.grade_f, 1);
    }

    #[test]
    fn malformed_scores_are_classified_without_special_casing() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 150.0),
            grade(Some(uuid(1)), Some(uuid(10)), -5.0),
        ];
        let distribution = grade_distribution(&records);
        assert_eq!(distribution.grade_a, 1);
        assert_eq!(distribution.grade_f, 1);
    }

    #[test]
    fn empty_distribution_is_zero_filled() {
        let distribution = grade_distribution(&[]);
        assert_eq!(distribution.total(), 0);
    }

    #[test]
    fn limit_keeps_only_the_best_average() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 90.0),
            grade(Some(uuid(1)), Some(uuid(10)), 80.0),
            grade(Some(uuid(2)), Some(uuid(10)), 70.0),
        ];
        let mut students = StudentDirectory::new();
        students.insert(uuid(1), "Avery Lee".to_string());
        students.insert(uuid(2), "Jules Moreno".to_string());

        let ranked = rank_students(&records, &students, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].student_id, uuid(1));
        assert_eq!(ranked[0].student_name, "Avery Lee");
        assert!((ranked[0].average_score - 85.0).abs() < 0.001);
        assert_eq!(ranked[0].grade_count, 2);
    }

    #[test]
    fn unattributed_grades_are_excluded_from_ranking() {
        let records = vec![
            grade(None, Some(uuid(10)), 100.0),
            grade(Some(uuid(1)), Some(uuid(10)), 50.0),
        ];
        let ranked = rank_students(&records, &StudentDirectory::new(), 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].student_id, uuid(1));
        assert_eq!(ranked[0].student_name, "Unknown");
    }

    #[test]
    fn tied_averages_keep_a_stable_order_across_calls() {
        let records = vec![
            grade(Some(uuid(7)), Some(uuid(10)), 82.0),
            grade(Some(uuid(3)), Some(uuid(10)), 82.0),
            grade(Some(uuid(5)), Some(uuid(10)), 82.0),
        ];
        let students = StudentDirectory::new();
        let first = rank_students(&records, &students, 5);
        for _ in 0..10 {
            let again = rank_students(&records, &students, 5);
            let ids: Vec<Uuid> = again.iter().map(|e| e.student_id).collect();
            let first_ids: Vec<Uuid> = first.iter().map(|e| e.student_id).collect();
            assert_eq!(ids, first_ids);
        }
        // Documented tie-break: student id ascending.
        assert_eq!(first[0].student_id, uuid(3));
        assert_eq!(first[1].student_id, uuid(5));
        assert_eq!(first[2].student_id, uuid(7));
    }

    #[test]
    fn course_ranking_counts_distinct_students() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 90.0),
            grade(Some(uuid(1)), Some(uuid(10)), 70.0),
            grade(Some(uuid(2)), Some(uuid(10)), 80.0),
        ];
        let mut courses = CourseDirectory::new();
        courses.insert(
            uuid(10),
            CourseInfo {
                name: "Data Structures".to_string(),
                code: "CS201".to_string(),
            },
        );

        let ranked = rank_courses(&records, &courses);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distinct_students, 2);
        assert!((ranked[0].average_score - 80.0).abs() < 0.001);
        assert_eq!(ranked[0].course_code, "CS201");
    }

    #[test]
    fn course_ranking_is_full_and_descending() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 60.0),
            grade(Some(uuid(1)), Some(uuid(11)), 90.0),
            grade(Some(uuid(1)), Some(uuid(12)), 75.0),
        ];
        let ranked = rank_courses(&records, &CourseDirectory::new());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].course_id, uuid(11));
        assert_eq!(ranked[1].course_id, uuid(12));
        assert_eq!(ranked[2].course_id, uuid(10));
        assert_eq!(ranked[0].course_name, "Unknown");
    }

    #[test]
    fn null_student_ids_do_not_inflate_the_distinct_count() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 90.0),
            grade(None, Some(uuid(10)), 40.0),
        ];
        let ranked = rank_courses(&records, &CourseDirectory::new());
        assert_eq!(ranked[0].distinct_students, 1);
    }

    #[test]
    fn student_summary_splits_passing_and_failing() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 55.0),
            grade(Some(uuid(1)), Some(uuid(11)), 65.0),
            grade(Some(uuid(2)), Some(uuid(10)), 100.0),
        ];
        let summary = summarize_student(&records, uuid(1));
        assert!((summary.average.unwrap() - 60.0).abs() < 0.001);
        assert_eq!(summary.highest, Some(65.0));
        assert_eq!(summary.lowest, Some(55.0));
        assert_eq!(summary.total_grades, 2);
        assert_eq!(summary.passing, 1);
        assert_eq!(summary.failing, 1);
    }

    #[test]
    fn unknown_student_gets_an_empty_summary() {
        let records = vec![grade(Some(uuid(1)), Some(uuid(10)), 90.0)];
        let summary = summarize_student(&records, uuid(99));
        assert!(summary.average.is_none());
        assert!(summary.highest.is_none());
        assert!(summary.lowest.is_none());
        assert_eq!(summary.total_grades, 0);
        assert_eq!(summary.passing, 0);
        assert_eq!(summary.failing, 0);
    }

    #[test]
    fn snapshot_distribution_matches_the_grade_total() {
        let records = vec![
            grade(Some(uuid(1)), Some(uuid(10)), 92.0),
            grade(Some(uuid(2)), Some(uuid(10)), 71.0),
            grade(Some(uuid(2)), Some(uuid(11)), 48.0),
        ];
        let totals = Totals {
            students: 2,
            courses: 2,
            grades: records.len() as i64,
            active_students: 2,
        };
        let snapshot = build_snapshot(
            &records,
            totals,
            &StudentDirectory::new(),
            &CourseDirectory::new(),
            5,
        );
        assert_eq!(snapshot.distribution.total() as i64, snapshot.totals.grades);
        assert_eq!(snapshot.stats.count, records.len());
        assert_eq!(snapshot.top_students.len(), 2);
        assert_eq!(snapshot.course_performance.len(), 2);
    }

    #[test]
    fn snapshot_with_no_grades_is_a_defined_state() {
        let totals = Totals {
            students: 4,
            courses: 2,
            grades: 0,
            active_students: 3,
        };
        let snapshot = build_snapshot(
            &[],
            totals,
            &StudentDirectory::new(),
            &CourseDirectory::new(),
            5,
        );
        assert_eq!(snapshot.stats.count, 0);
        assert!(snapshot.stats.mean.is_none());
        assert_eq!(snapshot.distribution.total(), 0);
        assert!(snapshot.top_students.is_empty());
        assert!(snapshot.course_performance.is_empty());
    }
}
