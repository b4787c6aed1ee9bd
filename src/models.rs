use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// One scored assessment. Student/course ids are nullable because grades
/// survive deletion of either side (`ON DELETE SET NULL` in the schema).
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub student_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub numeric_score: f64,
    pub assessment: String,
    pub graded_on: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CourseInfo {
    pub name: String,
    pub code: String,
}

pub type StudentDirectory = HashMap<Uuid, String>;
pub type CourseDirectory = HashMap<Uuid, CourseInfo>;

/// Collection counts computed by the storage layer, not derivable from
/// the grade batch alone.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Totals {
    pub students: i64,
    pub courses: i64,
    pub grades: i64,
    pub active_students: i64,
}

/// Mean/median/min/max/stddev over a score batch. The value fields are
/// `None` together when the batch is empty, so "no data" stays
/// distinguishable from "data averaging to zero".
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub stddev: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GradeDistribution {
    pub grade_a: usize,
    pub grade_b: usize,
    pub grade_c: usize,
    pub grade_d: usize,
    pub grade_f: usize,
}

impl GradeDistribution {
    pub fn total(&self) -> usize {
        self.grade_a + self.grade_b + self.grade_c + self.grade_d + self.grade_f
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRankEntry {
    pub student_id: Uuid,
    pub student_name: String,
    pub average_score: f64,
    pub grade_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRankEntry {
    pub course_id: Uuid,
    pub course_name: String,
    pub course_code: String,
    pub average_score: f64,
    pub distinct_students: usize,
}

/// Per-student roll-up. Highest/lowest are `None` for a student with no
/// grades rather than a 0.0 sentinel, so they can never be mistaken for
/// a real score of zero.
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub average: Option<f64>,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    pub total_grades: usize,
    pub passing: usize,
    pub failing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    pub totals: Totals,
    pub stats: DescriptiveStats,
    pub distribution: GradeDistribution,
    pub top_students: Vec<StudentRankEntry>,
    pub course_performance: Vec<CourseRankEntry>,
}

pub fn letter_grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "A"
    } else if score >= 80.0 {
        "B"
    } else if score >= 70.0 {
        "C"
    } else if score >= 60.0 {
        "D"
    } else {
        "F"
    }
}

pub fn grade_status(score: f64) -> &'static str {
    if score >= 60.0 { "PASS" } else { "FAIL" }
}
