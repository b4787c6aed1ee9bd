use std::fmt::Write;

use crate::models::{
    CourseDirectory, GradeRecord, StatisticsSnapshot, StudentDirectory, grade_status, letter_grade,
};

pub fn build_report(snapshot: &StatisticsSnapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Tracker Statistics");
    let _ = writeln!(
        output,
        "{} students ({} active), {} courses, {} grades recorded",
        snapshot.totals.students,
        snapshot.totals.active_students,
        snapshot.totals.courses,
        snapshot.totals.grades
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Overview");

    match (
        snapshot.stats.mean,
        snapshot.stats.median,
        snapshot.stats.min,
        snapshot.stats.max,
        snapshot.stats.stddev,
    ) {
        (Some(mean), Some(median), Some(min), Some(max), Some(stddev)) => {
            let _ = writeln!(output, "- Average: {mean:.2}");
            let _ = writeln!(output, "- Median: {median:.2}");
            let _ = writeln!(output, "- Range: {min:.1} to {max:.1}");
            let _ = writeln!(output, "- Std deviation: {stddev:.2}");
        }
        _ => {
            let _ = writeln!(output, "No grades recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");
    let d = &snapshot.distribution;
    let _ = writeln!(output, "- A (90-100): {}", d.grade_a);
    let _ = writeln!(output, "- B (80-89): {}", d.grade_b);
    let _ = writeln!(output, "- C (70-79): {}", d.grade_c);
    let _ = writeln!(output, "- D (60-69): {}", d.grade_d);
    let _ = writeln!(output, "- F (below 60): {}", d.grade_f);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Students");

    if snapshot.top_students.is_empty() {
        let _ = writeln!(output, "No students with grades.");
    } else {
        for entry in snapshot.top_students.iter() {
            let _ = writeln!(
                output,
                "- {} averaging {:.2} across {} grades",
                entry.student_name, entry.average_score, entry.grade_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Performance");

    if snapshot.course_performance.is_empty() {
        let _ = writeln!(output, "No courses with grades.");
    } else {
        for entry in snapshot.course_performance.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) averaging {:.2} across {} students",
                entry.course_name, entry.course_code, entry.average_score, entry.distinct_students
            );
        }
    }

    output
}

pub fn export_grades_csv(
    records: &[GradeRecord],
    students: &StudentDirectory,
    courses: &CourseDirectory,
) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Student Name",
        "Course Code",
        "Course Name",
        "Score",
        "Letter Grade",
        "Assessment",
        "Date",
        "Status",
    ])?;

    for record in records {
        let student_name = record
            .student_id
            .and_then(|id| students.get(&id).cloned())
            .unwrap_or_else(|| "Unknown".to_string());
        let (course_name, course_code) = record
            .course_id
            .and_then(|id| courses.get(&id))
            .map(|info| (info.name.clone(), info.code.clone()))
            .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

        writer.write_record([
            student_name.as_str(),
            course_code.as_str(),
            course_name.as_str(),
            &format!("{:.1}", record.numeric_score),
            letter_grade(record.numeric_score),
            record.assessment.as_str(),
            &record.graded_on.to_string(),
            grade_status(record.numeric_score),
        ])?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}
