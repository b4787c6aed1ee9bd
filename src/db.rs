use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CourseDirectory, CourseInfo, GradeRecord, StudentDirectory, Totals};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery",
            "Lee",
            "avery.lee@gradetracker.com",
            "ENR-2026-001",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules",
            "Moreno",
            "jules.moreno@gradetracker.com",
            "ENR-2026-002",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara",
            "Patel",
            "kiara.patel@gradetracker.com",
            "ENR-2026-003",
        ),
    ];

    for (id, first_name, last_name, email, enrollment_id) in students {
        sqlx::query(
            r#"
            INSERT INTO grade_tracker.students (id, first_name, last_name, email, enrollment_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(enrollment_id)
        .execute(pool)
        .await?;
    }

    let courses = vec![
        ("Data Structures", "CS201", 4),
        ("Linear Algebra", "MATH210", 3),
        ("Technical Writing", "ENG105", 2),
    ];

    for (name, code, credits) in courses {
        sqlx::query(
            r#"
            INSERT INTO grade_tracker.courses (id, name, code, credits)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, credits = EXCLUDED.credits
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .bind(credits)
        .execute(pool)
        .await?;
    }

    let grades = vec![
        (
            "seed-001",
            "avery.lee@gradetracker.com",
            "CS201",
            92.5,
            "Midterm",
            NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid date")?,
        ),
        (
            "seed-002",
            "avery.lee@gradetracker.com",
            "MATH210",
            88.0,
            "Quiz 1",
            NaiveDate::from_ymd_opt(2026, 3, 9).context("invalid date")?,
        ),
        (
            "seed-003",
            "jules.moreno@gradetracker.com",
            "CS201",
            74.0,
            "Midterm",
            NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid date")?,
        ),
        (
            "seed-004",
            "kiara.patel@gradetracker.com",
            "ENG105",
            58.0,
            "Essay 1",
            NaiveDate::from_ymd_opt(2026, 3, 12).context("invalid date")?,
        ),
    ];

    for (source_key, email, code, score, assessment, graded_on) in grades {
        let student_id: Uuid =
            sqlx::query("SELECT id FROM grade_tracker.students WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");
        let course_id: Uuid = sqlx::query("SELECT id FROM grade_tracker.courses WHERE code = $1")
            .bind(code)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO grade_tracker.grades
            (id, student_id, course_id, numeric_score, assessment, graded_on, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(score)
        .bind(assessment)
        .bind(graded_on)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_grades(pool: &PgPool) -> anyhow::Result<Vec<GradeRecord>> {
    let rows = sqlx::query(
        "SELECT student_id, course_id, numeric_score, assessment, graded_on \
         FROM grade_tracker.grades",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(GradeRecord {
            student_id: row.get("student_id"),
            course_id: row.get("course_id"),
            numeric_score: row.get("numeric_score"),
            assessment: row.get("assessment"),
            graded_on: row.get("graded_on"),
        });
    }

    Ok(records)
}

pub async fn fetch_student_directory(pool: &PgPool) -> anyhow::Result<StudentDirectory> {
    let rows = sqlx::query("SELECT id, first_name, last_name FROM grade_tracker.students")
        .fetch_all(pool)
        .await?;

    let mut directory = StudentDirectory::new();
    for row in rows {
        let first_name: String = row.get("first_name");
        let last_name: String = row.get("last_name");
        directory.insert(row.get("id"), format!("{first_name} {last_name}"));
    }

    Ok(directory)
}

pub async fn fetch_course_directory(pool: &PgPool) -> anyhow::Result<CourseDirectory> {
    let rows = sqlx::query("SELECT id, name, code FROM grade_tracker.courses")
        .fetch_all(pool)
        .await?;

    let mut directory = CourseDirectory::new();
    for row in rows {
        directory.insert(
            row.get("id"),
            CourseInfo {
                name: row.get("name"),
                code: row.get("code"),
            },
        );
    }

    Ok(directory)
}

pub async fn fetch_totals(pool: &PgPool) -> anyhow::Result<Totals> {
    let students: i64 = sqlx::query("SELECT COUNT(*) AS count FROM grade_tracker.students")
        .fetch_one(pool)
        .await?
        .get("count");
    let active_students: i64 =
        sqlx::query("SELECT COUNT(*) AS count FROM grade_tracker.students WHERE active")
            .fetch_one(pool)
            .await?
            .get("count");
    let courses: i64 = sqlx::query("SELECT COUNT(*) AS count FROM grade_tracker.courses")
        .fetch_one(pool)
        .await?
        .get("count");
    let grades: i64 = sqlx::query("SELECT COUNT(*) AS count FROM grade_tracker.grades")
        .fetch_one(pool)
        .await?
        .get("count");

    Ok(Totals {
        students,
        courses,
        grades,
        active_students,
    })
}

/// Looks a student up by id or email, returning the id and display name.
pub async fn resolve_student(
    pool: &PgPool,
    id: Option<Uuid>,
    email: Option<&str>,
) -> anyhow::Result<Option<(Uuid, String)>> {
    let row = if let Some(id) = id {
        sqlx::query("SELECT id, first_name, last_name FROM grade_tracker.students WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
    } else if let Some(email) = email {
        sqlx::query(
            "SELECT id, first_name, last_name FROM grade_tracker.students WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?
    } else {
        None
    };

    Ok(row.map(|row| {
        let first_name: String = row.get("first_name");
        let last_name: String = row.get("last_name");
        (row.get("id"), format!("{first_name} {last_name}"))
    }))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        first_name: String,
        last_name: String,
        email: String,
        course_name: String,
        course_code: String,
        numeric_score: f64,
        assessment: String,
        graded_on: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO grade_tracker.students (id, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.email)
        .fetch_one(pool)
        .await?
        .get("id");

        let course_id: Uuid = sqlx::query(
            r#"
            INSERT INTO grade_tracker.courses (id, name, code)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.course_name)
        .bind(&row.course_code)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO grade_tracker.grades
            (id, student_id, course_id, numeric_score, assessment, graded_on, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(row.numeric_score)
        .bind(&row.assessment)
        .bind(row.graded_on)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
