use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    CourseMajorRecord, CourseRecord, DepartmentRecord, MajorType, ProfileRecord, SectionRecord,
    StrandRecord,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_departments(pool: &PgPool) -> anyhow::Result<Vec<DepartmentRecord>> {
    let rows = sqlx::query("SELECT key, name FROM yearbook.departments ORDER BY key")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| DepartmentRecord {
            key: row.get("key"),
            name: row.get("name"),
        })
        .collect())
}

pub async fn fetch_active_sections(
    pool: &PgPool,
    school_year_id: &str,
) -> anyhow::Result<Vec<SectionRecord>> {
    let rows = sqlx::query(
        "SELECT department, grade, name, course_name, major_name, strand_name \
         FROM yearbook.sections \
         WHERE school_year_id = $1 AND is_active \
         ORDER BY department, grade, name",
    )
    .bind(school_year_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SectionRecord {
            department: row.get("department"),
            grade: row.get("grade"),
            name: row.get("name"),
            course_name: row.get("course_name"),
            major_name: row.get("major_name"),
            strand_name: row.get("strand_name"),
        })
        .collect())
}

pub async fn fetch_approved_profiles(
    pool: &PgPool,
    department: &str,
    school_year_id: &str,
) -> anyhow::Result<Vec<ProfileRecord>> {
    let rows = sqlx::query(
        "SELECT id, full_name, department, course_program, major, year_level, \
         block_section, profile_picture, saying_motto, honors, officer_role \
         FROM yearbook.profiles \
         WHERE school_year_id = $1 AND department = $2 AND status = 'approved' \
         ORDER BY full_name, id",
    )
    .bind(school_year_id)
    .bind(department)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProfileRecord {
            id: row.get("id"),
            full_name: row.get("full_name"),
            department: row.get("department"),
            course_program: row.get("course_program"),
            major: row.get("major"),
            year_level: row.get("year_level"),
            block_section: row.get("block_section"),
            profile_picture: row.get("profile_picture"),
            saying_motto: row.get("saying_motto"),
            honors: row.get("honors"),
            officer_role: row.get("officer_role"),
        })
        .collect())
}

pub async fn fetch_active_strands(
    pool: &PgPool,
    school_year_id: &str,
) -> anyhow::Result<Vec<StrandRecord>> {
    let rows = sqlx::query(
        "SELECT id, name, full_name, description, tagline \
         FROM yearbook.strands \
         WHERE school_year_id = $1 AND is_active \
         ORDER BY name",
    )
    .bind(school_year_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StrandRecord {
            id: row.get("id"),
            name: row.get("name"),
            full_name: row.get("full_name"),
            description: row.get("description"),
            tagline: row.get("tagline"),
        })
        .collect())
}

pub async fn fetch_courses(
    pool: &PgPool,
    department: &str,
    school_year_id: &str,
) -> anyhow::Result<Vec<CourseRecord>> {
    let rows = sqlx::query(
        "SELECT id, name, department, major_type \
         FROM yearbook.courses \
         WHERE school_year_id = $1 AND department = $2 \
         ORDER BY name",
    )
    .bind(school_year_id)
    .bind(department)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CourseRecord {
            id: row.get("id"),
            name: row.get("name"),
            department: row.get("department"),
            major_type: MajorType::from_key(row.get::<String, _>("major_type").as_str()),
        })
        .collect())
}

pub async fn fetch_active_course_majors(
    pool: &PgPool,
    school_year_id: &str,
) -> anyhow::Result<Vec<CourseMajorRecord>> {
    let rows = sqlx::query(
        "SELECT id, course_id, major_name \
         FROM yearbook.course_majors \
         WHERE school_year_id = $1 AND is_active \
         ORDER BY major_name",
    )
    .bind(school_year_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CourseMajorRecord {
            id: row.get("id"),
            course_id: row.get("course_id"),
            major_name: row.get("major_name"),
        })
        .collect())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let school_year = "2025-2026";
    sqlx::query(
        r#"
        INSERT INTO yearbook.school_years (id, label, starts_on, ends_on)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET label = EXCLUDED.label, starts_on = EXCLUDED.starts_on, ends_on = EXCLUDED.ends_on
        "#,
    )
    .bind(school_year)
    .bind("School Year 2025-2026")
    .bind(NaiveDate::from_ymd_opt(2025, 8, 4).context("invalid date")?)
    .bind(NaiveDate::from_ymd_opt(2026, 5, 29).context("invalid date")?)
    .execute(pool)
    .await?;

    let departments = vec![
        ("elementary", "Elementary"),
        ("junior-high", "Junior High"),
        ("senior-high", "Senior High"),
        ("college", "College"),
        ("faculty", "Faculty"),
    ];
    for (key, name) in departments {
        sqlx::query(
            r#"
            INSERT INTO yearbook.departments (key, name)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(key)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let strands = vec![
        (
            "STEM",
            "Science, Technology, Engineering and Mathematics",
            Some("For future scientists and engineers"),
        ),
        (
            "ABM",
            "Accountancy, Business and Management",
            Some("For future entrepreneurs"),
        ),
    ];
    for (name, full_name, tagline) in strands {
        sqlx::query(
            r#"
            INSERT INTO yearbook.strands (id, school_year_id, name, full_name, tagline)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (school_year_id, name) DO UPDATE
            SET full_name = EXCLUDED.full_name, tagline = EXCLUDED.tagline
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(school_year)
        .bind(name)
        .bind(full_name)
        .bind(tagline)
        .execute(pool)
        .await?;
    }

    let courses = vec![("BSIT", "no-major"), ("BSED", "has-major")];
    let mut course_ids = Vec::new();
    for (name, major_type) in courses {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO yearbook.courses (id, school_year_id, department, name, major_type)
            VALUES ($1, $2, 'college', $3, $4)
            ON CONFLICT (school_year_id, department, name) DO UPDATE
            SET major_type = EXCLUDED.major_type
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(school_year)
        .bind(name)
        .bind(major_type)
        .fetch_one(pool)
        .await?
        .get("id");
        course_ids.push((name, id));
    }

    for (course_name, major_name) in [("BSED", "English"), ("BSED", "Mathematics")] {
        let Some((_, course_id)) = course_ids.iter().find(|(n, _)| *n == course_name) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO yearbook.course_majors (id, course_id, school_year_id, major_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (course_id, school_year_id, major_name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(school_year)
        .bind(major_name)
        .execute(pool)
        .await?;
    }

    let sections: Vec<(&str, &str, &str, Option<&str>, Option<&str>, Option<&str>)> = vec![
        ("elementary", "Grade 3", "Rose", None, None, None),
        ("elementary", "Grade 4", "Sampaguita", None, None, None),
        ("junior-high", "Grade 7", "Emerald", None, None, None),
        ("senior-high", "Grade 11", "A", None, None, Some("STEM")),
        ("senior-high", "Grade 12", "A", None, None, Some("STEM")),
        ("senior-high", "Grade 11", "A", None, None, Some("ABM")),
        ("college", "1st Year", "A", Some("BSIT"), None, None),
        ("college", "1st Year", "A", Some("BSED"), Some("English"), None),
    ];
    for (department, grade, name, course_name, major_name, strand_name) in sections {
        sqlx::query(
            r#"
            INSERT INTO yearbook.sections
            (id, school_year_id, department, grade, name, course_name, major_name, strand_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (school_year_id, department, grade, name, course_key, major_key, strand_key)
            DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(school_year)
        .bind(department)
        .bind(grade)
        .bind(name)
        .bind(course_name)
        .bind(major_name)
        .bind(strand_name)
        .execute(pool)
        .await?;
    }

    let profiles: Vec<(
        &str,
        &str,
        &str,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        &str,
    )> = vec![
        (
            "seed-001",
            "Ana Cruz",
            "elementary",
            None,
            None,
            Some("Grade 3"),
            Some("Rose"),
            Some("President"),
            "approved",
        ),
        (
            "seed-002",
            "Ben Reyes",
            "elementary",
            None,
            None,
            Some("Grade 3"),
            Some("Rose"),
            None,
            "approved",
        ),
        (
            "seed-003",
            "Carla Santos",
            "junior-high",
            None,
            None,
            Some("Grade 7"),
            Some("Emerald"),
            Some("Secretary"),
            "approved",
        ),
        (
            "seed-004",
            "Ely Tan",
            "senior-high",
            Some("STEM"),
            None,
            Some("Grade 11"),
            Some("A"),
            None,
            "approved",
        ),
        (
            "seed-005",
            "Fe Uy",
            "college",
            Some("BSED"),
            Some("English"),
            Some("1st Year"),
            Some("A"),
            None,
            "approved",
        ),
        (
            "seed-006",
            "Gio Ong",
            "college",
            Some("BSIT"),
            None,
            Some("1st Year"),
            Some("A"),
            Some("Treasurer"),
            "approved",
        ),
        (
            "seed-007",
            "Hana Lee",
            "faculty",
            Some("Administration"),
            None,
            None,
            None,
            None,
            "approved",
        ),
        (
            "seed-008",
            "Ira Gomez",
            "college",
            Some("BSIT"),
            None,
            Some("2nd Year"),
            Some("B"),
            None,
            "pending",
        ),
    ];
    for (
        source_key,
        full_name,
        department,
        course_program,
        major,
        year_level,
        block_section,
        officer_role,
        status,
    ) in profiles
    {
        sqlx::query(
            r#"
            INSERT INTO yearbook.profiles
            (id, school_year_id, department, full_name, course_program, major,
             year_level, block_section, officer_role, status, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(school_year)
        .bind(department)
        .bind(full_name)
        .bind(course_program)
        .bind(major)
        .bind(year_level)
        .bind(block_section)
        .bind(officer_role)
        .bind(status)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(
    pool: &PgPool,
    school_year_id: &str,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        department: String,
        course_program: Option<String>,
        major: Option<String>,
        year_level: Option<String>,
        block_section: Option<String>,
        officer_role: Option<String>,
        honors: Option<String>,
        saying_motto: Option<String>,
        status: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let status = row.status.unwrap_or_else(|| "approved".to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO yearbook.profiles
            (id, school_year_id, department, full_name, course_program, major,
             year_level, block_section, officer_role, honors, saying_motto, status, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(school_year_id)
        .bind(&row.department)
        .bind(&row.full_name)
        .bind(&row.course_program)
        .bind(&row.major)
        .bind(&row.year_level)
        .bind(&row.block_section)
        .bind(&row.officer_role)
        .bind(&row.honors)
        .bind(&row.saying_motto)
        .bind(&status)
        .bind(&source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
