use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::assignment;
use crate::eligibility::{self, EligibilityResult};
use crate::groups::{self, LeaveOutcome};
use crate::models::{
    Group, GroupMember, GroupRole, GroupStatus, Project, ProjectStatus, StudentRecord, Supervisor,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn row_to_student(row: &PgRow) -> StudentRecord {
    StudentRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        gpa: row.get("gpa"),
        completed_credit_hours: row.get("completed_credit_hours"),
        required_credit_hours: row.get("required_credit_hours"),
        completed_prerequisites: row.get("completed_prerequisites"),
        current_project_id: row.get("current_project_id"),
    }
}

const STUDENT_COLUMNS: &str = "id, full_name, email, gpa, completed_credit_hours, \
     required_credit_hours, completed_prerequisites, current_project_id";

pub async fn fetch_student(pool: &PgPool, email: &str) -> anyhow::Result<StudentRecord> {
    let row = sqlx::query(&format!(
        "SELECT {STUDENT_COLUMNS} FROM capstone_rules.students WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no student with email {email}"))?;

    Ok(row_to_student(&row))
}

async fn lock_student(conn: &mut PgConnection, email: &str) -> anyhow::Result<StudentRecord> {
    let row = sqlx::query(&format!(
        "SELECT {STUDENT_COLUMNS} FROM capstone_rules.students WHERE email = $1 FOR UPDATE"
    ))
    .bind(email)
    .fetch_optional(conn)
    .await?
    .with_context(|| format!("no student with email {email}"))?;

    Ok(row_to_student(&row))
}

async fn supervisor_from_row(conn: &mut PgConnection, row: &PgRow) -> anyhow::Result<Supervisor> {
    let id: Uuid = row.get("id");
    let count: i64 = sqlx::query(
        "SELECT COUNT(*) AS n FROM capstone_rules.projects \
         WHERE supervisor_id = $1 AND status <> 'rejected'",
    )
    .bind(id)
    .fetch_one(conn)
    .await?
    .get("n");

    Ok(Supervisor {
        id,
        full_name: row.get("full_name"),
        email: row.get("email"),
        department: row.get("department"),
        max_projects: row.get("max_projects"),
        current_projects_count: count as i32,
    })
}

pub async fn fetch_supervisor(pool: &PgPool, email: &str) -> anyhow::Result<Supervisor> {
    let mut conn = pool.acquire().await?;
    let row = sqlx::query(
        "SELECT id, full_name, email, department, max_projects \
         FROM capstone_rules.supervisors WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?
    .with_context(|| format!("no supervisor with email {email}"))?;

    supervisor_from_row(&mut *conn, &row).await
}

pub async fn fetch_group(pool: &PgPool, group_id: Uuid) -> anyhow::Result<Group> {
    let mut conn = pool.acquire().await?;
    group_by_id(&mut *conn, group_id, false).await
}

async fn project_by_id(conn: &mut PgConnection, project_id: Uuid) -> anyhow::Result<Project> {
    let row = sqlx::query(
        "SELECT id, title, department, status, supervisor_id \
         FROM capstone_rules.projects WHERE id = $1",
    )
    .bind(project_id)
    .fetch_optional(&mut *conn)
    .await?
    .with_context(|| format!("no project with id {project_id}"))?;

    let status_text: String = row.get("status");
    let status = ProjectStatus::parse(&status_text)
        .with_context(|| format!("unknown project status {status_text}"))?;

    let student_rows = sqlx::query(
        "SELECT student_id FROM capstone_rules.project_students WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?;

    Ok(Project {
        id: row.get("id"),
        title: row.get("title"),
        department: row.get("department"),
        status,
        supervisor_id: row.get("supervisor_id"),
        registered_student_ids: student_rows.iter().map(|r| r.get("student_id")).collect(),
    })
}

pub async fn fetch_project(pool: &PgPool, project_id: Uuid) -> anyhow::Result<Project> {
    let mut conn = pool.acquire().await?;
    project_by_id(&mut *conn, project_id).await
}

async fn group_members(conn: &mut PgConnection, group_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
    let rows = sqlx::query(
        "SELECT student_id, member_role FROM capstone_rules.group_members \
         WHERE group_id = $1 ORDER BY joined_at, student_id",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;

    let mut members = Vec::new();
    for row in rows {
        let role_text: String = row.get("member_role");
        let role = GroupRole::parse(&role_text)
            .with_context(|| format!("unknown group member role {role_text}"))?;
        members.push(GroupMember {
            student_id: row.get("student_id"),
            role,
        });
    }
    Ok(members)
}

async fn group_by_id(
    conn: &mut PgConnection,
    group_id: Uuid,
    lock: bool,
) -> anyhow::Result<Group> {
    let mut query = String::from("SELECT id, status FROM capstone_rules.groups WHERE id = $1");
    if lock {
        query.push_str(" FOR UPDATE");
    }

    let row = sqlx::query(&query)
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?
        .with_context(|| format!("no group with id {group_id}"))?;

    let status_text: String = row.get("status");
    let status = GroupStatus::parse(&status_text)
        .with_context(|| format!("unknown group status {status_text}"))?;

    Ok(Group {
        id: group_id,
        status,
        members: group_members(conn, group_id).await?,
    })
}

async fn active_group_of(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> anyhow::Result<Option<Group>> {
    let row = sqlx::query(
        "SELECT g.id FROM capstone_rules.groups g \
         JOIN capstone_rules.group_members m ON m.group_id = g.id \
         WHERE m.student_id = $1 AND g.status = 'active'",
    )
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(group_by_id(conn, row.get("id"), false).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_active_group(
    pool: &PgPool,
    student_email: &str,
) -> anyhow::Result<Option<Group>> {
    let student = fetch_student(pool, student_email).await?;
    let mut conn = pool.acquire().await?;
    active_group_of(&mut *conn, student.id).await
}

/// Exclusivity check and commit run in one transaction with the student row
/// locked, so two racing registrations for the same student cannot both pass
/// the check against a stale snapshot. The storage-level unique index on
/// (student_id) is the backstop.
pub async fn register_student(
    pool: &PgPool,
    student_email: &str,
    project_id: Uuid,
    minimum_gpa: f64,
) -> anyhow::Result<EligibilityResult> {
    let mut tx = pool.begin().await?;

    let student = lock_student(&mut *tx, student_email).await?;
    let result = eligibility::evaluate_eligibility(&student, project_id, minimum_gpa);

    if result.eligible && student.current_project_id != Some(project_id) {
        sqlx::query(
            "INSERT INTO capstone_rules.project_students (project_id, student_id) \
             VALUES ($1, $2)",
        )
        .bind(project_id)
        .bind(student.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE capstone_rules.students SET current_project_id = $1 WHERE id = $2")
            .bind(project_id)
            .bind(student.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(result)
}

/// Capacity is re-checked at acceptance time with the supervisor row locked;
/// pending requests racing for the last slot serialize here.
pub async fn assign_supervisor(
    pool: &PgPool,
    supervisor_email: &str,
    project_id: Uuid,
) -> anyhow::Result<Project> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "SELECT id, full_name, email, department, max_projects \
         FROM capstone_rules.supervisors WHERE email = $1 FOR UPDATE",
    )
    .bind(supervisor_email)
    .fetch_optional(&mut *tx)
    .await?
    .with_context(|| format!("no supervisor with email {supervisor_email}"))?;

    let supervisor = supervisor_from_row(&mut *tx, &row).await?;
    let project = project_by_id(&mut *tx, project_id).await?;
    let assigned = assignment::assign(&project, &supervisor)?;

    sqlx::query("UPDATE capstone_rules.projects SET supervisor_id = $1 WHERE id = $2")
        .bind(supervisor.id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(assigned)
}

pub async fn create_group(pool: &PgPool, student_email: &str) -> anyhow::Result<Group> {
    let mut tx = pool.begin().await?;

    let student = lock_student(&mut *tx, student_email).await?;
    let current = active_group_of(&mut *tx, student.id).await?;
    let group = groups::create_group(student.id, current.as_ref())?;

    sqlx::query("INSERT INTO capstone_rules.groups (id, status) VALUES ($1, $2)")
        .bind(group.id)
        .bind(group.status.as_str())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO capstone_rules.group_members (group_id, student_id, member_role, joined_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(group.id)
    .bind(student.id)
    .bind(GroupRole::Leader.as_str())
    .bind(Utc::now().date_naive())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(group)
}

pub async fn join_group(
    pool: &PgPool,
    student_email: &str,
    group_id: Uuid,
) -> anyhow::Result<Group> {
    let mut tx = pool.begin().await?;

    let student = lock_student(&mut *tx, student_email).await?;
    let target = group_by_id(&mut *tx, group_id, true).await?;
    let current = active_group_of(&mut *tx, student.id).await?;
    let joined = groups::join_group(student.id, current.as_ref(), &target)?;

    sqlx::query(
        "INSERT INTO capstone_rules.group_members (group_id, student_id, member_role, joined_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(group_id)
    .bind(student.id)
    .bind(GroupRole::Member.as_str())
    .bind(Utc::now().date_naive())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(joined)
}

pub async fn leave_group(pool: &PgPool, student_email: &str) -> anyhow::Result<LeaveOutcome> {
    let mut tx = pool.begin().await?;

    let student = lock_student(&mut *tx, student_email).await?;
    let group = active_group_of(&mut *tx, student.id)
        .await?
        .with_context(|| format!("{student_email} does not belong to an active group"))?;
    let group = group_by_id(&mut *tx, group.id, true).await?;
    let outcome = groups::leave_group(student.id, &group)?;

    sqlx::query(
        "DELETE FROM capstone_rules.group_members WHERE group_id = $1 AND student_id = $2",
    )
    .bind(group.id)
    .bind(student.id)
    .execute(&mut *tx)
    .await?;

    if outcome.dissolved {
        sqlx::query("UPDATE capstone_rules.groups SET status = 'inactive' WHERE id = $1")
            .bind(group.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(outcome)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let supervisors = vec![
        (
            Uuid::parse_str("7b1e9a40-5b1c-4f0e-9d3a-111111111111")?,
            "Dr. Omar Khalil",
            "omar.khalil@uni.example",
            "Computer Science",
            3,
        ),
        (
            Uuid::parse_str("7b1e9a40-5b1c-4f0e-9d3a-222222222222")?,
            "Dr. Rana Saleh",
            "rana.saleh@uni.example",
            "Information Systems",
            1,
        ),
    ];

    for (id, full_name, email, department, max_projects) in supervisors {
        sqlx::query(
            r#"
            INSERT INTO capstone_rules.supervisors (id, full_name, email, department, max_projects)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                department = EXCLUDED.department,
                max_projects = EXCLUDED.max_projects
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(department)
        .bind(max_projects)
        .execute(pool)
        .await?;
    }

    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-aaaaaaaaaaaa")?,
            "Layla Hassan",
            "layla.hassan@uni.example",
            3.4,
            112,
            100,
            true,
        ),
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-bbbbbbbbbbbb")?,
            "Sami Nasser",
            "sami.nasser@uni.example",
            2.1,
            96,
            100,
            true,
        ),
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-cccccccccccc")?,
            "Noor Aziz",
            "noor.aziz@uni.example",
            1.7,
            104,
            100,
            false,
        ),
    ];

    for (id, full_name, email, gpa, completed, required, prerequisites) in students {
        sqlx::query(
            r#"
            INSERT INTO capstone_rules.students
            (id, full_name, email, gpa, completed_credit_hours,
             required_credit_hours, completed_prerequisites)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                gpa = EXCLUDED.gpa,
                completed_credit_hours = EXCLUDED.completed_credit_hours,
                required_credit_hours = EXCLUDED.required_credit_hours,
                completed_prerequisites = EXCLUDED.completed_prerequisites
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(gpa)
        .bind(completed)
        .bind(required)
        .bind(prerequisites)
        .execute(pool)
        .await?;
    }

    let projects = vec![
        (
            Uuid::parse_str("9c40e2d1-0f6b-4c58-bd07-111111111111")?,
            "Smart Campus Navigation",
            "Computer Science",
            ProjectStatus::Approved,
            Some(Uuid::parse_str("7b1e9a40-5b1c-4f0e-9d3a-111111111111")?),
        ),
        (
            Uuid::parse_str("9c40e2d1-0f6b-4c58-bd07-222222222222")?,
            "Graduation Archive Portal",
            "Information Systems",
            ProjectStatus::Submitted,
            None,
        ),
    ];

    for (id, title, department, status, supervisor_id) in projects {
        sqlx::query(
            r#"
            INSERT INTO capstone_rules.projects (id, title, department, status, supervisor_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                department = EXCLUDED.department,
                status = EXCLUDED.status,
                supervisor_id = EXCLUDED.supervisor_id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(department)
        .bind(status.as_str())
        .bind(supervisor_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        gpa: f64,
        completed_credit_hours: i32,
        required_credit_hours: i32,
        completed_prerequisites: bool,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let result = sqlx::query(
            r#"
            INSERT INTO capstone_rules.students
            (id, full_name, email, gpa, completed_credit_hours,
             required_credit_hours, completed_prerequisites)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                gpa = EXCLUDED.gpa,
                completed_credit_hours = EXCLUDED.completed_credit_hours,
                required_credit_hours = EXCLUDED.required_credit_hours,
                completed_prerequisites = EXCLUDED.completed_prerequisites
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(row.gpa)
        .bind(row.completed_credit_hours)
        .bind(row.required_credit_hours)
        .bind(row.completed_prerequisites)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
