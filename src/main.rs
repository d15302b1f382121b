use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod assignment;
mod authz;
mod db;
mod eligibility;
mod grading;
mod groups;
mod models;
mod report;

use models::{GradeWeights, Role};

#[derive(Parser)]
#[command(name = "capstone-rules")]
#[command(about = "Decision engine for graduation project management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import student records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Check a role against the permission matrix
    Authorize {
        #[arg(long, value_enum)]
        role: Role,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        action: String,
    },
    /// Check route access for a session (omit --role for unauthenticated)
    Route {
        #[arg(long)]
        path: String,
        #[arg(long, value_enum)]
        role: Option<Role>,
    },
    /// Evaluate registration eligibility without committing anything
    Eligibility {
        #[arg(long)]
        email: String,
        #[arg(long)]
        project: Uuid,
        #[arg(long, default_value_t = eligibility::DEFAULT_MINIMUM_GPA)]
        minimum_gpa: f64,
        #[arg(long)]
        json: bool,
    },
    /// Register a student on a project (eligibility re-checked in-transaction)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        project: Uuid,
        #[arg(long, default_value_t = eligibility::DEFAULT_MINIMUM_GPA)]
        minimum_gpa: f64,
    },
    /// Report whether a supervisor has remaining capacity
    Capacity {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Assign a supervisor to a project (capacity re-checked in-transaction)
    Assign {
        #[arg(long)]
        email: String,
        #[arg(long)]
        project: Uuid,
    },
    /// Show a project snapshot with its registered students
    ProjectShow {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Show a group by id, or a student's active group by email
    #[command(group(
        ArgGroup::new("scope")
            .args(["group", "email"])
            .required(true)
            .multiple(false)
    ))]
    GroupShow {
        #[arg(long)]
        group: Option<Uuid>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Create a group with the student as leader
    GroupCreate {
        #[arg(long)]
        email: String,
    },
    /// Join an existing active group
    GroupJoin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        group: Uuid,
    },
    /// Leave the current group
    GroupLeave {
        #[arg(long)]
        email: String,
    },
    /// Compute a weighted final grade, optionally driving a committee decision
    #[command(group(
        ArgGroup::new("decision")
            .args(["approve", "reject"])
            .multiple(false)
    ))]
    Grade {
        #[arg(long)]
        supervisor_score: f64,
        #[arg(long)]
        discussion_score: f64,
        #[arg(long, default_value_t = 0.5)]
        supervisor_weight: f64,
        #[arg(long, default_value_t = 0.5)]
        discussion_weight: f64,
        /// Acting role, checked against the permission matrix for decisions
        #[arg(long, value_enum, default_value_t = Role::Committee)]
        role: Role,
        #[arg(long)]
        approve: bool,
        /// Rejection reason
        #[arg(long)]
        reject: Option<String>,
        #[arg(long)]
        approver: Option<Uuid>,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Imported {inserted} student records from {}.", csv.display());
        }
        Commands::Authorize {
            role,
            resource,
            action,
        } => {
            if authz::authorize(role, &resource, &action) {
                println!("granted: {} may {action} {resource}", role.as_str());
            } else {
                println!("denied: {} may not {action} {resource}", role.as_str());
            }
        }
        Commands::Route { path, role } => {
            let allowed = authz::route_roles(&path)
                .with_context(|| format!("no guarded route matches {path}"))?;
            if authz::can_access_route(role, allowed) {
                println!("granted: access to {path}");
            } else {
                println!("denied: access to {path}");
            }
        }
        Commands::Eligibility {
            email,
            project,
            minimum_gpa,
            json,
        } => {
            let pool = connect().await?;
            let student = db::fetch_student(&pool, &email).await?;
            let result = eligibility::evaluate_eligibility(&student, project, minimum_gpa);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::build_eligibility_checklist(&student, &result));
            }
        }
        Commands::Register {
            email,
            project,
            minimum_gpa,
        } => {
            let pool = connect().await?;
            let result = db::register_student(&pool, &email, project, minimum_gpa).await?;
            if result.eligible {
                println!("Registered {email} on project {project}.");
            } else {
                let reason = result.reason.as_deref().unwrap_or("not eligible");
                println!("Registration refused: {reason}.");
            }
        }
        Commands::Capacity { email, json } => {
            let pool = connect().await?;
            let supervisor = db::fetch_supervisor(&pool, &email).await?;
            let decision = assignment::can_assign(&supervisor);
            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else if decision.can_accept {
                println!(
                    "{} can accept another project ({}/{}).",
                    supervisor.full_name,
                    supervisor.current_projects_count,
                    supervisor.max_projects
                );
            } else {
                let message = decision.message.as_deref().unwrap_or("at capacity");
                println!("At capacity: {message}.");
            }
        }
        Commands::Assign { email, project } => {
            let pool = connect().await?;
            let assigned = db::assign_supervisor(&pool, &email, project).await?;
            println!("Assigned {email} to project \"{}\".", assigned.title);
        }
        Commands::ProjectShow { project, json } => {
            let pool = connect().await?;
            let snapshot = db::fetch_project(&pool, project).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!(
                    "{} ({}) status {}, {} registered students",
                    snapshot.title,
                    snapshot.department,
                    snapshot.status.as_str(),
                    snapshot.registered_student_ids.len()
                );
            }
        }
        Commands::GroupShow { group, email, json } => {
            let pool = connect().await?;
            let snapshot = match (group, email) {
                (Some(group_id), _) => db::fetch_group(&pool, group_id).await?,
                (None, Some(email)) => db::fetch_active_group(&pool, &email)
                    .await?
                    .with_context(|| format!("{email} does not belong to an active group"))?,
                (None, None) => anyhow::bail!("one of --group or --email is required"),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Group {} ({})", snapshot.id, snapshot.status.as_str());
                for member in &snapshot.members {
                    println!("- {} ({})", member.student_id, member.role.as_str());
                }
            }
        }
        Commands::GroupCreate { email } => {
            let pool = connect().await?;
            let group = db::create_group(&pool, &email).await?;
            println!("Created group {} with {email} as leader.", group.id);
        }
        Commands::GroupJoin { email, group } => {
            let pool = connect().await?;
            let joined = db::join_group(&pool, &email, group).await?;
            println!(
                "{email} joined group {} ({} members).",
                joined.id,
                joined.members.len()
            );
        }
        Commands::GroupLeave { email } => {
            let pool = connect().await?;
            let outcome = db::leave_group(&pool, &email).await?;
            if outcome.dissolved {
                println!("Group {} dissolved: last member left.", outcome.group.id);
            } else {
                println!(
                    "{email} left group {} ({} members remain).",
                    outcome.group.id,
                    outcome.group.members.len()
                );
            }
            if let Some(groups::LeaveAdvisory::LeadershipVacated { departed_leader }) =
                outcome.advisory
            {
                println!(
                    "Warning: leader {departed_leader} departed; assign a new leader."
                );
            }
        }
        Commands::Grade {
            supervisor_score,
            discussion_score,
            supervisor_weight,
            discussion_weight,
            role,
            approve,
            reject,
            approver,
            comments,
            json,
        } => {
            let weights = GradeWeights {
                supervisor_weight,
                discussion_weight,
            };
            let mut grade =
                grading::compute_final_grade(supervisor_score, discussion_score, weights)?;

            if approve || reject.is_some() {
                let action = if approve { "approve" } else { "reject" };
                if !authz::authorize(role, "grades", action) {
                    anyhow::bail!("role {} may not {action} grades", role.as_str());
                }
                let approver =
                    approver.context("--approver is required for a committee decision")?;
                grade = match reject {
                    Some(reason) => grading::reject_grade(&grade, approver, &reason)?,
                    None => grading::approve_grade(&grade, approver, comments)?,
                };
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&grade)?);
            } else {
                print!("{}", report::build_grade_sheet(&grade));
            }
        }
    }

    Ok(())
}
