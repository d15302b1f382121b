use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Supervisor,
    Committee,
    Discussion,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Supervisor => "supervisor",
            Role::Committee => "committee",
            Role::Discussion => "discussion",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    InProgress,
    Graduated,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Submitted => "submitted",
            ProjectStatus::UnderReview => "under_review",
            ProjectStatus::Approved => "approved",
            ProjectStatus::Rejected => "rejected",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Graduated => "graduated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ProjectStatus::Draft),
            "submitted" => Some(ProjectStatus::Submitted),
            "under_review" => Some(ProjectStatus::UnderReview),
            "approved" => Some(ProjectStatus::Approved),
            "rejected" => Some(ProjectStatus::Rejected),
            "in_progress" => Some(ProjectStatus::InProgress),
            "graduated" => Some(ProjectStatus::Graduated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub gpa: f64,
    pub completed_credit_hours: i32,
    pub required_credit_hours: i32,
    pub completed_prerequisites: bool,
    pub current_project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub status: ProjectStatus,
    pub supervisor_id: Option<Uuid>,
    pub registered_student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Supervisor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub max_projects: i32,
    pub current_projects_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Leader,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Leader => "leader",
            GroupRole::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "leader" => Some(GroupRole::Leader),
            "member" => Some(GroupRole::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Active,
    Pending,
    Inactive,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Active => "active",
            GroupStatus::Pending => "pending",
            GroupStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(GroupStatus::Active),
            "pending" => Some(GroupStatus::Pending),
            "inactive" => Some(GroupStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub student_id: Uuid,
    pub role: GroupRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: Uuid,
    pub status: GroupStatus,
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn member(&self, student_id: Uuid) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.student_id == student_id)
    }

    pub fn leader(&self) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.role == GroupRole::Leader)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradeWeights {
    pub supervisor_weight: f64,
    pub discussion_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeState {
    Computed,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalGrade {
    pub supervisor_score: f64,
    pub discussion_score: f64,
    pub weights: GradeWeights,
    pub final_score: f64,
    pub final_grade: String,
    pub state: GradeState,
    pub approver_id: Option<Uuid>,
    pub approval_comments: Option<String>,
    pub decided_at: Option<chrono::NaiveDate>,
}
