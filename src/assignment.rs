use serde::Serialize;
use thiserror::Error;

use crate::models::{Project, Supervisor};

#[derive(Debug, Clone, Serialize)]
pub struct CapacityDecision {
    pub can_accept: bool,
    pub message: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AssignmentError {
    #[error("supervisor {supervisor} is at capacity ({current}/{max})")]
    CapacityExceeded {
        supervisor: String,
        current: i32,
        max: i32,
    },
}

pub fn can_assign(supervisor: &Supervisor) -> CapacityDecision {
    if supervisor.current_projects_count < supervisor.max_projects {
        CapacityDecision {
            can_accept: true,
            message: None,
        }
    } else {
        CapacityDecision {
            can_accept: false,
            message: Some(format!(
                "{} is supervising {}/{} projects",
                supervisor.full_name, supervisor.current_projects_count, supervisor.max_projects
            )),
        }
    }
}

/// Capacity is a precondition checked at the moment of acceptance, not when
/// the request was created; pending requests may race for the last slot and
/// the caller re-checks inside its transaction. Returns the updated project
/// snapshot for the caller to commit.
pub fn assign(project: &Project, supervisor: &Supervisor) -> Result<Project, AssignmentError> {
    let decision = can_assign(supervisor);
    if !decision.can_accept {
        return Err(AssignmentError::CapacityExceeded {
            supervisor: supervisor.full_name.clone(),
            current: supervisor.current_projects_count,
            max: supervisor.max_projects,
        });
    }

    let mut assigned = project.clone();
    assigned.supervisor_id = Some(supervisor.id);
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use uuid::Uuid;

    fn sample_supervisor(current: i32, max: i32) -> Supervisor {
        Supervisor {
            id: Uuid::new_v4(),
            full_name: "Dr. Omar Khalil".to_string(),
            email: "omar.khalil@uni.example".to_string(),
            department: "Computer Science".to_string(),
            max_projects: max,
            current_projects_count: current,
        }
    }

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Smart Campus Navigation".to_string(),
            department: "Computer Science".to_string(),
            status: ProjectStatus::Submitted,
            supervisor_id: None,
            registered_student_ids: Vec::new(),
        }
    }

    #[test]
    fn accepts_below_capacity() {
        let decision = can_assign(&sample_supervisor(2, 5));
        assert!(decision.can_accept);
        assert!(decision.message.is_none());
    }

    #[test]
    fn last_slot_accepts_and_full_denies() {
        assert!(can_assign(&sample_supervisor(4, 5)).can_accept);
        let decision = can_assign(&sample_supervisor(5, 5));
        assert!(!decision.can_accept);
        assert!(decision.message.unwrap().contains("5/5"));
    }

    #[test]
    fn assign_sets_supervisor_on_a_new_snapshot() {
        let project = sample_project();
        let supervisor = sample_supervisor(0, 3);
        let assigned = assign(&project, &supervisor).unwrap();
        assert_eq!(assigned.supervisor_id, Some(supervisor.id));
        assert_eq!(project.supervisor_id, None);
    }

    #[test]
    fn assign_at_capacity_is_rejected() {
        let project = sample_project();
        let supervisor = sample_supervisor(3, 3);
        let err = assign(&project, &supervisor).unwrap_err();
        assert_eq!(
            err,
            AssignmentError::CapacityExceeded {
                supervisor: supervisor.full_name.clone(),
                current: 3,
                max: 3,
            }
        );
    }
}
