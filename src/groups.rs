use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Group, GroupMember, GroupRole, GroupStatus};

#[derive(Debug, Error, PartialEq)]
pub enum GroupError {
    #[error("student {0} already belongs to an active group")]
    AlreadyInGroup(Uuid),
    #[error("group {0} is not joinable")]
    GroupNotJoinable(Uuid),
    #[error("student {student} is not a member of group {group}")]
    NotAMember { student: Uuid, group: Uuid },
}

/// Non-fatal advisory attached to a successful leave. Leadership reassignment
/// policy belongs to the caller, not the guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LeaveAdvisory {
    LeadershipVacated { departed_leader: Uuid },
}

#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub group: Group,
    pub dissolved: bool,
    pub advisory: Option<LeaveAdvisory>,
}

/// `current_group` is the snapshot of the student's active group, if any; the
/// caller serializes concurrent transitions per student id and per group id.
pub fn create_group(student_id: Uuid, current_group: Option<&Group>) -> Result<Group, GroupError> {
    if current_group.is_some() {
        return Err(GroupError::AlreadyInGroup(student_id));
    }

    Ok(Group {
        id: Uuid::new_v4(),
        status: GroupStatus::Active,
        members: vec![GroupMember {
            student_id,
            role: GroupRole::Leader,
        }],
    })
}

pub fn join_group(
    student_id: Uuid,
    current_group: Option<&Group>,
    target: &Group,
) -> Result<Group, GroupError> {
    if current_group.is_some() || target.member(student_id).is_some() {
        return Err(GroupError::AlreadyInGroup(student_id));
    }
    if target.status != GroupStatus::Active {
        return Err(GroupError::GroupNotJoinable(target.id));
    }

    let mut joined = target.clone();
    joined.members.push(GroupMember {
        student_id,
        role: GroupRole::Member,
    });
    Ok(joined)
}

/// The last member leaving dissolves the group in the same step; an active
/// group with zero members is never observable. A departing leader leaves a
/// `LeadershipVacated` advisory behind.
pub fn leave_group(student_id: Uuid, group: &Group) -> Result<LeaveOutcome, GroupError> {
    let member = group
        .member(student_id)
        .ok_or(GroupError::NotAMember {
            student: student_id,
            group: group.id,
        })?
        .clone();

    let mut updated = group.clone();
    updated.members.retain(|m| m.student_id != student_id);

    if updated.members.is_empty() {
        updated.status = GroupStatus::Inactive;
        return Ok(LeaveOutcome {
            group: updated,
            dissolved: true,
            advisory: None,
        });
    }

    let advisory = if member.role == GroupRole::Leader {
        Some(LeaveAdvisory::LeadershipVacated {
            departed_leader: student_id,
        })
    } else {
        None
    };

    Ok(LeaveOutcome {
        group: updated,
        dissolved: false,
        advisory,
    })
}
