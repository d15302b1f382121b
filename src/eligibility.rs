use serde::Serialize;
use uuid::Uuid;

use crate::models::StudentRecord;

pub const DEFAULT_MINIMUM_GPA: f64 = 2.0;

#[derive(Debug, Clone, Serialize)]
pub struct HoursInfo {
    pub completed: i32,
    pub required: i32,
    pub remaining: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpaInfo {
    pub current: f64,
    pub minimum: f64,
    pub difference: f64,
}

/// Every sub-check is always present so the caller can render a complete
/// checklist without probing optional fields.
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityDetails {
    pub has_enough_hours: bool,
    pub hours: HoursInfo,
    pub has_minimum_gpa: bool,
    pub gpa: GpaInfo,
    pub is_not_registered_in_another_project: bool,
    pub current_project: Option<Uuid>,
    pub completed_prerequisites: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResult {
    pub eligible: bool,
    pub reason: Option<String>,
    pub details: EligibilityDetails,
}

/// All four criteria are evaluated without short-circuiting; a student who
/// fails on hours still gets an accurate GPA line in the checklist. A
/// registration elsewhere (pending or approved) is a hard gate regardless of
/// the academic criteria.
pub fn evaluate_eligibility(
    student: &StudentRecord,
    target_project_id: Uuid,
    minimum_gpa: f64,
) -> EligibilityResult {
    let has_enough_hours = student.completed_credit_hours >= student.required_credit_hours;
    let remaining = (student.required_credit_hours - student.completed_credit_hours).max(0);

    let has_minimum_gpa = student.gpa >= minimum_gpa;
    let difference = student.gpa - minimum_gpa;

    let is_not_registered_in_another_project = match student.current_project_id {
        None => true,
        Some(current) => current == target_project_id,
    };

    let completed_prerequisites = student.completed_prerequisites;

    let eligible = has_enough_hours
        && has_minimum_gpa
        && is_not_registered_in_another_project
        && completed_prerequisites;

    // Registration conflict takes message priority: it is the most actionable
    // failure for the student.
    let reason = if eligible {
        None
    } else if !is_not_registered_in_another_project {
        Some("already registered in another project; withdraw before registering again".to_string())
    } else if !has_enough_hours {
        Some(format!(
            "completed credit hours are insufficient ({} of {} required, {} remaining)",
            student.completed_credit_hours, student.required_credit_hours, remaining
        ))
    } else if !has_minimum_gpa {
        Some(format!(
            "GPA {:.2} is below the minimum {:.2}",
            student.gpa, minimum_gpa
        ))
    } else {
        Some("prerequisite courses are not complete".to_string())
    };

    EligibilityResult {
        eligible,
        reason,
        details: EligibilityDetails {
            has_enough_hours,
            hours: HoursInfo {
                completed: student.completed_credit_hours,
                required: student.required_credit_hours,
                remaining,
            },
            has_minimum_gpa,
            gpa: GpaInfo {
                current: student.gpa,
                minimum: minimum_gpa,
                difference,
            },
            is_not_registered_in_another_project,
            current_project: student.current_project_id,
            completed_prerequisites,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_student() -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            full_name: "Layla Hassan".to_string(),
            email: "layla.hassan@uni.example".to_string(),
            gpa: 3.1,
            completed_credit_hours: 110,
            required_credit_hours: 100,
            completed_prerequisites: true,
            current_project_id: None,
        }
    }

    #[test]
    fn passing_student_is_eligible() {
        let result = evaluate_eligibility(&sample_student(), Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        assert!(result.eligible);
        assert!(result.reason.is_none());
        assert!(result.details.has_enough_hours);
        assert_eq!(result.details.hours.remaining, 0);
        assert!(result.details.has_minimum_gpa);
        assert!((result.details.gpa.difference - 1.1).abs() < 1e-9);
    }

    #[test]
    fn registration_elsewhere_is_a_hard_gate() {
        let mut student = sample_student();
        student.current_project_id = Some(Uuid::new_v4());
        let result = evaluate_eligibility(&student, Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        assert!(!result.eligible);
        assert!(!result.details.is_not_registered_in_another_project);
        assert!(result.reason.unwrap().contains("already registered"));
    }

    #[test]
    fn reregistering_same_project_is_not_a_conflict() {
        let target = Uuid::new_v4();
        let mut student = sample_student();
        student.current_project_id = Some(target);
        let result = evaluate_eligibility(&student, target, DEFAULT_MINIMUM_GPA);
        assert!(result.details.is_not_registered_in_another_project);
        assert!(result.eligible);
    }

    #[test]
    fn conflict_message_wins_over_other_failures() {
        let mut student = sample_student();
        student.current_project_id = Some(Uuid::new_v4());
        student.gpa = 1.0;
        student.completed_credit_hours = 10;
        let result = evaluate_eligibility(&student, Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        assert!(result.reason.unwrap().contains("already registered"));
    }

    #[test]
    fn all_checks_reported_even_when_one_fails() {
        let mut student = sample_student();
        student.completed_credit_hours = 80;
        student.gpa = 1.5;
        let result = evaluate_eligibility(&student, Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        assert!(!result.eligible);
        assert!(!result.details.has_enough_hours);
        assert_eq!(result.details.hours.remaining, 20);
        assert!(!result.details.has_minimum_gpa);
        assert!((result.details.gpa.difference + 0.5).abs() < 1e-9);
        assert!(result.details.completed_prerequisites);
        assert!(result.reason.unwrap().contains("credit hours"));
    }

    #[test]
    fn missing_prerequisites_fail() {
        let mut student = sample_student();
        student.completed_prerequisites = false;
        let result = evaluate_eligibility(&student, Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        assert!(!result.eligible);
        assert!(result.reason.unwrap().contains("prerequisite"));
    }
}
