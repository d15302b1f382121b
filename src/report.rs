use std::fmt::Write;

use crate::eligibility::EligibilityResult;
use crate::models::{FinalGrade, GradeState, StudentRecord};

fn check_mark(passed: bool) -> &'static str {
    if passed {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn build_eligibility_checklist(student: &StudentRecord, result: &EligibilityResult) -> String {
    let mut output = String::new();
    let details = &result.details;

    let _ = writeln!(output, "# Registration Eligibility");
    let _ = writeln!(output, "Student: {} ({})", student.full_name, student.email);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- {} Credit hours: {} of {} completed ({} remaining)",
        check_mark(details.has_enough_hours),
        details.hours.completed,
        details.hours.required,
        details.hours.remaining
    );
    let _ = writeln!(
        output,
        "- {} GPA: {:.2} against minimum {:.2} ({:+.2})",
        check_mark(details.has_minimum_gpa),
        details.gpa.current,
        details.gpa.minimum,
        details.gpa.difference
    );
    match details.current_project {
        Some(project_id) if !details.is_not_registered_in_another_project => {
            let _ = writeln!(
                output,
                "- [ ] Registration: already registered in project {project_id}"
            );
        }
        _ => {
            let _ = writeln!(output, "- [x] Registration: no conflicting project");
        }
    }
    let _ = writeln!(
        output,
        "- {} Prerequisite courses complete",
        check_mark(details.completed_prerequisites)
    );

    let _ = writeln!(output);
    if result.eligible {
        let _ = writeln!(output, "Eligible to register.");
    } else {
        let reason = result.reason.as_deref().unwrap_or("not eligible");
        let _ = writeln!(output, "Not eligible: {reason}.");
    }

    output
}

pub fn build_grade_sheet(grade: &FinalGrade) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Final Grade Sheet");
    let _ = writeln!(
        output,
        "- Supervisor score: {:.2} (weight {:.2})",
        grade.supervisor_score, grade.weights.supervisor_weight
    );
    let _ = writeln!(
        output,
        "- Discussion score: {:.2} (weight {:.2})",
        grade.discussion_score, grade.weights.discussion_weight
    );
    let _ = writeln!(
        output,
        "- Final score: {:.2} ({})",
        grade.final_score, grade.final_grade
    );

    match grade.state {
        GradeState::Computed => {
            let _ = writeln!(output, "- Status: awaiting committee decision");
        }
        GradeState::Approved => {
            let _ = writeln!(output, "- Status: approved");
        }
        GradeState::Rejected => {
            let _ = writeln!(output, "- Status: rejected");
        }
    }
    if let Some(approver) = grade.approver_id {
        let _ = writeln!(output, "- Decided by: {approver}");
    }
    if let Some(comments) = grade.approval_comments.as_deref() {
        let _ = writeln!(output, "- Comments: {comments}");
    }
    if let Some(decided_at) = grade.decided_at {
        let _ = writeln!(output, "- Decided on: {decided_at}");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::{evaluate_eligibility, DEFAULT_MINIMUM_GPA};
    use crate::grading::compute_final_grade;
    use crate::models::GradeWeights;
    use uuid::Uuid;

    fn sample_student() -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            full_name: "Layla Hassan".to_string(),
            email: "layla.hassan@uni.example".to_string(),
            gpa: 1.8,
            completed_credit_hours: 90,
            required_credit_hours: 100,
            completed_prerequisites: true,
            current_project_id: None,
        }
    }

    #[test]
    fn checklist_shows_every_criterion() {
        let student = sample_student();
        let result = evaluate_eligibility(&student, Uuid::new_v4(), DEFAULT_MINIMUM_GPA);
        let report = build_eligibility_checklist(&student, &result);
        assert!(report.contains("- [ ] Credit hours: 90 of 100 completed (10 remaining)"));
        assert!(report.contains("- [ ] GPA: 1.80 against minimum 2.00 (-0.20)"));
        assert!(report.contains("- [x] Registration: no conflicting project"));
        assert!(report.contains("- [x] Prerequisite courses complete"));
        assert!(report.contains("Not eligible:"));
    }

    #[test]
    fn grade_sheet_reports_breakdown_and_state() {
        let grade = compute_final_grade(
            80.0,
            90.0,
            GradeWeights {
                supervisor_weight: 0.4,
                discussion_weight: 0.6,
            },
        )
        .unwrap();
        let sheet = build_grade_sheet(&grade);
        assert!(sheet.contains("Final score: 86.00"));
        assert!(sheet.contains("جيد"));
        assert!(sheet.contains("awaiting committee decision"));
    }
}
