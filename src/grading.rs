use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FinalGrade, GradeState, GradeWeights};

pub const WEIGHT_EPSILON: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum GradeError {
    // Validation errors
    #[error("grade weights must sum to 1.0, got {0:.3}")]
    InvalidWeights(f64),
    #[error("a rejection reason is required")]
    ReasonRequired,
    // State errors: caller misuse, not a business rule denial
    #[error("grade is already approved")]
    AlreadyApproved,
    #[error("grade is not awaiting a decision")]
    NotAwaitingDecision,
    #[error("only a rejected grade may be recomputed")]
    NotRejected,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Fixed institutional tiers, inclusive lower bounds. Labels are domain
// constants, not localized strings.
pub fn grade_tier(score: f64) -> &'static str {
    if score >= 95.0 {
        "ممتاز"
    } else if score >= 90.0 {
        "جيد جداً"
    } else if score >= 80.0 {
        "جيد"
    } else if score >= 70.0 {
        "مقبول"
    } else if score >= 60.0 {
        "ضعيف"
    } else {
        "راسب"
    }
}

pub fn compute_final_grade(
    supervisor_score: f64,
    discussion_score: f64,
    weights: GradeWeights,
) -> Result<FinalGrade, GradeError> {
    let sum = weights.supervisor_weight + weights.discussion_weight;
    if (sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(GradeError::InvalidWeights(sum));
    }

    let final_score = round2(
        supervisor_score * weights.supervisor_weight
            + discussion_score * weights.discussion_weight,
    );

    Ok(FinalGrade {
        supervisor_score,
        discussion_score,
        weights,
        final_score,
        final_grade: grade_tier(final_score).to_string(),
        state: GradeState::Computed,
        approver_id: None,
        approval_comments: None,
        decided_at: None,
    })
}

/// `approved` is terminal; a second approval is reported as a state error and
/// the grade is left untouched. Role gating (committee only) is composed at
/// the call site via the permission matrix.
pub fn approve_grade(
    grade: &FinalGrade,
    approver_id: Uuid,
    comments: Option<String>,
) -> Result<FinalGrade, GradeError> {
    match grade.state {
        GradeState::Approved => return Err(GradeError::AlreadyApproved),
        GradeState::Rejected => return Err(GradeError::NotAwaitingDecision),
        GradeState::Computed => {}
    }

    let mut approved = grade.clone();
    approved.state = GradeState::Approved;
    approved.approver_id = Some(approver_id);
    approved.approval_comments = comments;
    approved.decided_at = Some(Utc::now().date_naive());
    Ok(approved)
}

pub fn reject_grade(
    grade: &FinalGrade,
    approver_id: Uuid,
    reason: &str,
) -> Result<FinalGrade, GradeError> {
    match grade.state {
        GradeState::Approved => return Err(GradeError::AlreadyApproved),
        GradeState::Rejected => return Err(GradeError::NotAwaitingDecision),
        GradeState::Computed => {}
    }
    if reason.trim().is_empty() {
        return Err(GradeError::ReasonRequired);
    }

    let mut rejected = grade.clone();
    rejected.state = GradeState::Rejected;
    rejected.approver_id = Some(approver_id);
    rejected.approval_comments = Some(reason.to_string());
    rejected.decided_at = Some(Utc::now().date_naive());
    Ok(rejected)
}

/// The one re-entry arc of the state machine: a rejected grade, given fresh
/// component scores, returns to `computed` with the decision fields cleared.
pub fn recompute_grade(
    grade: &FinalGrade,
    supervisor_score: f64,
    discussion_score: f64,
) -> Result<FinalGrade, GradeError> {
    if grade.state != GradeState::Rejected {
        return Err(GradeError::NotRejected);
    }

    compute_final_grade(supervisor_score, discussion_score, grade.weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(supervisor: f64, discussion: f64) -> GradeWeights {
        GradeWeights {
            supervisor_weight: supervisor,
            discussion_weight: discussion,
        }
    }

    #[test]
    fn weighted_score_and_tier() {
        let grade = compute_final_grade(80.0, 90.0, weights(0.4, 0.6)).unwrap();
        assert!((grade.final_score - 86.0).abs() < 1e-9);
        assert_eq!(grade.final_grade, "جيد");
        assert_eq!(grade.state, GradeState::Computed);
    }

    #[test]
    fn tier_lower_bounds_are_inclusive() {
        let grade = compute_final_grade(95.0, 95.0, weights(0.5, 0.5)).unwrap();
        assert!((grade.final_score - 95.0).abs() < 1e-9);
        assert_eq!(grade.final_grade, "ممتاز");

        let grade = compute_final_grade(100.0, 100.0, weights(0.5, 0.5)).unwrap();
        assert_eq!(grade.final_grade, "ممتاز");

        assert_eq!(grade_tier(90.0), "جيد جداً");
        assert_eq!(grade_tier(89.99), "جيد");
        assert_eq!(grade_tier(70.0), "مقبول");
        assert_eq!(grade_tier(60.0), "ضعيف");
        assert_eq!(grade_tier(59.99), "راسب");
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = compute_final_grade(80.0, 90.0, weights(0.4, 0.5)).unwrap_err();
        assert!(matches!(err, GradeError::InvalidWeights(sum) if (sum - 0.9).abs() < 1e-9));

        let err = compute_final_grade(80.0, 90.0, weights(0.7, 0.6)).unwrap_err();
        assert!(matches!(err, GradeError::InvalidWeights(_)));

        // epsilon tolerance for float weight arithmetic
        assert!(compute_final_grade(80.0, 90.0, weights(0.3, 0.7)).is_ok());
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let grade = compute_final_grade(83.333, 90.0, weights(0.4, 0.6)).unwrap();
        assert!((grade.final_score - 87.33).abs() < 1e-9);
    }

    #[test]
    fn approve_is_terminal() {
        let computed = compute_final_grade(90.0, 90.0, weights(0.5, 0.5)).unwrap();
        let approver = Uuid::new_v4();
        let approved = approve_grade(&computed, approver, Some("well done".to_string())).unwrap();
        assert_eq!(approved.state, GradeState::Approved);
        assert_eq!(approved.approver_id, Some(approver));

        let err = approve_grade(&approved, approver, None).unwrap_err();
        assert_eq!(err, GradeError::AlreadyApproved);
        assert_eq!(approved.state, GradeState::Approved);
    }

    #[test]
    fn reject_requires_a_reason() {
        let computed = compute_final_grade(90.0, 90.0, weights(0.5, 0.5)).unwrap();
        let err = reject_grade(&computed, Uuid::new_v4(), "   ").unwrap_err();
        assert_eq!(err, GradeError::ReasonRequired);
    }

    #[test]
    fn rejected_grade_recomputes_then_approves() {
        let computed = compute_final_grade(70.0, 70.0, weights(0.5, 0.5)).unwrap();
        let approver = Uuid::new_v4();
        let rejected = reject_grade(&computed, approver, "scores disputed").unwrap();
        assert_eq!(rejected.state, GradeState::Rejected);

        let recomputed = recompute_grade(&rejected, 85.0, 91.0).unwrap();
        assert_eq!(recomputed.state, GradeState::Computed);
        assert_eq!(recomputed.approver_id, None);
        assert!((recomputed.final_score - 88.0).abs() < 1e-9);

        let approved = approve_grade(&recomputed, approver, None).unwrap();
        assert_eq!(approved.state, GradeState::Approved);
    }

    #[test]
    fn recompute_only_from_rejected() {
        let computed = compute_final_grade(70.0, 70.0, weights(0.5, 0.5)).unwrap();
        assert_eq!(
            recompute_grade(&computed, 80.0, 80.0).unwrap_err(),
            GradeError::NotRejected
        );

        let approved = approve_grade(&computed, Uuid::new_v4(), None).unwrap();
        assert_eq!(
            recompute_grade(&approved, 80.0, 80.0).unwrap_err(),
            GradeError::NotRejected
        );
    }

    #[test]
    fn decided_grades_refuse_further_decisions() {
        let computed = compute_final_grade(70.0, 70.0, weights(0.5, 0.5)).unwrap();
        let rejected = reject_grade(&computed, Uuid::new_v4(), "incomplete demo").unwrap();
        assert_eq!(
            approve_grade(&rejected, Uuid::new_v4(), None).unwrap_err(),
            GradeError::NotAwaitingDecision
        );
        assert_eq!(
            reject_grade(&rejected, Uuid::new_v4(), "again").unwrap_err(),
            GradeError::NotAwaitingDecision
        );
    }
}
