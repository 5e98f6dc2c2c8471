use crate::error::{EngineError, EngineResult};
use crate::model::{GradeEntry, Subject, PASSING_AVERAGE};
use crate::store::{Enrollment, GradeStore, SubjectCatalog};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Aprobado,
    Reprobado,
    Pendiente,
}

/// Half-away-from-zero rounding to `places` decimals, as the school's
/// printed report cards do it.
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCardRow {
    pub subject_id: String,
    pub subject_name: String,
    pub term1: Option<f64>,
    pub term2: Option<f64>,
    pub term3: Option<f64>,
    pub average: Option<f64>,
    pub status: GradeStatus,
}

impl ReportCardRow {
    pub fn terms(&self) -> [Option<f64>; 3] {
        [self.term1, self.term2, self.term3]
    }
}

/// Builds one report-card row. A partial set of terms never produces an
/// average, not even as an estimate.
pub fn boletin_row(subject: &Subject, terms: [Option<f64>; 3]) -> ReportCardRow {
    let average = match terms {
        [Some(t1), Some(t2), Some(t3)] => Some(round_to((t1 + t2 + t3) / 3.0, 2)),
        _ => None,
    };
    let status = match average {
        Some(avg) if avg >= PASSING_AVERAGE => GradeStatus::Aprobado,
        Some(_) => GradeStatus::Reprobado,
        None => GradeStatus::Pendiente,
    };
    ReportCardRow {
        subject_id: subject.id.clone(),
        subject_name: subject.name.clone(),
        term1: terms[0],
        term2: terms[1],
        term3: terms[2],
        average,
        status,
    }
}

/// Folds a student's grade entries into per-subject term triples.
pub fn collect_terms(grades: &[GradeEntry]) -> HashMap<&str, [Option<f64>; 3]> {
    let mut by_subject: HashMap<&str, [Option<f64>; 3]> = HashMap::new();
    for g in grades {
        let slot = by_subject.entry(g.subject_id.as_str()).or_insert([None; 3]);
        slot[g.term.index()] = g.value;
    }
    by_subject
}

pub fn compute_boletin<S>(store: &S, student_id: &str) -> EngineResult<Vec<ReportCardRow>>
where
    S: Enrollment + SubjectCatalog + GradeStore,
{
    let student = store
        .student(student_id)?
        .ok_or_else(|| EngineError::not_found("student", student_id))?;
    let Some(course_id) = student.course_id.as_deref() else {
        return Ok(Vec::new());
    };

    let subjects = store.subjects_for_course(course_id)?;
    let grades = store.grades_for_student(student_id)?;
    let by_subject = collect_terms(&grades);

    Ok(subjects
        .iter()
        .map(|s| {
            let terms = by_subject.get(s.id.as_str()).copied().unwrap_or([None; 3]);
            boletin_row(s, terms)
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionVerdict {
    Eligible,
    NotEligible,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResult {
    pub verdict: PromotionVerdict,
    pub eligible: bool,
    pub approved_count: usize,
    pub graded_count: usize,
    pub total_count: usize,
    pub percentage: f64,
}

/// Promotion needs a strict majority of the assigned subjects approved:
/// 4 of 8 does not promote, 5 of 8 does.
pub fn evaluate_rows(rows: &[ReportCardRow]) -> PromotionResult {
    let total_count = rows.len();
    let approved_count = rows
        .iter()
        .filter(|r| r.status == GradeStatus::Aprobado)
        .count();
    let graded_count = rows.iter().filter(|r| r.average.is_some()).count();

    if graded_count == 0 {
        return PromotionResult {
            verdict: PromotionVerdict::NoData,
            eligible: false,
            approved_count,
            graded_count,
            total_count,
            percentage: 0.0,
        };
    }

    let eligible = approved_count * 2 > total_count;
    PromotionResult {
        verdict: if eligible {
            PromotionVerdict::Eligible
        } else {
            PromotionVerdict::NotEligible
        },
        eligible,
        approved_count,
        graded_count,
        total_count,
        percentage: round_to(approved_count as f64 / total_count as f64 * 100.0, 1),
    }
}

pub fn evaluate_promotion<S>(store: &S, student_id: &str) -> EngineResult<PromotionResult>
where
    S: Enrollment + SubjectCatalog + GradeStore,
{
    let rows = compute_boletin(store, student_id)?;
    Ok(evaluate_rows(&rows))
}
