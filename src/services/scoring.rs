//! Grades submitted answers against an attempt's frozen snapshot. Every
//! question is worth the same configured weight; there is no partial
//! credit and no negative scoring.

use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct GradedAnswer {
    pub(crate) exam_question_id: i64,
    pub(crate) selected: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug)]
pub(crate) struct GradingResult {
    pub(crate) graded: Vec<GradedAnswer>,
    pub(crate) correct_count: i32,
    pub(crate) score: i32,
}

/// `correct_answers` maps snapshot question id to its frozen correct
/// answer; submitted answers for unknown ids are ignored.
pub(crate) fn grade(
    correct_answers: &HashMap<i64, String>,
    submitted: &HashMap<i64, String>,
    points_per_question: i32,
) -> GradingResult {
    let mut graded = Vec::with_capacity(submitted.len());
    let mut correct_count = 0;

    for (exam_question_id, selected) in submitted {
        let Some(correct) = correct_answers.get(exam_question_id) else {
            continue;
        };
        let is_correct = selected == correct;
        if is_correct {
            correct_count += 1;
        }
        graded.push(GradedAnswer {
            exam_question_id: *exam_question_id,
            selected: selected.clone(),
            is_correct,
        });
    }

    GradingResult { graded, correct_count, score: correct_count * points_per_question }
}
