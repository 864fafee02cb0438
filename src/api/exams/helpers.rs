use std::collections::HashMap;

use crate::core::config::ExamSettings;
use crate::db::models::{ExamQuestion, ExamQuestionChoice};
use crate::db::types::{DifficultyLevel, MediaKind};
use crate::repositories::exam_questions::ExamQuestionMedia;
use crate::schemas::exam::{AttemptQuestionResponse, AttemptSectionResponse};

pub(super) const SECTION_LISTENING: &str = "listening";
pub(super) const SECTION_READING: &str = "reading";

/// TOEIC parts 1-4 are listening, 5-7 are reading.
pub(super) fn section_for_part(part: i16) -> Option<&'static str> {
    match part {
        1..=4 => Some(SECTION_LISTENING),
        5..=7 => Some(SECTION_READING),
        _ => None,
    }
}

/// Comma-joined subset of the two section names present in a batch of
/// parts, listening first.
pub(super) fn section_names_for_parts(parts: &[i16]) -> String {
    let has_listening = parts.iter().any(|part| section_for_part(*part) == Some(SECTION_LISTENING));
    let has_reading = parts.iter().any(|part| section_for_part(*part) == Some(SECTION_READING));

    let mut names = Vec::new();
    if has_listening {
        names.push(SECTION_LISTENING);
    }
    if has_reading {
        names.push(SECTION_READING);
    }
    names.join(",")
}

/// Statistical mode of the per-question difficulty tags. Ties go to the
/// tag seen first in the batch; an empty batch falls back to the
/// configured default.
pub(super) fn difficulty_mode(
    tags: impl Iterator<Item = DifficultyLevel>,
    fallback: DifficultyLevel,
) -> DifficultyLevel {
    let mut tally: Vec<(DifficultyLevel, usize)> = Vec::new();
    for tag in tags {
        match tally.iter_mut().find(|(level, _)| *level == tag) {
            Some((_, count)) => *count += 1,
            None => tally.push((tag, 1)),
        }
    }

    tally
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(level, _)| level)
        .unwrap_or(fallback)
}

pub(super) fn part_code(part: i16) -> String {
    format!("part_{part}")
}

/// `section_seconds` is stored as "reading,listening".
pub(super) fn parse_section_seconds(raw: &str, exam_settings: &ExamSettings) -> (i64, i64) {
    let mut parts = raw.split(',');
    let reading = parts
        .next()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(exam_settings.reading_seconds);
    let listening = parts
        .next()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(exam_settings.listening_seconds);
    (reading, listening)
}

/// Partitions ordered snapshot questions into the non-empty
/// Listening/Reading sections of the attempt view.
pub(super) fn build_sections(
    questions: Vec<ExamQuestion>,
    choices: Vec<ExamQuestionChoice>,
    media: Vec<ExamQuestionMedia>,
    section_seconds: (i64, i64),
) -> Vec<AttemptSectionResponse> {
    let mut options_by_question: HashMap<i64, Vec<String>> = HashMap::new();
    for choice in choices {
        options_by_question.entry(choice.exam_question_id).or_default().push(choice.content);
    }

    let mut media_by_question: HashMap<i64, Vec<ExamQuestionMedia>> = HashMap::new();
    for item in media {
        media_by_question.entry(item.exam_question_id).or_default().push(item);
    }

    let (reading_seconds, listening_seconds) = section_seconds;
    let mut listening = Vec::new();
    let mut reading = Vec::new();

    for question in questions {
        let Some(section) = section_for_part(question.part) else {
            continue;
        };

        let mut image = None;
        let mut audio = None;
        let mut transcript = None;
        for item in media_by_question.remove(&question.id).unwrap_or_default() {
            match item.media_type {
                MediaKind::Image => image = Some(item.url),
                MediaKind::Audio => audio = Some(item.url),
                MediaKind::Transcript => transcript = Some(item.url),
            }
        }

        let view = AttemptQuestionResponse {
            id: question.id,
            question: question.content,
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            image,
            audio,
            transcript,
            section: section.to_string(),
            part_code: part_code(question.part),
        };

        if section == SECTION_LISTENING {
            listening.push(view);
        } else {
            reading.push(view);
        }
    }

    let mut sections = Vec::new();
    if !listening.is_empty() {
        sections.push(AttemptSectionResponse {
            name: SECTION_LISTENING.to_string(),
            time: listening_seconds,
            questions: listening,
        });
    }
    if !reading.is_empty() {
        sections.push(AttemptSectionResponse {
            name: SECTION_READING.to_string(),
            time: reading_seconds,
            questions: reading,
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam_settings() -> ExamSettings {
        ExamSettings {
            default_difficulty: DifficultyLevel::Easy,
            correct_option_index: 0,
            points_per_question: 5,
            reading_seconds: 4500,
            listening_seconds: 2700,
        }
    }

    #[test]
    fn parts_map_to_sections() {
        assert_eq!(section_for_part(1), Some(SECTION_LISTENING));
        assert_eq!(section_for_part(4), Some(SECTION_LISTENING));
        assert_eq!(section_for_part(5), Some(SECTION_READING));
        assert_eq!(section_for_part(7), Some(SECTION_READING));
        assert_eq!(section_for_part(8), None);
    }

    #[test]
    fn section_names_join_listening_first() {
        assert_eq!(section_names_for_parts(&[5, 1]), "listening,reading");
        assert_eq!(section_names_for_parts(&[5, 6]), "reading");
        assert_eq!(section_names_for_parts(&[2]), "listening");
        assert_eq!(section_names_for_parts(&[]), "");
    }

    #[test]
    fn difficulty_mode_picks_most_frequent() {
        let tags = [
            DifficultyLevel::Hard,
            DifficultyLevel::Easy,
            DifficultyLevel::Hard,
        ];
        assert_eq!(
            difficulty_mode(tags.into_iter(), DifficultyLevel::Easy),
            DifficultyLevel::Hard
        );
    }

    #[test]
    fn difficulty_mode_tie_goes_to_first_seen() {
        let tags = [DifficultyLevel::Medium, DifficultyLevel::Hard];
        assert_eq!(
            difficulty_mode(tags.into_iter(), DifficultyLevel::Easy),
            DifficultyLevel::Medium
        );
    }

    #[test]
    fn difficulty_mode_falls_back_when_untagged() {
        assert_eq!(
            difficulty_mode(std::iter::empty(), DifficultyLevel::Easy),
            DifficultyLevel::Easy
        );
    }

    #[test]
    fn section_seconds_parse_with_fallbacks() {
        let settings = exam_settings();
        assert_eq!(parse_section_seconds("3600,1800", &settings), (3600, 1800));
        assert_eq!(parse_section_seconds("", &settings), (4500, 2700));
        assert_eq!(parse_section_seconds("x,900", &settings), (4500, 900));
    }

    #[test]
    fn part_code_format() {
        assert_eq!(part_code(5), "part_5");
    }
}
