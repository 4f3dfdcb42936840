//! Deterministic answer scoring.
//!
//! Answers that try to game the grader or are too short to show any
//! understanding score zero. Everything else is scored by how many key terms
//! of the reference answer it covers.

use std::collections::HashSet;

use shared::{
    domain::QuestionRecord,
    protocol::{Evaluation, Report, ReportEvaluation},
};

const GAMING_PHRASES: &[&str] = &[
    "give me",
    "award me",
    "score me",
    "marks",
    "points",
    "please give",
    "i want",
    "grant me",
    "pass me",
    "correct",
];
const MIN_ANSWER_CHARS: usize = 15;
const MIN_ANSWER_WORDS: usize = 3;
const MIN_KEYWORD_CHARS: usize = 4;
const BASE_SCORE: f64 = 20.0;
const NO_REFERENCE_SCORE: f64 = 50.0;
const STOP_WORDS: &[&str] = &[
    "also", "another", "based", "because", "cell", "cells", "does", "each", "from", "into",
    "only", "same", "should", "such", "than", "that", "their", "them", "then", "there", "these",
    "they", "this", "used", "uses", "using", "value", "when", "where", "which", "will", "with",
];

pub fn evaluate_answer(record: &QuestionRecord, candidate: &str) -> Evaluation {
    let lower = candidate.to_lowercase();
    if GAMING_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return Evaluation {
            score: 0.0,
            feedback: "Answer rejected: please provide a technical answer demonstrating Excel knowledge."
                .to_string(),
            related_concepts: vec!["Proper answer format".into(), "Technical content".into()],
        };
    }

    let trimmed = candidate.trim();
    if trimmed.chars().count() < MIN_ANSWER_CHARS
        || trimmed.split_whitespace().count() < MIN_ANSWER_WORDS
    {
        return Evaluation {
            score: 0.0,
            feedback: "Answer is too short. Please provide a complete explanation that demonstrates your Excel knowledge."
                .to_string(),
            related_concepts: vec!["Answer completeness".into(), "Technical detail".into()],
        };
    }

    let reference = keywords(&record.answer);
    if reference.is_empty() {
        return Evaluation {
            score: NO_REFERENCE_SCORE,
            feedback: "No reference answer is available for this question; the answer was accepted without detailed scoring."
                .to_string(),
            related_concepts: Vec::new(),
        };
    }

    let answered: HashSet<String> = keywords(candidate).into_iter().collect();
    let (covered, missing): (Vec<&String>, Vec<&String>) =
        reference.iter().partition(|word| answered.contains(*word));

    let coverage = covered.len() as f64 / reference.len() as f64;
    let score = (BASE_SCORE + (100.0 - BASE_SCORE) * coverage).round();
    let missing_list = missing
        .iter()
        .take(3)
        .map(|word| word.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let feedback = if score >= 90.0 {
        "Complete, technically accurate answer covering the key points.".to_string()
    } else if score >= 70.0 {
        format!("Good technical explanation with minor omissions, such as: {missing_list}.")
    } else if score >= 50.0 {
        format!("Basic explanation; key details are missing, such as: {missing_list}.")
    } else {
        format!("Partial explanation with significant gaps. Review: {missing_list}.")
    };

    let related_concepts = if missing.is_empty() {
        reference.iter().take(2).cloned().collect()
    } else {
        missing.iter().take(2).map(|word| (*word).clone()).collect()
    };

    Evaluation {
        score,
        feedback,
        related_concepts,
    }
}

/// Distinct lowercase key terms of `text`, in order of first appearance.
fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

pub fn overall_rating(average: f64) -> &'static str {
    if average >= 90.0 {
        "Outstanding"
    } else if average >= 80.0 {
        "Excellent"
    } else if average >= 70.0 {
        "Good"
    } else if average >= 60.0 {
        "Fair"
    } else {
        "Needs Improvement"
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize(answers: &[String], evaluations: &[Evaluation]) -> Report {
    let average = if evaluations.is_empty() {
        0.0
    } else {
        let total: f64 = evaluations.iter().map(|e| e.score).sum();
        round2(total / evaluations.len() as f64)
    };

    let points = evaluations
        .iter()
        .enumerate()
        .map(|(index, e)| format!("Q{} ({}/100): {}", index + 1, e.score, e.feedback))
        .collect::<Vec<_>>()
        .join("\n");

    Report {
        final_score: Some(average),
        answers: answers.to_vec(),
        evaluations: evaluations
            .iter()
            .map(|e| ReportEvaluation {
                score: e.score,
                feedback: e.feedback.clone(),
            })
            .collect(),
        overall_feedback: Some(format!(
            "Final Score: {average}/100 - {}\n\nDetailed Feedback:\n{points}",
            overall_rating(average)
        )),
    }
}

#[cfg(test)]
#[path = "tests/scoring_tests.rs"]
mod tests;
