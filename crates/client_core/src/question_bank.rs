use std::{fs, path::Path};

use shared::domain::QuestionRecord;

use crate::error::ClientError;

/// Static, positionally indexed list of interview questions.
///
/// Reports do not carry question text. Row `i` of a report is labelled with
/// `questions[i]`, so the bank must list questions in the order the
/// evaluator asks them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    pub fn from_records(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ClientError> {
        let records: Vec<QuestionRecord> = serde_json::from_str(raw)
            .map_err(|err| ClientError::QuestionBank(err.to_string()))?;
        Ok(Self { records })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            ClientError::QuestionBank(format!("failed to read '{}': {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn question(&self, index: usize) -> Option<&str> {
        self.records
            .get(index)
            .map(|record| record.question.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }
}

#[cfg(test)]
#[path = "tests/question_bank_tests.rs"]
mod tests;
