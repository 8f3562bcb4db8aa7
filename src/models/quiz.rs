use serde::{Deserialize, Serialize};

use crate::utils::numeric::{deserialize_integer, deserialize_optional_integer};

/// Answer format of a quiz.
///
/// Only short answers are playable. Any other tag stored by the editor is
/// kept verbatim so the record still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnswerType {
    ShortAnswer,
    Other(String),
}

impl AnswerType {
    const SHORT_ANSWER: &'static str = "shortAnswer";
    /// Tag written by the Korean quiz editor
    const SHORT_ANSWER_ALIAS: &'static str = "단답형";
}

impl From<String> for AnswerType {
    fn from(tag: String) -> Self {
        if tag == Self::SHORT_ANSWER || tag == Self::SHORT_ANSWER_ALIAS {
            AnswerType::ShortAnswer
        } else {
            AnswerType::Other(tag)
        }
    }
}

impl From<AnswerType> for String {
    fn from(kind: AnswerType) -> Self {
        match kind {
            AnswerType::ShortAnswer => AnswerType::SHORT_ANSWER.to_string(),
            AnswerType::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswerQuestionInfo {
    pub answer: String,
}

/// A single question from a teacher's quiz pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// Store key; filled in by the store since records don't carry it
    #[serde(default)]
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(deserialize_with = "deserialize_integer")]
    pub year: i32,
    #[serde(deserialize_with = "deserialize_integer")]
    pub difficulty: u8,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub short_answer_question_info: Option<ShortAnswerQuestionInfo>,
    /// Points awarded on a correct answer; the game default applies when unset
    #[serde(default, deserialize_with = "deserialize_optional_integer")]
    pub score: Option<u32>,
    #[serde(default)]
    pub finished: bool,
}

/// Star display derived from difficulty: two difficulty points per star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarRating {
    pub full: u8,
    pub half: u8,
}

impl Quiz {
    pub fn short_answer(&self) -> Option<&str> {
        self.short_answer_question_info
            .as_ref()
            .map(|info| info.answer.as_str())
    }

    pub fn is_short_answer(&self) -> bool {
        self.answer_type == AnswerType::ShortAnswer
    }

    pub fn star_rating(&self) -> StarRating {
        StarRating {
            full: self.difficulty / 2,
            half: self.difficulty % 2,
        }
    }

    /// "subject / keyword", or just the subject when there is no keyword
    pub fn label(&self) -> String {
        match self.keyword.as_deref().filter(|k| !k.is_empty()) {
            Some(keyword) => format!("{} / {}", self.subject, keyword),
            None => self.subject.clone(),
        }
    }
}
