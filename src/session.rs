use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a timed test in seconds; only 15 and 30 are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(try_from = "u32", into = "u32")]
pub enum TestDuration {
    #[strum(serialize = "15")]
    Fifteen,
    #[strum(serialize = "30")]
    Thirty,
}

impl TestDuration {
    pub fn secs(self) -> u32 {
        match self {
            TestDuration::Fifteen => 15,
            TestDuration::Thirty => 30,
        }
    }
}

impl TryFrom<u32> for TestDuration {
    type Error = SessionError;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        match secs {
            15 => Ok(TestDuration::Fifteen),
            30 => Ok(TestDuration::Thirty),
            other => Err(SessionError::UnsupportedDuration(other)),
        }
    }
}

impl From<TestDuration> for u32 {
    fn from(d: TestDuration) -> Self {
        d.secs()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextType {
    #[default]
    Words,
    Numbers,
    Punctuation,
    Mixed,
}

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("duration must be 15 or 30 seconds, got {0}")]
    UnsupportedDuration(u32),

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A completed typing test as submitted by the client, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub duration: TestDuration,
    pub wpm: f64,
    pub accuracy: f64,
    pub total_errors: u32,
    #[serde(default)]
    pub error_words: Vec<String>,
    #[serde(default)]
    pub typing_durations: Vec<f64>,
    #[serde(default)]
    pub text_type: TextType,
    pub raw_text: String,
    pub typed_text: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(self.wpm.is_finite() && self.wpm >= 0.0) {
            return Err(SessionError::OutOfRange {
                field: "wpm",
                expected: "a non-negative number",
                value: self.wpm,
            });
        }
        if !(0.0..=100.0).contains(&self.accuracy) {
            return Err(SessionError::OutOfRange {
                field: "accuracy",
                expected: "between 0 and 100",
                value: self.accuracy,
            });
        }
        if let Some(bad) = self
            .typing_durations
            .iter()
            .find(|d| !(d.is_finite() && **d >= 0.0))
        {
            return Err(SessionError::OutOfRange {
                field: "typingDurations",
                expected: "non-negative",
                value: *bad,
            });
        }
        if self.raw_text.is_empty() {
            return Err(SessionError::MissingField("rawText"));
        }
        if self.typed_text.is_empty() {
            return Err(SessionError::MissingField("typedText"));
        }
        Ok(())
    }
}

/// A stored session. Never modified after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSession {
    pub id: i64,
    pub user_id: String,
    pub duration: TestDuration,
    pub wpm: f64,
    pub accuracy: f64,
    pub total_errors: u32,
    pub error_words: Vec<String>,
    pub typing_durations: Vec<f64>,
    pub text_type: TextType,
    pub raw_text: String,
    pub typed_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TypingSession {
    pub fn from_new(id: i64, user_id: &str, new: NewSession, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            duration: new.duration,
            wpm: new.wpm,
            accuracy: new.accuracy,
            total_errors: new.total_errors,
            error_words: new.error_words,
            typing_durations: new.typing_durations,
            text_type: new.text_type,
            raw_text: new.raw_text,
            typed_text: new.typed_text,
            created_at,
            updated_at: created_at,
        }
    }
}
