use crate::session::{TestDuration, TypingSession};
use crate::util::{mean_abs_deviation, split_words};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Number of entries reported in `commonErrorWords`.
pub const TOP_ERROR_WORDS: usize = 5;

/// Mean absolute deviation of keystroke samples (ms) above which speed is "highly variable".
pub const SPEED_VARIABILITY_THRESHOLD_MS: f64 = 100.0;

const IMPULSIVITY_THRESHOLD: f64 = 1.0;
const ERROR_RATIO_THRESHOLD: f64 = 0.1;
const RESILIENT_WPM: f64 = 50.0;
const PRESSURE_ACCURACY: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorWordCount {
    pub word: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SpeedTrend {
    #[serde(rename = "consistent")]
    #[strum(serialize = "consistent")]
    Consistent,
    #[serde(rename = "highly variable")]
    #[strum(serialize = "highly variable")]
    HighlyVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPatterns {
    pub common_error_words: Vec<ErrorWordCount>,
    pub speed_trend: SpeedTrend,
    pub total_errors: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Impulsivity {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum CognitiveLoad {
    #[serde(rename = "struggles with complexity")]
    #[strum(serialize = "struggles with complexity")]
    StrugglesWithComplexity,
    #[serde(rename = "handles complexity well")]
    #[strum(serialize = "handles complexity well")]
    HandlesComplexityWell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Resilience {
    High,
    Low,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum PressureResponse {
    #[serde(rename = "affected by time pressure")]
    #[strum(serialize = "affected by time pressure")]
    AffectedByTimePressure,
    #[serde(rename = "handles pressure well")]
    #[strum(serialize = "handles pressure well")]
    HandlesPressureWell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychologicalInsights {
    pub impulsivity: Impulsivity,
    pub cognitive_load: CognitiveLoad,
    pub resilience: Resilience,
    pub pressure_response: PressureResponse,
}

/// Derived view of one session; recomputed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalysis {
    pub error_patterns: ErrorPatterns,
    pub psychological_insights: PsychologicalInsights,
}

pub fn analyze(session: &TypingSession) -> SessionAnalysis {
    SessionAnalysis {
        error_patterns: analyze_error_patterns(session),
        psychological_insights: derive_insights(session),
    }
}

/// Compares reference and typed words by position. Words past the end of the
/// shorter text are ignored, and a shifted word counts as a mismatch at every
/// later index rather than being realigned.
pub fn analyze_error_patterns(session: &TypingSession) -> ErrorPatterns {
    let original = split_words(&session.raw_text);
    let typed = split_words(&session.typed_text);

    // Insertion order is kept so equal counts rank by first mismatch.
    let mut counts: Vec<ErrorWordCount> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();

    for (expected, actual) in original.iter().copied().zip(typed.iter().copied()) {
        if expected != actual {
            match index_of.get(expected) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index_of.insert(expected, counts.len());
                    counts.push(ErrorWordCount {
                        word: expected.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    let common_error_words = counts
        .into_iter()
        .sorted_by(|a, b| b.count.cmp(&a.count))
        .take(TOP_ERROR_WORDS)
        .collect::<Vec<_>>();

    ErrorPatterns {
        common_error_words,
        speed_trend: speed_trend(&session.typing_durations),
        total_errors: session.total_errors,
        accuracy: session.accuracy,
    }
}

pub fn speed_trend(typing_durations: &[f64]) -> SpeedTrend {
    match mean_abs_deviation(typing_durations) {
        Some(score) if score > SPEED_VARIABILITY_THRESHOLD_MS => SpeedTrend::HighlyVariable,
        _ => SpeedTrend::Consistent,
    }
}

pub fn derive_insights(session: &TypingSession) -> PsychologicalInsights {
    let insights = PsychologicalInsights {
        impulsivity: impulsivity(session.wpm, session.accuracy),
        cognitive_load: cognitive_load(session.total_errors, &session.typed_text),
        resilience: resilience(session.wpm, &session.typing_durations),
        pressure_response: pressure_response(session.duration, session.accuracy),
    };
    debug!(session_id = session.id, ?insights, "derived insights");
    insights
}

/// Zero accuracy counts as impulsive: any output at all with nothing right.
pub fn impulsivity(wpm: f64, accuracy: f64) -> Impulsivity {
    if accuracy <= 0.0 {
        return Impulsivity::High;
    }
    if wpm / (accuracy / 100.0) > IMPULSIVITY_THRESHOLD {
        Impulsivity::High
    } else {
        Impulsivity::Low
    }
}

/// Ratio is errors per typed character, not per word.
pub fn cognitive_load(total_errors: u32, typed_text: &str) -> CognitiveLoad {
    let typed_chars = typed_text.chars().count();
    if typed_chars == 0 {
        return CognitiveLoad::HandlesComplexityWell;
    }
    if total_errors as f64 / typed_chars as f64 > ERROR_RATIO_THRESHOLD {
        CognitiveLoad::StrugglesWithComplexity
    } else {
        CognitiveLoad::HandlesComplexityWell
    }
}

/// Only the presence of timing samples matters here, not their shape.
pub fn resilience(wpm: f64, typing_durations: &[f64]) -> Resilience {
    if typing_durations.is_empty() {
        Resilience::Average
    } else if wpm > RESILIENT_WPM {
        Resilience::High
    } else {
        Resilience::Low
    }
}

pub fn pressure_response(duration: TestDuration, accuracy: f64) -> PressureResponse {
    if duration == TestDuration::Fifteen && accuracy < PRESSURE_ACCURACY {
        PressureResponse::AffectedByTimePressure
    } else {
        PressureResponse::HandlesPressureWell
    }
}
