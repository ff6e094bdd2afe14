use crate::session::{NewSession, TestDuration, TextType};
use crate::util::split_words;
use std::time::Duration;

/// Raw outcome of a timed test, before wpm and accuracy are worked out.
#[derive(Debug, Clone)]
pub struct FinishedTest {
    pub duration: TestDuration,
    pub text_type: TextType,
    pub raw_text: String,
    pub typed_text: String,
    pub elapsed: Duration,
    /// milliseconds since the test started, one per keystroke
    pub typing_durations: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharTally {
    pub correct: u32,
    pub incorrect: u32,
}

impl CharTally {
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Whole-number percentage, 0 when nothing was typed.
    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        ((self.correct as f64 / self.total() as f64) * 100.0).round()
    }
}

/// Each typed character is checked against the reference character at the same index.
pub fn tally_chars(raw_text: &str, typed_text: &str) -> CharTally {
    let mut reference = raw_text.chars();
    let mut tally = CharTally {
        correct: 0,
        incorrect: 0,
    };

    for typed in typed_text.chars() {
        if reference.next() == Some(typed) {
            tally.correct += 1;
        } else {
            tally.incorrect += 1;
        }
    }

    tally
}

pub fn words_per_minute(typed_text: &str, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    let trimmed = typed_text.trim();
    if minutes <= 0.0 || trimmed.is_empty() {
        return 0.0;
    }
    (split_words(trimmed).len() as f64 / minutes).round()
}

/// Reference words whose typed counterpart differs, in typing order. Typed
/// words past the end of the reference, and empty reference words left by
/// repeated spaces, are skipped.
pub fn error_words(raw_text: &str, typed_text: &str) -> Vec<String> {
    let original = split_words(raw_text);
    split_words(typed_text)
        .into_iter()
        .zip(original)
        .filter(|(typed, expected)| !expected.is_empty() && typed != expected)
        .map(|(_, expected)| expected.to_string())
        .collect()
}

pub fn score(test: FinishedTest) -> NewSession {
    let tally = tally_chars(&test.raw_text, &test.typed_text);

    NewSession {
        duration: test.duration,
        wpm: words_per_minute(&test.typed_text, test.elapsed),
        accuracy: tally.accuracy(),
        total_errors: tally.incorrect,
        error_words: error_words(&test.raw_text, &test.typed_text),
        typing_durations: test.typing_durations,
        text_type: test.text_type,
        raw_text: test.raw_text,
        typed_text: test.typed_text,
    }
}
