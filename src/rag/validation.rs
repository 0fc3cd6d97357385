//! Completeness check for generated itineraries

use std::fmt;

use crate::models::ChatMessage;

/// Follow-up turn sent when the first answer is missing days
pub const RETRY_FOLLOWUP: &str = "The previous response was incomplete. Please complete the missing day(s) and ensure all days are covered.";

/// Outcome of checking an answer against the requested trip length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Incomplete { missing_day: u32 },
}

impl Validation {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid"),
            Self::Incomplete { missing_day } => {
                write!(f, "Response incomplete: Missing Day {missing_day}.")
            }
        }
    }
}

/// An answer is complete when it mentions the final day literally
#[must_use]
pub fn validate_response(answer: &str, trip_length: u32) -> Validation {
    if answer.contains(&format!("Day {trip_length}")) {
        Validation::Valid
    } else {
        Validation::Incomplete {
            missing_day: trip_length,
        }
    }
}

/// The original prompt extended with the completion request
#[must_use]
pub fn retry_prompt(prompt: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = prompt.to_vec();
    messages.push(ChatMessage::user(RETRY_FOLLOWUP));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_final_day_is_incomplete() {
        let result = validate_response("Day 1: Hanoi\nDay 2: Ha Long", 3);
        assert_eq!(result, Validation::Incomplete { missing_day: 3 });
        assert!(!result.is_valid());
        assert_eq!(result.to_string(), "Response incomplete: Missing Day 3.");
    }

    #[test]
    fn test_final_day_present_is_valid() {
        let result = validate_response("Day 1 ... Day 2 ... Day 3: Hue", 3);
        assert_eq!(result, Validation::Valid);
        assert_eq!(result.to_string(), "Valid");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(!validate_response("day 3", 3).is_valid());
    }

    #[test]
    fn test_retry_prompt_appends_followup() {
        let prompt = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let retry = retry_prompt(&prompt);

        assert_eq!(retry.len(), 3);
        assert_eq!(&retry[..2], &prompt[..]);
        assert_eq!(retry[2], ChatMessage::user(RETRY_FOLLOWUP));
    }
}
