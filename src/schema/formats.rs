//! String format checks applied after type validation

use std::sync::OnceLock;

use regex::Regex;

/// Local part of word characters, dots and dashes; at least one dotted
/// domain label; a top-level label of two or more characters.
const EMAIL_PATTERN: &str = r"^[\w\-\.]+@([\w-]+\.)+[\w-]{2,}$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

/// Whether `candidate` looks like a deliverable email address
pub fn is_valid_email(candidate: &str) -> bool {
    candidate.is_ascii() && email_regex().is_match(candidate)
}
