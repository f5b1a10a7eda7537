use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Placeholder written in place of a connection string password
pub const REDACTED_PASSWORD: &str = "************";

static CONNECTION_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(mongodb(?:\+srv)?://[^:]+:)([^@]+)(@)").expect("connection string pattern is valid")
});

/// Mask the password of every `mongodb[+srv]://user:password@` connection
/// string in `input`, leaving the user name and host visible.
pub fn redact_connection_string(input: &str) -> Cow<'_, str> {
    CONNECTION_STRING.replace_all(input, format!("${{1}}{}${{3}}", REDACTED_PASSWORD).as_str())
}
