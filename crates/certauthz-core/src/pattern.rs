//! Domain pattern compiler.
//!
//! Translates operator domain patterns into a single regular expression.
//! Each stage is a separate function so it can be tested on its own:
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | [`validate`] | `*.Example.org` | unchanged, or [`ConfigError::InvalidCharacter`] |
//! | [`escape_dots`] | `*.Example.org` | `*[.]Example[.]org` |
//! | [`expand_wildcards`] | `*[.]Example[.]org` | `[^.]+[.]Example[.]org` |
//! | [`anchor`] | `[^.]+[.]Example[.]org` | `(?i)^[^.]+[.]Example[.]org$` |
//! | [`join`] | all anchored branches | `(?i)^a$\|(?i)^b$` |
//!
//! Every branch carries its own anchors. Anchoring the joined expression
//! once (`^a|b$`) would leave `a` open on the right and `b` open on the
//! left, so `example.org` would also accept `example.org.attacker.com`.
//!
//! `*` is not restricted to a whole label: `exam*ple.org` and
//! `*example.org` are accepted and match partial labels.

use std::sync::OnceLock;

use regex::Regex;

use crate::{ConfigError, Result};

/// Replacement for a literal `.` in a domain pattern.
pub const LITERAL_DOT: &str = "[.]";

/// Replacement for `*`: one or more characters of a single DNS label.
pub const LABEL_WILDCARD: &str = "[^.]+";

/// Case-insensitive flag prefixed to every branch.
const CASE_INSENSITIVE: &str = "(?i)";

fn disallowed_chars() -> &'static Regex {
    static DISALLOWED_RE: OnceLock<Regex> = OnceLock::new();
    DISALLOWED_RE.get_or_init(|| {
        Regex::new(r"(?i)[^a-z0-9\-.*]").expect("static character class is valid")
    })
}

/// Reject a pattern containing anything outside letters, digits, `-`, `.`
/// and `*` (case-insensitive).
///
/// This is a character-set check only; `a..b` or `-x.org` still pass.
///
/// # Errors
///
/// [`ConfigError::InvalidCharacter`] carrying the offending pattern.
pub fn validate(pattern: &str) -> Result<()> {
    if disallowed_chars().is_match(pattern) {
        return Err(ConfigError::InvalidCharacter(pattern.to_owned()));
    }
    Ok(())
}

/// Make every `.` match only a literal dot.
#[must_use]
pub fn escape_dots(pattern: &str) -> String {
    pattern.replace('.', LITERAL_DOT)
}

/// Turn every `*` into an independent single-label wildcard.
///
/// Must run after [`escape_dots`], since the wildcard itself contains a dot.
#[must_use]
pub fn expand_wildcards(pattern: &str) -> String {
    pattern.replace('*', LABEL_WILDCARD)
}

/// Anchor a translated branch to the whole name and make it case-insensitive.
#[must_use]
pub fn anchor(body: &str) -> String {
    format!("{CASE_INSENSITIVE}^{body}$")
}

/// Join anchored branches into one alternation.
#[must_use]
pub fn join<S: AsRef<str>>(branches: &[S]) -> String {
    branches
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("|")
}

/// Validate and translate a single domain pattern into an anchored branch.
///
/// # Errors
///
/// [`ConfigError::InvalidCharacter`] if [`validate`] fails.
pub fn translate(pattern: &str) -> Result<String> {
    validate(pattern)?;
    Ok(anchor(&expand_wildcards(&escape_dots(pattern))))
}

/// Translate all domain patterns into one alternation source string.
///
/// Patterns are processed in order and translation stops at the first
/// invalid one.
///
/// # Errors
///
/// [`ConfigError::InvalidCharacter`] for the first offending pattern.
pub fn compile(patterns: &[String]) -> Result<String> {
    let branches = patterns
        .iter()
        .map(|p| translate(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(join(&branches))
}
