//! Compiled name matcher.

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{AuthzConfig, MatchMode};
use crate::{ConfigError, Result, pattern};

/// An immutable compiled allow-list.
///
/// Built once from an [`AuthzConfig`]; [`Matcher::is_match`] takes `&self`
/// and the inner [`Regex`] is `Send + Sync`, so one instance can serve any
/// number of concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    from_domains: bool,
}

impl Matcher {
    /// Compile the matcher for whichever mode `config` selects.
    ///
    /// Domain patterns go through [`pattern::compile`]. A raw regex is
    /// compiled exactly as written: no anchors are added and matching stays
    /// case-sensitive unless the expression says otherwise. An expression
    /// that is not wrapped in `^…$` matches substrings, so `example.org`
    /// also accepts `example.org.attacker.com`; this is logged but allowed.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]: mode validation, invalid domain characters, or
    /// a failure to compile the final expression.
    pub fn from_config(config: &AuthzConfig) -> Result<Self> {
        match config.mode()? {
            MatchMode::Regex(expr) => {
                if !is_fully_anchored(expr) {
                    warn!(
                        regex = %expr,
                        "regex has a branch not enclosed in ^...$ and will match substrings of SAN names"
                    );
                }
                Ok(Self {
                    regex: compile(expr)?,
                    from_domains: false,
                })
            }
            MatchMode::Domains(domains) => {
                let source = pattern::compile(domains)?;
                debug!(domains = domains.len(), regex = %source, "compiled domain patterns");
                Ok(Self {
                    regex: compile(&source)?,
                    from_domains: true,
                })
            }
        }
    }

    /// Does `name` satisfy the allow-list?
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The expression the matcher evaluates, for audit output.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// `true` when built from domain patterns rather than a raw regex.
    #[must_use]
    pub fn is_domain_mode(&self) -> bool {
        self.from_domains
    }
}

fn compile(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|source_err| ConfigError::RegexCompile {
        pattern: source.to_owned(),
        source: source_err,
    })
}

/// Every top-level alternation branch starts with `^` and ends with `$`.
///
/// `^a|b$` fails: `^` binds to `a` only and `$` to `b` only.
fn is_fully_anchored(expr: &str) -> bool {
    top_level_branches(expr).iter().all(|branch| {
        branch.starts_with('^') && branch.ends_with('$') && !branch.ends_with("\\$")
    })
}

/// Split on `|` outside groups, character classes and escapes.
fn top_level_branches(expr: &str) -> Vec<&str> {
    let mut branches = Vec::new();
    let mut start = 0;
    let mut groups = 0usize;
    let mut classes = 0usize;
    let mut escaped = false;

    for (i, c) in expr.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => classes += 1,
            ']' if classes > 0 => classes -= 1,
            '(' if classes == 0 => groups += 1,
            ')' if classes == 0 => groups = groups.saturating_sub(1),
            '|' if classes == 0 && groups == 0 => {
                branches.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    branches.push(&expr[start..]);
    branches
}
