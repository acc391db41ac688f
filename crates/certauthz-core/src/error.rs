//! Error types for the authorization engine

use thiserror::Error;

/// Result type alias for engine construction
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Construction-time configuration errors.
///
/// None of these can occur while serving requests; a gate that was built
/// successfully only ever answers allow or deny.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Both `regex` and `domains` were supplied
    #[error("You must specify either a regex or a domain list, not both")]
    BothSpecified,

    /// Neither `regex` nor `domains` was supplied
    #[error("You must specify either a regex or a domain list")]
    NoneSpecified,

    /// A domain pattern contains a character outside `[a-z0-9\-.*]`
    #[error("Invalid characters in domain name: {0}")]
    InvalidCharacter(String),

    /// The assembled or operator-supplied expression does not compile
    #[error("Failed to compile pattern '{pattern}': {source}")]
    RegexCompile {
        /// Expression handed to the regex engine
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}
