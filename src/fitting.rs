//! Fitting descriptor parsing.
//!
//! The host export writes connected fittings as a semicolon-separated list
//! of `Name[InstanceId]` tokens. Malformed tokens are skipped one by one and
//! never abort the segment they belong to.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::FittingTokenError;
use crate::types::FittingRef;

/// Separator between tokens in `ConnectedFittingNames`.
pub const TOKEN_SEPARATOR: char = ';';

/// Separator used when joining fitting names for output.
pub const NAME_SEPARATOR: &str = "; ";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    // Greedy name: the instance id is whatever sits in the last brackets.
    TOKEN.get_or_init(|| Regex::new(r"^(.*)\[([^\[\]]*)\]$").expect("fitting token pattern is valid"))
}

/// Parse one `Name[InstanceId]` token.
pub fn parse_token(token: &str) -> Result<FittingRef, FittingTokenError> {
    let token = token.trim();
    let caps = token_regex()
        .captures(token)
        .ok_or_else(|| FittingTokenError::MissingBracket(token.to_string()))?;

    let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let instance_id = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    if name.is_empty() {
        return Err(FittingTokenError::EmptyName(token.to_string()));
    }
    if instance_id.is_empty() {
        return Err(FittingTokenError::EmptyInstanceId(token.to_string()));
    }

    Ok(FittingRef::new(name, instance_id))
}

/// Result of parsing a whole `ConnectedFittingNames` cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FittingList {
    /// Successfully parsed fittings, in token order.
    pub fittings: Vec<FittingRef>,
    /// Tokens that were skipped.
    pub skipped: Vec<FittingTokenError>,
}

/// Parse a `ConnectedFittingNames` cell. Empty cells and empty tokens
/// (e.g. a trailing `;`) yield nothing.
pub fn parse_fitting_list(cell: &str) -> FittingList {
    let mut list = FittingList::default();

    for token in cell.split(TOKEN_SEPARATOR) {
        if token.trim().is_empty() {
            continue;
        }
        match parse_token(token) {
            Ok(fitting) => list.fittings.push(fitting),
            Err(e) => list.skipped.push(e),
        }
    }

    list
}
