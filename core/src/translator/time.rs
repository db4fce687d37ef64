//! Time tag handling
//!
//! Absolute tags are day-of-year UTC timestamps (`2020-060T03:45:19.000Z`).
//! They are normalized to `YYYY-DDDTHH:MM:SS.mmm` before being emitted so the
//! same instant always renders the same way.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::Time;

const ABSOLUTE_INPUT_FORMAT: &str = "%Y-%jT%H:%M:%S%.f";
const ABSOLUTE_OUTPUT_FORMAT: &str = "%Y-%jT%H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeTagError {
    #[error("Absolute time tag '{0}' is not a YYYY-DDDTHH:MM:SS[.fff] timestamp")]
    InvalidAbsolute(String),
    #[error("Relative time tag must not be empty")]
    EmptyOffset,
    #[error("Time tag '{0}' must not contain a backtick")]
    Backtick(String),
}

/// Normalize an absolute DOY tag: drop the zone suffix, fix millis at 3 digits.
pub fn normalize_absolute(tag: &str) -> Result<String, TimeTagError> {
    let trimmed = tag.trim();
    let without_zone = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let parsed = NaiveDateTime::parse_from_str(without_zone, ABSOLUTE_INPUT_FORMAT)
        .map_err(|_| TimeTagError::InvalidAbsolute(tag.to_string()))?;

    Ok(parsed.format(ABSOLUTE_OUTPUT_FORMAT).to_string())
}

/// Relative and epoch-relative tags are emitted verbatim.
pub fn check_offset_tag(tag: &str) -> Result<(), TimeTagError> {
    if tag.trim().is_empty() {
        return Err(TimeTagError::EmptyOffset);
    }
    if tag.contains('`') {
        return Err(TimeTagError::Backtick(tag.to_string()));
    }
    Ok(())
}

/// The EDSL prefix a step or request is written behind.
pub fn time_prefix(time: &Time) -> Result<String, TimeTagError> {
    match time {
        Time::Absolute { tag } => Ok(format!("A`{}`", normalize_absolute(tag)?)),
        Time::CommandComplete => Ok("C".to_string()),
        Time::CommandRelative { tag } => {
            check_offset_tag(tag)?;
            Ok(format!("R`{}`", tag))
        }
        Time::EpochRelative { tag } => {
            check_offset_tag(tag)?;
            Ok(format!("E`{}`", tag))
        }
    }
}
