//! Masking of volatile log prefixes before comparison.
//!
//! Diagnostic lines such as `[2020-01-01 00:00:00]: start` carry a
//! wall-clock value in a leading bracketed span. The normalizer drops that
//! span and keeps everything from the following colon on, so
//! `[2020-01-01 00:00:00]: start` and `[2020-02-02 11:11:11]: start` both
//! become `: start`. Lines of any other shape are returned untouched, as
//! are lines that are not valid UTF-8.

use regex::Regex;
use std::borrow::Cow;

use crate::error::{HarnessError, Result};

/// Capture group holding the part of a matching line that is kept.
const REST_GROUP: &str = "rest";

/// Per-line transform applied identically to reference and captured output.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pattern: Regex,
}

impl Normalizer {
    /// Build a normalizer from a regex that defines a `rest` group.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| HarnessError::Config(format!("invalid normalize pattern: {e}")))?;
        if !pattern.capture_names().flatten().any(|n| n == REST_GROUP) {
            return Err(HarnessError::Config(format!(
                "normalize pattern must define a (?P<{REST_GROUP}>...) group"
            )));
        }
        Ok(Self { pattern })
    }

    /// Normalize one line. A trailing `\n` or `\r\n` is preserved as is.
    pub fn normalize_line<'l>(&self, line: &'l str) -> Cow<'l, str> {
        let (body, terminator) = split_terminator(line);
        match self
            .pattern
            .captures(body)
            .and_then(|caps| caps.name(REST_GROUP))
        {
            Some(rest) => Cow::Owned(format!("{}{terminator}", rest.as_str())),
            None => Cow::Borrowed(line),
        }
    }

    /// Split raw output into lines (terminators kept) and normalize each.
    ///
    /// A line that is not valid UTF-8 is kept byte for byte, so two
    /// different invalid sequences never compare equal.
    pub fn normalize_lines(&self, output: &[u8]) -> Vec<Vec<u8>> {
        output
            .split_inclusive(|b| *b == b'\n')
            .map(|line| match std::str::from_utf8(line) {
                Ok(text) => self.normalize_line(text).into_owned().into_bytes(),
                Err(_) => line.to_vec(),
            })
            .collect()
    }
}

pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
