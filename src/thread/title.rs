//! Thread title parser
//!
//! Forum thread titles follow the shape `[Tag] [Tag] Name [Version] [Developer]`,
//! where the leading tag run may be absent. The parser locates the anchor right
//! after the leading run of bracketed tags and extracts the name and the first
//! bracketed group that follows it.

/// Error type for title parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleParseError {
    /// The title is empty or whitespace only
    #[error("Thread title is empty")]
    Empty,

    /// The title opens with tags but no closing bracket is followed by name text
    #[error("Thread title has no bracket-terminated segment: {0}")]
    NoBracketSegment(String),

    /// Neither a name nor a version could be extracted
    #[error("Thread title is not recognized: {0}")]
    Unrecognized(String),
}

/// Fields extracted from a thread title.
///
/// Name and version are extracted independently, so either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl ParsedTitle {
    /// Returns both fields when the title was fully recognized
    pub fn complete(&self) -> Option<(&str, &str)> {
        Some((self.name.as_deref()?, self.version.as_deref()?))
    }
}

/// Parses a raw thread title into its name and version.
///
/// Scans left to right and never backtracks: for titles opening with a tag, the
/// first `]` that is not followed by another `[` (optionally after one
/// separator) fixes the anchor, otherwise the anchor is the start of the title.
/// The first `[` after the anchor ends the name and opens the version.
pub fn parse_title(raw: &str) -> Result<ParsedTitle, TitleParseError> {
    if raw.trim().is_empty() {
        return Err(TitleParseError::Empty);
    }

    let anchor =
        find_anchor(raw).ok_or_else(|| TitleParseError::NoBracketSegment(raw.to_string()))?;
    let rest = &raw[anchor..];

    let parsed = ParsedTitle {
        name: extract_name(rest),
        version: extract_version(rest),
    };

    if parsed.name.is_none() && parsed.version.is_none() {
        return Err(TitleParseError::Unrecognized(raw.to_string()));
    }

    Ok(parsed)
}

fn is_separator(byte: u8) -> bool {
    byte.is_ascii_whitespace()
}

/// Finds the byte offset where the name starts.
///
/// Brackets and separators are ASCII, so every returned offset is a char boundary.
fn find_anchor(title: &str) -> Option<usize> {
    let bytes = title.as_bytes();

    // No leading tag run
    if bytes.iter().find(|&&b| !is_separator(b)) != Some(&b'[') {
        return Some(0);
    }

    for (i, &byte) in bytes.iter().enumerate() {
        if byte != b']' {
            continue;
        }

        let mut next = i + 1;
        if bytes.get(next).is_some_and(|&b| is_separator(b)) {
            next += 1;
        }

        match bytes.get(next) {
            // Still inside the leading tag run
            Some(b'[') => continue,
            Some(_) => return Some(next),
            None => return None,
        }
    }

    None
}

fn extract_name(rest: &str) -> Option<String> {
    let end = rest.find('[')?;
    non_empty(&rest[..end])
}

fn extract_version(rest: &str) -> Option<String> {
    let open = rest.find('[')?;
    let after_open = &rest[open + 1..];
    let close = after_open.find(']')?;
    non_empty(&after_open[..close])
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
