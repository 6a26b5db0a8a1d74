//! URL path templates.
//!
//! A [`Pattern`] is a `/`-separated sequence of literal and `{name}` variable
//! segments, e.g. `/v1/audit/{id}`. Patterns are validated once, when a route
//! is registered; matching itself is done by the axum router, which uses the
//! same template syntax.

use std::collections::HashSet;
use std::fmt;

/// A single segment of a [`Pattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

/// A compiled path template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    #[error("invalid variable {0:?}")]
    InvalidVariable(String),
    #[error("variable {0:?} appears more than once")]
    DuplicateVariable(String),
    #[error("wildcard segment {0:?} is not supported")]
    Wildcard(String),
}

impl Pattern {
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let rest = template
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;

        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        // "/" alone has no segments.
        if !rest.is_empty() {
            for (position, raw) in rest.split('/').enumerate() {
                let segment = parse_segment(position, raw)?;
                if let Segment::Variable(name) = &segment {
                    if !seen.insert(name.clone()) {
                        return Err(PatternError::DuplicateVariable(name.clone()));
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            template: template.to_owned(),
            segments,
        })
    }

    /// The template exactly as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the variable segments, in path order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_segment(position: usize, raw: &str) -> Result<Segment, PatternError> {
    if raw.is_empty() {
        return Err(PatternError::EmptySegment(position));
    }
    if raw.contains('*') {
        return Err(PatternError::Wildcard(raw.to_owned()));
    }

    if let Some(inner) = raw.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| PatternError::InvalidVariable(raw.to_owned()))?;
        if !is_identifier(name) {
            return Err(PatternError::InvalidVariable(raw.to_owned()));
        }
        return Ok(Segment::Variable(name.to_owned()));
    }

    // Braces are only valid around a whole segment, and axum rejects a
    // leading ':' as the old capture syntax.
    if raw.contains(['{', '}']) || raw.starts_with(':') {
        return Err(PatternError::InvalidVariable(raw.to_owned()));
    }

    Ok(Segment::Literal(raw.to_owned()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
