//! Compiled route patterns.
//!
//! A [`Pattern`] is compiled once at registration time and matched segment by segment against
//! concrete request paths. See [`parser`] for the accepted syntax.

mod parser;

use crate::PathParams;
use crate::error::PatternError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// One slash-delimited unit of a compiled pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matches exactly this text, case-sensitive.
    Literal(String),
    /// Binds one whole path segment to a name.
    Parameter(Parameter),
    /// A trailing group that matches either nothing or all of its inner segments.
    Optional(Vec<Segment>),
}

/// A named parameter with an optional constraint.
///
/// Without a constraint the parameter accepts any non-empty segment; with one, the segment must
/// fully match the constraint regex.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: Arc<str>,
    constraint: Option<(String, Regex)>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constraint as written in the pattern, without the anchors added at compile time.
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_ref().map(|(raw, _)| raw.as_str())
    }

    #[inline]
    fn accepts(&self, segment: &str) -> bool {
        match &self.constraint {
            Some((_, regex)) => regex.is_match(segment),
            None => !segment.is_empty(),
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    names: Vec<Arc<str>>,
}

impl Pattern {
    /// Compiles a pattern string, an empty string is treated as `/`.
    ///
    /// # Errors
    /// Returns a [`PatternError`] when the pattern is malformed: unbalanced braces or brackets,
    /// an invalid constraint regex, or an optional group that is not the last part of the pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let source = if pattern.is_empty() { "/" } else { pattern };
        let segments = parser::parse(source)?;
        Ok(Self::from_segments(source.to_string(), segments))
    }

    /// Builds a pattern which matches `path` literally, `{` and `[` have no special meaning.
    pub fn literal(path: &str) -> Self {
        let segments = path
            .strip_prefix('/')
            .unwrap_or(path)
            .split('/')
            .map(|segment| Segment::Literal(segment.to_string()))
            .collect();
        Self::from_segments(path.to_string(), segments)
    }

    fn from_segments(source: String, segments: Vec<Segment>) -> Self {
        let mut names = Vec::new();
        collect_names(&segments, &mut names);
        Self { source, segments, names }
    }

    /// The pattern string this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order, including those inside optional groups.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(AsRef::as_ref)
    }

    /// Matches a normalised request path, see [`normalize_path`].
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        split_path(path).and_then(|segments| self.match_segments(&segments))
    }

    /// Matches an already split request path.
    pub(crate) fn match_segments(&self, path: &[&str]) -> Option<PathParams> {
        let mut values = Vec::with_capacity(self.names.len());
        if !match_into(&self.segments, path, &mut values) {
            return None;
        }

        debug_assert_eq!(values.len(), self.names.len());
        let params = self
            .names
            .iter()
            .zip(values)
            .map(|(name, value)| (Arc::clone(name), value.map(str::to_string)))
            .collect::<Vec<_>>();
        Some(PathParams::new(params))
    }

    /// Whether the pattern matches, without extracting any values.
    pub(crate) fn is_match(&self, path: &[&str]) -> bool {
        let mut values = Vec::with_capacity(self.names.len());
        match_into(&self.segments, path, &mut values)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn collect_names(segments: &[Segment], names: &mut Vec<Arc<str>>) {
    for segment in segments {
        match segment {
            Segment::Literal(_) => {}
            Segment::Parameter(param) => names.push(Arc::clone(&param.name)),
            Segment::Optional(inner) => collect_names(inner, names),
        }
    }
}

fn count_params(segments: &[Segment]) -> usize {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(_) => 0,
            Segment::Parameter(_) => 1,
            Segment::Optional(inner) => count_params(inner),
        })
        .sum()
}

fn match_into<'p>(segments: &[Segment], path: &[&'p str], values: &mut Vec<Option<&'p str>>) -> bool {
    let mut rest = path;

    for segment in segments {
        match segment {
            Segment::Literal(text) => match rest.split_first() {
                Some((head, tail)) if *head == text.as_str() => rest = tail,
                _ => return false,
            },
            Segment::Parameter(param) => match rest.split_first() {
                Some((head, tail)) if param.accepts(head) => {
                    values.push(Some(*head));
                    rest = tail;
                }
                _ => return false,
            },
            // an optional group is always the last segment
            Segment::Optional(inner) => {
                if rest.is_empty() {
                    values.extend(std::iter::repeat_n(None, count_params(inner)));
                    return true;
                }
                return match_into(inner, rest, values);
            }
        }
    }

    rest.is_empty()
}

/// Strips the query string and fragment, an empty path becomes `/`.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    match &path[..end] {
        "" => "/",
        path => path,
    }
}

/// Splits a request path into segments, `/` is a single empty segment.
///
/// Returns `None` for paths that do not start with `/`, those never match any route.
pub(crate) fn split_path(path: &str) -> Option<Vec<&str>> {
    path.strip_prefix('/').map(|rest| rest.split('/').collect())
}
