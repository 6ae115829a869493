//! Parses route pattern strings such as `/articles/{category}[/{title}]` into [`Segment`]s.
//!
//! The grammar is small:
//! - segments are separated by `/` (slashes inside `{...}` belong to the parameter);
//! - `{name}` and `{name:regex}` declare a parameter spanning a whole segment;
//! - a trailing `[...]` declares an optional group, parsed recursively, which must itself
//!   start with `/` and may contain a further trailing optional group;
//! - anything else is literal text.

use super::{Parameter, Segment};
use crate::error::PatternError;
use regex::Regex;
use std::collections::HashSet;

pub(super) fn parse(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    if !pattern.starts_with('/') {
        return Err(PatternError::missing_leading_slash(pattern));
    }

    let mut names = HashSet::new();
    parse_sequence(pattern, pattern, &mut names)
}

fn parse_sequence<'a>(
    pattern: &str,
    body: &'a str,
    names: &mut HashSet<&'a str>,
) -> Result<Vec<Segment>, PatternError> {
    let (required, optional) = split_optional(pattern, body)?;

    // `required` always starts with '/', the callers check it
    let mut segments = split_segments(&required[1..])
        .into_iter()
        .map(|segment| classify(pattern, segment, names))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(inner) = optional {
        if !inner.starts_with('/') {
            return Err(PatternError::optional_without_slash(pattern));
        }
        segments.push(Segment::Optional(parse_sequence(pattern, inner, names)?));
    }

    Ok(segments)
}

/// Splits `body` into its required prefix and the inner text of a trailing `[...]` group.
///
/// Brackets inside a parameter declaration belong to the constraint regex and are skipped.
fn split_optional<'a>(pattern: &str, body: &'a str) -> Result<(&'a str, Option<&'a str>), PatternError> {
    let mut brace_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut open_at = None;

    for (index, ch) in body.char_indices() {
        match ch {
            '{' => brace_depth += 1,
            '}' => {
                brace_depth = brace_depth.checked_sub(1).ok_or_else(|| PatternError::unbalanced_brace(pattern))?;
            }
            '[' if brace_depth == 0 => {
                if bracket_depth == 0 && open_at.is_none() {
                    open_at = Some(index);
                }
                bracket_depth += 1;
            }
            ']' if brace_depth == 0 => {
                bracket_depth =
                    bracket_depth.checked_sub(1).ok_or_else(|| PatternError::unbalanced_bracket(pattern))?;
                if bracket_depth == 0 && index + ch.len_utf8() != body.len() {
                    return Err(PatternError::optional_not_trailing(pattern));
                }
            }
            _ => {}
        }
    }

    if brace_depth != 0 {
        return Err(PatternError::unbalanced_brace(pattern));
    }
    if bracket_depth != 0 {
        return Err(PatternError::unbalanced_bracket(pattern));
    }

    match open_at {
        Some(open) => Ok((&body[..open], Some(&body[open + 1..body.len() - 1]))),
        None => Ok((body, None)),
    }
}

/// Splits on `/` outside of parameter declarations. Braces are known to be balanced here.
fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);
    segments
}

fn classify<'a>(pattern: &str, segment: &'a str, names: &mut HashSet<&'a str>) -> Result<Segment, PatternError> {
    if !segment.contains(['{', '}']) {
        return Ok(Segment::Literal(segment.to_string()));
    }

    let inner = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|_| closes_at_end(segment))
        .ok_or_else(|| PatternError::mixed_segment(pattern, segment))?;

    let (name, constraint) = match inner.split_once(':') {
        Some((name, constraint)) => (name.trim(), Some(constraint.trim())),
        None => (inner.trim(), None),
    };

    if !is_valid_name(name) {
        return Err(PatternError::invalid_parameter_name(pattern, name));
    }
    if !names.insert(name) {
        return Err(PatternError::duplicate_parameter(pattern, name));
    }

    let constraint = constraint
        .map(|raw| {
            Regex::new(&format!("^(?:{raw})$")).map(|regex| (raw.to_string(), regex)).map_err(|source| {
                PatternError::InvalidConstraint { name: name.to_string(), constraint: raw.to_string(), source }
            })
        })
        .transpose()?;

    Ok(Segment::Parameter(Parameter { name: name.into(), constraint }))
}

/// Whether the brace opened by the first character is the one closed by the last character.
fn closes_at_end(segment: &str) -> bool {
    let mut depth = 0usize;
    for (index, ch) in segment.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return index + 1 == segment.len();
                }
            }
            _ => {}
        }
    }
    false
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::error::PatternError;
    use crate::pattern::Segment;

    fn names(segments: &[Segment]) -> Vec<String> {
        let mut out = vec![];
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push(format!("lit:{text}")),
                Segment::Parameter(param) => out.push(format!("param:{}", param.name())),
                Segment::Optional(inner) => {
                    out.push("[".into());
                    out.extend(names(inner));
                    out.push("]".into());
                }
            }
        }
        out
    }

    #[test]
    fn test_parse_literal_and_params() {
        let segments = parse("/test/{id:\\d+}/{test:\\d+}").unwrap();
        assert_eq!(names(&segments), vec!["lit:test", "param:id", "param:test"]);
    }

    #[test]
    fn test_parse_optional_group() {
        let segments = parse("/articles/{category}[/{title}]").unwrap();
        assert_eq!(names(&segments), vec!["lit:articles", "param:category", "[", "param:title", "]"]);
    }

    #[test]
    fn test_parse_nested_optional_group() {
        let segments = parse("/archive[/{year}[/{month}]]").unwrap();
        assert_eq!(names(&segments), vec!["lit:archive", "[", "param:year", "[", "param:month", "]", "]"]);
    }

    #[test]
    fn test_parse_brackets_and_braces_inside_constraint() {
        let segments = parse("/users/{id:[0-9]{2,4}}/posts").unwrap();
        assert_eq!(names(&segments), vec!["lit:users", "param:id", "lit:posts"]);
    }

    #[test]
    fn test_parse_trims_whitespace_in_declaration() {
        let segments = parse("/users/{ id : \\d+ }").unwrap();
        let Segment::Parameter(param) = &segments[1] else { panic!("expected a parameter") };
        assert_eq!(param.name(), "id");
        assert_eq!(param.constraint(), Some("\\d+"));
    }

    #[test]
    fn test_parse_root_and_trailing_slash() {
        assert_eq!(names(&parse("/").unwrap()), vec!["lit:"]);
        assert_eq!(names(&parse("/users/").unwrap()), vec!["lit:users", "lit:"]);
    }

    #[test]
    fn test_reject_missing_leading_slash() {
        assert!(matches!(parse("users"), Err(PatternError::MissingLeadingSlash { .. })));
    }

    #[test]
    fn test_reject_unbalanced_braces() {
        assert!(matches!(parse("/users/{id"), Err(PatternError::UnbalancedBrace { .. })));
        assert!(matches!(parse("/users/id}"), Err(PatternError::UnbalancedBrace { .. })));
    }

    #[test]
    fn test_reject_unbalanced_brackets() {
        assert!(matches!(parse("/users[/{id}"), Err(PatternError::UnbalancedBracket { .. })));
        assert!(matches!(parse("/users/{id}]"), Err(PatternError::UnbalancedBracket { .. })));
    }

    #[test]
    fn test_reject_optional_not_trailing() {
        assert!(matches!(parse("/users[/{id}]/edit"), Err(PatternError::OptionalNotTrailing { .. })));
        assert!(matches!(parse("/a[/b][/c]"), Err(PatternError::OptionalNotTrailing { .. })));
    }

    #[test]
    fn test_reject_optional_without_slash() {
        assert!(matches!(parse("/user[s]"), Err(PatternError::OptionalWithoutSlash { .. })));
    }

    #[test]
    fn test_reject_mixed_segment() {
        assert!(matches!(parse("/user-{id}"), Err(PatternError::MixedSegment { .. })));
        assert!(matches!(parse("/{a}{b}"), Err(PatternError::MixedSegment { .. })));
    }

    #[test]
    fn test_reject_bad_names() {
        assert!(matches!(parse("/{1id}"), Err(PatternError::InvalidParameterName { .. })));
        assert!(matches!(parse("/{}"), Err(PatternError::InvalidParameterName { .. })));
        assert!(matches!(parse("/{id}/{id}"), Err(PatternError::DuplicateParameter { .. })));
        assert!(matches!(parse("/{id}[/{id}]"), Err(PatternError::DuplicateParameter { .. })));
    }

    #[test]
    fn test_reject_invalid_constraint() {
        let error = parse("/users/{id:(\\d+}").unwrap_err();
        assert!(matches!(&error, PatternError::InvalidConstraint { name, .. } if name == "id"));
    }
}
