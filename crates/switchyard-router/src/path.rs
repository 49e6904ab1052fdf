//! Path splitting, normalization and optional-parameter expansion.

use std::borrow::Cow;
use std::collections::HashSet;

/// Split a route path on `/`, keeping `{...}` constraint groups in one
/// segment so `:p{a/b}` stays intact.
///
/// The leading empty segment of an absolute path is kept: `/users` splits
/// into `["", "users"]` while a host-prefixed `example.com/users` splits
/// into `["example.com", "users"]`.
pub fn split_route(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, byte) in path.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'/' if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    segments.push(&path[start..]);
    segments
}

/// Normalize a request path: strip trailing slashes, collapse double slashes.
///
/// Borrows the input when it is already normalized.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let trailing = path.len() > 1 && path.ends_with('/');
    if !path.is_empty() && !trailing && !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut normalized = String::with_capacity(path.len());
    let mut prev_slash = false;

    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                normalized.push('/');
            }
            prev_slash = true;
        } else {
            normalized.push(ch);
            prev_slash = false;
        }
    }

    // Strip trailing slash (but keep root "/")
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(normalized)
    }
}

/// Normalize a route pattern the same way request paths are normalized,
/// without touching slashes inside constraint braces.
pub fn normalize_route(path: &str) -> String {
    let kept: Vec<&str> = split_route(path)
        .into_iter()
        .enumerate()
        .filter(|(i, segment)| *i == 0 || !segment.is_empty())
        .map(|(_, segment)| segment)
        .collect();

    join_segments(&kept)
}

/// Expand a trailing optional parameter into every concrete variant.
///
/// `/api/animals/:type?` becomes `["/api/animals", "/api/animals/:type"]`
/// and `/:a?/:b?` becomes `["/", "/:a", "/:a/:b"]`. Returns `None` when the
/// path has no optional parameter.
pub fn expand_optional(path: &str) -> Option<Vec<String>> {
    if !path.ends_with('?') || !path.contains(':') {
        return None;
    }

    let mut base: Vec<&str> = Vec::new();
    let mut variants: Vec<String> = Vec::new();

    for (i, segment) in split_route(path).into_iter().enumerate() {
        if segment.starts_with(':') {
            match segment.strip_suffix('?') {
                Some(required) => {
                    variants.push(join_segments(&base));
                    base.push(required);
                    variants.push(join_segments(&base));
                }
                None => base.push(segment),
            }
        } else if i == 0 || !segment.is_empty() {
            base.push(segment);
        }
    }

    let mut seen = HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    Some(variants)
}

/// Upper-case an HTTP method, borrowing when it already is.
pub fn canonical_method(method: &str) -> Cow<'_, str> {
    if method.bytes().any(|b| b.is_ascii_lowercase()) {
        Cow::Owned(method.to_ascii_uppercase())
    } else {
        Cow::Borrowed(method)
    }
}

fn join_segments(segments: &[&str]) -> String {
    let joined = segments.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}
