//! URL path patterns.
//!
//! Patterns are `/`-separated segments. Within a segment `*` matches any run
//! of characters and `?` matches exactly one; a segment that is exactly `**`
//! matches any number of whole segments, including none.

use std::cmp::{Ordering, Reverse};

/// Returns `true` if `url` contains wildcards and needs pattern matching.
#[must_use]
pub fn is_pattern(url: &str) -> bool {
    url.contains(['*', '?'])
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Glob(Vec<char>),
    AnySegments,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "**" {
            Self::AnySegments
        } else if is_pattern(raw) {
            Self::Glob(raw.chars().collect())
        } else {
            Self::Literal(raw.to_string())
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == segment,
            Self::Glob(glob) => glob_match(glob, &segment.chars().collect::<Vec<_>>()),
            Self::AnySegments => true,
        }
    }
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    // reached[j]: the pattern segments seen so far consume exactly path[..j]
    let mut reached = vec![false; path.len() + 1];
    reached[0] = true;

    for segment in pattern {
        let mut next = vec![false; path.len() + 1];
        if matches!(segment, Segment::AnySegments) {
            let mut open = false;
            for (j, slot) in next.iter_mut().enumerate() {
                open |= reached[j];
                *slot = open;
            }
        } else {
            for (j, part) in path.iter().enumerate() {
                if reached[j] && segment.matches(part) {
                    next[j + 1] = true;
                }
            }
        }
        if !next.contains(&true) {
            return false;
        }
        reached = next;
    }
    reached[path.len()]
}

fn split_path(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// How specific a pattern is; greater is more specific.
///
/// Fewer `**` segments wins, then more literal characters, then fewer
/// single-segment wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(Reverse<usize>, usize, Reverse<usize>);

/// A parsed URL path pattern.
///
/// ```rust
/// use heron_mapping::PathPattern;
///
/// let pattern = PathPattern::parse("/files/**/*.txt");
/// assert!(pattern.matches("/files/a/b/notes.txt"));
/// assert!(pattern.matches("/files/notes.txt"));
/// assert!(!pattern.matches("/files/notes.md"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            segments: split_path(pattern).into_iter().map(Segment::parse).collect(),
        }
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if `path` matches the pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match_segments(&self.segments, &split_path(path))
    }

    /// Returns the pattern's specificity.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let any_segments = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::AnySegments))
            .count();
        let (literal, wildcards) = self
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Glob(glob) => Some(glob),
                _ => None,
            })
            .flatten()
            .fold((0, 0), |(literal, wildcards), c| match c {
                '*' | '?' => (literal, wildcards + 1),
                _ => (literal + 1, wildcards),
            });
        let literal = literal
            + self
                .segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(text) => text.chars().count() + 1,
                    _ => 1,
                })
                .sum::<usize>();
        Specificity(Reverse(any_segments), literal, Reverse(wildcards))
    }

    /// Compares specificity with another pattern.
    #[must_use]
    pub fn compare_specificity(&self, other: &Self) -> Ordering {
        self.specificity().cmp(&other.specificity())
    }
}
