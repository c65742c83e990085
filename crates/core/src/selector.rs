//! Candidate-object selector grammar.
//!
//! A selector is a comma-separated list of compound selectors. Each compound
//! is an optional tag name (or `*`) followed by any number of `#id` and
//! `.class` parts, e.g. `*`, `mesh.ground`, `#floor, .terrain`.
//! Malformed compounds never fail parsing; they simply match nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attributes of a node a selector is matched against.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSubject<'a> {
    /// Tag (kind) name of the node.
    pub tag: &'a str,
    /// Unique name of the node, if any.
    pub id: Option<&'a str>,
    /// Class list of the node.
    pub classes: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Compound {
    Simple {
        tag: Option<String>,
        id: Option<String>,
        classes: Vec<String>,
    },
    Invalid,
}

impl Compound {
    fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Compound::Invalid;
        }

        let mut chars = input.chars().peekable();
        let mut tag = None;
        let mut id: Option<String> = None;
        let mut classes = Vec::new();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else if chars.peek().is_some_and(|c| is_ident_char(*c)) {
            tag = Some(take_ident(&mut chars));
        }

        while let Some(c) = chars.next() {
            let name = take_ident(&mut chars);
            if name.is_empty() {
                return Compound::Invalid;
            }
            match c {
                '#' => {
                    if id.as_deref().is_some_and(|existing| existing != name) {
                        return Compound::Invalid;
                    }
                    id = Some(name);
                }
                '.' => classes.push(name),
                _ => return Compound::Invalid,
            }
        }

        Compound::Simple { tag, id, classes }
    }

    fn matches(&self, subject: &SelectorSubject<'_>) -> bool {
        match self {
            Compound::Invalid => false,
            Compound::Simple { tag, id, classes } => {
                tag.as_deref().map_or(true, |t| t.eq_ignore_ascii_case(subject.tag))
                    && id.as_deref().map_or(true, |i| subject.id == Some(i))
                    && classes.iter().all(|c| subject.classes.contains(c))
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':')
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

/// Parsed candidate selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Selector {
    source: String,
    #[serde(skip)]
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Matches every entity in the scene.
    pub const ALL: &'static str = "*";

    /// Parse a selector. Never fails.
    pub fn parse(source: &str) -> Self {
        let source = source.trim().to_string();
        let alternatives = if source.is_empty() {
            Vec::new()
        } else {
            source.split(',').map(Compound::parse).collect()
        };
        Self {
            source,
            alternatives,
        }
    }

    /// The selector `*`.
    pub fn all() -> Self {
        Self::parse(Self::ALL)
    }

    /// An empty selector means "the entities directly under the scene root"
    /// rather than a query.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Original selector text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if any alternative matches `subject`.
    pub fn matches(&self, subject: &SelectorSubject<'_>) -> bool {
        self.alternatives.iter().any(|c| c.matches(subject))
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::all()
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        value.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
