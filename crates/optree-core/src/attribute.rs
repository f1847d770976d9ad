//! Attribute paths into the option namespace
//!
//! Provides [`Attribute`] for hierarchical addressing of options and
//! [`Segment`] for the individual path components, including the `<name>`
//! template placeholder used by attribute sets of submodules.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Raw text of the template placeholder segment
pub const PLACEHOLDER: &str = "<name>";

/// One component of an [`Attribute`]
///
/// `Placeholder` is declared first so that the derived ordering puts a
/// template position before every concrete name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// The `<name>` template position of an attribute set
    Placeholder,

    /// A concrete attribute name
    Name(String),
}

impl Segment {
    /// Create a concrete name segment
    #[inline]
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Interpret raw evaluator output, where `<name>` marks the template
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw == PLACEHOLDER {
            Self::Placeholder
        } else {
            Self::Name(raw)
        }
    }

    /// Check if this is the template placeholder
    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Concrete name, if any
    #[inline]
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Placeholder => None,
        }
    }

    /// Raw text as the evaluator spells it
    #[inline]
    #[must_use]
    pub fn as_raw(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Placeholder => PLACEHOLDER,
        }
    }
}

/// Names that can be written without quotes in a Nix attribute path
fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\''))
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str(PLACEHOLDER),
            Self::Name(name) if is_bare_identifier(name) => f.write_str(name),
            Self::Name(name) => {
                f.write_str("\"")?;
                for c in name.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<&str> for Segment {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

impl From<String> for Segment {
    fn from(raw: String) -> Self {
        Self::from_raw(raw)
    }
}

/// Location of an option in the namespace
///
/// Immutable sequence of segments; the empty attribute is the root.
/// Ordering is lexical over segments, so every ancestor sorts before its
/// descendants and a `<name>` template subtree sorts before its concrete
/// siblings.
///
/// # Examples
/// - `["services", "openssh", "enable"]` → `services.openssh.enable`
/// - `["users", "users", <name>, "uid"]` → `users.users.<name>.uid`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Attribute(Vec<Segment>);

impl Attribute {
    /// Create attribute from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Create attribute from raw evaluator names (`<name>` becomes a placeholder)
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Segment::from_raw).collect())
    }

    /// Empty attribute (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if attribute is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First `len` segments (clamped to the attribute's length)
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Get parent attribute (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.prefix(self.0.len() - 1))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Append a segment, returning new attribute
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this attribute is a prefix of another (or equal to it)
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if this attribute is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Strict ancestors from the root down to the parent
    pub fn ancestors(&self) -> impl Iterator<Item = Attribute> + '_ {
        (0..self.0.len()).map(move |len| self.prefix(len))
    }

    /// Check if any segment is the `<name>` placeholder
    #[inline]
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.0.iter().any(Segment::is_placeholder)
    }

    /// Copy with the segment at `index` replaced
    ///
    /// Returns `None` if `index` is out of range.
    #[must_use]
    pub fn with_segment(&self, index: usize, segment: Segment) -> Option<Self> {
        let mut new = self.clone();
        *new.0.get_mut(index)? = segment;
        Some(new)
    }

    /// Rebase this attribute from under `old` to under `new`
    ///
    /// Returns `None` if `old` is not a prefix of `self`.
    #[must_use]
    pub fn replace_prefix(&self, old: &Self, new: &Self) -> Option<Self> {
        if !old.is_prefix_of(self) {
            return None;
        }
        let mut segments = new.0.clone();
        segments.extend_from_slice(&self.0[old.0.len()..]);
        Some(Self(segments))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Attribute {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();
        loop {
            let segment = if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => name.push(c),
                            None => return Err(PathError::UnterminatedQuote(s.to_string())),
                        },
                        Some(c) => name.push(c),
                        None => return Err(PathError::UnterminatedQuote(s.to_string())),
                    }
                }
                Segment::Name(name)
            } else {
                let mut raw = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '.' {
                        break;
                    }
                    raw.push(c);
                    chars.next();
                }
                if raw.is_empty() {
                    return Err(PathError::EmptySegment(s.to_string()));
                }
                Segment::from_raw(raw)
            };
            segments.push(segment);

            match chars.next() {
                None => break,
                Some('.') => {}
                Some(c) => {
                    return Err(PathError::UnexpectedCharacter {
                        path: s.to_string(),
                        character: c,
                    })
                }
            }
        }

        Ok(Self(segments))
    }
}

impl From<Vec<Segment>> for Attribute {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<Segment> for Attribute {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Errors related to attribute paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("attribute '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Quoted segment never closed
    #[error("attribute '{0}' has an unterminated quoted segment")]
    UnterminatedQuote(String),

    /// Garbage after a closing quote
    #[error("unexpected character '{character}' in attribute '{path}'")]
    UnexpectedCharacter {
        /// Offending path
        path: String,
        /// Character found after the quote
        character: char,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attr(s: &str) -> Attribute {
        s.parse().unwrap()
    }

    #[test]
    fn attribute_from_segments_maps_placeholder() {
        let a = Attribute::from_segments(["users", "users", "<name>", "uid"]);
        assert_eq!(a.len(), 4);
        assert_eq!(a.segments()[2], Segment::Placeholder);
        assert!(a.has_placeholder());
    }

    #[test]
    fn attribute_root() {
        let root = Attribute::root();
        assert!(root.is_empty());
        assert!(root.parent().is_none());
        assert!(root.last().is_none());
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn attribute_parent_and_last() {
        let a = attr("services.openssh.enable");
        assert_eq!(a.parent().unwrap(), attr("services.openssh"));
        assert_eq!(a.last(), Some(&Segment::name("enable")));
    }

    #[test]
    fn attribute_prefix_clamps() {
        let a = attr("a.b.c");
        assert_eq!(a.prefix(0), Attribute::root());
        assert_eq!(a.prefix(2), attr("a.b"));
        assert_eq!(a.prefix(10), a);
    }

    #[test]
    fn attribute_ancestors_are_strict_and_root_first() {
        let ancestors: Vec<_> = attr("a.b.c").ancestors().collect();
        assert_eq!(ancestors, vec![Attribute::root(), attr("a"), attr("a.b")]);
    }

    #[test]
    fn attribute_is_ancestor_of() {
        let parent = attr("a");
        let child = attr("a.b");
        assert!(parent.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent));
        assert!(parent.is_prefix_of(&parent));
        assert!(Attribute::root().is_ancestor_of(&parent));
    }

    #[test]
    fn attribute_with_segment() {
        let template = attr("users.users.<name>.uid");
        let concrete = template.with_segment(2, Segment::name("alice")).unwrap();
        assert_eq!(concrete, attr("users.users.alice.uid"));
        assert!(template.with_segment(9, Segment::name("x")).is_none());
    }

    #[test]
    fn attribute_replace_prefix() {
        let a = attr("a.d.e");
        assert_eq!(a.replace_prefix(&attr("a"), &attr("b")), Some(attr("b.d.e")));
        assert_eq!(a.replace_prefix(&attr("x"), &attr("b")), None);
    }

    #[test]
    fn display_quotes_non_identifiers() {
        let a = Attribute::new(vec![
            Segment::name("environment"),
            Segment::name("etc"),
            Segment::name("nix/nix.conf"),
        ]);
        assert_eq!(a.to_string(), "environment.etc.\"nix/nix.conf\"");
        assert_eq!(attr("environment.etc.\"nix/nix.conf\""), a);
    }

    #[test]
    fn literal_placeholder_text_is_not_a_template() {
        let quoted = attr("a.\"<name>\"");
        assert_eq!(quoted.segments()[1], Segment::name("<name>"));
        assert!(!quoted.has_placeholder());
        assert_eq!(quoted.to_string(), "a.\"<name>\"");

        let bare = attr("a.<name>");
        assert!(bare.has_placeholder());
        assert_eq!(bare.to_string(), "a.<name>");
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "a..b".parse::<Attribute>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "a.".parse::<Attribute>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "a.\"b".parse::<Attribute>(),
            Err(PathError::UnterminatedQuote(_))
        ));
        assert!(matches!(
            "a.\"b\"c".parse::<Attribute>(),
            Err(PathError::UnexpectedCharacter { character: 'c', .. })
        ));
    }

    #[test]
    fn placeholder_sorts_before_concrete_siblings() {
        let mut attrs = vec![
            attr("users.users.alice"),
            attr("users.users.<name>.uid"),
            attr("users.users"),
            attr("users.users.<name>"),
            attr("users"),
        ];
        attrs.sort();
        assert_eq!(
            attrs,
            vec![
                attr("users"),
                attr("users.users"),
                attr("users.users.<name>"),
                attr("users.users.<name>.uid"),
                attr("users.users.alice"),
            ]
        );
    }

    #[test]
    fn serde_uses_text_form() {
        let a = attr("networking.\"host name\"");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"networking.\\\"host name\\\"\"");
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    fn segment_strategy() -> impl Strategy<Value = Segment> {
        prop_oneof![
            1 => Just(Segment::Placeholder),
            4 => "[a-zA-Z0-9_ .\"\\\\/<>-]{0,8}".prop_map(Segment::Name),
        ]
    }

    proptest! {
        #[test]
        fn prop_text_form_parses_back(segments in proptest::collection::vec(segment_strategy(), 1..6)) {
            let a = Attribute::new(segments);
            let parsed: Attribute = a.to_string().parse().unwrap();
            prop_assert_eq!(parsed, a);
        }

        #[test]
        fn prop_ancestors_sort_first(segments in proptest::collection::vec(segment_strategy(), 1..6)) {
            let a = Attribute::new(segments);
            for ancestor in a.ancestors() {
                prop_assert!(ancestor < a);
            }
        }
    }
}
