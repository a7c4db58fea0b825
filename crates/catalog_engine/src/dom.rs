//! Minimal document query layer.
//!
//! Predicates are plain data ([`Matcher`], combined into a [`Query`]) so the
//! page parsers read as tables of markers rather than nested closures, and any
//! tree exposing [`DomNode`] can be queried with them.

use regex::Regex;
use scraper::ElementRef;
use url::Url;

#[derive(Debug, Clone)]
pub enum Matcher {
    Tag(String),
    Id(String),
    Class(String),
    AttrEquals { name: String, value: String },
    AttrMatches { name: String, pattern: Regex },
    /// A text node directly under the element equals this, after trimming.
    OwnText(String),
}

impl Matcher {
    fn matches<N: DomNode>(&self, node: &N) -> bool {
        match self {
            Matcher::Tag(tag) => node.tag().eq_ignore_ascii_case(tag),
            Matcher::Id(id) => node.attr("id") == Some(id.as_str()),
            Matcher::Class(class) => node
                .attr("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            Matcher::AttrEquals { name, value } => node.attr(name) == Some(value.as_str()),
            Matcher::AttrMatches { name, pattern } => {
                node.attr(name).is_some_and(|value| pattern.is_match(value))
            }
            Matcher::OwnText(text) => node.own_text_fragments().iter().any(|t| t == text),
        }
    }
}

/// Conjunction of matchers. An empty query matches every element.
#[derive(Debug, Clone, Default)]
pub struct Query {
    matchers: Vec<Matcher>,
}

impl Query {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(name: &str) -> Self {
        Self::any().and(Matcher::Tag(name.to_string()))
    }

    pub fn id(id: &str) -> Self {
        Self::any().and(Matcher::Id(id.to_string()))
    }

    pub fn class(class: &str) -> Self {
        Self::any().and(Matcher::Class(class.to_string()))
    }

    pub fn and(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.and(Matcher::Class(class.to_string()))
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.and(Matcher::AttrEquals {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn with_attr_matching(self, name: &str, pattern: Regex) -> Self {
        self.and(Matcher::AttrMatches {
            name: name.to_string(),
            pattern,
        })
    }

    pub fn with_own_text(self, text: &str) -> Self {
        self.and(Matcher::OwnText(text.to_string()))
    }

    pub fn matches<N: DomNode>(&self, node: &N) -> bool {
        self.matchers.iter().all(|m| m.matches(node))
    }
}

pub trait DomNode: Copy {
    fn tag(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn parent_element(&self) -> Option<Self>;
    /// Elements beneath this one in document order, not including itself.
    fn descendant_elements(&self) -> Vec<Self>;
    /// Trimmed, non-empty text nodes that are direct children.
    fn own_text_fragments(&self) -> Vec<String>;
    /// Trimmed, non-empty text nodes anywhere beneath this element.
    fn text_fragments(&self) -> Vec<String>;

    fn find_first(&self, query: &Query) -> Option<Self> {
        self.descendant_elements()
            .into_iter()
            .find(|node| query.matches(node))
    }

    fn find_all(&self, query: &Query) -> Vec<Self> {
        self.descendant_elements()
            .into_iter()
            .filter(|node| query.matches(node))
            .collect()
    }

    /// Text fragments joined by single spaces, so `<br>`-split names read as one.
    fn text_content(&self) -> String {
        self.text_fragments().join(" ")
    }
}

impl<'a> DomNode for ElementRef<'a> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().and_then(ElementRef::wrap)
    }

    fn descendant_elements(&self) -> Vec<Self> {
        self.descendants().skip(1).filter_map(ElementRef::wrap).collect()
    }

    fn own_text_fragments(&self) -> Vec<String> {
        self.children()
            .filter_map(|child| child.value().as_text())
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn text_fragments(&self) -> Vec<String> {
        self.text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Resolves an `href` against the page it was found on. Fragment-only and
/// script links resolve to nothing.
pub fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}
