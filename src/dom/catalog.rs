use indexmap::IndexMap;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical elements the pipeline needs to find on the order page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    JoinInput,
    JoinButton,
    ViewOrderLink,
    SummaryMarker,
    ParticipantsHeading,
    ParticipantRow,
    ParticipantExpandButton,
    ExpandedContent,
    ParticipantName,
    ItemEntry,
    ItemName,
    ItemPrice,
    ItemQuantity,
    ItemDescription,
    RestaurantTitle,
}

/// A CSS selector with an optional contained-text constraint.
///
/// In a catalog file a query is either a bare selector string or
/// `{"css": "...", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QueryRepr")]
pub struct Query {
    /// CSS selector
    pub css: String,

    /// Text the element's text content must contain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryRepr {
    Css(String),
    Full {
        css: String,
        #[serde(default)]
        text: Option<String>,
    },
}

impl From<QueryRepr> for Query {
    fn from(repr: QueryRepr) -> Self {
        match repr {
            QueryRepr::Css(css) => Query::css(css),
            QueryRepr::Full { css, text } => Query { css, text },
        }
    }
}

impl Query {
    /// Query matching a CSS selector only
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    /// Builder method: require the element's text to contain `text`
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// All descendants of `root` matching this query, in document order.
    ///
    /// An unparseable selector matches nothing.
    pub fn select_in<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let selector = match Selector::parse(&self.css) {
            Ok(selector) => selector,
            Err(e) => {
                log::warn!("Ignoring invalid selector '{}': {}", self.css, e);
                return Vec::new();
            }
        };

        root.select(&selector)
            .filter(|el| match &self.text {
                Some(text) => el.text().collect::<String>().contains(text.as_str()),
                None => true,
            })
            .collect()
    }
}

/// Resolve an ordered fallback list against `root`: the first query with any
/// match wins and all of its matches are returned.
pub fn select_all<'a>(queries: &[Query], root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    queries
        .iter()
        .map(|query| query.select_in(root))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// First element of [`select_all`]
pub fn select_first<'a>(queries: &[Query], root: ElementRef<'a>) -> Option<ElementRef<'a>> {
    select_all(queries, root).into_iter().next()
}

/// Live-page address of an element: a target's fallback queries, which match
/// to take, and an optional enclosing locator to search within.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Locator {
    #[serde(skip)]
    pub target: Target,
    pub queries: Vec<Query>,
    pub nth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Locator>>,
}

impl Locator {
    pub fn new(target: Target, queries: Vec<Query>) -> Self {
        Self {
            target,
            queries,
            nth: 0,
            parent: None,
        }
    }

    /// Builder method: pick the `n`th match (zero-based)
    pub fn nth(mut self, n: usize) -> Self {
        self.nth = n;
        self
    }

    /// Builder method: only search inside the element addressed by `parent`
    pub fn within(mut self, parent: Locator) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Short label for log messages, e.g. `participant-expand-button in participant-row[1]`
    pub fn describe(&self) -> String {
        let own = format!("{}[{}]", target_name(self.target), self.nth);
        match &self.parent {
            Some(parent) => format!("{} in {}", own, parent.describe()),
            None => own,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&target_name(*self))
    }
}

fn target_name(target: Target) -> String {
    serde_json::to_value(target)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", target))
}

/// Ordered map of targets to fallback queries.
///
/// Deserializing a catalog starts from [`SelectorCatalog::default`] and
/// replaces only the targets present in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IndexMap<Target, Vec<Query>>", into = "IndexMap<Target, Vec<Query>>")]
pub struct SelectorCatalog {
    entries: IndexMap<Target, Vec<Query>>,
}

impl SelectorCatalog {
    /// Catalog with no entries
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Fallback queries for a target, empty when the target is not configured
    pub fn queries(&self, target: Target) -> &[Query] {
        self.entries.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the queries for a target
    pub fn set(&mut self, target: Target, queries: Vec<Query>) {
        self.entries.insert(target, queries);
    }

    /// Builder method: replace the queries for a target
    pub fn with(mut self, target: Target, queries: Vec<Query>) -> Self {
        self.set(target, queries);
        self
    }

    /// Locator for the first match of a target on the whole page
    pub fn locate(&self, target: Target) -> Locator {
        Locator::new(target, self.queries(target).to_vec())
    }

    /// Selectors that fail to parse, as `(target, css)` pairs
    pub fn invalid_selectors(&self) -> Vec<(Target, String)> {
        self.iter()
            .flat_map(|(target, queries)| queries.iter().map(move |q| (*target, q)))
            .filter(|(_, query)| Selector::parse(&query.css).is_err())
            .map(|(target, query)| (target, query.css.clone()))
            .collect()
    }

    /// Iterate configured targets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Target, &Vec<Query>)> {
        self.entries.iter()
    }
}

impl Default for SelectorCatalog {
    /// Structural queries for the group-order page as currently rendered
    fn default() -> Self {
        Self::empty()
            .with(
                Target::JoinInput,
                vec![Query::css(r#"input[placeholder="Enter your name"]"#), Query::css(r#"input[name="name"]"#)],
            )
            .with(Target::JoinButton, vec![Query::css("button").with_text("Join order")])
            .with(
                Target::ViewOrderLink,
                vec![
                    Query::css("a div.al.aq.bc > div.bo.bp.co.dy").with_text("View Order"),
                    Query::css("a").with_text("View Order"),
                    Query::css("button").with_text("View Order"),
                ],
            )
            .with(
                Target::SummaryMarker,
                vec![Query::css(r#"div[role="img"]"#), Query::css("div.al.aq.ci")],
            )
            .with(Target::ParticipantsHeading, vec![Query::css("h6").with_text("Others in your group")])
            .with(Target::ParticipantRow, vec![Query::css("li.al.aq.fa")])
            .with(
                Target::ParticipantExpandButton,
                vec![Query::css("button.bh.al.ci.dq"), Query::css("button[aria-expanded]")],
            )
            .with(
                Target::ExpandedContent,
                vec![Query::css("div.bo.bp.co.dy.b1, div.cy.bo.bp.bq.br.jf")],
            )
            .with(Target::ParticipantName, vec![Query::css("div.bo.bp.co.dy:not(.b1)")])
            .with(Target::ItemEntry, vec![Query::css("a")])
            .with(Target::ItemName, vec![Query::css("div.bo.bp.co.dy.b1")])
            .with(Target::ItemPrice, vec![Query::css(r#"div[class^="cy bo bp bq br"]"#)])
            .with(Target::ItemQuantity, Vec::new())
            .with(Target::ItemDescription, Vec::new())
            .with(Target::RestaurantTitle, vec![Query::css("h1")])
    }
}

impl From<IndexMap<Target, Vec<Query>>> for SelectorCatalog {
    fn from(overrides: IndexMap<Target, Vec<Query>>) -> Self {
        let mut catalog = Self::default();
        for (target, queries) in overrides {
            catalog.set(target, queries);
        }
        catalog
    }
}

impl From<SelectorCatalog> for IndexMap<Target, Vec<Query>> {
    fn from(catalog: SelectorCatalog) -> Self {
        catalog.entries
    }
}
