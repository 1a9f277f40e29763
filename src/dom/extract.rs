use crate::dom::catalog::{SelectorCatalog, Target, select_all, select_first};
use crate::error::ErrorKind;
use crate::model::{CartItem, Money};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::num::NonZeroU32;
use std::sync::LazyLock;

/// `$` followed by digits and an optional two-digit fraction
static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9]+(?:\.[0-9]{2})?)").expect("Invalid price regex"));

/// Leading count such as `2`, `2x` or `2 ×`
static QUANTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+)\s*[x×]?").expect("Invalid quantity regex"));

/// An item entry that could not be turned into a [`CartItem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position of the entry among all candidate entries
    pub index: usize,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Items parsed from one markup snapshot, plus the entries that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub items: Vec<CartItem>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse the first `$N` or `$N.NN` amount out of `text`
pub fn parse_price(text: &str) -> Option<Money> {
    let captures = PRICE_PATTERN.captures(text)?;
    Money::parse_decimal(captures.get(1)?.as_str())
}

/// Parse a leading positive count out of `text`
pub fn parse_quantity(text: &str) -> Option<NonZeroU32> {
    let captures = QUANTITY_PATTERN.captures(text)?;
    captures.get(1)?.as_str().parse::<u32>().ok().and_then(NonZeroU32::new)
}

/// Extract items from the markup of an expanded participant entry.
///
/// Every candidate entry is handled independently: one without a name or a
/// parseable price is recorded in [`Extraction::skipped`] and the rest proceed.
pub fn extract_items(markup: &str, catalog: &SelectorCatalog, person: Option<&str>) -> Extraction {
    let fragment = Html::parse_fragment(markup);
    let entries = select_all(catalog.queries(Target::ItemEntry), fragment.root_element());

    let mut extraction = Extraction::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match parse_entry(entry, catalog, person) {
            Ok(item) => extraction.items.push(item),
            Err((kind, reason)) => extraction.skipped.push(SkippedEntry { index, kind, reason }),
        }
    }
    extraction
}

fn parse_entry(
    entry: ElementRef<'_>,
    catalog: &SelectorCatalog,
    person: Option<&str>,
) -> Result<CartItem, (ErrorKind, String)> {
    let name = select_first(catalog.queries(Target::ItemName), entry)
        .map(collapsed_text)
        .filter(|name| !name.is_empty())
        .ok_or((ErrorKind::ElementNotFound, "entry has no item name".to_string()))?;

    let price_text = select_first(catalog.queries(Target::ItemPrice), entry)
        .map(collapsed_text)
        .ok_or_else(|| (ErrorKind::ElementNotFound, format!("'{}' has no price element", name)))?;

    let price = parse_price(&price_text)
        .ok_or_else(|| (ErrorKind::ParseError, format!("'{}' has unparseable price '{}'", name, price_text)))?;

    let mut item = CartItem::new(name.as_str(), price)
        .ok_or((ErrorKind::ElementNotFound, "entry has no item name".to_string()))?;

    if let Some(quantity) = select_first(catalog.queries(Target::ItemQuantity), entry)
        .map(collapsed_text)
        .and_then(|text| parse_quantity(&text))
    {
        item = item.with_quantity(quantity);
    }

    if let Some(description) = select_first(catalog.queries(Target::ItemDescription), entry)
        .map(collapsed_text)
        .filter(|text| !text.is_empty())
    {
        item = item.with_description(description);
    }

    if let Some(person) = person {
        item = item.with_person(person);
    }

    Ok(item)
}

/// Display name of the participant whose row markup is given: the
/// participant-name target if it matches, else the first non-empty text run.
pub fn participant_name(row_markup: &str, catalog: &SelectorCatalog) -> Option<String> {
    let fragment = Html::parse_fragment(row_markup);
    let root = fragment.root_element();

    select_first(catalog.queries(Target::ParticipantName), root)
        .map(collapsed_text)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            root.text()
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(str::to_string)
        })
}

/// Restaurant title from a full-page snapshot
pub fn restaurant_name(page_markup: &str, catalog: &SelectorCatalog) -> Option<String> {
    let document = Html::parse_document(page_markup);
    select_first(catalog.queries(Target::RestaurantTitle), document.root_element())
        .map(collapsed_text)
        .filter(|name| !name.is_empty())
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::catalog::Query;

    fn entry(name: &str, price: &str) -> String {
        format!(
            r#"<a href="/item"><div class="bo bp co dy b1">{}</div><div class="cy bo bp bq br jf">{}</div></a>"#,
            name, price
        )
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$8.50"), Some(Money::from_cents(850)));
        assert_eq!(parse_price("Price: $12 each"), Some(Money::from_cents(1200)));
        assert_eq!(parse_price("$3.25 • 1 item"), Some(Money::from_cents(325)));
        assert_eq!(parse_price("8.50"), None);
        assert_eq!(parse_price("Free"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2"), NonZeroU32::new(2));
        assert_eq!(parse_quantity("3x"), NonZeroU32::new(3));
        assert_eq!(parse_quantity(" 4 × "), NonZeroU32::new(4));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("several"), None);
    }

    #[test]
    fn test_three_valid_one_missing_price() {
        let markup = format!(
            "<div>{}{}{}{}</div>",
            entry("Burger", "$8.50"),
            entry("Fries", "$3.25"),
            r#"<a><div class="bo bp co dy b1">Mystery</div></a>"#,
            entry("Shake", "$5.00"),
        );

        let extraction = extract_items(&markup, &SelectorCatalog::default(), Some("Sam"));

        let names: Vec<&str> = extraction.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Burger", "Fries", "Shake"]);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].index, 2);
        assert_eq!(extraction.skipped[0].kind, ErrorKind::ElementNotFound);
        assert!(extraction.items.iter().all(|i| i.quantity() == 1 && i.person() == Some("Sam")));
    }

    #[test]
    fn test_unparseable_price_is_parse_error() {
        let markup = format!("{}{}", entry("Water", "Free"), entry("Soda", "$1.99"));
        let extraction = extract_items(&markup, &SelectorCatalog::default(), None);

        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].price(), Money::from_cents(199));
        assert_eq!(extraction.items[0].person(), None);
        assert_eq!(extraction.skipped[0].kind, ErrorKind::ParseError);
        assert!(extraction.skipped[0].reason.contains("Water"));
    }

    #[test]
    fn test_missing_name_skipped() {
        let markup = r#"<a><div class="cy bo bp bq br jf">$2.00</div></a>"#;
        let extraction = extract_items(markup, &SelectorCatalog::default(), None);
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.skipped[0].kind, ErrorKind::ElementNotFound);
    }

    #[test]
    fn test_no_entries() {
        let extraction = extract_items("<div>nothing here</div>", &SelectorCatalog::default(), None);
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn test_optional_quantity_and_description() {
        let catalog = SelectorCatalog::default()
            .with(Target::ItemQuantity, vec![Query::css("span.qty")])
            .with(Target::ItemDescription, vec![Query::css("p.desc")]);
        let markup = r#"<a>
            <span class="qty">2x</span>
            <div class="bo bp co dy b1">Taco</div>
            <p class="desc">  extra   salsa </p>
            <div class="cy bo bp bq br jf">$4.00</div>
        </a>"#;

        let extraction = extract_items(markup, &catalog, None);
        let taco = &extraction.items[0];
        assert_eq!(taco.quantity(), 2);
        assert_eq!(taco.description(), Some("extra salsa"));
        assert_eq!(taco.line_total(), Money::from_cents(800));
    }

    #[test]
    fn test_participant_name_fallback_to_first_text() {
        let catalog = SelectorCatalog::default().with(Target::ParticipantName, vec![]);
        let markup = r#"<div><span>  </span><span>Jordan</span><button>v</button></div>"#;
        assert_eq!(participant_name(markup, &catalog), Some("Jordan".to_string()));
    }

    #[test]
    fn test_participant_name_from_catalog() {
        let markup = r#"<div class="bo bp co dy">Riley  Chen</div><a><div class="bo bp co dy b1">Burger</div></a>"#;
        assert_eq!(
            participant_name(markup, &SelectorCatalog::default()),
            Some("Riley Chen".to_string())
        );
    }

    #[test]
    fn test_restaurant_name() {
        let page = "<html><body><h1> Burger   Barn </h1><h1>Other</h1></body></html>";
        assert_eq!(
            restaurant_name(page, &SelectorCatalog::default()),
            Some("Burger Barn".to_string())
        );
        assert_eq!(restaurant_name("<html><body></body></html>", &SelectorCatalog::default()), None);
    }
}
