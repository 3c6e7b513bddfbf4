//! CSS-selector driven page handler

use crate::config::RulesConfig;
use crate::extract::{HandlerError, Page, PageHandler, Record};
use scraper::Selector;
use serde_json::Value;

/// Page handler configured with CSS selectors
///
/// - browsable / harvestable links: `href` of every matched element
/// - stop predicate: the stop selector matches at least one element
/// - record: field name mapped to the text of the first match; fields with
///   no match are omitted
pub struct SelectorHandler {
    browsable: Selector,
    harvestable: Selector,
    stop: Option<Selector>,
    fields: Vec<(String, Selector)>,
}

fn compile(selector: &str) -> Result<Selector, HandlerError> {
    Selector::parse(selector).map_err(|e| HandlerError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl SelectorHandler {
    /// Compiles the selectors of a rules section
    pub fn new(rules: &RulesConfig) -> Result<Self, HandlerError> {
        let fields = rules
            .fields
            .iter()
            .map(|(name, selector)| Ok((name.clone(), compile(selector)?)))
            .collect::<Result<Vec<_>, HandlerError>>()?;

        Ok(Self {
            browsable: compile(&rules.browsable)?,
            harvestable: compile(&rules.harvestable)?,
            stop: rules.stop.as_deref().map(compile).transpose()?,
            fields,
        })
    }
}

impl PageHandler for SelectorHandler {
    fn get_browsable(&self, page: &Page) -> Vec<String> {
        page.hrefs(&self.browsable)
    }

    fn get_harvestable(&self, page: &Page) -> Vec<String> {
        page.hrefs(&self.harvestable)
    }

    fn stop_test(&self, page: &Page) -> bool {
        self.stop.as_ref().is_some_and(|stop| page.matches(stop))
    }

    fn parse(&self, page: &Page) -> Result<Vec<Record>, HandlerError> {
        let mut record = Record::new();
        for (name, selector) in &self.fields {
            if let Some(text) = page.first_text(selector) {
                record.insert(name.clone(), Value::String(text));
            }
        }

        if record.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const LISTING: &[u8] = br#"
        <html><body>
          <ol class="row">
            <li><article><h3><a href="a-light-in-the-attic_1000/index.html">A Light</a></h3></article></li>
            <li><article><h3><a href="tipping-the-velvet_999/index.html">Tipping</a></h3></article></li>
          </ol>
          <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>
        </body></html>
    "#;

    const LAST_LISTING: &[u8] = br#"
        <ul class="pager"><li class="previous"><a href="page-49.html">previous</a></li></ul>
    "#;

    const DETAIL: &[u8] = br#"
        <div class="product_main">
          <h1>A Light in the Attic</h1>
          <p class="price_color">51.77</p>
        </div>
    "#;

    fn create_test_rules() -> RulesConfig {
        RulesConfig {
            browsable: "li.next > a".to_string(),
            harvestable: "h3 > a".to_string(),
            stop: Some("ul.pager > li.previous:last-child".to_string()),
            fields: BTreeMap::from([
                ("title".to_string(), "div.product_main h1".to_string()),
                ("price".to_string(), "p.price_color".to_string()),
                ("rating".to_string(), "p.star-rating".to_string()),
            ]),
        }
    }

    fn handler() -> SelectorHandler {
        SelectorHandler::new(&create_test_rules()).unwrap()
    }

    #[test]
    fn test_links() {
        let page = Page::from_archive(LISTING);
        assert_eq!(handler().get_browsable(&page), vec!["page-2.html"]);
        assert_eq!(
            handler().get_harvestable(&page),
            vec![
                "a-light-in-the-attic_1000/index.html",
                "tipping-the-velvet_999/index.html"
            ]
        );
    }

    #[test]
    fn test_stop_predicate() {
        assert!(!handler().stop_test(&Page::from_archive(LISTING)));
        assert!(handler().stop_test(&Page::from_archive(LAST_LISTING)));
    }

    #[test]
    fn test_no_stop_selector_never_stops() {
        let mut rules = create_test_rules();
        rules.stop = None;
        let handler = SelectorHandler::new(&rules).unwrap();
        assert!(!handler.stop_test(&Page::from_archive(LAST_LISTING)));
    }

    #[test]
    fn test_parse_record_omits_missing_fields() {
        let records = handler().parse(&Page::from_archive(DETAIL)).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["title"], "A Light in the Attic");
        assert_eq!(record["price"], "51.77");
        assert!(!record.contains_key("rating"));
    }

    #[test]
    fn test_parse_without_matches_yields_nothing() {
        let records = handler().parse(&Page::from_archive(b"<p>nothing</p>")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_default_page_id_is_sha256() {
        let id = handler().get_page_id("https://books.toscrape.com/");
        assert_eq!(id.len(), 64);
        assert_eq!(id, crate::url::page_id("https://books.toscrape.com/"));
    }

    #[test]
    fn test_invalid_selector() {
        let mut rules = create_test_rules();
        rules.browsable = "li >>> a[".to_string();
        assert!(matches!(
            SelectorHandler::new(&rules),
            Err(HandlerError::Selector { .. })
        ));
    }
}
