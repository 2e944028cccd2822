use crate::collector::ReportItem;
use scraper::{Html, Selector};

/// Extracts report entries from a listing page. Items keep document order;
/// entries without display text are dropped, a missing link is fine.
pub fn parse_report_items(html: &str) -> Vec<ReportItem> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse("#report_list li").expect("static selector");
    let link_selector = Selector::parse("a").expect("static selector");

    let mut items = Vec::new();
    for element in document.select(&item_selector) {
        let text = element.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            continue;
        }

        let link = element
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(str::to_string);

        items.push(ReportItem { text, link });
    }

    items
}
