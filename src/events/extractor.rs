//! 描画済みDOMからイベントカードを読み取る

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScraperError;

use super::site::CardSelectors;
use super::types::RawEventRecord;

fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css)
        .map_err(|e| ScraperError::Extraction(format!("不正なセレクタ '{}': {}", css, e)))
}

/// 改行として扱う要素（innerText と同じく前後で単語が区切られる）
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "section", "table", "td", "th", "tr", "ul",
];

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        match child_el.value().name() {
            "br" => out.push('\n'),
            "script" | "style" | "template" => {}
            name if BLOCK_ELEMENTS.contains(&name) => {
                out.push('\n');
                collect_text(child_el, out);
                out.push('\n');
            }
            _ => collect_text(child_el, out),
        }
    }
}

/// 子要素のテキスト（前後の空白を除去し、連続する空白や改行は1つの空白にまとめる）
fn first_text(card: &ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| {
            let mut raw = String::new();
            collect_text(el, &mut raw);
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .unwrap_or_default()
}

/// カードをDOM出現順に抽出する。欠けているフィールドは空文字列になる
pub fn extract_raw(
    html: &str,
    selectors: &CardSelectors,
) -> Result<Vec<RawEventRecord>, ScraperError> {
    let card_selector = parse_selector(&selectors.card)?;
    let title_selector = parse_selector(&selectors.title)?;
    let date_selector = parse_selector(&selectors.date)?;
    let link_selector = parse_selector(&selectors.link)?;

    let document = Html::parse_document(html);

    let records: Vec<RawEventRecord> = document
        .select(&card_selector)
        .map(|card| RawEventRecord {
            title: first_text(&card, &title_selector),
            date_text: first_text(&card, &date_selector),
            href: card
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr(&selectors.link_attr))
                .map(|href| href.trim().to_string())
                .unwrap_or_default(),
        })
        .collect();

    debug!("Extracted {} event cards", records.len());
    Ok(records)
}
