use crate::utils::error::{Result, ScraperError};
use scraper::{ElementRef, Html, Selector};

/// 候選區塊來源，排列順序即為同深度時的優先序（越後面越優先）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionSource {
    Body,
    SkipLinkTarget,
    MainElement,
    RoleMain,
    IdMain,
    IdContent,
    IdMainContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRegion {
    pub source: RegionSource,
    pub text: String,
}

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "fieldset",
    "figure",
    "footer",
    "form",
    "header",
    "li",
    "main",
    "nav",
    "ol",
    "section",
    "table",
    "td",
    "ul",
];

const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

struct Candidate<'a> {
    source: RegionSource,
    element: ElementRef<'a>,
    depth: usize,
    text: String,
}

/// 從個人頁面中找出最具體、非空白的主要內容區塊
pub struct ContentSelector {
    body: Selector,
    skip_link: Selector,
    main: Selector,
    role_main: Selector,
    id_main: Selector,
    id_content: Selector,
    id_main_content: Selector,
    header: Selector,
    footer: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::ConfigError {
        message: format!("Invalid CSS selector '{}': {:?}", css, e),
    })
}

impl ContentSelector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            body: parse_selector("body")?,
            skip_link: parse_selector("a#main-content")?,
            main: parse_selector("main")?,
            role_main: parse_selector(r#"[role="main"]"#)?,
            id_main: parse_selector("#main")?,
            id_content: parse_selector("#content")?,
            id_main_content: parse_selector("#main-content")?,
            header: parse_selector("header")?,
            footer: parse_selector("footer")?,
        })
    }

    /// 解析 HTML 後選取內容；`Html` 不跨越 await，呼叫端只拿到文字
    pub fn select_html(&self, html: &str) -> Result<ContentRegion> {
        let document = Html::parse_document(html);
        self.select(&document)
    }

    pub fn select(&self, document: &Html) -> Result<ContentRegion> {
        let body = document
            .select(&self.body)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut found: Vec<(RegionSource, ElementRef<'_>)> = vec![(RegionSource::Body, body)];

        if let Some(target) = document
            .select(&self.skip_link)
            .find(|anchor| is_blank(&element_text(*anchor)))
            .and_then(nearest_block_ancestor)
        {
            found.push((RegionSource::SkipLinkTarget, target));
        }
        if let Some(el) = document.select(&self.main).next() {
            found.push((RegionSource::MainElement, el));
        }
        if let Some(el) = document.select(&self.role_main).next() {
            found.push((RegionSource::RoleMain, el));
        }
        for (source, selector) in [
            (RegionSource::IdMain, &self.id_main),
            (RegionSource::IdContent, &self.id_content),
            (RegionSource::IdMainContent, &self.id_main_content),
        ] {
            if let Some(el) = document.select(selector).find(is_block) {
                found.push((source, el));
            }
        }

        let candidates = distinct_non_blank(found);
        let best = candidates
            .into_iter()
            .max_by_key(|c| (c.depth, c.source))
            .ok_or(ScraperError::NoContent)?;

        tracing::debug!(
            "Selected content region {:?} at depth {} ({} chars)",
            best.source,
            best.depth,
            best.text.len()
        );

        // 被選中的節點就是 body 時才去除頁首頁尾，不論它以哪個來源被選中
        if best.element.id() == body.id() {
            if let Some(text) = self.strip_body_chrome(document, best.element) {
                if is_blank(&text) {
                    return Err(ScraperError::NoContent);
                }
                return Ok(ContentRegion {
                    source: best.source,
                    text,
                });
            }
        }

        Ok(ContentRegion {
            source: best.source,
            text: best.text,
        })
    }

    /// 在副本上移除第一個 header 與最後一個 footer，原文件不變
    fn strip_body_chrome(&self, document: &Html, body: ElementRef<'_>) -> Option<String> {
        let header = body.select(&self.header).next().map(|el| el.id());
        let footer = body.select(&self.footer).last().map(|el| el.id());
        if header.is_none() && footer.is_none() {
            return None;
        }

        let mut cleaned = document.clone();
        for id in [header, footer].into_iter().flatten() {
            if let Some(mut node) = cleaned.tree.get_mut(id) {
                node.detach();
            }
        }

        let cleaned_body = cleaned.tree.get(body.id()).and_then(ElementRef::wrap)?;
        Some(element_text(cleaned_body))
    }
}

fn distinct_non_blank<'a>(found: Vec<(RegionSource, ElementRef<'a>)>) -> Vec<Candidate<'a>> {
    let mut candidates: Vec<Candidate<'a>> = Vec::new();
    for (source, element) in found {
        if let Some(existing) = candidates.iter_mut().find(|c| c.element.id() == element.id()) {
            existing.source = existing.source.max(source);
            continue;
        }
        let text = element_text(element);
        if is_blank(&text) {
            continue;
        }
        candidates.push(Candidate {
            source,
            element,
            depth: element.ancestors().count(),
            text,
        });
    }
    candidates
}

fn is_block(el: &ElementRef<'_>) -> bool {
    BLOCK_TAGS.contains(&el.value().name())
}

fn nearest_block_ancestor(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| is_block(ancestor))
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// 可見文字，空白正規化為單一空格
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(el, &mut parts);
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push(String::from(&**text));
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !NON_RENDERED_TAGS.contains(&child_el.value().name()) {
                collect_text(child_el, out);
            }
        }
    }
}
