/// Declarative HTML extraction for listing and detail pages.
///
/// The listing mapping names a container tag and, for the title and link fields, a tag,
/// attribute filters and an extraction mode (element text or an attribute value).
/// Each container yields at most one `ListingEntry`; containers that do not produce a
/// usable title and absolute http(s) link are skipped with a warning.
///
/// The detail layout is a set of CSS selectors locating the project text inside the
/// detail page. Text inside `script`, `style`, `noscript`, `nav`, `form` and `footer`
/// elements is never extracted.
use std::collections::{BTreeMap, HashSet};

use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::AppError;
use crate::model::ListingEntry;

const IGNORED_TAGS: [&str; 6] = ["script", "style", "noscript", "nav", "form", "footer"];

/// What to take from a matched element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractMode {
    /// Whitespace-normalized text content
    #[default]
    Text,
    /// Value of the named attribute; elements without it are passed over
    Attribute { name: String },
}

/// Locates one field inside a listing container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub tag: String,
    /// Attribute filters; `class` matches when the element carries every listed class,
    /// any other attribute must equal the value exactly
    #[serde(default, alias = "attr")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub extract: ExtractMode,
}

impl FieldSpec {
    pub fn text(tag: &str, attrs: &[(&str, &str)]) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            extract: ExtractMode::Text,
        }
    }

    pub fn attribute(tag: &str, attrs: &[(&str, &str)], name: &str) -> Self {
        Self {
            extract: ExtractMode::Attribute {
                name: name.to_string(),
            },
            ..Self::text(tag, attrs)
        }
    }

    /// Render the tag and attribute filters as a CSS selector.
    pub fn css(&self) -> Result<String, AppError> {
        let mut css = checked_ident(&self.tag, "tag")?.to_ascii_lowercase();
        for (name, value) in &self.attrs {
            let name = checked_ident(name, "attribute")?;
            if name.eq_ignore_ascii_case("class") {
                for class in value.split_whitespace() {
                    css.push_str(&format!("[class~=\"{}\"]", escape_css_string(class)));
                }
            } else {
                css.push_str(&format!("[{name}=\"{}\"]", escape_css_string(value)));
            }
        }
        Ok(css)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionMapping {
    pub container_tag: String,
    pub title: FieldSpec,
    pub link: FieldSpec,
}

impl Default for ExtractionMapping {
    fn default() -> Self {
        Self {
            container_tag: "article".to_string(),
            title: FieldSpec::text("h2", &[("class", "entry-title")]),
            link: FieldSpec::attribute("a", &[("class", "post-block-wrapper")], "href"),
        }
    }
}

/// CSS selectors that locate the project text on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetailLayout {
    /// Element holding the project content
    pub root: String,
    /// Project heading inside the root; required
    pub title: String,
    /// Introductory paragraph inside the root; optional
    pub intro: String,
    /// Headings, paragraphs and lists making up the body, in document order
    pub sections: String,
}

impl Default for DetailLayout {
    fn default() -> Self {
        Self {
            root: "article".to_string(),
            title: "h1.entry-title".to_string(),
            intro: "p.is-style-intro".to_string(),
            sections: "h2.wp-block-heading, p:not(.is-style-intro), ul".to_string(),
        }
    }
}

/// Contents of the optional extraction file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub listing: ExtractionMapping,
    #[serde(default)]
    pub detail: DetailLayout,
}

struct CompiledField {
    selector: Selector,
    mode: ExtractMode,
}

impl CompiledField {
    fn new(spec: &FieldSpec) -> Result<Self, AppError> {
        let css = spec.css()?;
        Ok(Self {
            selector: parse_selector(&css)?,
            mode: spec.extract.clone(),
        })
    }

    fn extract(&self, container: ElementRef<'_>) -> Option<String> {
        container
            .select(&self.selector)
            .filter(|el| !is_ignored(el))
            .find_map(|el| {
                let value = match &self.mode {
                    ExtractMode::Text => element_text(el),
                    ExtractMode::Attribute { name } => el.value().attr(name)?.trim().to_string(),
                };
                (!value.is_empty()).then_some(value)
            })
    }
}

pub struct ListingExtractor {
    container: Selector,
    title: CompiledField,
    link: CompiledField,
}

impl ListingExtractor {
    pub fn new(mapping: &ExtractionMapping) -> Result<Self, AppError> {
        let container = checked_ident(&mapping.container_tag, "container tag")?.to_ascii_lowercase();
        Ok(Self {
            container: parse_selector(&container)?,
            title: CompiledField::new(&mapping.title)?,
            link: CompiledField::new(&mapping.link)?,
        })
    }

    /// Extract entries in page order. Relative links are resolved against `base`;
    /// a link seen earlier on the page is not repeated.
    pub fn extract(&self, html: &str, base: &Url) -> Vec<ListingEntry> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (index, container) in document
            .select(&self.container)
            .filter(|el| !is_ignored(el))
            .enumerate()
        {
            match self.extract_entry(container, base) {
                Ok(entry) => {
                    if seen.insert(entry.link.clone()) {
                        entries.push(entry);
                    }
                }
                Err(e) => warn!(index, error = %e, "skipping malformed listing entry"),
            }
        }
        entries
    }

    fn extract_entry(&self, container: ElementRef<'_>, base: &Url) -> Result<ListingEntry, AppError> {
        let title = self
            .title
            .extract(container)
            .ok_or_else(|| AppError::Extraction("entry has no title".to_string()))?;
        let raw_link = self
            .link
            .extract(container)
            .ok_or_else(|| AppError::Extraction(format!("entry '{title}' has no link")))?;
        let link = resolve_link(base, &raw_link)?;
        Ok(ListingEntry { title, link })
    }
}

pub struct DetailExtractor {
    root: Selector,
    title: Selector,
    intro: Selector,
    sections: Selector,
    list_item: Selector,
}

impl DetailExtractor {
    pub fn new(layout: &DetailLayout) -> Result<Self, AppError> {
        Ok(Self {
            root: parse_selector(&layout.root)?,
            title: parse_selector(&layout.title)?,
            intro: parse_selector(&layout.intro)?,
            sections: parse_selector(&layout.sections)?,
            list_item: parse_selector("li")?,
        })
    }

    /// Build the project description: title, intro, then the body sections.
    ///
    /// Headings become their own line, list items become `- item` lines, and
    /// paragraphs are only kept once the first body heading has been seen (the text
    /// before it is page furniture on the sites this targets).
    pub fn extract(&self, html: &str) -> Result<String, AppError> {
        let document = Html::parse_document(html);
        let root = document
            .select(&self.root)
            .find(|el| !is_ignored(el))
            .ok_or_else(|| AppError::Extraction("detail page has no content root".to_string()))?;

        let title = root
            .select(&self.title)
            .map(element_text)
            .find(|t| !t.is_empty())
            .ok_or_else(|| AppError::Extraction("detail page has no title".to_string()))?;
        let intro = root
            .select(&self.intro)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let mut out = format!("{title}\n\n{intro}\n\n");
        let mut in_body = false;
        for el in root.select(&self.sections).filter(|el| !is_ignored(el)) {
            match el.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let heading = element_text(el);
                    if !heading.is_empty() {
                        out.push_str(&heading);
                        out.push('\n');
                        in_body = true;
                    }
                }
                "ul" | "ol" => {
                    for item in el.select(&self.list_item) {
                        let text = element_text(item);
                        if !text.is_empty() {
                            out.push_str(&format!("- {text}\n"));
                        }
                    }
                }
                _ if in_body => {
                    let text = element_text(el);
                    if !text.is_empty() {
                        out.push_str(&text);
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }

        Ok(out.trim_end().to_string())
    }
}

/// Text content of `el` with whitespace collapsed, skipping ignored subtrees and
/// comments.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if !IGNORED_TAGS.contains(&element.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn is_ignored(el: &ElementRef<'_>) -> bool {
    IGNORED_TAGS.contains(&el.value().name())
        || el
            .ancestors()
            .filter_map(|node| node.value().as_element())
            .any(|element| IGNORED_TAGS.contains(&element.name()))
}

fn resolve_link(base: &Url, raw: &str) -> Result<String, AppError> {
    let url = base
        .join(raw)
        .map_err(|e| AppError::Extraction(format!("invalid link '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(AppError::Extraction(format!(
            "link '{raw}' has unsupported scheme '{other}'"
        ))),
    }
}

fn parse_selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Config(format!("invalid selector '{css}': {e:?}")))
}

fn checked_ident<'a>(value: &'a str, what: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    let valid = value.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(value)
    } else {
        Err(AppError::Config(format!("invalid {what} name '{value}'")))
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
