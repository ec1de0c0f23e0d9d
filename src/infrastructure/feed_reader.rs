//! Product-catalog XML feed reader
//!
//! Every `<product>` element (name configurable) becomes a [`FeedEntry`]: a
//! flat map from leaf element name to the values found under it, in
//! document order. Wrappers such as `<images>` disappear and only their
//! leaves are kept, so `<images><image>a</image><image>b</image></images>`
//! yields `image => [a, b]`.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Where a feed is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    File(PathBuf),
    Url(String),
}

impl FeedSource {
    /// `http(s)://` sources are fetched remotely, everything else is a path
    pub fn parse(source: &str) -> ParsingResult<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(ParsingError::InvalidFeedSource {
                source_ref: source.to_string(),
                reason: "feed source is empty".to_string(),
            });
        }

        match url::Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Url(url.to_string())),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|()| ParsingError::InvalidFeedSource {
                    source_ref: source.to_string(),
                    reason: "file URL does not name a local path".to_string(),
                }),
            _ => Ok(Self::File(PathBuf::from(trimmed))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}

/// Raw, un-normalized content of one product element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    fields: BTreeMap<String, Vec<String>>,
}

impl FeedEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Builder-style insert, mostly for tests and fixtures
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// First value recorded under `name`
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values recorded under `name`
    pub fn values(&self, name: &str) -> &[String] {
        self.fields
            .get(&name.to_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Every recorded field, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One open element inside the current product
#[derive(Debug)]
struct OpenElement {
    name: String,
    text: String,
    has_children: bool,
}

pub struct FeedReader {
    product_element: String,
}

impl FeedReader {
    pub fn new(product_element: impl Into<String>) -> Self {
        Self {
            product_element: product_element.into().to_lowercase(),
        }
    }

    /// Parse the whole feed document into entries
    pub fn parse(&self, xml: &str) -> ParsingResult<Vec<FeedEntry>> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::with_capacity(8192);

        let mut entries = Vec::new();
        let mut current: Option<FeedEntry> = None;
        let mut stack: Vec<OpenElement> = Vec::new();
        // Open elements across the whole document
        let mut depth: usize = 0;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ParsingError::xml_parsing_failed(e.to_string(), position))?;

            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    let name = local_name(e.local_name().as_ref());
                    if current.is_none() {
                        if name == self.product_element {
                            current = Some(FeedEntry::new());
                        }
                    } else {
                        if let Some(parent) = stack.last_mut() {
                            parent.has_children = true;
                        }
                        stack.push(OpenElement {
                            name,
                            text: String::new(),
                            has_children: false,
                        });
                    }
                }
                Event::Empty(ref e) => {
                    let name = local_name(e.local_name().as_ref());
                    if let Some(entry) = current.as_mut() {
                        if let Some(parent) = stack.last_mut() {
                            parent.has_children = true;
                        }
                        entry.push(&name, String::new());
                    } else if name == self.product_element {
                        entries.push(FeedEntry::new());
                    }
                }
                Event::Text(ref e) => {
                    if let Some(open) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| {
                            ParsingError::xml_parsing_failed(err.to_string(), position)
                        })?;
                        open.text.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    depth = depth.saturating_sub(1);
                    let name = local_name(e.local_name().as_ref());
                    if let Some(open) = stack.pop() {
                        // Only leaves carry values; wrappers are dropped
                        if !open.has_children {
                            if let Some(entry) = current.as_mut() {
                                entry.push(&open.name, open.text.trim());
                            }
                        }
                    } else if name == self.product_element {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        if current.is_some() {
            return Err(ParsingError::xml_parsing_failed(
                format!("unterminated <{}> element", self.product_element),
                reader.buffer_position(),
            ));
        }
        if depth > 0 {
            return Err(ParsingError::xml_parsing_failed(
                format!("document ended with {depth} unclosed element(s)"),
                reader.buffer_position(),
            ));
        }

        info!("📦 Parsed {} product entries from feed", entries.len());
        debug!(
            "Feed fields seen: {:?}",
            entries
                .first()
                .map(|e| e.iter().map(|(k, _)| k).collect::<Vec<_>>())
        );
        Ok(entries)
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns:g="http://base.google.com/ns/1.0">
  <products>
    <product>
      <id>1001</id>
      <name>basic tee</name>
      <g:price>199,90 TL</g:price>
      <colors>Black, White</colors>
      <description><![CDATA[<p><b>Fabric:</b> Cotton</p>]]></description>
      <images>
        <image>/img/1001-1.jpg</image>
        <image>/img/1001-2.jpg</image>
      </images>
      <note/>
    </product>
    <product>
      <id> 1002 </id>
      <name>Tom &amp; Jerry Hoodie</name>
    </product>
  </products>
</catalog>"#;

    #[test]
    fn test_parses_entries_and_flattens_wrappers() {
        let entries = FeedReader::new("product").parse(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.first("id"), Some("1001"));
        assert_eq!(first.first("price"), Some("199,90 TL"));
        assert_eq!(first.values("image"), ["/img/1001-1.jpg", "/img/1001-2.jpg"]);
        assert!(first.values("images").is_empty());
        assert_eq!(first.first("note"), Some(""));
        assert_eq!(first.first("description"), Some("<p><b>Fabric:</b> Cotton</p>"));
    }

    #[test]
    fn test_trims_and_unescapes_text() {
        let entries = FeedReader::new("product").parse(SAMPLE).unwrap();
        assert_eq!(entries[1].first("id"), Some("1002"));
        assert_eq!(entries[1].first("name"), Some("Tom & Jerry Hoodie"));
    }

    #[test]
    fn test_custom_product_element_is_case_insensitive() {
        let xml = "<Urunler><Urun><ID>7</ID></Urun><Urun><ID>8</ID></Urun></Urunler>";
        let entries = FeedReader::new("urun").parse(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].first("id"), Some("8"));
    }

    #[test]
    fn test_feed_without_products() {
        let entries = FeedReader::new("product").parse("<catalog></catalog>").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = FeedReader::new("product").parse("<products><product><id>1</name></product>");
        assert!(matches!(result, Err(ParsingError::XmlParsingFailed { .. })));
    }

    #[test]
    fn test_feed_truncated_between_products_is_an_error() {
        let xml = "<catalog><products><product><id>1</id></product><product><id>2</id></product>";
        let result = FeedReader::new("product").parse(xml);
        assert!(matches!(result, Err(ParsingError::XmlParsingFailed { .. })));
    }

    #[test]
    fn test_feed_source_detection() {
        assert_eq!(
            FeedSource::parse("https://example.com/feed.xml").unwrap(),
            FeedSource::Url("https://example.com/feed.xml".to_string())
        );
        assert_eq!(
            FeedSource::parse("./data/feed.xml").unwrap(),
            FeedSource::File(PathBuf::from("./data/feed.xml"))
        );
        assert!(FeedSource::parse("   ").is_err());
    }
}
