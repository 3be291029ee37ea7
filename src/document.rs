use jiff::civil::Date;
use tracing::debug;

use crate::error::{FetchError, ParseError};
use crate::locator::{SourceConfig, TableId};
use crate::source::Source;

const PUBLICATION_DATE_TAG: &str = "data_publikacji";

/// Index of an element inside a [`RateDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    content: Vec<Content>,
}

/// Parsed rate table, owning its elements in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDocument {
    elements: Vec<Element>,
}

impl RateDocument {
    /// Parse XML text. DTDs are refused, so nothing external is ever resolved.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let xml = roxmltree::Document::parse(text)?;
        let mut doc = Self {
            elements: Vec::new(),
        };
        doc.push(xml.root_element(), None);
        Ok(doc)
    }

    /// Download and parse the document at `url`.
    pub fn fetch<S: Source + ?Sized>(source: &S, url: &str) -> Result<Self, FetchError> {
        let text = source.fetch(url)?;
        Self::parse(&text).map_err(|source| FetchError::Markup {
            url: url.to_owned(),
            source,
        })
    }

    fn push(&mut self, node: roxmltree::Node<'_, '_>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            tag: node.tag_name().name().to_owned(),
            attributes: node
                .attributes()
                .map(|attr| (attr.name().to_owned(), attr.value().to_owned()))
                .collect(),
            parent,
            content: Vec::new(),
        });

        for child in node.children() {
            let content = if child.is_element() {
                Content::Element(self.push(child, Some(id)))
            } else if let Some(text) = child.text().filter(|_| child.is_text()) {
                Content::Text(text.to_owned())
            } else {
                continue;
            };
            self.elements[id.0].content.push(content);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.elements[id.0].tag
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.elements[id.0].parent
    }

    /// Direct child elements of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.elements[id.0].content.iter().filter_map(|content| match content {
            Content::Element(child) => Some(*child),
            Content::Text(_) => None,
        })
    }

    /// All elements named `tag`, in document order.
    pub fn elements_by_tag<'d>(&'d self, tag: &'d str) -> impl Iterator<Item = NodeId> + 'd {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, element)| element.tag == tag)
            .map(|(index, _)| NodeId(index))
    }

    /// Concatenated text of `id` and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for content in &self.elements[id.0].content {
            match content {
                Content::Element(child) => self.collect_text(*child, out),
                Content::Text(text) => out.push_str(text),
            }
        }
    }

    /// Serialise with whitespace-only text dropped, text trimmed and attributes sorted.
    ///
    /// Two documents differing only in formatting produce the same output.
    pub fn to_normalized_xml(&self) -> String {
        let mut out = String::new();
        self.write_normalized(self.root(), &mut out);
        out
    }

    fn write_normalized(&self, id: NodeId, out: &mut String) {
        let element = &self.elements[id.0];
        out.push('<');
        out.push_str(&element.tag);

        let mut attributes: Vec<_> = element.attributes.iter().collect();
        attributes.sort();
        for (name, value) in attributes {
            out.push_str(&format!(" {name}=\"{}\"", escape(value)));
        }
        out.push('>');

        for content in &element.content {
            match content {
                Content::Element(child) => self.write_normalized(*child, out),
                Content::Text(text) => out.push_str(&escape(text.trim())),
            }
        }
        out.push_str(&format!("</{}>", element.tag));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `{base}/{table}.xml`, with any carriage return left over from the index removed.
pub fn document_url(config: &SourceConfig, table: &TableId) -> String {
    format!("{}/{}.xml", config.base_url, table.as_str().replace('\r', ""))
}

/// Download and parse one daily rate table.
pub fn fetch_document<S: Source + ?Sized>(
    source: &S,
    config: &SourceConfig,
    table: &TableId,
) -> Result<RateDocument, FetchError> {
    let url = document_url(config, table);
    debug!(%table, %url, "fetching rate table");
    RateDocument::fetch(source, &url)
}

/// The `<data_publikacji>` date from the table header.
pub fn read_publication_date(doc: &RateDocument) -> Result<Date, ParseError> {
    let node = doc
        .elements_by_tag(PUBLICATION_DATE_TAG)
        .next()
        .ok_or(ParseError::MissingDate {
            tag: PUBLICATION_DATE_TAG,
        })?;

    let value = doc.text_content(node);
    value
        .trim()
        .parse()
        .map_err(|e: jiff::Error| ParseError::Date {
            tag: PUBLICATION_DATE_TAG,
            value: value.clone(),
            reason: e.to_string(),
        })
}
