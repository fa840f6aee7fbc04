//! In-memory SVG document
//!
//! A small element tree parsed with quick-xml. The today-line overlay reads
//! axis labels from it and inserts or removes exactly one line element; every
//! other node is carried through untouched.

use std::fmt::Write as _;

use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Chart parsing error
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("Malformed chart: {0}")]
    Malformed(String),

    #[error("Root element is <{0}>, expected <svg>")]
    NotSvg(String),
}

/// A child of an element
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
}

/// One XML element with ordered attributes
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, ChartError> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                attr.unescape_value()?.into_owned(),
            ));
        }
        Ok(element)
    }

    /// Name without a namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl ToString) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Attribute read as a length; a trailing `px` is accepted
    pub fn numeric_attr(&self, name: &str) -> Option<f64> {
        parse_length(self.attr(name)?)
    }

    /// Concatenated text content of the element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(out),
                Node::Text(text) => out.push_str(&escape(text)),
                Node::Comment(text) => {
                    let _ = write!(out, "<!--{}-->", text);
                }
                Node::CData(text) => {
                    let _ = write!(out, "<![CDATA[{}]]>", text);
                }
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

fn parse_length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// A `<text>` element found by [`SvgChart::text_labels`]
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    /// Child indices from the root down to the label
    pub path: Vec<usize>,
    pub x: f64,
    /// `x` of the next sibling `<text>` element, if any
    pub next_x: Option<f64>,
}

/// Parsed SVG chart
#[derive(Clone, Debug, PartialEq)]
pub struct SvgChart {
    root: Element,
}

impl SvgChart {
    /// Parse an SVG document. Declarations and processing instructions are
    /// dropped; elements, text, comments and CDATA are kept.
    pub fn parse(source: &str) -> Result<Self, ChartError> {
        let mut reader = Reader::from_str(source);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ChartError::Malformed("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.unescape()?.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(String::from_utf8_lossy(&data).into_owned()));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(&comment).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ChartError::Malformed("unclosed element".into()));
        }
        let root = root.ok_or_else(|| ChartError::Malformed("no root element".into()))?;
        if root.local_name() != "svg" {
            return Err(ChartError::NotSvg(root.name));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Serialize back to SVG text
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }

    /// Total width from the `width` attribute, else the `viewBox`
    pub fn width(&self) -> Option<f64> {
        self.root
            .numeric_attr("width")
            .or_else(|| self.view_box().map(|vb| vb[2]))
    }

    /// Total height from the `height` attribute, else the `viewBox`
    pub fn height(&self) -> Option<f64> {
        self.root
            .numeric_attr("height")
            .or_else(|| self.view_box().map(|vb| vb[3]))
    }

    /// Lowest point reached by any drawn element, for charts that declare
    /// neither `height` nor a `viewBox`
    pub fn content_height(&self) -> Option<f64> {
        lowest_extent(&self.root)
    }

    fn view_box(&self) -> Option<[f64; 4]> {
        let values: Vec<f64> = self
            .root
            .attr("viewBox")?
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        values.try_into().ok()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        find_by_id(&self.root, id)
    }

    /// Remove every element carrying `id`, at any depth. Returns how many
    /// were removed.
    pub fn remove_by_id(&mut self, id: &str) -> usize {
        remove_by_id(&mut self.root, id)
    }

    /// `<text>` elements whose trimmed content equals `content`, in document
    /// order. Labels without a numeric `x` are not reported.
    pub fn text_labels(&self, content: &str) -> Vec<TextLabel> {
        let mut labels = Vec::new();
        let mut path = Vec::new();
        collect_labels(&self.root, content, &mut path, &mut labels);
        labels
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path {
            current = match current.children.get(index)? {
                Node::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path {
            current = match current.children.get_mut(index)? {
                Node::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Insert `element` as the next sibling of the node at `path`.
    ///
    /// Returns `false` if `path` is empty (the root has no siblings) or does
    /// not resolve.
    pub fn insert_after(&mut self, path: &[usize], element: Element) -> bool {
        let Some((&index, parent_path)) = path.split_last() else {
            return false;
        };
        match self.element_at_mut(parent_path) {
            Some(parent) if index < parent.children.len() => {
                parent.children.insert(index + 1, Node::Element(element));
                true
            }
            _ => false,
        }
    }

    /// Append `element` as the last child of the root
    pub fn append(&mut self, element: Element) {
        self.root.children.push(Node::Element(element));
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ChartError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(ChartError::Malformed("multiple root elements".into())),
    }
    Ok(())
}

fn find_by_id<'a>(element: &'a Element, id: &str) -> Option<&'a Element> {
    if element.attr("id") == Some(id) {
        return Some(element);
    }
    element.elements().find_map(|child| find_by_id(child, id))
}

fn lowest_extent(element: &Element) -> Option<f64> {
    let own = [
        element
            .numeric_attr("y")
            .map(|y| y + element.numeric_attr("height").unwrap_or(0.0)),
        element.numeric_attr("y1"),
        element.numeric_attr("y2"),
        element
            .numeric_attr("cy")
            .map(|cy| cy + element.numeric_attr("r").or_else(|| element.numeric_attr("ry")).unwrap_or(0.0)),
    ];
    own.into_iter()
        .flatten()
        .chain(element.elements().filter_map(lowest_extent))
        .reduce(f64::max)
}

fn remove_by_id(element: &mut Element, id: &str) -> usize {
    let before = element.children.len();
    element
        .children
        .retain(|node| !matches!(node, Node::Element(e) if e.attr("id") == Some(id)));
    let mut removed = before - element.children.len();
    for child in &mut element.children {
        if let Node::Element(child) = child {
            removed += remove_by_id(child, id);
        }
    }
    removed
}

fn collect_labels(
    element: &Element,
    content: &str,
    path: &mut Vec<usize>,
    labels: &mut Vec<TextLabel>,
) {
    for (index, node) in element.children.iter().enumerate() {
        let Node::Element(child) = node else {
            continue;
        };
        path.push(index);
        if child.local_name() == "text" {
            if let Some(x) = child.numeric_attr("x") {
                if child.text().trim() == content {
                    labels.push(TextLabel {
                        path: path.clone(),
                        x,
                        next_x: next_text_x(element, index),
                    });
                }
            }
        } else {
            collect_labels(child, content, path, labels);
        }
        path.pop();
    }
}

fn next_text_x(parent: &Element, index: usize) -> Option<f64> {
    parent.children[index + 1..]
        .iter()
        .filter_map(|node| match node {
            Node::Element(e) if e.local_name() == "text" => Some(e),
            _ => None,
        })
        .find_map(|e| e.numeric_attr("x"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const AXIS: &str = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="600" height="200">
  <!-- axis -->
  <g class="axis">
    <text x="100">Jan</text>
    <text x="200">Feb</text>
    <text x="300">Mar</text>
  </g>
  <g class="bars">
    <rect id="bar-a" x="100" y="40" width="80" height="10"/>
    <text x="110" y="48">A &amp; B</text>
  </g>
</svg>"#;

    #[test]
    fn parses_elements_and_dimensions() {
        let chart = SvgChart::parse(AXIS).unwrap();
        assert_eq!(chart.root().local_name(), "svg");
        assert_eq!(chart.width(), Some(600.0));
        assert_eq!(chart.height(), Some(200.0));
        assert_eq!(chart.root().elements().count(), 2);
        assert_eq!(chart.find_by_id("bar-a").unwrap().attr("width"), Some("80"));
    }

    #[test]
    fn view_box_fallback() {
        let chart = SvgChart::parse(r#"<svg viewBox="0 0 640 480"></svg>"#).unwrap();
        assert_eq!(chart.width(), Some(640.0));
        assert_eq!(chart.height(), Some(480.0));

        let chart = SvgChart::parse(r#"<svg width="300px"/>"#).unwrap();
        assert_eq!(chart.width(), Some(300.0));
        assert_eq!(chart.height(), None);
        assert_eq!(chart.content_height(), None);
    }

    #[test]
    fn content_height_is_lowest_drawn_point() {
        let chart = SvgChart::parse(AXIS).unwrap();
        assert_eq!(chart.content_height(), Some(50.0));

        let chart = SvgChart::parse(
            r#"<svg width="300"><g><line y1="5" y2="120"/><circle cy="60" r="8"/></g><text x="10" y="15">Jan</text></svg>"#,
        )
        .unwrap();
        assert_eq!(chart.height(), None);
        assert_eq!(chart.content_height(), Some(120.0));
    }

    #[test]
    fn finds_labels_with_next_sibling() {
        let chart = SvgChart::parse(AXIS).unwrap();
        let feb = chart.text_labels("Feb");
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].x, 200.0);
        assert_eq!(feb[0].next_x, Some(300.0));

        let mar = chart.text_labels("Mar");
        assert_eq!(mar[0].next_x, None);
        assert!(chart.text_labels("Apr").is_empty());
        assert_eq!(chart.text_labels("A & B").len(), 1);
    }

    #[test]
    fn insert_and_remove_by_id() {
        let mut chart = SvgChart::parse(AXIS).unwrap();
        let labels = chart.text_labels("Jan");
        let group_path = labels[0].path[..1].to_vec();

        let line = Element::new("line").with_attr("id", "marker");
        assert!(chart.insert_after(&group_path, line));
        assert_eq!(chart.root().elements().nth(1).unwrap().name, "line");
        assert!(chart.find_by_id("marker").is_some());

        assert_eq!(chart.remove_by_id("marker"), 1);
        assert!(chart.find_by_id("marker").is_none());
        assert!(!chart.insert_after(&[], Element::new("line")));
    }

    #[test]
    fn serializes_round_trip_content() {
        let chart = SvgChart::parse(AXIS).unwrap();
        let written = chart.to_svg_string();
        assert!(written.starts_with("<svg "));
        assert!(written.contains("<!-- axis -->"));
        assert!(written.contains("A &amp; B"));
        assert_eq!(SvgChart::parse(&written).unwrap(), chart);
    }

    #[test]
    fn rejects_non_svg_and_broken_input() {
        assert!(matches!(
            SvgChart::parse("<html></html>"),
            Err(ChartError::NotSvg(name)) if name == "html"
        ));
        assert!(SvgChart::parse("").is_err());
        assert!(SvgChart::parse("<svg><g></svg>").is_err());
    }
}
