//! Owned SVG document tree.
//!
//! The pipeline takes the document by value, mutates it stage by stage and
//! hands it back; nothing else holds a reference to it while a run is in
//! progress. Parsing is lossless enough for republishing: the XML
//! declaration, comments, doctype and CDATA sections are written back
//! verbatim, attributes keep their order and qualified names.

use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event as XmlEvent};

use crate::error::{Error, Result};
use crate::style::Style;
use crate::xml::{escape_attr, escape_text, resolve_entity};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Markup written back untouched (comments, CDATA, PIs, doctype).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
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

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Tag name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn style(&self) -> Style {
        Style::resolve(self)
    }

    pub fn set_style(&mut self, style: &Style) {
        let css = style.to_css();
        if css.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", css);
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
                Node::Raw(_) => {}
            }
        }
    }

    /// This element and all of its descendants, in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.walk(&mut out);
        out
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a Element>) {
        out.push(self);
        for child in self.child_elements() {
            child.walk(out);
        }
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        for el in self.descendants() {
            if let Some(id) = el.id() {
                out.push(id.to_string());
            }
        }
    }

    fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        f(self);
        for node in &mut self.children {
            if let Node::Element(el) = node {
                el.visit_mut(f);
            }
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) => el.find_mut(id),
            _ => None,
        })
    }

    fn remove_matching<F>(&mut self, pred: &mut F, removed: &mut Vec<String>)
    where
        F: FnMut(&Element) -> bool,
    {
        self.children.retain_mut(|node| match node {
            Node::Element(child) => {
                if pred(child) {
                    child.collect_ids(removed);
                    false
                } else {
                    child.remove_matching(pred, removed);
                    true
                }
            }
            _ => true,
        });
    }

    fn prune_empty_groups(&mut self, removed: &mut Vec<String>) {
        self.children.retain_mut(|node| match node {
            Node::Element(child) => {
                child.prune_empty_groups(removed);
                let empty = child.is("g") && child.child_elements().next().is_none();
                if empty {
                    child.collect_ids(removed);
                }
                !empty
            }
            _ => true,
        });
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            write_node(node, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => el.write(out),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Raw(raw) => out.push_str(raw),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    prolog: Vec<Node>,
    pub root: Element,
    epilog: Vec<Node>,
}

impl Document {
    pub fn parse(source: &str) -> Result<Self> {
        let mut reader = XmlReader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| Error::Xml {
                message: format!("at byte {}: {}", reader.error_position(), e),
            })?;

            let node = match event {
                XmlEvent::Start(ref e) => {
                    stack.push(element_from_start(e)?);
                    None
                }
                XmlEvent::End(_) => {
                    let el = stack.pop().ok_or_else(|| Error::Xml {
                        message: "unbalanced closing tag".to_string(),
                    })?;
                    Some(Node::Element(el))
                }
                XmlEvent::Empty(ref e) => Some(Node::Element(element_from_start(e)?)),
                XmlEvent::Text(ref e) => {
                    let raw = e.decode().map_err(|e| Error::Xml {
                        message: e.to_string(),
                    })?;
                    Some(Node::Text(unescape_lossy(&raw)))
                }
                XmlEvent::GeneralRef(ref e) => {
                    let name = e.decode().map_err(|e| Error::Xml {
                        message: e.to_string(),
                    })?;
                    let text = resolve_entity(&name)
                        .map(String::from)
                        .unwrap_or_else(|| format!("&{};", name));
                    Some(Node::Text(text))
                }
                XmlEvent::CData(ref e) => Some(Node::Raw(format!(
                    "<![CDATA[{}]]>",
                    String::from_utf8_lossy(e)
                ))),
                XmlEvent::Comment(ref e) => Some(Node::Raw(format!(
                    "<!--{}-->",
                    String::from_utf8_lossy(e)
                ))),
                XmlEvent::Decl(ref e) => {
                    Some(Node::Raw(format!("<?{}?>", String::from_utf8_lossy(e))))
                }
                XmlEvent::PI(ref e) => {
                    Some(Node::Raw(format!("<?{}?>", String::from_utf8_lossy(e))))
                }
                XmlEvent::DocType(ref e) => Some(Node::Raw(format!(
                    "<!DOCTYPE {}>",
                    String::from_utf8_lossy(e)
                ))),
                XmlEvent::Eof => break,
            };

            if let Some(node) = node {
                if let Some(parent) = stack.last_mut() {
                    push_merging_text(&mut parent.children, node);
                } else if root.is_none() {
                    match node {
                        Node::Element(el) => root = Some(el),
                        other => prolog.push(other),
                    }
                } else {
                    epilog.push(node);
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Xml {
                message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }
        let root = root.ok_or_else(|| Error::Xml {
            message: "document has no root element".to_string(),
        })?;
        if !root.is("svg") {
            return Err(Error::Xml {
                message: format!("root element is <{}>, expected <svg>", root.name),
            });
        }

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write(&mut out);
        for node in &self.epilog {
            write_node(node, &mut out);
        }
        out
    }

    /// Every element in document order, root first.
    pub fn elements(&self) -> Vec<&Element> {
        self.root.descendants()
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        self.elements().into_iter().find(|el| el.id() == Some(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_mut(id)
    }

    /// Calls `f` on every element in document order, root first.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Element),
    {
        self.root.visit_mut(&mut f);
    }

    /// Detaches every element matching `pred` (the root is never tested) and
    /// returns the ids of the removed elements and all of their descendants.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<String>
    where
        F: FnMut(&Element) -> bool,
    {
        let mut removed = Vec::new();
        self.root.remove_matching(&mut pred, &mut removed);
        removed
    }

    /// Removes `<g>` elements without element children, bottom-up, so a
    /// group emptied by pruning its children goes as well.
    pub fn remove_empty_groups(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.root.prune_empty_groups(&mut removed);
        removed
    }

    /// Largest trailing integer found on any element id.
    pub fn max_numeric_id(&self) -> Option<u64> {
        self.elements()
            .into_iter()
            .filter_map(|el| el.id().and_then(trailing_number))
            .max()
    }

    /// The group that receives synthesized elements: the one with the most
    /// direct element children, or the root when there are no groups.
    pub fn main_layer_mut(&mut self) -> &mut Element {
        let mut best: Option<(usize, Vec<usize>)> = None;
        let mut path = Vec::new();
        find_main_layer(&self.root, &mut path, &mut best);

        let mut current = &mut self.root;
        if let Some((_, path)) = best {
            for index in path {
                current = match &mut current.children[index] {
                    Node::Element(el) => el,
                    _ => unreachable!("main layer path only indexes element nodes"),
                };
            }
        }
        current
    }

    /// The root's `<defs>`, created as the first child when missing.
    pub fn defs_mut(&mut self) -> &mut Element {
        let pos = self.root.children.iter().position(|node| {
            matches!(node, Node::Element(el) if el.is("defs"))
        });
        let index = match pos {
            Some(index) => index,
            None => {
                self.root.children.insert(0, Node::Element(Element::new("defs")));
                0
            }
        };
        match &mut self.root.children[index] {
            Node::Element(el) => el,
            _ => unreachable!("defs index points at an element"),
        }
    }
}

fn find_main_layer(el: &Element, path: &mut Vec<usize>, best: &mut Option<(usize, Vec<usize>)>) {
    for (index, node) in el.children.iter().enumerate() {
        let Node::Element(child) = node else {
            continue;
        };
        path.push(index);
        if child.is("g") {
            let count = child.child_elements().count();
            if best.as_ref().is_none_or(|(n, _)| count > *n) {
                *best = Some((count, path.clone()));
            }
        }
        find_main_layer(child, path, best);
        path.pop();
    }
}

/// Trailing decimal digits of an id (`path1234` -> 1234, `text-12` -> 12).
pub fn trailing_number(id: &str) -> Option<u64> {
    let digits = id.len() - id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    id[id.len() - digits..].parse().ok()
}

fn element_from_start(e: &BytesStart<'_>) -> Result<Element> {
    let mut el = Element::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml {
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value);
        el.attributes.push((key, unescape_lossy(&raw)));
    }
    Ok(el)
}

fn unescape_lossy(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn push_merging_text(children: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node {
        if let Some(Node::Text(prev)) = children.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    children.push(node);
}
