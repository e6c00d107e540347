use std::collections::HashMap;

use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use roxmltree::NodeType;

use crate::error::DocumentError;

const CELL_TAG: &str = "mxCell";
const GEOMETRY_TAG: &str = "mxGeometry";
const MODEL_TAG: &str = "mxGraphModel";
const CELL_ROOT_TAG: &str = "root";
const WRAPPER_TAGS: [&str; 2] = ["UserObject", "object"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Element {
    fn new(name: &str, attributes: Vec<(String, String)>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            children: Vec::new(),
            parent,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<XmlNode>,
    top: Vec<NodeId>,
    declaration: bool,
    cells: Vec<NodeId>,
    cell_index: HashMap<String, NodeId>,
    cell_root: Option<NodeId>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let parsed = roxmltree::Document::parse(text)?;
        let mut doc = Document {
            declaration: text.trim_start().starts_with("<?xml"),
            ..Default::default()
        };
        let mut top = Vec::new();
        for child in parsed.root().children() {
            if let Some(id) = doc.import(child, None) {
                top.push(id);
            }
        }
        doc.top = top;
        doc.index_first_model();
        Ok(doc)
    }

    fn import(&mut self, node: roxmltree::Node<'_, '_>, parent: Option<NodeId>) -> Option<NodeId> {
        match node.node_type() {
            NodeType::Element => {
                let mut attributes = declared_namespaces(node);
                attributes.extend(node.attributes().map(|attr| {
                    (
                        qualified_name(node, attr.namespace(), attr.name()),
                        attr.value().to_string(),
                    )
                }));
                let tag = node.tag_name();
                let id = self.push(XmlNode::Element(Element::new(
                    &qualified_name(node, tag.namespace(), tag.name()),
                    attributes,
                    parent,
                )));
                let children: Vec<NodeId> = node
                    .children()
                    .filter_map(|child| self.import(child, Some(id)))
                    .collect();
                if let XmlNode::Element(element) = &mut self.nodes[id.0] {
                    element.children = children;
                }
                Some(id)
            }
            NodeType::Text => Some(self.push(XmlNode::Text(
                node.text().unwrap_or_default().to_string(),
            ))),
            NodeType::Comment => Some(self.push(XmlNode::Comment(
                node.text().unwrap_or_default().to_string(),
            ))),
            NodeType::Root | NodeType::PI => None,
        }
    }

    fn push(&mut self, node: XmlNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn index_first_model(&mut self) {
        let Some(model) = self.find_descendant(&self.top.clone(), MODEL_TAG) else {
            return;
        };
        self.cell_root = self
            .element(model)
            .and_then(|el| self.child_element(el, CELL_ROOT_TAG));

        let mut stack = vec![model];
        let mut cells = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(el) = self.element(id) else {
                continue;
            };
            if el.name == CELL_TAG {
                cells.push(id);
            }
            stack.extend(el.children.iter().rev().copied());
        }
        let ids: Vec<(String, NodeId)> = cells
            .iter()
            .filter_map(|&node| {
                Cell { doc: self, node }
                    .id()
                    .map(|id| (id.to_string(), node))
            })
            .collect();
        for (id, node) in ids {
            self.cell_index.entry(id).or_insert(node);
        }
        self.cells = cells;
    }

    fn find_descendant(&self, roots: &[NodeId], name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(el) = self.element(id) {
                if el.name == name {
                    return Some(id);
                }
                stack.extend(el.children.iter().rev().copied());
            }
        }
        None
    }

    fn child_element(&self, el: &Element, name: &str) -> Option<NodeId> {
        el.children
            .iter()
            .copied()
            .find(|&child| self.element(child).is_some_and(|c| c.name == name))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0) {
            Some(XmlNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0) {
            Some(XmlNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        self.cells.iter().map(|&node| Cell { doc: self, node })
    }

    pub fn cell(&self, id: &str) -> Option<Cell<'_>> {
        self.cell_index
            .get(id)
            .map(|&node| Cell { doc: self, node })
    }

    pub fn contains_cell(&self, id: &str) -> bool {
        self.cell_index.contains_key(id)
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = &str> {
        self.cell_index.keys().map(String::as_str)
    }

    /// Writes one attribute of a cell's `mxGeometry`. Returns `false` when the
    /// cell or its geometry does not exist.
    pub fn set_geometry_attr(&mut self, cell_id: &str, key: &str, value: String) -> bool {
        let Some(geometry) = self.cell(cell_id).and_then(|cell| cell.geometry_node()) else {
            return false;
        };
        match self.element_mut(geometry) {
            Some(el) => {
                el.set_attr(key, value);
                true
            }
            None => false,
        }
    }

    /// Parent used for new cells: the first layer, i.e. the first cell whose
    /// parent is a cell without a parent.
    pub fn default_parent(&self) -> Option<String> {
        let root_ids: Vec<&str> = self
            .cells()
            .filter(|cell| cell.attr("parent").is_none())
            .filter_map(|cell| cell.id())
            .collect();
        self.cells()
            .find(|cell| {
                cell.attr("parent")
                    .is_some_and(|parent| root_ids.contains(&parent))
            })
            .and_then(|cell| cell.id())
            .map(str::to_string)
    }

    /// Appends an `mxCell` with an `mxGeometry` child to the first page.
    pub fn append_cell(
        &mut self,
        attributes: Vec<(String, String)>,
        geometry: Vec<(String, String)>,
    ) -> Result<NodeId, DocumentError> {
        let root = self.cell_root.ok_or(DocumentError::MissingCellRoot)?;
        let id = attributes
            .iter()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.clone());

        let cell = self.push(XmlNode::Element(Element::new(CELL_TAG, attributes, Some(root))));
        let geom = self.push(XmlNode::Element(Element::new(
            GEOMETRY_TAG,
            geometry,
            Some(cell),
        )));
        if let Some(el) = self.element_mut(cell) {
            el.children.push(geom);
        }
        if let Some(el) = self.element_mut(root) {
            el.children.push(cell);
        }
        self.cells.push(cell);
        if let Some(id) = id {
            self.cell_index.entry(id).or_insert(cell);
        }
        Ok(cell)
    }

    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            writer.write_event(Event::Text(BytesText::new("\n")))?;
        }
        for &id in &self.top {
            self.write_node(&mut writer, id)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), DocumentError> {
        match &self.nodes[id.0] {
            XmlNode::Element(el) => {
                let mut start = BytesStart::new(el.name.as_str());
                for (key, value) in &el.attributes {
                    start.push_attribute(Attribute {
                        key: QName(key.as_bytes()),
                        value: escape_attribute(value).into_bytes().into(),
                    });
                }
                if el.children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for &child in &el.children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
                }
            }
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
        }
        Ok(())
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>, uri: Option<&str>, local: &str) -> String {
    match uri.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

// roxmltree reports every namespace in scope and drops `xmlns` attributes, so
// the ones declared on this element are those its parent does not have.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    node.namespaces()
        .filter(|ns| ns.uri() != roxmltree::NS_XML_URI)
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| {
            let key = match ns.name() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            (key, ns.uri().to_string())
        })
        .collect()
}

// Attribute-value normalisation would fold raw whitespace into spaces.
fn escape_attribute(value: &str) -> String {
    quick_xml::escape::escape(value)
        .replace('\n', "&#xa;")
        .replace('\r', "&#xd;")
        .replace('\t', "&#x9;")
}

/// Read-only view of one `mxCell`, resolving `UserObject` wrappers.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    doc: &'a Document,
    node: NodeId,
}

impl<'a> Cell<'a> {
    fn element(&self) -> &'a Element {
        match &self.doc.nodes[self.node.0] {
            XmlNode::Element(el) => el,
            _ => unreachable!("cells are always element nodes"),
        }
    }

    fn wrapper(&self) -> Option<&'a Element> {
        let parent = self.element().parent?;
        self.doc
            .element(parent)
            .filter(|el| WRAPPER_TAGS.contains(&el.name.as_str()))
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn id(&self) -> Option<&'a str> {
        self.element()
            .attr("id")
            .or_else(|| self.wrapper().and_then(|w| w.attr("id")))
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element().attr(name)
    }

    pub fn label(&self) -> Option<&'a str> {
        self.element()
            .attr("value")
            .or_else(|| self.wrapper().and_then(|w| w.attr("label")))
    }

    pub fn is_edge(&self) -> bool {
        self.attr("edge") == Some("1")
    }

    fn geometry_node(&self) -> Option<NodeId> {
        self.doc.child_element(self.element(), GEOMETRY_TAG)
    }

    pub fn geometry(&self) -> Option<&'a Element> {
        self.geometry_node().and_then(|id| self.doc.element(id))
    }
}
