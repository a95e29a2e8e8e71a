//! Verbatim copies of XML the reader does not interpret.
//!
//! Each point, route or track owns at most one [`PreservedXml`]: an arena of
//! element nodes plus the ordered list of top-level nodes. Nodes refer to
//! each other by [`NodeId`]; the parent index is only used while the tree
//! is being built.

/// Index of a node inside its owning [`PreservedXml`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Qualified tag name, prefix included.
    pub name: String,
    /// Attributes in document order, namespace declarations included.
    pub attributes: Vec<(String, String)>,
    /// Trimmed character data before the first child.
    pub text: String,
    /// Trimmed character data following this node inside its parent.
    pub tail: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreservedXml {
    nodes: Vec<XmlNode>,
    roots: Vec<NodeId>,
}

impl PreservedXml {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.nodes[id.0]
    }

    /// Append a new element as the last child of `parent`, or as the last
    /// top-level node when `parent` is `None`.
    pub fn append(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(XmlNode {
            name: name.into(),
            attributes,
            parent,
            ..XmlNode::default()
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Record character data seen directly inside `id`: it is the node's own
    /// text until the first child exists, afterwards the tail of the last
    /// child.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let target = self.nodes[id.0].children.last().copied().unwrap_or(id);
        let node = &mut self.nodes[target.0];
        if target == id {
            node.text = text.to_string();
        } else {
            node.tail = text.to_string();
        }
    }

    /// Depth-first walk in document order.
    pub fn walk(&self) -> impl Iterator<Item = &XmlNode> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = &self.nodes[id.0];
            stack.extend(node.children.iter().rev().copied());
            Some(node)
        })
    }

    /// First node with the given tag name, in document order.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        self.walk().find(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_roots_and_children_keep_order() {
        let mut tree = PreservedXml::default();
        assert!(tree.is_empty());
        let a = tree.append(None, "a", Vec::new());
        let b = tree.append(Some(a), "b", attrs(&[("x", "1")]));
        let c = tree.append(Some(a), "c", Vec::new());
        let d = tree.append(None, "d", Vec::new());

        assert_eq!(tree.roots(), &[a, d]);
        assert_eq!(tree.node(a).children, vec![b, c]);
        assert_eq!(tree.node(c).parent, Some(a));
        assert_eq!(tree.node(d).parent, None);
        assert_eq!(tree.node(b).attributes, attrs(&[("x", "1")]));
    }

    #[test]
    fn test_text_then_tail() {
        let mut tree = PreservedXml::default();
        let a = tree.append(None, "a", Vec::new());
        tree.set_text(a, "lead");
        let b = tree.append(Some(a), "b", Vec::new());
        tree.set_text(b, "inner");
        tree.set_text(a, "tail");

        assert_eq!(tree.node(a).text, "lead");
        assert_eq!(tree.node(b).text, "inner");
        assert_eq!(tree.node(b).tail, "tail");
    }

    #[test]
    fn test_walk_is_document_order() {
        let mut tree = PreservedXml::default();
        let a = tree.append(None, "a", Vec::new());
        let b = tree.append(Some(a), "b", Vec::new());
        tree.append(Some(b), "c", Vec::new());
        tree.append(Some(a), "d", Vec::new());
        tree.append(None, "e", Vec::new());

        let names: Vec<&str> = tree.walk().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(tree.find("d").map(|n| n.children.len()), Some(0));
        assert!(tree.find("z").is_none());
    }
}
