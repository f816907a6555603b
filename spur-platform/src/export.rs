// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Writing trees out and reading them back.
//!
//! The JSON form nests switches and cores:
//!
//! ```json
//! {"switch": 2, "children": [{"core": 0}, {"core": 1}]}
//! ```
//!
//! The text form is meant for people:
//!
//! ```text
//! Switch 2
//! ├── Core 0
//! └── Core 1
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spur_engine::spur_error;
use spur_engine::topology::{CoreTree, Node, NodeKind, NodeRef};
use spur_engine::types::{SpurError, SpurResult};

/// Renders a tree in some format.
pub trait TreeExporter {
    /// File extension of the format.
    fn extension(&self) -> &'static str;

    fn export(&self, tree: &CoreTree) -> SpurResult<String>;

    fn write(&self, tree: &CoreTree, path: &Path) -> SpurResult {
        fs::write(path, self.export(tree)?)
            .map_err(|e| SpurError::Input(format!("unable to write {}: {e}", path.display())))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
enum JsonNode {
    Switch {
        switch: usize,
        children: Vec<JsonNode>,
    },
    Core {
        core: usize,
    },
}

impl JsonNode {
    fn num_nodes(&self) -> usize {
        match self {
            JsonNode::Core { .. } => 1,
            JsonNode::Switch { children, .. } => {
                1 + children.iter().map(JsonNode::num_nodes).sum::<usize>()
            }
        }
    }
}

fn to_json_node(tree: &CoreTree, node: NodeRef) -> SpurResult<JsonNode> {
    let Some(n) = tree.node(node) else {
        return spur_error!(MalformedTree, "node {node} does not exist");
    };
    match &n.kind {
        NodeKind::Core(core) => Ok(JsonNode::Core { core: *core }),
        NodeKind::Switch { children } => Ok(JsonNode::Switch {
            switch: node.index(),
            children: children
                .iter()
                .map(|child| to_json_node(tree, *child))
                .collect::<SpurResult<_>>()?,
        }),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTreeExporter;

impl TreeExporter for JsonTreeExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn export(&self, tree: &CoreTree) -> SpurResult<String> {
        let root = to_json_node(tree, tree.root())?;
        serde_json::to_string_pretty(&root)
            .map_err(|e| SpurError::Input(format!("unable to serialise tree: {e}")))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextTreeExporter;

impl TextTreeExporter {
    fn label(node: &Node, node_ref: NodeRef) -> String {
        match node.kind {
            NodeKind::Core(core) => format!("Core {core}"),
            NodeKind::Switch { .. } => format!("Switch {node_ref}"),
        }
    }

    fn write_children(tree: &CoreTree, node: &Node, prefix: &str, out: &mut String) {
        let children = node.children();
        for (i, child_ref) in children.iter().enumerate() {
            let Some(child) = tree.node(*child_ref) else {
                continue;
            };
            let last = i + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&Self::label(child, *child_ref));
            out.push('\n');

            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            Self::write_children(tree, child, &child_prefix, out);
        }
    }
}

impl TreeExporter for TextTreeExporter {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn export(&self, tree: &CoreTree) -> SpurResult<String> {
        let Some(root) = tree.node(tree.root()) else {
            return spur_error!(MalformedTree, "root {} does not exist", tree.root());
        };
        let mut out = Self::label(root, tree.root());
        out.push('\n');
        Self::write_children(tree, root, "", &mut out);
        Ok(out)
    }
}

fn place(
    json: &JsonNode,
    parent: Option<NodeRef>,
    slots: &mut Vec<Option<Node>>,
) -> SpurResult<NodeRef> {
    let (index, kind) = match json {
        JsonNode::Core { core } => (*core, NodeKind::Core(*core)),
        JsonNode::Switch { switch, children } => {
            let this = NodeRef(*switch);
            let child_refs = children
                .iter()
                .map(|child| place(child, Some(this), slots))
                .collect::<SpurResult<Vec<_>>>()?;
            (*switch, NodeKind::Switch { children: child_refs })
        }
    };

    // Ids index the arena, so every id must be below the node count.
    let num_nodes = slots.len();
    let Some(slot) = slots.get_mut(index) else {
        return spur_error!(
            MalformedTree,
            "node {index} is out of range for a tree of {num_nodes} nodes"
        );
    };
    if slot.is_some() {
        return spur_error!(MalformedTree, "node {index} appears more than once");
    }
    *slot = Some(Node { kind, parent });
    Ok(NodeRef(index))
}

/// Rebuild a tree from its JSON form. The result is fully validated.
pub fn import_tree(text: &str) -> SpurResult<CoreTree> {
    let root: JsonNode = serde_json::from_str(text)
        .map_err(|e| SpurError::Input(format!("invalid tree: {e}")))?;

    let mut slots = vec![None; root.num_nodes()];
    place(&root, None, &mut slots)?;

    let nodes = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            Some(node) => Ok(node),
            None => spur_error!(MalformedTree, "node {index} is missing"),
        })
        .collect::<SpurResult<Vec<_>>>()?;
    CoreTree::from_nodes(nodes)
}

pub fn load_tree(path: &Path) -> SpurResult<CoreTree> {
    let text = fs::read_to_string(path)
        .map_err(|e| SpurError::Input(format!("unable to read {}: {e}", path.display())))?;
    import_tree(&text)
}

#[cfg(test)]
mod tests {
    use spur_engine::builder::{BinaryTreeBuilder, GroupedTreeBuilder, TreeBuilder};

    use super::*;

    #[test]
    fn json_form() {
        let tree = BinaryTreeBuilder.build(2).unwrap();
        let json = JsonTreeExporter.export(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"switch": 2, "children": [{"core": 0}, {"core": 1}]})
        );
    }

    #[test]
    fn json_import_restores_tree() {
        for tree in [
            BinaryTreeBuilder.build(5).unwrap(),
            GroupedTreeBuilder::default().build(10).unwrap(),
            BinaryTreeBuilder.build(1).unwrap(),
        ] {
            let json = JsonTreeExporter.export(&tree).unwrap();
            assert_eq!(import_tree(&json).unwrap(), tree);
        }
    }

    #[test]
    fn text_form() {
        let tree = BinaryTreeBuilder.build(3).unwrap();
        assert_eq!(
            TextTreeExporter.export(&tree).unwrap(),
            "Switch 4\n\
             ├── Switch 3\n\
             │   ├── Core 0\n\
             │   └── Core 1\n\
             └── Core 2\n"
        );
    }

    #[test]
    fn import_rejects_bad_trees() {
        let cases = [
            // Core 1 missing.
            r#"{"switch": 2, "children": [{"core": 0}]}"#,
            // Core listed twice.
            r#"{"switch": 2, "children": [{"core": 0}, {"core": 0}]}"#,
            // Switch inside the core range.
            r#"{"switch": 0, "children": [{"core": 1}]}"#,
        ];
        for case in cases {
            assert!(
                matches!(import_tree(case), Err(SpurError::MalformedTree(_))),
                "{case} accepted"
            );
        }
        assert!(matches!(import_tree("{\"leaf\": 1}"), Err(SpurError::Input(_))));
    }

    #[test]
    fn import_rejects_ids_beyond_node_count() {
        let cases = [
            format!(r#"{{"switch": {}, "children": [{{"core": 0}}]}}"#, usize::MAX),
            r#"{"switch": 1000000000000, "children": [{"core": 0}]}"#.to_string(),
            r#"{"switch": 2, "children": [{"core": 0}, {"core": 7}]}"#.to_string(),
        ];
        for case in &cases {
            match import_tree(case) {
                Err(SpurError::MalformedTree(msg)) => {
                    assert!(msg.contains("out of range"), "{msg}");
                }
                other => panic!("{case} gave {other:?}"),
            }
        }
    }

    #[test]
    fn write_files() {
        let dir = tempfile::tempdir().unwrap();
        let tree = GroupedTreeBuilder::default().build(6).unwrap();
        for exporter in [
            &JsonTreeExporter as &dyn TreeExporter,
            &TextTreeExporter as &dyn TreeExporter,
        ] {
            let path = dir.path().join(format!("tree.{}", exporter.extension()));
            exporter.write(&tree, &path).unwrap();
            assert!(path.exists());
        }
        assert_eq!(load_tree(&dir.path().join("tree.json")).unwrap(), tree);
    }
}
