//! Tree rendering for joint hierarchies

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Key/value pairs, rendered in insertion order
    pub metadata: Vec<(String, String)>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Joint,
    Leaf,
}

/// Options for tree rendering
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
    /// Put metadata on the node's line instead of below it
    pub compact: bool,
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: String, node_type: NodeType) -> Self {
        Self {
            name,
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }
}

impl NodeType {
    /// Get icon for node type
    pub fn icon(self) -> &'static str {
        match self {
            Self::Root => "◉",
            Self::Joint => "●",
            Self::Leaf => "○",
        }
    }

    /// Get color style for node type
    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                Self::Root => Style::new().bold().cyan(),
                Self::Joint => Style::new().green(),
                Self::Leaf => Style::new().yellow(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    );

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        line.push_str(&format!(" [{}]", parts.join(", ")));
    }

    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    if options.show_metadata && !options.compact {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}    {}: {}\n",
                child_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &child_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::new("joint 0".to_string(), NodeType::Root)
            .add_child(
                TreeNode::new("joint 1".to_string(), NodeType::Joint)
                    .add_child(TreeNode::new("joint 2".to_string(), NodeType::Leaf)),
            )
            .add_child(
                TreeNode::new("joint 3".to_string(), NodeType::Leaf).with_metadata("length", "1.0"),
            )
    }

    #[test]
    fn test_render_plain() {
        let options = TreeOptions {
            no_color: true,
            ..Default::default()
        };
        let rendered = render_tree(&sample_tree(), &options);
        assert_eq!(
            rendered,
            "◉ joint 0\n├── ● joint 1\n│   └── ○ joint 2\n└── ○ joint 3\n"
        );
    }

    #[test]
    fn test_render_depth_limit() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            ..Default::default()
        };
        let rendered = render_tree(&sample_tree(), &options);
        assert!(!rendered.contains("joint 2"));
        assert!(rendered.contains("joint 3"));
    }

    #[test]
    fn test_render_compact_metadata() {
        let options = TreeOptions {
            no_color: true,
            show_metadata: true,
            compact: true,
            ..Default::default()
        };
        let rendered = render_tree(&sample_tree(), &options);
        assert!(rendered.contains("○ joint 3 [length:1.0]"));
    }
}
