//! Rig description command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use rig_pose::{Mesh, RigDescription, Skeleton};
use std::path::{Path, PathBuf};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_vec3, property_table,
    render_tree,
};

#[derive(Subcommand)]
pub enum RigCommands {
    /// Display information about a rig description
    Info {
        /// Path to the rig JSON file
        file: PathBuf,

        /// Show per-joint details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the joint hierarchy as a tree
    Tree {
        /// Path to the rig JSON file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show bone metadata on the joint's line
        #[arg(long)]
        compact: bool,
    },
}

pub fn execute(cmd: RigCommands) -> Result<()> {
    match cmd {
        RigCommands::Info { file, detailed } => handle_info(&file, detailed),
        RigCommands::Tree {
            file,
            depth,
            no_color,
            compact,
        } => handle_tree(&file, depth, no_color, compact),
    }
}

/// Read a rig description and build its mesh
pub fn load_mesh(path: &Path) -> Result<Mesh> {
    let rig = RigDescription::from_path(path)
        .with_context(|| format!("Failed to read rig: {}", path.display()))?;
    Mesh::load(&rig).with_context(|| format!("Failed to build rig: {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    println!("Loading rig: {}", path.display());
    let mesh = load_mesh(path)?;
    let skeleton = mesh.skeleton();
    let bounds = mesh.bounds();

    println!("\n=== Rig Information ===");
    property_table(vec![
        ("Vertices", mesh.vertices().len().to_string()),
        ("Faces", mesh.faces().len().to_string()),
        ("Materials", mesh.materials().len().to_string()),
        ("Joints", skeleton.joint_count().to_string()),
        ("Bones", skeleton.bone_count().to_string()),
        ("Bounds min", format_vec3(bounds.min)),
        ("Bounds max", format_vec3(bounds.max)),
        ("Center", format_vec3(mesh.center())),
    ])
    .printstd();

    if detailed {
        println!("\n=== Joints ===");
        let mut table = create_table(&["Joint", "Parent", "Position", "Children", "Bone length"]);
        for joint in skeleton.joints() {
            let parent = joint
                .parent()
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            let children = joint
                .children()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let length = skeleton
                .bone(joint.index())
                .map_or_else(|_| "-".to_string(), |bone| format!("{:.3}", bone.length()));
            add_table_row(
                &mut table,
                vec![
                    joint.index().to_string(),
                    parent,
                    format_vec3(joint.init_position()),
                    children,
                    length,
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn handle_tree(path: &Path, depth: Option<usize>, no_color: bool, compact: bool) -> Result<()> {
    let mesh = load_mesh(path)?;
    let skeleton = mesh.skeleton();

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: true,
        compact,
    };

    for joint in skeleton.joints().iter().filter(|j| j.is_root()) {
        println!("{}", render_tree(&joint_node(skeleton, joint.index()), &options));
    }
    Ok(())
}

/// Build the display tree below `joint`
///
/// Children are collected with an explicit stack and attached bottom-up.
fn joint_node(skeleton: &Skeleton, joint: usize) -> TreeNode {
    let mut order = Vec::new();
    let mut stack = vec![joint];
    while let Some(current) = stack.pop() {
        order.push(current);
        stack.extend(skeleton.joints()[current].children().iter().copied());
    }

    let mut built: Vec<Option<TreeNode>> = vec![None; skeleton.joint_count()];
    for &current in order.iter().rev() {
        let node = &skeleton.joints()[current];
        let node_type = if node.is_root() {
            NodeType::Root
        } else if node.children().is_empty() {
            NodeType::Leaf
        } else {
            NodeType::Joint
        };

        let mut tree = TreeNode::new(format!("joint {current}"), node_type)
            .with_metadata("position", &format_vec3(node.init_position()));
        if let Ok(bone) = skeleton.bone(current) {
            tree = tree.with_metadata("length", &format!("{:.3}", bone.length()));
        }
        for &child in node.children() {
            if let Some(child_node) = built[child].take() {
                tree = tree.add_child(child_node);
            }
        }
        built[current] = Some(tree);
    }

    built[joint]
        .take()
        .unwrap_or_else(|| TreeNode::new(format!("joint {joint}"), NodeType::Root))
}
