//! Keyframe animation command implementations

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use glam::{Quat, Vec3};
use rig_pose::animation_file::save_keyframes;
use rig_pose::{AnimationOptions, InterpolationMode, Keyframe, Mesh};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::commands::rig::load_mesh;
use crate::utils::{
    add_table_row, create_table, format_rotation, format_seconds, format_vec3, property_table,
};

#[derive(Subcommand)]
pub enum AnimCommands {
    /// Display information about an animation file
    Info {
        /// Path to the rig JSON file
        rig: PathBuf,

        /// Path to the animation JSON file
        animation: PathBuf,

        /// Playback rate in keyframes per second
        #[arg(short, long, default_value = "1.0")]
        rate: f32,

        /// Show every keyframe
        #[arg(short, long)]
        detailed: bool,
    },

    /// Evaluate the pose at a point in time
    Sample {
        /// Path to the rig JSON file
        rig: PathBuf,

        /// Path to the animation JSON file
        animation: PathBuf,

        /// Playback time in seconds
        #[arg(short, long)]
        time: f32,

        /// Use spline instead of linear interpolation
        #[arg(short, long)]
        spline: bool,

        /// Playback rate in keyframes per second
        #[arg(short, long, default_value = "1.0")]
        rate: f32,

        /// Print the pose as JSON
        #[arg(long)]
        json: bool,

        /// Also print skinned vertex positions
        #[arg(long)]
        vertices: bool,
    },

    /// Build an animation from pose edits, one keyframe per --keyframe
    Create {
        /// Path to the rig JSON file
        rig: PathBuf,

        /// Output animation JSON file
        output: PathBuf,

        /// Pose edits applied to the bind pose, e.g. "1:z:90 2:x:-30 root:0,0.5,0"
        #[arg(short, long = "keyframe", required = true)]
        keyframes: Vec<String>,
    },
}

pub fn execute(cmd: AnimCommands) -> Result<()> {
    match cmd {
        AnimCommands::Info {
            rig,
            animation,
            rate,
            detailed,
        } => handle_info(&rig, &animation, rate, detailed),
        AnimCommands::Sample {
            rig,
            animation,
            time,
            spline,
            rate,
            json,
            vertices,
        } => {
            let interpolation = if spline {
                InterpolationMode::Spline
            } else {
                InterpolationMode::Linear
            };
            let options = AnimationOptions::default()
                .with_interpolation(interpolation)
                .with_keyframes_per_second(rate);
            handle_sample(&rig, &animation, time, options, json, vertices)
        }
        AnimCommands::Create {
            rig,
            output,
            keyframes,
        } => handle_create(&rig, &output, &keyframes),
    }
}

fn load_animated(rig: &Path, animation: &Path, options: AnimationOptions) -> Result<Mesh> {
    let mut mesh = load_mesh(rig)?;
    mesh.set_options(options);
    mesh.load_animation_from(animation)
        .with_context(|| format!("Failed to load animation: {}", animation.display()))?;
    Ok(mesh)
}

fn handle_info(rig: &Path, animation: &Path, rate: f32, detailed: bool) -> Result<()> {
    println!("Loading animation: {}", animation.display());
    let options = AnimationOptions::default().with_keyframes_per_second(rate);
    let mesh = load_animated(rig, animation, options)?;

    println!("\n=== Animation Information ===");
    property_table(vec![
        ("Keyframes", mesh.keyframes().len().to_string()),
        ("Bone slots", mesh.bone_slots().to_string()),
        (
            "Rate",
            format!("{} keyframes/s", mesh.options().keyframes_per_second),
        ),
        ("Duration", format_seconds(mesh.duration())),
    ])
    .printstd();

    if detailed {
        println!("\n=== Keyframes ===");
        let mut table =
            create_table(&["Keyframe", "Root offset", "Posed bones", "Largest rotation"]);
        for (index, keyframe) in mesh.keyframes().iter().enumerate() {
            let posed = keyframe
                .rotations
                .iter()
                .filter(|q| !q.abs_diff_eq(Quat::IDENTITY, 1e-6))
                .count();
            let largest = keyframe
                .rotations
                .iter()
                .copied()
                .max_by(|a, b| rotation_angle(*a).total_cmp(&rotation_angle(*b)))
                .unwrap_or(Quat::IDENTITY);
            add_table_row(
                &mut table,
                vec![
                    index.to_string(),
                    format_vec3(keyframe.root),
                    posed.to_string(),
                    format_rotation(largest),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn rotation_angle(q: Quat) -> f32 {
    q.normalize().to_axis_angle().1
}

#[derive(Serialize)]
struct SampledPose {
    time: f32,
    interpolation: InterpolationMode,
    translations: Vec<[f32; 3]>,
    rotations: Vec<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vertices: Option<Vec<[f32; 3]>>,
}

fn handle_sample(
    rig: &Path,
    animation: &Path,
    time: f32,
    options: AnimationOptions,
    json: bool,
    vertices: bool,
) -> Result<()> {
    let mut mesh = load_animated(rig, animation, options)?;
    if mesh.keyframes().is_empty() {
        bail!("Animation has no keyframes: {}", animation.display());
    }
    if !mesh.update_animation(Some(time))? {
        bail!(
            "Time {} is outside the animation (0 to {})",
            format_seconds(time),
            format_seconds(mesh.duration())
        );
    }

    let pose = mesh.current_pose();
    let skinned = vertices.then(|| mesh.skinned_vertices());

    if json {
        let sampled = SampledPose {
            time,
            interpolation: mesh.options().interpolation,
            translations: pose.translations().iter().map(|t| t.to_array()).collect(),
            rotations: pose.rotations().iter().map(|r| r.to_array()).collect(),
            vertices: skinned.map(|v| v.iter().map(|p| p.to_array()).collect()),
        };
        println!("{}", serde_json::to_string_pretty(&sampled)?);
        return Ok(());
    }

    println!(
        "Pose at {} ({} interpolation)",
        format_seconds(time),
        mesh.options().interpolation
    );
    let mut table = create_table(&["Joint", "Position", "Rotation"]);
    for (index, (translation, rotation)) in pose
        .translations()
        .iter()
        .zip(pose.rotations())
        .enumerate()
    {
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                format_vec3(*translation),
                format_rotation(*rotation),
            ],
        );
    }
    table.printstd();

    if let Some(skinned) = skinned {
        println!("\n=== Skinned vertices ===");
        let mut table = create_table(&["Vertex", "Position"]);
        for (index, position) in skinned.iter().enumerate() {
            add_table_row(&mut table, vec![index.to_string(), format_vec3(*position)]);
        }
        table.printstd();
    }

    Ok(())
}

/// One edit in a `--keyframe` argument
#[derive(Debug, Clone, Copy, PartialEq)]
enum PoseEdit {
    Rotate { bone: usize, axis: Vec3, degrees: f32 },
    Translate(Vec3),
}

fn parse_axis(axis: &str) -> Result<Vec3> {
    match axis {
        "x" | "X" => Ok(Vec3::X),
        "y" | "Y" => Ok(Vec3::Y),
        "z" | "Z" => Ok(Vec3::Z),
        _ => bail!("Unknown axis '{axis}', expected x, y or z"),
    }
}

fn parse_edit(token: &str) -> Result<PoseEdit> {
    if let Some(offset) = token.strip_prefix("root:") {
        let parts = offset
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid root offset in '{token}'"))?;
        let &[x, y, z] = parts.as_slice() else {
            bail!("Root offset needs three components: '{token}'");
        };
        return Ok(PoseEdit::Translate(Vec3::new(x, y, z)));
    }

    let mut fields = token.split(':');
    let (Some(bone), Some(axis), Some(degrees), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(anyhow!("Expected BONE:AXIS:DEGREES or root:X,Y,Z, got '{token}'"));
    };

    Ok(PoseEdit::Rotate {
        bone: bone
            .parse()
            .with_context(|| format!("Invalid bone index in '{token}'"))?,
        axis: parse_axis(axis)?,
        degrees: degrees
            .parse()
            .with_context(|| format!("Invalid angle in '{token}'"))?,
    })
}

fn parse_keyframe(edits: &str) -> Result<Vec<PoseEdit>> {
    edits.split_whitespace().map(parse_edit).collect()
}

/// Build one keyframe per argument, each posed from the bind pose
///
/// Keyframes are written straight to the file so root offsets stay measured
/// from the bind pose, which is how a freshly loaded rig plays them back.
fn handle_create(rig: &Path, output: &Path, arguments: &[String]) -> Result<()> {
    let mut mesh = load_mesh(rig)?;
    let rest = Keyframe::identity(mesh.bone_slots());
    let mut keyframes = Vec::with_capacity(arguments.len());

    for (index, argument) in arguments.iter().enumerate() {
        let edits = parse_keyframe(argument)?;
        let skeleton = mesh.skeleton_mut();
        skeleton.apply_keyframe(&rest)?;
        for edit in edits {
            match edit {
                PoseEdit::Rotate {
                    bone,
                    axis,
                    degrees,
                } => skeleton
                    .rotate_bone(bone, Quat::from_axis_angle(axis, degrees.to_radians()))
                    .with_context(|| format!("Keyframe {index}: cannot rotate bone {bone}"))?,
                PoseEdit::Translate(offset) => skeleton
                    .translate_root(offset, 0)
                    .with_context(|| format!("Keyframe {index}: cannot move the root"))?,
            }
        }
        keyframes.push(skeleton.capture_keyframe());
    }

    save_keyframes(output, &keyframes)
        .with_context(|| format!("Failed to write animation: {}", output.display()))?;
    println!("Wrote {} keyframes to {}", keyframes.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation() {
        assert_eq!(
            parse_edit("2:z:-45").unwrap(),
            PoseEdit::Rotate {
                bone: 2,
                axis: Vec3::Z,
                degrees: -45.0
            }
        );
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(
            parse_edit("root:0,0.5,1").unwrap(),
            PoseEdit::Translate(Vec3::new(0.0, 0.5, 1.0))
        );
        assert!(parse_edit("root:1,2").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_edit("1:w:10").is_err());
        assert!(parse_edit("1:x").is_err());
        assert!(parse_edit("1:x:10:4").is_err());
        assert!(parse_edit("a:x:10").is_err());
    }

    #[test]
    fn test_parse_keyframe() {
        let edits = parse_keyframe("1:x:90  root:0,1,0").unwrap();
        assert_eq!(edits.len(), 2);
        assert!(parse_keyframe("").unwrap().is_empty());
    }
}
