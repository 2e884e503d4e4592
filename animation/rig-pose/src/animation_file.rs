//! JSON keyframe files
//!
//! An animation is a JSON array with one record per keyframe:
//!
//! ```text
//! [
//!     [
//!         [[x, y, z, w], [x, y, z, w], ...],
//!         [x, y, z]
//!     ],
//!     ...
//! ]
//! ```
//!
//! The first element lists the relative rotation of every bone slot, the
//! second is the root offset. Files are pretty-printed with a 4-space indent.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::{Quat, Vec3};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{Result, RigError};
use crate::keyframe::Keyframe;

type KeyframeRecord = (Vec<[f32; 4]>, [f32; 3]);

fn to_record(keyframe: &Keyframe) -> KeyframeRecord {
    (
        keyframe.rotations.iter().map(|q| q.to_array()).collect(),
        keyframe.root.to_array(),
    )
}

fn from_record(index: usize, (rotations, root): KeyframeRecord) -> Result<Keyframe> {
    let rotations = rotations
        .into_iter()
        .map(Quat::from_array)
        .collect::<Vec<_>>();
    let root = Vec3::from_array(root);
    if !root.is_finite() || rotations.iter().any(|q| !q.is_finite()) {
        return Err(RigError::InvalidAnimation(format!(
            "keyframe {index} has non-finite values"
        )));
    }
    Ok(Keyframe::new(rotations, root))
}

/// Write keyframes as a pretty-printed JSON array
pub fn write_keyframes<W: Write>(writer: W, keyframes: &[Keyframe]) -> Result<()> {
    let records = keyframes.iter().map(to_record).collect::<Vec<_>>();
    let mut writer = BufWriter::new(writer);
    {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        records.serialize(&mut serializer)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Read keyframes from a JSON array
///
/// Every keyframe must carry the same number of rotations.
pub fn read_keyframes<R: Read>(reader: R) -> Result<Vec<Keyframe>> {
    let records: Vec<KeyframeRecord> = serde_json::from_reader(reader)?;
    let keyframes = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| from_record(index, record))
        .collect::<Result<Vec<_>>>()?;

    if let Some(first) = keyframes.first() {
        let expected = first.bone_slots();
        for keyframe in &keyframes {
            keyframe.check_size(expected)?;
        }
    }

    log::debug!("Read {} keyframes", keyframes.len());
    Ok(keyframes)
}

/// Write keyframes to a file, replacing it
pub fn save_keyframes<P: AsRef<Path>>(path: P, keyframes: &[Keyframe]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_keyframes(file, keyframes)
}

/// Read keyframes from a file
pub fn load_keyframes<P: AsRef<Path>>(path: P) -> Result<Vec<Keyframe>> {
    let file = File::open(path.as_ref())?;
    read_keyframes(BufReader::new(file))
}
