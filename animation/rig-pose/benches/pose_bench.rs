use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Quat, Vec3};
use rig_pose::{InterpolationMode, JointRecord, Keyframe, PoseCache, Skeleton, sample};
use std::hint::black_box;

/// Five chains of forty joints hanging off one root
fn create_test_skeleton() -> Skeleton {
    let mut records = vec![JointRecord::root(Vec3::ZERO)];
    for chain in 0..5 {
        let direction = Quat::from_rotation_y(chain as f32) * Vec3::new(0.2, 0.1, 0.0);
        let mut parent = 0;
        for link in 1..=40 {
            records.push(JointRecord::new(direction * link as f32, Some(parent)));
            parent = records.len() - 1;
        }
    }
    Skeleton::from_joints(&records).unwrap()
}

fn create_test_keyframes(slots: usize) -> Vec<Keyframe> {
    (0..8)
        .map(|k| {
            let rotations = (0..slots)
                .map(|i| Quat::from_rotation_z(0.01 * (i + k) as f32))
                .collect();
            Keyframe::new(rotations, Vec3::new(0.0, k as f32 * 0.1, 0.0))
        })
        .collect()
}

fn bench_commit(c: &mut Criterion) {
    let mut skeleton = create_test_skeleton();
    let mut cache = PoseCache::new();

    c.bench_function("commit_pose", |b| {
        b.iter(|| {
            skeleton.commit_pose_into(&mut cache);
            black_box(cache.len());
        })
    });
}

fn bench_rotate_root_bone(c: &mut Criterion) {
    let mut skeleton = create_test_skeleton();
    let delta = Quat::from_rotation_x(0.001);

    c.bench_function("rotate_bone_chain", |b| {
        b.iter(|| skeleton.rotate_bone(black_box(1), delta).unwrap())
    });
}

fn bench_sample(c: &mut Criterion) {
    let skeleton = create_test_skeleton();
    let keyframes = create_test_keyframes(skeleton.bone_slots());

    c.bench_function("sample_linear", |b| {
        b.iter(|| sample(InterpolationMode::Linear, &keyframes, black_box(3.4)))
    });
    c.bench_function("sample_spline", |b| {
        b.iter(|| sample(InterpolationMode::Spline, &keyframes, black_box(3.4)))
    });
}

criterion_group!(benches, bench_commit, bench_rotate_root_bone, bench_sample);
criterion_main!(benches);
