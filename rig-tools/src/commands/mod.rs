//! Command implementations for rigs and animations

pub mod anim;
pub mod rig;
