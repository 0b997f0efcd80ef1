//! BlazePose landmark model (33 points) and arm joint extraction.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

pub const POSE_LANDMARK_COUNT: usize = 33;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;

/// Segments drawn by the overlay.
pub const ARM_CONNECTIONS: [(usize, usize); 5] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER),
    (LEFT_SHOULDER, LEFT_ELBOW),
    (LEFT_ELBOW, LEFT_WRIST),
    (RIGHT_SHOULDER, RIGHT_ELBOW),
    (RIGHT_ELBOW, RIGHT_WRIST),
];

/// A single estimated landmark, coordinates normalized to the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    #[default]
    Left,
    Right,
}

impl Arm {
    /// Indices of (shoulder, elbow, wrist) for this side.
    pub const fn indices(self) -> [usize; 3] {
        match self {
            Arm::Left => [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST],
            Arm::Right => [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmJoints {
    pub shoulder: Point2,
    pub elbow: Point2,
    pub wrist: Point2,
}

/// Picks the three arm joints out of a landmark set.
///
/// Returns `None` when the set is too short or any of the three joints is
/// less visible than `min_visibility`; the caller treats that the same as
/// a frame without a detection.
pub fn extract_arm(landmarks: &[Landmark], arm: Arm, min_visibility: f32) -> Option<ArmJoints> {
    let [shoulder, elbow, wrist] = arm.indices();
    let pick = |idx: usize| {
        landmarks
            .get(idx)
            .filter(|lm| lm.visibility >= min_visibility)
            .map(Landmark::point)
    };

    Some(ArmJoints {
        shoulder: pick(shoulder)?,
        elbow: pick(elbow)?,
        wrist: pick(wrist)?,
    })
}
