//! Face sides of a box primitive.

use serde::{Deserialize, Serialize};

/// The six sides of a box, named the way `.blockymodel` texture layouts name them.
///
/// Front faces +Z, right faces +X and top faces +Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSide {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl FaceSide {
    /// All six sides in order.
    pub const ALL: [FaceSide; 6] = [
        FaceSide::Front,
        FaceSide::Back,
        FaceSide::Left,
        FaceSide::Right,
        FaceSide::Top,
        FaceSide::Bottom,
    ];

    /// Get the outward normal for this side.
    pub fn normal(&self) -> [f32; 3] {
        match self {
            FaceSide::Front => [0.0, 0.0, 1.0],
            FaceSide::Back => [0.0, 0.0, -1.0],
            FaceSide::Left => [-1.0, 0.0, 0.0],
            FaceSide::Right => [1.0, 0.0, 0.0],
            FaceSide::Top => [0.0, 1.0, 0.0],
            FaceSide::Bottom => [0.0, -1.0, 0.0],
        }
    }

    /// Get the opposite side.
    pub fn opposite(&self) -> FaceSide {
        match self {
            FaceSide::Front => FaceSide::Back,
            FaceSide::Back => FaceSide::Front,
            FaceSide::Left => FaceSide::Right,
            FaceSide::Right => FaceSide::Left,
            FaceSide::Top => FaceSide::Bottom,
            FaceSide::Bottom => FaceSide::Top,
        }
    }

    /// Extent of this side on a box of the given size, as (width, height)
    /// in texture pixels.
    pub fn extent(&self, size: [f32; 3]) -> (f32, f32) {
        match self {
            FaceSide::Front | FaceSide::Back => (size[0], size[1]),
            FaceSide::Left | FaceSide::Right => (size[2], size[1]),
            FaceSide::Top | FaceSide::Bottom => (size[0], size[2]),
        }
    }

    /// Parse a quad normal such as `"+Z"` or `"-x"`.
    pub fn from_normal(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "+Z" => Some(FaceSide::Front),
            "-Z" => Some(FaceSide::Back),
            "-X" => Some(FaceSide::Left),
            "+X" => Some(FaceSide::Right),
            "+Y" => Some(FaceSide::Top),
            "-Y" => Some(FaceSide::Bottom),
            _ => None,
        }
    }
}

impl std::fmt::Display for FaceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceSide::Front => write!(f, "front"),
            FaceSide::Back => write!(f, "back"),
            FaceSide::Left => write!(f, "left"),
            FaceSide::Right => write!(f, "right"),
            FaceSide::Top => write!(f, "top"),
            FaceSide::Bottom => write!(f, "bottom"),
        }
    }
}
