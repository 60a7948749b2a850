use serde::{Deserialize, Serialize};

/// Landmark layouts produced by the supported estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkeletonLayout {
    /// 21-point hand model.
    Hand21,
    /// 33-point full-body pose model.
    Pose33,
    /// 17-point COCO body keypoints.
    Coco17,
}

impl SkeletonLayout {
    pub fn cardinality(&self) -> usize {
        match self {
            SkeletonLayout::Hand21 => 21,
            SkeletonLayout::Pose33 => 33,
            SkeletonLayout::Coco17 => 17,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkeletonLayout::Hand21 => "hand21",
            SkeletonLayout::Pose33 => "pose33",
            SkeletonLayout::Coco17 => "coco17",
        }
    }
}

pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// (tip, pip) pairs for the four long fingers, index first.
    pub const FINGER_JOINTS: [(usize, usize); 4] = [
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
}

pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_HIP: usize = 23;
    pub const LEFT_KNEE: usize = 25;
}

pub mod coco {
    pub const NOSE: usize = 0;
    pub const LEFT_HIP: usize = 11;
    pub const LEFT_KNEE: usize = 13;
}
