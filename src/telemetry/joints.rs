//! Fixed joint layout of the simulated hexapod.
//!
//! Six legs, three segments each, enumerated leg-major:
//! `leg_1_coxa, leg_1_femur, leg_1_tibia, leg_2_coxa, ...`.

use std::fmt;
use std::sync::LazyLock;

/// Number of legs on the robot.
pub const LEG_COUNT: u8 = 6;

/// Total number of joints reported in every snapshot.
pub const JOINT_COUNT: usize = LEG_COUNT as usize * Segment::ALL.len();

/// Resting angles (degrees) reported for each segment.
pub const TIBIA_ANGLE: i32 = -45;
pub const FEMUR_ANGLE: i32 = 45;
pub const COXA_ANGLE: i32 = 0;

/// One segment of a leg, ordered from body to foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Coxa,
    Femur,
    Tibia,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Coxa, Segment::Femur, Segment::Tibia];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Coxa => "coxa",
            Segment::Femur => "femur",
            Segment::Tibia => "tibia",
        }
    }
}

/// A joint is addressed by its leg (1-based) and segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointId {
    pub leg: u8,
    pub segment: Segment,
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg_{}_{}", self.leg, self.segment.as_str())
    }
}

static JOINT_NAMES: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut names = Vec::with_capacity(JOINT_COUNT);
    names.extend(all_joints().map(|joint| joint.to_string()));
    names
});

/// Iterate every joint in wire order.
pub fn all_joints() -> impl Iterator<Item = JointId> {
    (1..=LEG_COUNT).flat_map(|leg| Segment::ALL.into_iter().map(move |segment| JointId { leg, segment }))
}

/// Wire names of all joints, built once on first use.
pub fn joint_names() -> &'static [String] {
    &JOINT_NAMES
}

/// Angle for a joint, decided by the segment named in its identifier.
pub fn joint_angle(name: &str) -> i32 {
    if name.contains("tibia") {
        TIBIA_ANGLE
    } else if name.contains("femur") {
        FEMUR_ANGLE
    } else {
        COXA_ANGLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_leg_major() {
        let names = joint_names();
        assert_eq!(names.len(), JOINT_COUNT);
        assert_eq!(names.len(), 18);
        assert_eq!(&names[..4], ["leg_1_coxa", "leg_1_femur", "leg_1_tibia", "leg_2_coxa"]);
        assert_eq!(names[17], "leg_6_tibia");
    }

    #[test]
    fn angle_follows_segment_name() {
        for name in joint_names() {
            let expected = if name.ends_with("tibia") {
                -45
            } else if name.ends_with("femur") {
                45
            } else {
                0
            };
            assert_eq!(joint_angle(name), expected, "{name}");
        }
    }
}
