//! OPW geometric parameters of the arm, and a few known robots

use std::f64::consts::PI;

/// Geometry of a 6 axis arm with parallel base and spherical wrist. Only forward
/// kinematics is derived from it here (tool pose and link points for collision checks),
/// inverse kinematics is numeric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Offset along x between J1 and J2 axes.
    pub a1: f64,

    /// Offset between J3 and J4 axes, perpendicular to the forearm.
    pub a2: f64,

    /// Lateral (y) offset between J1 and J2. Usually 0.
    pub b: f64,

    /// Height of the J2 axis above the base.
    pub c1: f64,

    /// Length of the upper arm (J2 to J3).
    pub c2: f64,

    /// Length of the forearm (J3 to wrist center).
    pub c3: f64,

    /// Wrist center to the tool flange.
    pub c4: f64,

    /// Offsets applied to each joint angle to adjust the reference zero position.
    pub offsets: [f64; 6],

    /// Direction of positive rotation for each joint (`1` or `-1`).
    pub sign_corrections: [i8; 6],
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameters {
    pub fn new() -> Self {
        Parameters {
            a1: 0.0,
            a2: 0.0,
            b: 0.0,
            c1: 0.0,
            c2: 0.0,
            c3: 0.0,
            c4: 0.0,
            offsets: [0.0; 6],
            sign_corrections: [1; 6],
        }
    }

    pub fn irb2400_10() -> Self {
        Parameters {
            a1: 0.100,
            a2: -0.135,
            b: 0.000,
            c1: 0.615,
            c2: 0.705,
            c3: 0.755,
            c4: 0.085,
            offsets: [0.0, 0.0, -PI / 2.0, 0.0, 0.0, 0.0],
            ..Self::new()
        }
    }

    pub fn staubli_rx160() -> Self {
        Parameters {
            a1: 0.15,
            a2: 0.0,
            b: 0.0,
            c1: 0.55,
            c2: 0.825,
            c3: 0.625,
            c4: 0.11,
            ..Self::new()
        }
    }

    pub fn kuka_kr6_r700_sixx() -> Self {
        Parameters {
            a1: 0.025,
            a2: -0.035,
            b: 0.000,
            c1: 0.400,
            c2: 0.315,
            c3: 0.365,
            c4: 0.080,
            offsets: [0.0, -PI / 2.0, 0.0, 0.0, 0.0, 0.0],
            sign_corrections: [-1, 1, 1, -1, 1, -1],
        }
    }

    pub fn abb_1600() -> Self {
        Parameters {
            a1: 0.150,
            a2: 0.0,
            b: 0.0,
            c1: 0.4865,
            c2: 0.700,
            c3: 0.600,
            c4: 0.065,
            offsets: [0.0, 0.0, -PI / 2.0, 0.0, 0.0, 0.0],
            ..Self::new()
        }
    }

    /// Known robot by the name used in configuration files.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "irb2400_10" => Some(Self::irb2400_10()),
            "staubli_rx160" => Some(Self::staubli_rx160()),
            "kuka_kr6_r700_sixx" => Some(Self::kuka_kr6_r700_sixx()),
            "abb_1600" => Some(Self::abb_1600()),
            _ => None,
        }
    }

    /// All geometric values are finite and sign corrections are +-1.
    pub fn is_valid(&self) -> bool {
        [self.a1, self.a2, self.b, self.c1, self.c2, self.c3, self.c4]
            .iter()
            .chain(self.offsets.iter())
            .all(|v| v.is_finite())
            && self.sign_corrections.iter().all(|&s| s == 1 || s == -1)
    }
}
