//! Forward kinematics of the OPW arm

use nalgebra::{Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use crate::kinematic_traits::{Joints, Kinematics, LinkPoints, Pose};
use crate::parameters::Parameters;

#[derive(Debug, Clone, Copy)]
pub struct OpwKinematics {
    parameters: Parameters,
}

/// Intermediate values shared by the tool pose and the link point computations.
struct Chain {
    q: [f64; 6],
    /// J1 rotation sine and cosine
    s1: f64,
    c1: f64,
    /// Wrist center
    wrist: Vector3<f64>,
}

impl OpwKinematics {
    pub fn new(parameters: Parameters) -> Self {
        OpwKinematics { parameters }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn chain(&self, joints: &Joints) -> Chain {
        let p = &self.parameters;
        let q: [f64; 6] =
            std::array::from_fn(|i| joints[i] * p.sign_corrections[i] as f64 - p.offsets[i]);

        let psi3 = f64::atan2(p.a2, p.c3);
        let k = f64::sqrt(p.a2 * p.a2 + p.c3 * p.c3);

        let cx1 = p.c2 * f64::sin(q[1]) + k * f64::sin(q[1] + q[2] + psi3) + p.a1;
        let cy1 = p.b;
        let cz1 = p.c2 * f64::cos(q[1]) + k * f64::cos(q[1] + q[2] + psi3);

        let (s1, c1) = q[0].sin_cos();
        let wrist = Vector3::new(cx1 * c1 - cy1 * s1, cx1 * s1 + cy1 * c1, cz1 + p.c1);
        Chain { q, s1, c1, wrist }
    }

    /// Rotate the point given in the arm plane (x forward, y lateral) around J1.
    fn around_j1(chain: &Chain, x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x * chain.c1 - y * chain.s1, x * chain.s1 + y * chain.c1, z)
    }

    fn wrist_rotation(chain: &Chain) -> Matrix3<f64> {
        let q = &chain.q;
        let (s2, c2) = q[1].sin_cos();
        let (s3, c3) = q[2].sin_cos();
        let (s4, c4) = q[3].sin_cos();
        let (s5, c5) = q[4].sin_cos();
        let (s6, c6) = q[5].sin_cos();
        let (s1, c1) = (chain.s1, chain.c1);

        let r_0c = Matrix3::new(
            c1 * c2 * c3 - c1 * s2 * s3, -s1, c1 * c2 * s3 + c1 * s2 * c3,
            s1 * c2 * c3 - s1 * s2 * s3, c1, s1 * c2 * s3 + s1 * s2 * c3,
            -s2 * c3 - c2 * s3, 0.0, -s2 * s3 + c2 * c3,
        );

        let r_ce = Matrix3::new(
            c4 * c5 * c6 - s4 * s6, -c4 * c5 * s6 - s4 * c6, c4 * s5,
            s4 * c5 * c6 + c4 * s6, -s4 * c5 * s6 + c4 * c6, s4 * s5,
            -s5 * c6, s5 * s6, c5,
        );

        r_0c * r_ce
    }
}

impl Kinematics for OpwKinematics {
    fn forward(&self, joints: &Joints) -> Pose {
        let chain = self.chain(joints);
        let r_oe = Self::wrist_rotation(&chain);
        let translation = chain.wrist + self.parameters.c4 * r_oe * Vector3::z();
        let rotation = Rotation3::from_matrix_unchecked(r_oe);

        Pose::from_parts(
            Translation3::from(translation),
            UnitQuaternion::from_rotation_matrix(&rotation),
        )
    }

    fn link_points(&self, joints: &Joints) -> LinkPoints {
        let p = &self.parameters;
        let chain = self.chain(joints);
        let tool = self.forward(joints).translation.vector;
        let q1 = chain.q[1];

        [
            Point3::origin(),
            Self::around_j1(&chain, p.a1, p.b, p.c1),
            Self::around_j1(&chain, p.a1 + p.c2 * q1.sin(), p.b, p.c1 + p.c2 * q1.cos()),
            Point3::from(chain.wrist),
            Point3::from(tool),
        ]
    }
}
