use rand::Rng;
use crate::error::BoundsViolation;
use crate::kinematic_traits::{Joints, DOF};

/// Position bounds of the actuated group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointBounds {
    /// Lower limit, radians
    pub from: Joints,

    /// Upper limit, radians
    pub to: Joints,
}

impl JointBounds {
    /// Creates bounds, swapping the limits of a joint if they are given in reverse.
    pub fn new(from: Joints, to: Joints) -> Self {
        let mut lower = from;
        let mut upper = to;
        for i in 0..DOF {
            if lower[i] > upper[i] {
                std::mem::swap(&mut lower[i], &mut upper[i]);
            }
        }
        JointBounds {
            from: lower,
            to: upper,
        }
    }

    /// Returns the first joint outside the bounds, if any.
    pub fn check(&self, joints: &Joints) -> Option<BoundsViolation> {
        (0..DOF)
            .find(|&i| !(joints[i] >= self.from[i] && joints[i] <= self.to[i]))
            .map(|joint| BoundsViolation {
                joint,
                value: joints[joint],
                from: self.from[joint],
                to: self.to[joint],
            })
    }

    pub fn satisfies(&self, joints: &Joints) -> bool {
        self.check(joints).is_none()
    }

    pub fn clamp(&self, joints: &Joints) -> Joints {
        std::array::from_fn(|i| joints[i].clamp(self.from[i], self.to[i]))
    }

    /// Random configuration within bounds, uniformly distributed per joint.
    pub fn random_joints<R: Rng + ?Sized>(&self, rng: &mut R) -> Joints {
        std::array::from_fn(|i| {
            if self.from[i] < self.to[i] {
                rng.gen_range(self.from[i]..=self.to[i])
            } else {
                self.from[i]
            }
        })
    }
}
