//! Message shaped trajectory and plan records, as they are stored in the library

use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use crate::kinematic_traits::Joints;

/// Time stamp as seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: u32,
    pub nsec: u32,
}

impl Stamp {
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Stamp {
                sec: elapsed.as_secs() as u32,
                nsec: elapsed.subsec_nanos(),
            },
            Err(_) => Stamp::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub seq: u32,
    pub stamp: Stamp,
    pub frame_id: String,
}

impl Header {
    pub fn new(frame_id: &str) -> Self {
        Header {
            seq: 0,
            stamp: Stamp::now(),
            frame_id: frame_id.to_string(),
        }
    }
}

/// One timestamped configuration of the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub positions: Joints,

    /// Elapsed time since the start of the trajectory, seconds.
    pub time_from_start: f64,
}

impl Waypoint {
    pub fn new(positions: Joints) -> Self {
        Waypoint {
            positions,
            time_from_start: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectory {
    pub header: Header,
    pub joint_names: Vec<String>,
    pub points: Vec<Waypoint>,
}

impl JointTrajectory {
    /// Trajectory through the given configurations, not yet timed.
    pub fn from_path(header: Header, joint_names: Vec<String>, path: &[Joints]) -> Self {
        JointTrajectory {
            header,
            joint_names,
            points: path.iter().map(|q| Waypoint::new(*q)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Joints> {
        self.points.first().map(|p| &p.positions)
    }

    pub fn last(&self) -> Option<&Joints> {
        self.points.last().map(|p| &p.positions)
    }

    /// Total duration, the time of the last waypoint.
    pub fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.time_from_start)
    }

    /// Scales every inter-waypoint duration by the factor (> 1 slows down).
    pub fn time_warp(&mut self, factor: f64) {
        for point in &mut self.points {
            point.time_from_start *= factor;
        }
    }

    /// Drops the waypoints strictly between `i` and `j` and resets all timing.
    /// The trajectory must be parameterized again after this call.
    pub fn remove_between(&mut self, i: usize, j: usize) {
        if j > i + 1 && j <= self.points.len() {
            self.points.drain(i + 1..j);
        }
        for point in &mut self.points {
            point.time_from_start = 0.0;
        }
    }
}

/// Named joint positions of the robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub header: Header,
    pub name: Vec<String>,
    pub position: Vec<f64>,
}

impl JointState {
    pub fn new(header: Header, joint_names: &[String], joints: &Joints) -> Self {
        JointState {
            header,
            name: joint_names.to_vec(),
            position: joints.to_vec(),
        }
    }

    /// Positions as the joint array of the group. Missing values read as zero.
    pub fn joints(&self) -> Joints {
        std::array::from_fn(|i| self.position.get(i).copied().unwrap_or(0.0))
    }
}

/// A planned movement between two targets of the library, tagged with the indices of
/// the pick and place targets it connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPlan {
    pub trajectory: JointTrajectory,
    pub start_state: JointState,
    pub end_state: JointState,
    pub pick_index: u32,
    pub place_index: u32,
}

impl MotionPlan {
    pub fn duration(&self) -> f64 {
        self.trajectory.duration()
    }

    pub fn waypoint_count(&self) -> usize {
        self.trajectory.len()
    }
}

/// Direction of the plans in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// From the place target to the pick target.
    Pick,
    /// From the pick target back to the place target.
    Place,
}

/// All plans of one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanGroup {
    pub leg: Leg,
    pub plans: Vec<MotionPlan>,
}

impl PlanGroup {
    pub fn new(leg: Leg) -> Self {
        PlanGroup {
            leg,
            plans: Vec::new(),
        }
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    pub fn push(&mut self, plan: MotionPlan) {
        self.plans.push(plan);
    }

    /// First plan with the given tags. Linear scan, no ordering assumed.
    pub fn find(&self, pick_index: u32, place_index: u32) -> Option<&MotionPlan> {
        self.plans
            .iter()
            .find(|plan| plan.pick_index == pick_index && plan.place_index == place_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(times: &[f64]) -> JointTrajectory {
        let mut trajectory = JointTrajectory::default();
        for (i, t) in times.iter().enumerate() {
            trajectory.points.push(Waypoint {
                positions: [i as f64; 6],
                time_from_start: *t,
            });
        }
        trajectory
    }

    #[test]
    fn test_durations() {
        let mut trajectory = timed(&[0.0, 1.0, 3.0]);
        assert_eq!(trajectory.duration(), 3.0);
        trajectory.time_warp(3.0);
        assert_eq!(trajectory.duration(), 9.0);
        assert_eq!(trajectory.points[1].time_from_start, 3.0);
        assert_eq!(JointTrajectory::default().duration(), 0.0);
    }

    #[test]
    fn test_remove_between_resets_times() {
        let mut trajectory = timed(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        trajectory.remove_between(1, 4);
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.points[2].positions, [4.0; 6]);
        assert!(trajectory.points.iter().all(|p| p.time_from_start == 0.0));
    }

    #[test]
    fn test_find_first_match() {
        let plan = |pick, place, duration| MotionPlan {
            trajectory: timed(&[0.0, duration]),
            start_state: JointState::default(),
            end_state: JointState::default(),
            pick_index: pick,
            place_index: place,
        };
        let mut group = PlanGroup::new(Leg::Pick);
        group.push(plan(0, 1, 1.0));
        group.push(plan(1, 1, 2.0));
        group.push(plan(1, 1, 3.0));
        assert_eq!(group.plan_count(), 3);
        assert_eq!(group.find(1, 1).map(|p| p.duration()), Some(2.0));
        assert!(group.find(2, 0).is_none());
    }
}
