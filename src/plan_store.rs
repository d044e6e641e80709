//! Binary files of the plan library and the point to point queries
//!
//! Each direction of the library is stored in its own file, `pickplan.bin` and
//! `placeplan.bin`. Two layouts are supported:
//!
//! * [`StoreFormat::Versioned`]: magic `TLIB`, format version and number of joints as
//!   a fixed 12 byte header, then the list of records encoded with bincode. Reading
//!   back gives exactly the written values.
//! * [`StoreFormat::Legacy`]: the unversioned layout of existing library files. Record
//!   count, then per record the waypoints with `time_from_start` as seconds and
//!   nanoseconds, newline terminated strings and exactly six joints everywhere.
//!
//! Within a record the order is always: trajectory (header, joint names, waypoints in the
//! versioned layout; waypoints, header, joint names in the legacy one), start state, end
//! state, pick index, place index.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;
use crate::error::LibraryError;
use crate::kinematic_traits::DOF;
use crate::trajectory::{Header, JointState, JointTrajectory, Leg, MotionPlan, PlanGroup, Stamp, Waypoint};

pub const STORE_MAGIC: [u8; 4] = *b"TLIB";
pub const STORE_VERSION: u32 = 1;

pub const PICK_FILE: &str = "pickplan.bin";
pub const PLACE_FILE: &str = "placeplan.bin";

/// Size of the versioned file header.
pub const STORE_HEADER_SIZE: usize = 12;

/// Upper limit on the length of a newline terminated string read from a legacy file.
const MAX_LINE: usize = 1 << 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFormat {
    #[default]
    Versioned,
    Legacy,
}

/// The plan library: plans from place targets to pick targets and back.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStore {
    pub pick: PlanGroup,
    pub place: PlanGroup,
}

impl Default for PlanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanStore {
    pub fn new() -> Self {
        PlanStore {
            pick: PlanGroup::new(Leg::Pick),
            place: PlanGroup::new(Leg::Place),
        }
    }

    /// Plan moving from place target `place_start` to pick target `pick_end`.
    pub fn pick_plan(&self, place_start: u32, pick_end: u32) -> Option<&MotionPlan> {
        self.pick.find(pick_end, place_start)
    }

    /// Plan moving from pick target `pick_start` to place target `place_end`.
    pub fn place_plan(&self, pick_start: u32, place_end: u32) -> Option<&MotionPlan> {
        self.place.find(pick_start, place_end)
    }

    /// Number of pick targets referenced by the plans (highest index + 1).
    pub fn pick_target_count(&self) -> u32 {
        self.pick
            .plans
            .iter()
            .chain(self.place.plans.iter())
            .map(|plan| plan.pick_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of place targets referenced by the plans (highest index + 1).
    pub fn place_target_count(&self) -> u32 {
        self.pick
            .plans
            .iter()
            .chain(self.place.plans.iter())
            .map(|plan| plan.place_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Writes both groups into the directory, creating it if needed.
    pub fn save(&self, dir: &Path, format: StoreFormat) -> Result<(), LibraryError> {
        fs::create_dir_all(dir).map_err(|e| LibraryError::io(dir, e))?;
        save_group(&self.pick, &dir.join(PICK_FILE), format)?;
        save_group(&self.place, &dir.join(PLACE_FILE), format)?;
        info!(
            "Saved {} pick and {} place plans to {}",
            self.pick.plan_count(),
            self.place.plan_count(),
            dir.display()
        );
        Ok(())
    }

    pub fn load(dir: &Path, format: StoreFormat) -> Result<Self, LibraryError> {
        let store = PlanStore {
            pick: load_group(&dir.join(PICK_FILE), Leg::Pick, format)?,
            place: load_group(&dir.join(PLACE_FILE), Leg::Place, format)?,
        };
        info!(
            "Loaded {} pick and {} place plans from {}",
            store.pick.plan_count(),
            store.place.plan_count(),
            dir.display()
        );
        Ok(store)
    }
}

pub fn save_group(group: &PlanGroup, path: &Path, format: StoreFormat) -> Result<(), LibraryError> {
    let file = File::create(path).map_err(|e| LibraryError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_group(&mut writer, group, format)?;
    writer.flush().map_err(|e| LibraryError::io(path, e))
}

pub fn load_group(path: &Path, leg: Leg, format: StoreFormat) -> Result<PlanGroup, LibraryError> {
    let file = File::open(path).map_err(|e| LibraryError::io(path, e))?;
    read_group(&mut BufReader::new(file), leg, format)
}

pub fn write_group<W: Write>(writer: &mut W, group: &PlanGroup, format: StoreFormat) -> Result<(), LibraryError> {
    let mut out = Encoder { writer };
    match format {
        StoreFormat::Versioned => {
            out.bytes(&STORE_MAGIC)?;
            out.u32(STORE_VERSION)?;
            out.u32(DOF as u32)?;
            bincode::serialize_into(&mut *out.writer, &group.plans)?;
        }
        StoreFormat::Legacy => {
            out.i32(to_i32(group.plans.len())?)?;
            for plan in &group.plans {
                write_legacy(&mut out, plan)?;
            }
        }
    }
    Ok(())
}

pub fn read_group<R: Read>(reader: &mut R, leg: Leg, format: StoreFormat) -> Result<PlanGroup, LibraryError> {
    let mut input = Decoder { reader };
    let mut group = PlanGroup::new(leg);
    match format {
        StoreFormat::Versioned => {
            let magic = input.array::<4>()?;
            if magic != STORE_MAGIC {
                return Err(LibraryError::BadMagic(magic));
            }
            let version = input.u32()?;
            if version != STORE_VERSION {
                return Err(LibraryError::UnsupportedVersion(version));
            }
            let dof = input.u32()?;
            if dof as usize != DOF {
                return Err(LibraryError::corrupt(format!("{} joints per waypoint, expected {}", dof, DOF)));
            }
            group.plans = bincode::deserialize_from(&mut *input.reader)?;
        }
        StoreFormat::Legacy => {
            let count = input.i32()?;
            if count < 0 {
                return Err(LibraryError::corrupt(format!("negative record count {}", count)));
            }
            for _ in 0..count {
                group.push(read_legacy(&mut input)?);
            }
        }
    }
    Ok(group)
}

fn write_legacy<W: Write>(out: &mut Encoder<'_, W>, plan: &MotionPlan) -> Result<(), LibraryError> {
    let trajectory = &plan.trajectory;
    out.i32(to_i32(trajectory.points.len())?)?;
    for point in &trajectory.points {
        for q in point.positions {
            out.f64(q)?;
        }
        let (sec, nsec) = split_seconds(point.time_from_start)?;
        out.i32(sec)?;
        out.i32(nsec)?;
    }
    out.legacy_header(&trajectory.header)?;
    for name in exactly_six(&trajectory.joint_names, "trajectory joint names")? {
        out.line(name)?;
    }
    for state in [&plan.start_state, &plan.end_state] {
        out.legacy_header(&state.header)?;
        let names = exactly_six(&state.name, "state joint names")?;
        let positions = exactly_six(&state.position, "state positions")?;
        for (name, q) in names.iter().zip(positions) {
            out.line(name)?;
            out.f64(*q)?;
        }
    }
    out.u32(plan.pick_index)?;
    out.u32(plan.place_index)
}

fn read_legacy<R: Read>(input: &mut Decoder<'_, R>) -> Result<MotionPlan, LibraryError> {
    let point_count = input.i32()?;
    if point_count < 0 {
        return Err(LibraryError::corrupt(format!("negative waypoint count {}", point_count)));
    }
    let mut points = Vec::with_capacity((point_count as usize).min(1024));
    for _ in 0..point_count {
        let mut positions = [0.0; DOF];
        for q in &mut positions {
            *q = input.f64()?;
        }
        let sec = input.i32()?;
        let nsec = input.i32()?;
        points.push(Waypoint {
            positions,
            time_from_start: sec as f64 + nsec as f64 * 1e-9,
        });
    }
    let header = input.legacy_header()?;
    let mut joint_names = Vec::with_capacity(DOF);
    for _ in 0..DOF {
        joint_names.push(input.line()?);
    }

    let mut states = Vec::with_capacity(2);
    for _ in 0..2 {
        let header = input.legacy_header()?;
        let mut name = Vec::with_capacity(DOF);
        let mut position = Vec::with_capacity(DOF);
        for _ in 0..DOF {
            name.push(input.line()?);
            position.push(input.f64()?);
        }
        states.push(JointState { header, name, position });
    }
    let end_state = states.pop().unwrap_or_default();
    let start_state = states.pop().unwrap_or_default();

    Ok(MotionPlan {
        trajectory: JointTrajectory {
            header,
            joint_names,
            points,
        },
        start_state,
        end_state,
        pick_index: input.u32()?,
        place_index: input.u32()?,
    })
}

/// Seconds as whole seconds and nanoseconds, the nanoseconds always in [0, 1e9).
fn split_seconds(time: f64) -> Result<(i32, i32), LibraryError> {
    if !time.is_finite() || time.abs() >= i32::MAX as f64 {
        return Err(LibraryError::corrupt(format!("time {} cannot be stored", time)));
    }
    let mut sec = time.floor();
    let mut nsec = ((time - sec) * 1e9).round();
    if nsec >= 1e9 {
        sec += 1.0;
        nsec -= 1e9;
    }
    Ok((sec as i32, nsec as i32))
}

fn to_i32(count: usize) -> Result<i32, LibraryError> {
    i32::try_from(count).map_err(|_| LibraryError::corrupt(format!("count {} too large", count)))
}

fn exactly_six<'a, T>(values: &'a [T], what: &str) -> Result<&'a [T], LibraryError> {
    if values.len() != DOF {
        return Err(LibraryError::corrupt(format!("{} {}, the format needs {}", values.len(), what, DOF)));
    }
    Ok(values)
}

struct Encoder<'a, W: Write> {
    writer: &'a mut W,
}

impl<W: Write> Encoder<'_, W> {
    fn bytes(&mut self, bytes: &[u8]) -> Result<(), LibraryError> {
        Ok(self.writer.write_all(bytes)?)
    }

    fn u32(&mut self, value: u32) -> Result<(), LibraryError> {
        self.bytes(&value.to_le_bytes())
    }

    fn i32(&mut self, value: i32) -> Result<(), LibraryError> {
        self.bytes(&value.to_le_bytes())
    }

    fn f64(&mut self, value: f64) -> Result<(), LibraryError> {
        self.bytes(&value.to_le_bytes())
    }

    /// Newline terminated string, the string itself must not contain a newline.
    fn line(&mut self, value: &str) -> Result<(), LibraryError> {
        if value.contains('\n') {
            return Err(LibraryError::corrupt(format!("{:?} contains a newline", value)));
        }
        self.bytes(value.as_bytes())?;
        self.bytes(b"\n")
    }

    fn legacy_header(&mut self, header: &Header) -> Result<(), LibraryError> {
        self.u32(header.seq)?;
        self.u32(header.stamp.sec)?;
        self.u32(header.stamp.nsec)?;
        self.line(&header.frame_id)
    }
}

struct Decoder<'a, R: Read> {
    reader: &'a mut R,
}

impl<R: Read> Decoder<'_, R> {
    fn array<const N: usize>(&mut self) -> Result<[u8; N], LibraryError> {
        let mut bytes = [0u8; N];
        self.reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, LibraryError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, LibraryError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64, LibraryError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn line(&mut self) -> Result<String, LibraryError> {
        let mut bytes = Vec::new();
        loop {
            let [byte] = self.array::<1>()?;
            if byte == b'\n' {
                break;
            }
            if bytes.len() >= MAX_LINE {
                return Err(LibraryError::corrupt("unterminated string"));
            }
            bytes.push(byte);
        }
        String::from_utf8(bytes).map_err(|_| LibraryError::corrupt("string is not UTF-8"))
    }

    fn legacy_header(&mut self) -> Result<Header, LibraryError> {
        Ok(Header {
            seq: self.u32()?,
            stamp: Stamp {
                sec: self.u32()?,
                nsec: self.u32()?,
            },
            frame_id: self.line()?,
        })
    }
}
