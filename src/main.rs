use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use rs_trajectory_library::collisions::CollisionScene;
use rs_trajectory_library::config::{BuildConfig, LibraryConfig};
use rs_trajectory_library::ik::JacobianIkSolver;
use rs_trajectory_library::kinematic_traits::IkSolver;
use rs_trajectory_library::library::TrajectoryLibrary;
use rs_trajectory_library::plan_pipeline::{PipelineSettings, PlanningPipeline};
use rs_trajectory_library::plan_store::{PlanStore, StoreFormat};
use rs_trajectory_library::planner::{DirectPlanner, MotionPlanner, PlannerKind};
use rs_trajectory_library::replay::Replayer;
use rs_trajectory_library::robot::RobotModel;
use rs_trajectory_library::rrt::RrtConnectPlanner;
use rs_trajectory_library::shortcut::TrajectoryOptimizer;
use rs_trajectory_library::telemetry::{init_logging, TracingSink};
use rs_trajectory_library::time_parameterization::TrapezoidalTimeParameterization;
use rs_trajectory_library::utils::format_joints;

/// Pick and place trajectory library
///
/// Plans collision free motions between every pick and place target of two grids,
/// stores them and plays them back.
#[derive(Parser, Debug)]
#[command(name = "trajectory-library")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the target grids and plan all pick and place pairs
    Build {
        /// YAML configuration of robot, world, grids and planning
        #[arg(long, value_name = "PATH")]
        config: PathBuf,

        /// Directory to write the plan files into
        #[arg(long, value_name = "DIR")]
        output: PathBuf,

        /// Write the headerless legacy layout
        #[arg(long)]
        legacy: bool,
    },

    /// Play random pick and place cycles from a built library
    Replay {
        #[arg(long, value_name = "DIR")]
        library: PathBuf,

        /// Number of cycles, endless if not given
        #[arg(long)]
        cycles: Option<usize>,

        /// Do not wait for the plans to execute
        #[arg(long)]
        no_pacing: bool,

        /// Random seed of the target draws
        #[arg(long, default_value = "0")]
        seed: u64,

        #[arg(long)]
        legacy: bool,
    },

    /// Print the plans for the given pair of targets
    Query {
        #[arg(long, value_name = "DIR")]
        library: PathBuf,

        /// Pick target index
        #[arg(long)]
        pick: u32,

        /// Place target index
        #[arg(long)]
        place: u32,

        #[arg(long)]
        legacy: bool,
    },
}

fn format_of(legacy: bool) -> StoreFormat {
    if legacy { StoreFormat::Legacy } else { StoreFormat::Versioned }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Build { config, output, legacy } => build(&config, &output, format_of(legacy)),
        Command::Replay { library, cycles, no_pacing, seed, legacy } => {
            let store = PlanStore::load(&library, format_of(legacy))
                .with_context(|| format!("loading library from {}", library.display()))?;
            let mut replayer = Replayer::new(&store, Arc::new(TracingSink)).with_seed(seed);
            replayer.pacing = !no_pacing;
            let summary = replayer.run(cycles)?;
            info!(
                "Replayed {} cycles, {:.3} s in total, largest discontinuity {:.6}",
                summary.cycles, summary.total_duration, summary.max_discontinuity
            );
            Ok(())
        }
        Command::Query { library, pick, place, legacy } => {
            let store = PlanStore::load(&library, format_of(legacy))
                .with_context(|| format!("loading library from {}", library.display()))?;
            let legs = [
                ("pick", store.pick_plan(place, pick)),
                ("place", store.place_plan(pick, place)),
            ];
            for (leg, plan) in legs {
                match plan {
                    Some(plan) => {
                        println!(
                            "{} plan: {} waypoints, {:.3} s",
                            leg,
                            plan.waypoint_count(),
                            plan.duration()
                        );
                        println!("  start {}", format_joints(&plan.start_state.joints()));
                        println!("  end   {}", format_joints(&plan.end_state.joints()));
                    }
                    None => println!("{} plan: none for pick {} and place {}", leg, pick, place),
                }
            }
            Ok(())
        }
    }
}

fn build(config_path: &Path, output: &Path, format: StoreFormat) -> Result<()> {
    let config = LibraryConfig::from_yaml_file(config_path)
        .with_context(|| format!("reading configuration {}", config_path.display()))?;
    let robot = Arc::new(config.robot.robot_model());

    let mut scene = CollisionScene::new(robot.clone());
    config.world.populate(&mut scene);
    let scene = Arc::new(scene);

    let mut ik = JacobianIkSolver::new(robot.clone());
    if let Some(seed) = config.build.seed {
        ik = ik.with_rng_seed(seed);
    }
    let ik: Arc<dyn IkSolver> = Arc::new(ik);

    let planner = create_planner(&config.build, &robot, &ik);
    let timing = Arc::new(TrapezoidalTimeParameterization::new(robot.max_velocity, robot.max_acceleration));
    let mut optimizer = TrajectoryOptimizer::new(timing);
    optimizer.resolution = config.build.shortcut_resolution;
    optimizer.slowdown = config.build.slowdown;

    let settings = PipelineSettings {
        workspace: config.build.workspace,
        planning_time: config.build.planning_time,
        attempts: config.build.planning_attempts,
        ik_limits: config.build.sampling,
        ..PipelineSettings::new(&robot.group_name, &robot.frame_id, robot.joint_names.clone())
    };
    let pipeline = PlanningPipeline::new(planner, optimizer, robot.kinematics.clone(), settings);

    let mut library = TrajectoryLibrary::new(
        robot,
        scene,
        ik,
        pipeline,
        Arc::new(TracingSink),
        config.build.build_settings(),
    );
    let (picks, places) = library.generate_targets(&config.pick_grid, &config.place_grid);
    if picks == 0 || places == 0 {
        bail!("no reachable targets: {} pick and {} place", picks, places);
    }
    let report = library.build();
    info!(
        "Built {} of {} pairs ({} pick and {} place failures)",
        report.successes, report.theoretical_max, report.pick_failures, report.place_failures
    );

    library
        .into_store()
        .save(output, format)
        .with_context(|| format!("saving library to {}", output.display()))?;
    info!("Library saved to {}", output.display());
    Ok(())
}

fn create_planner(
    build: &BuildConfig,
    robot: &Arc<RobotModel>,
    ik: &Arc<dyn IkSolver>,
) -> Box<dyn MotionPlanner> {
    match build.planner {
        PlannerKind::RrtConnect => {
            let mut planner = RrtConnectPlanner::new(robot.clone()).with_ik(ik.clone());
            planner.step_size_joint_space = build.rrt_step;
            planner.max_try = build.rrt_max_try;
            if let Some(seed) = build.seed {
                planner = planner.with_rng_seed(seed);
            }
            Box::new(planner)
        }
        PlannerKind::Direct => Box::new(DirectPlanner {
            step: build.rrt_step,
            ik: Some(ik.clone()),
        }),
    }
}
