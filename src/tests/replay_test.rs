#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::error::LibraryError;
    use crate::library::BuildSettings;
    use crate::plan_store::PlanStore;
    use crate::replay::Replayer;
    use std::sync::Mutex;
    use crate::kinematic_traits::Joints;
    use crate::telemetry::{NullSink, TelemetrySink};
    use crate::tests::test_utils::*;
    use crate::trajectory::{JointState, JointTrajectory};

    #[derive(Debug, PartialEq)]
    enum Published {
        Scene(Joints),
        Trajectories(Joints, usize),
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Published>>,
    }

    impl TelemetrySink for RecordingSink {
        fn publish_scene(&self, state: &JointState) {
            self.published.lock().unwrap().push(Published::Scene(state.joints()));
        }

        fn publish_trajectories(&self, start: &JointState, trajectories: &[&JointTrajectory]) {
            self.published.lock().unwrap().push(Published::Trajectories(start.joints(), trajectories.len()));
        }
    }

    fn built_store() -> PlanStore {
        let mut library = test_library(Arc::new(FreeSpace), ScriptedPlanner::new(vec![]), BuildSettings::default());
        library.generate_targets(&pick_grid(), &place_grid());
        library.build();
        library.into_store()
    }

    #[test]
    fn test_cycles_chain() {
        let store = built_store();
        let mut replayer = Replayer::new(&store, Arc::new(NullSink)).with_seed(42);
        replayer.pacing = false;

        let mut place = None;
        for _ in 0..6 {
            let (pick_plan, place_plan) = replayer.next_cycle().expect("cycle");
            if let Some(place) = place {
                assert_eq!(pick_plan.place_index, place);
            }
            assert_eq!(place_plan.pick_index, pick_plan.pick_index);
            assert!(same(&place_plan.start_state.joints(), &pick_plan.end_state.joints()));
            place = Some(place_plan.place_index);
            assert_eq!(replayer.place(), place);
        }

        let summary = replayer.run(Some(5)).expect("replay");
        assert_eq!(summary.cycles, 5);
        assert!(summary.total_duration > 0.0);
        assert!(summary.max_discontinuity < 1e-9);
    }

    #[test]
    fn test_scene_published_before_trajectories() {
        let store = built_store();
        let sink = Arc::new(RecordingSink::default());
        let mut replayer = Replayer::new(&store, sink.clone()).with_seed(3);
        replayer.pacing = false;

        let mut starts = Vec::new();
        for _ in 0..3 {
            let (pick_plan, _) = replayer.next_cycle().expect("cycle");
            starts.push(pick_plan.start_state.joints());
        }

        let published = sink.published.lock().unwrap();
        let expected: Vec<Published> = starts
            .iter()
            .flat_map(|start| [Published::Scene(*start), Published::Trajectories(*start, 2)])
            .collect();
        assert_eq!(*published, expected);
    }

    #[test]
    fn test_empty_store() {
        let store = PlanStore::new();
        let mut replayer = Replayer::new(&store, Arc::new(NullSink));
        assert!(matches!(
            replayer.next_cycle(),
            Err(LibraryError::NoContinuation { leg: "pick", .. })
        ));
    }

    #[test]
    fn test_dead_end() {
        // Pick plans exist, but nothing leads back to a place target.
        let mut store = built_store();
        store.place.plans.clear();
        let mut replayer = Replayer::new(&store, Arc::new(NullSink));
        replayer.max_tries = 20;
        replayer.pacing = false;
        match replayer.run(None) {
            Err(LibraryError::NoContinuation { leg, tries, .. }) => {
                assert_eq!(leg, "place");
                assert_eq!(tries, 20);
            }
            other => panic!("expected a dead end, got {:?}", other),
        }
    }
}
