#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use crate::error::LibraryError;
    use crate::library::BuildSettings;
    use crate::plan_store::{PlanStore, StoreFormat, PICK_FILE, PLACE_FILE, STORE_HEADER_SIZE};
    use crate::tests::test_utils::*;

    fn built_store() -> PlanStore {
        let mut library = test_library(Arc::new(FreeSpace), ScriptedPlanner::new(vec![]), BuildSettings::default());
        library.generate_targets(&pick_grid(), &place_grid());
        library.build();
        library.into_store()
    }

    #[test]
    fn test_versioned_round_trip_is_exact() {
        let store = built_store();
        let dir = tempfile::tempdir().expect("temporary directory");
        let library_dir = dir.path().join("library");
        store.save(&library_dir, StoreFormat::Versioned).expect("save");

        // File header and the 8 byte record count, then 497 bytes per record plus 56
        // per waypoint (frame "world", six 7 character joint names, u64 lengths).
        let expected = STORE_HEADER_SIZE + 8 + 4 * (497 + 2 * 56);
        for file in [PICK_FILE, PLACE_FILE] {
            let size = fs::metadata(library_dir.join(file)).expect("metadata").len();
            assert_eq!(size, expected as u64);
        }

        let loaded = PlanStore::load(&library_dir, StoreFormat::Versioned).expect("load");
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_legacy_layout() {
        let store = built_store();
        let dir = tempfile::tempdir().expect("temporary directory");
        store.save(dir.path(), StoreFormat::Legacy).expect("save");

        let expected = 4 + 4 * (306 + 2 * 56);
        let bytes = fs::read(dir.path().join(PICK_FILE)).expect("read");
        assert_eq!(bytes.len(), expected);
        assert_eq!(&bytes[..4], &4i32.to_le_bytes());
        // First waypoint of the first record starts right after the two counts.
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(&bytes[8..16], &0.2f64.to_le_bytes());

        let loaded = PlanStore::load(dir.path(), StoreFormat::Legacy).expect("load");
        assert_eq!(loaded.pick.plan_count(), 4);
        for (original, read) in store.pick.plans.iter().zip(&loaded.pick.plans) {
            assert_eq!(read.pick_index, original.pick_index);
            assert_eq!(read.place_index, original.place_index);
            assert_eq!(read.start_state, original.start_state);
            assert_eq!(read.end_state, original.end_state);
            assert_eq!(read.trajectory.joint_names, original.trajectory.joint_names);
            for (a, b) in original.trajectory.points.iter().zip(&read.trajectory.points) {
                assert_eq!(a.positions, b.positions);
                // Seconds and nanoseconds only.
                assert!((a.time_from_start - b.time_from_start).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_missing_library() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let result = PlanStore::load(&dir.path().join("nothing"), StoreFormat::Versioned);
        match result {
            Err(LibraryError::Io { path, .. }) => assert!(path.ends_with(PICK_FILE)),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_format_is_detected() {
        let store = built_store();
        let dir = tempfile::tempdir().expect("temporary directory");
        store.save(dir.path(), StoreFormat::Legacy).expect("save");
        let result = PlanStore::load(dir.path(), StoreFormat::Versioned);
        assert!(matches!(result, Err(LibraryError::BadMagic(_))));
    }

    #[test]
    fn test_query() {
        let store = built_store();
        let pick = store.pick_plan(1, 0).expect("pick plan");
        assert_eq!((pick.pick_index, pick.place_index), (0, 1));
        assert!(same(&pick.start_state.joints(), &place_target(1)));

        let place = store.place_plan(0, 1).expect("place plan");
        assert_eq!((place.pick_index, place.place_index), (0, 1));
        assert!(same(&place.start_state.joints(), &pick_target(0)));
        assert!(same(&place.end_state.joints(), &place_target(1)));

        assert!(store.pick_plan(2, 0).is_none());
        assert_eq!(store.pick_target_count(), 2);
        assert_eq!(store.place_target_count(), 2);
    }
}
