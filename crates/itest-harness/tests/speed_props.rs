use std::fs;
use std::path::Path;

use itest_harness::special_paths::{rename_special_paths, restore_special_paths};
use itest_harness::speed::test_speeds;
use itest_harness::Mode;
use proptest::prelude::*;

const DIRS: &[&str] = &["", "a", "a/b", ".git", ".git/info", "sub/.git/info", "sub"];
const FILES: &[&str] = &[
    ".gitmodules",
    ".gitignore",
    "exclude",
    "plain.txt",
    "notes.md",
];

fn snapshot_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<_> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let content = if e.file_type().is_file() {
                fs::read(e.path()).unwrap()
            } else {
                Vec::new()
            };
            (rel.to_string_lossy().into_owned(), content)
        })
        .collect();
    entries.sort();
    entries
}

proptest! {
    #[test]
    fn ladder_shape(start in 0.01f64..100.0) {
        let speeds = test_speeds(start, Mode::Test, None);
        prop_assert_eq!(speeds[0], start);
        prop_assert_eq!(&speeds[speeds.len() - 3..], &[1.0, 0.5, 0.5]);
        if start > 5.0 {
            prop_assert_eq!(speeds.len(), 5);
            prop_assert_eq!(speeds[1], 5.0);
        } else {
            prop_assert_eq!(speeds.len(), 4);
        }
    }

    #[test]
    fn override_is_the_only_speed(start in 0.0f64..100.0, speed in 0.01f64..50.0) {
        prop_assert_eq!(test_speeds(start, Mode::Test, Some(speed)), vec![speed]);
    }

    #[test]
    fn non_test_modes_use_normal_speed(
        start in 0.0f64..100.0,
        speed in proptest::option::of(0.01f64..50.0),
        mode in prop_oneof![
            Just(Mode::Record),
            Just(Mode::Sandbox),
            Just(Mode::UpdateSnapshot),
        ],
    ) {
        prop_assert_eq!(test_speeds(start, mode, speed), vec![1.0]);
    }

    #[test]
    fn special_paths_round_trip(
        files in proptest::collection::vec((0..DIRS.len(), 0..FILES.len()), 1..12)
    ) {
        let dir = tempfile::tempdir().unwrap();
        for (d, f) in &files {
            let parent = dir.path().join(DIRS[*d]);
            fs::create_dir_all(&parent).unwrap();
            let rel = Path::new(DIRS[*d]).join(FILES[*f]);
            fs::write(parent.join(FILES[*f]), rel.to_string_lossy().as_bytes()).unwrap();
        }

        let original = snapshot_tree(dir.path());
        rename_special_paths(dir.path()).unwrap();
        prop_assert!(!dir.path().join(".git").exists());
        restore_special_paths(dir.path()).unwrap();
        prop_assert_eq!(snapshot_tree(dir.path()), original);
    }
}
