use std::path::Path;

use tempfile::TempDir;
use treekit_io_fs::{
    EnumSelectCriterionMode, HandleDir, SpecFileTypeMask, SpecSelectionCriteria,
    SpecTreeCopyOptions, SpecTreeDeleteOptions, TreeOpError, copy_tree, delete_tree_files,
    discover_tree, profile_tree,
};

fn write_bytes(path: &Path, n_bytes: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, vec![b'x'; n_bytes]).expect("write bytes");
}

fn count_dirs(path: &Path) -> usize {
    let mut n = 1;
    for entry in std::fs::read_dir(path).expect("read dir") {
        let entry = entry.expect("entry");
        if entry.file_type().expect("file type").is_dir() {
            n += count_dirs(&entry.path());
        }
    }
    n
}

#[test]
fn discovery_counts_every_directory_but_the_root() {
    let tmp = TempDir::new().expect("tempdir");
    for rel in ["a/b/c", "a/d", "e", "f/g/h/i"] {
        std::fs::create_dir_all(tmp.path().join(rel)).expect("mkdir");
    }
    let n_dirs = count_dirs(tmp.path());
    let (dir_root, _) = HandleDir::resolve(tmp.path()).expect("resolve");

    let listing = discover_tree(&dir_root, false).expect("discover");
    assert_eq!(listing.dirs.len(), n_dirs - 1);
    assert_eq!(listing.n_subdirs_total as usize, n_dirs - 1);

    let listing = discover_tree(&dir_root, true).expect("discover");
    assert_eq!(listing.dirs.len(), n_dirs);
    assert_eq!(listing.n_subdirs_total as usize, n_dirs - 1);
}

#[test]
fn copy_with_name_pattern_copies_only_matching_file() {
    let tmp = TempDir::new().expect("tempdir");
    let src = tmp.path().join("a");
    let dst = tmp.path().join("b");
    write_bytes(&src.join("f1.txt"), 100);
    write_bytes(&src.join("sub/f2.log"), 50);

    let spec_cp_options = SpecTreeCopyOptions {
        if_include_root: true,
        criteria: SpecSelectionCriteria {
            patterns_file_name: Some(vec!["*.txt".to_string()]),
            ..SpecSelectionCriteria::default()
        },
        ..SpecTreeCopyOptions::default()
    };
    let outcome = copy_tree(&src, &dst, spec_cp_options).expect("copy tree");
    assert_eq!(outcome.report.cnt_files_copied, 1);
    assert_eq!(outcome.report.n_bytes_copied, 100);
    assert_eq!(outcome.report.cnt_files_not_copied, 1);
    assert_eq!(outcome.report.n_bytes_not_copied, 50);
    assert_eq!(outcome.report.error_count(), 0);

    assert!(dst.join("f1.txt").is_file());
    let l_entries: Vec<_> = std::fs::read_dir(&dst)
        .expect("read dst")
        .map(|e| e.expect("entry").file_name())
        .collect();
    assert_eq!(l_entries, vec![std::ffi::OsString::from("f1.txt")]);
}

#[test]
fn copy_round_trip_matches_source_profile_and_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_bytes(&src.join("r.bin"), 11);
    write_bytes(&src.join("a/a.bin"), 22);
    write_bytes(&src.join("a/b/b.bin"), 33);
    write_bytes(&src.join("c/c.bin"), 44);

    let outcome_first = copy_tree(&src, &dst, SpecTreeCopyOptions::default()).expect("copy");
    let profile_src = profile_tree(&src, true).expect("profile src");
    let profile_dst = profile_tree(&dst, true).expect("profile dst");
    assert_eq!(profile_src.cnt_files_regular, profile_dst.cnt_files_regular);
    assert_eq!(
        profile_src.n_bytes_files_regular,
        profile_dst.n_bytes_files_regular
    );

    let outcome_second = copy_tree(&src, &dst, SpecTreeCopyOptions::default()).expect("copy");
    let profile_dst_again = profile_tree(&dst, true).expect("profile dst");
    assert_eq!(
        profile_dst.n_bytes_files_regular,
        profile_dst_again.n_bytes_files_regular
    );
    assert_eq!(
        outcome_first.report.n_bytes_copied,
        outcome_second.report.n_bytes_copied
    );
    assert_eq!(outcome_second.report.cnt_dirs_created, 0);
}

#[test]
fn empty_criteria_select_everything_under_and_and_or() {
    for rule_combine in [EnumSelectCriterionMode::And, EnumSelectCriterionMode::Or] {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_bytes(&src.join("one.txt"), 1);
        write_bytes(&src.join("x/two.dat"), 2);

        let spec_cp_options = SpecTreeCopyOptions {
            criteria: SpecSelectionCriteria {
                rule_combine,
                ..SpecSelectionCriteria::default()
            },
            ..SpecTreeCopyOptions::default()
        };
        let outcome = copy_tree(&src, tmp.path().join("dst"), spec_cp_options).expect("copy");
        assert_eq!(outcome.report.cnt_files_copied, 2);
        assert_eq!(outcome.report.cnt_files_not_copied, 0);
    }
}

#[test]
fn all_false_mask_is_rejected_before_touching_disk() {
    let tmp = TempDir::new().expect("tempdir");
    let src = tmp.path().join("missing_src");
    let dst = tmp.path().join("dst");

    let failure = copy_tree(
        &src,
        &dst,
        SpecTreeCopyOptions {
            mask_file_types: SpecFileTypeMask::none(),
            ..SpecTreeCopyOptions::default()
        },
    )
    .expect_err("must fail");
    assert!(matches!(failure.error, TreeOpError::InvalidFileTypeMask));

    let failure = delete_tree_files(
        &src,
        SpecTreeDeleteOptions {
            mask_file_types: SpecFileTypeMask::none(),
            ..SpecTreeDeleteOptions::default()
        },
    )
    .expect_err("must fail");
    assert!(matches!(failure.error, TreeOpError::InvalidFileTypeMask));
    assert!(!dst.exists());
}

#[test]
fn delete_with_no_matches_leaves_profile_unchanged() {
    let tmp = TempDir::new().expect("tempdir");
    write_bytes(&tmp.path().join("a.txt"), 5);
    write_bytes(&tmp.path().join("d/b.txt"), 6);
    let profile_before = profile_tree(tmp.path(), true).expect("profile");

    let outcome = delete_tree_files(
        tmp.path(),
        SpecTreeDeleteOptions {
            criteria: SpecSelectionCriteria {
                patterns_file_name: Some(vec!["*.none".to_string()]),
                ..SpecSelectionCriteria::default()
            },
            ..SpecTreeDeleteOptions::default()
        },
    )
    .expect("delete");
    assert_eq!(outcome.report.cnt_files_deleted, 0);
    assert_eq!(outcome.report.n_bytes_deleted, 0);
    assert_eq!(outcome.report.cnt_files_remaining, 2);
    assert_eq!(outcome.profile, profile_before);
}

#[test]
fn one_failing_file_out_of_ten_is_not_fatal() {
    let tmp = TempDir::new().expect("tempdir");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    for idx in 0..10 {
        write_bytes(&src.join(format!("f{idx}.txt")), 10);
    }
    // a directory squatting on the target name makes that one copy fail
    std::fs::create_dir_all(dst.join("f5.txt")).expect("mkdir blocker");

    let outcome = copy_tree(&src, &dst, SpecTreeCopyOptions::default()).expect("copy tree");
    assert_eq!(outcome.report.cnt_files_processed, 10);
    assert_eq!(outcome.report.cnt_files_copied, 9);
    assert_eq!(outcome.report.cnt_files_not_copied, 1);
    assert_eq!(outcome.report.error_count(), 1);
    assert_eq!(outcome.report.errors[0].path, src.join("f5.txt"));
}
