//! Tree move: full copy, then removal of the source side.

use std::path::Path;

use log::{error, info};

use crate::copy::copy_tree;
use crate::handle::HandleDir;
use crate::prune::{prune_subdirectories, remove_dir_all};
use crate::report::ReportTreeMove;
use crate::spec::{
    SpecFileTypeMask, SpecSelectionCriteria, SpecTreeCopyOptions, SpecTreeMoveOptions,
    TreeOpError, TreeOpFailure,
};

/// Result of one `move_tree` run.
#[derive(Debug, Default, Clone)]
pub struct OutcomeTreeMove {
    pub report: ReportTreeMove,
}

/// Move every file and directory of `dir_source` under `dir_destination`.
///
/// Runs `copy_tree` with every file selected and empty directories
/// materialized. The source is removed only when that copy reproduced every
/// file without error; otherwise the move fails with
/// [`TreeOpError::MoveIncomplete`] and the source is untouched.
///
/// With `if_include_root` the source root itself is removed. Without it only
/// the root's subdirectory trees move; the root and its own files stay.
pub fn move_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_mv_options: SpecTreeMoveOptions,
) -> Result<OutcomeTreeMove, TreeOpFailure<OutcomeTreeMove>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut outcome = OutcomeTreeMove::default();
    macro_rules! bail {
        ($err:expr) => {{
            let err = $err;
            error!("move aborted: {err}");
            return Err(TreeOpFailure::new(err, outcome));
        }};
    }

    let spec_cp_options = SpecTreeCopyOptions {
        if_include_root: spec_mv_options.if_include_root,
        if_create_empty_dirs: true,
        mask_file_types: SpecFileTypeMask::all(),
        criteria: SpecSelectionCriteria::default(),
        if_return_copied_list: false,
        token_cancel: spec_mv_options.token_cancel.clone(),
    };
    let report_copy = match copy_tree(dir_source.as_ref(), dir_destination, spec_cp_options) {
        Ok(v) => v.report,
        Err(failure) => {
            let (err, partial) = failure.into_parts();
            outcome.report = ReportTreeMove::from_copy(&partial.report);
            bail!(err);
        }
    };
    outcome.report = ReportTreeMove::from_copy(&report_copy);

    if report_copy.cnt_files_not_copied > 0 || report_copy.error_count() > 0 {
        bail!(TreeOpError::MoveIncomplete {
            dir_source: dir_source.as_ref().to_path_buf(),
            cnt_files_not_copied: report_copy.cnt_files_not_copied,
            cnt_errors: report_copy.error_count() as u64,
        });
    }
    if spec_mv_options
        .token_cancel
        .as_ref()
        .is_some_and(|t| t.is_cancelled())
    {
        bail!(TreeOpError::Cancelled);
    }

    let mut dir_src = match HandleDir::resolve(dir_source.as_ref()) {
        Ok((v, _)) => v,
        Err(e) => bail!(e),
    };
    if spec_mv_options.if_include_root {
        if let Err(e) = remove_dir_all(&dir_src) {
            bail!(TreeOpError::RemoveDirFailed {
                path: dir_src.path().to_path_buf(),
                message: e.to_string(),
            });
        }
        outcome.report.if_source_removed = !dir_src.refresh();
    } else {
        if let Err(failure) = prune_subdirectories(dir_src.path(), false) {
            bail!(failure.error);
        }
        outcome.report.if_source_removed = true;
    }

    outcome.report.cnt_files_moved = report_copy.cnt_files_copied;
    outcome.report.n_bytes_moved = report_copy.n_bytes_copied;
    info!("{}", outcome.report);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::move_tree;
    use crate::spec::{SpecTreeMoveOptions, TreeOpError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    #[test]
    fn move_tree_relocates_everything_and_removes_source() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("r.txt"), "rr");
        write_text(&src.join("a/a.txt"), "aaa");
        std::fs::create_dir_all(src.join("empty")).expect("mkdir");

        let outcome = move_tree(&src, &dst, SpecTreeMoveOptions::default()).expect("move");
        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(dst.join("r.txt")).expect("read"), "rr");
        assert_eq!(std::fs::read_to_string(dst.join("a/a.txt")).expect("read"), "aaa");
        assert!(dst.join("empty").is_dir());
        assert!(outcome.report.if_source_removed);
        assert_eq!(outcome.report.cnt_files_moved, 2);
        assert_eq!(outcome.report.n_bytes_moved, 5);
        assert_eq!(outcome.report.cnt_files_remaining, 0);
        assert_eq!(outcome.report.cnt_subdirs, 2);
    }

    #[test]
    fn move_subtrees_keeps_root_and_its_files() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("stay.txt"), "s");
        write_text(&src.join("a/b/go.txt"), "g");

        let spec_mv_options = SpecTreeMoveOptions {
            if_include_root: false,
            ..SpecTreeMoveOptions::default()
        };
        let outcome = move_tree(&src, &dst, spec_mv_options).expect("move");
        assert!(src.join("stay.txt").exists());
        assert!(!src.join("a").exists());
        assert!(dst.join("a/b/go.txt").is_file());
        assert!(!dst.join("stay.txt").exists());
        assert_eq!(outcome.report.cnt_files_moved, 1);
    }

    #[test]
    fn move_keeps_source_when_a_file_is_not_copied() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("ok.txt"), "ok");
        write_text(&src.join("blocked.txt"), "b");
        std::fs::create_dir_all(dst.join("blocked.txt")).expect("mkdir blocker");

        let failure = move_tree(&src, &dst, SpecTreeMoveOptions::default()).expect_err("must fail");
        match failure.error {
            TreeOpError::MoveIncomplete {
                cnt_files_not_copied,
                cnt_errors,
                ..
            } => {
                assert_eq!(cnt_files_not_copied, 1);
                assert_eq!(cnt_errors, 1);
            }
            other => panic!("expected MoveIncomplete, got {other:?}"),
        }
        assert!(src.join("ok.txt").exists());
        assert!(src.join("blocked.txt").exists());
        assert!(!failure.partial.report.if_source_removed);
        assert_eq!(failure.partial.report.cnt_files_moved, 0);
        assert_eq!(failure.partial.report.cnt_files_remaining, 1);
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");

        let failure = move_tree(&src, src.join("inner"), SpecTreeMoveOptions::default())
            .expect_err("must fail");
        assert!(matches!(
            failure.error,
            TreeOpError::SourceDestinationOverlap { .. }
        ));
        assert!(src.join("a.txt").exists());
    }
}
