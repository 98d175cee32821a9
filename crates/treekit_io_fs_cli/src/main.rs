mod cli;

use std::io::Write;

use clap::Parser;
use log::error;
use serde_json::json;
use treekit_io_fs::{
    CollectionFiles, OutcomeTreeCopy, OutcomeTreeDelete, OutcomeTreeFind, OutcomeTreeMove,
    SpecItemError, TreeOpError, TreeOpFailure, copy_tree, delete_tree_files, find_tree_files,
    move_tree, profile_directory, profile_tree, prune_subdirectories,
};

use cli::{
    Cli, Commands, CopyArgs, DeleteArgs, EXIT_ITEM_ERRORS, EXIT_SUCCESS, FindArgs, MoveArgs,
    ProfileArgs, PruneArgs, exit_code_for,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match &cli.command {
        Commands::Copy(args) => run_copy(args, cli.json),
        Commands::Move(args) => run_move(args, cli.json),
        Commands::Delete(args) => run_delete(args, cli.json),
        Commands::Find(args) => run_find(args, cli.json),
        Commands::Prune(args) => run_prune(args, cli.json),
        Commands::Profile(args) => run_profile(args, cli.json),
    };
    std::process::exit(exit_code);
}

fn init_logging(if_verbose: bool) {
    let level_default = if if_verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level_default))
        .format_timestamp(None)
        .init();
}

fn run_copy(args: &CopyArgs, if_json: bool) -> i32 {
    match copy_tree(&args.source, &args.destination, args.to_options()) {
        Ok(outcome) => {
            print_copy(&outcome, None, if_json);
            exit_code_for_items(&outcome.report.errors)
        }
        Err(failure) => {
            let (err, outcome) = failure.into_parts();
            print_copy(&outcome, Some(&err), if_json);
            report_fatal(&err)
        }
    }
}

fn run_delete(args: &DeleteArgs, if_json: bool) -> i32 {
    match delete_tree_files(&args.target, args.to_options()) {
        Ok(outcome) => {
            print_delete(&outcome, None, if_json);
            exit_code_for_items(&outcome.report.errors)
        }
        Err(failure) => {
            let (err, outcome) = failure.into_parts();
            print_delete(&outcome, Some(&err), if_json);
            report_fatal(&err)
        }
    }
}

fn run_move(args: &MoveArgs, if_json: bool) -> i32 {
    match move_tree(&args.source, &args.destination, args.to_options()) {
        Ok(outcome) => {
            print_move(&outcome, None, if_json);
            EXIT_SUCCESS
        }
        Err(failure) => {
            let (err, outcome) = failure.into_parts();
            print_move(&outcome, Some(&err), if_json);
            report_fatal(&err)
        }
    }
}

fn run_find(args: &FindArgs, if_json: bool) -> i32 {
    match find_tree_files(&args.dir, args.to_options()) {
        Ok(outcome) => {
            print_find(&outcome, None, if_json);
            exit_code_for_items(&outcome.report.errors)
        }
        Err(failure) => {
            let (err, outcome) = failure.into_parts();
            print_find(&outcome, Some(&err), if_json);
            report_fatal(&err)
        }
    }
}

fn run_prune(args: &PruneArgs, if_json: bool) -> i32 {
    let (dirs_deleted, err) = match prune_subdirectories(&args.parent, true) {
        Ok(dirs_deleted) => (dirs_deleted.unwrap_or_default(), None),
        Err(TreeOpFailure { error, partial }) => (partial, Some(error)),
    };

    let l_paths: Vec<String> = dirs_deleted
        .iter()
        .map(|d| d.path().display().to_string())
        .collect();
    if if_json {
        let l_paths_listed = args.list.then_some(&l_paths);
        print_json(&json!({
            "cnt_dirs_removed": l_paths.len(),
            "dirs_removed": l_paths_listed,
            "error": err.as_ref().map(ToString::to_string),
        }));
    } else {
        if args.list {
            print!("{}", dirs_deleted.format_listing());
        }
        println!("[PRUNE] removed={}", l_paths.len());
    }

    match err {
        Some(err) => report_fatal(&err),
        None => EXIT_SUCCESS,
    }
}

fn run_profile(args: &ProfileArgs, if_json: bool) -> i32 {
    let res_profile = if args.flat {
        profile_directory(&args.dir)
    } else {
        profile_tree(&args.dir, args.root.if_include_root())
    };
    match res_profile {
        Ok(profile) => {
            if if_json {
                print_json(&json!(profile));
            } else {
                println!("{profile}");
            }
            EXIT_SUCCESS
        }
        Err(err) => report_fatal(&err),
    }
}

fn print_copy(outcome: &OutcomeTreeCopy, err: Option<&TreeOpError>, if_json: bool) {
    if if_json {
        print_json(&json!({
            "report": outcome.report,
            "files_copied": listing_paths(&outcome.files_copied),
            "error": err.map(ToString::to_string),
        }));
        return;
    }
    print!("{}", outcome.files_copied.format_listing());
    print_item_errors(&outcome.report.errors);
    println!("{}", outcome.report);
}

fn print_delete(outcome: &OutcomeTreeDelete, err: Option<&TreeOpError>, if_json: bool) {
    if if_json {
        print_json(&json!({
            "report": outcome.report,
            "files_deleted": listing_paths(&outcome.files_deleted),
            "profile": outcome.profile,
            "error": err.map(ToString::to_string),
        }));
        return;
    }
    print!("{}", outcome.files_deleted.format_listing());
    print_item_errors(&outcome.report.errors);
    println!("{}", outcome.report);
    if err.is_none() {
        println!("{}", outcome.profile);
    }
}

fn print_move(outcome: &OutcomeTreeMove, err: Option<&TreeOpError>, if_json: bool) {
    if if_json {
        print_json(&json!({
            "report": outcome.report,
            "error": err.map(ToString::to_string),
        }));
        return;
    }
    print_item_errors(&outcome.report.errors);
    println!("{}", outcome.report);
}

fn print_find(outcome: &OutcomeTreeFind, err: Option<&TreeOpError>, if_json: bool) {
    if if_json {
        print_json(&json!({
            "report": outcome.report,
            "files_found": listing_paths(&outcome.files_found),
            "error": err.map(ToString::to_string),
        }));
        return;
    }
    print!("{}", outcome.files_found.format_listing());
    print_item_errors(&outcome.report.errors);
    println!("{}", outcome.report);
}

fn listing_paths(files: &CollectionFiles) -> Vec<String> {
    files
        .iter()
        .map(|f| f.path().display().to_string())
        .collect()
}

fn print_item_errors(errors: &[SpecItemError]) {
    let mut stderr = std::io::stderr().lock();
    for item_error in errors {
        let _ = writeln!(stderr, "error: {item_error}");
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(txt) => println!("{txt}"),
        Err(e) => error!("failed to encode report as JSON: {e}"),
    }
}

fn report_fatal(err: &TreeOpError) -> i32 {
    eprintln!("Error: {err}");
    exit_code_for(err)
}

fn exit_code_for_items(errors: &[SpecItemError]) -> i32 {
    if errors.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_ITEM_ERRORS
    }
}

#[cfg(test)]
mod tests {
    use treekit_io_fs::{SpecItemError, TreeOpError};

    use super::{exit_code_for_items, report_fatal};
    use crate::cli::{EXIT_FATAL, EXIT_ITEM_ERRORS, EXIT_SUCCESS};

    #[test]
    fn item_errors_downgrade_exit_code() {
        assert_eq!(exit_code_for_items(&[]), EXIT_SUCCESS);
        assert_eq!(
            exit_code_for_items(&[SpecItemError::new("/x", "boom")]),
            EXIT_ITEM_ERRORS
        );
        assert_eq!(report_fatal(&TreeOpError::Cancelled), EXIT_FATAL);
    }
}
