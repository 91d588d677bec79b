use std::path::Path;

use mkbc::mkbc::command::Command;
use mkbc::mkbc::config::Toolchain;
use mkbc::mkbc::errors::ExecutionError;
use mkbc::mkbc::script::Script;
use mkbc::{execute_script, translate_trace};

mod common;

fn sample_script() -> Script {
    Script::new(vec![Command::new("clang -emit-llvm -c a.c -o a.bc", "/b"),
                     Command::new("", "/b"),
                     Command::new("clang -emit-llvm -c b.c -o b.bc", "/b"),
                     Command::new("llvm-link a.bc b.bc -o app.exe.bc", "/b")])
}

#[test_log::test]
fn test_execute_skips_commands_without_effect() -> anyhow::Result<()> {
    let runner = common::RecordingRunner::default();
    let report = sample_script().execute(&runner, false)?;
    assert!(report.succeeded());
    assert_eq!(report.executed, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(*runner.ran.borrow(),
               vec!["clang -emit-llvm -c a.c -o a.bc",
                    "clang -emit-llvm -c b.c -o b.bc",
                    "llvm-link a.bc b.bc -o app.exe.bc"]);
    Ok(())
}

#[test_log::test]
fn test_execute_stops_at_first_failure() {
    let runner = common::RecordingRunner::failing(&[("clang -emit-llvm -c a.c -o a.bc", 1)]);
    match sample_script().execute(&runner, false) {
        Err(ExecutionError::ExecutionFailure { command, cwd, exit_code }) => {
            assert_eq!(command, "clang -emit-llvm -c a.c -o a.bc");
            assert_eq!(cwd, Path::new("/b"));
            assert_eq!(exit_code, 1);
        }
        other => { panic!("expected ExecutionFailure, got {:?}", other) }
    }
    assert_eq!(runner.ran.borrow().len(), 1);
}

#[test_log::test]
fn test_exit_status_is_failing_command_exit_code() -> anyhow::Result<()> {
    let failing = [("clang -emit-llvm -c b.c -o b.bc", 7)];
    let runner = common::RecordingRunner::failing(&failing);
    assert_eq!(execute_script(&sample_script(), &runner, false)?, 7);
    assert_eq!(runner.ran.borrow().len(), 2);

    let runner = common::RecordingRunner::failing(&failing);
    assert_eq!(execute_script(&sample_script(), &runner, true)?, 7);
    assert_eq!(runner.ran.borrow().len(), 3);

    assert_eq!(execute_script(&sample_script(), &common::RecordingRunner::default(), false)?, 0);
    Ok(())
}

#[test_log::test]
fn test_execute_keep_going() -> anyhow::Result<()> {
    let runner = common::RecordingRunner::failing(&[("clang -emit-llvm -c a.c -o a.bc", 2),
                                                    ("llvm-link a.bc b.bc -o app.exe.bc", 1)]);
    let report = sample_script().execute(&runner, true)?;
    assert!(!report.succeeded());
    assert_eq!(report.executed, 3);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[1].0.text(), "llvm-link a.bc b.bc -o app.exe.bc");
    // the first failure determines the exit code
    assert_eq!(report.exit_code(), 2);
    assert_eq!(runner.ran.borrow().len(), 3);
    Ok(())
}

#[test_log::test]
fn test_removed_move_is_not_run() -> anyhow::Result<()> {
    let trace = "+ cc -c a.c -o a.o\n+ mv\n+ cc a.o -o app\n";
    let script = translate_trace(trace, Path::new("/b"), &Toolchain::default())?;
    assert_eq!(script.len(), 3);
    assert!(!script.commands()[1].has_effect());

    let runner = common::RecordingRunner::default();
    let report = script.execute(&runner, false)?;
    assert_eq!(report.skipped, 1);
    assert_eq!(*runner.ran.borrow(),
               vec!["clang -emit-llvm -g -O0 -I/usr/include/mpi -c a.c -o a.bc",
                    "llvm-link a.bc -o app.exe.bc"]);
    Ok(())
}

#[test_log::test]
fn test_shell_execution() -> anyhow::Result<()> {
    let tdir = tempfile::tempdir()?;
    let script = Script::new(vec![Command::new("echo module > a.bc", tdir.path()),
                                  Command::new("cp a.bc b.bc", tdir.path())]);
    let report = script.execute(&mkbc::mkbc::script::ShellRunner::default(), false)?;
    assert_eq!(report.executed, 2);
    assert_eq!(std::fs::read_to_string(tdir.path().join("b.bc"))?, "module\n");
    Ok(())
}
