#![cfg(unix)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use ssh_command::*;

type Lines = Arc<Mutex<Vec<(OutputKind, String)>>>;

fn recorder() -> (Lines, impl Fn(OutputKind, &str) + Send + Sync + 'static) {
    let lines: Lines = Default::default();
    let sink = Arc::clone(&lines);
    (lines, move |kind: OutputKind, line: &str| {
        sink.lock().unwrap().push((kind, line.to_owned()))
    })
}

fn of_kind(lines: &Lines, kind: OutputKind) -> Vec<String> {
    lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, l)| l.clone())
        .collect()
}

#[tokio::test]
async fn streams_both_streams() {
    let (lines, handler) = recorder();
    let output = Process::new("echo one; echo two >&2; echo three")
        .run(handler)
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(output.code(), Some(0));
    assert_eq!(output.stdout, "one\nthree\n");
    assert_eq!(output.stderr, "two\n");

    assert_eq!(of_kind(&lines, OutputKind::Stdout), ["one", "three"]);
    assert_eq!(of_kind(&lines, OutputKind::Stderr), ["two"]);
    assert_eq!(lines.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn last_line_without_newline() {
    let (lines, handler) = recorder();
    let output = Process::new("printf 'a\\r\\nb'").run(handler).await.unwrap();

    assert_eq!(output.stdout, "a\nb\n");
    assert_eq!(of_kind(&lines, OutputKind::Stdout), ["a", "b"]);
}

#[tokio::test]
async fn non_zero_exit_is_not_an_error() {
    let output = Process::new("echo nope >&2; exit 7").output().await.unwrap();
    assert!(!output.success());
    assert_eq!(output.code(), Some(7));
    assert_eq!(output.stderr, "nope\n");
    assert_eq!(output.stdout, "");
}

#[tokio::test]
async fn no_output() {
    let (lines, handler) = recorder();
    let output = Process::new("true").run(handler).await.unwrap();
    assert!(output.success());
    assert!(output.stdout.is_empty() && output.stderr.is_empty());
    assert!(lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stdin_is_closed() {
    let output = Process::new("cat; echo done").output().await.unwrap();
    assert_eq!(output.stdout, "done\n");
}

#[tokio::test]
async fn environment_and_working_directory() {
    let dir = tempfile::tempdir().unwrap();

    let mut process = Process::new("echo \"$GREETING\"; pwd");
    process.env("GREETING", "hello").current_dir(dir.path());
    let output = process.output().await.unwrap();

    let mut lines = output.stdout.lines();
    assert_eq!(lines.next(), Some("hello"));
    let pwd = lines.next().unwrap();
    assert_eq!(
        std::fs::canonicalize(pwd).unwrap(),
        std::fs::canonicalize(dir.path()).unwrap()
    );
}

#[tokio::test]
async fn env_remove() {
    let mut process = Process::new("echo \"[${SSH_COMMAND_TEST_VAR}]\"");
    process
        .envs([("SSH_COMMAND_TEST_VAR", "set")])
        .env_remove("SSH_COMMAND_TEST_VAR");
    let output = process.output().await.unwrap();
    assert_eq!(output.stdout, "[]\n");
}

#[tokio::test]
async fn timeout_kills_process() {
    let mut process = Process::new("echo started; sleep 30; echo finished");
    process.timeout(Some(Duration::from_millis(300)));

    let (lines, handler) = recorder();
    let start = Instant::now();
    let err = process.run(handler).await.unwrap_err();

    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(300)));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(of_kind(&lines, OutputKind::Stdout), ["started"]);
}

#[tokio::test]
async fn finishes_within_timeout() {
    let mut process = Process::new("echo quick");
    process.timeout(Some(Duration::from_secs(30)));
    let output = process.output().await.unwrap();
    assert_eq!(output.stdout, "quick\n");
}

#[tokio::test]
async fn kill_running_process() {
    let mut child = Process::new("sleep 30").spawn(|_, _| {}).unwrap();
    assert_eq!(child.command_line(), "sleep 30");
    assert!(child.id().is_some());

    let start = Instant::now();
    child.kill().await.unwrap();
    assert!(child.id().is_none());

    let output = child.wait().await.unwrap();
    assert!(!output.success());
    assert_eq!(output.code(), None);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn cancel_with_select() {
    let mut child = Process::new("sleep 30").spawn(|_, _| {}).unwrap();

    tokio::select! {
        _ = child.wait() => unreachable!("sleep finished before the cancellation"),
        _ = tokio::time::sleep(Duration::from_millis(200)) => {}
    }

    child.kill().await.unwrap();
    assert!(!child.wait().await.unwrap().success());
}

#[tokio::test]
async fn wait_resumes_after_cancellation() {
    let (lines, handler) = recorder();
    let mut child = Process::new("echo before; sleep 0.5; echo after; echo more")
        .spawn(handler)
        .unwrap();

    tokio::select! {
        _ = child.wait() => unreachable!("process finished before the cancellation"),
        _ = tokio::time::sleep(Duration::from_millis(100)) => {}
    }

    let output = child.wait().await.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout, "before\nafter\nmore\n");
    assert_eq!(of_kind(&lines, OutputKind::Stdout), ["before", "after", "more"]);

    // a finished process keeps reporting the same result
    assert_eq!(child.wait().await.unwrap(), output);
    assert_eq!(lines.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn wait_cancelled_repeatedly() {
    let mut child = Process::new("for i in 1 2 3 4 5; do echo $i; sleep 0.1; done")
        .spawn(|_, _| {})
        .unwrap();

    for _ in 0..5 {
        tokio::select! {
            _ = child.wait() => break,
            _ = tokio::time::sleep(Duration::from_millis(30)) => {}
        }
    }

    let output = child.wait().await.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout, "1\n2\n3\n4\n5\n");
}

#[tokio::test]
async fn timeout_counts_from_spawn() {
    let mut process = Process::new("sleep 30");
    process.timeout(Some(Duration::from_secs(1)));
    let mut child = process.spawn(|_, _| {}).unwrap();

    tokio::select! {
        _ = child.wait() => unreachable!("process finished before the cancellation"),
        _ = tokio::time::sleep(Duration::from_millis(700)) => {}
    }

    let resumed = Instant::now();
    let err = child.wait().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(1)));
    assert!(
        resumed.elapsed() < Duration::from_millis(900),
        "timeout restarted: {:?}",
        resumed.elapsed()
    );
    assert!(child.id().is_none());
}

#[tokio::test]
async fn signal_reaches_process_group() {
    let mut child = Process::new("sleep 30; echo unreachable")
        .spawn(|_, _| {})
        .unwrap();

    child.signal(libc::SIGTERM).unwrap();
    let output = child.wait().await.unwrap();
    assert!(!output.success());
    assert_eq!(output.stdout, "");

    assert!(child.signal(libc::SIGTERM).is_err());
}
