//! Batch pipeline tests: ordering, failure isolation, output modes, cancellation, notification.

use gaussparse::engine::Progress;
use gaussparse::pipeline::{WorkerContext, run_batch, run_workers};
use gaussparse::report::RunLog;
use gaussparse::{
    BatchError, BatchState, DeliveryError, DiscoveryError, ExtractionError, FailureDetail,
    InputFile, Notifier, NotifyStatus, Opts, OutputMode, ParseOutcome, Record,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Test extractor driven by file content: `FAIL` errors, `PANIC` panics, `NAN` adds a
/// non-finite energy and `SLEEP <ms>` delays.
fn fake_extract(path: &Path) -> Result<Record, ExtractionError> {
    let content = fs::read_to_string(path).map_err(|e| ExtractionError::new(path, e.to_string()))?;
    if content.starts_with("FAIL") {
        return Err(ExtractionError::new(path, "malformed log"));
    }
    if content.starts_with("PANIC") {
        panic!("extractor blew up");
    }
    if let Some(ms) = content.strip_prefix("SLEEP ") {
        std::thread::sleep(Duration::from_millis(ms.trim().parse().unwrap()));
    }
    let mut record = Record::new();
    record
        .insert("file", path.file_name().unwrap().to_string_lossy().into_owned())
        .insert("natoms", content.len());
    if content.starts_with("NAN") {
        record.insert("scf_energies_au", vec![-1.5, f64::NAN]);
    }
    Ok(record)
}

struct Workspace {
    _tmp: TempDir,
    input: PathBuf,
    work: PathBuf,
}

fn workspace(files: &[(&str, &str)]) -> Workspace {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("logs");
    let work = tmp.path().join("work");
    fs::create_dir_all(&input).unwrap();
    fs::create_dir_all(&work).unwrap();
    for (name, content) in files {
        let path = input.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    Workspace {
        _tmp: tmp,
        input,
        work,
    }
}

fn opts(ws: &Workspace, mode: OutputMode, jobs: usize) -> Opts {
    Opts {
        input_dir: ws.input.clone(),
        pattern: "*.log".to_string(),
        mode,
        jobs: Some(jobs),
        info_log: ws.work.join("parsing_info.log"),
        error_log: ws.work.join("parsing_errors.log"),
        progress: false,
        verbose: false,
        notify_url: None,
    }
}

fn combined(ws: &Workspace) -> OutputMode {
    OutputMode::Combined(ws.work.join("out/combined.json"))
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn file_names(doc: &serde_json::Value) -> Vec<String> {
    doc.as_array()
        .unwrap()
        .iter()
        .map(|r| r["file"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_partial_failure_reaches_done_and_logs_one_error() {
    let ws = workspace(&[("a.log", "FAIL"), ("b.log", "bbb"), ("c.log", "cc")]);
    let opts = opts(&ws, combined(&ws), 3);
    let cancel = AtomicBool::new(false);

    let summary = run_batch(&opts, &fake_extract, None, &cancel).unwrap();

    assert_eq!(summary.state, BatchState::Done);
    assert_eq!(
        (summary.discovered, summary.succeeded, summary.failed),
        (3, 2, 1)
    );
    assert!(!summary.cancelled);
    assert_eq!(summary.notify, NotifyStatus::NotConfigured);

    let doc = read_json(&ws.work.join("out/combined.json"));
    assert_eq!(file_names(&doc), ["b.log", "c.log"]);

    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("a.log"));
    assert!(errors.contains("malformed log"));
}

#[test]
fn test_combined_order_follows_discovery_not_completion() {
    // Early names sleep longest, so workers finish in reverse order.
    let ws = workspace(&[
        ("01.log", "SLEEP 120"),
        ("02.log", "SLEEP 80"),
        ("03.log", "FAIL"),
        ("04.log", "SLEEP 40"),
        ("05.log", "SLEEP 0"),
    ]);
    let opts = opts(&ws, combined(&ws), 5);
    run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();

    let doc = read_json(&ws.work.join("out/combined.json"));
    assert_eq!(file_names(&doc), ["01.log", "02.log", "04.log", "05.log"]);
}

#[test]
fn test_combined_output_is_byte_identical_across_runs() {
    let ws = workspace(&[("x.log", "xx"), ("y.log", "FAIL"), ("z.log", "zzz")]);
    let first = ws.work.join("first.json");
    let second = ws.work.join("second.json");
    let cancel = AtomicBool::new(false);
    run_batch(
        &opts(&ws, OutputMode::Combined(first.clone()), 1),
        &fake_extract,
        None,
        &cancel,
    )
    .unwrap();
    run_batch(
        &opts(&ws, OutputMode::Combined(second.clone()), 4),
        &fake_extract,
        None,
        &cancel,
    )
    .unwrap();
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn test_non_finite_numbers_are_written_as_null() {
    let ws = workspace(&[("a.log", "NAN")]);
    let opts = opts(&ws, combined(&ws), 1);
    run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();
    let text = fs::read_to_string(ws.work.join("out/combined.json")).unwrap();
    assert!(!text.contains("NaN"));
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc[0]["scf_energies_au"], serde_json::json!([-1.5, null]));
}

#[test]
fn test_one_worker_and_many_workers_agree() {
    let names: Vec<String> = (0..24).map(|i| format!("f{i:02}.log")).collect();
    let files: Vec<(&str, &str)> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), if i % 5 == 0 { "FAIL" } else { "ok" }))
        .collect();
    let ws = workspace(&files);
    let inputs: Vec<InputFile> = names.iter().map(|n| InputFile::new(&ws.input, n)).collect();
    let log = RunLog::open(&ws.work.join("i.log"), &ws.work.join("e.log")).unwrap();
    let cancel = AtomicBool::new(false);

    let run = |workers: usize| {
        let progress = Progress::hidden(inputs.len());
        let ctx = WorkerContext {
            extractor: &fake_extract,
            log: &log,
            progress: &progress,
            cancel: &cancel,
            quiet_console: true,
        };
        let result = run_workers(&inputs, workers, &ctx);
        assert_eq!(progress.completed(), inputs.len());
        result
    };

    let serial = run(1);
    let parallel = run(8);
    assert_eq!(serial, parallel);
    assert_eq!(serial.len(), inputs.len());
    for (outcome, file) in serial.outcomes.iter().zip(&inputs) {
        assert_eq!(outcome.file(), file);
    }
    assert_eq!(serial.failed(), 5);
}

#[test]
fn test_extractor_panic_is_isolated() {
    let ws = workspace(&[("a.log", "PANIC"), ("b.log", "b"), ("c.log", "c")]);
    let opts = opts(&ws, combined(&ws), 2);
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();
    assert_eq!((summary.succeeded, summary.failed), (2, 1));
    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert!(errors.contains("extractor panicked: extractor blew up"));
}

#[test]
fn test_separate_mode_writes_one_document_per_success() {
    let ws = workspace(&[("a.log", "aa"), ("b.log", "FAIL"), ("c.log", "cc")]);
    let out_dir = ws.work.join("docs");
    let opts = opts(&ws, OutputMode::Separate(out_dir.clone()), 2);
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.documents_written, 2);
    assert_eq!(summary.write_failures, 0);
    let mut written: Vec<String> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, ["a.cclib.json", "c.cclib.json"]);
    assert_eq!(read_json(&out_dir.join("a.cclib.json"))["file"], "a.log");
    assert!(!ws.work.join("out").exists());
}

#[test]
fn test_separate_mode_mirrors_subdirectories() {
    let ws = workspace(&[("one/m.log", "1"), ("two/m.log", "2")]);
    let out_dir = ws.work.join("docs");
    let mut opts = opts(&ws, OutputMode::Separate(out_dir.clone()), 2);
    opts.pattern = "**/*.log".to_string();
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();
    assert_eq!(summary.documents_written, 2);
    assert!(out_dir.join("one/m.cclib.json").is_file());
    assert!(out_dir.join("two/m.cclib.json").is_file());
}

#[test]
fn test_separate_mode_same_stem_keeps_first_and_reports_rest() {
    let ws = workspace(&[("x.log", "1"), ("x.out", "22")]);
    let out_dir = ws.work.join("docs");
    let mut opts = opts(&ws, OutputMode::Separate(out_dir.clone()), 2);
    opts.pattern = "x.*".to_string();
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.documents_written, 1);
    assert_eq!(summary.write_failures, 1);
    // First file in discovery order owns the document.
    assert_eq!(read_json(&out_dir.join("x.cclib.json"))["file"], "x.log");
    assert!(!out_dir.join("x.cclib.json.tmp").exists());

    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("Failed to write document"));
    assert!(errors.contains("x.out"));
}

#[test]
fn test_separate_mode_write_failure_is_isolated() {
    let ws = workspace(&[("a.log", "aa"), ("b.log", "FAIL"), ("c.log", "cc")]);
    let out_dir = ws.work.join("docs");
    // A non-empty directory where a.cclib.json should go makes the final rename fail.
    let blocker = out_dir.join("a.cclib.json");
    fs::create_dir_all(&blocker).unwrap();
    fs::write(blocker.join("keep"), "").unwrap();

    let opts = opts(&ws, OutputMode::Separate(out_dir.clone()), 2);
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.state, BatchState::Done);
    assert_eq!(summary.write_failures, 1);
    assert_eq!(summary.documents_written, 1);
    assert_eq!(read_json(&out_dir.join("c.cclib.json"))["file"], "c.log");
    assert!(blocker.is_dir());
    assert!(!out_dir.join("a.cclib.json.tmp").exists());

    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert_eq!(errors.lines().count(), 2);
    assert!(errors.contains("Failed to write document"));
    assert!(errors.contains("[b.log] failed to parse"));
}

#[test]
fn test_empty_input_writes_empty_array_and_warns() {
    let ws = workspace(&[("notes.txt", "not a log")]);
    let opts = opts(&ws, combined(&ws), 2);
    let summary = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.state, BatchState::Done);
    assert_eq!(summary.discovered, 0);
    assert_eq!(
        fs::read_to_string(ws.work.join("out/combined.json")).unwrap(),
        "[]\n"
    );
    let info = fs::read_to_string(&opts.info_log).unwrap();
    assert!(info.contains(" - WARNING - No files matched '*.log'"));
}

#[test]
fn test_missing_input_dir_is_fatal() {
    let ws = workspace(&[]);
    let mut opts = opts(&ws, combined(&ws), 1);
    opts.input_dir = ws.input.join("nope");
    let err = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap_err();
    assert!(matches!(
        err,
        BatchError::Discovery(DiscoveryError::Missing(_))
    ));
    assert!(!ws.work.join("out/combined.json").exists());
    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert!(errors.contains("Discovery failed"));
}

#[test]
fn test_combined_write_failure_is_fatal() {
    let ws = workspace(&[("a.log", "a")]);
    // Parent of the output is a regular file, so the directory cannot be created.
    let blocker = ws.work.join("blocker");
    fs::write(&blocker, "").unwrap();
    let opts = opts(&ws, OutputMode::Combined(blocker.join("out.json")), 1);
    let err = run_batch(&opts, &fake_extract, None, &AtomicBool::new(false)).unwrap_err();
    assert!(matches!(err, BatchError::Write(_)));
}

#[test]
fn test_cancelled_run_skips_extraction_and_still_writes() {
    let ws = workspace(&[("a.log", "a"), ("b.log", "b")]);
    let calls = AtomicUsize::new(0);
    let counting = |path: &Path| {
        calls.fetch_add(1, Ordering::SeqCst);
        fake_extract(path)
    };
    let opts = opts(&ws, combined(&ws), 2);
    let cancel = AtomicBool::new(true);
    let summary = run_batch(&opts, &counting, None, &cancel).unwrap();

    assert!(summary.cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!((summary.discovered, summary.failed), (2, 2));
    assert_eq!(
        fs::read_to_string(ws.work.join("out/combined.json")).unwrap(),
        "[]\n"
    );
    // Cancelled files are not extraction errors.
    assert_eq!(fs::read_to_string(&opts.error_log).unwrap(), "");
}

#[test]
fn test_cancelled_outcomes_are_tagged() {
    let ws = workspace(&[("a.log", "a")]);
    let inputs = vec![InputFile::new(&ws.input, "a.log")];
    let log = RunLog::open(&ws.work.join("i.log"), &ws.work.join("e.log")).unwrap();
    let progress = Progress::hidden(1);
    let cancel = AtomicBool::new(true);
    let ctx = WorkerContext {
        extractor: &fake_extract,
        log: &log,
        progress: &progress,
        cancel: &cancel,
        quiet_console: true,
    };
    let result = run_workers(&inputs, 1, &ctx);
    assert!(matches!(
        &result.outcomes[0],
        ParseOutcome::Failure {
            detail: FailureDetail::Cancelled,
            ..
        }
    ));
    assert_eq!(result.cancelled(), 1);
}

struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            Err(DeliveryError::Status(500))
        } else {
            Ok(())
        }
    }
}

#[test]
fn test_notification_carries_summary() {
    let ws = workspace(&[("a.log", "a"), ("b.log", "FAIL")]);
    let notifier = RecordingNotifier {
        messages: Mutex::new(Vec::new()),
        fail: false,
    };
    let opts = opts(&ws, combined(&ws), 2);
    let summary = run_batch(&opts, &fake_extract, Some(&notifier), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.notify, NotifyStatus::Sent);
    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Processed 2 files"));
    assert!(messages[0].contains("1 succeeded, 1 failed"));
}

#[test]
fn test_notification_failure_does_not_fail_batch() {
    let ws = workspace(&[("a.log", "a")]);
    let notifier = RecordingNotifier {
        messages: Mutex::new(Vec::new()),
        fail: true,
    };
    let opts = opts(&ws, combined(&ws), 1);
    let summary = run_batch(&opts, &fake_extract, Some(&notifier), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.state, BatchState::Done);
    assert!(matches!(summary.notify, NotifyStatus::Failed(_)));
    let errors = fs::read_to_string(&opts.error_log).unwrap();
    assert!(errors.contains("Failed to send notification"));
}
