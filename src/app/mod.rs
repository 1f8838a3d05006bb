use anyhow::{bail, Result};
use serde_json::Value;

use crate::cli::Cli;
use crate::model::normalize::minimize_playlist;
use crate::model::settings::Settings;
use crate::model::task::Task;
use crate::model::{FetchMode, RawRecord};
use crate::sys::{requirements, store, yt};
use crate::sys::yt::MetadataSource;

pub mod cancel;
pub mod state;

use cancel::Interrupt;
use state::{BatchReport, Failure, TaskOutcome, TaskState};

/// Single task from the positional argument, or every entry of the requirements document.
pub fn resolve_tasks(cli: &Cli) -> Result<Vec<Task>> {
    if cli.all {
        let listed = requirements::load_playlists(&cli.requirements)?;
        if listed.is_empty() {
            bail!(
                "No playlists found in {}. Ensure a '# Playlists' section exists.",
                cli.requirements.display()
            );
        }
        return Ok(listed);
    }

    match cli.playlist.as_deref() {
        Some(arg) => Ok(vec![Task::from_argument(arg)]),
        None => bail!("Provide a PLAYLIST or use --all"),
    }
}

/// A deep record replaces the flat entry only when it carries a description;
/// anything else is taken as a deep fetch that did not really succeed.
pub fn prefer_deep_record(deep: &RawRecord) -> bool {
    deep.get("description")
        .and_then(Value::as_str)
        .is_some_and(|d| !d.is_empty())
}

pub struct Enrichment {
    pub entries: Vec<Value>,
    pub enriched: usize,
    pub interrupted: bool,
}

/// Replaces flat entries with deep records, one at a time, in order.
///
/// The interrupt is checked before each fetch and once it returns; after a
/// cancellation the current and all remaining entries stay flat.
pub async fn enrich_entries(
    source: &dyn MetadataSource,
    flat: Vec<Value>,
    interrupt: &Interrupt,
    progress_every: usize,
) -> Enrichment {
    let mut result = Enrichment {
        entries: Vec::with_capacity(flat.len()),
        enriched: 0,
        interrupted: false,
    };
    let mut pending = flat.into_iter().enumerate();

    for (i, entry) in pending.by_ref() {
        let idx = i + 1;

        if interrupt.is_cancelled() {
            result.interrupted = true;
            result.entries.push(entry);
            break;
        }

        let target = entry
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| entry.get("url").and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let Some(target) = target else {
            result.entries.push(entry);
            continue;
        };

        let full = yt::fetch_video_metadata(source, &target).await;

        if interrupt.is_cancelled() {
            result.interrupted = true;
            result.entries.push(entry);
            break;
        }

        if prefer_deep_record(&full) {
            result.entries.push(Value::Object(full));
            result.enriched += 1;
        } else {
            result.entries.push(entry);
        }

        if idx % progress_every == 0 {
            println!("...processed {} videos", idx);
        }
    }

    result.entries.extend(pending.map(|(_, entry)| entry));
    result
}

/// Runs one task through flat fetch, optional enrichment and save.
pub async fn process_task(
    task: &Task,
    source: &dyn MetadataSource,
    settings: &Settings,
    interrupt: &Interrupt,
) -> TaskOutcome {
    let mut outcome = TaskOutcome::new(&task.name, settings.mode);

    let mut info = yt::fetch_playlist_flat(source, &task.input).await;
    if info.is_empty() {
        outcome.fail(Failure::Fetch);
        return outcome;
    }
    outcome.advance(TaskState::FlatFetched);

    if settings.mode == FetchMode::Full {
        let flat = match info.remove("entries") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };
        log::info!("{}: enriching {} entries", task.name, flat.len());

        interrupt.arm();
        let enrichment = enrich_entries(source, flat, interrupt, settings.progress_every).await;
        interrupt.disarm();

        if enrichment.interrupted {
            println!(
                "\nInterrupted after enriching {} videos; saving partial results...",
                enrichment.enriched
            );
            outcome.interrupted = true;
        }
        log::info!("{}: {} entries enriched", task.name, enrichment.enriched);

        info.insert("entries".to_string(), Value::Array(enrichment.entries));
        outcome.advance(TaskState::Enriched);
    }

    let playlist = minimize_playlist(&info, settings.mode);
    outcome.entries = playlist.entries.len();

    match store::save_playlist(&playlist, &settings.out_dir) {
        Ok(path) => {
            outcome.path = Some(path);
            outcome.advance(TaskState::Saved);
        }
        Err(e) => {
            log::error!("{}: {:#}", task.name, e);
            outcome.fail(Failure::Save(format!("{:#}", e)));
        }
    }

    outcome
}

/// Processes tasks sequentially. Failed tasks are recorded and skipped; an
/// interrupt saves the current playlist and abandons the rest of the batch.
pub async fn run_batch(
    tasks: &[Task],
    source: &dyn MetadataSource,
    settings: &Settings,
    interrupt: &Interrupt,
) -> BatchReport {
    let mut report = BatchReport {
        outcomes: Vec::with_capacity(tasks.len()),
        total_tasks: tasks.len(),
    };

    for task in tasks {
        let outcome = process_task(task, source, settings, interrupt).await;
        let stop = outcome.interrupted;
        report.outcomes.push(outcome);

        if stop {
            log::warn!("Batch interrupted; skipping remaining playlists");
            break;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use clap::Parser;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn flat_playlist(id: &str, count: usize) -> RawRecord {
        let entries: Vec<Value> = (1..=count)
            .map(|i| {
                json!({
                    "id": format!("v{}", i),
                    "title": format!("Video {}", i),
                    "url": format!("https://www.youtube.com/watch?v=v{}", i),
                    "duration": 60 * i,
                })
            })
            .collect();
        record(json!({ "id": id, "title": format!("Playlist {}", id), "entries": entries }))
    }

    fn deep_video(url: &str) -> RawRecord {
        let id = url.rsplit('=').next().unwrap_or_default();
        record(json!({
            "id": id,
            "title": format!("Deep {}", id),
            "fulltitle": format!("Deep {} (full)", id),
            "description": format!("About {}", id),
            "categories": ["Education"],
            "tags": ["lecture"],
            "upload_date": "20240101",
        }))
    }

    /// In-memory extractor. Optionally cancels the interrupt on the nth deep fetch.
    #[derive(Default)]
    struct FakeSource {
        playlists: HashMap<String, RawRecord>,
        failing: Vec<String>,
        no_description: Vec<String>,
        deep_calls: AtomicUsize,
        flat_calls: Mutex<Vec<String>>,
        cancel_on_call: Option<(usize, Interrupt)>,
    }

    impl FakeSource {
        fn with_playlist(mut self, record: RawRecord) -> Self {
            let id = record["id"].as_str().unwrap().to_string();
            self.playlists
                .insert(format!("https://www.youtube.com/playlist?list={}", id), record);
            self
        }
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        async fn flat_playlist(&self, url: &str) -> Result<RawRecord> {
            self.flat_calls.lock().unwrap().push(url.to_string());
            match self.playlists.get(url) {
                Some(record) => Ok(record.clone()),
                None => bail!("playlist does not exist"),
            }
        }

        async fn video(&self, url: &str) -> Result<RawRecord> {
            let call = self.deep_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((n, interrupt)) = &self.cancel_on_call {
                if call == *n {
                    interrupt.interrupt();
                }
            }
            let is = |id: &String| url.ends_with(&format!("={}", id));
            if self.failing.iter().any(is) {
                bail!("video unavailable");
            }
            let mut deep = deep_video(url);
            if self.no_description.iter().any(is) {
                deep.remove("description");
            }
            Ok(deep)
        }
    }

    fn settings(out_dir: &Path, mode: FetchMode) -> Settings {
        Settings {
            mode,
            out_dir: out_dir.to_path_buf(),
            ..Settings::default()
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn deep_record_needs_description() {
        assert!(prefer_deep_record(&record(json!({ "description": "text" }))));
        assert!(!prefer_deep_record(&record(json!({ "description": "" }))));
        assert!(!prefer_deep_record(&record(json!({ "description": null }))));
        assert!(!prefer_deep_record(&record(json!({ "title": "only a title" }))));
        assert!(!prefer_deep_record(&RawRecord::new()));
    }

    #[test]
    fn resolves_single_task_from_argument() {
        let cli = Cli::try_parse_from([
            "ytpl-export",
            "https://www.youtube.com/playlist?list=PLabc",
        ])
        .unwrap();
        let tasks = resolve_tasks(&cli).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "PLabc");
    }

    #[test]
    fn all_without_entries_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let req = dir.path().join("requirements.md");
        fs::write(&req, "# Notes\nnothing here\n").unwrap();

        let cli = Cli::try_parse_from(["ytpl-export", "--all", "--req", req.to_str().unwrap()]).unwrap();
        let err = resolve_tasks(&cli).unwrap_err();
        assert!(err.to_string().contains("No playlists found"));

        let missing = dir.path().join("missing.md");
        let cli = Cli::try_parse_from(["ytpl-export", "--all", "--req", missing.to_str().unwrap()]).unwrap();
        assert!(resolve_tasks(&cli).is_err());
    }

    #[test]
    fn all_reads_requirements_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let req = dir.path().join("requirements.md");
        fs::write(&req, "# Playlists\nAEC = PL123\nPhD = PL456\n").unwrap();

        let cli = Cli::try_parse_from(["ytpl-export", "--all", "--req", req.to_str().unwrap()]).unwrap();
        let tasks = resolve_tasks(&cli).unwrap();
        assert_eq!(tasks, vec![Task::new("AEC", "PL123"), Task::new("PhD", "PL456")]);
    }

    #[tokio::test]
    async fn fast_mode_keeps_flat_entries() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_playlist(flat_playlist("PL1", 3));
        let settings = settings(dir.path(), FetchMode::Fast);

        let outcome = process_task(&Task::from_argument("PL1"), &source, &settings, &Interrupt::new()).await;

        assert_eq!(outcome.state, TaskState::Saved);
        assert_eq!(source.deep_calls.load(Ordering::SeqCst), 0);

        let json = read_json(&dir.path().join("PL1.json"));
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        for entry in entries {
            assert_eq!(entry["categories"], json!([]));
            assert_eq!(entry["tags"], json!([]));
            assert_eq!(entry["fulltitle"], entry["title"]);
        }
        assert_eq!(entries[1]["duration_string"], "2:00");
    }

    #[tokio::test]
    async fn full_mode_enriches_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource {
            failing: vec!["v2".to_string()],
            no_description: vec!["v3".to_string()],
            ..Default::default()
        }
        .with_playlist(flat_playlist("PL1", 4));
        let settings = settings(dir.path(), FetchMode::Full);

        let outcome = process_task(&Task::new("Lectures", "PL1"), &source, &settings, &Interrupt::new()).await;
        assert_eq!(outcome.state, TaskState::Saved);
        assert_eq!(outcome.entries, 4);
        assert!(!outcome.interrupted);

        let json = read_json(&dir.path().join("PL1.json"));
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries[0]["description"], "About v1");
        assert_eq!(entries[0]["fulltitle"], "Deep v1 (full)");
        assert_eq!(entries[0]["tags"], json!(["lecture"]));
        // v2 errors, v3 has no description: both keep their flat data
        assert_eq!(entries[1]["title"], "Video 2");
        assert!(entries[1].get("description").is_none());
        assert_eq!(entries[2]["title"], "Video 3");
        assert_eq!(entries[3]["description"], "About v4");
    }

    #[tokio::test]
    async fn null_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = flat_playlist("PL1", 2);
        raw["entries"].as_array_mut().unwrap().insert(1, Value::Null);
        let source = FakeSource::default().with_playlist(raw);

        let outcome = process_task(
            &Task::from_argument("PL1"),
            &source,
            &settings(dir.path(), FetchMode::Full),
            &Interrupt::new(),
        )
        .await;
        assert_eq!(outcome.entries, 2);
    }

    #[tokio::test]
    async fn interrupt_saves_partial_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let interrupt = Interrupt::new();
        let source = FakeSource {
            cancel_on_call: Some((11, interrupt.clone())),
            ..Default::default()
        }
        .with_playlist(flat_playlist("PL1", 30));
        let settings = settings(dir.path(), FetchMode::Full);

        let tasks = vec![Task::from_argument("PL1"), Task::from_argument("PL2")];
        let report = run_batch(&tasks, &source, &settings, &interrupt).await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.interrupted());
        assert_eq!(report.summary(), "Done. 1/2 playlist(s) saved.");
        assert_eq!(source.flat_calls.lock().unwrap().len(), 1);
        assert_eq!(source.deep_calls.load(Ordering::SeqCst), 11);

        let json = read_json(&dir.path().join("PL1.json"));
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 30);
        let enriched: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.get("description").is_some())
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(enriched, (1..=10).collect::<Vec<_>>());
        for (i, entry) in entries.iter().enumerate().skip(10) {
            assert_eq!(entry["title"], format!("Video {}", i + 1));
            assert!(entry.get("fulltitle").is_none() || entry["fulltitle"] == entry["title"]);
        }
    }

    #[tokio::test]
    async fn interrupt_during_last_fetch_still_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let interrupt = Interrupt::new();
        let source = FakeSource {
            cancel_on_call: Some((3, interrupt.clone())),
            ..Default::default()
        }
        .with_playlist(flat_playlist("PL1", 3))
        .with_playlist(flat_playlist("PL2", 3));
        let settings = settings(dir.path(), FetchMode::Full);

        let tasks = vec![Task::from_argument("PL1"), Task::from_argument("PL2")];
        let report = run_batch(&tasks, &source, &settings, &interrupt).await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].interrupted);
        assert!(report.outcomes[0].to_string().contains("partial"));
        assert!(!interrupt.is_armed());
        // a signal handler that fires now is absorbed instead of exiting
        assert!(interrupt.interrupt());
    }

    #[tokio::test]
    async fn failed_fetch_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_playlist(flat_playlist("PL2", 1));
        let settings = settings(dir.path(), FetchMode::Fast);

        let tasks = vec![Task::new("Gone", "PLmissing"), Task::new("Here", "PL2")];
        let report = run_batch(&tasks, &source, &settings, &Interrupt::new()).await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].to_string(), "✗ Gone: failed to fetch");
        assert!(report.outcomes[1].is_saved());
        assert_eq!(report.summary(), "Done. 1/2 playlist(s) saved.");
    }

    #[tokio::test]
    async fn save_failure_is_reported_per_task() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file in the way").unwrap();
        let source = FakeSource::default().with_playlist(flat_playlist("PL1", 1));

        let outcome = process_task(
            &Task::from_argument("PL1"),
            &source,
            &settings(&blocker, FetchMode::Fast),
            &Interrupt::new(),
        )
        .await;
        assert_eq!(outcome.state, TaskState::Failed);
        assert!(matches!(outcome.failure, Some(Failure::Save(_))));
    }
}
