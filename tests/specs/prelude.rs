//! Shared harness for the behavioral specs

use sm_adapters::MemoryStore;
use sm_core::{Language, Run, RunId, ScriptId, ScriptSpec};
use sm_engine::{Engine, EngineConfig, OutputEvent, OutputReceiver};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub struct SpecHarness {
    dir: TempDir,
    scripts_dir: PathBuf,
    pub store: MemoryStore,
    pub engine: Engine<MemoryStore>,
}

impl SpecHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let scripts_dir = dir.path().join("scripts");
        fs::create_dir_all(&scripts_dir).unwrap();

        let store = MemoryStore::new();
        let engine = Engine::new(
            store.clone(),
            EngineConfig::new(&scripts_dir, dir.path().join("logs")),
        );
        Self {
            dir,
            scripts_dir,
            store,
            engine,
        }
    }

    /// Write a shell script file and register its descriptor
    pub fn shell_script(&self, id: &str, body: &str) -> ScriptSpec {
        let filename = format!("{id}.sh");
        fs::write(self.scripts_dir.join(&filename), body).unwrap();
        let spec = ScriptSpec::new(ScriptId::from(id), id, filename, Language::Shell);
        self.store.put_script(spec.clone());
        spec
    }

    /// Scratch space for gate files and other test fixtures
    pub fn scratch(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Block until the run's output channel is open, then subscribe.
    /// The channel opens before the process spawns, so a receiver
    /// obtained here sees the whole stream.
    pub async fn subscribe_from_start(&self, run_id: &RunId) -> OutputReceiver {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !self.engine.output_open(run_id) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "output channel never opened"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.engine.subscribe(run_id)
    }

    /// Register a descriptor whose file was never written
    pub fn phantom_script(&self, id: &str) -> ScriptSpec {
        let spec = ScriptSpec::new(
            ScriptId::from(id),
            id,
            format!("{id}.sh"),
            Language::Shell,
        );
        self.store.put_script(spec.clone());
        spec
    }

    /// Update a descriptor after mutating it in a test
    pub fn update(&self, spec: &ScriptSpec) {
        self.store.put_script(spec.clone());
    }

    /// Poll the store until the run reaches a terminal status
    pub async fn wait_terminal(&self, run_id: &RunId) -> Run {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(run) = self.engine.run(run_id).await.unwrap() {
                if run.is_finished() {
                    return run;
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "run {run_id} never reached a terminal status"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Collect a subscription to completion, returning the chunk texts.
/// Panics unless the stream ends with exactly one `Done`.
pub async fn collect_chunks(mut rx: OutputReceiver) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut done = 0;
    while let Some(event) = rx.recv().await {
        match event {
            OutputEvent::Chunk(text) => chunks.push(text),
            OutputEvent::Done => done += 1,
        }
    }
    assert_eq!(done, 1, "expected exactly one end-of-stream marker");
    chunks
}
