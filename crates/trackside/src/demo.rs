//! Desktop demo launcher.
//!
//! Launches the camera demo as a child process and keeps an eye on it: the
//! child is awaited on a background task and its outcome recorded, so
//! `GET /demos` can report what happened to every launch.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use trackconf::DemoConfig;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Failed to launch demo `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DemoStatus {
    Running,
    Exited { exit_code: Option<i32> },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoLaunch {
    pub launch_id: String,
    pub pid: Option<u32>,
    pub exercise_type: String,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: DemoStatus,
}

/// Finished launches kept for `GET /demos`.
const FINISHED_HISTORY: usize = 32;

pub struct DemoSupervisor {
    program: String,
    script: PathBuf,
    working_dir: PathBuf,
    launches: Arc<DashMap<String, DemoLaunch>>,
}

impl DemoSupervisor {
    pub fn new(cfg: &DemoConfig) -> Self {
        // A relative script is resolved from its own directory once we chdir there
        let script = match (&cfg.working_dir, cfg.script.is_relative(), cfg.script.file_name()) {
            (None, true, Some(name)) => PathBuf::from(name),
            _ => cfg.script.clone(),
        };
        Self {
            program: cfg.program.clone(),
            script,
            working_dir: cfg.resolved_working_dir(),
            launches: Arc::new(DashMap::new()),
        }
    }

    /// Spawn `<program> <script>` with the demo settings in its environment.
    #[tracing::instrument(
        name = "demo.launch",
        skip(self),
        fields(demo.id = tracing::field::Empty)
    )]
    pub fn launch(&self, exercise_type: &str, mode: &str) -> Result<DemoLaunch, DemoError> {
        let mut child = Command::new(&self.program)
            .arg(&self.script)
            .current_dir(&self.working_dir)
            .env("SIH_DEMO_EXERCISE", exercise_type)
            .env("SIH_DEMO_MODE", mode)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| DemoError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let launch = DemoLaunch {
            launch_id: Uuid::new_v4().to_string(),
            pid: child.id(),
            exercise_type: exercise_type.to_string(),
            mode: mode.to_string(),
            started_at: Utc::now(),
            status: DemoStatus::Running,
        };
        tracing::Span::current().record("demo.id", launch.launch_id.as_str());
        tracing::info!(pid = ?launch.pid, script = %self.script.display(), "Demo launched");
        self.launches.insert(launch.launch_id.clone(), launch.clone());
        self.prune_finished(FINISHED_HISTORY);

        let launches = self.launches.clone();
        let id = launch.launch_id.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(exit) => {
                    tracing::info!(demo.id = %id, code = ?exit.code(), "Demo exited");
                    DemoStatus::Exited {
                        exit_code: exit.code(),
                    }
                }
                Err(e) => {
                    tracing::warn!(demo.id = %id, error = %e, "Lost track of demo process");
                    DemoStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            if let Some(mut entry) = launches.get_mut(&id) {
                entry.status = status;
            }
        });

        Ok(launch)
    }

    /// All launches, oldest first.
    pub fn list(&self) -> Vec<DemoLaunch> {
        let mut all: Vec<DemoLaunch> = self.launches.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|l| l.started_at);
        all
    }

    /// Drop the oldest finished launches beyond `keep`. Running launches stay.
    fn prune_finished(&self, keep: usize) -> usize {
        let mut finished: Vec<(DateTime<Utc>, String)> = self
            .launches
            .iter()
            .filter(|e| e.value().status != DemoStatus::Running)
            .map(|e| (e.value().started_at, e.key().clone()))
            .collect();
        if finished.len() <= keep {
            return 0;
        }
        finished.sort();
        let excess = finished.len() - keep;
        for (_, id) in finished.iter().take(excess) {
            self.launches.remove(id);
        }
        tracing::debug!(removed = excess, "Pruned finished demo launches");
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    /// A `sh` script that records its environment and exits with `code`.
    fn script_config(dir: &TempDir, code: i32) -> DemoConfig {
        let script = dir.path().join("demo.sh");
        std::fs::write(
            &script,
            format!("echo \"$SIH_DEMO_EXERCISE $SIH_DEMO_MODE\" > env.txt\nexit {code}\n"),
        )
        .unwrap();
        DemoConfig {
            program: "sh".to_string(),
            script,
            working_dir: None,
        }
    }

    async fn wait_for_exit(supervisor: &DemoSupervisor, id: &str) -> DemoLaunch {
        for _ in 0..200 {
            if let Some(launch) = supervisor.launches.get(id).map(|e| e.value().clone()) {
                if launch.status != DemoStatus::Running {
                    return launch;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("demo {id} never finished");
    }

    #[tokio::test]
    async fn test_launch_records_exit() {
        let dir = TempDir::new().unwrap();
        let supervisor = DemoSupervisor::new(&script_config(&dir, 3));

        let launch = supervisor.launch("squat", "quick").unwrap();
        assert!(launch.pid.is_some());
        assert_eq!(launch.status, DemoStatus::Running);

        let done = wait_for_exit(&supervisor, &launch.launch_id).await;
        assert_eq!(done.status, DemoStatus::Exited { exit_code: Some(3) });

        // Runs in the script's directory with the demo env
        let env = std::fs::read_to_string(dir.path().join("env.txt")).unwrap();
        assert_eq!(env.trim(), "squat quick");
    }

    #[test]
    fn test_relative_script_runs_from_its_dir() {
        let cfg = DemoConfig {
            script: PathBuf::from("demos/run.py"),
            ..DemoConfig::default()
        };
        let supervisor = DemoSupervisor::new(&cfg);
        assert_eq!(supervisor.script, PathBuf::from("run.py"));
        assert_eq!(supervisor.working_dir, PathBuf::from("demos"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cfg = DemoConfig {
            program: "trackside-no-such-program".to_string(),
            ..DemoConfig::default()
        };
        let supervisor = DemoSupervisor::new(&cfg);
        let err = supervisor.launch("pushup", "full").unwrap_err();
        assert!(err.to_string().contains("trackside-no-such-program"));
        assert!(supervisor.list().is_empty());
    }

    #[tokio::test]
    async fn test_finished_history_is_bounded() {
        let dir = TempDir::new().unwrap();
        let supervisor = DemoSupervisor::new(&script_config(&dir, 0));
        for _ in 0..3 {
            let launch = supervisor.launch("pushup", "full").unwrap();
            wait_for_exit(&supervisor, &launch.launch_id).await;
        }
        assert_eq!(supervisor.list().len(), 3);

        assert_eq!(supervisor.prune_finished(1), 2);
        assert_eq!(supervisor.list().len(), 1);
        assert_eq!(supervisor.prune_finished(1), 0);
    }

    #[tokio::test]
    async fn test_list_serializes_status() {
        let dir = TempDir::new().unwrap();
        let supervisor = DemoSupervisor::new(&script_config(&dir, 0));
        let launch = supervisor.launch("pushup", "full").unwrap();
        wait_for_exit(&supervisor, &launch.launch_id).await;

        let json = serde_json::to_value(supervisor.list()).unwrap();
        assert_eq!(json[0]["status"], "exited");
        assert_eq!(json[0]["exit_code"], 0);
        assert_eq!(json[0]["exercise_type"], "pushup");
    }
}
