//! Brainstorming records under `<problem dir>/brainstorming.json`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::core::types::Brainstorming;
use crate::error::{Result, SolverError};
use crate::io::problem_store::ProblemStore;

const BRAINSTORMING_FILE: &str = "brainstorming.json";

#[derive(Clone)]
pub struct BrainstormingStore {
    problems: Arc<dyn ProblemStore>,
}

impl BrainstormingStore {
    pub fn new(problems: Arc<dyn ProblemStore>) -> Self {
        Self { problems }
    }

    fn record_path(&self, problem_id: &str) -> PathBuf {
        self.problems
            .problem_directory(problem_id)
            .join(BRAINSTORMING_FILE)
    }

    pub fn save(&self, record: &Brainstorming) -> Result<()> {
        let path = self.record_path(&record.problem_id);
        debug!(path = %path.display(), problem_id = %record.problem_id, "writing brainstorming");
        let mut buf = serde_json::to_string_pretty(record)
            .map_err(|err| SolverError::store("serialize brainstorming", err))?;
        buf.push('\n');
        super::write_atomic(&path, &buf)
            .map_err(|err| SolverError::store(format!("write {}", path.display()), err))
    }

    pub fn find(&self, problem_id: &str) -> Result<Option<Brainstorming>> {
        let path = self.record_path(problem_id);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .map_err(|err| SolverError::store(format!("read {}", path.display()), err))?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| SolverError::store(format!("parse {}", path.display()), err))
    }

    pub fn exists(&self, problem_id: &str) -> bool {
        self.record_path(problem_id).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::problem_store::FileProblemStore;
    use serde_json::json;

    #[test]
    fn record_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let problems = Arc::new(FileProblemStore::new(temp.path()));
        let store = BrainstormingStore::new(problems.clone());

        let mut record = Brainstorming::empty("P1");
        record.participants.push("agent".to_string());
        record.context.insert("topic".to_string(), json!("auth"));

        assert!(!store.exists("P1"));
        store.save(&record).expect("save");
        assert!(store.exists("P1"));
        assert_eq!(store.find("P1").expect("find"), Some(record));
        assert!(store.find("P2").expect("find").is_none());
        assert!(problems.problem_directory("P1").join("brainstorming.json").is_file());
    }
}
