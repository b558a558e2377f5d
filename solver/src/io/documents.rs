//! Auxiliary per-problem documents under `<problem dir>/documents/`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SolverError};
use crate::io::problem_store::ProblemStore;

const DOCUMENTS_DIR: &str = "documents";
const BRAINSTORMING_DRAFT: &str = "brainstorming_draft.md";
const CONTEXT_OVERVIEW: &str = "overview.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentCategory {
    /// Agent-authored material such as the brainstorming draft.
    Info,
    /// Rendered context blocks.
    Context,
}

impl DocumentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentCategory::Info => "info",
            DocumentCategory::Context => "context",
        }
    }
}

/// Document files colocated with the problem snapshot, in the directory the
/// problem store assigns to each problem.
#[derive(Clone)]
pub struct ProblemDocumentStore {
    problems: Arc<dyn ProblemStore>,
}

impl ProblemDocumentStore {
    pub fn new(problems: Arc<dyn ProblemStore>) -> Self {
        Self { problems }
    }

    fn category_dir(&self, problem_id: &str, category: DocumentCategory) -> PathBuf {
        self.problems
            .problem_directory(problem_id)
            .join(DOCUMENTS_DIR)
            .join(category.as_str())
    }

    fn document_path(
        &self,
        problem_id: &str,
        category: DocumentCategory,
        name: &str,
    ) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(SolverError::InvalidArgument(format!(
                "invalid document name '{name}'"
            )));
        }
        Ok(self.category_dir(problem_id, category).join(name))
    }

    pub fn save(
        &self,
        problem_id: &str,
        category: DocumentCategory,
        name: &str,
        content: &str,
    ) -> Result<()> {
        let path = self.document_path(problem_id, category, name)?;
        debug!(path = %path.display(), bytes = content.len(), "writing document");
        super::write_atomic(&path, content)
            .map_err(|err| SolverError::store(format!("write {}", path.display()), err))
    }

    pub fn get(
        &self,
        problem_id: &str,
        category: DocumentCategory,
        name: &str,
    ) -> Result<Option<String>> {
        let path = self.document_path(problem_id, category, name)?;
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| SolverError::store(format!("read {}", path.display()), err))
    }

    pub fn exists(&self, problem_id: &str, category: DocumentCategory, name: &str) -> bool {
        self.document_path(problem_id, category, name)
            .is_ok_and(|path| path.is_file())
    }

    /// Document names in one category, sorted.
    pub fn list(&self, problem_id: &str, category: DocumentCategory) -> Result<Vec<String>> {
        let dir = self.category_dir(problem_id, category);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir)
            .map_err(|err| SolverError::store(format!("read {}", dir.display()), err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| SolverError::store(format!("read {}", dir.display()), err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_file() && !name.ends_with(".tmp") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove a document. Returns false when it did not exist.
    pub fn delete(
        &self,
        problem_id: &str,
        category: DocumentCategory,
        name: &str,
    ) -> Result<bool> {
        let path = self.document_path(problem_id, category, name)?;
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .map_err(|err| SolverError::store(format!("remove {}", path.display()), err))?;
        Ok(true)
    }

    pub fn set_brainstorming_draft(&self, problem_id: &str, draft: &str) -> Result<()> {
        self.save(problem_id, DocumentCategory::Info, BRAINSTORMING_DRAFT, draft)
    }

    pub fn brainstorming_draft(&self, problem_id: &str) -> Result<Option<String>> {
        self.get(problem_id, DocumentCategory::Info, BRAINSTORMING_DRAFT)
    }

    /// Cache the rendered context block. Returns false when it was unchanged.
    pub fn store_context_overview(&self, problem_id: &str, rendered: &str) -> Result<bool> {
        let previous = self.get(problem_id, DocumentCategory::Context, CONTEXT_OVERVIEW)?;
        if previous.as_deref() == Some(rendered) {
            return Ok(false);
        }
        self.save(problem_id, DocumentCategory::Context, CONTEXT_OVERVIEW, rendered)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::problem::Problem;
    use crate::io::problem_store::FileProblemStore;

    fn docs_in(dir: &Path) -> ProblemDocumentStore {
        ProblemDocumentStore::new(Arc::new(FileProblemStore::new(dir)))
    }

    /// Keeps every problem under `by-id/<id>` instead of `<id>`.
    struct NestedStore(FileProblemStore);

    impl ProblemStore for NestedStore {
        fn save(&self, problem: &Problem) -> Result<()> {
            self.0.save(problem)
        }

        fn find_by_id(&self, id: &str) -> Result<Option<Problem>> {
            self.0.find_by_id(id)
        }

        fn exists(&self, id: &str) -> bool {
            self.0.exists(id)
        }

        fn list_ids(&self) -> Result<Vec<String>> {
            self.0.list_ids()
        }

        fn problem_directory(&self, id: &str) -> PathBuf {
            self.0.storage_dir().join("by-id").join(id)
        }

        fn last_problem_id(&self) -> Result<Option<String>> {
            self.0.last_problem_id()
        }
    }

    #[test]
    fn draft_slot_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let docs = docs_in(temp.path());

        assert!(docs.brainstorming_draft("P1").expect("get").is_none());
        docs.set_brainstorming_draft("P1", "# Draft").expect("save");
        assert_eq!(
            docs.brainstorming_draft("P1").expect("get").as_deref(),
            Some("# Draft")
        );
        assert!(
            temp.path()
                .join("P1/documents/info/brainstorming_draft.md")
                .is_file()
        );
    }

    #[test]
    fn documents_follow_the_problem_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = NestedStore(FileProblemStore::new(temp.path()));
        let docs = ProblemDocumentStore::new(Arc::new(store));
        docs.set_brainstorming_draft("P1", "d").expect("save");
        assert!(
            temp.path()
                .join("by-id/P1/documents/info/brainstorming_draft.md")
                .is_file()
        );
        assert!(!temp.path().join("P1").exists());
    }

    #[test]
    fn list_and_delete_by_category() {
        let temp = tempfile::tempdir().expect("tempdir");
        let docs = docs_in(temp.path());
        docs.save("P1", DocumentCategory::Info, "b.md", "b").expect("save");
        docs.save("P1", DocumentCategory::Info, "a.md", "a").expect("save");
        docs.save("P1", DocumentCategory::Context, "c.md", "c").expect("save");

        assert_eq!(
            docs.list("P1", DocumentCategory::Info).expect("list"),
            vec!["a.md", "b.md"]
        );
        assert!(docs.delete("P1", DocumentCategory::Info, "a.md").expect("delete"));
        assert!(!docs.delete("P1", DocumentCategory::Info, "a.md").expect("delete"));
        assert!(!docs.exists("P1", DocumentCategory::Info, "a.md"));
        assert!(docs.exists("P1", DocumentCategory::Context, "c.md"));
    }

    #[test]
    fn rejects_names_that_escape_the_category() {
        let temp = tempfile::tempdir().expect("tempdir");
        let docs = docs_in(temp.path());
        let err = docs
            .save("P1", DocumentCategory::Info, "../escape.md", "x")
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn context_overview_reports_changes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let docs = docs_in(temp.path());
        assert!(docs.store_context_overview("P1", "v1").expect("store"));
        assert!(!docs.store_context_overview("P1", "v1").expect("store"));
        assert!(docs.store_context_overview("P1", "v2").expect("store"));
    }
}
