//! Partially typed problem context.
//!
//! The overview lists and the task/change tree are typed so the workflow can
//! validate them. Any other key an agent stores survives untouched in
//! [`ProblemContext::extra`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemContext {
    #[serde(
        rename = "directoryOverview",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub directory_overview: Vec<DirectoryOverview>,
    #[serde(
        rename = "vendorOverview",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub vendor_overview: Vec<VendorOverview>,
    #[serde(rename = "fileSources", default, skip_serializing_if = "Vec::is_empty")]
    pub file_sources: Vec<FileSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Tasks keyed by task number, iterated in ascending order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<u32, Task>,
    /// Composite keys (`"{task}_{path}"`) of changes already applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implemented_changes: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryOverview {
    pub src: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOverview {
    pub package: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSource {
    pub src: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_developer_id: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "TaskChanges::is_empty")]
    pub changes: TaskChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Raw change type; parsed with [`ChangeType::from_str`] when applied.
    pub change_type: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    #[serde(default)]
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    New,
    Change,
    Delete,
}

impl ChangeType {
    pub const NAMES: [&'static str; 3] = ["new", "change", "delete"];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::New => "new",
            ChangeType::Change => "change",
            ChangeType::Delete => "delete",
        }
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(ChangeType::New),
            "change" => Ok(ChangeType::Change),
            "delete" => Ok(ChangeType::Delete),
            other => Err(format!("invalid change type: {other}")),
        }
    }
}

/// File-path keyed changes of one task, in insertion order.
///
/// Serialized as a JSON object; entry order in the document is the
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    entries: Vec<(String, Change)>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &str) -> Option<&Change> {
        self.entries
            .iter()
            .find(|(key, _)| key == path)
            .map(|(_, change)| change)
    }

    /// Replace an existing entry in place or append a new one.
    pub fn upsert(&mut self, path: &str, change: Change) {
        match self.entries.iter_mut().find(|(key, _)| key == path) {
            Some((_, existing)) => *existing = change,
            None => self.entries.push((path.to_string(), change)),
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<Change> {
        let idx = self.entries.iter().position(|(key, _)| key == path)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.entries
            .iter()
            .map(|(path, change)| (path.as_str(), change))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Change> {
        self.entries.iter_mut().map(|(_, change)| change)
    }
}

impl Serialize for TaskChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, change) in &self.entries {
            map.serialize_entry(path, change)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaskChanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChangesVisitor;

        impl<'de> Visitor<'de> for ChangesVisitor {
            type Value = TaskChanges;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of file path to change")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut changes = TaskChanges::default();
                while let Some((path, change)) = access.next_entry::<String, Change>()? {
                    changes.upsert(&path, change);
                }
                Ok(changes)
            }
        }

        deserializer.deserialize_map(ChangesVisitor)
    }
}

/// Composite key recorded in `implemented_changes`.
pub fn change_key(task_number: u32, file_path: &str) -> String {
    format!("{task_number}_{file_path}")
}

impl ProblemContext {
    /// Replace the overview part (lists and free-form keys), keeping the
    /// task tree and implementation progress.
    pub fn replace_overview(&mut self, overview: ProblemContext) {
        self.directory_overview = overview.directory_overview;
        self.vendor_overview = overview.vendor_overview;
        self.file_sources = overview.file_sources;
        self.notes = overview.notes;
        self.extra = overview.extra;
    }

    pub fn has_overview(&self) -> bool {
        !(self.directory_overview.is_empty()
            && self.vendor_overview.is_empty()
            && self.file_sources.is_empty()
            && self.notes.is_empty())
    }

    pub fn is_implemented(&self, task_number: u32, file_path: &str) -> bool {
        let key = change_key(task_number, file_path);
        self.implemented_changes.iter().any(|k| *k == key)
    }

    /// Record a change as implemented. Returns false when it already was.
    pub fn mark_implemented(&mut self, task_number: u32, file_path: &str) -> bool {
        if self.is_implemented(task_number, file_path) {
            return false;
        }
        self.implemented_changes
            .push(change_key(task_number, file_path));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(kind: &str) -> Change {
        Change {
            change_type: kind.to_string(),
            goal: "goal".to_string(),
            description: "desc".to_string(),
            context: Value::Null,
            approved: false,
        }
    }

    #[test]
    fn task_changes_keep_document_order() {
        let raw = r#"{
            "z.rs": {"change_type": "new", "goal": "g", "description": "d"},
            "a.rs": {"change_type": "delete", "goal": "g", "description": "d"},
            "m.rs": {"change_type": "change", "goal": "g", "description": "d"}
        }"#;
        let changes: TaskChanges = serde_json::from_str(raw).expect("parse changes");
        let paths: Vec<&str> = changes.iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["z.rs", "a.rs", "m.rs"]);

        let text = serde_json::to_string(&changes).expect("serialize");
        let z = text.find("z.rs").expect("z");
        let a = text.find("a.rs").expect("a");
        assert!(z < a, "serialization keeps insertion order");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut changes = TaskChanges::default();
        changes.upsert("a.rs", change("new"));
        changes.upsert("b.rs", change("new"));
        changes.upsert("a.rs", change("delete"));

        let entries: Vec<(&str, &str)> = changes
            .iter()
            .map(|(path, c)| (path, c.change_type.as_str()))
            .collect();
        assert_eq!(entries, vec![("a.rs", "delete"), ("b.rs", "new")]);
        assert!(changes.remove("a.rs").is_some());
        assert!(changes.remove("a.rs").is_none());
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = json!({
            "directoryOverview": [{"src": "src", "purpose": "code"}],
            "tasks": {"2": {"title": "second"}, "1": {"title": "first"}},
            "custom": {"nested": [1, 2, 3]}
        });
        let ctx: ProblemContext = serde_json::from_value(raw).expect("parse context");
        assert_eq!(ctx.directory_overview.len(), 1);
        assert_eq!(ctx.tasks.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ctx.extra["custom"], json!({"nested": [1, 2, 3]}));

        let back = serde_json::to_value(&ctx).expect("serialize");
        let again: ProblemContext = serde_json::from_value(back).expect("reparse");
        assert_eq!(again, ctx);
    }

    #[test]
    fn replace_overview_keeps_tasks_and_progress() {
        let mut ctx = ProblemContext::default();
        ctx.tasks.insert(1, Task::default());
        ctx.mark_implemented(1, "a.rs");
        ctx.notes.push(Note {
            title: "old".to_string(),
            content: "old".to_string(),
        });

        let mut overview = ProblemContext::default();
        overview.file_sources.push(FileSource {
            src: "src/lib.rs".to_string(),
            purpose: "entry".to_string(),
        });
        ctx.replace_overview(overview);

        assert!(ctx.notes.is_empty());
        assert_eq!(ctx.file_sources.len(), 1);
        assert!(ctx.tasks.contains_key(&1));
        assert!(ctx.is_implemented(1, "a.rs"));
    }

    #[test]
    fn mark_implemented_is_idempotent() {
        let mut ctx = ProblemContext::default();
        assert!(ctx.mark_implemented(3, "src/x.rs"));
        assert!(!ctx.mark_implemented(3, "src/x.rs"));
        assert_eq!(ctx.implemented_changes, vec!["3_src/x.rs".to_string()]);
    }

    #[test]
    fn change_type_parses_known_names_only() {
        for name in ChangeType::NAMES {
            assert!(name.parse::<ChangeType>().is_ok());
        }
        let err = "rename".parse::<ChangeType>().unwrap_err();
        assert!(err.contains("rename"));
    }
}
