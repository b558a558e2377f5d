//! Document compilation for the problem context block.
//!
//! The `DocumentCompiler` turns one context source (a directory or a set of
//! files) into text. `render_context` lays the compiled pieces out with
//! minijinja.

use std::fs;
use std::io::Read;
use std::path::Path;

use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::core::context::{FileSource, ProblemContext};
use crate::error::{Result, SolverError};
use crate::io::files::ProjectFiles;

/// One unit of context to compile.
#[derive(Debug, Clone, Copy)]
pub enum ContextSource<'a> {
    Directory { src: &'a str, purpose: &'a str },
    Files { sources: &'a [FileSource] },
}

pub trait DocumentCompiler {
    fn compile(&self, source: &ContextSource<'_>) -> Result<String>;
}

/// Compiles sources straight from the project tree.
#[derive(Debug, Clone)]
pub struct FsDocumentCompiler {
    files: ProjectFiles,
    max_depth: usize,
    max_file_bytes: u64,
}

impl FsDocumentCompiler {
    pub fn new(files: ProjectFiles, max_depth: usize, max_file_bytes: u64) -> Self {
        Self {
            files,
            max_depth,
            max_file_bytes,
        }
    }

    fn directory_tree(&self, src: &str) -> Result<String> {
        let dir = self.files.resolve(src)?;
        if !dir.is_dir() {
            return Ok(format!("{src} (directory not found)"));
        }
        let mut out = format!("{}/\n", src.trim_end_matches('/'));
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry =
                entry.map_err(|err| SolverError::store(format!("walk {}", dir.display()), err))?;
            let indent = "  ".repeat(entry.depth());
            let name = entry.file_name().to_string_lossy();
            let suffix = if entry.file_type().is_dir() { "/" } else { "" };
            out.push_str(&format!("{indent}{name}{suffix}\n"));
        }
        Ok(out.trim_end().to_string())
    }

    fn file_dump(&self, source: &FileSource) -> Result<String> {
        let path = self.files.resolve(&source.src)?;
        let mut out = format!("### `{}`\n\n{}\n\n", source.src, source.purpose);
        if !path.is_file() {
            out.push_str("(file not found)");
            return Ok(out);
        }
        let (content, truncated) = read_bounded(&path, self.max_file_bytes)?;
        let lang = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        out.push_str(&format!("```{lang}\n{}\n```", content.trim_end()));
        if truncated {
            out.push_str(&format!("\n\n(truncated after {} bytes)", self.max_file_bytes));
        }
        Ok(out)
    }
}

impl DocumentCompiler for FsDocumentCompiler {
    fn compile(&self, source: &ContextSource<'_>) -> Result<String> {
        match source {
            ContextSource::Directory { src, .. } => {
                debug!(src = %src, "compiling directory overview");
                self.directory_tree(src)
            }
            ContextSource::Files { sources } => {
                debug!(count = sources.len(), "compiling file sources");
                let parts = sources
                    .iter()
                    .map(|source| self.file_dump(source))
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join("\n\n"))
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn read_bounded(path: &Path, limit: u64) -> Result<(String, bool)> {
    let file = fs::File::open(path)
        .map_err(|err| SolverError::store(format!("open {}", path.display()), err))?;
    let mut bytes = Vec::new();
    file.take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| SolverError::store(format!("read {}", path.display()), err))?;
    let truncated = bytes.len() as u64 > limit;
    if truncated {
        bytes.truncate(limit as usize);
    }
    Ok((String::from_utf8_lossy(&bytes).into_owned(), truncated))
}

const CONTEXT_TEMPLATE: &str = r#"## Problem context
{% if directories %}

### Directories
{% for dir in directories %}

#### `{{ dir.src }}`: {{ dir.purpose }}

```
{{ dir.tree }}
```
{% endfor %}
{% endif %}
{% if vendors %}

### Packages
{% for vendor in vendors %}
- `{{ vendor.package }}`: {{ vendor.purpose }}
{% endfor %}
{% endif %}
{% if files %}

### Files

{{ files }}
{% endif %}
{% for note in notes %}

## Note: {{ note.title }}

{{ note.content }}
{% endfor %}
"#;

#[derive(Debug, Serialize)]
struct DirectoryBlock<'a> {
    src: &'a str,
    purpose: &'a str,
    tree: String,
}

/// Render the overview part of a context as Markdown.
///
/// Returns `None` when the context has no overview entries.
pub fn render_context(
    ctx: &ProblemContext,
    compiler: &dyn DocumentCompiler,
) -> Result<Option<String>> {
    if !ctx.has_overview() {
        return Ok(None);
    }

    let directories = ctx
        .directory_overview
        .iter()
        .map(|dir| {
            let source = ContextSource::Directory {
                src: &dir.src,
                purpose: &dir.purpose,
            };
            Ok(DirectoryBlock {
                src: &dir.src,
                purpose: &dir.purpose,
                tree: compiler.compile(&source)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let files = if ctx.file_sources.is_empty() {
        None
    } else {
        Some(compiler.compile(&ContextSource::Files {
            sources: &ctx.file_sources,
        })?)
    };

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("context", CONTEXT_TEMPLATE)
        .map_err(|err| SolverError::store("parse context template", err))?;
    let template = env
        .get_template("context")
        .map_err(|err| SolverError::store("load context template", err))?;
    let rendered = template
        .render(context! {
            directories => directories,
            vendors => &ctx.vendor_overview,
            files => files,
            notes => &ctx.notes,
        })
        .map_err(|err| SolverError::store("render context", err))?;
    Ok(Some(rendered.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{DirectoryOverview, Note, VendorOverview};

    fn compiler(root: &Path) -> FsDocumentCompiler {
        FsDocumentCompiler::new(ProjectFiles::new(root), 2, 16)
    }

    #[test]
    fn directory_tree_is_sorted_and_skips_hidden_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let files = ProjectFiles::new(temp.path());
        files.write("src/b.rs", "").expect("write");
        files.write("src/a/mod.rs", "").expect("write");
        files.write("src/.hidden", "").expect("write");

        let tree = compiler(temp.path())
            .compile(&ContextSource::Directory {
                src: "src",
                purpose: "code",
            })
            .expect("compile");
        assert_eq!(tree, "src/\n  a/\n    mod.rs\n  b.rs");
    }

    #[test]
    fn large_files_are_truncated() {
        let temp = tempfile::tempdir().expect("tempdir");
        ProjectFiles::new(temp.path())
            .write("big.txt", &"x".repeat(40))
            .expect("write");
        let sources = vec![FileSource {
            src: "big.txt".to_string(),
            purpose: "sample".to_string(),
        }];

        let text = compiler(temp.path())
            .compile(&ContextSource::Files { sources: &sources })
            .expect("compile");
        assert!(text.contains(&"x".repeat(16)));
        assert!(!text.contains(&"x".repeat(17)));
        assert!(text.contains("truncated after 16 bytes"));
    }

    #[test]
    fn empty_overview_renders_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let rendered =
            render_context(&ProblemContext::default(), &compiler(temp.path())).expect("render");
        assert!(rendered.is_none());
    }

    #[test]
    fn context_block_lists_every_section() {
        let temp = tempfile::tempdir().expect("tempdir");
        let files = ProjectFiles::new(temp.path());
        files.write("src/lib.rs", "pub fn run() {}").expect("write");

        let mut ctx = ProblemContext::default();
        ctx.directory_overview.push(DirectoryOverview {
            src: "src".to_string(),
            purpose: "sources".to_string(),
        });
        ctx.vendor_overview.push(VendorOverview {
            package: "serde".to_string(),
            purpose: "serialization".to_string(),
        });
        ctx.file_sources.push(FileSource {
            src: "src/lib.rs".to_string(),
            purpose: "entry point".to_string(),
        });
        ctx.notes.push(Note {
            title: "Auth".to_string(),
            content: "Tokens expire hourly.".to_string(),
        });

        let rendered = render_context(&ctx, &compiler(temp.path()))
            .expect("render")
            .expect("some");
        assert!(rendered.starts_with("## Problem context"));
        assert!(rendered.contains("#### `src`: sources"));
        assert!(rendered.contains("lib.rs"));
        assert!(rendered.contains("- `serde`: serialization"));
        assert!(rendered.contains("```rs\npub fn run() {}\n```"));
        assert!(rendered.contains("## Note: Auth\n\nTokens expire hourly."));
    }
}
