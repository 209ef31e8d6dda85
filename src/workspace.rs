use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::AppResult;
use crate::time_utils::TIMESTAMP_FORMAT;

/// Filesystem side of event dispatch. Paths are relative to the workspace root.
pub trait Workspace {
    fn exists(&self, path: &Path) -> bool;

    fn append(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// Workspace that writes into a directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for FsWorkspace {
    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }

    fn append(&self, path: &Path, text: &str) -> io::Result<()> {
        let full = self.root.join(path);
        debug!("Appending {} bytes to {}", text.len(), full.display());
        let mut file = OpenOptions::new().append(true).open(full)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }
}

/// Workspace that checks files on disk but only logs appends.
#[derive(Debug, Clone)]
pub struct ReadOnlyWorkspace {
    inner: FsWorkspace,
}

impl ReadOnlyWorkspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            inner: FsWorkspace::new(root),
        }
    }
}

impl Workspace for ReadOnlyWorkspace {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn append(&self, path: &Path, text: &str) -> io::Result<()> {
        info!("[dry run] would append to {}: {}", path.display(), text.trim());
        Ok(())
    }
}

/// Line comment syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* ... */`
    Block,
    /// `# ...`
    Hash,
    /// `-- ...`
    DoubleDash,
    /// `<!-- ... -->`
    Markup,
}

impl CommentStyle {
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("py" | "sh" | "bash" | "zsh" | "rb" | "toml" | "yaml" | "yml" | "pl" | "r") => {
                CommentStyle::Hash
            }
            Some("sql" | "lua" | "hs") => CommentStyle::DoubleDash,
            Some("html" | "htm" | "xml" | "md" | "svg") => CommentStyle::Markup,
            _ => CommentStyle::Block,
        }
    }

    pub fn wrap(&self, body: &str) -> String {
        match self {
            CommentStyle::Block => format!("/* {body} */"),
            CommentStyle::Hash => format!("# {body}"),
            CommentStyle::DoubleDash => format!("-- {body}"),
            CommentStyle::Markup => format!("<!-- {body} -->"),
        }
    }
}

/// The text appended to `path` for an event: a blank-line-separated timestamped comment.
pub fn annotation_block(
    path: &Path,
    timestamp: &OffsetDateTime,
    annotation: &str,
) -> AppResult<String> {
    let stamp = timestamp.format(TIMESTAMP_FORMAT)?;
    let body = format!("{stamp}: {annotation}");
    Ok(format!("\n{}\n", CommentStyle::for_path(path).wrap(&body)))
}
