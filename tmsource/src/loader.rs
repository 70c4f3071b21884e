//! Source identifiers and reading their documents.

use std::env;
use std::fmt::Debug;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tmsource_core::location;
use url::Url;

use crate::{TmSourceError, TmSourceResult};

/// URI scheme of source identifiers.
pub const SCHEME: &str = "tmsource";

/// Name of the project document inside a source directory.
pub const DOCUMENT_FILE: &str = "data.yml";

/// A resolved source identifier.
///
/// `tmsource://<host><path>` and plain filesystem paths are accepted. Relative
/// paths are resolved against the working directory. The canonical id is
/// always `tmsource://` followed by the absolute, percent-encoded path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    id: String,
    dir: PathBuf,
}

impl SourceLocation {
    /// Resolve `identifier` against the current working directory.
    pub fn parse(identifier: &str) -> TmSourceResult<Self> {
        let cwd = env::current_dir().map_err(|e| TmSourceError::Io(e, PathBuf::from(".")))?;
        Self::parse_in(identifier, &cwd)
    }

    /// Resolve `identifier`, treating relative paths as relative to `cwd`.
    pub fn parse_in(identifier: &str, cwd: &Path) -> TmSourceResult<Self> {
        let invalid = |reason| TmSourceError::InvalidIdentifier(identifier.to_string(), reason);

        let raw_path = match identifier.split_once("://") {
            Some((scheme, rest)) if scheme == SCHEME => urlencoding::decode(rest)
                .map_err(|_| invalid("the path is not valid UTF-8 once unescaped"))?
                .into_owned(),
            Some(_) => return Err(invalid("only tmsource:// identifiers are supported")),
            None => identifier.to_string(),
        };
        if raw_path.is_empty() {
            return Err(invalid("the path is empty"));
        }

        let dir = if location::is_absolute(&raw_path) {
            lexical_clean(Path::new(&raw_path))
        } else {
            lexical_clean(&cwd.join(&raw_path))
        };

        let mut path = dir.to_string_lossy().replace('\\', "/");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        let mut url = Url::parse(&format!("{SCHEME}:///"))
            .map_err(|_| invalid("unable to build a canonical identifier"))?;
        url.set_path(&path);

        Ok(Self {
            id: url.to_string(),
            dir,
        })
    }

    /// The canonical identifier, also used as the document id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Directory holding the project.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }
}

/// Removes `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    clean
}

/// Reads the raw project document of a source.
#[async_trait]
pub trait DocumentLoader: Send + Sync + Debug {
    async fn read(&self, location: &SourceLocation) -> io::Result<String>;
}

/// Reads `data.yml` from the source directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

#[async_trait]
impl DocumentLoader for FsLoader {
    async fn read(&self, location: &SourceLocation) -> io::Result<String> {
        tokio::fs::read_to_string(location.document_path()).await
    }
}
