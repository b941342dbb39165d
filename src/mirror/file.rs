use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{MirrorBackend, MirrorError};

/// Mirror stored as one JSON file per key under a directory.
///
/// Writes go to `<key>.json.tmp` first and are renamed over the target, so a
/// crash mid-write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys carry operator-typed DC numbers, so they are percent-encoded; distinct
/// keys always land in distinct files.
fn file_stem(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

#[async_trait]
impl MirrorBackend for FileMirror {
    async fn get(&self, key: &str) -> Result<Option<String>, MirrorError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MirrorError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        if let Err(e) = fs::write(&tmp_path, value).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(MirrorError::OperationFailed(format!(
                "rename to {} failed: {}",
                path.display(),
                e
            )));
        }

        debug!(key, path = %path.display(), "mirror entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), MirrorError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, MirrorError> {
        Ok(fs::try_exists(self.path_for(key)).await?)
    }
}
