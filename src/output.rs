// Snapraid-exporter -- SnapRAID metrics for Prometheus
// Copyright (C) 2024  Laurent Pelecq
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

// Text files read by the node exporter textfile collector.

use log::warn;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

const TEMP_EXTENSION: &str = "tmp";

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("{0}: cannot create directory")]
    CreateDir(PathBuf, #[source] io::Error),
    #[error("{0}: cannot write file")]
    Write(PathBuf, #[source] io::Error),
    #[error("{0}: cannot rename file")]
    Rename(PathBuf, #[source] io::Error),
}

/// Write files atomically in a directory.
///
/// The content is written in a temporary file in the same directory and
/// renamed. A reader never sees a partial file.
#[derive(Debug, Clone)]
pub struct TextfileWriter {
    directory: PathBuf,
}

impl TextfileWriter {
    pub fn new<P>(directory: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn write_file(path: &Path, content: &str) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }

    /// Replace the file and return its path.
    ///
    /// On failure, the previous file is left unchanged.
    pub fn write(&self, file_name: &str, content: &str) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.directory)
            .map_err(|err| WriteError::CreateDir(self.directory.clone(), err))?;
        let path = self.directory.join(file_name);
        let temp_path = self
            .directory
            .join(format!("{file_name}.{TEMP_EXTENSION}"));
        let res = TextfileWriter::write_file(&temp_path, content)
            .map_err(|err| WriteError::Write(temp_path.clone(), err))
            .and_then(|()| {
                fs::rename(&temp_path, &path).map_err(|err| WriteError::Rename(path.clone(), err))
            });
        if res.is_err() && temp_path.exists() {
            if let Err(err) = fs::remove_file(&temp_path) {
                warn!("{}: cannot remove file: {err}", temp_path.display());
            }
        }
        res.map(|()| path)
    }
}

#[cfg(test)]
mod tests {

    use std::fs;

    use super::{TextfileWriter, WriteError};

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("node_exporter").join("textfile");
        let writer = TextfileWriter::new(&directory);
        let path = writer.write("snapraid_diff.prom", "a 1\n").unwrap();
        assert_eq!(directory.join("snapraid_diff.prom"), path);
        assert_eq!("a 1\n", fs::read_to_string(&path).unwrap());
        assert!(!directory.join("snapraid_diff.prom.tmp").exists());
    }

    #[test]
    fn test_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TextfileWriter::new(dir.path());
        writer.write("snapraid_smart.prom", "old 1\n").unwrap();
        let path = writer.write("snapraid_smart.prom", "new 2\n").unwrap();
        assert_eq!("new 2\n", fs::read_to_string(path).unwrap());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(1, names.len());
    }

    #[test]
    fn test_directory_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("file");
        fs::write(&directory, "").unwrap();
        let writer = TextfileWriter::new(&directory);
        assert!(matches!(
            writer.write("snapraid_status.prom", "a 1\n"),
            Err(WriteError::CreateDir(_, _))
        ));
    }

    #[test]
    fn test_rename_failure_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory can't be replaced by a file.
        let target = dir.path().join("snapraid_status.prom");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "").unwrap();
        let writer = TextfileWriter::new(dir.path());
        match writer.write("snapraid_status.prom", "a 1\n") {
            Err(WriteError::Rename(path, _)) => assert_eq!(target, path),
            res => panic!("unexpected result: {res:?}"),
        }
        assert!(!dir.path().join("snapraid_status.prom.tmp").exists());
        assert!(target.join("keep").exists());
    }
}
