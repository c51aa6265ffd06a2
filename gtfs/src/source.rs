use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::PathBuf;

use anyhow::Result;
use zip::ZipArchive;

/// Somewhere the GTFS tables can be read from, by file name (like `stops.txt`)
pub trait FeedSource {
    fn open(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;

    fn contains(&self, name: &str) -> bool;
}

/// An unzipped feed
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        Ok(Self { dir })
    }
}

impl FeedSource for DirectorySource {
    fn open(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        // fs_err puts the path in the error
        let file = fs_err::File::open(self.dir.join(name))?;
        Ok(Box::new(std::io::BufReader::new(file)))
    }

    fn contains(&self, name: &str) -> bool {
        self.dir.join(name).is_file()
    }
}

/// A zipped feed. The tables may be at the root of the archive or inside one directory.
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    fn resolve(&self, name: &str) -> Option<String> {
        let nested = format!("/{name}");
        self.archive
            .file_names()
            .find(|path| *path == name || path.ends_with(&nested))
            .map(|path| path.to_string())
    }
}

impl<R: Read + Seek> FeedSource for ZipSource<R> {
    fn open(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let path = match self.resolve(name) {
            Some(x) => x,
            None => bail!("{name} isn't in the archive"),
        };
        let file = self
            .archive
            .by_name(&path)
            .map_err(|err| anyhow!("{path}: {err}"))?;
        Ok(Box::new(file))
    }

    fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Tables held as strings, for tests or callers that already have the data in memory
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N: Into<String>, C: Into<String>>(&mut self, name: N, contents: C) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.files.remove(name);
    }
}

impl FeedSource for MemorySource {
    fn open(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        match self.files.get(name) {
            Some(contents) => Ok(Box::new(contents.as_bytes())),
            None => bail!("{name} is missing"),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}
