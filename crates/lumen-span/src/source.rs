use std::ops::Index;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use lumen_utils::define_id;

use crate::SourceError;

define_id!(SourceId);

/// Interns file paths into compact [`SourceId`]s.
///
/// Ids are dense and never reused, a path keeps its id for the lifetime
/// of the map even when the file is removed from the analysis.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    paths: IndexSet<Utf8PathBuf>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: impl AsRef<Utf8Path>) -> SourceId {
        let path = path.as_ref();

        match self.paths.get_index_of(path) {
            Some(index) => SourceId::from_usize(index),
            None => {
                let (index, _) = self.paths.insert_full(path.to_owned());
                SourceId::from_usize(index)
            }
        }
    }

    pub fn lookup(&self, path: impl AsRef<Utf8Path>) -> Result<SourceId, SourceError> {
        let path = path.as_ref();

        self.paths
            .get_index_of(path)
            .map(SourceId::from_usize)
            .ok_or_else(|| SourceError::UnknownPath(path.to_owned()))
    }

    pub fn path(&self, source: SourceId) -> Result<&Utf8Path, SourceError> {
        self.paths
            .get_index(source.as_usize())
            .map(Utf8PathBuf::as_path)
            .ok_or(SourceError::UnknownSource(source))
    }

    pub fn contains(&self, source: SourceId) -> bool {
        source.as_usize() < self.paths.len()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Utf8Path)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(index, path)| (SourceId::from_usize(index), path.as_path()))
    }
}

impl Index<SourceId> for SourceMap {
    type Output = Utf8Path;

    fn index(&self, index: SourceId) -> &Self::Output {
        &self.paths[index.as_usize()]
    }
}
