use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::SourceId;

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SourceError {
    #[error("source {0} is not registered")]
    #[diagnostic(help("register the file with `SourceMap::intern` before analysing it"))]
    UnknownSource(SourceId),
    #[error("path `{0}` is not registered")]
    UnknownPath(Utf8PathBuf),
}
