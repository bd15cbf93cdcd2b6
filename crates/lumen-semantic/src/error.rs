use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("invalid analysis configuration")]
    #[diagnostic(help("options are camelCase keys such as `inferReturns`"))]
    Json(#[from] serde_json::Error),
}
