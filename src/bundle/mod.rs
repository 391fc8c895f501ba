use std::fmt::{self, Display, Formatter};

use crate::compress::{CompressError, CompressOptions, GlobalDefines};
use crate::error::ParseError;

pub mod graph;
pub mod host;
mod link;

#[cfg(test)]
mod tests;

pub use graph::{ExportBinding, FileState, ImportBinding, SourceFile};
pub use host::{BundleHost, MemoryHost};
pub use link::SplitInfo;

#[derive(Debug)]
pub enum BundleError {
    CannotFindModule { resolved: String },
    Syntax { file: String, error: ParseError },
    Compress(CompressError),
    NoMainSplit,
}

impl Display for BundleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::CannotFindModule { resolved } => {
                write!(f, "Cannot find {}", resolved)
            }
            BundleError::Syntax { file, error } => {
                write!(f, "Syntax error in {}: {:?}", file, error)
            }
            BundleError::Compress(error) => Display::fmt(error, f),
            BundleError::NoMainSplit => {
                write!(f, "bundle configuration has no main split")
            }
        }
    }
}

impl std::error::Error for BundleError {}

impl PartialEq for BundleError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                BundleError::CannotFindModule { resolved: a },
                BundleError::CannotFindModule { resolved: b },
            ) => a == b,
            (BundleError::Syntax { error: a, .. }, BundleError::Syntax { error: b, .. }) => a == b,
            (BundleError::Compress(a), BundleError::Compress(b)) => a == b,
            (BundleError::NoMainSplit, BundleError::NoMainSplit) => true,
            _ => false,
        }
    }
}

/// One output bundle: a short name and its entry files. The first definition
/// passed to the bundler is the main (eagerly loaded) split; the rest are
/// loaded on demand through `__import`.
#[derive(Clone, Debug)]
pub struct SplitDefinition {
    pub name: String,
    pub entry_files: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    pub beautify: bool,
}

pub struct BundleOptions {
    // parts[0] is the main split.
    pub parts: Vec<SplitDefinition>,
    pub global_defines: GlobalDefines,
    pub mangle: bool,
    pub compress: Option<CompressOptions>,
    pub output: OutputOptions,
}

impl Default for BundleOptions {
    fn default() -> BundleOptions {
        BundleOptions {
            parts: Vec::new(),
            global_defines: GlobalDefines::new(),
            mangle: false,
            compress: Some(CompressOptions::default()),
            output: OutputOptions::default(),
        }
    }
}

/// Links the module graph reachable from the configured entries into one or
/// more bundles, writing each through the host.
pub fn bundle(host: &mut dyn BundleHost, options: &BundleOptions) -> Result<(), BundleError> {
    link::run(host, options)
}
