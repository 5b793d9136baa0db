use smep_runtime::{BoxError, CallArgs};
use std::path::{Path, PathBuf};

pub const PATH_CLASS: &str = "pathlib.Path";

/// `pathlib.Path(path)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathObject(pub PathBuf);

impl PathObject {
    pub fn from_args(mut args: CallArgs) -> Result<Self, BoxError> {
        let path: String = args.required_value(0, "path")?;
        args.finish()?;
        Ok(Self(PathBuf::from(path)))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}
