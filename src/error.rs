use std::path::PathBuf;

use thiserror::Error;

use crate::cell::GeometryError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while writing or reading an Amber NetCDF trajectory.
///
/// Reaching the end of a trajectory is not an error. Sequential reads signal it with
/// `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// libnetcdf is not linked into this build, or it failed to work.
    #[error(
        "the NetCDF library is unavailable: {reason}. \
         Rebuild with `--features {feature}` (it is enabled by default) to read or write .nc trajectories"
    )]
    MissingDependency {
        feature: &'static str,
        reason: String,
    },

    #[error("no trajectory found at '{}'", path.display())]
    NotFound { path: PathBuf },

    /// The file is not a NetCDF file, or it does not follow the Amber layout.
    #[error("format error: {0}")]
    Format(String),

    #[error("atom count mismatch: the trajectory holds {expected} atoms, but {found} were supplied")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("cell geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[cfg(feature = "netcdf-classic")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the trajectory handle has already been closed")]
    UseAfterClose,
}

impl Error {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Map an I/O error from opening `path` onto [`Error::NotFound`] where appropriate.
    pub(crate) fn opening(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            _ => Self::Io(err),
        }
    }
}
