//! A once-per-process check that libnetcdf is linked into this build and actually works.

use std::sync::OnceLock;

use crate::error::{Error, Result};

pub(crate) const FEATURE: &str = "netcdf-classic";

/// The reason reported when this build was compiled without libnetcdf.
#[cfg(not(feature = "netcdf-classic"))]
pub(crate) const UNLINKED: &str = "this build of ambernc does not link libnetcdf";

/// Evidence that libnetcdf can define, write and read back a classic dataset in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    _checked: (),
}

static ENGINE: OnceLock<std::result::Result<Engine, String>> = OnceLock::new();

/// Builds a one-record dataset in memory and reads its value back.
#[cfg(feature = "netcdf-classic")]
fn detect() -> std::result::Result<Engine, String> {
    let check = || -> netcdf::Result<f32> {
        let mut file = netcdf::create_with("ambernc-check.nc", netcdf::Options::DISKLESS)?;
        file.add_unlimited_dimension("frame")?;
        file.add_variable::<f32>("time", &["frame"])?;
        file.enddef()?;
        file.variable_mut("time")
            .ok_or("the 'time' variable was not defined")?
            .put_value(0.5f32, 0)?;
        let time = file
            .variable("time")
            .ok_or("the 'time' variable was not defined")?
            .get_value::<f32, _>(0)?;
        file.close()?;
        Ok(time)
    };

    match check() {
        Ok(time) if time == 0.5 => Ok(Engine { _checked: () }),
        Ok(time) => Err(format!("libnetcdf read back {time} instead of 0.5")),
        Err(err) => Err(format!("libnetcdf failed a scratch round trip: {err}")),
    }
}

#[cfg(not(feature = "netcdf-classic"))]
fn detect() -> std::result::Result<Engine, String> {
    Err(UNLINKED.to_string())
}

/// Returns the NetCDF engine, or [`Error::MissingDependency`] if it is not available.
///
/// The check runs once. Later calls return the cached outcome.
pub fn available() -> Result<Engine> {
    let detected = ENGINE.get_or_init(|| {
        let detected = detect();
        match &detected {
            Ok(_) => log::debug!("libnetcdf is linked and working"),
            Err(reason) => log::debug!("NetCDF library unavailable: {reason}"),
        }
        detected
    });

    detected.clone().map_err(|reason| Error::MissingDependency {
        feature: FEATURE,
        reason,
    })
}
