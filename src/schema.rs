//! The Amber NetCDF trajectory convention: which dimensions, variables and attributes a file
//! carries, and in what order they are declared.
//!
//! Other tools rely on these exact names, dimension orders and units.

pub const CONVENTIONS: &str = "AMBER";
pub const CONVENTION_VERSION: &str = "1.0";
pub const APPLICATION: &str = "AMBER";
pub const PROGRAM: &str = env!("CARGO_PKG_NAME");
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod dim {
    pub const FRAME: &str = "frame";
    pub const SPATIAL: &str = "spatial";
    pub const CELL_SPATIAL: &str = "cell_spatial";
    pub const CELL_ANGULAR: &str = "cell_angular";
    pub const LABEL: &str = "label";
    pub const ATOM: &str = "atom";
}

pub mod var {
    pub const TIME: &str = "time";
    pub const SPATIAL: &str = "spatial";
    pub const COORDINATES: &str = "coordinates";
    pub const CELL_SPATIAL: &str = "cell_spatial";
    pub const CELL_ANGULAR: &str = "cell_angular";
    pub const CELL_LENGTHS: &str = "cell_lengths";
    pub const CELL_ANGLES: &str = "cell_angles";
}

pub mod units {
    pub const PICOSECOND: &str = "picosecond";
    pub const ANGSTROM: &str = "angstrom";
    pub const DEGREE: &str = "degree";
}

/// The length of the `label` dimension, long enough for the longest angle name.
pub const LABEL_LEN: usize = 5;

pub const SPATIAL_LABELS: &[u8; 3] = b"xyz";
pub const CELL_SPATIAL_LABELS: &[u8; 3] = b"abc";
pub const CELL_ANGULAR_LABELS: &[u8; 3 * LABEL_LEN] = b"alphabeta gamma";

#[cfg(feature = "netcdf-classic")]
pub(crate) use self::layout::{check_appendable, define, has_cell, has_time, natoms};
#[cfg(all(test, feature = "netcdf-classic"))]
pub(crate) use self::layout::NcChar;

/// Declaring and checking the layout on a libnetcdf handle.
#[cfg(feature = "netcdf-classic")]
mod layout {
    use std::path::Path;

    use netcdf::types::NcVariableType;
    use netcdf::{File, FileMut, NcTypeDescriptor, Variable};

    use super::{dim, units, var};
    use crate::error::{Error, Result};

    /// One character of a text variable. libnetcdf keeps `NC_CHAR` apart from byte types.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct NcChar(pub u8);

    // SAFETY: a single byte with no padding, matching the size of NC_CHAR.
    unsafe impl NcTypeDescriptor for NcChar {
        fn type_descriptor() -> NcVariableType {
            NcVariableType::Char
        }
    }

    fn text(labels: &[u8]) -> Vec<NcChar> {
        labels.iter().copied().map(NcChar).collect()
    }

    /// Declares a new trajectory for `natoms` atoms, leaves define mode and writes the label
    /// variables.
    ///
    /// `filename` is only recorded as an informational attribute.
    pub fn define(file: &mut FileMut, natoms: usize, filename: &Path) -> Result<()> {
        file.add_attribute("Conventions", super::CONVENTIONS)?;
        file.add_attribute("ConventionVersion", super::CONVENTION_VERSION)?;
        file.add_attribute("application", super::APPLICATION)?;
        file.add_attribute("program", super::PROGRAM)?;
        file.add_attribute("programVersion", super::PROGRAM_VERSION)?;
        file.add_attribute("filename", filename.to_string_lossy().into_owned())?;

        file.add_unlimited_dimension(dim::FRAME)?;
        file.add_dimension(dim::SPATIAL, 3)?;
        file.add_dimension(dim::CELL_SPATIAL, 3)?;
        file.add_dimension(dim::CELL_ANGULAR, 3)?;
        file.add_dimension(dim::LABEL, super::LABEL_LEN)?;
        file.add_dimension(dim::ATOM, natoms)?;

        file.add_variable::<f32>(var::TIME, &[dim::FRAME])?
            .put_attribute("units", units::PICOSECOND)?;
        file.add_variable_with_type(var::SPATIAL, &[dim::SPATIAL], &NcVariableType::Char)?;
        file.add_variable::<f32>(var::COORDINATES, &[dim::FRAME, dim::ATOM, dim::SPATIAL])?
            .put_attribute("units", units::ANGSTROM)?;
        file.add_variable_with_type(
            var::CELL_SPATIAL,
            &[dim::CELL_SPATIAL],
            &NcVariableType::Char,
        )?;
        file.add_variable_with_type(
            var::CELL_ANGULAR,
            &[dim::CELL_ANGULAR, dim::LABEL],
            &NcVariableType::Char,
        )?;
        file.add_variable::<f64>(var::CELL_LENGTHS, &[dim::FRAME, dim::CELL_SPATIAL])?
            .put_attribute("units", units::ANGSTROM)?;
        file.add_variable::<f64>(var::CELL_ANGLES, &[dim::FRAME, dim::CELL_ANGULAR])?
            .put_attribute("units", units::DEGREE)?;
        file.enddef()?;

        for (name, labels) in [
            (var::SPATIAL, &super::SPATIAL_LABELS[..]),
            (var::CELL_SPATIAL, &super::CELL_SPATIAL_LABELS[..]),
            (var::CELL_ANGULAR, &super::CELL_ANGULAR_LABELS[..]),
        ] {
            file.variable_mut(name)
                .ok_or_else(|| Error::format(format!("'{name}' was not defined")))?
                .put_values(&text(labels), ..)?;
        }
        Ok(())
    }

    /// Whether `variable` is laid out as (frame, ...) with fixed trailing dimensions of `shape`.
    fn is_record(variable: &Variable, shape: &[usize]) -> bool {
        match variable.dimensions().split_first() {
            Some((frame, rest)) => {
                frame.is_unlimited()
                    && rest.len() == shape.len()
                    && rest
                        .iter()
                        .zip(shape)
                        .all(|(dim, &len)| !dim.is_unlimited() && (len == 0 || dim.len() == len))
            }
            None => false,
        }
    }

    /// The number of atoms per frame, taken from the shape of `coordinates`.
    ///
    /// Fails unless `coordinates` is laid out as (frame, atom, 3).
    pub fn natoms(file: &File, path: &Path) -> Result<usize> {
        let coordinates = file.variable(var::COORDINATES).ok_or_else(|| {
            Error::format(format!(
                "'{}' has no '{}' variable",
                path.display(),
                var::COORDINATES
            ))
        })?;

        if !is_record(&coordinates, &[0, 3]) {
            return Err(Error::format(format!(
                "'{}' in '{}' must have the dimensions (frame, atom, spatial=3)",
                var::COORDINATES,
                path.display()
            )));
        }
        Ok(coordinates.dimensions()[1].len())
    }

    /// Whether every frame carries a scalar `time`.
    pub fn has_time(file: &File) -> bool {
        file.variable(var::TIME)
            .is_some_and(|time| is_record(&time, &[]))
    }

    /// Whether the trajectory stores a cell for each frame.
    ///
    /// `cell_lengths` and `cell_angles` come as a pair of per-frame triplets. Finding only one of
    /// them is an error.
    pub fn has_cell(file: &File, path: &Path) -> Result<bool> {
        let lengths = record_triplet(file, path, var::CELL_LENGTHS)?;
        let angles = record_triplet(file, path, var::CELL_ANGLES)?;
        match (lengths, angles) {
            (true, true) => Ok(true),
            (false, false) => Ok(false),
            _ => Err(Error::format(format!(
                "'{}' must contain both '{}' and '{}', or neither",
                path.display(),
                var::CELL_LENGTHS,
                var::CELL_ANGLES
            ))),
        }
    }

    fn record_triplet(file: &File, path: &Path, name: &str) -> Result<bool> {
        match file.variable(name) {
            None => Ok(false),
            Some(variable) if is_record(&variable, &[3]) => Ok(true),
            Some(_) => Err(Error::format(format!(
                "'{name}' in '{}' must have the dimensions (frame, 3)",
                path.display()
            ))),
        }
    }

    /// Checks that an existing file can be appended to and returns its atom count.
    pub fn check_appendable(file: &File, path: &Path) -> Result<usize> {
        let natoms = natoms(file, path)?;
        if !has_time(file) {
            return Err(Error::format(format!(
                "'{}' has no per-frame '{}' variable",
                path.display(),
                var::TIME
            )));
        }
        if !has_cell(file, path)? {
            return Err(Error::format(format!(
                "'{}' stores no cell, so frames cannot be appended to it",
                path.display()
            )));
        }
        Ok(natoms)
    }
}
