//! Write and read Amber NetCDF trajectories.
//!
//! A trajectory is created for a fixed number of atoms and grows one frame at a time with
//! [`NcWriter`]. Frames are read back strictly in order with [`NcReader`], which signals the end
//! of the trajectory with `Ok(None)`.
//!
//! ```no_run
//! use ambernc::{CellParameters, NcReader, NcWriter, UnitCell};
//! use glam::Vec3;
//!
//! # fn main() -> ambernc::Result<()> {
//! let cell = UnitCell::from(CellParameters::orthorhombic(10.0, 10.0, 10.0));
//! let mut writer = NcWriter::open_or_create("traj.nc", 2)?;
//! writer.append(&[Vec3::ZERO, Vec3::X], &cell, None)?;
//! writer.close()?;
//!
//! let mut reader = NcReader::open("traj.nc")?;
//! while let Some(frame) = reader.next_frame()? {
//!     println!("{} ps: {:?}", frame.time, frame.positions);
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```

use glam::{DMat3, Vec3};

pub use crate::cell::{
    lengths_angles_from_matrix, matrix_from_lengths_angles, CellParameters, GeometryError,
    UnitCell,
};
pub use crate::error::{Error, Result};
pub use crate::reader::{NcReader, ReaderState};
pub use crate::selection::{FrameSelection, Range};
pub use crate::writer::NcWriter;

pub mod adapter;
pub mod cell;
#[cfg(unix)]
pub mod compat;
pub mod engine;
mod error;
pub mod reader;
pub mod schema;
pub mod selection;
mod store;
pub mod writer;

/// A lattice matrix with the cell vectors as its columns, in angstrom.
pub type BoxVec = DMat3;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    /// Time in picoseconds.
    pub time: f32,
    /// Positions in angstrom.
    pub positions: Vec<Vec3>,
    /// The simulation cell, if the trajectory stores one.
    pub cell: Option<BoxVec>,
}

impl Frame {
    pub fn natoms(&self) -> usize {
        self.positions.len()
    }
}

/// The identity of an atom.
///
/// Amber NetCDF trajectories carry no species information, so atoms read from them always
/// have an empty name and zero mass. Such trajectories can be replayed or concatenated, but
/// cannot describe a system on their own.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Atom {
    pub name: String,
    pub mass: f64,
}
