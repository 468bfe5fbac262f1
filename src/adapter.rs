//! Frame sinks and sources for a host that works in its own units.
//!
//! The host hands over positions and cells in a [`LengthUnit`] and [`AngleUnit`] of its
//! choosing. [`NcOutput`] and [`NcInput`] convert at the boundary, so the file always holds
//! angstrom and degrees.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use glam::{DMat3, DVec3};

use crate::cell::{lengths_angles_from_matrix, CellParameters, UnitCell};
use crate::error::{Error, Result};
use crate::{engine, NcReader, NcWriter};

/// Accepts frames one at a time.
pub trait Sink {
    /// Appends a frame, with the cell given as `[a, b, c, α, β, γ]`.
    fn append(&mut self, positions: &[DVec3], cell: [f64; 6]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Yields frames one at a time, and `Ok(None)` once there are no more.
pub trait Source {
    fn read(&mut self) -> Result<Option<SourceRecord>>;
    fn close(&mut self) -> Result<()>;
}

/// One frame as handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Names the units of the positions and the cell, e.g. `# positions{angstrom} cell{angstrom}`.
    pub comment: String,
    pub cell: Option<DMat3>,
    /// Positions as `[x0, y0, z0, x1, ...]`.
    pub positions: Vec<f64>,
    /// Always empty names, since the format stores no atom identities.
    pub labels: Vec<String>,
    /// Always zero, since the format stores no atom identities.
    pub masses: Vec<f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LengthUnit {
    #[default]
    Angstrom,
    Nanometer,
    /// The atomic unit of length.
    Bohr,
}

impl LengthUnit {
    /// The size of one unit in angstrom.
    pub const fn in_angstrom(self) -> f64 {
        match self {
            LengthUnit::Angstrom => 1.0,
            LengthUnit::Nanometer => 10.0,
            LengthUnit::Bohr => 0.529_177_210_903,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LengthUnit::Angstrom => "angstrom",
            LengthUnit::Nanometer => "nanometer",
            LengthUnit::Bohr => "bohr",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AngleUnit {
    #[default]
    Degree,
    Radian,
}

impl AngleUnit {
    pub fn to_degrees(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degree => angle,
            AngleUnit::Radian => angle.to_degrees(),
        }
    }
}

/// The units the host exchanges frames in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Units {
    pub length: LengthUnit,
    pub angle: AngleUnit,
}

/// A [`Sink`] that appends to an Amber NetCDF trajectory.
///
/// The file is opened, or created, on the first append. Its atom count is taken from that
/// first frame.
#[derive(Debug)]
pub struct NcOutput {
    path: PathBuf,
    units: Units,
    writer: Option<NcWriter>,
    closed: bool,
}

impl NcOutput {
    /// Prepares output to `path`. Fails right away if libnetcdf is unavailable.
    pub fn new<P: AsRef<Path>>(path: P, units: Units) -> Result<Self> {
        engine::available()?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            units,
            writer: None,
            closed: false,
        })
    }

    /// Appends a frame with the cell given as a lattice matrix in host length units.
    pub fn append_cell_matrix(&mut self, positions: &[DVec3], h: &DMat3) -> Result<()> {
        let scale = self.units.length.in_angstrom();
        let params = lengths_angles_from_matrix(&(*h * scale))?;
        self.append_parameters(positions, params)
    }

    fn append_parameters(&mut self, positions: &[DVec3], params: CellParameters) -> Result<()> {
        let scale = self.units.length.in_angstrom();
        let positions: Vec<_> = positions.iter().map(|&p| (p * scale).as_vec3()).collect();
        self.open(positions.len())?
            .append(&positions, &UnitCell::Parameters(params), None)
    }

    fn open(&mut self, natoms: usize) -> Result<&mut NcWriter> {
        if self.closed {
            return Err(Error::UseAfterClose);
        }
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => NcWriter::open_or_create(&self.path, natoms)?,
        };
        Ok(self.writer.insert(writer))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying writer, once the first frame has been appended.
    pub fn writer(&self) -> Option<&NcWriter> {
        self.writer.as_ref()
    }
}

impl Sink for NcOutput {
    fn append(&mut self, positions: &[DVec3], cell: [f64; 6]) -> Result<()> {
        let [a, b, c, alpha, beta, gamma] = cell;
        let Units { length, angle } = self.units;
        let params = CellParameters {
            lengths: DVec3::new(a, b, c) * length.in_angstrom(),
            angles: DVec3::new(
                angle.to_degrees(alpha),
                angle.to_degrees(beta),
                angle.to_degrees(gamma),
            ),
        };
        self.append_parameters(positions, params)
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::UseAfterClose);
        }
        match &mut self.writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::UseAfterClose);
        }
        self.closed = true;
        match self.writer.take() {
            Some(mut writer) => writer.close(),
            None => Ok(()),
        }
    }
}

/// A [`Source`] that reads an Amber NetCDF trajectory.
#[derive(Debug)]
pub struct NcInput {
    reader: NcReader,
    units: Units,
}

impl NcInput {
    pub fn open<P: AsRef<Path>>(path: P, units: Units) -> Result<Self> {
        engine::available()?;
        Ok(Self {
            reader: NcReader::open(path)?,
            units,
        })
    }

    pub fn reader(&self) -> &NcReader {
        &self.reader
    }
}

impl Source for NcInput {
    fn read(&mut self) -> Result<Option<SourceRecord>> {
        let Some(frame) = self.reader.next_frame()? else {
            return Ok(None);
        };

        let unit = self.units.length;
        let scale = 1.0 / unit.in_angstrom();
        let positions = frame
            .positions
            .iter()
            .flat_map(|p| (p.as_dvec3() * scale).to_array())
            .collect();
        let atoms = self.reader.atoms()?;

        Ok(Some(SourceRecord {
            comment: format!("# positions{{{0}}} cell{{{0}}}", unit.name()),
            cell: frame.cell.map(|h| h * scale),
            positions,
            labels: atoms.iter().map(|atom| atom.name.clone()).collect(),
            masses: atoms.iter().map(|atom| atom.mass).collect(),
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.reader.close()
    }
}
