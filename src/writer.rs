use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::cell::UnitCell;
use crate::error::{Error, Result};
use crate::store::{Output, Record};
use crate::{engine, Frame};

/// Appends frames to an Amber NetCDF trajectory.
///
/// Appended frames are held in memory until [`NcWriter::flush`] commits them to the file.
/// Frames already in the file are never rewritten.
#[derive(Debug)]
pub struct NcWriter {
    path: PathBuf,
    output: Option<Output>,
    natoms: usize,
    /// Committed and pending frames.
    nframes: usize,
    pending: Vec<Record>,
}

impl NcWriter {
    /// Opens the trajectory at `path` for appending, or creates it for `natoms` atoms if no
    /// file exists there yet.
    ///
    /// # Errors
    ///
    /// `natoms` must be at least one. An existing file must follow the Amber layout and hold
    /// exactly `natoms` atoms, otherwise this fails with [`Error::Format`] or
    /// [`Error::AtomCountMismatch`].
    pub fn open_or_create<P: AsRef<Path>>(path: P, natoms: usize) -> Result<Self> {
        engine::available()?;
        let path = path.as_ref();
        if natoms == 0 {
            return Err(Error::format("a trajectory needs at least one atom"));
        }

        let output = if path.exists() {
            let (output, expected) = Output::append(path)?;
            if expected != natoms {
                return Err(Error::AtomCountMismatch {
                    expected,
                    found: natoms,
                });
            }
            log::info!(
                "appending to '{}' ({} frames of {natoms} atoms)",
                path.display(),
                output.nframes()
            );
            output
        } else {
            let output = Output::create(path, natoms)?;
            log::info!("created '{}' for {natoms} atoms", path.display());
            output
        };

        Ok(Self {
            path: path.to_path_buf(),
            nframes: output.nframes(),
            output: Some(output),
            natoms,
            pending: Vec::new(),
        })
    }

    /// Appends one frame.
    ///
    /// If `time` is [`None`], the index of the new frame is stored as its time.
    ///
    /// # Errors
    ///
    /// Nothing is appended if the number of positions differs from the atom count of the file,
    /// or if the cell is degenerate.
    pub fn append(&mut self, positions: &[Vec3], cell: &UnitCell, time: Option<f32>) -> Result<()> {
        if self.output.is_none() {
            return Err(Error::UseAfterClose);
        }
        if positions.len() != self.natoms {
            return Err(Error::AtomCountMismatch {
                expected: self.natoms,
                found: positions.len(),
            });
        }
        let params = cell.parameters()?;

        self.pending.push(Record {
            time: time.unwrap_or(self.nframes as f32),
            coordinates: positions.iter().flat_map(|p| p.to_array()).collect(),
            lengths: params.lengths.to_array(),
            angles: params.angles.to_array(),
        });
        self.nframes += 1;
        Ok(())
    }

    /// Appends a frame that was read from another trajectory, keeping its time.
    pub fn append_frame(&mut self, frame: &Frame) -> Result<()> {
        let cell = frame.cell.ok_or_else(|| {
            Error::format(format!(
                "cannot append a frame without a cell to '{}'",
                self.path.display()
            ))
        })?;
        self.append(&frame.positions, &UnitCell::Matrix(cell), Some(frame.time))
    }

    /// Commits all pending frames to the file.
    pub fn flush(&mut self) -> Result<()> {
        let output = self.output.as_mut().ok_or(Error::UseAfterClose)?;
        if self.pending.is_empty() {
            return Ok(());
        }

        output.write(&self.pending)?;
        log::debug!(
            "committed {} frames to '{}', {} in total",
            self.pending.len(),
            self.path.display(),
            output.nframes()
        );
        self.pending.clear();
        Ok(())
    }

    /// Flushes pending frames and closes the file.
    ///
    /// The file is released even if the final flush fails.
    pub fn close(&mut self) -> Result<()> {
        let flushed = self.flush();
        self.pending.clear();
        let closed = match self.output.take() {
            Some(output) => {
                log::debug!("closed '{}'", self.path.display());
                output.close()
            }
            None => Ok(()),
        };
        flushed.and(closed)
    }

    /// The number of frames in the trajectory, including those not yet flushed.
    pub fn nframes(&self) -> usize {
        self.nframes
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.output.is_none()
    }

    pub(crate) fn handle(&self) -> Option<&std::fs::File> {
        self.output.as_ref().map(Output::handle)
    }
}

impl Drop for NcWriter {
    fn drop(&mut self) {
        if self.output.is_some() && !self.pending.is_empty() {
            log::warn!(
                "'{}' was dropped without a flush, discarding {} frames",
                self.path.display(),
                self.pending.len()
            );
        }
    }
}
