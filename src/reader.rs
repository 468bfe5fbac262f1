use std::path::{Path, PathBuf};

use glam::{DVec3, Vec3};

use crate::cell::CellParameters;
use crate::error::{Error, Result};
use crate::store::{Input, RawFrame};
use crate::{engine, Atom, Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Frames can be read.
    Open,
    /// Every frame has been read. Further reads keep returning `Ok(None)`.
    Exhausted,
    /// The file has been released. Every operation fails with [`Error::UseAfterClose`].
    Closed,
}

/// Reads the frames of an Amber NetCDF trajectory in order.
#[derive(Debug)]
pub struct NcReader {
    path: PathBuf,
    input: Option<Input>,
    state: ReaderState,
    /// Index of the next frame.
    cursor: usize,
    nframes: usize,
    natoms: usize,
    has_cell: bool,
    atoms: Vec<Atom>,
}

impl NcReader {
    /// Opens a trajectory for reading.
    ///
    /// The frame and atom counts are taken from the `coordinates` variable when the file is
    /// opened.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if there is no file at `path` and with [`Error::Format`] if
    /// the file is not a NetCDF file or has no `coordinates` variable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        engine::available()?;
        let path = path.as_ref();
        let input = Input::open(path)?;

        let layout = *input.layout();
        log::info!(
            "opened '{}': {} frames of {} atoms, {}",
            path.display(),
            layout.nframes,
            layout.natoms,
            if layout.has_cell { "with cell" } else { "without cell" }
        );

        Ok(Self {
            path: path.to_path_buf(),
            input: Some(input),
            state: ReaderState::Open,
            cursor: 0,
            nframes: layout.nframes,
            natoms: layout.natoms,
            has_cell: layout.has_cell,
            atoms: vec![Atom::default(); layout.natoms],
        })
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            ReaderState::Closed => Err(Error::UseAfterClose),
            _ => Ok(()),
        }
    }

    /// Whether another frame can be read, moving to [`ReaderState::Exhausted`] if not.
    fn has_next(&mut self) -> Result<bool> {
        match self.state {
            ReaderState::Closed => Err(Error::UseAfterClose),
            ReaderState::Exhausted => Ok(false),
            ReaderState::Open if self.cursor < self.nframes => Ok(true),
            ReaderState::Open => {
                log::debug!("reached the end of '{}'", self.path.display());
                self.state = ReaderState::Exhausted;
                Ok(false)
            }
        }
    }

    /// Reads the frame at the cursor and advances the cursor by one.
    ///
    /// Returns `Ok(None)` once all frames have been read, and keeps doing so on later calls.
    /// A frame whose stored cell is invalid is still consumed, so the following call moves on
    /// to the next frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.has_next()? {
            return Ok(None);
        }
        let idx = self.cursor;
        let raw = self.input()?.read(idx)?;
        self.cursor += 1;
        decode(raw, idx).map(Some)
    }

    /// Advances the cursor by one without decoding the frame.
    ///
    /// Returns `false` if there was no frame left to skip.
    pub fn skip_frame(&mut self) -> Result<bool> {
        if !self.has_next()? {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }

    fn input(&self) -> Result<&Input> {
        self.input.as_ref().ok_or(Error::UseAfterClose)
    }

    /// A convenience function to read all remaining frames in a trajectory.
    pub fn read_all_frames(&mut self) -> Result<Vec<Frame>> {
        self.by_ref().collect()
    }

    /// Closes the file. Every later operation fails with [`Error::UseAfterClose`].
    pub fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.input = None;
        self.atoms = Vec::new();
        self.state = ReaderState::Closed;
        log::debug!("closed '{}'", self.path.display());
        Ok(())
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn nframes(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.nframes)
    }

    pub fn natoms(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.natoms)
    }

    /// The index of the next frame to be read.
    pub fn cursor(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.cursor)
    }

    pub fn has_cell(&self) -> Result<bool> {
        self.check_open()?;
        Ok(self.has_cell)
    }

    /// Placeholder identities for the atoms, see [`Atom`].
    pub fn atoms(&self) -> Result<&[Atom]> {
        self.check_open()?;
        Ok(&self.atoms)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn handle(&self) -> Option<&std::fs::File> {
        self.input.as_ref().map(Input::handle)
    }
}

/// Turns a stored frame into a [`Frame`]. Time falls back to the frame index.
fn decode(raw: RawFrame, idx: usize) -> Result<Frame> {
    let positions = raw.coordinates.chunks_exact(3).map(Vec3::from_slice).collect();
    let cell = match raw.cell {
        Some((lengths, angles)) => {
            let params = CellParameters {
                lengths: DVec3::from_array(lengths),
                angles: DVec3::from_array(angles),
            };
            Some(params.to_matrix()?)
        }
        None => None,
    };
    Ok(Frame {
        time: raw.time.unwrap_or(idx as f32),
        positions,
        cell,
    })
}

impl Iterator for NcReader {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
