//! Handles on trajectory files held open through libnetcdf.
//!
//! [`Input`] reads frames by index and [`Output`] writes frames past the last committed one.
//! Both keep a plain file handle on the same path, which is only used to report a descriptor.
//! Without libnetcdf the handles cannot be constructed, and opening one reports
//! [`Error::MissingDependency`](crate::Error::MissingDependency).

/// The shape of a trajectory as found when it was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub natoms: usize,
    pub nframes: usize,
    pub has_time: bool,
    pub has_cell: bool,
}

/// One frame as stored, before any geometry conversion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawFrame {
    pub time: Option<f32>,
    /// `[x0, y0, z0, x1, ...]` in angstrom.
    pub coordinates: Vec<f32>,
    /// Cell lengths and angles in angstrom and degrees.
    pub cell: Option<([f64; 3], [f64; 3])>,
}

/// One frame waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Record {
    pub time: f32,
    pub coordinates: Vec<f32>,
    pub lengths: [f64; 3],
    pub angles: [f64; 3],
}

pub(crate) use imp::{Input, Output};

#[cfg(feature = "netcdf-classic")]
mod imp {
    use std::path::{Path, PathBuf};

    use super::{Layout, RawFrame, Record};
    use crate::error::{Error, Result};
    use crate::schema::{self, var};

    /// Opens the plain handle kept next to a NetCDF handle, mapping a missing file to
    /// [`Error::NotFound`].
    fn handle(path: &Path) -> Result<std::fs::File> {
        std::fs::File::open(path).map_err(|err| Error::opening(err, path))
    }

    #[derive(Debug)]
    pub(crate) struct Input {
        file: netcdf::File,
        handle: std::fs::File,
        layout: Layout,
    }

    impl Input {
        /// Opens `path` for reading and checks its layout.
        pub fn open(path: &Path) -> Result<Self> {
            let handle = handle(path)?;
            let file = netcdf::open(path).map_err(|err| {
                Error::format(format!("'{}' is not a NetCDF file: {err}", path.display()))
            })?;

            let natoms = schema::natoms(&file, path)?;
            let has_cell = schema::has_cell(&file, path)?;
            let layout = Layout {
                natoms,
                nframes: file.dimension_len(schema::dim::FRAME).unwrap_or(0),
                has_time: schema::has_time(&file),
                has_cell,
            };
            Ok(Self {
                file,
                handle,
                layout,
            })
        }

        pub fn layout(&self) -> &Layout {
            &self.layout
        }

        /// Reads frame `idx` as stored.
        pub fn read(&self, idx: usize) -> Result<RawFrame> {
            let coordinates = self
                .variable(var::COORDINATES)?
                .get_values::<f32, _>((idx, .., ..))?;
            let time = match self.layout.has_time {
                true => Some(self.variable(var::TIME)?.get_value::<f32, _>(idx)?),
                false => None,
            };
            let cell = match self.layout.has_cell {
                true => Some((
                    self.triplet(var::CELL_LENGTHS, idx)?,
                    self.triplet(var::CELL_ANGLES, idx)?,
                )),
                false => None,
            };
            Ok(RawFrame {
                time,
                coordinates,
                cell,
            })
        }

        fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>> {
            self.file
                .variable(name)
                .ok_or_else(|| Error::format(format!("the '{name}' variable disappeared")))
        }

        fn triplet(&self, name: &str, idx: usize) -> Result<[f64; 3]> {
            let values = self.variable(name)?.get_values::<f64, _>((idx, ..))?;
            <[f64; 3]>::try_from(values.as_slice())
                .map_err(|_| Error::format(format!("'{name}' does not hold 3 values per frame")))
        }

        pub fn handle(&self) -> &std::fs::File {
            &self.handle
        }
    }

    #[derive(Debug)]
    pub(crate) struct Output {
        path: PathBuf,
        file: netcdf::FileMut,
        handle: std::fs::File,
        /// Frames committed to the file so far.
        nframes: usize,
    }

    impl Output {
        /// Creates a new trajectory for `natoms` atoms. Fails if `path` already exists.
        pub fn create(path: &Path, natoms: usize) -> Result<Self> {
            let mut file = netcdf::create_with(path, netcdf::Options::NOCLOBBER)?;
            schema::define(&mut file, natoms, path)?;
            file.sync()?;
            Ok(Self {
                path: path.to_path_buf(),
                handle: handle(path)?,
                file,
                nframes: 0,
            })
        }

        /// Opens an existing trajectory for appending and returns it with its atom count.
        pub fn append(path: &Path) -> Result<(Self, usize)> {
            let handle = handle(path)?;
            let file = netcdf::append(path).map_err(|err| {
                Error::format(format!("'{}' is not a NetCDF file: {err}", path.display()))
            })?;
            let natoms = schema::check_appendable(&file, path)?;
            let nframes = file.dimension_len(schema::dim::FRAME).unwrap_or(0);
            let output = Self {
                path: path.to_path_buf(),
                file,
                handle,
                nframes,
            };
            Ok((output, natoms))
        }

        pub fn nframes(&self) -> usize {
            self.nframes
        }

        /// Writes `records` after the last committed frame and syncs the file.
        pub fn write(&mut self, records: &[Record]) -> Result<()> {
            for record in records {
                let idx = self.nframes;
                self.variable(var::COORDINATES)?
                    .put_values(&record.coordinates, (idx, .., ..))?;
                self.variable(var::CELL_LENGTHS)?
                    .put_values(&record.lengths, (idx, ..))?;
                self.variable(var::CELL_ANGLES)?
                    .put_values(&record.angles, (idx, ..))?;
                self.variable(var::TIME)?.put_value(record.time, idx)?;
                self.nframes += 1;
            }
            self.file.sync()?;
            Ok(())
        }

        fn variable(&mut self, name: &str) -> Result<netcdf::VariableMut<'_>> {
            let path = &self.path;
            self.file.variable_mut(name).ok_or_else(|| {
                Error::format(format!("'{}' has no '{name}' variable", path.display()))
            })
        }

        pub fn close(self) -> Result<()> {
            Ok(self.file.close()?)
        }

        pub fn handle(&self) -> &std::fs::File {
            &self.handle
        }
    }
}

#[cfg(not(feature = "netcdf-classic"))]
mod imp {
    use std::path::Path;

    use super::{Layout, RawFrame, Record};
    use crate::engine::{FEATURE, UNLINKED};
    use crate::error::{Error, Result};

    fn unlinked<T>() -> Result<T> {
        Err(Error::MissingDependency {
            feature: FEATURE,
            reason: UNLINKED.to_string(),
        })
    }

    #[derive(Debug)]
    pub(crate) enum Input {}

    impl Input {
        pub fn open(_path: &Path) -> Result<Self> {
            unlinked()
        }

        pub fn layout(&self) -> &Layout {
            match *self {}
        }

        pub fn read(&self, _idx: usize) -> Result<RawFrame> {
            match *self {}
        }

        pub fn handle(&self) -> &std::fs::File {
            match *self {}
        }
    }

    #[derive(Debug)]
    pub(crate) enum Output {}

    impl Output {
        pub fn create(_path: &Path, _natoms: usize) -> Result<Self> {
            unlinked()
        }

        pub fn append(_path: &Path) -> Result<(Self, usize)> {
            unlinked()
        }

        pub fn nframes(&self) -> usize {
            match *self {}
        }

        pub fn write(&mut self, _records: &[Record]) -> Result<()> {
            match *self {}
        }

        pub fn close(self) -> Result<()> {
            match self {}
        }

        pub fn handle(&self) -> &std::fs::File {
            match *self {}
        }
    }
}
