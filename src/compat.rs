//! Descriptor passthrough for hosts that poll their outputs like plain files.
//!
//! The descriptor carries no meaning for the trajectory itself. Nothing in this crate reads or
//! writes through it.

use std::os::fd::{AsRawFd, RawFd};

use crate::adapter::{NcInput, NcOutput};
use crate::NcWriter;

pub trait Fileno {
    /// The descriptor of the open trajectory file, or that of standard output when no file is
    /// open.
    fn fileno(&self) -> RawFd;
}

fn or_stdout(file: Option<&std::fs::File>) -> RawFd {
    file.map(AsRawFd::as_raw_fd)
        .unwrap_or_else(|| std::io::stdout().as_raw_fd())
}

impl Fileno for NcOutput {
    fn fileno(&self) -> RawFd {
        or_stdout(self.writer().and_then(NcWriter::handle))
    }
}

impl Fileno for NcInput {
    fn fileno(&self) -> RawFd {
        or_stdout(self.reader().handle())
    }
}
