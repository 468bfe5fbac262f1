//! Inspect, dump and concatenate Amber NetCDF trajectories.
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ambernc::adapter::{LengthUnit, NcInput, NcOutput, Sink, Source, Units};
use ambernc::{CellParameters, Error, FrameSelection, NcReader, Result};
use clap::{Parser, Subcommand};
use glam::DVec3;
use log::LevelFilter;

mod logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log more. Repeat for even more detail.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Warn,
            (false, 1) => LevelFilter::Info,
            (false, 2) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the layout of a trajectory: attributes, dimensions, variables, and the number of
    /// frames and atoms.
    Info {
        /// Input path (nc).
        input: PathBuf,
    },

    /// Print the selected frames as text.
    Dump {
        /// Input path (nc).
        input: PathBuf,

        /// Frame selection in the format `start:stop:step`. Each of these values optional.
        ///
        /// - `:100` will select the first 100 frames.
        ///
        /// - `3:14` will select the 4th up to and including the 14th frames, 11 frames in total.
        ///
        /// - `:100:2` will select every second frame from the first 100 frames, 50 in total.
        #[arg(short, long)]
        frame_selection: Option<FrameSelection>,

        /// The unit to print positions and cell lengths in.
        #[arg(long, value_enum, default_value_t)]
        length_unit: LengthUnit,
    },

    /// Concatenate trajectories into one.
    ///
    /// Frames are appended to the output if it already exists. All inputs must hold the same
    /// number of atoms as the output, and every frame must have a cell. Times are not carried
    /// over: each frame is stored with its index in the output as its time.
    Cat {
        /// Input paths (nc).
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output path (nc).
        #[arg(short, long)]
        output: PathBuf,

        /// Frame selection applied to each input, in the format `start:stop:step`.
        #[arg(short, long)]
        frame_selection: Option<FrameSelection>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.level()) {
        eprintln!("could not set up logging: {err}");
    }

    let result = match cli.command {
        Command::Info { input } => info(&input),
        Command::Dump {
            input,
            frame_selection,
            length_unit,
        } => dump(&input, &frame_selection.unwrap_or_default(), length_unit),
        Command::Cat {
            inputs,
            output,
            frame_selection,
        } => cat(&inputs, &output, &frame_selection.unwrap_or_default()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "netcdf-classic")]
fn info(input: &Path) -> Result<()> {
    use netcdf::types::{FloatType, IntType, NcVariableType};
    use netcdf::AttributeValue;

    fn show(value: AttributeValue) -> String {
        match value {
            AttributeValue::Str(text) => format!("\"{text}\""),
            other => format!("{other:?}"),
        }
    }

    fn type_name(vartype: &NcVariableType) -> String {
        match vartype {
            NcVariableType::Char => "char".to_string(),
            NcVariableType::Int(IntType::I8) => "byte".to_string(),
            NcVariableType::Int(IntType::I16) => "short".to_string(),
            NcVariableType::Int(IntType::I32) => "int".to_string(),
            NcVariableType::Float(FloatType::F32) => "float".to_string(),
            NcVariableType::Float(FloatType::F64) => "double".to_string(),
            other => format!("{other:?}"),
        }
    }

    ambernc::engine::available()?;
    if !input.exists() {
        return Err(Error::NotFound {
            path: input.to_path_buf(),
        });
    }
    let file = netcdf::open(input).map_err(|err| {
        Error::Format(format!("'{}' is not a NetCDF file: {err}", input.display()))
    })?;
    let mut out = std::io::stdout().lock();

    writeln!(out, "{}:", input.display())?;
    writeln!(out, "global attributes:")?;
    for attr in file.attributes() {
        writeln!(out, "    {} = {}", attr.name(), show(attr.value()?))?;
    }

    writeln!(out, "dimensions:")?;
    for dim in file.dimensions() {
        match dim.is_unlimited() {
            false => writeln!(out, "    {} = {}", dim.name(), dim.len())?,
            true => writeln!(out, "    {} = UNLIMITED ({} currently)", dim.name(), dim.len())?,
        }
    }

    writeln!(out, "variables:")?;
    for var in file.variables() {
        let dims: Vec<_> = var.dimensions().iter().map(|dim| dim.name()).collect();
        write!(
            out,
            "    {} {}({})",
            type_name(&var.vartype()),
            var.name(),
            dims.join(", ")
        )?;
        match var.attribute_value("units").transpose()? {
            Some(AttributeValue::Str(units)) => writeln!(out, " [{units}]")?,
            _ => writeln!(out)?,
        }
    }
    file.close()?;

    match NcReader::open(input) {
        Ok(mut reader) => {
            writeln!(out, "frames: {}", reader.nframes()?)?;
            writeln!(out, "atoms: {}", reader.natoms()?)?;
            let has_cell = reader.has_cell()?;
            writeln!(out, "cell: {}", if has_cell { "yes" } else { "no" })?;
            reader.close()?;
        }
        Err(err) => log::warn!("not an Amber trajectory: {err}"),
    }

    Ok(())
}

#[cfg(not(feature = "netcdf-classic"))]
fn info(_input: &Path) -> Result<()> {
    ambernc::engine::available().map(drop)
}

fn dump(input: &Path, frame_selection: &FrameSelection, length_unit: LengthUnit) -> Result<()> {
    let mut reader = NcReader::open(input)?;
    let scale = 1.0 / length_unit.in_angstrom();
    let mut out = BufWriter::new(std::io::stdout().lock());

    writeln!(
        out,
        "# {} frames, {} atoms, lengths in {}, angles in degree",
        reader.nframes()?,
        reader.natoms()?,
        length_unit.name()
    )?;
    loop {
        let idx = reader.cursor()?;
        let frame = match frame_selection.is_included(idx) {
            Some(true) => match reader.next_frame()? {
                Some(frame) => frame,
                None => break,
            },
            Some(false) => match reader.skip_frame()? {
                true => continue,
                false => break,
            },
            None => break,
        };

        writeln!(out, "frame {idx} time {:.3} ps", frame.time)?;
        if let Some(cell) = frame.cell {
            let params = CellParameters::from_matrix(&cell)?;
            let [a, b, c] = (params.lengths * scale).to_array();
            let [alpha, beta, gamma] = params.angles.to_array();
            writeln!(
                out,
                "cell {a:.5} {b:.5} {c:.5} {alpha:.3} {beta:.3} {gamma:.3}"
            )?;
        }
        for position in &frame.positions {
            let [x, y, z] = (position.as_dvec3() * scale).to_array();
            writeln!(out, "{x:12.5} {y:12.5} {z:12.5}")?;
        }
    }
    out.flush()?;

    reader.close()
}

fn cat(inputs: &[PathBuf], output: &Path, frame_selection: &FrameSelection) -> Result<()> {
    let mut sink = NcOutput::new(output, Units::default())?;
    let mut total = 0;

    for input in inputs {
        let mut source = NcInput::open(input, Units::default())?;
        let mut idx = 0;
        while let Some(record) = source.read()? {
            let included = frame_selection.is_included(idx);
            idx += 1;
            match included {
                Some(true) => {}
                Some(false) => continue,
                None => break,
            }

            let cell = record.cell.ok_or_else(|| {
                Error::Format(format!("frame {} of '{}' has no cell", idx - 1, input.display()))
            })?;
            let positions: Vec<_> = record
                .positions
                .chunks_exact(3)
                .map(DVec3::from_slice)
                .collect();
            sink.append_cell_matrix(&positions, &cell)?;
            total += 1;
        }
        source.close()?;
        sink.flush()?;
        log::info!("copied frames from '{}'", input.display());
    }

    sink.close()?;
    log::info!("wrote {total} frames to '{}'", output.display());
    Ok(())
}
