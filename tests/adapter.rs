#![cfg(feature = "netcdf-classic")]

use std::f64::consts::FRAC_PI_2;

use ambernc::adapter::{AngleUnit, LengthUnit, NcInput, NcOutput, Sink, Source, Units};
use ambernc::{Error, NcReader};
use glam::{DMat3, DVec3, Vec3};

mod common;
use common::assert_close;

const NANOMETER_RADIAN: Units = Units {
    length: LengthUnit::Nanometer,
    angle: AngleUnit::Radian,
};

#[test]
fn sink_converts_to_file_units() -> ambernc::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sink.nc");

    let mut output = NcOutput::new(&path, NANOMETER_RADIAN)?;
    let positions = [DVec3::new(0.1, 0.2, 0.3), DVec3::new(1.0, 0.0, -0.5)];
    output.append(&positions, [2.0, 3.0, 4.0, FRAC_PI_2, FRAC_PI_2, FRAC_PI_2])?;
    output.close()?;

    let mut reader = NcReader::open(&path)?;
    let frame = reader.next_frame()?.expect("one frame was written");
    assert!(frame.positions[0].abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    assert!(frame.positions[1].abs_diff_eq(Vec3::new(10.0, 0.0, -5.0), 1e-6));
    assert_close(
        &frame.cell.expect("the trajectory stores a cell"),
        &DMat3::from_diagonal(DVec3::new(20.0, 30.0, 40.0)),
        1e-12,
    );
    Ok(())
}

#[test]
fn source_converts_to_host_units() -> ambernc::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("source.nc");

    let mut output = NcOutput::new(&path, Units::default())?;
    let h = DMat3::from_cols(
        DVec3::new(30.0, 0.0, 0.0),
        DVec3::new(5.0, 25.0, 0.0),
        DVec3::new(-2.0, 3.0, 20.0),
    );
    output.append_cell_matrix(&[DVec3::new(15.0, -5.0, 2.5)], &h)?;
    output.close()?;

    let mut input = NcInput::open(&path, NANOMETER_RADIAN)?;
    let record = input.read()?.expect("one frame was written");
    assert_eq!(record.comment, "# positions{nanometer} cell{nanometer}");
    for (found, expected) in record.positions.iter().zip([1.5, -0.5, 0.25]) {
        assert!((found - expected).abs() < 1e-6);
    }
    assert_close(&record.cell.expect("the trajectory stores a cell"), &(h * 0.1), 1e-10);
    assert_eq!(record.labels, [""]);
    assert_eq!(record.masses, [0.0]);

    assert!(input.read()?.is_none());
    assert!(input.read()?.is_none());
    input.close()?;
    assert!(matches!(input.read(), Err(Error::UseAfterClose)));
    Ok(())
}

#[test]
fn bohr_cell_matrix() -> ambernc::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bohr.nc");
    let bohr = LengthUnit::Bohr.in_angstrom();

    let units = Units {
        length: LengthUnit::Bohr,
        ..Units::default()
    };
    let mut output = NcOutput::new(&path, units)?;
    let h = DMat3::from_diagonal(DVec3::splat(40.0));
    output.append_cell_matrix(&[DVec3::ONE], &h)?;
    output.close()?;

    let frame = NcReader::open(&path)?
        .next_frame()?
        .expect("one frame was written");
    assert_close(&frame.cell.expect("the trajectory stores a cell"), &(h * bohr), 1e-12);
    assert!(frame.positions[0].abs_diff_eq(Vec3::splat(bohr as f32), 1e-6));
    Ok(())
}

#[test]
fn sink_rejects_changing_atom_counts() -> ambernc::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("changing.nc");
    let cell = [10.0, 10.0, 10.0, 90.0, 90.0, 90.0];

    let mut output = NcOutput::new(&path, Units::default())?;
    output.append(&[DVec3::ZERO; 3], cell)?;
    let err = output.append(&[DVec3::ZERO; 2], cell).unwrap_err();
    assert!(
        matches!(err, Error::AtomCountMismatch { expected: 3, found: 2 }),
        "{err}"
    );
    output.close()?;
    assert!(matches!(output.close(), Err(Error::UseAfterClose)));
    Ok(())
}
