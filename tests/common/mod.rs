#![allow(dead_code)]

use std::path::Path;

use ambernc::{BoxVec, CellParameters, NcWriter, UnitCell};
use glam::Vec3;

/// Deterministic positions for frame `frame` of a trajectory of `natoms` atoms.
pub fn positions(natoms: usize, frame: usize) -> Vec<Vec3> {
    (0..natoms)
        .map(|i| {
            let i = i as f32;
            let t = frame as f32;
            Vec3::new(0.5 * i + t, -0.25 * i, 1.0 / (1.0 + i + t))
        })
        .collect()
}

/// A slightly different triclinic cell for every frame.
pub fn cell(frame: usize) -> CellParameters {
    let f = frame as f64;
    CellParameters::new(
        [20.0 + f, 21.5 - 0.1 * f, 19.0 + 0.3 * f],
        [85.0 + f, 92.5, 101.0 - 0.5 * f],
    )
}

/// Writes `nframes` frames built from [`positions`] and [`cell`] and returns the cell matrices
/// that were written.
pub fn write_trajectory(path: &Path, natoms: usize, nframes: usize) -> ambernc::Result<Vec<BoxVec>> {
    let mut writer = NcWriter::open_or_create(path, natoms)?;
    let mut cells = Vec::new();
    for frame in 0..nframes {
        let h = cell(frame).to_matrix()?;
        writer.append(&positions(natoms, frame), &UnitCell::Matrix(h), None)?;
        cells.push(h);
    }
    writer.close()?;
    Ok(cells)
}

/// Writes a file with only a `coordinates` variable, plus whichever extra record variables
/// are named in `extra` as (frame, 3) doubles.
pub fn write_bare(path: &Path, natoms: usize, nframes: usize, extra: &[&str]) -> ambernc::Result<()> {
    let mut file = netcdf::create_with(path, netcdf::Options::NOCLOBBER)?;
    file.add_unlimited_dimension("frame")?;
    file.add_dimension("spatial", 3)?;
    file.add_dimension("atom", natoms)?;
    file.add_variable::<f32>("coordinates", &["frame", "atom", "spatial"])?;
    for name in extra {
        file.add_variable::<f64>(name, &["frame", "spatial"])?;
    }
    file.enddef()?;

    let mut coordinates = file
        .variable_mut("coordinates")
        .expect("coordinates were just defined");
    for idx in 0..nframes {
        let values: Vec<f32> = positions(natoms, idx)
            .iter()
            .flat_map(|p| p.to_array())
            .collect();
        coordinates.put_values(&values, (idx, .., ..))?;
    }
    drop(coordinates);
    file.close()?;
    Ok(())
}

pub fn assert_close(a: &BoxVec, b: &BoxVec, tolerance: f64) {
    let scale = a.to_cols_array().iter().fold(1.0f64, |m, v| m.max(v.abs()));
    for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
        assert!(
            (x - y).abs() <= tolerance * scale,
            "matrices differ:\n{a}\n{b}"
        );
    }
}
