//! Conversions between a lattice matrix and the (a, b, c, α, β, γ) cell description.
//!
//! A lattice matrix is a [`BoxVec`] whose _columns_ are the three cell vectors. The canonical
//! matrix produced by [`matrix_from_lengths_angles`] is upper-triangular: the first vector lies
//! along x and the second lies in the xy-plane.
//!
//! Amber NetCDF files store the angles in degrees. [`matrix_from_lengths_angles`] works in
//! radians, [`lengths_angles_from_matrix`] reports degrees, and [`CellParameters`] always holds
//! degrees. Converting between the two happens here and nowhere else.

use glam::{DMat3, DVec3};
use thiserror::Error;

use crate::BoxVec;

/// A matrix is treated as degenerate when its volume is below this fraction of `a * b * c`.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cell lengths must be positive and finite, found ({0}, {1}, {2})")]
    InvalidLengths(f64, f64, f64),
    #[error("cell angles must be finite and lie strictly between 0 and 180 degrees, found ({0}, {1}, {2})")]
    InvalidAngles(f64, f64, f64),
    #[error("the cell described by these lengths and angles has no volume")]
    ZeroVolume,
    #[error("the lattice matrix is degenerate (determinant {0})")]
    Degenerate(f64),
}

/// Cell lengths in angstrom and cell angles in degrees, as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellParameters {
    /// The lengths (a, b, c).
    pub lengths: DVec3,
    /// The angles (α, β, γ) in degrees.
    pub angles: DVec3,
}

impl CellParameters {
    pub fn new(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        Self {
            lengths: DVec3::from_array(lengths),
            angles: DVec3::from_array(angles),
        }
    }

    /// An orthorhombic cell with the given edge lengths.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self::new([a, b, c], [90.0; 3])
    }

    /// The six parameters as `[a, b, c, α, β, γ]`.
    pub fn to_array(&self) -> [f64; 6] {
        let [a, b, c] = self.lengths.to_array();
        let [alpha, beta, gamma] = self.angles.to_array();
        [a, b, c, alpha, beta, gamma]
    }

    pub fn from_array(params: [f64; 6]) -> Self {
        let [a, b, c, alpha, beta, gamma] = params;
        Self::new([a, b, c], [alpha, beta, gamma])
    }

    /// Builds the canonical lattice matrix for these parameters.
    pub fn to_matrix(&self) -> Result<BoxVec, GeometryError> {
        let radians = self.angles * std::f64::consts::PI / 180.0;
        matrix_from_lengths_angles(self.lengths, radians)
    }

    /// Derives the parameters of a lattice matrix.
    pub fn from_matrix(h: &BoxVec) -> Result<Self, GeometryError> {
        lengths_angles_from_matrix(h)
    }
}

/// A simulation cell in either of its two equivalent representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitCell {
    Matrix(BoxVec),
    Parameters(CellParameters),
}

impl UnitCell {
    pub fn parameters(&self) -> Result<CellParameters, GeometryError> {
        match self {
            UnitCell::Matrix(h) => lengths_angles_from_matrix(h),
            UnitCell::Parameters(params) => {
                // Run the parameters through the construction so that nonsense is rejected
                // before it reaches a file.
                params.to_matrix()?;
                Ok(*params)
            }
        }
    }

    pub fn matrix(&self) -> Result<BoxVec, GeometryError> {
        match self {
            UnitCell::Matrix(h) => Ok(*h),
            UnitCell::Parameters(params) => params.to_matrix(),
        }
    }
}

impl From<BoxVec> for UnitCell {
    fn from(h: BoxVec) -> Self {
        Self::Matrix(h)
    }
}

impl From<CellParameters> for UnitCell {
    fn from(params: CellParameters) -> Self {
        Self::Parameters(params)
    }
}

/// Returns the lengths of the cell vectors and the angles between them, in degrees.
///
/// α is the angle between b and c, β between a and c, and γ between a and b.
///
/// # Errors
///
/// Fails with [`GeometryError`] for matrices with non-finite entries or (near) zero volume.
pub fn lengths_angles_from_matrix(h: &BoxVec) -> Result<CellParameters, GeometryError> {
    let (va, vb, vc) = (h.x_axis, h.y_axis, h.z_axis);
    let lengths = DVec3::new(va.length(), vb.length(), vc.length());
    if !lengths.is_finite() || lengths.min_element() <= 0.0 {
        return Err(GeometryError::InvalidLengths(lengths.x, lengths.y, lengths.z));
    }

    let det = h.determinant();
    if !det.is_finite() || det.abs() <= DEGENERACY_TOLERANCE * lengths.element_product() {
        return Err(GeometryError::Degenerate(det));
    }

    let angle = |u: DVec3, v: DVec3, lu: f64, lv: f64| {
        (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0).acos().to_degrees()
    };
    let angles = DVec3::new(
        angle(vb, vc, lengths.y, lengths.z),
        angle(va, vc, lengths.x, lengths.z),
        angle(va, vb, lengths.x, lengths.y),
    );

    Ok(CellParameters { lengths, angles })
}

/// Constructs the canonical (upper-triangular) lattice matrix from cell lengths and angles.
///
/// The `angles` (α, β, γ) are in radians.
///
/// # Errors
///
/// Fails with [`GeometryError`] when the parameters do not describe a cell with volume.
pub fn matrix_from_lengths_angles(lengths: DVec3, angles: DVec3) -> Result<BoxVec, GeometryError> {
    if !lengths.is_finite() || lengths.min_element() <= 0.0 {
        return Err(GeometryError::InvalidLengths(lengths.x, lengths.y, lengths.z));
    }
    let pi = std::f64::consts::PI;
    if !angles.is_finite() || angles.min_element() <= 0.0 || angles.max_element() >= pi {
        let deg = angles * 180.0 / pi;
        return Err(GeometryError::InvalidAngles(deg.x, deg.y, deg.z));
    }

    let DVec3 { x: a, y: b, z: c } = lengths;
    let DVec3 {
        x: alpha,
        y: beta,
        z: gamma,
    } = angles;

    let (sin_gamma, cos_gamma) = gamma.sin_cos();
    let xy = b * cos_gamma;
    let yy = b * sin_gamma;
    let xz = c * beta.cos();
    let yz = (b * c * alpha.cos() - xy * xz) / yy;
    let zz_squared = c * c - xz * xz - yz * yz;
    if zz_squared <= 0.0 || !zz_squared.is_finite() {
        return Err(GeometryError::ZeroVolume);
    }

    Ok(DMat3::from_cols(
        DVec3::new(a, 0.0, 0.0),
        DVec3::new(xy, yy, 0.0),
        DVec3::new(xz, yz, zz_squared.sqrt()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &BoxVec, b: &BoxVec, tolerance: f64) {
        let scale = a.to_cols_array().iter().fold(1.0f64, |m, v| m.max(v.abs()));
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!(
                (x - y).abs() <= tolerance * scale,
                "matrices differ:\n{a}\n{b}"
            );
        }
    }

    #[test]
    fn cubic() {
        let h = CellParameters::orthorhombic(10.0, 10.0, 10.0).to_matrix().unwrap();
        assert_close(&h, &DMat3::from_diagonal(DVec3::splat(10.0)), 1e-12);

        let params = lengths_angles_from_matrix(&h).unwrap();
        assert!((params.lengths - DVec3::splat(10.0)).abs().max_element() < 1e-12);
        for angle in params.angles.to_array() {
            assert!((angle - 90.0).abs() < 1e-12);
        }
    }

    #[test]
    fn triclinic_round_trip() {
        let h = DMat3::from_cols(
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(2.0, 9.0, 0.0),
            DVec3::new(1.0, 1.5, 8.0),
        );
        let params = CellParameters::from_matrix(&h).unwrap();
        let back = params.to_matrix().unwrap();
        assert_close(&h, &back, 1e-10);
    }

    #[test]
    fn parameters_round_trip() {
        let params = CellParameters::new([23.1, 17.4, 30.0], [71.0, 102.5, 88.2]);
        let h = params.to_matrix().unwrap();
        let back = CellParameters::from_matrix(&h).unwrap();
        assert!((params.lengths - back.lengths).abs().max_element() < 1e-10);
        assert!((params.angles - back.angles).abs().max_element() < 1e-10);
    }

    #[test]
    fn rotated_matrix_keeps_its_parameters() {
        let h = CellParameters::new([5.0, 6.0, 7.0], [80.0, 95.0, 110.0])
            .to_matrix()
            .unwrap();
        let rotated = DMat3::from_rotation_z(0.3) * DMat3::from_rotation_x(-1.1) * h;
        let params = lengths_angles_from_matrix(&rotated).unwrap();
        assert!((params.lengths - DVec3::new(5.0, 6.0, 7.0)).abs().max_element() < 1e-10);
        assert!((params.angles - DVec3::new(80.0, 95.0, 110.0)).abs().max_element() < 1e-9);
        // The canonical matrix is the unrotated one.
        assert_close(&params.to_matrix().unwrap(), &h, 1e-10);
    }

    #[test]
    fn hexagonal() {
        let params = CellParameters::new([3.0, 3.0, 5.0], [90.0, 90.0, 120.0]);
        let h = params.to_matrix().unwrap();
        assert!((h.y_axis.x + 1.5).abs() < 1e-12);
        assert!((h.y_axis.y - 3.0 * 3f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_matrix() {
        let flat = DMat3::from_cols(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        );
        assert!(matches!(
            lengths_angles_from_matrix(&flat),
            Err(GeometryError::Degenerate(_))
        ));
        assert!(matches!(
            lengths_angles_from_matrix(&DMat3::ZERO),
            Err(GeometryError::InvalidLengths(..))
        ));
        let nan = DMat3::from_diagonal(DVec3::new(f64::NAN, 1.0, 1.0));
        assert!(lengths_angles_from_matrix(&nan).is_err());
    }

    #[test]
    fn degenerate_parameters() {
        assert!(matches!(
            CellParameters::new([1.0, 0.0, 1.0], [90.0; 3]).to_matrix(),
            Err(GeometryError::InvalidLengths(..))
        ));
        assert!(matches!(
            CellParameters::new([1.0, 1.0, 1.0], [90.0, 90.0, 0.0]).to_matrix(),
            Err(GeometryError::InvalidAngles(..))
        ));
        // These three angles cannot close up into a cell.
        assert!(matches!(
            CellParameters::new([1.0, 1.0, 1.0], [10.0, 100.0, 30.0]).to_matrix(),
            Err(GeometryError::ZeroVolume)
        ));
    }

    #[test]
    fn unit_cell_representations_agree() {
        let params = CellParameters::new([12.0, 13.0, 14.0], [90.0, 100.0, 90.0]);
        let h = params.to_matrix().unwrap();
        let from_matrix = UnitCell::from(h).parameters().unwrap();
        assert!((from_matrix.angles - params.angles).abs().max_element() < 1e-10);
        assert_close(&UnitCell::from(params).matrix().unwrap(), &h, 1e-12);
    }
}
