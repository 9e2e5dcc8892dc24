//! Conversion between NIfTI header geometry and image metadata.
//!
//! NIfTI stores the index to physical affine twice: as a general 3x4 matrix
//! (sform) and as a quaternion plus offsets (qform). Reading prefers the
//! sform, then the qform, then plain voxel sizes. Writing fills in both.
//!
//! Files hold RAS coordinates; `ImageMetadata` is LPS. The x and y rows of
//! the affine, origin included, are negated in both directions. Vector voxel
//! values are not touched, so displacement components are LPS offsets.

use dfwarp_core::image::ImageMetadata;
use dfwarp_core::spatial::{Direction, Point, Spacing, Vector};
use nalgebra::{Rotation3, SMatrix, UnitQuaternion};
use nifti::NiftiHeader;

/// NIfTI `xyzt_units` value for millimetres.
const UNITS_MM: u8 = 2;
/// NIfTI `sform_code` / `qform_code` for scanner-based coordinates.
const XFORM_SCANNER_ANAT: i16 = 1;

/// Decode the image geometry from a NIfTI header.
pub(crate) fn metadata_from_header(header: &NiftiHeader) -> ImageMetadata<3> {
    let affine: [[f32; 4]; 3] = if header.sform_code > 0 {
        [header.srow_x, header.srow_y, header.srow_z]
    } else if header.qform_code > 0 {
        qform_affine(header)
    } else {
        let [dx, dy, dz] = pixdim_spacing(header);
        [
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
        ]
    };
    let affine = flip_xy_rows(affine);

    let origin = Point::new([affine[0][3] as f64, affine[1][3] as f64, affine[2][3] as f64]);

    // Columns of the affine are the axis directions scaled by spacing
    let mut spacing = [1.0; 3];
    let mut columns = [Vector::<3>::zeros(); 3];
    for axis in 0..3 {
        let column = Vector::new([
            affine[0][axis] as f64,
            affine[1][axis] as f64,
            affine[2][axis] as f64,
        ]);
        let length = column.norm();
        // Non-finite lengths are kept so loading can reject them
        if length <= 1e-9 {
            columns[axis][axis] = 1.0;
        } else {
            spacing[axis] = length;
            columns[axis] = column / length;
        }
    }

    ImageMetadata::new(origin, Spacing::new(spacing), Direction::from_columns(columns))
}

/// Negate the x and y rows, mapping RAS to LPS and back.
fn flip_xy_rows(mut affine: [[f32; 4]; 3]) -> [[f32; 4]; 3] {
    for row in affine.iter_mut().take(2) {
        for value in row.iter_mut() {
            *value = -*value;
        }
    }
    affine
}

fn pixdim_spacing(header: &NiftiHeader) -> [f32; 3] {
    [1, 2, 3].map(|i| {
        let value = header.pixdim[i].abs();
        if value.is_finite() && value > 0.0 {
            value
        } else {
            1.0
        }
    })
}

fn qform_affine(header: &NiftiHeader) -> [[f32; 4]; 3] {
    let b = header.quatern_b;
    let c = header.quatern_c;
    let d = header.quatern_d;
    let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

    let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let [dx, dy, dz] = pixdim_spacing(header);
    let dz = dz * qfac;

    let r11 = a * a + b * b - c * c - d * d;
    let r12 = 2.0 * b * c - 2.0 * a * d;
    let r13 = 2.0 * b * d + 2.0 * a * c;

    let r21 = 2.0 * b * c + 2.0 * a * d;
    let r22 = a * a + c * c - b * b - d * d;
    let r23 = 2.0 * c * d - 2.0 * a * b;

    let r31 = 2.0 * b * d - 2.0 * a * c;
    let r32 = 2.0 * c * d + 2.0 * a * b;
    let r33 = a * a + d * d - c * c - b * b;

    [
        [r11 * dx, r12 * dy, r13 * dz, header.quatern_x],
        [r21 * dx, r22 * dy, r23 * dz, header.quatern_y],
        [r31 * dx, r32 * dy, r33 * dz, header.quatern_z],
    ]
}

/// Build a header whose sform and qform encode `metadata`.
///
/// The qform is only written when the direction matrix is orthonormal.
pub(crate) fn header_from_metadata(metadata: &ImageMetadata<3>) -> NiftiHeader {
    let spacing = metadata.spacing();
    let mut origin = *metadata.origin();
    let mut direction = *metadata.direction();
    // LPS to RAS
    for r in 0..2 {
        origin[r] = -origin[r];
        for c in 0..3 {
            direction[(r, c)] = -direction[(r, c)];
        }
    }

    let mut header = NiftiHeader::default();
    header.xyzt_units = UNITS_MM;
    for axis in 0..3 {
        header.pixdim[axis + 1] = spacing[axis] as f32;
    }
    for extra in 4..8 {
        header.pixdim[extra] = 1.0;
    }

    let mut rows = [[0.0f32; 4]; 3];
    for (r, row) in rows.iter_mut().enumerate() {
        for c in 0..3 {
            row[c] = (direction[(r, c)] * spacing[c]) as f32;
        }
        row[3] = origin[r] as f32;
    }
    header.sform_code = XFORM_SCANNER_ANAT;
    header.srow_x = rows[0];
    header.srow_y = rows[1];
    header.srow_z = rows[2];

    match direction_quaternion(&direction) {
        Some((qfac, [b, c, d])) => {
            header.qform_code = XFORM_SCANNER_ANAT;
            header.pixdim[0] = qfac;
            header.quatern_b = b;
            header.quatern_c = c;
            header.quatern_d = d;
            header.quatern_x = origin[0] as f32;
            header.quatern_y = origin[1] as f32;
            header.quatern_z = origin[2] as f32;
        }
        None => {
            header.qform_code = 0;
            header.pixdim[0] = 1.0;
        }
    }

    header
}

/// `qfac` and quaternion `(b, c, d)` of an orthonormal direction matrix.
fn direction_quaternion(direction: &Direction<3>) -> Option<(f32, [f32; 3])> {
    if !direction.is_orthogonal() {
        return None;
    }
    let mut matrix: SMatrix<f64, 3, 3> = *direction.inner();
    let qfac = if direction.determinant() < 0.0 {
        // qform stores proper rotations; the z flip goes into qfac
        matrix.column_mut(2).neg_mut();
        -1.0
    } else {
        1.0
    };

    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix));
    let q = rotation.quaternion();
    let sign = if q.w < 0.0 { -1.0 } else { 1.0 };
    Some((qfac, [(sign * q.i) as f32, (sign * q.j) as f32, (sign * q.k) as f32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfwarp_core::spatial::Vector3;

    fn assert_close(a: &ImageMetadata<3>, b: &ImageMetadata<3>) {
        assert!(a.is_close(b, 1e-5), "{a:?} vs {b:?}");
    }

    #[test]
    fn test_sform_round_trip() {
        let direction = Direction::from_columns([
            Vector3::new([0.0, 1.0, 0.0]),
            Vector3::new([-1.0, 0.0, 0.0]),
            Vector3::new([0.0, 0.0, 1.0]),
        ]);
        let metadata = ImageMetadata::new(Point::new([-90.0, 126.0, -72.0]), Spacing::new([1.0, 0.5, 2.5]), direction);
        let header = header_from_metadata(&metadata);
        assert_eq!(header.sform_code, 1);
        assert_eq!(header.qform_code, 1);
        assert_close(&metadata_from_header(&header), &metadata);
    }

    #[test]
    fn test_qform_matches_sform() {
        let mut direction = Direction::<3>::identity();
        direction[(0, 0)] = -1.0;
        direction[(1, 1)] = -1.0;
        let metadata = ImageMetadata::new(Point::new([10.0, 20.0, -5.0]), Spacing::new([2.0, 2.0, 3.0]), direction);

        let mut header = header_from_metadata(&metadata);
        header.sform_code = 0;
        assert_close(&metadata_from_header(&header), &metadata);
    }

    #[test]
    fn test_qform_encodes_reflection_in_qfac() {
        let mut direction = Direction::<3>::identity();
        direction[(2, 2)] = -1.0;
        let metadata = ImageMetadata::new(Point::origin(), Spacing::uniform(1.0), direction);

        let mut header = header_from_metadata(&metadata);
        assert_eq!(header.pixdim[0], -1.0);
        header.sform_code = 0;
        assert_close(&metadata_from_header(&header), &metadata);
    }

    fn identity_sform_header() -> NiftiHeader {
        NiftiHeader {
            sform_code: 1,
            srow_x: [1.0, 0.0, 0.0, 10.0],
            srow_y: [0.0, 1.0, 0.0, 20.0],
            srow_z: [0.0, 0.0, 1.0, 30.0],
            pixdim: [1.0; 8],
            ..NiftiHeader::default()
        }
    }

    fn lps_flip() -> Direction<3> {
        let mut direction = Direction::<3>::identity();
        direction[(0, 0)] = -1.0;
        direction[(1, 1)] = -1.0;
        direction
    }

    #[test]
    fn test_ras_sform_reads_as_lps() {
        let metadata = metadata_from_header(&identity_sform_header());
        assert_eq!(metadata.origin(), &Point::new([-10.0, -20.0, 30.0]));
        assert_eq!(metadata.spacing(), &Spacing::uniform(1.0));
        assert_eq!(metadata.direction(), &lps_flip());
    }

    #[test]
    fn test_lps_identity_writes_flipped_sform() {
        let metadata = ImageMetadata::new(Point::new([10.0, 20.0, 30.0]), Spacing::uniform(1.0), Direction::identity());
        let header = header_from_metadata(&metadata);
        assert_eq!(header.srow_x, [-1.0, 0.0, 0.0, -10.0]);
        assert_eq!(header.srow_y, [0.0, -1.0, 0.0, -20.0]);
        assert_eq!(header.srow_z, [0.0, 0.0, 1.0, 30.0]);
        assert_eq!(header.quatern_x, -10.0);
        assert_eq!(header.quatern_y, -20.0);
        assert_eq!(header.quatern_z, 30.0);

        let reference = identity_sform_header();
        let round_trip = header_from_metadata(&metadata_from_header(&reference));
        assert_eq!(round_trip.srow_x, reference.srow_x);
        assert_eq!(round_trip.srow_y, reference.srow_y);
        assert_eq!(round_trip.srow_z, reference.srow_z);
    }

    #[test]
    fn test_pixdim_fallback() {
        let mut header = NiftiHeader::default();
        header.sform_code = 0;
        header.qform_code = 0;
        header.pixdim = [1.0, 0.5, 0.0, 3.0, 1.0, 1.0, 1.0, 1.0];
        let metadata = metadata_from_header(&header);
        assert_eq!(metadata.origin(), &Point::origin());
        assert_eq!(metadata.spacing(), &Spacing::new([0.5, 1.0, 3.0]));
        assert_eq!(metadata.direction(), &lps_flip());
    }

    #[test]
    fn test_skewed_direction_skips_qform() {
        let direction = Direction::from_columns([
            Vector3::new([1.0, 0.0, 0.0]),
            Vector3::new([0.6, 0.8, 0.0]),
            Vector3::new([0.0, 0.0, 1.0]),
        ]);
        let metadata = ImageMetadata::new(Point::origin(), Spacing::uniform(1.0), direction);
        let header = header_from_metadata(&metadata);
        assert_eq!(header.qform_code, 0);
        assert_close(&metadata_from_header(&header), &metadata);
    }
}
