use nalgebra::{Matrix3, Vector2, Vector3, Vector5};
use serde::Serialize;

use crate::{CalibrationLayout, CameraBundle, Error, Result, calib_xml_support};

/// Rotation angles and translation of one (camera, subject) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtrinsicBlock {
    /// Rotation about x, y and z in radians.
    pub angles: Vector3<f64>,
    pub translation: Vector3<f64>,
}

/// Pinhole and lens parameters of one camera, shared by all subjects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntrinsicBlock {
    pub focal_length: Vector2<f64>,
    pub principal_point: Vector2<f64>,
    /// Distortion coefficients in the order they are stored.
    pub raw_distortion: Vector5<f64>,
}

/// Calibration of one camera while recording one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationRecord {
    pub angles: Vector3<f64>,
    /// `Rx(angles.x) * Ry(angles.y) * Rz(angles.z)`
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub focal_length: Vector2<f64>,
    pub principal_point: Vector2<f64>,
    pub raw_distortion: Vector5<f64>,
    /// `raw_distortion` reordered by [reorder_distortion].
    pub distortion: Vector5<f64>,
}

/// The whole calibration array, reshaped per camera and subject.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationBlob {
    layout: CalibrationLayout,
    /// Indexed `[camera][subject]`, both 0-based.
    extrinsics: Vec<Vec<ExtrinsicBlock>>,
    /// Indexed by 0-based camera.
    intrinsics: Vec<IntrinsicBlock>,
}

impl CalibrationBlob {
    /// Read the `w0` calibration array from a Human3.6M `metadata.xml`.
    pub fn from_xml<R: std::io::Read>(rdr: R, layout: CalibrationLayout) -> Result<Self> {
        let doc = calib_xml_support::CalibrationDocument::from_reader(rdr)?;
        Self::from_blob_str(doc.blob()?, layout)
    }

    pub fn from_path<P: AsRef<std::path::Path>>(path: P, layout: CalibrationLayout) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("reading camera calibration from \"{}\"", path.display());
        let rdr = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::from_xml(rdr, layout)
    }

    /// Parse the text of the `w0` element, brackets included.
    pub fn from_blob_str(blob: &str, layout: CalibrationLayout) -> Result<Self> {
        let values = calib_xml_support::parse_bracketed_values(blob)?;
        Self::from_values(&values, layout)
    }

    /// Reshape the flat calibration array.
    ///
    /// The array holds an extrinsic block for every (camera, subject) pair,
    /// camera-major, followed by an intrinsic block for every camera.
    pub fn from_values(values: &[f64], layout: CalibrationLayout) -> Result<Self> {
        layout.validate()?;

        let (n_extrinsic, n_intrinsic) = layout.region_lens()?;
        let required = n_extrinsic + n_intrinsic;
        if values.len() < required {
            return Err(Error::malformed(format!(
                "calibration has {} values, expected {required}",
                values.len()
            )));
        }
        if values.len() > required {
            tracing::debug!(
                "ignoring {} trailing calibration values",
                values.len() - required
            );
        }
        let (extrinsic_values, rest) = values.split_at(n_extrinsic);
        let intrinsic_values = &rest[..n_intrinsic];

        let pairs: Vec<ExtrinsicBlock> = extrinsic_values
            .chunks_exact(layout.extrinsic_block)
            .map(|v| ExtrinsicBlock {
                angles: Vector3::new(v[0], v[1], v[2]),
                translation: Vector3::new(v[3], v[4], v[5]),
            })
            .collect();
        let extrinsics = pairs
            .chunks_exact(layout.n_subjects)
            .map(<[ExtrinsicBlock]>::to_vec)
            .collect();

        let intrinsics = intrinsic_values
            .chunks_exact(layout.intrinsic_block)
            .map(|v| IntrinsicBlock {
                focal_length: Vector2::new(v[0], v[1]),
                principal_point: Vector2::new(v[2], v[3]),
                raw_distortion: Vector5::new(v[4], v[5], v[6], v[7], v[8]),
            })
            .collect();

        tracing::debug!(
            "decoded calibration of {} cameras and {} subjects",
            layout.n_cameras,
            layout.n_subjects
        );

        Ok(Self {
            layout,
            extrinsics,
            intrinsics,
        })
    }

    pub fn layout(&self) -> &CalibrationLayout {
        &self.layout
    }

    /// Extrinsics for the 1-based `subject_id` and `camera_id`.
    pub fn extrinsics(&self, subject_id: usize, camera_id: usize) -> Result<&ExtrinsicBlock> {
        let cam = to_index(camera_id, self.layout.n_cameras, "camera")?;
        let sbj = to_index(subject_id, self.layout.n_subjects, "subject")?;
        Ok(&self.extrinsics[cam][sbj])
    }

    /// Intrinsics for the 1-based `camera_id`.
    pub fn intrinsics(&self, camera_id: usize) -> Result<&IntrinsicBlock> {
        let cam = to_index(camera_id, self.layout.n_cameras, "camera")?;
        Ok(&self.intrinsics[cam])
    }

    /// Calibration of camera `camera_id` for subject `subject_id`, both 1-based.
    pub fn record(&self, subject_id: usize, camera_id: usize) -> Result<CalibrationRecord> {
        let extrinsics = self.extrinsics(subject_id, camera_id)?;
        let intrinsics = self.intrinsics(camera_id)?;
        Ok(CalibrationRecord {
            angles: extrinsics.angles,
            rotation: rotation_matrix(&extrinsics.angles),
            translation: extrinsics.translation,
            focal_length: intrinsics.focal_length,
            principal_point: intrinsics.principal_point,
            raw_distortion: intrinsics.raw_distortion,
            distortion: reorder_distortion(&intrinsics.raw_distortion),
        })
    }

    /// Camera matrices for a sequence label such as `"S9"` and a camera label
    /// from [CalibrationLayout::camera_labels].
    pub fn camera_bundle(&self, sequence_label: &str, camera_label: &str) -> Result<CameraBundle> {
        let camera_id = self.layout.camera_index(camera_label)?;
        let subject_id = crate::subject_number(sequence_label)?;
        let record = self.record(subject_id, camera_id)?;
        Ok(CameraBundle::from_record(&record))
    }
}

fn to_index(id: usize, n: usize, what: &str) -> Result<usize> {
    if id == 0 || id > n {
        return Err(Error::lookup(format!("{what} {id} not in 1..={n}")));
    }
    Ok(id - 1)
}

/// Build a rotation matrix as `Rx(x) * Ry(y) * Rz(z)`.
///
/// Each factor is the usual right-handed rotation about one axis. The
/// product is taken in exactly this order.
#[rustfmt::skip]
pub fn rotation_matrix(angles: &Vector3<f64>) -> Matrix3<f64> {
    let (sx, cx) = angles[0].sin_cos();
    let (sy, cy) = angles[1].sin_cos();
    let (sz, cz) = angles[2].sin_cos();
    let rx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0,  cx, -sx,
        0.0,  sx,  cx);
    let ry = Matrix3::new(
         cy, 0.0,  sy,
        0.0, 1.0, 0.0,
        -sy, 0.0,  cy);
    let rz = Matrix3::new(
         cz, -sz, 0.0,
         sz,  cz, 0.0,
        0.0, 0.0, 1.0);
    rx * ry * rz
}

/// Reorder the stored distortion coefficients `(d0, d1, d2, d3, d4)` into
/// `(d0, d1, d3, d4, d2)`.
///
/// The dataset stores the third radial coefficient before the two
/// tangential ones; the result is in OpenCV order `(k1, k2, p1, p2, k3)`.
pub fn reorder_distortion(raw: &Vector5<f64>) -> Vector5<f64> {
    Vector5::new(raw[0], raw[1], raw[3], raw[4], raw[2])
}
