#![deny(rust_2018_idioms)]
//! Camera calibration of the Human3.6M motion capture dataset.
//!
//! The dataset's `metadata.xml` holds the calibration of all cameras for all
//! subjects as a single flat array in its `w0` element. [CalibrationBlob]
//! reshapes that array into typed per-camera and per-subject blocks, and
//! [CameraBundle] turns one (subject, camera) calibration into the intrinsic
//! matrix `K`, rotation `R`, translation `T` and distortion vector.
//!
//! ```no_run
//! let fd = std::fs::File::open("metadata.xml")?;
//! let bundle = h36m_camcal::build_camera_bundle(fd, "S9", "55011271")?;
//! println!("K = {}", bundle.k);
//! # Ok::<(), h36m_camcal::Error>(())
//! ```

use serde::{Deserialize, Serialize};

mod blob;
mod bundle;
mod calib_xml_support;

pub use crate::blob::{
    CalibrationBlob, CalibrationRecord, ExtrinsicBlock, IntrinsicBlock, reorder_distortion,
    rotation_matrix,
};
pub use crate::bundle::CameraBundle;

pub const H36M_NUM_SUBJECTS: usize = 11;
pub const H36M_NUM_CAMERAS: usize = 4;

/// Values per (camera, subject) pair: 3 rotation angles and 3 translation
/// components.
pub const EXTRINSIC_BLOCK_LEN: usize = 6;

/// Values per camera: focal length (2), principal point (2) and distortion
/// coefficients (5).
pub const INTRINSIC_BLOCK_LEN: usize = 9;

/// Serial numbers of the four cameras, in calibration order.
pub const H36M_CAMERA_LABELS: [&str; H36M_NUM_CAMERAS] =
    ["54138969", "55011271", "58860488", "60457274"];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("xml error: {0}")]
    SerdeXml(#[from] serde_xml_rs::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed calibration: {msg}")]
    MalformedDocument { msg: String },
    #[error("cannot parse {what} from \"{token}\"")]
    Parse { what: String, token: String },
    #[error("lookup failed: {what}")]
    Lookup { what: String },
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedDocument { msg: msg.into() }
    }
    pub(crate) fn lookup<S: Into<String>>(what: S) -> Self {
        Error::Lookup { what: what.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Dataset-revision dependent shape of the calibration array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CalibrationLayout {
    pub n_subjects: usize,
    pub n_cameras: usize,
    /// Stride of one extrinsic block. The fields are read from its start.
    pub extrinsic_block: usize,
    /// Stride of one intrinsic block. The fields are read from its start.
    pub intrinsic_block: usize,
    /// Camera labels, one per camera, in calibration order.
    pub camera_labels: Vec<String>,
}

impl Default for CalibrationLayout {
    fn default() -> Self {
        Self {
            n_subjects: H36M_NUM_SUBJECTS,
            n_cameras: H36M_NUM_CAMERAS,
            extrinsic_block: EXTRINSIC_BLOCK_LEN,
            intrinsic_block: INTRINSIC_BLOCK_LEN,
            camera_labels: H36M_CAMERA_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CalibrationLayout {
    /// Number of values the calibration array must hold.
    pub fn required_len(&self) -> Result<usize> {
        let (n_extrinsic, n_intrinsic) = self.region_lens()?;
        n_extrinsic
            .checked_add(n_intrinsic)
            .ok_or_else(|| Error::malformed("layout size overflows"))
    }

    /// Lengths of the extrinsic and the intrinsic region of the array.
    pub(crate) fn region_lens(&self) -> Result<(usize, usize)> {
        let overflow = || Error::malformed("layout size overflows");
        let n_extrinsic = self
            .n_cameras
            .checked_mul(self.n_subjects)
            .and_then(|n| n.checked_mul(self.extrinsic_block))
            .ok_or_else(overflow)?;
        let n_intrinsic = self
            .n_cameras
            .checked_mul(self.intrinsic_block)
            .ok_or_else(overflow)?;
        n_extrinsic.checked_add(n_intrinsic).ok_or_else(overflow)?;
        Ok((n_extrinsic, n_intrinsic))
    }

    /// 1-based index of `camera_label` in [Self::camera_labels].
    pub fn camera_index(&self, camera_label: &str) -> Result<usize> {
        self.camera_labels
            .iter()
            .position(|label| label == camera_label)
            .map(|i| i + 1)
            .ok_or_else(|| Error::lookup(format!("unknown camera \"{camera_label}\"")))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.n_subjects == 0 || self.n_cameras == 0 {
            return Err(Error::malformed("layout needs at least one subject and camera"));
        }
        if self.extrinsic_block < EXTRINSIC_BLOCK_LEN || self.intrinsic_block < INTRINSIC_BLOCK_LEN
        {
            return Err(Error::malformed(format!(
                "layout blocks must hold at least {EXTRINSIC_BLOCK_LEN} extrinsic and \
                 {INTRINSIC_BLOCK_LEN} intrinsic values"
            )));
        }
        if self.camera_labels.len() != self.n_cameras {
            return Err(Error::malformed(format!(
                "layout has {} camera labels for {} cameras",
                self.camera_labels.len(),
                self.n_cameras
            )));
        }
        self.region_lens()?;
        Ok(())
    }
}

/// Subject number of a sequence label, e.g. `9` for `"S9"`.
pub fn subject_number(sequence_label: &str) -> Result<usize> {
    sequence_label
        .strip_prefix('S')
        .and_then(|num| num.parse().ok())
        .ok_or_else(|| Error::Parse {
            what: "subject number".into(),
            token: sequence_label.to_string(),
        })
}

/// 1-based index of one of the [H36M_CAMERA_LABELS].
pub fn camera_index(camera_label: &str) -> Result<usize> {
    CalibrationLayout::default().camera_index(camera_label)
}

/// Decode the calibration of camera `camera_id` for subject `subject_id`
/// (both 1-based) from a Human3.6M `metadata.xml`.
pub fn read_cam_parameters<R: std::io::Read>(
    rdr: R,
    subject_id: usize,
    camera_id: usize,
) -> Result<CalibrationRecord> {
    CalibrationBlob::from_xml(rdr, CalibrationLayout::default())?.record(subject_id, camera_id)
}

/// Decode `K`, `R`, `T` and the distortion vector of one camera while
/// recording one subject.
///
/// `sequence_label` is a subject label such as `"S1"` and `camera_label` one
/// of the [H36M_CAMERA_LABELS].
pub fn build_camera_bundle<R: std::io::Read>(
    calibration_source: R,
    sequence_label: &str,
    camera_label: &str,
) -> Result<CameraBundle> {
    build_camera_bundle_with_layout(
        calibration_source,
        sequence_label,
        camera_label,
        CalibrationLayout::default(),
    )
}

pub fn build_camera_bundle_with_layout<R: std::io::Read>(
    calibration_source: R,
    sequence_label: &str,
    camera_label: &str,
    layout: CalibrationLayout,
) -> Result<CameraBundle> {
    // check the labels before decoding the whole calibration
    let camera_id = layout.camera_index(camera_label)?;
    let subject_id = subject_number(sequence_label)?;
    let record = CalibrationBlob::from_xml(calibration_source, layout)?.record(subject_id, camera_id)?;
    Ok(CameraBundle::from_record(&record))
}
