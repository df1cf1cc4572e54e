use nalgebra::{self as na, Matrix3, Point2, Point3, RowVector5, Vector3};
use serde::Serialize;

use opencv_ros_camera::{Distortion, RosOpenCvIntrinsics};

use crate::CalibrationRecord;

/// Camera matrices in the form expected by OpenCV style code.
///
/// A world point `X` maps to camera coordinates `r * X + t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraBundle {
    /// Intrinsic matrix with focal length and principal point, no skew.
    pub k: Matrix3<f64>,
    pub r: Matrix3<f64>,
    /// `-(r * translation)` where `translation` is the stored extrinsic
    /// translation, not the stored translation itself.
    pub t: Vector3<f64>,
    /// `(k1, k2, p1, p2, k3)` as a 1×5 row.
    pub dist: RowVector5<f64>,
}

impl CameraBundle {
    pub fn from_record(record: &CalibrationRecord) -> Self {
        let mut k = Matrix3::identity();
        k[(0, 0)] = record.focal_length[0];
        k[(1, 1)] = record.focal_length[1];
        k[(0, 2)] = record.principal_point[0];
        k[(1, 2)] = record.principal_point[1];

        let r = record.rotation;
        let t = -(r * record.translation);

        Self {
            k,
            r,
            t,
            dist: record.distortion.transpose(),
        }
    }

    /// Camera center in world coordinates, `-rᵀ * t`.
    pub fn camcenter(&self) -> Point3<f64> {
        Point3::from(-(self.r.transpose() * self.t))
    }

    /// Build a full camera model with lens distortion.
    pub fn to_cam_geom(&self) -> cam_geom::Camera<f64, RosOpenCvIntrinsics<f64>> {
        let distortion = Distortion::from_opencv_vec(self.dist.transpose());
        let intrinsics = RosOpenCvIntrinsics::from_params_with_distortion(
            self.k[(0, 0)],
            self.k[(0, 1)],
            self.k[(1, 1)],
            self.k[(0, 2)],
            self.k[(1, 2)],
            distortion,
        );
        let rotation = na::Rotation3::from_matrix_unchecked(self.r);
        let rquat = na::UnitQuaternion::from_rotation_matrix(&rotation);
        let extrinsics =
            cam_geom::ExtrinsicParameters::from_rotation_and_camcenter(rquat, self.camcenter());
        cam_geom::Camera::new(intrinsics, extrinsics)
    }

    /// Project a world point to distorted pixel coordinates.
    pub fn project(&self, world: &Point3<f64>) -> Point2<f64> {
        let cam = self.to_cam_geom();
        let pts = cam_geom::Points::new(na::RowVector3::new(world.x, world.y, world.z));
        let pixel = cam.world_to_pixel(&pts).data.transpose();
        Point2::new(pixel[0], pixel[1])
    }
}
