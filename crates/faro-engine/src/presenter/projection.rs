use std::cell::RefCell;
use std::rc::Weak;

use glam::{Mat4, Vec3};

/// Default projection constants, used whenever no live camera is bound.
pub(crate) const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
pub(crate) const DEFAULT_Z_NEAR: f32 = 0.1;
pub(crate) const DEFAULT_Z_FAR: f32 = 10_000.0;
pub(crate) const DEFAULT_FORWARD: Vec3 = Vec3::Z;
pub(crate) const DEFAULT_UP: Vec3 = Vec3::Y;

/// View and projection matrices pulled from a live camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Lookup-or-default camera capability.
///
/// The backend calls `matrices()` once per frame. `None` means the camera
/// no longer exists and the backend falls back to the default projection.
/// Implementations must not extend the camera's lifetime.
pub trait CameraSource {
    fn matrices(&self) -> Option<CameraMatrices>;
}

/// A perspective camera owned by the host.
///
/// The backend only ever sees it through a [`CameraSource`]; dropping the
/// owning handle between frames is fine.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    /// Camera at `eye` looking along `forward`, with default field of view,
    /// clip planes, and up axis.
    pub fn new(eye: Vec3, forward: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            forward,
            up: DEFAULT_UP,
            fov_y: DEFAULT_FOV_Y,
            aspect,
            z_near: DEFAULT_Z_NEAR,
            z_far: DEFAULT_Z_FAR,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_lh(self.eye, self.forward, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
        }
    }
}

/// The usual host arrangement: camera in an `Rc<RefCell<_>>`, backend holds
/// the downgraded handle. Upgrading fails once the host drops the camera.
impl CameraSource for Weak<RefCell<Camera>> {
    fn matrices(&self) -> Option<CameraMatrices> {
        let camera = self.upgrade()?;
        let camera = camera.borrow();
        Some(camera.matrices())
    }
}

/// Matrices the frame lifecycle recomputes at every `prepare`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct FrameMatrices {
    pub projection: Mat4,
    pub view_projection: Mat4,
}

/// Fixed default: 45 degree vertical field of view, eye at the origin
/// looking along +Z with +Y up, aspect from the current client rectangle.
/// Recomputed every frame because the aspect tracks the client rect.
pub(crate) fn default_frame_matrices(width: f32, height: f32) -> FrameMatrices {
    let projection = Mat4::perspective_lh(DEFAULT_FOV_Y, width / height, DEFAULT_Z_NEAR, DEFAULT_Z_FAR);
    let view = Mat4::look_to_lh(Vec3::ZERO, DEFAULT_FORWARD, DEFAULT_UP);
    FrameMatrices {
        projection,
        view_projection: projection * view,
    }
}

/// Camera matrices when the bound camera is alive, the default otherwise.
pub(crate) fn frame_matrices(
    camera: Option<&dyn CameraSource>,
    width: f32,
    height: f32,
) -> FrameMatrices {
    match camera.and_then(|c| c.matrices()) {
        Some(m) => FrameMatrices {
            projection: m.projection,
            view_projection: m.projection * m.view,
        },
        None => default_frame_matrices(width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Recovers the aspect ratio from a perspective matrix: the [1][1] term
    /// is `1 / tan(fov/2)`, the [0][0] term divides that by the aspect.
    fn aspect_of(projection: Mat4) -> f32 {
        projection.col(1).y / projection.col(0).x
    }

    #[test]
    fn default_projection_aspect_tracks_client_rect() {
        let m = default_frame_matrices(1280.0, 720.0);
        let aspect = aspect_of(m.projection);
        assert!((aspect - 1280.0 / 720.0).abs() < 1e-5);
    }

    #[test]
    fn default_projection_is_deterministic() {
        let a = default_frame_matrices(800.0, 600.0);
        let b = default_frame_matrices(800.0, 600.0);
        assert_eq!(a, b);
    }

    #[test]
    fn bound_camera_overrides_default() {
        let camera = Rc::new(RefCell::new(Camera::new(
            Vec3::new(0.0, 2.0, -4.0),
            Vec3::Z,
            1.5,
        )));
        let source = Rc::downgrade(&camera);

        let m = frame_matrices(Some(&source), 800.0, 600.0);
        let expected = camera.borrow().matrices();
        assert_eq!(m.projection, expected.projection);
        assert_eq!(m.view_projection, expected.projection * expected.view);
    }

    #[test]
    fn dropped_camera_falls_back_to_default() {
        let camera = Rc::new(RefCell::new(Camera::new(Vec3::ZERO, Vec3::Z, 2.0)));
        let source = Rc::downgrade(&camera);
        drop(camera);

        assert!(source.matrices().is_none());
        let m = frame_matrices(Some(&source), 640.0, 480.0);
        assert_eq!(m, default_frame_matrices(640.0, 480.0));
    }

    #[test]
    fn default_view_is_identity_at_origin() {
        // Eye at origin looking along +Z with +Y up: the LH view transform
        // is the identity, so view-projection equals the projection.
        let m = default_frame_matrices(1024.0, 768.0);
        assert_eq!(m.view_projection, m.projection);
    }
}
