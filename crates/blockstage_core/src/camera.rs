//! Scene camera
//!
//! The camera kind is decided when the camera is built and exposed as a
//! [`CameraCapability`], so callers branch on a tag instead of probing for
//! fields.

use blockstage_math::{Mat4, Ray, Vec2, Vec3, Vec4};

const MIN_BETA: f32 = 0.01;
const MIN_RADIUS: f32 = 0.01;

/// How the camera is positioned
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraRig {
    /// Orbits a target point (alpha = longitude, beta = colatitude, radians)
    Orbit {
        target: Vec3,
        alpha: f32,
        beta: f32,
        radius: f32,
    },
    /// Positioned directly, looking along yaw/pitch (yaw 0 looks down -Z)
    Free {
        position: Vec3,
        yaw: f32,
        pitch: f32,
    },
}

/// What a camera supports, fixed at construction time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraCapability {
    /// Has an orbit target that can be animated toward a selection
    OrbitTarget,
    /// Only has a directly settable position
    DirectPosition,
}

/// Target and position of a camera at one instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Orbit target, for orbit cameras
    pub target: Option<Vec3>,
    /// World position
    pub position: Vec3,
}

/// A perspective camera looking into the scene
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    rig: CameraRig,
    capability: CameraCapability,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbit(Vec3::ZERO, -std::f32::consts::FRAC_PI_2, 1.2, 10.0)
    }
}

impl Camera {
    /// Create an orbit camera around `target`
    pub fn orbit(target: Vec3, alpha: f32, beta: f32, radius: f32) -> Self {
        Self::from_rig(CameraRig::Orbit {
            target,
            alpha,
            beta: clamp_beta(beta),
            radius: radius.max(MIN_RADIUS),
        })
    }

    /// Create a free camera at `position`
    pub fn free(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self::from_rig(CameraRig::Free { position, yaw, pitch })
    }

    fn from_rig(rig: CameraRig) -> Self {
        let capability = match rig {
            CameraRig::Orbit { .. } => CameraCapability::OrbitTarget,
            CameraRig::Free { .. } => CameraCapability::DirectPosition,
        };
        Self {
            rig,
            capability,
            fov_y: 0.8,
            viewport: Vec2::new(1280.0, 720.0),
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Set the viewport size
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self
    }

    /// Set the vertical field of view (radians)
    pub fn with_fov(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y;
        self
    }

    /// Camera capability tag
    #[inline]
    pub fn capability(&self) -> CameraCapability {
        self.capability
    }

    /// Current rig
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Orbit target, if this is an orbit camera
    pub fn target(&self) -> Option<Vec3> {
        match self.rig {
            CameraRig::Orbit { target, .. } => Some(target),
            CameraRig::Free { .. } => None,
        }
    }

    /// World position of the camera
    pub fn position(&self) -> Vec3 {
        match self.rig {
            CameraRig::Orbit { target, alpha, beta, radius } => {
                target
                    + Vec3::new(
                        radius * alpha.cos() * beta.sin(),
                        radius * beta.cos(),
                        radius * alpha.sin() * beta.sin(),
                    )
            }
            CameraRig::Free { position, .. } => position,
        }
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        match self.rig {
            CameraRig::Orbit { target, .. } => (target - self.position()).try_normalize().unwrap_or(Vec3::NEG_Z),
            CameraRig::Free { yaw, pitch, .. } => Vec3::new(
                -yaw.sin() * pitch.cos(),
                pitch.sin(),
                -yaw.cos() * pitch.cos(),
            ),
        }
    }

    /// Current pose
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            target: self.target(),
            position: self.position(),
        }
    }

    /// Move the camera to a pose
    ///
    /// Orbit cameras derive alpha/beta/radius from the offset between
    /// position and target. Free cameras only take the position.
    pub fn set_pose(&mut self, pose: CameraPose) {
        match &mut self.rig {
            CameraRig::Orbit { target, alpha, beta, radius } => {
                let new_target = pose.target.unwrap_or(*target);
                let offset = pose.position - new_target;
                let r = offset.length().max(MIN_RADIUS);
                *target = new_target;
                *radius = r;
                *beta = clamp_beta((offset.y / r).clamp(-1.0, 1.0).acos());
                *alpha = offset.z.atan2(offset.x);
            }
            CameraRig::Free { position, .. } => {
                *position = pose.position;
            }
        }
    }

    /// View matrix (world to camera)
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.position();
        Mat4::look_at_rh(eye, eye + self.forward(), Vec3::Y)
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = self.viewport.x / self.viewport.y;
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    /// Ray from the camera through a screen point (pixels, origin top-left)
    pub fn screen_ray(&self, screen: Vec2) -> Ray {
        let ndc_x = 2.0 * screen.x / self.viewport.x - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / self.viewport.y;
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let eye = self.position();
        Ray::new(eye, far - eye)
    }

    /// Project a world point to screen pixels; None if behind the camera
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.projection_matrix() * self.view_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }
}

fn clamp_beta(beta: f32) -> f32 {
    beta.clamp(MIN_BETA, std::f32::consts::PI - MIN_BETA)
}
