//! Math utilities and types
//!
//! Provides the small set of math types the bridge needs: 2D/4D vectors,
//! 4x4 matrices and a pixel rectangle used for viewports and scissors.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Axis-aligned rectangle in pixels, origin plus extent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Bottom (or top, depending on the consumer's convention) edge
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle packed as `(x, y, width, height)`
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.width, self.height)
    }

    /// Right edge
    pub fn max_x(self) -> f32 {
        self.x + self.width
    }

    /// Edge opposite to `y`
    pub fn max_y(self) -> f32 {
        self.y + self.height
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a translation matrix
    fn translation(x: f32, y: f32, z: f32) -> Mat4;

    /// Create an OpenGL-style orthographic projection
    ///
    /// Passing `bottom > top` flips the y axis, which is how screen-space
    /// GUI coordinates (y down) are mapped onto clip space (y up).
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        // P = [2/(r-l)  0        0         -(r+l)/(r-l)]
        //     [0        2/(t-b)  0         -(t+b)/(t-b)]
        //     [0        0        -2/(f-n)  -(f+n)/(f-n)]
        //     [0        0        0         1           ]
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = -2.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -(far + near) / (far - near);
        result
    }
}
