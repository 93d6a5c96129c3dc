use crate::core::error::{Result, SceneError};
use crate::geometry::transform::TransformFactory;
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};

/// 视线方向与 up 的叉积长度小于该值时视为平行
pub const PARALLEL_EPSILON: f32 = 1e-4;

/// 键盘平移步长（世界单位）
pub const MOVE_STEP: f32 = 0.1;
/// 键盘转向、俯仰、环绕步长（度）
pub const TURN_STEP_DEGREES: f32 = 5.0;
/// 键盘缩放时视场角步长（度）
pub const ZOOM_STEP_DEGREES: f32 = 5.0;
/// 视场角允许范围（度）
pub const FOV_RANGE_DEGREES: (f32, f32) = (5.0, 80.0);

/// 相机类，维护 eye/at/up 与投影参数，按需生成视图和投影矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// 相机位置（眼睛位置）
    pub eye: Point3<f32>,
    /// 相机观察点（目标位置）
    pub at: Point3<f32>,
    /// 世界上方向
    pub up: Vector3<f32>,
    /// 垂直视场角（度）
    pub fov_degrees: f32,
    /// 宽高比（视口宽度/高度）
    pub aspect_ratio: f32,
    /// 近裁剪平面距离
    pub near: f32,
    /// 远裁剪平面距离
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 5.0),
            at: Point3::origin(),
            up: Vector3::y(),
            fov_degrees: 30.0,
            aspect_ratio: 1.5,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// 创建一个透视相机
    pub fn new(
        eye: Point3<f32>,
        at: Point3<f32>,
        up: Vector3<f32>,
        fov_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            eye,
            at,
            up,
            fov_degrees,
            aspect_ratio,
            near,
            far,
        }
    }

    /// 右手系 lookAt 视图矩阵
    ///
    /// eye 与 at 重合，或 up 与视线平行时返回 [`SceneError::DegenerateGeometry`]。
    pub fn get_view(&self) -> Result<Matrix4<f32>> {
        let direction = self.at - self.eye;
        if direction.norm() < f32::EPSILON {
            return Err(SceneError::DegenerateGeometry(
                "相机 eye 与 at 重合".to_string(),
            ));
        }
        if Self::is_parallel(&direction, &self.up) {
            return Err(SceneError::DegenerateGeometry(format!(
                "up {:?} 与视线方向 {:?} 平行",
                self.up, direction
            )));
        }
        Ok(TransformFactory::view(&self.eye, &self.at, &self.up))
    }

    /// 透视投影矩阵
    ///
    /// 要求宽高比为正、`0 < near < far`、视场角在 (0, 180) 度之间，
    /// 否则返回 [`SceneError::DegenerateGeometry`]。
    pub fn get_projection(&self) -> Result<Matrix4<f32>> {
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > f32::EPSILON) {
            return Err(SceneError::DegenerateGeometry(format!(
                "无效的宽高比 {}",
                self.aspect_ratio
            )));
        }
        if !(self.near.is_finite() && self.far.is_finite())
            || self.near <= 0.0
            || self.far - self.near <= f32::EPSILON
        {
            return Err(SceneError::DegenerateGeometry(format!(
                "无效的裁剪平面 near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.fov_degrees.is_finite() && self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SceneError::DegenerateGeometry(format!(
                "无效的视场角 {}",
                self.fov_degrees
            )));
        }
        Ok(TransformFactory::perspective(
            self.aspect_ratio,
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
        ))
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.eye = Point3::new(x, y, z);
    }

    pub fn look_at(&mut self, x: f32, y: f32, z: f32) {
        self.at = Point3::new(x, y, z);
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_fov(&mut self, fov_degrees: f32) {
        self.fov_degrees = fov_degrees;
    }

    /// 单位视线方向
    pub fn forward(&self) -> Vector3<f32> {
        (self.at - self.eye).normalize()
    }

    /// 相机右方向：视线与 up 的叉积
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(&self.up).normalize()
    }

    /// 正交化后的相机上方向
    pub fn camera_up(&self) -> Vector3<f32> {
        self.right().cross(&self.forward()).normalize()
    }

    fn is_parallel(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        let (na, nb) = (a.norm(), b.norm());
        if na < f32::EPSILON || nb < f32::EPSILON {
            return true;
        }
        (a / na).cross(&(b / nb)).norm() < PARALLEL_EPSILON
    }

    /// 旋转后视线是否退化：与 up 平行，或越过极点（水平分量反向）
    fn would_degenerate(&self, before: &Vector3<f32>, after: &Vector3<f32>) -> bool {
        if Self::is_parallel(after, &self.up) {
            return true;
        }
        let up = self.up.normalize();
        let horizontal_before = before - up * before.dot(&up);
        let horizontal_after = after - up * after.dot(&up);
        horizontal_before.dot(&horizontal_after) <= 0.0
    }

    /// 相机与目标一起平移
    fn translate(&mut self, offset: Vector3<f32>) {
        self.eye += offset;
        self.at += offset;
    }

    /// 沿视线方向移动（正值接近目标，目标随相机一起移动）
    pub fn dolly(&mut self, amount: f32) {
        let offset = self.forward() * amount;
        self.translate(offset);
    }

    /// 在相机平面内平移
    pub fn pan(&mut self, right_amount: f32, up_amount: f32) {
        let offset = self.right() * right_amount + self.camera_up() * up_amount;
        self.translate(offset);
    }

    /// 围绕目标点绕任意轴旋转相机位置；结果退化时保持不变并返回 false
    pub fn orbit(&mut self, axis: &Vector3<f32>, degrees: f32) -> bool {
        let rotation = TransformFactory::rotation(axis, degrees.to_radians());
        let offset = self.eye - self.at;
        let rotated = rotation.transform_vector(&offset);
        if self.would_degenerate(&offset, &rotated) {
            debug!("环绕会使视线与 up 平行或越过极点，忽略本次调整");
            return false;
        }
        self.eye = self.at + rotated;
        true
    }

    /// 围绕相机位置绕任意轴旋转视线；结果退化时保持不变并返回 false
    pub fn turn(&mut self, axis: &Vector3<f32>, degrees: f32) -> bool {
        let rotation = TransformFactory::rotation(axis, degrees.to_radians());
        let direction = self.at - self.eye;
        let rotated = rotation.transform_vector(&direction);
        if self.would_degenerate(&direction, &rotated) {
            debug!("转向会使视线与 up 平行或越过极点，忽略本次调整");
            return false;
        }
        self.at = self.eye + rotated;
        true
    }

    /// 重新瞄准原点；会导致退化（eye 在原点或视线与 up 平行）时拒绝
    fn aim_at_origin(&mut self) {
        let mut aimed = self.clone();
        aimed.look_at(0.0, 0.0, 0.0);
        if aimed.get_view().is_ok() {
            *self = aimed;
        } else {
            debug!("瞄准原点会使相机退化，忽略本次调整");
        }
    }

    fn zoom(&mut self, delta_degrees: f32) {
        let (min, max) = FOV_RANGE_DEGREES;
        self.fov_degrees = (self.fov_degrees + delta_degrees).clamp(min, max);
    }

    /// 将单个按键记号映射到相机的增量调整
    ///
    /// 返回 true 表示该按键已被相机消费，调用方不应再处理。
    /// 会使视线与 up 平行的调整被拒绝，但按键仍视为已消费。
    pub fn key_control(&mut self, key: char) -> bool {
        // 退化状态下基向量无意义，只允许重新瞄准与缩放
        let degenerate = self.get_view().is_err();
        if degenerate && !matches!(key, 'O' | 'W' | 'S') {
            return false;
        }

        match key {
            'w' => self.dolly(MOVE_STEP),
            's' => self.dolly(-MOVE_STEP),
            'a' => self.pan(-MOVE_STEP, 0.0),
            'd' => self.pan(MOVE_STEP, 0.0),
            'r' => self.pan(0.0, MOVE_STEP),
            'f' => self.pan(0.0, -MOVE_STEP),
            'j' => {
                let up = self.up;
                self.turn(&up, TURN_STEP_DEGREES);
            }
            'l' => {
                let up = self.up;
                self.turn(&up, -TURN_STEP_DEGREES);
            }
            'i' => {
                let right = self.right();
                self.turn(&right, TURN_STEP_DEGREES);
            }
            'k' => {
                let right = self.right();
                self.turn(&right, -TURN_STEP_DEGREES);
            }
            'J' => {
                let up = self.up;
                self.orbit(&up, -TURN_STEP_DEGREES);
            }
            'L' => {
                let up = self.up;
                self.orbit(&up, TURN_STEP_DEGREES);
            }
            'I' => {
                let right = self.right();
                self.orbit(&right, -TURN_STEP_DEGREES);
            }
            'K' => {
                let right = self.right();
                self.orbit(&right, TURN_STEP_DEGREES);
            }
            'W' => self.zoom(-ZOOM_STEP_DEGREES),
            'S' => self.zoom(ZOOM_STEP_DEGREES),
            'O' => self.aim_at_origin(),
            _ => return false,
        }
        true
    }
}
