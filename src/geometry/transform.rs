use crate::core::error::{Result, SceneError};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Unit, UnitQuaternion, Vector3};

/// 法线矩阵的相对奇异阈值
///
/// 判据为 `|det| < ε * |c0| * |c1| * |c2|`（列向量长度之积是 `|det|` 的上界），
/// 与整体缩放无关：均匀缩小到 0.001 仍可逆，某轴缩放为 0 则奇异。
pub const NORMAL_MATRIX_EPSILON: f32 = 1e-6;

/// 变换矩阵工厂，提供创建各种变换矩阵的静态方法
pub struct TransformFactory;
impl TransformFactory {
    /// 创建绕任意轴旋转的变换矩阵
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let axis_unit = Unit::new_normalize(*axis);
        Matrix4::from(Rotation3::from_axis_angle(&axis_unit, angle_rad))
    }

    /// 创建平移矩阵
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translation)
    }

    /// 创建非均匀缩放矩阵
    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(scale)
    }

    /// 创建视图矩阵 (lookAt)
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(eye, target, up)
    }

    /// 创建透视投影矩阵
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect_ratio, fov_y_rad, near, far)
    }
}

/// 计算法线变换矩阵：`view * model` 左上 3x3 的逆转置
///
/// 非均匀缩放时法线不能直接用模型矩阵变换，否则光照会被拉伸。
/// 左上 3x3 奇异（某轴缩放为 0）时返回 [`SceneError::DegenerateGeometry`]。
pub fn normal_matrix(model: &Matrix4<f32>, view: &Matrix4<f32>) -> Result<Matrix3<f32>> {
    let model_view = view * model;
    let upper: Matrix3<f32> = model_view.fixed_view::<3, 3>(0, 0).into_owned();

    let column_product: f32 = upper.column_iter().map(|c| c.norm()).product();
    if !column_product.is_finite()
        || column_product == 0.0
        || upper.determinant().abs() < NORMAL_MATRIX_EPSILON * column_product
    {
        return Err(SceneError::DegenerateGeometry(
            "模型-视图矩阵左上 3x3 不可逆，无法生成法线矩阵".to_string(),
        ));
    }

    upper
        .try_inverse()
        .map(|inv| inv.transpose())
        .ok_or_else(|| SceneError::DegenerateGeometry("法线矩阵求逆失败".to_string()))
}

/// 节点的局部仿射变换：位置、旋转、非均匀缩放
///
/// 合成顺序固定为 `M = T * R * S`。旋转以度为单位输入，`rotate_x/y/z`
/// 绕节点**当前局部**轴右乘累积；由欧拉角构造时 `R = Rz * Ry * Rx`。
/// `move_*` 系列沿当前旋转后的局部基向量平移（前方为局部 -Z），不受缩放影响。
///
/// 缩放允许为 0，但此时 [`Transform::normal_matrix`] 会失败。
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
    scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// 单位变换
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定位置创建
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_position(x, y, z);
        self
    }

    /// 使用指定缩放创建
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_scale(x, y, z);
        self
    }

    /// 使用欧拉角（度）创建，`R = Rz * Ry * Rx`
    pub fn with_euler_degrees(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_rotation_euler(x, y, z);
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// 合成后的 4x4 齐次矩阵 `T * R * S`
    pub fn to_matrix(&self) -> Matrix4<f32> {
        TransformFactory::translation(&self.position)
            * self.rotation.to_homogeneous()
            * TransformFactory::scaling_nonuniform(&self.scale)
    }

    /// 本变换在给定视图矩阵下的法线矩阵
    pub fn normal_matrix(&self, view: &Matrix4<f32>) -> Result<Matrix3<f32>> {
        normal_matrix(&self.to_matrix(), view)
    }

    /// 恢复为单位变换
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vector3::new(x, y, z);
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.set_scale(s, s, s);
    }

    /// 直接设置旋转为欧拉角（度），覆盖之前累积的旋转
    pub fn set_rotation_euler(&mut self, x_deg: f32, y_deg: f32, z_deg: f32) {
        let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
        self.rotation = rz * ry * rx;
    }

    /// 绕局部任意轴旋转（度）
    pub fn rotate_on_axis(&mut self, axis: &Vector3<f32>, degrees: f32) {
        if axis.norm_squared() == 0.0 {
            return;
        }
        let delta =
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), degrees.to_radians());
        // 右乘：绕当前局部轴；重新归一化以抵消长期累乘的漂移
        self.rotation = UnitQuaternion::new_normalize((self.rotation * delta).into_inner());
    }

    /// 绕父空间中的轴旋转（度），轴穿过节点自身原点
    ///
    /// 左乘累积旋转；对挂在根下的节点即绕世界轴旋转。
    pub fn rotate_on_world_axis(&mut self, axis: &Vector3<f32>, degrees: f32) {
        if axis.norm_squared() == 0.0 {
            return;
        }
        let delta =
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), degrees.to_radians());
        self.rotation = UnitQuaternion::new_normalize((delta * self.rotation).into_inner());
    }

    pub fn rotate_x(&mut self, degrees: f32) {
        self.rotate_on_axis(&Vector3::x(), degrees);
    }

    pub fn rotate_y(&mut self, degrees: f32) {
        self.rotate_on_axis(&Vector3::y(), degrees);
    }

    pub fn rotate_z(&mut self, degrees: f32) {
        self.rotate_on_axis(&Vector3::z(), degrees);
    }

    /// 局部 +X 在父空间中的方向
    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::x()
    }

    /// 局部 +Y 在父空间中的方向
    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// 局部 -Z 在父空间中的方向
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * -Vector3::z()
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    pub fn move_back(&mut self, distance: f32) {
        self.move_forward(-distance);
    }

    pub fn move_up(&mut self, distance: f32) {
        self.position += self.up() * distance;
    }

    pub fn move_down(&mut self, distance: f32) {
        self.move_up(-distance);
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right() * distance;
    }

    pub fn move_left(&mut self, distance: f32) {
        self.move_right(-distance);
    }
}
