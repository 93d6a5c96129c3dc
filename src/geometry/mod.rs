// geometry/mod.rs
// 导出几何、变换、相机与重心坐标相关模块
pub mod camera;
pub mod interpolation;
pub mod primitives;
pub mod transform;
