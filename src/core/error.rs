//! 场景图核心的错误类型

use thiserror::Error;

/// 场景图、相机与重心坐标计算的统一错误类型
///
/// 所有错误都是同步、局部的：在触发它的调用处返回，不会跨帧传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 结构错误：非法的父子关系（自引用、成环、重复挂载）
    #[error("结构错误: {0}")]
    Structural(String),

    /// 退化几何：零面积三角形、奇异法线矩阵、up 与视线平行
    #[error("退化几何: {0}")]
    DegenerateGeometry(String),

    /// 越界：在三角形外部请求插值
    #[error("越界: {0}")]
    OutOfRange(String),

    /// 节点 ID 不存在
    #[error("未知节点: {0}")]
    UnknownNode(usize),

    /// 外部渲染协作方返回的错误
    #[error("渲染错误: {0}")]
    Render(String),
}

/// 使用 [`SceneError`] 的结果别名
pub type Result<T> = std::result::Result<T, SceneError>;
