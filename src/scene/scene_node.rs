use crate::geometry::interpolation::Color;
use crate::geometry::transform::Transform;
use nalgebra::Vector3;

/// 节点标识符，由 [`SceneGraph`](crate::scene::scene_graph::SceneGraph) 分配
pub type NodeId = usize;

/// 可绘制的基本几何体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// 边长为 1、中心在原点的立方体
    Cube,
    /// 半径为 1 的球体
    Sphere,
    /// 半径为 1、高为 1、沿 Y 轴、中心在原点的圆柱
    Cylinder,
}

/// 默认高光指数
pub const DEFAULT_SHININESS: f32 = 28.0;

/// 法线来源：逐顶点平滑法线或逐面法线
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Shading {
    #[default]
    Smooth,
    Flat,
}

impl Shading {
    pub fn toggled(self) -> Self {
        match self {
            Shading::Smooth => Shading::Flat,
            Shading::Flat => Shading::Smooth,
        }
    }
}

/// 节点附带的绘制能力：交给外部渲染协作方的几何体种类与材质
///
/// `specular` 为材质的高光反射系数，默认 0 即没有高光。
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub primitive: Primitive,
    pub color: Color,
    pub specular: f32,
    pub shininess: f32,
    pub shading: Shading,
}

impl Drawable {
    pub fn new(primitive: Primitive, color: Color) -> Self {
        Self {
            primitive,
            color,
            specular: 0.0,
            shininess: DEFAULT_SHININESS,
            shading: Shading::Smooth,
        }
    }

    /// 设置高光系数与高光指数
    pub fn with_specular(mut self, specular: f32, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    pub fn cube(color: Color) -> Self {
        Self::new(Primitive::Cube, color)
    }

    pub fn sphere(color: Color) -> Self {
        Self::new(Primitive::Sphere, color)
    }

    pub fn cylinder(color: Color) -> Self {
        Self::new(Primitive::Cylinder, color)
    }
}

impl Default for Drawable {
    fn default() -> Self {
        Self::cube(Vector3::new(0.0, 1.0, 0.0))
    }
}

/// 场景树中的一个节点：局部变换 + 可选绘制能力 + 有序子节点
///
/// 没有绘制能力的节点是“哑节点”，只用来组织层级（例如转轴）。
/// 父子关系由场景图维护，节点本身只能读取。
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// 局部变换（相对父节点）
    pub transform: Transform,
    /// 可选的绘制能力
    pub drawable: Option<Drawable>,
    /// 可选名称，用于在场景图中查找
    pub name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    /// 创建一个不可绘制的哑节点
    pub fn new() -> Self {
        Self {
            transform: Transform::new(),
            drawable: None,
            name: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// 创建带绘制能力的节点
    pub fn with_drawable(drawable: Drawable) -> Self {
        Self {
            drawable: Some(drawable),
            ..Self::new()
        }
    }

    /// 使用指定变换
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// 添加名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 子节点，按插入顺序
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}
