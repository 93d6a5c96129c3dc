use crate::core::error::Result;
use crate::core::frame_loop::{Animation, FrameLoop, InputHandler};
use crate::demos::DemoScene;
use crate::geometry::camera::Camera;
use crate::scene::scene_graph::SceneGraph;
use crate::scene::scene_node::{DEFAULT_SHININESS, Drawable, NodeId, SceneNode};
use log::{debug, info};
use nalgebra::Vector3;

/// 模型绕世界轴的角速度（度/秒），60 帧下每帧 0.5 度
pub const SPIN_DEGREES_PER_SECOND: f32 = 30.0;
/// 高光指数的下限
pub const MIN_SHININESS: f32 = 1.0;
/// 黄铜材质的高光反射系数
pub const BRASS_SPECULAR: f32 = 0.9;

fn brass() -> Drawable {
    Drawable::sphere(Vector3::new(0.78, 0.57, 0.11)).with_specular(BRASS_SPECULAR, DEFAULT_SHININESS)
}

pub fn camera() -> Camera {
    let mut camera = Camera::default();
    camera.set_position(5.0, 5.0, 5.0);
    camera.look_at(0.0, 0.0, 0.0);
    camera.set_aspect_ratio(1.5);
    camera
}

/// 单个模型：根哑节点下挂一个黄铜球
pub fn build_scene() -> Result<(SceneGraph, NodeId, NodeId)> {
    let mut scene = SceneGraph::new();
    let root = scene.insert(SceneNode::new().named("world"));
    let model = scene.attach(root, SceneNode::with_drawable(brass()).named("model"))?;
    Ok((scene, root, model))
}

/// x/y/z 选择世界旋转轴，o 复位模型并回到 x 轴，
/// t/T 增减高光指数，n 切换面法线与顶点法线
pub struct LightingControls {
    model: NodeId,
}

impl LightingControls {
    pub fn new(model: NodeId) -> Self {
        Self { model }
    }

    fn set_axis(&self, animations: &mut Vec<Animation>, axis: Vector3<f32>) {
        animations.retain(|a| a.node != self.model);
        animations.push(Animation::world(self.model, axis, SPIN_DEGREES_PER_SECOND));
    }

    fn material<'a>(&self, scene: &'a mut SceneGraph) -> Option<&'a mut Drawable> {
        scene.get_mut(self.model).and_then(|node| node.drawable.as_mut())
    }

    fn adjust_shininess(&self, scene: &mut SceneGraph, delta: f32) -> bool {
        let Some(material) = self.material(scene) else {
            return false;
        };
        material.shininess = (material.shininess + delta).max(MIN_SHININESS);
        info!("高光指数: {}", material.shininess);
        true
    }
}

impl InputHandler for LightingControls {
    fn handle_key(
        &mut self,
        key: char,
        scene: &mut SceneGraph,
        animations: &mut Vec<Animation>,
    ) -> bool {
        match key {
            'x' => self.set_axis(animations, Vector3::x()),
            'y' => self.set_axis(animations, Vector3::y()),
            'z' => self.set_axis(animations, Vector3::z()),
            'o' => {
                match scene.transform_mut(self.model) {
                    Ok(transform) => transform.reset(),
                    Err(_) => return false,
                }
                self.set_axis(animations, Vector3::x());
            }
            't' => return self.adjust_shininess(scene, 1.0),
            'T' => return self.adjust_shininess(scene, -1.0),
            'n' => {
                let Some(material) = self.material(scene) else {
                    return false;
                };
                material.shading = material.shading.toggled();
                info!("法线模式: {:?}", material.shading);
                return true;
            }
            _ => return false,
        }
        debug!("模型旋转轴切换: {:?}", key);
        true
    }
}

pub fn build() -> Result<DemoScene> {
    let (scene, root, model) = build_scene()?;
    let mut frame_loop = FrameLoop::new(scene, root, camera())
        .with_controls(Box::new(LightingControls::new(model)));
    frame_loop.add_animation(Animation::world(model, Vector3::x(), SPIN_DEGREES_PER_SECOND));

    Ok(DemoScene {
        name: "lighting",
        frame_loop,
        background: Vector3::new(0.0, 0.2, 0.2),
    })
}
