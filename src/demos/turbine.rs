use crate::core::error::Result;
use crate::core::frame_loop::{Animation, FrameLoop, InputHandler};
use crate::demos::DemoScene;
use crate::geometry::camera::Camera;
use crate::geometry::transform::Transform;
use crate::scene::scene_graph::SceneGraph;
use crate::scene::scene_node::{Drawable, NodeId, SceneNode};
use log::debug;
use nalgebra::{Point3, Vector3};

/// 轮毂与叶片转轴的角速度（度/秒），约为 60 帧下每帧 0.87 度
pub const HUB_SPIN_DEGREES_PER_SECOND: f32 = 52.36;
/// t/T、s/S 每次旋转的角度
pub const KEY_ROTATION_DEGREES: f32 = 15.0;
/// g 放大、G 缩小的倍率
pub const GROW_FACTOR: f32 = 1.25;
pub const SHRINK_FACTOR: f32 = 0.8;

/// 风力发电机各节点的 ID
#[derive(Debug, Clone, Copy)]
pub struct TurbineNodes {
    pub root: NodeId,
    pub shaft: NodeId,
    pub top: NodeId,
    pub housing: NodeId,
    pub hub_dummy: NodeId,
    pub hub: NodeId,
    pub blade_dummy: NodeId,
    pub blade1: NodeId,
    pub blade2: NodeId,
}

fn green() -> Vector3<f32> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// 构建风力发电机层级
///
/// ```text
/// root ── shaft
///      └─ top ── housing
///             └─ hub_dummy ── hub
///                          └─ blade_dummy ── blade1
///                                         └─ blade2
/// ```
pub fn build_scene() -> Result<(SceneGraph, TurbineNodes)> {
    let mut scene = SceneGraph::new();

    let root = scene.insert(SceneNode::new().named("turbine"));

    let shaft = scene.attach(
        root,
        SceneNode::with_drawable(Drawable::cylinder(green()))
            .named("shaft")
            .transform(Transform::new().with_scale(1.5, 20.0, 1.5)),
    )?;

    let top = scene.attach(
        root,
        SceneNode::new()
            .named("top")
            .transform(Transform::new().with_position(0.0, 10.0, 0.0)),
    )?;

    // 外壳：先绕 X 转 90 度，再沿自身轴向移动
    let mut housing_transform = Transform::new();
    housing_transform.rotate_x(90.0);
    housing_transform.move_back(2.0);
    housing_transform.move_down(1.0);
    housing_transform.set_scale(2.0, 5.0, 2.0);
    housing_transform.move_forward(2.0);
    let housing = scene.attach(
        top,
        SceneNode::with_drawable(Drawable::cylinder(green()))
            .named("housing")
            .transform(housing_transform),
    )?;

    let mut hub_dummy_transform = Transform::new();
    hub_dummy_transform.move_forward(5.0);
    let hub_dummy = scene.attach(
        top,
        SceneNode::new()
            .named("hub_dummy")
            .transform(hub_dummy_transform),
    )?;

    let mut hub_transform = Transform::new();
    hub_transform.rotate_x(90.0);
    hub_transform.set_scale(1.0, 3.0, 1.0);
    let hub = scene.attach(
        hub_dummy,
        SceneNode::with_drawable(Drawable::cylinder(green()))
            .named("hub")
            .transform(hub_transform),
    )?;

    let blade_dummy = scene.attach(hub_dummy, SceneNode::new().named("blade_dummy"))?;

    let blade = |name: &str, offset: f32| {
        let mut transform = Transform::new();
        transform.move_up(offset);
        transform.set_scale(1.5, 7.5, 0.75);
        SceneNode::with_drawable(Drawable::sphere(green()))
            .named(name)
            .transform(transform)
    };
    let blade1 = scene.attach(blade_dummy, blade("blade1", 6.0))?;
    let blade2 = scene.attach(blade_dummy, blade("blade2", -6.0))?;

    Ok((
        scene,
        TurbineNodes {
            root,
            shaft,
            top,
            housing,
            hub_dummy,
            hub,
            blade_dummy,
            blade1,
            blade2,
        },
    ))
}

pub fn camera() -> Camera {
    Camera::new(
        Point3::new(40.0, 40.0, 40.0),
        Point3::origin(),
        Vector3::y(),
        30.0,
        1.5,
        1.0,
        100.0,
    )
}

/// 风力发电机的按键控制
pub struct TurbineControls {
    nodes: TurbineNodes,
    scale: f32,
}

impl TurbineControls {
    pub fn new(nodes: TurbineNodes) -> Self {
        Self { nodes, scale: 1.0 }
    }

    fn rescale(&mut self, factor: f32, scene: &mut SceneGraph) -> bool {
        self.scale *= factor;
        match scene.transform_mut(self.nodes.root) {
            Ok(transform) => {
                transform.set_uniform_scale(self.scale);
                debug!("风力发电机缩放: {:.3}", self.scale);
                true
            }
            Err(_) => false,
        }
    }

    fn rotate(scene: &mut SceneGraph, node: NodeId, degrees: f32) -> bool {
        scene
            .transform_mut(node)
            .map(|transform| transform.rotate_y(degrees))
            .is_ok()
    }
}

impl InputHandler for TurbineControls {
    fn handle_key(
        &mut self,
        key: char,
        scene: &mut SceneGraph,
        _animations: &mut Vec<Animation>,
    ) -> bool {
        let nodes = self.nodes;
        match key {
            't' => Self::rotate(scene, nodes.top, KEY_ROTATION_DEGREES),
            'T' => Self::rotate(scene, nodes.top, -KEY_ROTATION_DEGREES),
            's' => {
                Self::rotate(scene, nodes.blade1, -KEY_ROTATION_DEGREES)
                    && Self::rotate(scene, nodes.blade2, KEY_ROTATION_DEGREES)
            }
            'S' => {
                Self::rotate(scene, nodes.blade1, KEY_ROTATION_DEGREES)
                    && Self::rotate(scene, nodes.blade2, -KEY_ROTATION_DEGREES)
            }
            'g' => self.rescale(GROW_FACTOR, scene),
            'G' => self.rescale(SHRINK_FACTOR, scene),
            _ => false,
        }
    }
}

/// 组装帧循环；相机按键关闭，因为 s/S 与相机的前后移动冲突
pub fn build() -> Result<DemoScene> {
    let (scene, nodes) = build_scene()?;
    let mut frame_loop = FrameLoop::new(scene, nodes.root, camera())
        .with_controls(Box::new(TurbineControls::new(nodes)))
        .with_camera_controls(false);
    frame_loop.add_animation(Animation::spin_z(nodes.hub_dummy, HUB_SPIN_DEGREES_PER_SECOND));
    frame_loop.add_animation(Animation::spin_z(nodes.blade_dummy, HUB_SPIN_DEGREES_PER_SECOND));

    Ok(DemoScene {
        name: "turbine",
        frame_loop,
        background: Vector3::new(0.9, 0.9, 0.9),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_position(scene: &SceneGraph, id: NodeId) -> Vector3<f32> {
        let world = scene.world_matrix(id).unwrap();
        Vector3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)])
    }

    #[test]
    fn housing_ends_up_behind_the_top() {
        let (scene, nodes) = build_scene().unwrap();
        let housing = scene.get(nodes.housing).unwrap().transform.position();
        assert!((housing - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
        assert!((world_position(&scene, nodes.hub_dummy) - Vector3::new(0.0, 10.0, -5.0)).norm() < 1e-5);
    }

    #[test]
    fn blades_sit_on_either_side_of_the_hub() {
        let (scene, nodes) = build_scene().unwrap();
        let b1 = world_position(&scene, nodes.blade1);
        let b2 = world_position(&scene, nodes.blade2);
        assert!((b1 - Vector3::new(0.0, 16.0, -5.0)).norm() < 1e-4);
        assert!((b2 - Vector3::new(0.0, 4.0, -5.0)).norm() < 1e-4);
        assert_eq!(scene.len(), 9);
    }

    #[test]
    fn grow_then_shrink_restores_scale() {
        let (mut scene, nodes) = build_scene().unwrap();
        let mut controls = TurbineControls::new(nodes);
        let mut animations = Vec::new();
        assert!(controls.handle_key('g', &mut scene, &mut animations));
        let grown = scene.get(nodes.root).unwrap().transform.scale();
        assert!((grown - Vector3::repeat(1.25)).norm() < 1e-6);
        assert!(controls.handle_key('G', &mut scene, &mut animations));
        let restored = scene.get(nodes.root).unwrap().transform.scale();
        assert!((restored - Vector3::repeat(1.0)).norm() < 1e-6);
    }

    #[test]
    fn blade_keys_counter_rotate() {
        let (mut scene, nodes) = build_scene().unwrap();
        let mut controls = TurbineControls::new(nodes);
        assert!(controls.handle_key('s', &mut scene, &mut Vec::new()));
        let f1 = scene.get(nodes.blade1).unwrap().transform.forward();
        let f2 = scene.get(nodes.blade2).unwrap().transform.forward();
        // 绕 Y 转 ∓15 度后，前方向的 x 分量符号相反
        assert!(f1.x * f2.x < 0.0);
        assert!(!controls.handle_key('q', &mut scene, &mut Vec::new()));
    }
}
