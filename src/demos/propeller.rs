use crate::core::error::Result;
use crate::core::frame_loop::{Animation, FrameLoop};
use crate::demos::DemoScene;
use crate::geometry::camera::Camera;
use crate::geometry::transform::Transform;
use crate::scene::scene_graph::SceneGraph;
use crate::scene::scene_node::{Drawable, NodeId, SceneNode};
use nalgebra::{Point3, Vector3};

/// 公转半径
pub const ORBIT_RADIUS: f32 = 0.75;
/// 公转角速度（度/秒）
pub const ORBIT_DEGREES_PER_SECOND: f32 = 60.0;
/// 相对公转臂的自转角速度（度/秒）；叠加公转后绝对转速为 240 度/秒
pub const SPIN_DEGREES_PER_SECOND: f32 = 180.0;

#[derive(Debug, Clone, Copy)]
pub struct PropellerNodes {
    pub orbit: NodeId,
    pub spin: NodeId,
    pub blade_a: NodeId,
    pub blade_b_pivot: NodeId,
    pub blade_b: NodeId,
}

fn blade(name: &str) -> SceneNode {
    SceneNode::with_drawable(Drawable::cube(Vector3::new(1.0, 0.0, 0.0)))
        .named(name)
        .transform(
            Transform::new()
                .with_position(0.075, 0.45, 0.0)
                .with_scale(0.15, 0.9, 0.05),
        )
}

/// orbit ── arm(平移到圆周) ── spin ── blade_a
///                                  └─ blade_b_pivot(绕 Z 转 180 度) ── blade_b
pub fn build_scene() -> Result<(SceneGraph, PropellerNodes)> {
    let mut scene = SceneGraph::new();
    let orbit = scene.insert(SceneNode::new().named("orbit"));
    let arm = scene.attach(
        orbit,
        SceneNode::new()
            .named("arm")
            .transform(Transform::new().with_position(ORBIT_RADIUS, 0.0, 0.0)),
    )?;
    let spin = scene.attach(arm, SceneNode::new().named("spin"))?;
    let blade_a = scene.attach(spin, blade("blade_a"))?;
    let blade_b_pivot = scene.attach(
        spin,
        SceneNode::new()
            .named("blade_b_pivot")
            .transform(Transform::new().with_euler_degrees(0.0, 0.0, 180.0)),
    )?;
    let blade_b = scene.attach(blade_b_pivot, blade("blade_b"))?;

    Ok((
        scene,
        PropellerNodes {
            orbit,
            spin,
            blade_a,
            blade_b_pivot,
            blade_b,
        },
    ))
}

pub fn camera() -> Camera {
    Camera::new(
        Point3::new(0.0, 0.0, 5.0),
        Point3::origin(),
        Vector3::y(),
        45.0,
        1.5,
        0.1,
        100.0,
    )
}

pub fn build() -> Result<DemoScene> {
    let (scene, nodes) = build_scene()?;
    let mut frame_loop = FrameLoop::new(scene, nodes.orbit, camera());
    frame_loop.add_animation(Animation::spin_z(nodes.orbit, ORBIT_DEGREES_PER_SECOND));
    frame_loop.add_animation(Animation::spin_z(nodes.spin, SPIN_DEGREES_PER_SECOND));

    Ok(DemoScene {
        name: "propeller",
        frame_loop,
        background: Vector3::new(0.0, 0.8, 0.8),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blades_are_point_symmetric_about_the_hub() {
        let (scene, nodes) = build_scene().unwrap();
        let hub = scene
            .world_matrix(nodes.spin)
            .unwrap()
            .transform_point(&Point3::origin());
        let tip_a = scene
            .world_matrix(nodes.blade_a)
            .unwrap()
            .transform_point(&Point3::new(0.0, 0.5, 0.0));
        let tip_b = scene
            .world_matrix(nodes.blade_b)
            .unwrap()
            .transform_point(&Point3::new(0.0, 0.5, 0.0));
        assert!(((tip_a - hub) + (tip_b - hub)).norm() < 1e-5);
    }

    #[test]
    fn hub_follows_the_orbit_circle() {
        let (mut scene, nodes) = build_scene().unwrap();
        scene.transform_mut(nodes.orbit).unwrap().rotate_z(90.0);
        let hub = scene
            .world_matrix(nodes.spin)
            .unwrap()
            .transform_point(&Point3::origin());
        assert!((hub - Point3::new(0.0, ORBIT_RADIUS, 0.0)).norm() < 1e-5);
    }
}
