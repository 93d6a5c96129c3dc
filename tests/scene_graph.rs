use nalgebra::{Matrix4, Point2, Point3, Vector3};
use scenegraph::core::error::{Result, SceneError};
use scenegraph::core::frame_loop::FrameOutcome;
use scenegraph::core::rasterizer::SoftwareRenderer;
use scenegraph::demos;
use scenegraph::demos::color_picker::ColorPicker;
use scenegraph::geometry::interpolation::{classify, interpolate};
use scenegraph::io::render_settings::{DemoKind, RenderSettings};
use scenegraph::utils::render_process::run_frames;
use scenegraph::{DrawTarget, Drawable, NodeId, SceneGraph, SceneNode, Transform};

/// 记录每次 draw 收到的节点名与世界矩阵
#[derive(Default)]
struct Recorder {
    calls: Vec<(String, Matrix4<f32>)>,
}

impl DrawTarget for Recorder {
    fn begin_frame(&mut self, _: &Matrix4<f32>, _: &Matrix4<f32>) -> Result<()> {
        self.calls.clear();
        Ok(())
    }

    fn draw(&mut self, node: &SceneNode, _: &Drawable, world: &Matrix4<f32>) -> Result<()> {
        self.calls
            .push((node.name.clone().unwrap_or_default(), *world));
        Ok(())
    }
}

/// 小型线性同余生成器，给随机树用
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn angle(&mut self) -> f32 {
        (self.next() % 360) as f32
    }

    fn offset(&mut self) -> f32 {
        (self.next() % 200) as f32 / 100.0 - 1.0
    }
}

fn random_tree(seed: u64, size: usize) -> (SceneGraph, Vec<NodeId>) {
    let mut rng = Lcg(seed);
    let mut graph = SceneGraph::new();
    let mut ids = vec![graph.insert(SceneNode::with_drawable(Drawable::default()).named("n0"))];
    for i in 1..size {
        let parent = ids[(rng.next() as usize) % ids.len()];
        let mut transform = Transform::new().with_position(rng.offset(), rng.offset(), rng.offset());
        transform.rotate_x(rng.angle());
        transform.rotate_y(rng.angle());
        transform.set_scale(1.0 + rng.offset() * 0.5, 1.0, 1.0 + rng.offset() * 0.5);
        let node = SceneNode::with_drawable(Drawable::default())
            .named(format!("n{}", i))
            .transform(transform);
        ids.push(graph.attach(parent, node).unwrap());
    }
    (graph, ids)
}

#[test]
fn world_matrix_is_product_along_the_path() {
    for seed in 1..6 {
        let (graph, ids) = random_tree(seed, 24);
        let mut recorder = Recorder::default();
        graph.render(ids[0], &Matrix4::identity(), &mut recorder).unwrap();
        assert_eq!(recorder.calls.len(), ids.len());

        for (name, world) in &recorder.calls {
            let id = graph.find(name).unwrap();
            // 手动沿父链相乘
            let mut expected = Matrix4::identity();
            let mut current = Some(id);
            while let Some(n) = current {
                let node = graph.get(n).unwrap();
                expected = node.transform.to_matrix() * expected;
                current = node.parent();
            }
            assert!((world - expected).norm() < 1e-4, "seed {} node {}", seed, name);
        }
    }
}

#[test]
fn no_node_is_its_own_ancestor_and_cycles_are_refused() {
    for seed in 10..15 {
        let (mut graph, ids) = random_tree(seed, 30);
        for &id in &ids {
            assert!(!graph.is_ancestor(id, id));
        }
        for &id in &ids[1..] {
            // 任意节点都不能挂到自己的子孙下
            let root = ids[0];
            assert!(matches!(graph.add_child(id, root), Err(SceneError::Structural(_))));
        }
    }
}

#[test]
fn move_forward_after_quarter_turn_goes_along_negative_x() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(SceneNode::new());
    let ship = graph
        .attach(root, SceneNode::with_drawable(Drawable::default()).named("ship"))
        .unwrap();

    let transform = graph.transform_mut(ship).unwrap();
    transform.rotate_y(90.0);
    transform.set_scale(3.0, 3.0, 3.0);
    transform.move_forward(2.0);

    let world = graph.world_matrix(ship).unwrap();
    let origin = world.transform_point(&Point3::origin());
    assert!((origin - Point3::new(-2.0, 0.0, 0.0)).norm() < 1e-5);
}

#[test]
fn re_rendering_gives_identical_matrices() {
    let (graph, ids) = random_tree(99, 12);
    let mut first = Recorder::default();
    let mut second = Recorder::default();
    graph.render(ids[0], &Matrix4::identity(), &mut first).unwrap();
    graph.render(ids[0], &Matrix4::identity(), &mut second).unwrap();
    assert_eq!(first.calls, second.calls);
}

#[test]
fn turbine_top_key_yaws_the_hub_about_the_tower() {
    let mut demo = demos::build(DemoKind::Turbine).unwrap();
    let hub = demo.frame_loop.scene.find("hub_dummy").unwrap();
    let before = demo.frame_loop.scene.world_matrix(hub).unwrap();

    let mut recorder = Recorder::default();
    demo.frame_loop.queue_inputs("tttttt");
    assert_eq!(demo.frame_loop.tick(0.0, &mut recorder), FrameOutcome::Rendered);

    // 6 × 15 度 = 90 度：轮毂从 -Z 转到 -X
    let after = demo.frame_loop.scene.world_matrix(hub).unwrap();
    let p0 = before.transform_point(&Point3::origin());
    let p1 = after.transform_point(&Point3::origin());
    assert!((p0 - Point3::new(0.0, 10.0, -5.0)).norm() < 1e-4);
    assert!((p1 - Point3::new(-5.0, 10.0, 0.0)).norm() < 1e-4);
    // 塔身、外壳、轮毂与两片叶片
    assert_eq!(recorder.calls.len(), 5);
}

#[test]
fn turbine_blade_key_is_not_taken_by_the_camera() {
    let mut demo = demos::build(DemoKind::Turbine).unwrap();
    let eye = demo.frame_loop.camera.eye;
    demo.frame_loop.queue_input('s');
    demo.frame_loop.tick(0.0, &mut Recorder::default());
    assert_eq!(demo.frame_loop.camera.eye, eye);
    assert_eq!(demo.frame_loop.stats().inputs_handled, 1);
}

#[test]
fn shrunken_turbine_keeps_rendering() {
    let mut demo = demos::build(DemoKind::Turbine).unwrap();
    let mut renderer = SoftwareRenderer::new(32, 24);
    demo.frame_loop.queue_inputs(&"G".repeat(30));

    for _ in 0..3 {
        assert_eq!(demo.frame_loop.tick(1.0 / 60.0, &mut renderer), FrameOutcome::Rendered);
    }
    let root = demo.frame_loop.root();
    let scale = demo.frame_loop.scene.get(root).unwrap().transform.scale();
    assert!(scale.x < 0.002);
    assert_eq!(demo.frame_loop.stats().frames_skipped, 0);
}

#[test]
fn lighting_demo_survives_a_collapsed_viewport() {
    let mut demo = demos::build(DemoKind::Lighting).unwrap();
    let mut renderer = SoftwareRenderer::new(8, 8);
    demo.frame_loop.camera.set_aspect_ratio(0.0);
    assert_eq!(demo.frame_loop.tick(0.0, &mut renderer), FrameOutcome::Skipped);
    demo.frame_loop.camera.set_aspect_ratio(1.5);
    assert_eq!(demo.frame_loop.tick(0.0, &mut renderer), FrameOutcome::Rendered);
}

#[test]
fn lighting_demo_routes_camera_keys_first() {
    let mut demo = demos::build(DemoKind::Lighting).unwrap();
    let eye = demo.frame_loop.camera.eye;
    demo.frame_loop.queue_inputs("wz ");
    demo.frame_loop.tick(0.0, &mut Recorder::default());
    assert_ne!(demo.frame_loop.camera.eye, eye);
    assert!(demo.frame_loop.is_paused());
    assert_eq!(demo.frame_loop.animations()[0].axis, Vector3::z());
}

#[test]
fn scripted_run_renders_every_frame() {
    let mut demo = demos::build(DemoKind::Propeller).unwrap();
    let settings = RenderSettings {
        demo: DemoKind::Propeller,
        width: 48,
        height: 32,
        frames: 4,
        keys: ".. .".to_string(),
        ..Default::default()
    };
    demo.apply_settings(&settings).unwrap();
    let mut renderer = SoftwareRenderer::new(settings.width, settings.height);
    let mut seen = Vec::new();

    let stats = run_frames(&mut demo, &settings, &mut renderer, |frame, renderer| {
        seen.push((frame, renderer.triangles_drawn()));
        Ok(())
    })
    .unwrap();

    assert_eq!(stats.frames_rendered, 4);
    assert_eq!(stats.inputs_handled, 1);
    assert!(demo.frame_loop.is_paused());
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|&(_, triangles)| triangles > 0));
}

#[test]
fn picker_matches_direct_interpolation() {
    let mut picker = ColorPicker::new(400, 400);
    let [p1, p2, p3] = picker.triangle.vertices;
    let colors = picker.triangle.colors;

    for &(x, y) in &[(100.0, 100.0), (50.0, 60.0), (150.0, 70.0), (100.0, 340.0)] {
        let q = Point2::new(x, y);
        let expected = interpolate(p1, p2, p3, &colors, q).unwrap();
        let picked = picker.pick(q).unwrap().unwrap();
        assert!((picked - expected).norm() < 1e-6);
        let bary = classify(p1, p2, p3, q).unwrap();
        assert!((bary.sum() - 1.0).abs() < 1e-5);
    }
    assert_eq!(picker.pick(Point2::new(300.0, 300.0)).unwrap(), None);
}
