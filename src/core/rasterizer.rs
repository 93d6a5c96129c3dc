use crate::core::error::{Result, SceneError};
use crate::core::frame_buffer::FrameBuffer;
use crate::geometry::interpolation::{Color, classify};
use crate::geometry::primitives::{Mesh, MeshLibrary};
use crate::geometry::transform::normal_matrix;
use crate::scene::scene_graph::DrawTarget;
use crate::scene::scene_node::{Drawable, SceneNode, Shading};
use log::debug;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};
use rayon::prelude::*;

/// 裁剪空间 w 低于此值的顶点视为在相机后方
const W_EPSILON: f32 = 1e-5;

/// 光照参数：世界空间白色点光源 + 环境光系数 + 光源高光强度
///
/// 最终高光 = `specular * 材质高光系数 * max(0, V·R)^shininess`。
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub light_position: Point3<f32>,
    pub ambient: f32,
    pub specular: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: Point3::new(5.0, 10.0, 5.0),
            ambient: 0.1,
            specular: 0.7,
        }
    }
}

/// Phong 反射的漫反射与高光因子
///
/// 三个向量都在同一空间且已归一化：`normal` 为表面法线，
/// `to_light` 指向光源，`to_eye` 指向观察者。背光面没有高光。
pub fn phong_factors(
    normal: &Vector3<f32>,
    to_light: &Vector3<f32>,
    to_eye: &Vector3<f32>,
    shininess: f32,
) -> (f32, f32) {
    let n_dot_l = normal.dot(to_light);
    if n_dot_l <= 0.0 {
        return (0.0, 0.0);
    }
    let reflected = normal * (2.0 * n_dot_l) - to_light;
    let specular = reflected.dot(to_eye).max(0.0).powf(shininess);
    (n_dot_l, specular)
}

/// 已完成顶点着色的屏幕空间顶点
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pix: Point2<f32>,
    depth: f32,
    color: Color,
}

/// 每帧的矩阵快照
struct FrameMatrices {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

/// 单次绘制共用的着色输入（视图空间）
struct ShadingInput<'a> {
    model_view: Matrix4<f32>,
    normal_matrix: &'a Matrix3<f32>,
    light_view: Point3<f32>,
    material: &'a Drawable,
}

/// 无头软件渲染器：逐顶点 Phong 光照（Gouraud 插值）+ 重心坐标光栅化 + 深度测试
pub struct SoftwareRenderer {
    pub frame_buffer: FrameBuffer,
    pub lighting: Lighting,
    pub background: Color,
    meshes: MeshLibrary,
    matrices: FrameMatrices,
    triangles_drawn: usize,
}

impl SoftwareRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame_buffer: FrameBuffer::new(width, height),
            lighting: Lighting::default(),
            background: Vector3::new(0.0, 0.0, 0.0),
            meshes: MeshLibrary::new(),
            matrices: FrameMatrices {
                view: Matrix4::identity(),
                projection: Matrix4::identity(),
            },
            triangles_drawn: 0,
        }
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn width(&self) -> usize {
        self.frame_buffer.width
    }

    pub fn height(&self) -> usize {
        self.frame_buffer.height
    }

    /// 上一帧光栅化的三角形数
    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    /// 顶点变换与光照计算（视图空间，相机位于原点）
    fn shade_vertex(
        &self,
        position: &Point3<f32>,
        normal: &Vector3<f32>,
        input: &ShadingInput,
    ) -> Option<ScreenVertex> {
        let clip = self.matrices.projection * input.model_view * position.to_homogeneous();
        if clip.w <= W_EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;

        let width = self.frame_buffer.width as f32;
        let height = self.frame_buffer.height as f32;
        // 翻转 Y 轴：NDC +1 在顶部，像素第 0 行在顶部
        let pix = Point2::new((ndc.x + 1.0) * width / 2.0, height - (ndc.y + 1.0) * height / 2.0);

        let position_view = input.model_view.transform_point(position);
        let normal_view = (input.normal_matrix * normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let to_light = (input.light_view - position_view).try_normalize(f32::EPSILON);
        let to_eye = (-position_view.coords).try_normalize(f32::EPSILON);

        let (diffuse, highlight) = match (to_light, to_eye) {
            (Some(l), Some(v)) => phong_factors(&normal_view, &l, &v, input.material.shininess),
            (Some(l), None) => (normal_view.dot(&l).max(0.0), 0.0),
            _ => (0.0, 0.0),
        };
        let specular = self.lighting.specular * input.material.specular * highlight;

        Some(ScreenVertex {
            pix,
            depth: ndc.z,
            color: input.material.color * (self.lighting.ambient + diffuse)
                + Vector3::repeat(specular),
        })
    }

    fn draw_mesh(
        &self,
        mesh: &Mesh,
        world: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        material: &Drawable,
    ) -> usize {
        let input = ShadingInput {
            model_view: self.matrices.view * world,
            normal_matrix,
            light_view: self
                .matrices
                .view
                .transform_point(&self.lighting.light_position),
            material,
        };

        let mut drawn = 0;
        match material.shading {
            Shading::Smooth => {
                let vertices: Vec<Option<ScreenVertex>> = mesh
                    .positions
                    .iter()
                    .zip(&mesh.normals)
                    .map(|(position, normal)| self.shade_vertex(position, normal, &input))
                    .collect();

                for &[a, b, c] in &mesh.indices {
                    // 只要有一个顶点在相机后方就整体丢弃，不做裁剪
                    if let (Some(v0), Some(v1), Some(v2)) = (vertices[a], vertices[b], vertices[c])
                    {
                        if self.rasterize_triangle(&[v0, v1, v2]) {
                            drawn += 1;
                        }
                    }
                }
            }
            Shading::Flat => {
                for &[a, b, c] in &mesh.indices {
                    let corners = [mesh.positions[a], mesh.positions[b], mesh.positions[c]];
                    let Some(face_normal) = (corners[1] - corners[0])
                        .cross(&(corners[2] - corners[0]))
                        .try_normalize(f32::EPSILON)
                    else {
                        continue;
                    };
                    let shaded = corners.map(|p| self.shade_vertex(&p, &face_normal, &input));
                    if let [Some(v0), Some(v1), Some(v2)] = shaded {
                        if self.rasterize_triangle(&[v0, v1, v2]) {
                            drawn += 1;
                        }
                    }
                }
            }
        }
        drawn
    }

    /// 按行并行光栅化一个三角形；屏幕上退化的三角形直接跳过
    fn rasterize_triangle(&self, triangle: &[ScreenVertex; 3]) -> bool {
        let [v0, v1, v2] = triangle;
        if classify(v0.pix, v1.pix, v2.pix, v0.pix).is_err() {
            return false;
        }

        let width = self.frame_buffer.width;
        let height = self.frame_buffer.height;
        let min_x = v0.pix.x.min(v1.pix.x).min(v2.pix.x).floor().max(0.0) as usize;
        let min_y = v0.pix.y.min(v1.pix.y).min(v2.pix.y).floor().max(0.0) as usize;
        let max_x = v0.pix.x.max(v1.pix.x).max(v2.pix.x).ceil().min(width as f32) as usize;
        let max_y = v0.pix.y.max(v1.pix.y).max(v2.pix.y).ceil().min(height as f32) as usize;

        if max_x <= min_x || max_y <= min_y {
            return false;
        }

        (min_y..max_y).into_par_iter().for_each(|y| {
            for x in min_x..max_x {
                let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Ok(bary) = classify(v0.pix, v1.pix, v2.pix, pixel_center) else {
                    continue;
                };
                if !bary.is_inside() {
                    continue;
                }

                let depth = bary.w1 * v0.depth + bary.w2 * v1.depth + bary.w3 * v2.depth;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }

                let color = bary.blend(v0.color, v1.color, v2.color);
                self.frame_buffer.write_if_closer(x, y, depth, &color);
            }
        });
        true
    }
}

impl DrawTarget for SoftwareRenderer {
    fn begin_frame(&mut self, view: &Matrix4<f32>, projection: &Matrix4<f32>) -> Result<()> {
        self.matrices = FrameMatrices {
            view: *view,
            projection: *projection,
        };
        self.triangles_drawn = 0;
        self.frame_buffer.clear(&self.background);
        Ok(())
    }

    fn draw(&mut self, node: &SceneNode, drawable: &Drawable, world: &Matrix4<f32>) -> Result<()> {
        let mesh = self.meshes.get(drawable.primitive).ok_or_else(|| {
            SceneError::Render(format!("缺少几何体网格: {:?}", drawable.primitive))
        })?;
        let normal_matrix = normal_matrix(world, &self.matrices.view)
            .inspect_err(|_| debug!("节点 {:?} 的法线矩阵不可用", node.name))?;

        let drawn = self.draw_mesh(mesh, world, &normal_matrix, drawable);
        self.triangles_drawn += drawn;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        debug!("本帧光栅化三角形数: {}", self.triangles_drawn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::camera::Camera;
    use crate::geometry::transform::Transform;
    use crate::scene::scene_graph::SceneGraph;

    fn render(scene: &SceneGraph, root: usize, renderer: &mut SoftwareRenderer) -> Result<()> {
        let camera = Camera::default();
        renderer.begin_frame(&camera.get_view()?, &camera.get_projection()?)?;
        scene.render(root, &Matrix4::identity(), renderer)?;
        renderer.end_frame()
    }

    #[test]
    fn cube_covers_the_center_pixel() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(SceneNode::with_drawable(Drawable::default()));
        let mut renderer = SoftwareRenderer::new(60, 40);

        render(&scene, root, &mut renderer).unwrap();

        let [r, g, b] = renderer.frame_buffer.pixel(30, 20).unwrap();
        assert!(g > 0);
        assert_eq!((r, b), (0, 0));
        assert_eq!(renderer.frame_buffer.pixel(0, 0), Some([0, 0, 0]));
        assert!(renderer.triangles_drawn() > 0);
    }

    #[test]
    fn empty_scene_leaves_background() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(SceneNode::new());
        let mut renderer =
            SoftwareRenderer::new(8, 8).with_background(Vector3::new(0.0, 0.0, 1.0));

        render(&scene, root, &mut renderer).unwrap();

        assert_eq!(renderer.frame_buffer.pixel(4, 4), Some([0, 0, 255]));
        assert_eq!(renderer.triangles_drawn(), 0);
    }

    #[test]
    fn nearer_object_occludes_farther_one() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(SceneNode::new());
        scene
            .attach(
                root,
                SceneNode::with_drawable(Drawable::cube(Vector3::new(1.0, 0.0, 0.0)))
                    .transform(Transform::new().with_position(0.0, 0.0, 1.0)),
            )
            .unwrap();
        scene
            .attach(
                root,
                SceneNode::with_drawable(Drawable::cube(Vector3::new(0.0, 0.0, 1.0)))
                    .transform(Transform::new().with_scale(2.0, 2.0, 2.0).with_position(0.0, 0.0, -2.0)),
            )
            .unwrap();
        let mut renderer = SoftwareRenderer::new(60, 40);

        render(&scene, root, &mut renderer).unwrap();

        let [r, _, b] = renderer.frame_buffer.pixel(30, 20).unwrap();
        assert!(r > 0);
        assert_eq!(b, 0);
    }

    fn sphere_frame(drawable: Drawable) -> Vec<u8> {
        let mut scene = SceneGraph::new();
        let root = scene.insert(SceneNode::with_drawable(drawable));
        let mut renderer = SoftwareRenderer::new(60, 40);
        render(&scene, root, &mut renderer).unwrap();
        renderer.frame_buffer.get_color_buffer_bytes()
    }

    #[test]
    fn phong_factors_follow_the_mirror_direction() {
        let normal = Vector3::z();
        let to_light = Vector3::new(1.0, 0.0, 1.0).normalize();
        let mirror = Vector3::new(-1.0, 0.0, 1.0).normalize();

        let (diffuse, specular) = phong_factors(&normal, &to_light, &mirror, 28.0);
        assert!((diffuse - to_light.z).abs() < 1e-6);
        assert!((specular - 1.0).abs() < 1e-5);

        // 偏离镜面方向时，指数越大高光越窄
        let off = Vector3::new(-0.5, 0.0, 1.0).normalize();
        let (_, broad) = phong_factors(&normal, &to_light, &off, 4.0);
        let (_, narrow) = phong_factors(&normal, &to_light, &off, 40.0);
        assert!(broad > narrow);

        // 背光面既无漫反射也无高光
        assert_eq!(phong_factors(&normal, &-to_light, &mirror, 28.0), (0.0, 0.0));
    }

    #[test]
    fn specular_material_brightens_the_sphere() {
        let sphere = Drawable::sphere(Vector3::new(0.5, 0.3, 0.1));
        let matte = sphere_frame(sphere.clone());
        let shiny = sphere_frame(sphere.with_specular(1.0, 1.0));
        let total = |bytes: &[u8]| bytes.iter().map(|&b| b as u64).sum::<u64>();
        assert!(total(&shiny) > total(&matte));
    }

    #[test]
    fn flat_shading_differs_from_smooth() {
        let smooth = Drawable::sphere(Vector3::new(0.8, 0.8, 0.8));
        let flat = Drawable {
            shading: Shading::Flat,
            ..smooth.clone()
        };
        assert_ne!(sphere_frame(smooth), sphere_frame(flat));
    }

    #[test]
    fn zero_scale_node_reports_degenerate_geometry() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(
            SceneNode::with_drawable(Drawable::default())
                .transform(Transform::new().with_scale(0.0, 1.0, 1.0)),
        );
        let mut renderer = SoftwareRenderer::new(8, 8);

        let result = render(&scene, root, &mut renderer);
        assert!(matches!(result, Err(SceneError::DegenerateGeometry(_))));
    }
}
