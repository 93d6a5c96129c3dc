use crate::scene::scene_node::Primitive;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::f32::consts::PI;

/// 球体经线数量
pub const SPHERE_SLICES: usize = 12;
/// 球体纬线数量
pub const SPHERE_STACKS: usize = 6;
/// 圆柱侧面分段数量
pub const CYLINDER_SEGMENTS: usize = 32;

/// 三角网格：顶点位置、逐顶点法线、三角形索引
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub indices: Vec<[usize; 3]>,
}

impl Mesh {
    fn push_vertex(&mut self, position: Point3<f32>, normal: Vector3<f32>) -> usize {
        self.positions.push(position);
        self.normals.push(normal);
        self.positions.len() - 1
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// 边长为 1、中心在原点的立方体，每个面独立顶点以保持平面法线
    pub fn cube() -> Self {
        let mut mesh = Mesh::default();
        let faces = [
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::y(), -Vector3::z()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::z(), -Vector3::x()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), Vector3::x(), -Vector3::y()),
        ];

        for (normal, u, v) in faces {
            let center = Point3::from(normal * 0.5);
            let corners = [
                center - u * 0.5 - v * 0.5,
                center + u * 0.5 - v * 0.5,
                center + u * 0.5 + v * 0.5,
                center - u * 0.5 + v * 0.5,
            ];
            let base = mesh.positions.len();
            for corner in corners {
                mesh.push_vertex(corner, normal);
            }
            mesh.indices.push([base, base + 1, base + 2]);
            mesh.indices.push([base, base + 2, base + 3]);
        }
        mesh
    }

    /// 半径为 1 的经纬球，法线即顶点位置
    pub fn sphere(slices: usize, stacks: usize) -> Self {
        let mut mesh = Mesh::default();
        let slices = slices.max(3);
        let stacks = stacks.max(2);

        for stack in 0..=stacks {
            let theta = PI * stack as f32 / stacks as f32;
            for slice in 0..=slices {
                let phi = 2.0 * PI * slice as f32 / slices as f32;
                let normal = Vector3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.push_vertex(Point3::from(normal), normal);
            }
        }

        let row = slices + 1;
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * row + slice;
                let b = a + row;
                if stack != 0 {
                    mesh.indices.push([a, a + 1, b]);
                }
                if stack != stacks - 1 {
                    mesh.indices.push([a + 1, b + 1, b]);
                }
            }
        }
        mesh
    }

    /// 半径为 1、高为 1、沿 Y 轴、中心在原点的圆柱（含上下底）
    pub fn cylinder(segments: usize) -> Self {
        let mut mesh = Mesh::default();
        let segments = segments.max(3);

        let ring = |i: usize| {
            let angle = 2.0 * PI * i as f32 / segments as f32;
            Vector3::new(angle.cos(), 0.0, -angle.sin())
        };

        // 侧面
        for i in 0..segments {
            let (n0, n1) = (ring(i), ring(i + 1));
            let bottom0 = mesh.push_vertex(Point3::from(n0 - Vector3::y() * 0.5), n0);
            let bottom1 = mesh.push_vertex(Point3::from(n1 - Vector3::y() * 0.5), n1);
            let top1 = mesh.push_vertex(Point3::from(n1 + Vector3::y() * 0.5), n1);
            let top0 = mesh.push_vertex(Point3::from(n0 + Vector3::y() * 0.5), n0);
            mesh.indices.push([bottom0, bottom1, top1]);
            mesh.indices.push([bottom0, top1, top0]);
        }

        // 上下底面，扇形三角化
        for (y, normal) in [(0.5, Vector3::y()), (-0.5, -Vector3::y())] {
            let center = mesh.push_vertex(Point3::new(0.0, y, 0.0), normal);
            for i in 0..segments {
                let a = mesh.push_vertex(Point3::from(ring(i) + Vector3::y() * y), normal);
                let b = mesh.push_vertex(Point3::from(ring(i + 1) + Vector3::y() * y), normal);
                if y > 0.0 {
                    mesh.indices.push([center, a, b]);
                } else {
                    mesh.indices.push([center, b, a]);
                }
            }
        }
        mesh
    }
}

/// 每种基本几何体生成一次的网格缓存，在帧循环开始前构建
#[derive(Debug, Clone)]
pub struct MeshLibrary {
    meshes: HashMap<Primitive, Mesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        let mut meshes = HashMap::new();
        meshes.insert(Primitive::Cube, Mesh::cube());
        meshes.insert(Primitive::Sphere, Mesh::sphere(SPHERE_SLICES, SPHERE_STACKS));
        meshes.insert(Primitive::Cylinder, Mesh::cylinder(CYLINDER_SEGMENTS));
        Self { meshes }
    }

    pub fn get(&self, primitive: Primitive) -> Option<&Mesh> {
        self.meshes.get(&primitive)
    }
}

impl Default for MeshLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 三角形绕序与外法线一致（从外面看是逆时针）
    fn faces_point_outward(mesh: &Mesh) -> bool {
        mesh.indices.iter().all(|&[a, b, c]| {
            let (pa, pb, pc) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
            let face_normal = (pb - pa).cross(&(pc - pa));
            let centroid = (pa.coords + pb.coords + pc.coords) / 3.0;
            face_normal.dot(&centroid) >= -1e-6
        })
    }

    #[test]
    fn cube_has_twelve_outward_triangles() {
        let cube = Mesh::cube();
        assert_eq!(cube.triangle_count(), 12);
        assert!(faces_point_outward(&cube));
        assert!(cube.positions.iter().all(|p| p.coords.amax() <= 0.5 + 1e-6));
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let sphere = Mesh::sphere(SPHERE_SLICES, SPHERE_STACKS);
        assert!(sphere.positions.iter().all(|p| (p.coords.norm() - 1.0).abs() < 1e-5));
        assert_eq!(sphere.triangle_count(), SPHERE_SLICES * (SPHERE_STACKS - 1) * 2);
        assert!(faces_point_outward(&sphere));
    }

    #[test]
    fn cylinder_is_unit_height() {
        let cylinder = Mesh::cylinder(CYLINDER_SEGMENTS);
        assert!(cylinder.positions.iter().all(|p| p.y.abs() <= 0.5 + 1e-6));
        assert_eq!(cylinder.triangle_count(), CYLINDER_SEGMENTS * 4);
        assert!(faces_point_outward(&cylinder));
    }
}
