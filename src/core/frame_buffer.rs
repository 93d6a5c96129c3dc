use crate::geometry::interpolation::Color;
use atomic_float::AtomicF32;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU8, Ordering};

/// 线性颜色转 8 位，分量截断到 [0, 255]
pub fn linear_rgb_to_u8(color: &Color) -> [u8; 3] {
    [
        (color.x * 255.0).clamp(0.0, 255.0) as u8,
        (color.y * 255.0).clamp(0.0, 255.0) as u8,
        (color.z * 255.0).clamp(0.0, 255.0) as u8,
    ]
}

/// 帧缓冲区实现，存储渲染结果
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    /// 存储 NDC 深度，数值越小表示越近。使用原子类型以支持并行写入。
    pub depth_buffer: Vec<AtomicF32>,
    /// 存储RGB颜色值 [0, 255]，行优先，第 0 行在图像顶部
    pub color_buffer: Vec<AtomicU8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let num_pixels = width * height;
        let depth_buffer = (0..num_pixels)
            .map(|_| AtomicF32::new(f32::INFINITY))
            .collect();
        let color_buffer = (0..num_pixels * 3).map(|_| AtomicU8::new(0)).collect();

        FrameBuffer {
            width,
            height,
            depth_buffer,
            color_buffer,
        }
    }

    /// 重置深度并用背景色填充
    pub fn clear(&self, background: &Color) {
        self.depth_buffer.par_iter().for_each(|atomic_depth| {
            atomic_depth.store(f32::INFINITY, Ordering::Relaxed);
        });

        let [r, g, b] = linear_rgb_to_u8(background);
        self.color_buffer
            .par_chunks(3)
            .for_each(|pixel| {
                pixel[0].store(r, Ordering::Relaxed);
                pixel[1].store(g, Ordering::Relaxed);
                pixel[2].store(b, Ordering::Relaxed);
            });
    }

    /// 深度测试并写入像素；`depth` 更近时返回 true
    pub fn write_if_closer(&self, x: usize, y: usize, depth: f32, color: &Color) -> bool {
        if x >= self.width || y >= self.height || !depth.is_finite() {
            return false;
        }
        let pixel_index = y * self.width + x;
        let old_depth = self.depth_buffer[pixel_index].fetch_min(depth, Ordering::Relaxed);
        if old_depth <= depth {
            return false;
        }

        let [r, g, b] = linear_rgb_to_u8(color);
        let start = pixel_index * 3;
        self.color_buffer[start].store(r, Ordering::Relaxed);
        self.color_buffer[start + 1].store(g, Ordering::Relaxed);
        self.color_buffer[start + 2].store(b, Ordering::Relaxed);
        true
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * 3;
        Some([
            self.color_buffer[start].load(Ordering::Relaxed),
            self.color_buffer[start + 1].load(Ordering::Relaxed),
            self.color_buffer[start + 2].load(Ordering::Relaxed),
        ])
    }

    /// 获取颜色缓冲区的字节数据
    pub fn get_color_buffer_bytes(&self) -> Vec<u8> {
        self.color_buffer
            .iter()
            .map(|atomic_color| atomic_color.load(Ordering::Relaxed))
            .collect()
    }

    /// 获取深度缓冲区的浮点数据
    pub fn get_depth_buffer_f32(&self) -> Vec<f32> {
        self.depth_buffer
            .iter()
            .map(|atomic_depth| atomic_depth.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn nearer_fragment_wins() {
        let fb = FrameBuffer::new(4, 4);
        fb.clear(&Vector3::new(0.0, 0.0, 0.0));
        assert!(fb.write_if_closer(1, 1, 0.5, &Vector3::new(1.0, 0.0, 0.0)));
        assert!(!fb.write_if_closer(1, 1, 0.7, &Vector3::new(0.0, 1.0, 0.0)));
        assert!(fb.write_if_closer(1, 1, 0.2, &Vector3::new(0.0, 0.0, 1.0)));
        assert_eq!(fb.pixel(1, 1), Some([0, 0, 255]));
    }

    #[test]
    fn clear_resets_depth_and_color() {
        let fb = FrameBuffer::new(2, 2);
        fb.write_if_closer(0, 0, 0.1, &Vector3::new(1.0, 1.0, 1.0));
        fb.clear(&Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(fb.pixel(0, 0), Some([0, 255, 0]));
        assert!(fb.get_depth_buffer_f32().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let fb = FrameBuffer::new(2, 2);
        assert!(!fb.write_if_closer(2, 0, 0.1, &Vector3::new(1.0, 1.0, 1.0)));
        assert_eq!(fb.pixel(5, 5), None);
    }
}
