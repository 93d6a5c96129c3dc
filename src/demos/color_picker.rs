use crate::core::error::Result;
use crate::core::frame_buffer::linear_rgb_to_u8;
use crate::geometry::interpolation::{Color, ColorTriangle};
use log::debug;
use nalgebra::{Point2, Vector3};
use rayon::prelude::*;

/// 画布上显示最近一次拾色结果的方块区域 `[x0, x1) × [y0, y1)`（左下角为原点）
pub const SWATCH: (usize, usize, usize, usize) = (200, 300, 150, 250);

/// 拾色器：画布坐标系（左下角为原点、单位为像素）中的彩色三角形
pub struct ColorPicker {
    pub triangle: ColorTriangle,
    pub width: usize,
    pub height: usize,
    pub background: Color,
    /// 最近一次命中的颜色，初始为黑色
    pub swatch: Color,
}

impl ColorPicker {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            triangle: ColorTriangle::new(
                [
                    Point2::new(0.0, 50.0),
                    Point2::new(200.0, 50.0),
                    Point2::new(100.0, 350.0),
                ],
                [
                    Vector3::new(1.0, 0.0, 0.0),
                    Vector3::new(0.0, 1.0, 0.0),
                    Vector3::new(0.0, 0.0, 1.0),
                ],
            ),
            width,
            height,
            background: Vector3::new(1.0, 1.0, 1.0),
            swatch: Vector3::zeros(),
        }
    }

    /// 查询一个点：在三角形内则返回插值颜色并更新色块，否则返回 None
    ///
    /// 三角形退化时返回错误。
    pub fn pick(&mut self, q: Point2<f32>) -> Result<Option<Color>> {
        if !self.triangle.contains(q)? {
            debug!("拾色点 ({}, {}) 在三角形外", q.x, q.y);
            return Ok(None);
        }
        let color = self.triangle.color_at(q)?;
        self.swatch = color;
        Ok(Some(color))
    }

    fn in_swatch(x: usize, y: usize) -> bool {
        let (x0, x1, y0, y1) = SWATCH;
        (x0..x1).contains(&x) && (y0..y1).contains(&y)
    }

    /// 按行并行生成 RGB 图像，第 0 行在图像顶部
    pub fn render_image(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.width * self.height * 3];
        if buffer.is_empty() {
            return buffer;
        }
        let background = linear_rgb_to_u8(&self.background);
        let swatch = linear_rgb_to_u8(&self.swatch);

        buffer
            .par_chunks_mut(self.width * 3)
            .enumerate()
            .for_each(|(row, pixels)| {
                let y = self.height - 1 - row;
                for (x, pixel) in pixels.chunks_mut(3).enumerate() {
                    let q = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let rgb = if Self::in_swatch(x, y) {
                        swatch
                    } else {
                        match self.triangle.color_at(q) {
                            Ok(color) => linear_rgb_to_u8(&color),
                            Err(_) => background,
                        }
                    };
                    pixel.copy_from_slice(&rgb);
                }
            });

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_inside_updates_swatch() {
        let mut picker = ColorPicker::new(400, 400);
        let color = picker.pick(Point2::new(100.0, 100.0)).unwrap().unwrap();
        assert!((color.sum() - 1.0).abs() < 1e-5);
        assert_eq!(picker.swatch, color);
    }

    #[test]
    fn pick_outside_keeps_previous_swatch() {
        let mut picker = ColorPicker::new(400, 400);
        picker.pick(Point2::new(100.0, 100.0)).unwrap();
        let before = picker.swatch;
        assert_eq!(picker.pick(Point2::new(0.0, 0.0)).unwrap(), None);
        assert_eq!(picker.swatch, before);
    }

    #[test]
    fn image_shows_triangle_background_and_swatch() {
        let picker = ColorPicker::new(400, 400);
        let image = picker.render_image();
        let at = |x: usize, y: usize| {
            let row = 399 - y;
            let i = (row * 400 + x) * 3;
            [image[i], image[i + 1], image[i + 2]]
        };
        // 左下角在三角形外
        assert_eq!(at(0, 0), [255, 255, 255]);
        // 底边中点附近偏红绿
        let [r, g, b] = at(100, 51);
        assert!(r > 100 && g > 100 && b < 10);
        // 初始色块为黑色
        assert_eq!(at(250, 200), [0, 0, 0]);
    }
}
