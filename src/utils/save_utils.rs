use crate::core::frame_buffer::FrameBuffer;
use image::ColorType;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 保存RGB图像数据到PNG文件
///
/// # 参数
/// * `path` - 输出文件路径
/// * `data` - RGB数据（u8数组）
/// * `width` - 图像宽度
/// * `height` - 图像高度
pub fn save_image(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), String> {
    image::save_buffer(path, data, width, height, ColorType::Rgb8)
        .map_err(|e| format!("保存图像到 {} 时出错: {}", path.display(), e))?;
    info!("图像已保存到 {}", path.display());
    Ok(())
}

/// 确保输出目录存在
pub fn ensure_output_dir(output_dir: &str) -> Result<(), String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("创建输出目录 '{}' 失败: {}", output_dir, e))
}

/// 输出文件路径：`<output_dir>/<name>_<frame:03>.png`
pub fn frame_path(output_dir: &str, name: &str, frame: usize) -> PathBuf {
    Path::new(output_dir).join(format!("{}_{:03}.png", name, frame))
}

/// 把帧缓冲保存为 PNG
pub fn save_frame_buffer(frame_buffer: &FrameBuffer, path: &Path) -> Result<(), String> {
    let width = u32::try_from(frame_buffer.width).map_err(|_| "图像宽度过大".to_string())?;
    let height = u32::try_from(frame_buffer.height).map_err(|_| "图像高度过大".to_string())?;
    save_image(
        path,
        &frame_buffer.get_color_buffer_bytes(),
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_zero_padded() {
        let path = frame_path("out", "turbine", 7);
        assert_eq!(path, Path::new("out").join("turbine_007.png"));
    }
}
