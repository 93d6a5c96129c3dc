// demos/mod.rs
// 演示场景：风力发电机、光照模型、螺旋桨与拾色器
pub mod color_picker;
pub mod lighting;
pub mod propeller;
pub mod turbine;

use crate::core::frame_loop::FrameLoop;
use crate::geometry::interpolation::Color;
use crate::io::render_settings::{DemoKind, RenderSettings, parse_point3};

/// 一个可运行的场景图演示
pub struct DemoScene {
    pub name: &'static str,
    pub frame_loop: FrameLoop,
    pub background: Color,
}

impl DemoScene {
    /// 用配置覆盖演示自带的相机与背景；宽高比始终跟随输出尺寸
    pub fn apply_settings(&mut self, settings: &RenderSettings) -> Result<(), String> {
        let camera = &mut self.frame_loop.camera;
        if let Some(from) = &settings.camera_from {
            camera.eye = parse_point3(from)?;
        }
        if let Some(at) = &settings.camera_at {
            camera.at = parse_point3(at)?;
        }
        if let Some(fov) = settings.camera_fov {
            camera.set_fov(fov);
        }
        camera.set_aspect_ratio(settings.width as f32 / settings.height as f32);

        if let Some(background) = settings.get_background_vec() {
            self.background = background;
        }
        Ok(())
    }
}

/// 按种类构建场景图演示；拾色器不是场景图演示
pub fn build(kind: DemoKind) -> Result<DemoScene, String> {
    let demo = match kind {
        DemoKind::Turbine => turbine::build(),
        DemoKind::Lighting => lighting::build(),
        DemoKind::Propeller => propeller::build(),
        DemoKind::Picker => return Err("拾色演示没有场景图".to_string()),
    };
    demo.map_err(|e| format!("构建演示场景 {} 失败: {}", kind.as_str(), e))
}
