use crate::core::frame_loop::{FrameOutcome, FrameStats};
use crate::core::rasterizer::{Lighting, SoftwareRenderer};
use crate::demos::DemoScene;
use crate::demos::color_picker::ColorPicker;
use crate::geometry::interpolation::Color;
use crate::io::render_settings::RenderSettings;
use crate::utils::save_utils::{ensure_output_dir, frame_path, save_frame_buffer, save_image};
use log::{info, warn};
use nalgebra::Point2;
use std::time::Instant;

/// 按键脚本中表示“本帧无输入”的记号
pub const NO_INPUT: char = '.';

/// 按配置创建软件渲染器
pub fn create_renderer(settings: &RenderSettings, background: Color) -> SoftwareRenderer {
    SoftwareRenderer::new(settings.width, settings.height)
        .with_lighting(Lighting {
            light_position: settings.get_light_position(),
            ambient: settings.ambient,
            ..Lighting::default()
        })
        .with_background(background)
}

/// 无头运行场景图演示
///
/// 每帧最多送入按键脚本中的一个记号，然后以固定步长 tick。
/// 每渲染成功一帧都会调用 `on_frame(帧号, 渲染器)`，由调用方决定是否保存。
pub fn run_frames<F>(
    demo: &mut DemoScene,
    settings: &RenderSettings,
    renderer: &mut SoftwareRenderer,
    mut on_frame: F,
) -> Result<FrameStats, String>
where
    F: FnMut(usize, &SoftwareRenderer) -> Result<(), String>,
{
    let dt = settings.frame_dt();
    let mut tokens = settings.keys.chars();

    for frame in 0..settings.frames {
        if let Some(key) = tokens.next() {
            if key != NO_INPUT {
                demo.frame_loop.queue_input(key);
            }
        }

        match demo.frame_loop.tick(dt, &mut *renderer) {
            FrameOutcome::Rendered => on_frame(frame, renderer)?,
            FrameOutcome::Skipped => {}
            FrameOutcome::Stopped => break,
        }
    }

    Ok(demo.frame_loop.stats())
}

/// 运行场景图演示并保存需要的帧
pub fn render_scene_demo(demo: &mut DemoScene, settings: &RenderSettings) -> Result<(), String> {
    let start_time = Instant::now();
    ensure_output_dir(&settings.output_dir)?;
    let mut renderer = create_renderer(settings, demo.background);
    let name = settings.output_name().to_string();

    println!(
        "渲染演示 {}: {} 帧, {}x{}",
        demo.name, settings.frames, settings.width, settings.height
    );

    let stats = run_frames(demo, settings, &mut renderer, |frame, renderer| {
        if settings.should_save_frame(frame) {
            let path = frame_path(&settings.output_dir, &name, frame);
            save_frame_buffer(&renderer.frame_buffer, &path)?;
        }
        Ok(())
    })?;

    if stats.frames_skipped > 0 {
        warn!("共跳过 {} 帧", stats.frames_skipped);
    }
    info!(
        "渲染 {} 帧，处理按键 {} 个，耗时 {:?}",
        stats.frames_rendered,
        stats.inputs_handled,
        start_time.elapsed()
    );
    Ok(())
}

/// 拾色演示：逐个查询，打印结果，然后保存整幅三角形图像
pub fn render_picker(settings: &RenderSettings) -> Result<(), String> {
    ensure_output_dir(&settings.output_dir)?;
    let mut picker = ColorPicker::new(settings.picker_width, settings.picker_height);
    if let Some(background) = settings.get_background_vec() {
        picker.background = background;
    }

    for q in settings.get_pick_points()? {
        report_pick(&mut picker, q);
    }

    let image = picker.render_image();
    let path = frame_path(&settings.output_dir, settings.output_name(), 0);
    let width = u32::try_from(picker.width).map_err(|_| "画布宽度过大".to_string())?;
    let height = u32::try_from(picker.height).map_err(|_| "画布高度过大".to_string())?;
    save_image(&path, &image, width, height)
}

fn report_pick(picker: &mut ColorPicker, q: Point2<f32>) {
    match picker.pick(q) {
        Ok(Some(color)) => println!(
            "🎯 ({}, {}) -> rgb({:.3}, {:.3}, {:.3})",
            q.x, q.y, color.x, color.y, color.z
        ),
        Ok(None) => println!("🎯 ({}, {}) 在三角形外", q.x, q.y),
        Err(e) => warn!("拾色失败 ({}, {}): {}", q.x, q.y, e),
    }
}
