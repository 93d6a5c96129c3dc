use crate::io::render_settings::{DemoKind, RenderSettings};
use log::warn;
use serde::Serialize;
use std::path::Path;
use toml::Value;

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

// ===== 写出用的分节结构 =====

#[derive(Serialize)]
struct ConfigFile<'a> {
    render: RenderSection<'a>,
    #[serde(skip_serializing_if = "CameraSection::is_empty")]
    camera: CameraSection<'a>,
    animation: AnimationSection<'a>,
    output: OutputSection<'a>,
    picker: PickerSection<'a>,
}

#[derive(Serialize)]
struct RenderSection<'a> {
    demo: DemoKind,
    width: usize,
    height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<&'a str>,
    ambient: f32,
    light_position: &'a str,
}

#[derive(Serialize)]
struct CameraSection<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fov: Option<f32>,
}

impl CameraSection<'_> {
    fn is_empty(&self) -> bool {
        self.from.is_none() && self.at.is_none() && self.fov.is_none()
    }
}

#[derive(Serialize)]
struct AnimationSection<'a> {
    frames: usize,
    fps: usize,
    keys: &'a str,
}

#[derive(Serialize)]
struct OutputSection<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    output_dir: &'a str,
    save_every: usize,
}

#[derive(Serialize)]
struct PickerSection<'a> {
    width: usize,
    height: usize,
    picks: &'a [String],
}

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置
    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings)?;
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件：风力发电机 + 一段按键脚本
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = RenderSettings {
            keys: "tt..ss..g".to_string(),
            frames: 90,
            save_every: 30,
            picks: vec!["100,100".to_string(), "0,0".to_string()],
            ..Default::default()
        };

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }

    // ===== TOML -> RenderSettings 转换 =====

    fn parse_toml_to_settings(toml: Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        // [render] 部分
        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render)?;
        }

        // [camera] 部分
        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera)?;
        }

        // [animation] 部分
        if let Some(animation) = toml.get("animation").and_then(|v| v.as_table()) {
            Self::parse_animation_section(&mut settings, animation)?;
        }

        // [output] 部分
        if let Some(output) = toml.get("output").and_then(|v| v.as_table()) {
            Self::parse_output_section(&mut settings, output)?;
        }

        // [picker] 部分
        if let Some(picker) = toml.get("picker").and_then(|v| v.as_table()) {
            Self::parse_picker_section(&mut settings, picker)?;
        }

        Ok(settings)
    }

    // ===== 各个section的解析方法 =====

    /// 读取正整数；非法值保留默认并告警
    fn positive_integer(table: &toml::Table, key: &str) -> Option<usize> {
        let value = table.get(key)?.as_integer()?;
        if value > 0 {
            Some(value as usize)
        } else {
            warn!("无效的 {} = {}, 使用默认值", key, value);
            None
        }
    }

    /// 整数也接受为浮点
    fn float(table: &toml::Table, key: &str) -> Option<f32> {
        let value = table.get(key)?;
        value
            .as_float()
            .or_else(|| value.as_integer().map(|i| i as f64))
            .map(|f| f as f32)
    }

    fn parse_render_section(
        settings: &mut RenderSettings,
        render: &toml::Table,
    ) -> Result<(), String> {
        if let Some(demo) = render.get("demo").and_then(|v| v.as_str()) {
            settings.demo = demo.parse()?;
        }
        if let Some(width) = Self::positive_integer(render, "width") {
            settings.width = width;
        }
        if let Some(height) = Self::positive_integer(render, "height") {
            settings.height = height;
        }
        if let Some(background) = render.get("background").and_then(|v| v.as_str()) {
            settings.background = Some(background.to_string());
        }
        if let Some(ambient) = Self::float(render, "ambient") {
            if (0.0..=1.0).contains(&ambient) {
                settings.ambient = ambient;
            } else {
                warn!("环境光系数 {} 超出 [0, 1], 使用默认值 {}", ambient, settings.ambient);
            }
        }
        if let Some(light_position) = render.get("light_position").and_then(|v| v.as_str()) {
            settings.light_position = light_position.to_string();
        }
        Ok(())
    }

    fn parse_camera_section(
        settings: &mut RenderSettings,
        camera: &toml::Table,
    ) -> Result<(), String> {
        if let Some(from) = camera.get("from").and_then(|v| v.as_str()) {
            settings.camera_from = Some(from.to_string());
        }
        if let Some(at) = camera.get("at").and_then(|v| v.as_str()) {
            settings.camera_at = Some(at.to_string());
        }
        if let Some(fov) = Self::float(camera, "fov") {
            settings.camera_fov = Some(fov);
        }
        Ok(())
    }

    fn parse_animation_section(
        settings: &mut RenderSettings,
        animation: &toml::Table,
    ) -> Result<(), String> {
        if let Some(frames) = Self::positive_integer(animation, "frames") {
            settings.frames = frames;
        }
        if let Some(fps) = Self::positive_integer(animation, "fps") {
            settings.fps = fps;
        }
        if let Some(keys) = animation.get("keys").and_then(|v| v.as_str()) {
            settings.keys = keys.to_string();
        }
        Ok(())
    }

    fn parse_output_section(
        settings: &mut RenderSettings,
        output: &toml::Table,
    ) -> Result<(), String> {
        if let Some(name) = output.get("name").and_then(|v| v.as_str()) {
            settings.output = Some(name.to_string());
        }
        if let Some(output_dir) = output.get("output_dir").and_then(|v| v.as_str()) {
            settings.output_dir = output_dir.to_string();
        }
        if let Some(save_every) = output.get("save_every").and_then(|v| v.as_integer()) {
            if save_every >= 0 {
                settings.save_every = save_every as usize;
            } else {
                warn!("无效的 save_every = {}, 使用默认值", save_every);
            }
        }
        Ok(())
    }

    fn parse_picker_section(
        settings: &mut RenderSettings,
        picker: &toml::Table,
    ) -> Result<(), String> {
        if let Some(width) = Self::positive_integer(picker, "width") {
            settings.picker_width = width;
        }
        if let Some(height) = Self::positive_integer(picker, "height") {
            settings.picker_height = height;
        }
        if let Some(picks) = picker.get("picks").and_then(|v| v.as_array()) {
            settings.picks = picks
                .iter()
                .filter_map(|p| match p.as_str() {
                    Some(s) => Some(s.to_string()),
                    None => {
                        warn!("忽略非字符串的拾色点: {}", p);
                        None
                    }
                })
                .collect();
        }
        Ok(())
    }

    // ===== RenderSettings -> TOML 转换 =====

    fn settings_to_toml(settings: &RenderSettings) -> Result<String, String> {
        let file = ConfigFile {
            render: RenderSection {
                demo: settings.demo,
                width: settings.width,
                height: settings.height,
                background: settings.background.as_deref(),
                ambient: settings.ambient,
                light_position: &settings.light_position,
            },
            camera: CameraSection {
                from: settings.camera_from.as_deref(),
                at: settings.camera_at.as_deref(),
                fov: settings.camera_fov,
            },
            animation: AnimationSection {
                frames: settings.frames,
                fps: settings.fps,
                keys: &settings.keys,
            },
            output: OutputSection {
                name: settings.output.as_deref(),
                output_dir: &settings.output_dir,
                save_every: settings.save_every,
            },
            picker: PickerSection {
                width: settings.picker_width,
                height: settings.picker_height,
                picks: &settings.picks,
            },
        };

        let body =
            toml::to_string_pretty(&file).map_err(|e| format!("序列化配置失败: {}", e))?;

        let mut content = String::new();
        content.push_str("# 场景图演示配置文件\n");
        content.push_str("# demo: turbine / lighting / propeller / picker\n");
        content.push_str("# keys: 每帧送入一个字符，'.' 表示该帧无输入\n\n");
        content.push_str(&body);
        Ok(content)
    }
}
