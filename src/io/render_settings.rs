use clap::ValueEnum;
use log::warn;
use nalgebra::{Point2, Point3, Vector3};
use serde::Serialize;
use std::str::FromStr;

/// 可运行的演示场景
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    /// 风力发电机层级
    #[default]
    Turbine,
    /// 单模型旋转 + 相机交互
    Lighting,
    /// 绕圈公转的双叶螺旋桨
    Propeller,
    /// 重心坐标拾色三角形
    Picker,
}

impl DemoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoKind::Turbine => "turbine",
            DemoKind::Lighting => "lighting",
            DemoKind::Propeller => "propeller",
            DemoKind::Picker => "picker",
        }
    }
}

impl FromStr for DemoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "turbine" => Ok(DemoKind::Turbine),
            "lighting" => Ok(DemoKind::Lighting),
            "propeller" => Ok(DemoKind::Propeller),
            "picker" => Ok(DemoKind::Picker),
            other => Err(format!("未知的演示场景: {}", other)),
        }
    }
}

/// **纯数据结构** - 所有可通过TOML配置的运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    // ===== 渲染设置 =====
    /// 要运行的演示场景
    pub demo: DemoKind,
    /// 输出图像的宽度
    pub width: usize,
    /// 输出图像的高度
    pub height: usize,
    /// 背景颜色，格式为"r,g,b"；未设置时使用演示场景自带的背景
    pub background: Option<String>,
    /// 环境光系数
    pub ambient: f32,
    /// 点光源的世界坐标，格式为"x,y,z"
    pub light_position: String,

    // ===== 相机参数（未设置时使用演示场景自带的相机） =====
    /// 相机位置，格式为"x,y,z"
    pub camera_from: Option<String>,
    /// 相机目标，格式为"x,y,z"
    pub camera_at: Option<String>,
    /// 垂直视场角（度）
    pub camera_fov: Option<f32>,

    // ===== 动画设置 =====
    /// 渲染的帧数
    pub frames: usize,
    /// 帧率，决定每帧的时间步长
    pub fps: usize,
    /// 按键脚本，每帧送入一个字符
    pub keys: String,

    // ===== 输出设置 =====
    /// 输出文件的基础名称，未设置时使用演示场景名
    pub output: Option<String>,
    /// 输出图像的目录
    pub output_dir: String,
    /// 每隔多少帧保存一张图像，0 表示只保存最后一帧
    pub save_every: usize,

    // ===== 拾色设置 =====
    /// 拾色查询点，格式为"x,y"（左下角为原点）
    pub picks: Vec<String>,
    /// 拾色画布宽度
    pub picker_width: usize,
    /// 拾色画布高度
    pub picker_height: usize,
}

/// 辅助函数用于解析逗号分隔的浮点数
fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != N {
        return Err(format!("需要{}个逗号分隔的值", N));
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("无效数字 '{}': {}", part, e))?;
    }
    Ok(values)
}

pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    parse_floats::<3>(s).map(|[x, y, z]| Vector3::new(x, y, z))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

pub fn parse_point2(s: &str) -> Result<Point2<f32>, String> {
    parse_floats::<2>(s).map(|[x, y]| Point2::new(x, y))
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            // ===== 渲染设置 =====
            demo: DemoKind::Turbine,
            width: 600,
            height: 400,
            background: None,
            ambient: 0.1,
            light_position: "5,10,5".to_string(),

            // ===== 相机参数 =====
            camera_from: None,
            camera_at: None,
            camera_fov: None,

            // ===== 动画设置 =====
            frames: 60,
            fps: 60,
            keys: String::new(),

            // ===== 输出设置 =====
            output: None,
            output_dir: "output_scenegraph".to_string(),
            save_every: 0,

            // ===== 拾色设置 =====
            picks: Vec::new(),
            picker_width: 400,
            picker_height: 400,
        }
    }
}

impl RenderSettings {
    /// 获取背景颜色向量（按需计算），无效值视为未设置
    pub fn get_background_vec(&self) -> Option<Vector3<f32>> {
        let background = self.background.as_ref()?;
        match parse_vec3(background) {
            Ok(color) => Some(color),
            Err(e) => {
                warn!("无效的背景颜色 '{}': {}, 使用演示场景默认值", background, e);
                None
            }
        }
    }

    /// 获取光源位置（按需计算）
    pub fn get_light_position(&self) -> Point3<f32> {
        parse_point3(&self.light_position).unwrap_or_else(|_| {
            warn!("无效的光源位置 '{}', 使用默认值", self.light_position);
            Point3::new(5.0, 10.0, 5.0)
        })
    }

    /// 每帧的时间步长（秒）
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// 输出文件的基础名称
    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(self.demo.as_str())
    }

    /// 第 `frame` 帧（从 0 开始）是否需要保存
    pub fn should_save_frame(&self, frame: usize) -> bool {
        let last = frame + 1 == self.frames;
        last || (self.save_every > 0 && frame % self.save_every == 0)
    }

    /// 解析全部拾色查询点
    pub fn get_pick_points(&self) -> Result<Vec<Point2<f32>>, String> {
        self.picks
            .iter()
            .map(|p| parse_point2(p).map_err(|e| format!("无效的拾色点 '{}': {}", p, e)))
            .collect()
    }

    /// 验证参数
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("错误: 图像宽度和高度必须大于0".to_string());
        }
        if self.picker_width == 0 || self.picker_height == 0 {
            return Err("错误: 拾色画布宽度和高度必须大于0".to_string());
        }
        if self.fps == 0 {
            return Err("错误: 帧率必须大于0".to_string());
        }
        if self.output_dir.trim().is_empty() {
            return Err("错误: 输出目录不能为空".to_string());
        }
        if let Some(output) = &self.output {
            if output.trim().is_empty() {
                return Err("错误: 输出文件名不能为空".to_string());
            }
        }
        if !(0.0..=1.0).contains(&self.ambient) {
            return Err(format!("错误: 环境光系数 {} 超出 [0, 1]", self.ambient));
        }

        // 验证相机参数
        if let Some(from) = &self.camera_from {
            parse_vec3(from).map_err(|e| format!("错误: 相机位置格式不正确: {}", e))?;
        }
        if let Some(at) = &self.camera_at {
            parse_vec3(at).map_err(|e| format!("错误: 相机目标格式不正确: {}", e))?;
        }
        if let Some(fov) = self.camera_fov {
            if !(fov > 0.0 && fov < 180.0) {
                return Err(format!("错误: 视场角 {} 超出 (0, 180)", fov));
            }
        }

        if let Some(background) = &self.background {
            parse_vec3(background).map_err(|e| format!("错误: 背景颜色格式不正确: {}", e))?;
        }
        parse_vec3(&self.light_position)
            .map_err(|e| format!("错误: 光源位置格式不正确: {}", e))?;
        self.get_pick_points()?;

        Ok(())
    }
}
