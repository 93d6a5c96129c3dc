use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::{DemoKind, RenderSettings};
use clap::Parser;

/// 🔥 **极简CLI** - 配置文件 + 少量覆盖参数
#[derive(Parser, Debug, Default)]
#[command(name = "scenegraph")]
#[command(about = "🎨 层级场景图演示：无头渲染帧序列")]
pub struct SimpleCli {
    /// 📁 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 🎬 演示场景
    #[arg(short, long, value_enum)]
    pub demo: Option<DemoKind>,

    /// 渲染帧数
    #[arg(short, long)]
    pub frames: Option<usize>,

    /// ⌨️ 按键脚本，每帧一个字符，'.' 表示无输入
    #[arg(short, long)]
    pub keys: Option<String>,

    /// 🎯 拾色查询点 "x,y"，可重复
    #[arg(long, value_name = "X,Y")]
    pub pick: Vec<String>,

    /// 输出图像的目录
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// 📋 使用示例配置（临时创建并加载）
    #[arg(long)]
    pub use_example_config: bool,
}

impl SimpleCli {
    /// 🔥 **处理CLI参数并返回RenderSettings**
    pub fn process() -> Result<RenderSettings, String> {
        Self::parse().into_settings()
    }

    /// 先加载配置，再用命令行参数覆盖
    pub fn into_settings(self) -> Result<RenderSettings, String> {
        let mut settings = if self.use_example_config {
            let temp_config_path = "temp_example_config.toml";

            TomlConfigLoader::create_example_config(temp_config_path)
                .map_err(|e| format!("创建示例配置失败: {}", e))?;
            println!("✅ 已创建临时示例配置: {}", temp_config_path);

            TomlConfigLoader::load_from_file(temp_config_path)
                .map_err(|e| format!("加载示例配置失败: {}", e))?
        } else if let Some(config_path) = &self.config {
            println!("📁 加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            println!("💡 使用默认设置");
            RenderSettings::default()
        };

        if let Some(demo) = self.demo {
            settings.demo = demo;
        }
        if let Some(frames) = self.frames {
            settings.frames = frames;
        }
        if let Some(keys) = self.keys {
            settings.keys = keys;
        }
        if !self.pick.is_empty() {
            settings.picks = self.pick;
        }
        if let Some(output_dir) = self.output_dir {
            settings.output_dir = output_dir;
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = SimpleCli::parse_from([
            "scenegraph",
            "--demo",
            "picker",
            "--pick",
            "100,100",
            "--pick",
            "0,0",
            "--frames",
            "3",
        ]);
        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.demo, DemoKind::Picker);
        assert_eq!(settings.picks, vec!["100,100", "0,0"]);
        assert_eq!(settings.frames, 3);
    }

    #[test]
    fn invalid_pick_fails_validation() {
        let cli = SimpleCli::parse_from(["scenegraph", "--pick", "nowhere"]);
        assert!(cli.into_settings().is_err());
    }
}
