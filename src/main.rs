use scenegraph::demos;
use scenegraph::io::render_settings::DemoKind;
use scenegraph::io::simple_cli::SimpleCli;
use scenegraph::utils::render_process::{render_picker, render_scene_demo};
use std::time::Instant;

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start_time = Instant::now();
    let settings = SimpleCli::process()?;

    match settings.demo {
        DemoKind::Picker => render_picker(&settings)?,
        kind => {
            let mut demo = demos::build(kind)?;
            demo.apply_settings(&settings)?;
            render_scene_demo(&mut demo, &settings)?;
        }
    }

    println!("✅ 完成，总耗时 {:?}", start_time.elapsed());
    Ok(())
}
