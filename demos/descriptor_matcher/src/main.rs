use anyhow::{Context, Result};
use slamlab_features::{CameraSource, HighGui, MatchVisualizerCfg};

fn run() -> Result<()> {
    println!("Press 'f' to change reference frame,");
    println!("'u' to increase match accept ratio,");
    println!("'d' to decrease match accept ratio,");
    println!("and 'q' to quit.");

    let cfg = MatchVisualizerCfg::default();
    let device = cfg.device_index;
    let window = cfg.window_name.clone();

    let mut visualizer = cfg.finalize().context("creating handlers")?;
    let camera = CameraSource::open(device)?;
    let gui = HighGui::new(&window)?;

    let summary = visualizer.run(camera, gui)?;
    log::debug!("{summary:?}");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("descriptor_matcher: {e:#}");
        std::process::exit(1);
    }
}
