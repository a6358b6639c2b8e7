use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use gesture_signal::{
    GestureConfig, GestureController, ScriptedDetector, TrackingStatus, pipeline::demo_script,
};

const RENDER_FPS: u64 = 60;
const RENDER_INTERVAL: Duration = Duration::from_micros(1_000_000 / RENDER_FPS);
const DETECTOR_FPS: u32 = 30;
// Extra render time after the script ends so the relaxation is visible.
const TAIL: Duration = Duration::from_secs(2);

struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        script: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--script" => args.script = it.next().map(PathBuf::from),
            other => bail!("unknown argument {other}; usage: [--config FILE] [--script FILE]"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => GestureConfig::from_json_file(path)?,
        None => GestureConfig::default(),
    };
    let detector = match &args.script {
        Some(path) => ScriptedDetector::from_json_file(path, DETECTOR_FPS)?,
        None => ScriptedDetector::new(demo_script(), DETECTOR_FPS),
    };
    let run_for = Duration::from_secs_f64(detector.len() as f64 / DETECTOR_FPS as f64) + TAIL;

    let mut controller = GestureController::new(config).with_detector(detector);
    let notices = controller.notices();

    if let Err(err) = controller.start() {
        log::error!("tracking unavailable: {err}");
    }

    let started = Instant::now();
    let mut status = TrackingStatus::Idle;
    let mut tick: u64 = 0;
    while started.elapsed() < run_for {
        let frame_start = Instant::now();
        let out = controller.render_tick();

        for notice in notices.try_iter() {
            log::info!("{}", notice.message().replace('\n', " | "));
        }

        let now = controller.status();
        if now != status {
            log::info!("STATUS: {}", now.label());
            status = now;
        }

        if tick % RENDER_FPS == 0 {
            let energy = controller.energy();
            log::info!(
                "rot=({:+.3}, {:+.3}) scale={:.3} speed={:.2} energy={:.2}",
                out.rot_x,
                out.rot_y,
                out.scale,
                out.speed,
                energy.level
            );
        }
        tick += 1;

        if let Some(rest) = RENDER_INTERVAL.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    controller.stop();
    for notice in notices.try_iter() {
        log::info!("{}", notice.message());
    }

    Ok(())
}
