mod acquisition;
mod camera;
mod cli;
mod config;
mod encode;
mod output;

use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;

use acquisition::{Session, StopToken};
use camera::SyntheticCamera;
use encode::Pipeline;

/// Token tripped by SIGINT/SIGTERM. The OS handler cannot capture state,
/// so the session's token is parked here once at startup.
static STOP: OnceLock<StopToken> = OnceLock::new();

fn install_stop_handler(token: StopToken) {
    let _ = STOP.set(token);
    unsafe {
        let handler = stop_handler as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::signal(libc::SIGINT, handler);
        libc::signal(libc::SIGTERM, handler);
    }
}

extern "C" fn stop_handler(_: libc::c_int) {
    if let Some(token) = STOP.get() {
        token.trigger();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = cli::Args::parse().into_config()?;
    let stop = StopToken::new();
    install_stop_handler(stop.clone());

    let mut session = Session::new(SyntheticCamera::default());
    let plan = session.configure(&config.camera_settings(), config.frame_target())?;

    let root = output::output_root(config.output_root.as_deref())?;
    let path = output::session_path(&root, config.codec.file_extension())?;
    log::info!("Recording to {}", path.display());

    let sink = Pipeline::open(
        &path,
        config.codec,
        config.quality,
        plan.width,
        plan.height,
        plan.frame_rate,
    )
    .context("Failed to open encoding pipeline")?;

    let result = session.record(sink, &stop);
    session.close();
    let report = result?;

    log::info!(
        "Captured {} frames ({} corrupt dropped) in {:.2}s at {:.2} fps",
        report.frames_captured,
        report.corrupt_frames,
        report.capture_secs,
        report.frame_rate
    );
    log::info!(
        "Encoded {} frames; queue drained in {:.2}s",
        report.frames_encoded,
        report.drain_secs
    );
    if report.interrupted {
        log::info!("Session stopped early on request");
    }
    log::info!("Saved: {}", path.display());
    Ok(())
}
