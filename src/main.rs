//! Skyflock entry point
//!
//! Headless native runner standing in for the external collaborators
//! (renderer, audio, input devices): it drives fixed-length frames, feeds the
//! simulation scripted demo input, and logs the event stream.

use std::time::{Duration, Instant};

use skyflock::Tuning;
use skyflock::consts::FRAME_DT_MS;
use skyflock::sim::{FrameInput, Group, Mode, World};

fn main() {
    env_logger::init();

    let mut tuning_path: Option<String> = None;
    let mut seed: u64 = 0x5eed;
    let mut max_frames: Option<u64> = None;
    let mut realtime = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tuning" => tuning_path = args.next(),
            "--seed" => seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(seed),
            "--frames" => max_frames = args.next().and_then(|s| s.parse().ok()),
            "--realtime" => realtime = true,
            other => {
                eprintln!("usage: skyflock [--tuning <path>] [--seed <n>] [--frames <n>] [--realtime]");
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let tuning = match tuning_path {
        Some(path) => Tuning::load(std::path::Path::new(&path)),
        None => Ok(Tuning::default()),
    };
    let tuning = match tuning {
        Ok(tuning) => tuning,
        Err(err) => {
            log::error!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let mut world = match World::new(tuning, seed) {
        Ok(world) => world,
        Err(err) => {
            log::error!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    log::info!("starting run, seed {seed}");
    let mut frame: u64 = 0;
    loop {
        let frame_start = Instant::now();
        let input = autopilot(&world, frame);
        world.frame(&input, FRAME_DT_MS);
        for event in world.drain_events() {
            log::info!("event: {event:?}");
        }
        frame += 1;

        if world.session.terminal() {
            let outcome = if world.session.mode == Mode::Won {
                "won"
            } else {
                "lost"
            };
            log::info!(
                "run {} after {:.1}s on level {} (player level {})",
                outcome,
                world.clock.now() as f32 / 1000.0,
                world.session.level + 1,
                world.progression.level,
            );
            break;
        }
        if max_frames.is_some_and(|max| frame >= max) {
            log::info!("frame budget reached at t={}ms", world.clock.now());
            break;
        }
        if realtime {
            let budget = Duration::from_millis(FRAME_DT_MS);
            std::thread::sleep(budget.saturating_sub(frame_start.elapsed()));
        }
    }
}

/// Scripted demo input: start immediately, hover around the midline, face
/// the nearest enemy, and always take the first upgrade offered
fn autopilot(world: &World, frame: u64) -> FrameInput {
    let mut input = FrameInput::default();
    match world.session.mode {
        Mode::Menu => input.start = true,
        Mode::Choosing => input.select_upgrade = Some(0),
        Mode::Playing => {
            let center = world.player.center();
            if center.y > world.tuning.arena.height * 0.5 && frame % 4 == 0 {
                input.flap = true;
            }
            let nearest = world
                .registry
                .members(Group::Enemies)
                .map(|e| e.body.center())
                .min_by(|a, b| {
                    (*a - center)
                        .length_squared()
                        .partial_cmp(&(*b - center).length_squared())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(target) = nearest {
                if target.x < center.x {
                    input.turn_left = true;
                } else {
                    input.turn_right = true;
                }
            }
        }
        _ => {}
    }
    input
}
