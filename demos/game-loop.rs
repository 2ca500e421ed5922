use cadence::{ManualClock, ManualPulse, PulseMode, SchedulerBuilder, TaskDef, VisibilityFlag};

/// A host render loop: the scheduler asks for a frame, the host delivers it.
/// Halfway through the window is minimised and the keep-alive fallback timer
/// takes over.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cadence=debug".to_string()))
        .init();

    let clock = ManualClock::new();
    let frames = ManualPulse::new();
    let timer = ManualPulse::new();
    let window = VisibilityFlag::new(true);

    let scheduler = SchedulerBuilder::new()
        .heartbeat(30)
        .keep_alive(true)
        .clock(clock.clone())
        .frame_source(frames.clone())
        .fallback_source(timer.clone())
        .visibility(window.clone())
        .build()?;

    scheduler.add(TaskDef::every("animate", 100u64), |ctx| {
        println!("[{:>5}ms] animate", ctx.now());
        Ok(())
    })?;
    scheduler.add(TaskDef::every("network", 500u64), |ctx| {
        println!("[{:>5}ms] sync state", ctx.now());
        Ok(())
    })?;

    scheduler.start();

    for frame in 0..120 {
        if frame == 60 {
            window.set_visible(false);
            let mode = scheduler.visibility_changed();
            println!("window hidden, pulses now from {:?}", mode);
        }

        match scheduler.pulse_mode() {
            Some(PulseMode::Frame) => {
                clock.advance(16);
                frames.fire_pending();
            }
            _ => {
                clock.advance(100);
                // frames still queued from before the switch are stale
                frames.clear();
                timer.fire_pending();
            }
        }
    }

    scheduler.stop();
    println!("done after {} ticks", scheduler.ticks());
    Ok(())
}
