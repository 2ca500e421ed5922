use cadence::{CallbackResult, ManualClock, Runnable, SchedulerBuilder, TaskContext, TaskDef};

/// Spawns a wave of enemies, speeding up after every wave.
struct WaveSpawner {
    wave: u32,
    interval: u64,
}

impl Runnable for WaveSpawner {
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> CallbackResult {
        self.wave += 1;
        println!("[{:>5}ms] wave {} spawned", ctx.now(), self.wave);

        self.interval = (self.interval * 3 / 4).max(200);
        ctx.task_mut().set_interval(self.interval);

        if self.wave == 5 {
            let boss = TaskDef::after("boss", 500u64);
            ctx.scheduler().add(boss, |ctx| {
                println!("[{:>5}ms] boss arrives", ctx.now());
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Fails on its third run; the scheduler destroys it and carries on.
struct FlakySensor {
    reads: u32,
}

impl Runnable for FlakySensor {
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> CallbackResult {
        self.reads += 1;
        if self.reads == 3 {
            return Err(format!("sensor offline at {}ms", ctx.now()).into());
        }
        println!("[{:>5}ms] sensor read #{}", ctx.now(), self.reads);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cadence=warn".to_string()))
        .with_target(false)
        .init();

    let clock = ManualClock::new();
    let scheduler = SchedulerBuilder::new().heartbeat(50).clock(clock.clone()).build()?;

    scheduler.add_runnable(
        TaskDef::every("waves", 1000u64).iterations(6),
        WaveSpawner {
            wave: 0,
            interval: 1000,
        },
    )?;
    scheduler.add_runnable(TaskDef::every("sensor", 700u64), FlakySensor { reads: 0 })?;

    // the embedder owns the frame loop here: one pulse per simulated frame
    scheduler.start();
    for _ in 0..600 {
        clock.advance(16);
        scheduler.pulse();
    }

    println!("\nremaining tasks: {:?}", scheduler.task_names());
    println!("tick passes: {}", scheduler.ticks());
    Ok(())
}
