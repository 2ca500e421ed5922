use cadence::{SchedulerBuilder, TaskDef};
use chrono::Local;
use std::cell::Cell;
use std::rc::Rc;

fn stamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cadence=info".to_string()))
        .init();

    println!("Heartbeat 100ms, frame pulses from tokio timers\n");

    let scheduler = SchedulerBuilder::new().heartbeat(100).tokio_pulses().build()?;
    let fast = Rc::new(Cell::new(0u32));

    let counter = fast.clone();
    scheduler.add(TaskDef::every("fast", "250ms"), move |ctx| {
        counter.set(counter.get() + 1);
        println!("[{}] [FAST] firing #{:?}", stamp(), ctx.task().iteration_count());
        Ok(())
    })?;

    scheduler.add(TaskDef::every("slow", "1s").iterations(3), |ctx| {
        println!("[{}] [SLOW] {}ms since start", stamp(), ctx.now());
        Ok(())
    })?;

    scheduler.add(TaskDef::after("finish", "4s"), |ctx| {
        println!("[{}] [FINISH] stopping scheduler", stamp());
        ctx.scheduler().stop();
        Ok(())
    })?;

    let local = tokio::task::LocalSet::new();
    local.run_until(scheduler.run_until_stopped()).await;

    println!("\nfast task fired {} times (expected ~16)", fast.get());
    println!("tasks left: {:?}", scheduler.task_names());
    Ok(())
}
