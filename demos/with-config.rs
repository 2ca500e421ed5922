use cadence::{load_toml_config, task_defs_from_config, SchedulerBuilder};
use chrono::Local;

const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/config/cadence.toml");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cadence=debug".to_string()))
        .with_target(false)
        .init();

    println!("Configuration: {}", CONFIG_PATH);
    println!("   - scheduler.heartbeat: minimum wait between ticks");
    println!("   - [[tasks]]: task definitions, bound to callbacks by name");
    println!("   - override with e.g. CADENCE_SCHEDULER__HEARTBEAT=500\n");

    let config = load_toml_config(CONFIG_PATH)?;
    let scheduler = SchedulerBuilder::with_config(&config)?.tokio_pulses().build()?;

    for def in task_defs_from_config(&config)? {
        let label = def.name.to_uppercase();
        scheduler.add(def, move |ctx| {
            let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            println!("[{}] [{}] fired at {}ms", now, label, ctx.now());
            Ok(())
        })?;
    }

    scheduler.add(cadence::TaskDef::after("shutdown", "6s"), |ctx| {
        ctx.scheduler().stop();
        Ok(())
    })?;

    println!("heartbeat {}ms, tasks {:?}\n", scheduler.heartbeat(), scheduler.task_names());

    let local = tokio::task::LocalSet::new();
    local.run_until(scheduler.run_until_stopped()).await;

    println!("\nstopped after {} tick passes", scheduler.ticks());
    Ok(())
}
