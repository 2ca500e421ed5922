use cadence::{
    CallbackResult, ManualClock, Pulse, Scheduler, SchedulerBuilder, SchedulerError, TaskContext,
    TaskDef, TickSummary,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn scheduler_with_clock(heartbeat: u64) -> (Scheduler, ManualClock) {
    let clock = ManualClock::new();
    let scheduler = SchedulerBuilder::new()
        .heartbeat(heartbeat)
        .clock(clock.clone())
        .build()
        .unwrap();
    (scheduler, clock)
}

fn running(heartbeat: u64) -> Scheduler {
    let (scheduler, _) = scheduler_with_clock(heartbeat);
    scheduler.start();
    scheduler
}

/// Register a task that counts its firings.
fn counted(scheduler: &Scheduler, def: TaskDef) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let hits = count.clone();
    scheduler
        .add(def, move |_| {
            hits.set(hits.get() + 1);
            Ok(())
        })
        .unwrap();
    count
}

#[test]
fn heartbeat_gates_ticks() {
    let scheduler = running(250);
    let fired = counted(&scheduler, TaskDef::every("every-tick", 0u64));

    let outcomes: Vec<Pulse> = [0, 100, 200, 300]
        .into_iter()
        .map(|now| scheduler.pulse_at(now))
        .collect();

    assert_eq!(outcomes[..3], [Pulse::Gated, Pulse::Gated, Pulse::Gated]);
    assert!(matches!(&outcomes[3], Pulse::Ticked(summary) if summary.fired == ["every-tick"]));
    assert_eq!(scheduler.ticks(), 1);
    assert_eq!(scheduler.last_tick_at(), 300);
    assert_eq!(fired.get(), 1);
}

#[test]
fn one_shot_fires_once_after_deadline() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::after("flash", 500u64));

    scheduler.tick(400).unwrap();
    scheduler.tick(500).unwrap();
    assert_eq!(fired.get(), 0);

    let summary = scheduler.tick(501).unwrap();
    assert_eq!(fired.get(), 1);
    assert_eq!(summary.removed, ["flash"]);
    assert!(!scheduler.has("flash"));

    scheduler.tick(10_000).unwrap();
    assert_eq!(fired.get(), 1);
}

#[test]
fn recurring_fires_each_full_interval() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::every("spin", 1000u64));

    scheduler.tick(1000).unwrap();
    assert_eq!(fired.get(), 1);
    let state = scheduler
        .with_task_mut("spin", |task| (task.iteration_count(), task.last_fired_at()))
        .unwrap();
    assert_eq!(state, (Some(1), Some(1000)));

    scheduler.tick(1999).unwrap();
    assert_eq!(fired.get(), 1);

    scheduler.tick(2000).unwrap();
    assert_eq!(fired.get(), 2);
}

#[test]
fn iteration_limit_caps_firings() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::every("thrice", 100u64).iterations(3));

    let mut removed_at = None;
    for now in (100..=600).step_by(100) {
        let summary = scheduler.tick(now).unwrap();
        if summary.removed.iter().any(|name| name == "thrice") {
            removed_at = Some(now);
        }
    }

    assert_eq!(fired.get(), 3);
    assert_eq!(removed_at, Some(300));
}

#[test]
fn disable_freezes_without_resetting() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::every("paused", 100u64));

    scheduler.tick(100).unwrap();
    scheduler.disable_task("paused").unwrap();
    scheduler.tick(500).unwrap();
    assert_eq!(fired.get(), 1);

    scheduler.enable_task("paused").unwrap();
    scheduler.tick(550).unwrap();
    assert_eq!(fired.get(), 2);
    let count = scheduler
        .with_task_mut("paused", |task| task.iteration_count())
        .unwrap();
    assert_eq!(count, Some(2));
}

#[test]
fn duplicate_add_keeps_first_task_until_replaced() {
    let scheduler = running(0);
    let first = counted(&scheduler, TaskDef::every("job", 0u64));

    let second = Rc::new(Cell::new(0));
    let hits = second.clone();
    let result = scheduler.add(TaskDef::every("job", 0u64), move |_| {
        hits.set(hits.get() + 1);
        Ok(())
    });
    assert!(matches!(result, Err(SchedulerError::DuplicateName(name)) if name == "job"));

    scheduler.tick(1).unwrap();
    assert_eq!((first.get(), second.get()), (1, 0));

    let hits = second.clone();
    scheduler
        .replace(TaskDef::every("job", 0u64), move |_| {
            hits.set(hits.get() + 1);
            Ok(())
        })
        .unwrap();
    scheduler.tick(2).unwrap();
    assert_eq!((first.get(), second.get()), (1, 1));
}

#[test]
fn replace_keeps_position_and_requires_existing_name() {
    let scheduler = running(0);
    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["a", "b", "c"] {
        let order = order.clone();
        scheduler
            .add(TaskDef::every(name, 0u64), move |ctx| {
                order.borrow_mut().push(ctx.name().to_string());
                Ok(())
            })
            .unwrap();
    }

    let log = order.clone();
    scheduler
        .replace(TaskDef::every("b", 0u64), move |_| {
            log.borrow_mut().push("b2".to_string());
            Ok(())
        })
        .unwrap();
    scheduler.tick(1).unwrap();

    assert_eq!(scheduler.task_names(), ["a", "b", "c"]);
    assert_eq!(*order.borrow(), ["a", "b2", "c"]);
    assert!(matches!(
        scheduler.replace(TaskDef::every("zzz", 0u64), |_| Ok(())),
        Err(SchedulerError::NotFound(_))
    ));
}

#[test]
fn heartbeat_floor_only_rises() {
    let (scheduler, _) = scheduler_with_clock(500);

    assert!(matches!(
        scheduler.change_wait(100),
        Err(SchedulerError::OutOfRange { value: 100, .. })
    ));
    assert_eq!(scheduler.heartbeat(), 500);

    scheduler.change_wait(1000).unwrap();
    assert_eq!(scheduler.heartbeat(), 1000);
    assert_eq!(scheduler.floor(), 1000);

    assert!(scheduler.change_wait(500).is_err());
    assert!(scheduler.change_wait(1000).is_err());
    assert!(scheduler.change_wait(cadence::MAX_HEARTBEAT_MS + 1).is_err());
    assert_eq!(scheduler.heartbeat(), 1000);
}

#[test]
fn failing_callback_is_isolated() {
    let scheduler = running(0);
    scheduler
        .add(TaskDef::every("broken", 0u64), |_| Err("no disk".into()))
        .unwrap();
    scheduler
        .add(TaskDef::every("panicky", 0u64), |_| panic!("boom"))
        .unwrap();
    let sibling = counted(&scheduler, TaskDef::every("sibling", 0u64));

    let summary = scheduler.tick(1).unwrap();

    assert_eq!(summary.failed, ["broken", "panicky"]);
    assert_eq!(summary.removed, ["broken", "panicky"]);
    assert_eq!(sibling.get(), 1);
    assert_eq!(scheduler.task_names(), ["sibling"]);
}

#[test]
fn stop_delays_due_work_and_catches_up_once() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::every("steady", 100u64));

    scheduler.tick(100).unwrap();
    scheduler.stop();
    assert_eq!(scheduler.tick(1000).unwrap(), TickSummary::default());
    assert_eq!(fired.get(), 1);

    scheduler.start();
    scheduler.tick(1000).unwrap();
    assert_eq!(fired.get(), 2);
    scheduler.tick(1050).unwrap();
    assert_eq!(fired.get(), 2);
}

#[test]
fn tick_fault_removes_only_the_faulting_task() {
    let scheduler = running(0);
    let held = counted(&scheduler, TaskDef::every("held", 0u64));
    let other = counted(&scheduler, TaskDef::every("other", 0u64));

    // the tick runs while "held" is borrowed, so it cannot be evaluated
    let summary = scheduler
        .with_task_mut("held", |_| scheduler.tick(5))
        .unwrap()
        .unwrap();

    assert_eq!(summary.faulted, ["held"]);
    assert_eq!(summary.fired, ["other"]);
    assert_eq!((held.get(), other.get()), (0, 1));
    assert!(!scheduler.has("held"));
    assert!(scheduler.has("other"));
}

#[test]
fn task_removed_mid_pass_is_skipped() {
    let scheduler = running(0);
    scheduler
        .add(TaskDef::every("remover", 0u64), |ctx| {
            ctx.scheduler().remove("victim")?;
            Ok(())
        })
        .unwrap();
    let victim = counted(&scheduler, TaskDef::every("victim", 0u64));

    let summary = scheduler.tick(1).unwrap();
    assert_eq!(summary.fired, ["remover"]);
    assert_eq!(victim.get(), 0);
}

#[test]
fn replacement_of_destroyed_task_survives_the_sweep() {
    let scheduler = running(0);
    let old = counted(&scheduler, TaskDef::after("slot", 0u64));
    let fresh = Rc::new(Cell::new(0));
    let hits = fresh.clone();
    scheduler
        .add(TaskDef::after("swapper", 0u64), move |ctx| {
            let hits = hits.clone();
            let bump = move |_: &mut TaskContext<'_>| -> CallbackResult {
                hits.set(hits.get() + 1);
                Ok(())
            };
            ctx.scheduler().replace(TaskDef::every("slot", 10u64), bump)?;
            Ok(())
        })
        .unwrap();

    let summary = scheduler.tick(1).unwrap();
    assert_eq!(old.get(), 1);
    assert_eq!(summary.removed, ["swapper"]);
    assert!(scheduler.has("slot"));

    scheduler.tick(20).unwrap();
    assert_eq!(fresh.get(), 1);
}

#[test]
fn tasks_added_mid_pass_wait_for_the_next_tick() {
    let scheduler = running(0);
    let spawned = Rc::new(Cell::new(0));
    let hits = spawned.clone();
    scheduler
        .add(TaskDef::after("spawner", 0u64), move |ctx| {
            let hits = hits.clone();
            let bump = move |_: &mut TaskContext<'_>| -> CallbackResult {
                hits.set(hits.get() + 1);
                Ok(())
            };
            ctx.scheduler().add(TaskDef::every("child", 0u64), bump)?;
            Ok(())
        })
        .unwrap();

    scheduler.tick(1).unwrap();
    assert_eq!(spawned.get(), 0);
    scheduler.tick(2).unwrap();
    assert_eq!(spawned.get(), 1);
}

#[test]
fn callback_can_destroy_and_retune_its_task() {
    let scheduler = running(0);
    scheduler
        .add(TaskDef::every("self-managed", 100u64), |ctx| {
            match ctx.task().iteration_count() {
                Some(1) => {
                    ctx.task_mut().set_interval(300);
                }
                _ => ctx.destroy(),
            }
            Ok(())
        })
        .unwrap();

    scheduler.tick(100).unwrap();
    scheduler.tick(300).unwrap();
    assert!(scheduler.has("self-managed"));
    let summary = scheduler.tick(400).unwrap();
    assert_eq!(summary.removed, ["self-managed"]);
}

#[test]
fn remove_list_is_all_or_nothing() {
    let scheduler = running(0);
    for name in ["a", "b", "c"] {
        scheduler.add(TaskDef::every(name, 10u64), |_| Ok(())).unwrap();
    }

    assert!(matches!(
        scheduler.remove_list(["a", "missing"]),
        Err(SchedulerError::NotFound(name)) if name == "missing"
    ));
    assert_eq!(scheduler.len(), 3);

    assert_eq!(scheduler.remove_list(["a", "c"]).unwrap(), 2);
    assert_eq!(scheduler.task_names(), ["b"]);

    assert_eq!(scheduler.empty().unwrap(), 1);
    assert!(scheduler.is_empty());
}

#[test]
fn missing_tasks_are_reported() {
    let scheduler = running(0);
    assert!(matches!(scheduler.remove("ghost"), Err(SchedulerError::NotFound(_))));
    assert!(matches!(scheduler.enable_task("ghost"), Err(SchedulerError::NotFound(_))));
    assert!(matches!(scheduler.disable_task("ghost"), Err(SchedulerError::NotFound(_))));
    assert!(matches!(scheduler.require("ghost"), Err(SchedulerError::NotFound(_))));
    assert!(matches!(
        scheduler.change_task_wait("ghost", 10),
        Err(SchedulerError::NotFound(_))
    ));
    assert!(!scheduler.disable_task_if_present("ghost").unwrap());
    assert!(!scheduler.has("ghost"));
}

#[test]
fn disable_task_if_present_disables_live_task() {
    let scheduler = running(0);
    let fired = counted(&scheduler, TaskDef::every("beat", 0u64));

    assert!(scheduler.disable_task_if_present("beat").unwrap());
    assert!(!scheduler.task("beat").unwrap().active);

    scheduler.tick(10).unwrap();
    assert_eq!(fired.get(), 0);
}

#[test]
fn disable_task_if_present_reports_busy_task_from_its_own_callback() {
    let scheduler = running(0);
    let outcome = Rc::new(RefCell::new(None));
    let seen = outcome.clone();
    scheduler
        .add(TaskDef::every("busy", 0u64), move |ctx| {
            *seen.borrow_mut() = Some(ctx.scheduler().disable_task_if_present("busy"));
            Ok(())
        })
        .unwrap();

    let summary = scheduler.tick(1).unwrap();
    assert_eq!(summary.fired, ["busy"]);
    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(SchedulerError::TaskBusy(name))) if name == "busy"
    ));
    assert!(scheduler.task("busy").unwrap().active);
}

#[test]
fn thousands_of_tasks_fire_once_and_are_swept() {
    let scheduler = running(0);
    let fired = Rc::new(Cell::new(0u32));
    for i in 0..5_000 {
        let hits = fired.clone();
        scheduler
            .add(TaskDef::after(format!("burst-{}", i), 0u64), move |_| {
                hits.set(hits.get() + 1);
                Ok(())
            })
            .unwrap();
    }
    let keeper = counted(&scheduler, TaskDef::every("keeper", 0u64));

    let summary = scheduler.tick(1).unwrap();
    assert_eq!(fired.get(), 5_000);
    assert_eq!(summary.removed.len(), 5_000);
    assert_eq!(summary.removed.first().map(String::as_str), Some("burst-0"));
    assert_eq!(scheduler.task_names(), ["keeper"]);

    scheduler.tick(2).unwrap();
    assert_eq!(fired.get(), 5_000);
    assert_eq!(keeper.get(), 2);
}

#[test]
fn change_task_wait_only_applies_to_recurring() {
    let scheduler = running(0);
    scheduler.add(TaskDef::after("once", 50u64), |_| Ok(())).unwrap();
    let fired = counted(&scheduler, TaskDef::every("loop", 1000u64));

    assert!(!scheduler.change_task_wait("once", 10).unwrap());
    assert!(scheduler.change_task_wait("loop", 10).unwrap());

    scheduler.tick(10).unwrap();
    assert_eq!(fired.get(), 1);
}

#[test]
fn invalid_definitions_are_rejected() {
    let scheduler = running(0);
    assert!(matches!(
        scheduler.add(TaskDef::every("", 10u64), |_| Ok(())),
        Err(SchedulerError::Validation { .. })
    ));
    assert!(matches!(
        scheduler.add(TaskDef::default(), |_| Ok(())),
        Err(SchedulerError::Validation { .. })
    ));
    assert!(matches!(
        scheduler.add(TaskDef::after("bad", "soonish"), |_| Ok(())),
        Err(SchedulerError::Validation { .. })
    ));
    assert!(scheduler.is_empty());
}
