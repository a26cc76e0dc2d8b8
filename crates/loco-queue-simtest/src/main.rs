//! Waypoint Queue Headless Scenario Harness
//!
//! Validates the cut engine, route files and the scheduler against the
//! reference yard. Runs entirely in-process: no host game, no rendering.
//!
//! Usage:
//!   cargo run -p loco-queue-simtest
//!   cargo run -p loco-queue-simtest -- --verbose
//!
//! `--verbose` raises the default log level to `debug`; `RUST_LOG` still wins.

use loco_queue_core::persistence::{load_routes_str, save_routes};
use loco_queue_core::prelude::*;
use loco_queue_core::yard::FuelSource;
use loco_queue_logic::cut::{
    calculate_cut_for_dropoff_by_count, calculate_cut_for_pickup_by_count, filter_motive_pairs,
    find_cut_by_count, find_cuts_all_except_motive_power, motive_power_runs,
};
use loco_queue_logic::uncouple::split_at;
use loco_queue_logic::{find_car_to_uncouple, Consist, MotivePower, TenderPairs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

// ── Scenario data (same files a host would ship) ────────────────────────
const ROUTES_JSON: &str = include_str!("../../../data/scenario_routes.json");
const CONFIG_JSON: &str = include_str!("../../../data/scheduler_config.json");

const SEED: u64 = 0x5EED;
const SWEEP_CASES: usize = 500;
const STEP_SECONDS: f64 = 0.25;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    println!("=== Waypoint Queue Scenario Harness ===\n");

    let mut results = Vec::new();

    // 1. Route file load, migration and save
    results.extend(validate_route_file(verbose));

    // 2. Scheduler configuration
    results.extend(validate_config(verbose));

    // 3. Seeded cut-engine sweep
    results.extend(validate_cut_sweep(verbose));

    // 4. Multi-locomotive route scenarios
    results.extend(validate_route_scenarios(verbose));

    // 5. Failure isolation between queues
    results.extend(validate_error_isolation(verbose));

    // 6. Randomized setouts through the scheduler
    results.extend(validate_random_setouts(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn id(s: &str) -> CarId {
    CarId::new(s)
}

fn step(scheduler: &mut WaypointScheduler, yard: &mut Yard) {
    yard.advance(STEP_SECONDS as f32);
    scheduler.update(yard, STEP_SECONDS);
}

/// Step until every queue is gone. Returns false if `max_steps` ran out.
fn run_until_empty(scheduler: &mut WaypointScheduler, yard: &mut Yard, max_steps: usize) -> bool {
    for _ in 0..max_steps {
        if scheduler.queues().is_empty() {
            return true;
        }
        step(scheduler, yard);
    }
    let drained = scheduler.queues().is_empty();
    if !drained {
        log::warn!(
            "queues still busy after {max_steps} steps: {:?}",
            scheduler.statuses()
        );
    }
    drained
}

fn record_events(scheduler: &mut WaypointScheduler) -> Rc<RefCell<Vec<QueueEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    scheduler.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}

// ── 1. Route File ───────────────────────────────────────────────────────

fn validate_route_file(verbose: bool) -> Vec<TestResult> {
    println!("--- Route File ---");
    let mut results = Vec::new();

    let routes = match load_routes_str(ROUTES_JSON) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "routes_parse".into(),
                passed: false,
                detail: format!("load error: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "routes_loaded".into(),
        passed: routes.len() == 4,
        detail: format!("{} routes loaded", routes.len()),
    });

    if verbose {
        for route in &routes {
            println!("  route '{}': {} orders", route.name, route.orders.len());
        }
    }

    // The file mixes unversioned and current records
    let raw: serde_json::Value = serde_json::from_str(ROUTES_JSON).unwrap_or_default();
    let records: Vec<&serde_json::Value> = raw["routes"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|r| r["orders"].as_array().into_iter().flatten())
        .collect();
    let legacy = records.iter().filter(|r| r.get("version").is_none()).count();
    results.push(TestResult {
        name: "routes_mixed_versions".into(),
        passed: legacy > 0 && legacy < records.len(),
        detail: format!("{} of {} records unversioned", legacy, records.len()),
    });

    // Legacy destination flags upcast to a typed directive
    let setout = routes.iter().find(|r| r.name == "mill-setout");
    let upcast_ok = setout
        .and_then(|r| r.orders.first())
        .is_some_and(|o| {
            let wanted = UncoupleMode::ByDestination {
                target: DestinationMatch::Industry("mill".into()),
            };
            o.uncouple == wanted && o.apply_handbrakes_on_uncouple
        });
    results.push(TestResult {
        name: "routes_legacy_destination".into(),
        passed: upcast_ok,
        detail: "v1 uncouple_by_destination → ByDestination(industry mill)".into(),
    });

    // Legacy do_not_stop becomes a rolling order
    let rolling = routes
        .iter()
        .find(|r| r.name == "hopper-pickup")
        .and_then(|r| r.orders.get(1))
        .is_some_and(|o| !o.stop_at_waypoint);
    results.push(TestResult {
        name: "routes_legacy_rolling".into(),
        passed: rolling,
        detail: "v1 do_not_stop → stop_at_waypoint = false".into(),
    });

    // Save at the current version, load again
    let mut buffer = Vec::new();
    let saved = save_routes(&mut buffer, &routes);
    let reloaded = saved
        .ok()
        .and_then(|_| String::from_utf8(buffer).ok())
        .and_then(|text| load_routes_str(&text).ok());
    results.push(TestResult {
        name: "routes_save_reload".into(),
        passed: reloaded.as_ref() == Some(&routes),
        detail: "saved routes reload identically".into(),
    });

    results
}

// ── 2. Scheduler Config ─────────────────────────────────────────────────

fn scenario_config() -> SchedulerConfig {
    SchedulerConfig::from_json(CONFIG_JSON).unwrap_or_default()
}

fn validate_config(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scheduler Config ---");
    let mut results = Vec::new();

    match SchedulerConfig::from_json(CONFIG_JSON) {
        Ok(config) => {
            let errors = config.validate();
            results.push(TestResult {
                name: "config_valid".into(),
                passed: errors.is_empty(),
                detail: if errors.is_empty() {
                    format!("tick every {}s", config.tick_interval_secs)
                } else {
                    format!("{} config errors", errors.len())
                },
            });
            results.push(TestResult {
                name: "config_day_length".into(),
                passed: config.seconds_per_day == 3600.0,
                detail: format!("{}s per in-sim day", config.seconds_per_day),
            });
        }
        Err(e) => results.push(TestResult {
            name: "config_parse".into(),
            passed: false,
            detail: format!("JSON parse error: {}", e),
        }),
    }

    results.push(TestResult {
        name: "config_defaults_valid".into(),
        passed: SchedulerConfig::default().validate().is_empty(),
        detail: "default tunables pass validation".into(),
    });

    let broken = SchedulerConfig {
        tick_interval_secs: 0.0,
        max_orders_per_tick: 0,
        ..Default::default()
    };
    let errors = broken.validate();
    results.push(TestResult {
        name: "config_rejects_bad_values".into(),
        passed: errors.len() == 2,
        detail: format!("{} errors for zero interval and zero order limit", errors.len()),
    });

    results
}

// ── 3. Cut Engine Sweep ─────────────────────────────────────────────────

/// Random consist: mostly ordinary cars, some locomotives, some
/// locomotive/tender pairs.
fn random_consist(rng: &mut StdRng, len: usize) -> (Consist, TenderPairs) {
    let mut cars = Vec::with_capacity(len);
    let mut pairs = TenderPairs::new();
    let mut n = 0;
    while cars.len() < len {
        let roll = rng.gen_range(0..10);
        if roll < 2 && cars.len() + 2 <= len {
            let loco = format!("L{n}");
            let tender = format!("T{n}");
            cars.push(Car::locomotive(loco.clone()));
            cars.push(Car::tender(tender.clone()));
            pairs.pair(loco, tender);
        } else if roll < 3 {
            cars.push(Car::locomotive(format!("L{n}")));
        } else {
            cars.push(Car::ordinary(format!("c{n}")));
        }
        n += 1;
    }
    (Consist::new(cars), pairs)
}

fn id_set(cars: &[Car]) -> HashSet<&CarId> {
    cars.iter().map(|c| &c.id).collect()
}

fn validate_cut_sweep(verbose: bool) -> Vec<TestResult> {
    println!("--- Cut Engine Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(SEED);

    let mut count_failures = 0;
    let mut pickup_failures = 0;
    let mut dropoff_failures = 0;
    let mut boundary_failures = 0;
    let mut pair_violations = 0;

    for _ in 0..SWEEP_CASES {
        let len = rng.gen_range(2..14);
        let (consist, pairs) = random_consist(&mut rng, len);
        let len = consist.len();

        // Count cut from either end separates exactly the block
        let count = rng.gen_range(1..len);
        let ordered = if rng.gen_bool(0.5) {
            consist.clone()
        } else {
            consist.reversed()
        };
        let block = find_cut_by_count(&ordered, count);
        let separated = find_car_to_uncouple(&block, &consist)
            .ok()
            .and_then(|point| split_at(&point, &consist))
            .is_some_and(|(head, tail)| {
                let wanted = id_set(&block);
                id_set(&head) == wanted || id_set(&tail) == wanted
            });
        if !separated {
            count_failures += 1;
        }

        // Post-coupling blocks are prefixes of the far-end-first order
        let coupled = rng.gen_range(0..len);
        let keep = rng.gen_range(1..=len);
        let pickup = calculate_cut_for_pickup_by_count(&consist, coupled, keep);
        if pickup.len() > coupled || pickup[..] != consist.cars()[..pickup.len()] {
            pickup_failures += 1;
        }
        let dropoff = calculate_cut_for_dropoff_by_count(&consist, coupled, keep, &pairs);
        let carries_power = dropoff
            .get(coupled + 1..)
            .is_some_and(|carried| carried.iter().any(|c| pairs.is_motive_power(c)));
        if dropoff.len() <= coupled
            || dropoff[..] != consist.cars()[..dropoff.len()]
            || carries_power
        {
            dropoff_failures += 1;
        }

        // One cut per internal motive-power boundary, each resolvable
        let runs = motive_power_runs(&consist, &pairs);
        let cuts = find_cuts_all_except_motive_power(&consist, &pairs);
        let any_power = consist.iter().any(|c| pairs.is_motive_power(c));
        let expected = if any_power { runs.len() - 1 } else { 0 };
        let resolvable = cuts
            .iter()
            .all(|block| find_car_to_uncouple(block, &consist).is_ok());
        if cuts.len() != expected || !resolvable {
            boundary_failures += 1;
        }

        // Filtered blocks never hold half of a pair
        let filtered = filter_motive_pairs(find_cut_by_count(&ordered, count), &ordered, &pairs);
        let kept = id_set(&filtered);
        let split_pair = filtered.iter().any(|car| {
            pairs
                .pair_of(car, &consist)
                .is_some_and(|other| consist.contains(&other) && !kept.contains(&other))
        });
        if split_pair {
            pair_violations += 1;
        }
    }

    if verbose {
        println!("  swept {} random consists (seed {:#x})", SWEEP_CASES, SEED);
    }

    results.push(TestResult {
        name: "sweep_count_cut_separates".into(),
        passed: count_failures == 0,
        detail: format!("{} / {} count cuts failed to separate", count_failures, SWEEP_CASES),
    });
    results.push(TestResult {
        name: "sweep_pickup_prefix".into(),
        passed: pickup_failures == 0,
        detail: format!("{} pickup blocks out of shape", pickup_failures),
    });
    results.push(TestResult {
        name: "sweep_dropoff_prefix".into(),
        passed: dropoff_failures == 0,
        detail: format!("{} dropoff blocks out of shape", dropoff_failures),
    });
    results.push(TestResult {
        name: "sweep_motive_boundaries".into(),
        passed: boundary_failures == 0,
        detail: format!("{} consists with wrong boundary cuts", boundary_failures),
    });
    results.push(TestResult {
        name: "sweep_pairs_intact".into(),
        passed: pair_violations == 0,
        detail: format!("{} filtered blocks split a pair", pair_violations),
    });

    results
}

// ── 4. Route Scenarios ──────────────────────────────────────────────────

fn scenario_yard() -> Yard {
    let mut yard = Yard::new();

    // L10: road switcher, interchange cars then mill cars toward the B end
    yard.add_consist(vec![
        Car::locomotive("L10"),
        Car::ordinary("b1"),
        Car::ordinary("b2"),
        Car::ordinary("m1"),
        Car::ordinary("m2"),
    ]);
    yard.set_leading_end(&id("L10"), End::B);
    for car in ["b1", "b2"] {
        yard.set_destination(&id(car), Destination::track("interchange"));
    }
    for car in ["m1", "m2"] {
        yard.set_destination(&id(car), Destination::track("mill-spur").with_industry("mill"));
    }
    yard.add_fuel_source(
        "fuel-rack",
        FuelSource {
            load: "diesel".into(),
            stock: 5000.0,
            rate: 40.0,
        },
    );

    // L20: light engine; hoppers standing at the quarry
    yard.add_car(Car::locomotive("L20"));
    yard.add_consist(vec![
        Car::ordinary("h0"),
        Car::ordinary("h1"),
        Car::ordinary("h2"),
        Car::ordinary("h3"),
    ]);

    // L30: shuttle engine
    yard.add_car(Car::locomotive("L30"));

    // L40 + tender, two cars, pusher L41
    yard.add_consist(vec![
        Car::locomotive("L40"),
        Car::tender("T40"),
        Car::ordinary("c1"),
        Car::ordinary("c2"),
        Car::locomotive("L41"),
    ]);
    yard.pair_tender(&id("L40"), &id("T40"));

    yard
}

fn validate_route_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Route Scenarios ---");
    let mut results = Vec::new();

    let routes = match load_routes_str(ROUTES_JSON) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_routes".into(),
                passed: false,
                detail: format!("load error: {}", e),
            });
            return results;
        }
    };

    let mut yard = scenario_yard();
    let mut scheduler = WaypointScheduler::new(scenario_config());
    let events = record_events(&mut scheduler);
    for route in routes {
        scheduler.define_route(route);
    }

    let assignments = [
        ("L10", "mill-setout", false),
        ("L20", "hopper-pickup", false),
        ("L30", "shuttle", true),
        ("L40", "helper-release", false),
    ];
    for (loco, route, looping) in assignments {
        if let Err(e) = scheduler.assign_route(&id(loco), route, looping) {
            results.push(TestResult {
                name: format!("scenario_assign_{}", route),
                passed: false,
                detail: e.to_string(),
            });
        }
    }

    // Ten in-sim minutes
    for _ in 0..2400 {
        step(&mut scheduler, &mut yard);
    }

    if verbose {
        for status in scheduler.statuses() {
            println!(
                "  {}: {} pending, in flight {:?}",
                status.locomotive,
                status.pending.len(),
                status.in_flight
            );
        }
    }

    // Mill setout: mill cars left braked, engine refueled
    let setout = yard.consist_ids(&id("L10"));
    results.push(TestResult {
        name: "scenario_setout_by_destination".into(),
        passed: setout == ["L10", "b1", "b2"],
        detail: format!("L10 consist {:?}", setout),
    });
    results.push(TestResult {
        name: "scenario_setout_handbrakes".into(),
        passed: yard.brakes(&id("m1")).handbrake
            && yard.brakes(&id("m2")).handbrake
            && !yard.brakes(&id("b2")).handbrake,
        detail: "handbrakes only on the left-behind mill cars".into(),
    });
    results.push(TestResult {
        name: "scenario_refuel".into(),
        passed: yard.fuel_level(&id("L10")) == 300.0,
        detail: format!("L10 fuel {:.1}", yard.fuel_level(&id("L10"))),
    });

    // Hopper pickup: keep two nearest, leave two braked
    let pickup = yard.consist_ids(&id("L20"));
    results.push(TestResult {
        name: "scenario_post_coupling_pickup".into(),
        passed: pickup == ["h2", "h3", "L20"],
        detail: format!("L20 consist {:?}", pickup),
    });
    results.push(TestResult {
        name: "scenario_pickup_effects".into(),
        passed: yard.brakes(&id("h2")).air_connected
            && yard.brakes(&id("h0")).handbrake
            && !yard.brakes(&id("h3")).handbrake,
        detail: "air on the pickup, handbrakes on the remainder".into(),
    });

    // Helper release: every boundary cut, tender kept with its engine
    let helper_ok = yard.consist_ids(&id("L40")) == ["L40", "T40"]
        && yard.consist_ids(&id("c1")) == ["c1", "c2"]
        && yard.consist_ids(&id("L41")) == ["L41"];
    results.push(TestResult {
        name: "scenario_all_except_motive_power".into(),
        passed: helper_ok,
        detail: format!("L40 consist {:?}", yard.consist_ids(&id("L40"))),
    });

    let finished = ["L10", "L20", "L40"]
        .iter()
        .all(|loco| scheduler.status(&id(loco)).is_none());
    results.push(TestResult {
        name: "scenario_queues_exhausted".into(),
        passed: finished,
        detail: "one-shot routes removed their queues".into(),
    });

    let loops = events
        .borrow()
        .iter()
        .filter(|e| match e {
            QueueEvent::RouteRepopulated { locomotive, .. } => locomotive.as_str() == "L30",
            _ => false,
        })
        .count();
    results.push(TestResult {
        name: "scenario_looping_route".into(),
        passed: loops > 0 && scheduler.status(&id("L30")).is_some(),
        detail: format!("shuttle re-populated {} times", loops),
    });

    let failures = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, QueueEvent::OrderFailed { .. }))
        .count();
    results.push(TestResult {
        name: "scenario_no_failures".into(),
        passed: failures == 0,
        detail: format!("{} orders failed", failures),
    });

    // Unassigned, the shuttle drains its last copy and stops
    scheduler.unassign_route(&id("L30"));
    results.push(TestResult {
        name: "scenario_shuttle_drains".into(),
        passed: run_until_empty(&mut scheduler, &mut yard, 1200),
        detail: "queue removed after unassigning the loop".into(),
    });

    results
}

// ── 5. Error Isolation ──────────────────────────────────────────────────

fn validate_error_isolation(_verbose: bool) -> Vec<TestResult> {
    println!("--- Error Isolation ---");
    let mut results = Vec::new();

    let mut yard = Yard::new();
    yard.add_consist(vec![Car::locomotive("L50"), Car::ordinary("x1")]);
    yard.add_consist(vec![
        Car::locomotive("L51"),
        Car::ordinary("y1"),
        Car::ordinary("y2"),
    ]);
    yard.set_leading_end(&id("L51"), End::B);

    let mut scheduler = WaypointScheduler::new(scenario_config());
    let events = record_events(&mut scheduler);

    let here = |segment: &str| WaypointOrder::to(Location::new(segment, 0.0));
    let bad = scheduler.enqueue(
        &id("L50"),
        here("house-track").uncouple(UncoupleMode::BySpecificCar {
            query: "missing-car".into(),
        }),
    );
    let follow_up = scheduler.enqueue(&id("L50"), here("runaround"));
    let healthy = scheduler.enqueue(
        &id("L51"),
        here("team-track").uncouple(UncoupleMode::ByCount { count: 1 }),
    );
    let (Ok(bad), Ok(follow_up), Ok(_)) = (bad, follow_up, healthy) else {
        results.push(TestResult {
            name: "isolation_enqueue".into(),
            passed: false,
            detail: "could not queue scenario orders".into(),
        });
        return results;
    };

    for _ in 0..200 {
        step(&mut scheduler, &mut yard);
    }

    let paused = scheduler.status(&id("L50"));
    results.push(TestResult {
        name: "isolation_failed_queue_paused".into(),
        passed: paused.as_ref().is_some_and(|s| {
            s.error.is_some() && s.in_flight == Some(bad) && s.pending == [follow_up]
        }),
        detail: paused
            .and_then(|s| s.error)
            .unwrap_or_else(|| "no error recorded".into()),
    });

    let other = yard.consist_ids(&id("L51"));
    results.push(TestResult {
        name: "isolation_other_queue_runs".into(),
        passed: other == ["L51", "y1"] && scheduler.status(&id("L51")).is_none(),
        detail: format!("L51 consist {:?}", other),
    });

    let failures = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, QueueEvent::OrderFailed { .. }))
        .count();
    results.push(TestResult {
        name: "isolation_single_failure_event".into(),
        passed: failures == 1,
        detail: format!("{} failure events while paused", failures),
    });

    let removed = scheduler.remove_order(&mut yard, &id("L50"), bad).is_ok();
    results.push(TestResult {
        name: "isolation_resume_after_remove".into(),
        passed: removed && run_until_empty(&mut scheduler, &mut yard, 200),
        detail: "removing the failed order resumes the queue".into(),
    });

    results
}

// ── 6. Random Setouts ───────────────────────────────────────────────────

fn validate_random_setouts(verbose: bool) -> Vec<TestResult> {
    println!("--- Random Setouts ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(SEED ^ 0xCAB);

    let mut yard = Yard::new();
    let mut scheduler = WaypointScheduler::new(scenario_config());
    let mut expected = Vec::new();
    let mut total_cars = 0;

    for n in 0..40 {
        let loco = format!("R{n}");
        let len = rng.gen_range(1..9);
        let mut cars = vec![Car::locomotive(loco.clone())];
        cars.extend((0..len).map(|i| Car::ordinary(format!("R{n}-{i}"))));
        total_cars += cars.len();
        yard.add_consist(cars);

        let leading = if rng.gen_bool(0.5) { End::A } else { End::B };
        yard.set_leading_end(&id(&loco), leading);
        let count = rng.gen_range(1..=len);
        // Counting from the A end starts at the locomotive itself.
        let keeps = match leading {
            End::A => count,
            End::B => len + 1 - count,
        };
        expected.push((id(&loco), keeps));

        let order = WaypointOrder::to(Location::new(format!("siding-{n}"), 0.0))
            .uncouple(UncoupleMode::ByCount { count });
        if let Err(e) = scheduler.enqueue(&id(&loco), order) {
            results.push(TestResult {
                name: format!("random_enqueue_{}", loco),
                passed: false,
                detail: e.to_string(),
            });
        }
    }

    results.push(TestResult {
        name: "random_all_resolved".into(),
        passed: run_until_empty(&mut scheduler, &mut yard, 400),
        detail: format!("{} queues ticked together", expected.len()),
    });

    let wrong: Vec<_> = expected
        .iter()
        .filter(|(loco, keeps)| yard.consist_ids(loco).len() != *keeps)
        .collect();
    if verbose {
        for (loco, keeps) in &wrong {
            println!(
                "  {}: expected {} cars, found {:?}",
                loco,
                keeps,
                yard.consist_ids(loco)
            );
        }
    }
    results.push(TestResult {
        name: "random_setout_lengths".into(),
        passed: wrong.is_empty(),
        detail: format!("{} of {} consists with the wrong length", wrong.len(), expected.len()),
    });

    let mut seen = HashSet::new();
    let mut counted = 0;
    for (loco, _) in &expected {
        for car in std::iter::once(loco.to_string()).chain((0..9).map(|i| format!("{loco}-{i}"))) {
            for member in yard.consist_ids(&id(&car)) {
                if seen.insert(member) {
                    counted += 1;
                }
            }
        }
    }
    results.push(TestResult {
        name: "random_cars_conserved".into(),
        passed: counted == total_cars,
        detail: format!("{} of {} cars accounted for", counted, total_cars),
    });

    results
}
