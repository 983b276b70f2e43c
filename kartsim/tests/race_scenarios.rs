use approx::assert_relative_eq;
use kartsim::core::item::Item;
use kartsim::core::race::{Race, RaceStatus};
use kartsim::core::track::MarkerId;
use kartsim::core::vehicle::MAX_FUEL;
use kartsim::interfaces::motion::LogSink;
use kartsim::interfaces::race_listener::{LogListener, RaceNotification};
use kartsim::post::race_result::RaceResult;
use kartsim::pre::read_sim_pars::SimPars;

fn sim_pars(laps_required: u32, pit_below_fuel: f64) -> SimPars {
    let pars: SimPars = serde_json::from_str(&format!(
        r#"{{
            "race_pars": {{"laps_required": {}, "checkpoints_per_lap": 4, "tick_interval": 0.5}},
            "track_pars": {{
                "name": "kitchen",
                "length": 40.0,
                "markers": [
                    {{"id": "M0", "position": 0.0}},
                    {{"id": "M1", "position": 10.0}},
                    {{"id": "PIT", "position": 20.0}},
                    {{"id": "M3", "position": 30.0}}
                ],
                "pit_stops": ["PIT"]
            }},
            "kart_pars": {{
                "name": "Sumo",
                "distance_per_tick": 1.0,
                "pit_below_fuel": {},
                "refuel_target": 90.0,
                "stall_ticks_before_give_up": 5
            }}
        }}"#,
        laps_required, pit_below_fuel
    ))
    .unwrap();
    pars.validate().unwrap();
    pars
}

fn new_race(pars: &SimPars) -> Race {
    Race::new(pars, Box::new(LogSink), Box::new(LogListener), Some(11)).unwrap()
}

fn run(race: &mut Race) -> RaceResult {
    race.start();
    while !race.is_over() {
        race.simulate_tick();
    }
    race.get_race_result()
}

fn count(result: &RaceResult, notification: &RaceNotification) -> usize {
    result
        .events
        .iter()
        .filter(|e| &e.notification == notification)
        .count()
}

#[test]
fn repeated_pit_marker_enters_once_and_exits_once() {
    let mut pars = sim_pars(3, 0.0);
    pars.track_pars.pit_stops = vec![MarkerId::from("M1")];
    let mut race = new_race(&pars);

    race.on_marker_detected(Some(MarkerId::from("M1")));
    race.on_marker_detected(Some(MarkerId::from("M1")));
    assert!(race.vehicle.in_pit_stop());
    assert!(
        race.track
            .get_instance()
            .unwrap()
            .get_pit_stop(&MarkerId::from("M1"))
            .unwrap()
            .active
    );

    race.on_marker_detected(Some(MarkerId::from("M3")));

    let result = race.get_race_result();
    assert_eq!(count(&result, &RaceNotification::PlayerEntersPitStop), 1);
    assert_eq!(count(&result, &RaceNotification::PlayerExitsPitStop), 1);
    assert!(!race.vehicle.in_pit_stop());
}

#[test]
fn short_race_finishes_without_pit_stop() {
    let mut pars = sim_pars(1, 45.0);
    pars.track_pars.pit_stops.clear();
    let mut race = new_race(&pars);
    let result = run(&mut race);

    assert_eq!(result.status, RaceStatus::Finished);
    assert_eq!(result.laps_completed, 1);
    assert_eq!(result.pit_stops, 0);
    assert_eq!(result.ticks, 40);
    assert_eq!(result.lap_times.len(), 1);
    assert_relative_eq!(result.lap_times[0], 20.0);
    assert_relative_eq!(result.fuel_left, 80.0);
    assert_eq!(
        result.events.last().map(|e| &e.notification),
        Some(&RaceNotification::PlayerFinished)
    );
}

#[test]
fn passing_the_pit_marker_refuels_until_the_next_marker() {
    let mut race = new_race(&sim_pars(1, 45.0));
    let result = run(&mut race);

    assert_eq!(result.status, RaceStatus::Finished);
    assert_eq!(result.pit_stops, 1);
    assert_eq!(count(&result, &RaceNotification::PlayerExitsPitStop), 1);

    let tick_of = |notification: RaceNotification| {
        result
            .events
            .iter()
            .find(|e| e.notification == notification)
            .map(|e| e.tick)
            .unwrap()
    };
    // PIT sits at 20 and M3 at 30 with one unit per tick
    assert_eq!(tick_of(RaceNotification::PlayerEntersPitStop), 20);
    assert_eq!(tick_of(RaceNotification::PlayerExitsPitStop), 30);

    let at_pit = &result.fuel_trace[19];
    assert!(at_pit.in_pit_stop);
    assert_relative_eq!(at_pit.fuel, 90.0);
    assert_relative_eq!(result.fuel_trace[29].fuel, MAX_FUEL);
    assert!(!result.fuel_trace[29].in_pit_stop);
    assert_relative_eq!(result.fuel_left, 95.0);
}

#[test]
fn long_race_never_leaves_the_fuel_bounds() {
    let mut race = new_race(&sim_pars(4, 50.0));
    let result = run(&mut race);

    assert_eq!(result.status, RaceStatus::Finished);
    assert_eq!(result.laps_completed, 4);
    assert_eq!(result.pit_stops, 4);
    assert_eq!(count(&result, &RaceNotification::PlayerExitsPitStop), 4);
    assert_eq!(count(&result, &RaceNotification::CriticalFuel), 0);

    for sample in result.fuel_trace.iter() {
        assert!(sample.fuel >= 0.0 && sample.fuel <= MAX_FUEL);
    }
    for pair in result.fuel_trace.windows(2) {
        if pair[1].in_pit_stop && pair[0].in_pit_stop {
            assert!(pair[1].fuel >= pair[0].fuel);
        }
    }
}

#[test]
fn running_dry_warns_once_and_gives_up() {
    let mut pars = sim_pars(10, 0.0);
    pars.track_pars.pit_stops.clear();
    let mut race = new_race(&pars);
    let result = run(&mut race);

    assert_eq!(result.status, RaceStatus::GaveUp);
    assert!(result.laps_completed < 10);
    assert_eq!(count(&result, &RaceNotification::CriticalFuel), 1);
    assert_eq!(count(&result, &RaceNotification::OutOfFuel), 1);
    assert_relative_eq!(result.fuel_left, 0.0);

    let tick_of = |notification: RaceNotification| {
        result
            .events
            .iter()
            .find(|e| e.notification == notification)
            .map(|e| e.tick)
            .unwrap()
    };
    // full speed until 10 fuel is left, half speed afterwards
    assert_eq!(tick_of(RaceNotification::CriticalFuel), 180);
    assert_eq!(tick_of(RaceNotification::OutOfFuel), 220);
    assert_eq!(result.ticks, 224);
    assert_eq!(
        result.events.last().map(|e| &e.notification),
        Some(&RaceNotification::PlayerGaveUp)
    );
}

#[test]
fn items_are_picked_up_and_used() {
    let mut pars = sim_pars(1, 0.0);
    pars.track_pars.items = serde_json::from_str(
        r#"[{"marker": "M1", "item": "boost"}, {"marker": "M3", "item": "fuel_can"}]"#,
    )
    .unwrap();
    let mut race = new_race(&pars);
    let result = run(&mut race);

    let item_events: Vec<&RaceNotification> = result
        .events
        .iter()
        .map(|e| &e.notification)
        .filter(|n| {
            matches!(
                n,
                RaceNotification::ItemTouched { .. } | RaceNotification::PlayerUseItem { .. }
            )
        })
        .collect();

    assert_eq!(
        item_events,
        vec![
            &RaceNotification::ItemTouched {
                item: Item::Boost,
                marker: MarkerId::from("M1")
            },
            &RaceNotification::PlayerUseItem {
                item: Item::Boost,
                marker: Some(MarkerId::from("M1"))
            },
            &RaceNotification::ItemTouched {
                item: Item::FuelCan,
                marker: MarkerId::from("M3")
            },
            &RaceNotification::PlayerUseItem {
                item: Item::FuelCan,
                marker: Some(MarkerId::from("M3"))
            },
        ]
    );
    assert_eq!(result.status, RaceStatus::Finished);

    let track = race.track.get_instance().unwrap();
    assert_eq!(track.get_object(&MarkerId::from("M1")), None);
}

#[test]
fn reset_allows_a_rematch() {
    let mut pars = sim_pars(1, 0.0);
    pars.track_pars.items = serde_json::from_str(r#"[{"marker": "M1", "item": "jump"}]"#).unwrap();
    let mut race = new_race(&pars);
    let first = run(&mut race);

    race.reset();
    assert_eq!(race.status, RaceStatus::Ready);
    assert_relative_eq!(race.vehicle.fuel(), MAX_FUEL);
    assert_eq!(race.vehicle.lap_count, 0);
    assert_eq!(
        race.track
            .get_instance()
            .unwrap()
            .get_object(&MarkerId::from("M1")),
        Some(Item::Jump)
    );

    let second = run(&mut race);
    assert_eq!(second.status, RaceStatus::Finished);
    assert_eq!(second.ticks, first.ticks);
    assert_eq!(second.events.len(), first.events.len());
}

#[test]
fn race_with_missed_detections_still_ends() {
    let mut pars = sim_pars(3, 50.0);
    pars.kart_pars.detection_rate = 0.5;
    pars.race_pars.max_ticks = 3000;
    let mut race = new_race(&pars);
    let result = run(&mut race);

    assert!(race.is_over());
    assert!(result.ticks <= 3000);
}

#[test]
fn ticks_are_ignored_before_start_and_after_finish() {
    let mut race = new_race(&sim_pars(1, 0.0));
    race.simulate_tick();
    assert_eq!(race.cur_tick, 0);

    let result = run(&mut race);
    race.simulate_tick();
    assert_eq!(race.cur_tick, result.ticks);
}

#[test]
fn teardown_releases_the_track() {
    let mut race = new_race(&sim_pars(3, 0.0));
    race.start();
    for _ in 0..5 {
        race.simulate_tick();
    }

    race.teardown();
    assert_eq!(race.status, RaceStatus::GaveUp);
    assert!(race.track.get_instance().is_none());

    let events_before = race.get_race_result().events.len();
    race.on_marker_detected(Some(MarkerId::from("PIT")));
    race.simulate_tick();

    assert!(!race.vehicle.in_pit_stop());
    assert_eq!(race.get_race_result().events.len(), events_before);
    assert_eq!(race.cur_tick, 5);
}
