// libs/scheduling-cell/tests/properties_test.rs
use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use proptest::prelude::*;
use uuid::Uuid;

use scheduling_cell::{
    intervals_overlap, Appointment, AppointmentStatus, AvailabilityEngine, ScheduleSnapshot, Service, SlotRequest,
    TimeOfDay, WorkingWindow,
};
use shared_utils::test_utils::{date, utc};

/// Monday; every generated window lives on this weekday.
fn day() -> NaiveDate {
    date(2026, 3, 9)
}

fn midnight() -> DateTime<Utc> {
    utc(2026, 3, 9, 0, 0)
}

fn at_minute(minute: u32) -> DateTime<Utc> {
    midnight() + Duration::minutes(i64::from(minute))
}

#[derive(Debug, Clone)]
struct Case {
    granularity: u32,
    windows: Vec<(u32, u32, bool)>,
    appointments: Vec<(u32, u32, usize)>,
    first_duration: u32,
    extra_duration: u32,
    now_offset: i64,
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (
        prop_oneof![Just(5u32), Just(10u32), Just(15u32), Just(30u32)],
        prop::collection::vec((0u32..1380, 5u32..480, prop::bool::weighted(0.85)), 0..4),
        prop::collection::vec((0u32..1400, 5u32..180, 0usize..6), 0..5),
        5u32..180,
        5u32..120,
        -1440i64..2880,
    )
        .prop_map(|(granularity, windows, appointments, first_duration, extra_duration, now_offset)| Case {
            granularity,
            windows: windows
                .into_iter()
                .map(|(start, len, enabled)| (start, (start + len).min(1440), enabled))
                .collect(),
            appointments,
            first_duration,
            extra_duration,
            now_offset,
        })
}

struct World {
    engine: AvailabilityEngine,
    snapshot: ScheduleSnapshot,
    company: Uuid,
    professional: Uuid,
    first_service: Uuid,
    extra_service: Uuid,
    now: DateTime<Utc>,
}

fn build(case: &Case) -> World {
    let company = Uuid::new_v4();
    let professional = Uuid::new_v4();

    let windows = case
        .windows
        .iter()
        .map(|(start, end, enabled)| {
            let window = WorkingWindow::new(
                company,
                Some(professional),
                Weekday::Mon,
                TimeOfDay::from_minutes(*start).unwrap(),
                TimeOfDay::from_minutes(*end).unwrap(),
            )
            .unwrap();
            if *enabled { window } else { window.disabled() }
        })
        .collect();

    let appointments = case
        .appointments
        .iter()
        .map(|(start, len, status)| Appointment {
            id: Uuid::new_v4(),
            company_id: company,
            professional_id: professional,
            start_at: at_minute(*start),
            end_at: at_minute(*start + *len),
            status: AppointmentStatus::ALL[*status],
        })
        .collect();

    let first_service = Uuid::new_v4();
    let extra_service = Uuid::new_v4();
    let services = vec![
        Service {
            id: first_service,
            company_id: company,
            name: "first".to_string(),
            duration_minutes: case.first_duration as i32,
            active: true,
        },
        Service {
            id: extra_service,
            company_id: company,
            name: "extra".to_string(),
            duration_minutes: case.extra_duration as i32,
            active: true,
        },
    ];

    World {
        engine: AvailabilityEngine::new(case.granularity, chrono_tz::UTC),
        snapshot: ScheduleSnapshot { windows, services, appointments },
        company,
        professional,
        first_service,
        extra_service,
        now: midnight() + Duration::minutes(case.now_offset),
    }
}

impl World {
    fn request(&self, services: Vec<Uuid>) -> SlotRequest {
        SlotRequest::new(self.company, self.professional, day(), services)
    }

    fn slots(&self, request: &SlotRequest) -> Vec<TimeOfDay> {
        self.engine.list_slots(request, &self.snapshot, self.now).unwrap().slots
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_slots_fit_an_enabled_window(case in case_strategy()) {
        let world = build(&case);
        let duration = case.first_duration;

        for slot in world.slots(&world.request(vec![world.first_service])) {
            let fits = world.snapshot.windows.iter().any(|w| {
                w.enabled && w.start <= slot && slot.minutes() + duration <= w.end.minutes()
            });
            prop_assert!(fits, "{} + {} fits no window", slot, duration);
        }
    }

    #[test]
    fn prop_slots_never_overlap_occupied_time(case in case_strategy()) {
        let world = build(&case);
        let duration = i64::from(case.first_duration);

        for slot in world.slots(&world.request(vec![world.first_service])) {
            let start = at_minute(slot.minutes());
            let end = start + Duration::minutes(duration);
            for apt in world.snapshot.appointments.iter().filter(|a| a.occupies_time()) {
                prop_assert!(!intervals_overlap(start, end, apt.start_at, apt.end_at));
            }
        }
    }

    #[test]
    fn prop_slots_are_in_the_future(case in case_strategy()) {
        let world = build(&case);

        for slot in world.slots(&world.request(vec![world.first_service])) {
            prop_assert!(at_minute(slot.minutes()) > world.now);
        }
    }

    #[test]
    fn prop_sorted_and_unique(case in case_strategy()) {
        let world = build(&case);
        let slots = world.slots(&world.request(vec![world.first_service]));
        prop_assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn prop_longer_booking_never_gains_slots(case in case_strategy()) {
        let world = build(&case);
        let short = world.slots(&world.request(vec![world.first_service]));
        let long = world.slots(&world.request(vec![world.first_service, world.extra_service]));

        for slot in long {
            prop_assert!(short.contains(&slot), "{} only available for the longer booking", slot);
        }
    }

    #[test]
    fn prop_validate_agrees_with_listing(case in case_strategy()) {
        let world = build(&case);
        let request = world.request(vec![world.first_service]);
        let slots = world.slots(&request);

        for minute in 0..1440 {
            let time = TimeOfDay::from_minutes(minute).unwrap();
            let accepted = world.engine.validate(&request, time, &world.snapshot, world.now).is_ok();
            prop_assert_eq!(accepted, slots.contains(&time), "disagreement at {}", time);
        }
    }
}
