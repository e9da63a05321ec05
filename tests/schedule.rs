#![forbid(unsafe_code)]
use chrono::{Datelike, Duration, NaiveDate};
use quattrodue::{Month, PatternEngine, Stop, Team, WorkSchedule, CYCLE_LENGTH};
use std::sync::Arc;

#[test]
fn range_query_stitches_adjacent_months() {
    let schedule = WorkSchedule::new().unwrap();
    let days = schedule.schedule_for_range(d(2024, 1, 25), d(2024, 2, 5));
    assert_eq!(days.len(), 12);
    for (i, day) in days.iter().enumerate() {
        assert_eq!(day.date, d(2024, 1, 25) + Duration::days(i as i64));
    }
}

#[test]
fn empty_range_when_end_precedes_start() {
    let schedule = WorkSchedule::new().unwrap();
    assert!(schedule
        .schedule_for_range(d(2024, 2, 5), d(2024, 1, 25))
        .is_empty());
}

#[test]
fn single_date_query_slices_its_month() {
    let schedule = WorkSchedule::new().unwrap();
    let day = schedule.schedule_for_date(d(2018, 11, 7)).unwrap();
    assert_eq!(day.date, d(2018, 11, 7));
    assert_eq!(day.shifts[0].teams, [team('A'), team('B')]);
}

#[test]
fn rest_and_working_predicates_never_disagree() {
    let schedule = WorkSchedule::new().unwrap();
    for offset in 0..(CYCLE_LENGTH as i64 * 2) {
        let date = d(2023, 3, 1) + Duration::days(offset);
        for t in Team::ALL {
            let working = schedule.is_working_day_for_team(date, t);
            let resting = schedule.is_rest_day_for_team(date, t);
            assert_ne!(working, resting, "désaccord pour {t} le {date}");
            assert_eq!(resting, schedule.teams_off_work_on(date).contains(&t));
        }
    }
}

#[test]
fn coverage_is_continuous() {
    let schedule = WorkSchedule::new().unwrap();
    for offset in 0..CYCLE_LENGTH as i64 {
        let date = d(2024, 1, 1) + Duration::days(offset);
        assert!(schedule.is_working_day(date));
        assert_eq!(schedule.teams_working_on(date).len(), 6);
    }
}

#[test]
fn cycle_diagnostics_expose_the_engine_arithmetic() {
    let schedule = WorkSchedule::new().unwrap();
    let reference = schedule.reference_start_date();
    assert_eq!(schedule.day_in_cycle(reference), 0);
    assert_eq!(schedule.days_from_reference(reference + Duration::days(40)), 40);
    assert_eq!(schedule.day_in_cycle(reference + Duration::days(40)), 40 % CYCLE_LENGTH);
}

#[test]
fn updating_the_reference_clears_the_cache_and_shifts_results() {
    let schedule = WorkSchedule::new().unwrap();
    let probe = d(2024, 4, 10);
    let before = schedule.teams_working_on(probe);
    schedule.schedule_for_month(probe);
    assert_eq!(schedule.cache().len(), 1);

    let reference = schedule.reference_start_date();
    schedule.update_reference_start_date(reference + Duration::days(1));

    assert!(schedule.cache().is_empty(), "le cache doit être vidé");
    assert_ne!(schedule.teams_working_on(probe), before);

    // Les jours re-matérialisés suivent la nouvelle référence.
    let day = schedule.schedule_for_date(probe).unwrap();
    assert_eq!(day.working_teams(), schedule.teams_working_on(probe));
}

#[test]
fn full_cycle_reference_shift_is_invisible_through_the_facade() {
    let schedule = WorkSchedule::new().unwrap();
    let probe = d(2024, 4, 10);
    let before = schedule.teams_working_on(probe);

    let reference = schedule.reference_start_date();
    schedule.update_reference_start_date(reference + Duration::days(CYCLE_LENGTH as i64));

    assert_eq!(schedule.teams_working_on(probe), before);
}

#[test]
fn next_working_date_is_bounded_through_the_facade() {
    let schedule = WorkSchedule::new().unwrap();
    // 2018-11-10 : dernier jour du premier bloc de A.
    assert_eq!(schedule.next_working_date(team('A'), d(2018, 11, 10), 2), None);
    assert_eq!(
        schedule.next_working_date(team('A'), d(2018, 11, 10), 10),
        Some(d(2018, 11, 13))
    );
    assert_eq!(
        schedule.previous_working_date(team('A'), d(2018, 11, 13), 10),
        Some(d(2018, 11, 10))
    );
}

#[test]
fn stops_force_full_stop_on_the_targeted_shifts() {
    let engine = PatternEngine::new().unwrap();
    let days = engine.materialize_month(d(2024, 8, 1)).unwrap();
    // Jours 10..12 du mois, postes 0..2 à l'arrêt.
    let stop = Stop::new(10, 13, 0, 2).unwrap();
    let month = Month::new(d(2024, 8, 1), days, vec![stop]).unwrap();

    for day in &month.days {
        let in_stop = (10..13).contains(&day.date.day());
        for (idx, shift) in day.shifts.iter().enumerate() {
            let expected = in_stop && idx < 2;
            assert_eq!(shift.full_stop, expected, "{} poste {idx}", day.date);
        }
    }
    // Les équipes restent listées : l'arrêt ne réécrit pas le roulement.
    assert_eq!(month.days[9].shifts[0].teams.len(), 2);
}

#[test]
fn month_construction_rejects_missing_or_misdated_days() {
    let engine = PatternEngine::new().unwrap();
    let days = engine.materialize_month(d(2024, 8, 1)).unwrap();

    // Un jour de moins que le mois n'en compte.
    let mut truncated = days.clone();
    truncated.pop();
    assert!(Month::new(d(2024, 8, 1), truncated, Vec::new()).is_err());

    // Bon nombre de jours, mais non contigus depuis le 1er.
    let mut misdated = days.clone();
    misdated.swap(0, 1);
    assert!(Month::new(d(2024, 8, 1), misdated, Vec::new()).is_err());

    // Les jours d'un autre mois ne passent pas non plus.
    assert!(Month::new(d(2024, 9, 1), days.clone(), Vec::new()).is_err());

    assert!(Month::new(d(2024, 8, 15), days, Vec::new()).is_ok(), "la date est normalisée au 1er");
}

#[test]
fn invalid_stops_are_rejected() {
    assert!(Stop::new(0, 5, 0, 1).is_err(), "jours 1-based");
    assert!(Stop::new(5, 5, 0, 1).is_err(), "plage de jours vide");
    assert!(Stop::new(1, 5, 2, 2).is_err(), "plage de postes vide");
    assert!(Stop::new(1, 5, 0, 4).is_err(), "poste hors catalogue");
}

#[test]
fn facade_over_a_shared_engine_sees_its_configuration() {
    let engine = Arc::new(PatternEngine::new().unwrap());
    engine.set_reference_start_date(d(2020, 1, 1));
    let schedule = WorkSchedule::with_engine(engine);
    assert_eq!(schedule.reference_start_date(), d(2020, 1, 1));
    assert_eq!(schedule.day_in_cycle(d(2020, 1, 1)), 0);
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn team(code: char) -> Team {
    Team::new(code).unwrap()
}
