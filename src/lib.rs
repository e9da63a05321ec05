#![forbid(unsafe_code)]
//! QuattroDue — bibliothèque de roulement d'équipes (9 équipes, 3
//! postes, cycle fixe de 18 jours : 4 travaillés, 2 de repos).
//!
//! - Table de cycle constante + date de référence configurable.
//! - Matérialisation de mois par clonage du cycle modèle.
//! - Cache mensuel en mémoire (TTL, budget d'entrées, préchargement).
//! - Dates civiles sans fuseau (`NaiveDate`) ; calculs de jours exacts.

pub mod cache;
pub mod model;
pub mod pattern;
pub mod schedule;

pub use cache::CalendarCache;
pub use model::{
    days_in_month, default_shift_kinds, first_of_month, Day, Month, ShiftAssignment, ShiftKind,
    Stop, Team, TEAM_COUNT,
};
pub use pattern::{PatternEngine, ScheduleError, CYCLE_LENGTH, SHIFTS_PER_DAY, TEAMS_PER_SHIFT};
pub use schedule::WorkSchedule;
