use crate::cache::CalendarCache;
use crate::model::{first_of_month, Day, Team};
use crate::pattern::{PatternEngine, ScheduleError};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::info;

/// Façade de consultation du planning : compose le cache et le moteur.
///
/// C'est la seule surface vue par les couches appelantes ; rien en
/// dessous ne remonte de référence vers elle.
pub struct WorkSchedule {
    engine: Arc<PatternEngine>,
    cache: CalendarCache,
}

impl WorkSchedule {
    /// Construit moteur + cache ; échoue si la table de cycle est
    /// malformée (pas de façade partielle).
    pub fn new() -> Result<Self, ScheduleError> {
        let engine = Arc::new(PatternEngine::new()?);
        let cache = CalendarCache::new(Arc::clone(&engine));
        Ok(Self { engine, cache })
    }

    /// Construit la façade sur un moteur déjà configuré.
    pub fn with_engine(engine: Arc<PatternEngine>) -> Self {
        let cache = CalendarCache::new(Arc::clone(&engine));
        Self { engine, cache }
    }

    pub fn engine(&self) -> &Arc<PatternEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &CalendarCache {
        &self.cache
    }

    /// Journée planifiée pour `date` (découpe du mois en cache).
    pub fn schedule_for_date(&self, date: NaiveDate) -> Option<Day> {
        let days = self.cache.get_month_days(date);
        days.into_iter().find(|d| d.date == date)
    }

    /// Mois complet contenant `month`.
    pub fn schedule_for_month(&self, month: NaiveDate) -> Vec<Day> {
        self.cache.get_month_days(month)
    }

    /// Plage inclusive `[start, end]`, recousue à partir des mois en
    /// cache. Un mois qui a échoué à se matérialiser manque simplement
    /// à l'appel, la plage n'échoue pas.
    pub fn schedule_for_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Day> {
        if end < start {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut month = first_of_month(start);
        while month <= end {
            let days = self.cache.get_month_days(month);
            out.extend(
                days.into_iter()
                    .filter(|d| d.date >= start && d.date <= end),
            );
            match month.checked_add_months(chrono::Months::new(1)) {
                Some(next) => month = next,
                None => break,
            }
        }
        out
    }

    /// Vrai si au moins une équipe travaille ce jour-là (toujours le
    /// cas sous le roulement nominal : la couverture est continue).
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.engine.teams_working_on(date).is_empty()
    }

    pub fn is_working_day_for_team(&self, date: NaiveDate, team: Team) -> bool {
        self.engine.teams_working_on(date).contains(&team)
    }

    /// Exact complément de `is_working_day_for_team`, par construction.
    pub fn is_rest_day_for_team(&self, date: NaiveDate, team: Team) -> bool {
        self.engine.teams_off_work_on(date).contains(&team)
    }

    pub fn teams_working_on(&self, date: NaiveDate) -> Vec<Team> {
        self.engine.teams_working_on(date)
    }

    pub fn teams_off_work_on(&self, date: NaiveDate) -> Vec<Team> {
        self.engine.teams_off_work_on(date)
    }

    /// Diagnostic : ligne du cycle gouvernant `date`.
    pub fn day_in_cycle(&self, date: NaiveDate) -> usize {
        self.engine.cycle_index_for_date(date)
    }

    /// Diagnostic : écart exact en jours depuis la référence.
    pub fn days_from_reference(&self, date: NaiveDate) -> i64 {
        self.engine.days_from_reference(date)
    }

    pub fn next_working_date(
        &self,
        team: Team,
        from: NaiveDate,
        max_days: u32,
    ) -> Option<NaiveDate> {
        self.engine.find_next_working_date(team, from, max_days)
    }

    pub fn previous_working_date(
        &self,
        team: Team,
        from: NaiveDate,
        max_days: u32,
    ) -> Option<NaiveDate> {
        self.engine.find_previous_working_date(team, from, max_days)
    }

    /// Change la date de référence du roulement.
    ///
    /// Seule opération non purement additive : tout mois déjà en cache
    /// devient faux sous la nouvelle référence, donc le cache est vidé
    /// avant de rendre la main.
    pub fn update_reference_start_date(&self, date: NaiveDate) {
        info!(
            year = date.year(),
            month = date.month(),
            day = date.day(),
            "reference start date updated"
        );
        self.engine.set_reference_start_date(date);
        self.cache.clear();
    }

    pub fn reference_start_date(&self) -> NaiveDate {
        self.engine.reference_start_date()
    }

    /// Rafraîchissement demandé par l'appelant : repart de zéro.
    pub fn refresh_data(&self) {
        self.cache.clear();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> String {
        self.cache.stats()
    }
}
