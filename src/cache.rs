use crate::model::{first_of_month, Day};
use crate::pattern::PatternEngine;
use chrono::{Datelike, Local, Months, NaiveDate};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Durée de vie par défaut d'une entrée, depuis sa création (pas son
/// dernier accès).
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Nombre maximal d'entrées vivantes.
const MAX_ENTRIES: usize = 24;

/// Marge d'éviction : on redescend sous `MAX_ENTRIES - MARGIN` pour ne
/// pas osciller au seuil.
const EVICTION_MARGIN: usize = 2;

#[derive(Debug, Clone)]
struct MonthEntry {
    days: Vec<Day>,
    created: Instant,
}

impl MonthEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.created) >= ttl
    }
}

/// Cache mensuel devant le moteur de roulement.
///
/// Clé `(année, mois)`, carte concurrente sans verrou global ; les
/// lectures renvoient toujours une copie défensive, jamais l'interne.
/// Pas de singleton : l'instance appartient à la racine de composition
/// (les tests en construisent d'isolées).
pub struct CalendarCache {
    engine: Arc<PatternEngine>,
    entries: DashMap<(i32, u32), MonthEntry>,
    preload_in_progress: AtomicBool,
    ttl: Duration,
}

impl CalendarCache {
    pub fn new(engine: Arc<PatternEngine>) -> Self {
        Self::with_ttl(engine, CACHE_TTL)
    }

    /// Cache à TTL injecté : même sémantique que [`CalendarCache::new`],
    /// la durée de vie en moins. Le cœur n'expose pas ce réglage en
    /// production ; il sert aux tests du chemin d'expiration.
    pub fn with_ttl(engine: Arc<PatternEngine>, ttl: Duration) -> Self {
        Self {
            engine,
            entries: DashMap::new(),
            preload_in_progress: AtomicBool::new(false),
            ttl,
        }
    }

    pub fn engine(&self) -> &Arc<PatternEngine> {
        &self.engine
    }

    /// Jours du mois contenant `month`, "aujourd'hui" = date locale.
    pub fn get_month_days(&self, month: NaiveDate) -> Vec<Day> {
        self.get_month_days_at(month, Local::now().date_naive())
    }

    /// Variante à horloge injectée : `is_today` est recalculé sur les
    /// copies par rapport à `today`, les internes n'en dépendent pas.
    ///
    /// Un échec de matérialisation est journalisé et dégrade en liste
    /// vide pour ce mois seulement ; il ne casse jamais un appelant qui
    /// itère sur une plage de mois.
    pub fn get_month_days_at(&self, month: NaiveDate, today: NaiveDate) -> Vec<Day> {
        let key = month_key(month);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(now, self.ttl) {
                debug!(year = key.0, month = key.1, "cache hit");
                return copy_out(&entry.days, today);
            }
        }

        debug!(year = key.0, month = key.1, "cache miss, materializing");
        let days = match self.engine.materialize_month(month) {
            Ok(days) => days,
            Err(err) => {
                warn!(year = key.0, month = key.1, %err, "month materialization failed");
                return Vec::new();
            }
        };

        self.entries.insert(
            key,
            MonthEntry {
                days: days.clone(),
                created: now,
            },
        );
        self.enforce_size_bound(now);

        copy_out(&days, today)
    }

    /// Purge d'abord les entrées périmées ; s'il y a encore trop
    /// d'entrées, évince les plus anciennes (date de création) jusqu'à
    /// repasser sous le budget moins la marge.
    fn enforce_size_bound(&self, now: Instant) {
        if self.entries.len() <= MAX_ENTRIES {
            return;
        }
        self.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));

        while self.entries.len() > MAX_ENTRIES - EVICTION_MARGIN {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().created)
                .map(|entry| *entry.key());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    debug!(year = key.0, month = key.1, "evicted oldest cache entry");
                }
                None => break,
            }
        }
    }

    /// Préchargement au mieux de `[center - radius, center + radius]`.
    ///
    /// Un seul préchargement en vol : les appels concurrents se
    /// réduisent à un no-op (compare-and-set), ni file ni reprise.
    pub fn preload_months_around(&self, center: NaiveDate, radius: u32) {
        if self
            .preload_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("preload already in progress, skipping");
            return;
        }

        let center = first_of_month(center);
        for offset in -(radius as i32)..=(radius as i32) {
            let Some(month) = add_months(center, offset) else {
                continue;
            };
            if self.entries.contains_key(&month_key(month)) {
                continue;
            }
            // get_month_days_at absorbe déjà les échecs par mois.
            let _ = self.get_month_days_at(month, center);
        }

        self.preload_in_progress.store(false, Ordering::Release);
    }

    /// Localise `today` dans son mois en cache : (1er du mois, index
    /// du jour dans le mois).
    pub fn find_today_position(&self) -> Option<(NaiveDate, usize)> {
        self.find_today_position_at(Local::now().date_naive())
    }

    pub fn find_today_position_at(&self, today: NaiveDate) -> Option<(NaiveDate, usize)> {
        let first = first_of_month(today);
        let days = self.get_month_days_at(first, today);
        days.iter()
            .position(|day| day.date == today)
            .map(|index| (first, index))
    }

    /// Vide tout, sans condition.
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        info!(dropped, "calendar cache cleared");
    }

    /// Notification de changement d'équipe : le contenu du cache est
    /// indépendant de l'équipe courante (le planning couvre toutes les
    /// équipes), donc aucune invalidation — le hook n'existe que pour
    /// rafraîchir l'état dérivé des appelants.
    pub fn on_team_changed(&self) {
        debug!("team changed, cache kept (contents are team-agnostic)");
    }

    /// Résumé diagnostique (observabilité seulement, format non stable).
    pub fn stats(&self) -> String {
        let now = Instant::now();
        let live = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now, self.ttl))
            .count();
        format!(
            "cache: {} entrées ({} vivantes, max {}), ttl {}s",
            self.entries.len(),
            live,
            MAX_ENTRIES,
            self.ttl.as_secs()
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn copy_out(days: &[Day], today: NaiveDate) -> Vec<Day> {
    days.iter().map(|d| d.clone().with_today(today)).collect()
}

fn add_months(first: NaiveDate, offset: i32) -> Option<NaiveDate> {
    if offset >= 0 {
        first.checked_add_months(Months::new(offset as u32))
    } else {
        first.checked_sub_months(Months::new(offset.unsigned_abs()))
    }
}
