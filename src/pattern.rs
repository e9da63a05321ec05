use crate::model::{default_shift_kinds, first_of_month, Day, ShiftKind, Team, TEAM_COUNT};
use chrono::{Duration, NaiveDate};
use std::sync::RwLock;
use thiserror::Error;

/// Longueur du cycle QuattroDue : 4 jours de travail + 2 de repos,
/// trois blocs par équipe, soit 18 jours.
pub const CYCLE_LENGTH: usize = 18;

/// Trois postes par jour (matin, après-midi, nuit).
pub const SHIFTS_PER_DAY: usize = 3;

/// Deux équipes par poste : 6 au travail par jour, 3 au repos.
pub const TEAMS_PER_SHIFT: usize = 2;

/// Date de référence par défaut : ancrée à l'index de cycle 0.
pub const DEFAULT_REFERENCE_DATE: (i32, u32, u32) = (2018, 11, 7);

/// Table de roulement : 18 lignes × 3 postes, chaque case liste les
/// codes des équipes au travail. Les équipes décalent de 2 jours entre
/// elles ; chaque ligne partitionne les 9 équipes (2 par poste, 3 au
/// repos par complément), ce que la construction vérifie.
const CYCLE_TABLE: [[&str; SHIFTS_PER_DAY]; CYCLE_LENGTH] = [
    ["AB", "DE", "GH"],
    ["AB", "DE", "GH"],
    ["AI", "CD", "FG"],
    ["AI", "CD", "FG"],
    ["HI", "BC", "EF"],
    ["HI", "BC", "EF"],
    ["GH", "AB", "DE"],
    ["GH", "AB", "DE"],
    ["FG", "AI", "CD"],
    ["FG", "AI", "CD"],
    ["EF", "HI", "BC"],
    ["EF", "HI", "BC"],
    ["DE", "GH", "AB"],
    ["DE", "GH", "AB"],
    ["CD", "FG", "AI"],
    ["CD", "FG", "AI"],
    ["BC", "EF", "HI"],
    ["BC", "EF", "HI"],
];

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid cycle table: {0}")]
    InvalidCycleTable(String),
    #[error("invalid shift index: {0} (expected 0..{SHIFTS_PER_DAY})")]
    InvalidShiftIndex(usize),
    #[error("invalid cycle index: {0} (expected 0..{CYCLE_LENGTH})")]
    InvalidCycleIndex(usize),
    #[error("unknown team code: {0}")]
    UnknownTeam(char),
    #[error("invalid stop: {0}")]
    InvalidStop(&'static str),
    #[error("invalid month: {0}")]
    InvalidMonth(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Moteur de roulement : table de cycle figée + date de référence.
///
/// La date de référence est la seule configuration mutable ; elle est
/// derrière un `RwLock` pour que tout changement soit visible des
/// lectures suivantes, quel que soit le thread appelant.
#[derive(Debug)]
pub struct PatternEngine {
    rows: Vec<[Vec<Team>; SHIFTS_PER_DAY]>,
    shift_kinds: [ShiftKind; SHIFTS_PER_DAY],
    reference: RwLock<NaiveDate>,
}

impl PatternEngine {
    /// Moteur sur le catalogue de postes par défaut.
    pub fn new() -> Result<Self, ScheduleError> {
        Self::with_shift_kinds(default_shift_kinds())
    }

    /// Moteur sur un catalogue fourni ; valide la table de cycle et
    /// échoue immédiatement si elle est malformée (pas de moteur
    /// partiel).
    pub fn with_shift_kinds(shift_kinds: [ShiftKind; SHIFTS_PER_DAY]) -> Result<Self, ScheduleError> {
        let rows = parse_cycle_table(&CYCLE_TABLE)?;
        let (y, m, d) = DEFAULT_REFERENCE_DATE;
        let reference = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| ScheduleError::InvalidCycleTable("bad reference date".into()))?;
        Ok(Self {
            rows,
            shift_kinds,
            reference: RwLock::new(reference),
        })
    }

    /// Date de référence courante (index de cycle 0).
    pub fn reference_start_date(&self) -> NaiveDate {
        *self.reference.read().expect("reference lock poisoned")
    }

    /// Change la date de référence. Tout le planning passé et futur
    /// s'en trouve décalé ; les caches en aval doivent être vidés.
    pub fn set_reference_start_date(&self, date: NaiveDate) {
        *self.reference.write().expect("reference lock poisoned") = date;
    }

    pub fn shift_kinds(&self) -> &[ShiftKind; SHIFTS_PER_DAY] {
        &self.shift_kinds
    }

    /// Gabarit de poste par index ; hors bornes = violation de contrat,
    /// jamais tronqué en silence.
    pub fn shift_kind(&self, index: usize) -> Result<&ShiftKind, ScheduleError> {
        self.shift_kinds
            .get(index)
            .ok_or(ScheduleError::InvalidShiftIndex(index))
    }

    /// Écart exact en jours civils depuis la référence (négatif avant).
    pub fn days_from_reference(&self, date: NaiveDate) -> i64 {
        date.signed_duration_since(self.reference_start_date())
            .num_days()
    }

    /// Ligne de la table gouvernant `date`, dans [0, 18).
    ///
    /// Modulo plancher (`rem_euclid`) : les dates antérieures à la
    /// référence retombent sur la queue du cycle.
    pub fn cycle_index_for_date(&self, date: NaiveDate) -> usize {
        self.days_from_reference(date).rem_euclid(CYCLE_LENGTH as i64) as usize
    }

    /// Ligne de la table par index ; hors bornes = erreur explicite.
    pub fn cycle_row(&self, index: usize) -> Result<&[Vec<Team>; SHIFTS_PER_DAY], ScheduleError> {
        self.rows
            .get(index)
            .ok_or(ScheduleError::InvalidCycleIndex(index))
    }

    /// Cycle modèle : 18 journées datées `référence + ligne`, postes
    /// résolus à travers le registre d'équipes.
    pub fn generate_template_cycle(&self) -> Vec<Day> {
        let reference = self.reference_start_date();
        self.rows
            .iter()
            .enumerate()
            .map(|(row, shifts)| {
                let mut day = Day::new(reference + Duration::days(row as i64));
                for (kind_index, teams) in shifts.iter().enumerate() {
                    day.add_shift(kind_index, teams.clone());
                }
                day
            })
            .collect()
    }

    /// Matérialise le mois contenant `month` : un `Day` par jour,
    /// contigus depuis le 1er, clonés du cycle modèle puis
    /// ré-étiquetés (jamais aliasés).
    pub fn materialize_month(&self, month: NaiveDate) -> Result<Vec<Day>, ScheduleError> {
        let template = self.generate_template_cycle();
        self.materialize_month_from(month, &template)
    }

    /// Variante sur un cycle modèle déjà généré.
    pub fn materialize_month_from(
        &self,
        month: NaiveDate,
        template: &[Day],
    ) -> Result<Vec<Day>, ScheduleError> {
        if template.len() != CYCLE_LENGTH {
            return Err(ScheduleError::InvalidCycleTable(format!(
                "template cycle has {} days, expected {CYCLE_LENGTH}",
                template.len()
            )));
        }
        let first = first_of_month(month);
        let len = crate::model::days_in_month(first);
        let mut days = Vec::with_capacity(len as usize);
        for offset in 0..len {
            let date = first + Duration::days(i64::from(offset));
            let index = self.cycle_index_for_date(date);
            days.push(template[index].relabel(date));
        }
        Ok(days)
    }

    /// Équipes au travail à `date` (union des trois postes).
    pub fn teams_working_on(&self, date: NaiveDate) -> Vec<Team> {
        let index = self.cycle_index_for_date(date);
        let mut out = Vec::new();
        for teams in &self.rows[index] {
            for t in teams {
                if !out.contains(t) {
                    out.push(*t);
                }
            }
        }
        out
    }

    /// Équipes au repos à `date` : registre moins `teams_working_on`.
    pub fn teams_off_work_on(&self, date: NaiveDate) -> Vec<Team> {
        let working = self.teams_working_on(date);
        Team::ALL
            .iter()
            .copied()
            .filter(|t| !working.contains(t))
            .collect()
    }

    /// Index du poste où travaille `team` à `date`.
    pub fn team_shift_index_on(&self, date: NaiveDate, team: Team) -> Option<usize> {
        let index = self.cycle_index_for_date(date);
        self.rows[index].iter().position(|teams| teams.contains(&team))
    }

    /// Premier jour de travail de `team` strictement après `from`,
    /// en inspectant au plus `max_days` dates.
    pub fn find_next_working_date(
        &self,
        team: Team,
        from: NaiveDate,
        max_days: u32,
    ) -> Option<NaiveDate> {
        self.scan_working_date(team, from, max_days, 1)
    }

    /// Miroir arrière : dernier jour de travail strictement avant `from`.
    pub fn find_previous_working_date(
        &self,
        team: Team,
        from: NaiveDate,
        max_days: u32,
    ) -> Option<NaiveDate> {
        self.scan_working_date(team, from, max_days, -1)
    }

    fn scan_working_date(
        &self,
        team: Team,
        from: NaiveDate,
        max_days: u32,
        step: i64,
    ) -> Option<NaiveDate> {
        let mut date = from;
        for _ in 0..max_days {
            date += Duration::days(step);
            if self.team_shift_index_on(date, team).is_some() {
                return Some(date);
            }
        }
        None
    }
}

/// Résout une table en équipes et vérifie ses invariants : codes
/// connus, aucune équipe deux fois par ligne, et chaque ligne couvre
/// les 9 équipes (6 au travail + 3 au repos dérivées par complément).
fn parse_cycle_table(
    table: &[[&str; SHIFTS_PER_DAY]],
) -> Result<Vec<[Vec<Team>; SHIFTS_PER_DAY]>, ScheduleError> {
    let mut rows = Vec::with_capacity(CYCLE_LENGTH);
    for (row_index, row) in table.iter().enumerate() {
        let mut parsed: [Vec<Team>; SHIFTS_PER_DAY] = Default::default();
        let mut seen = Vec::with_capacity(TEAM_COUNT);
        for (shift_index, codes) in row.iter().enumerate() {
            let mut teams = Vec::with_capacity(TEAMS_PER_SHIFT);
            for code in codes.chars() {
                let team = Team::new(code).map_err(|_| {
                    ScheduleError::InvalidCycleTable(format!(
                        "row {row_index}, shift {shift_index}: unknown team {code}"
                    ))
                })?;
                if seen.contains(&team) {
                    return Err(ScheduleError::InvalidCycleTable(format!(
                        "row {row_index}: team {team} assigned twice"
                    )));
                }
                seen.push(team);
                teams.push(team);
            }
            if teams.len() != TEAMS_PER_SHIFT {
                return Err(ScheduleError::InvalidCycleTable(format!(
                    "row {row_index}, shift {shift_index}: {} team(s), expected {TEAMS_PER_SHIFT}",
                    teams.len()
                )));
            }
            parsed[shift_index] = teams;
        }
        rows.push(parsed);
    }
    Ok(rows)
}
