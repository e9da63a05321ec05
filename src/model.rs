use crate::pattern::ScheduleError;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nombre d'équipes du roulement (fixe).
pub const TEAM_COUNT: usize = 9;

/// Équipe (demi-squadre) identifiée par une lettre A..I.
///
/// Deux équipes sont égales ssi leurs codes le sont ; l'ensemble est
/// figé, pas de fusion ni de scission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Team(char);

impl Team {
    /// Les neuf équipes du roulement, dans l'ordre des codes.
    pub const ALL: [Team; TEAM_COUNT] = [
        Team('A'),
        Team('B'),
        Team('C'),
        Team('D'),
        Team('E'),
        Team('F'),
        Team('G'),
        Team('H'),
        Team('I'),
    ];

    /// Construit une équipe en validant le code.
    pub fn new(code: char) -> Result<Self, ScheduleError> {
        let code = code.to_ascii_uppercase();
        if !('A'..='I').contains(&code) {
            return Err(ScheduleError::UnknownTeam(code));
        }
        Ok(Self(code))
    }

    pub fn code(&self) -> char {
        self.0
    }

    /// Nom d'affichage ("Équipe A", …).
    pub fn display_name(&self) -> String {
        format!("Équipe {}", self.0)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gabarit de poste (catalogue) : indépendant du roulement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftKind {
    pub name: String,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    /// Couleur d'affichage, hex "#rrggbb".
    pub color: String,
}

impl ShiftKind {
    pub fn new<N: Into<String>, C: Into<String>>(
        name: N,
        start: NaiveTime,
        duration_minutes: u32,
        color: C,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            duration_minutes,
            color: color.into(),
        }
    }

    pub fn end(&self) -> NaiveTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Catalogue par défaut : matin / après-midi / nuit, 8 h chacun.
pub fn default_shift_kinds() -> [ShiftKind; 3] {
    let t = |h| NaiveTime::from_hms_opt(h, 0, 0).expect("heure valide");
    [
        ShiftKind::new("matin", t(5), 8 * 60, "#aadd66"),
        ShiftKind::new("après-midi", t(13), 8 * 60, "#66aadd"),
        ShiftKind::new("nuit", t(21), 8 * 60, "#dd66aa"),
    ]
}

/// Affectation d'un poste : index du gabarit dans le catalogue,
/// équipes au travail, et indicateur d'arrêt d'usine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub kind_index: usize,
    pub teams: Vec<Team>,
    #[serde(default)]
    pub full_stop: bool,
}

impl ShiftAssignment {
    pub fn new(kind_index: usize, teams: Vec<Team>) -> Self {
        Self {
            kind_index,
            teams,
            full_stop: false,
        }
    }

    pub fn has_team(&self, team: Team) -> bool {
        self.teams.contains(&team)
    }
}

/// Journée calendaire : date, postes affectés, équipes au repos.
///
/// Invariant : une équipe figure dans au plus un poste par jour, et
/// `off_work` vaut exactement le registre moins l'union des postes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub date: NaiveDate,
    /// Dérivé à la lecture ; jamais une vérité stockée.
    #[serde(default)]
    pub is_today: bool,
    pub shifts: Vec<ShiftAssignment>,
    pub off_work: Vec<Team>,
}

impl Day {
    /// Journée vide : toutes les équipes au repos.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            is_today: false,
            shifts: Vec::new(),
            off_work: Team::ALL.to_vec(),
        }
    }

    /// Ajoute un poste ; les équipes affectées quittent le repos.
    pub fn add_shift(&mut self, kind_index: usize, teams: Vec<Team>) {
        self.off_work.retain(|t| !teams.contains(t));
        self.shifts.push(ShiftAssignment::new(kind_index, teams));
    }

    /// Copie profonde ré-étiquetée sur une autre date.
    ///
    /// Les jours du cycle modèle sont partagés : toute matérialisation
    /// passe par ici, jamais par un alias.
    pub fn relabel(&self, date: NaiveDate) -> Self {
        let mut day = self.clone();
        day.date = date;
        day.is_today = false;
        day
    }

    /// Recalcule `is_today` par rapport à un "aujourd'hui" fourni.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.is_today = self.date == today;
        self
    }

    /// Union des équipes au travail, dans l'ordre des postes.
    pub fn working_teams(&self) -> Vec<Team> {
        let mut out = Vec::new();
        for s in &self.shifts {
            for t in &s.teams {
                if !out.contains(t) {
                    out.push(*t);
                }
            }
        }
        out
    }

    /// Index du poste où travaille `team`, s'il existe.
    pub fn find_team_shift_index(&self, team: Team) -> Option<usize> {
        self.shifts.iter().position(|s| s.has_team(team))
    }
}

/// Arrêt programmé : plage semi-ouverte de jours (1-based dans le
/// mois) × plage semi-ouverte d'index de postes, forcés en `full_stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub start_day: u32,
    pub end_day: u32,
    pub start_shift: usize,
    pub end_shift: usize,
}

impl Stop {
    pub fn new(
        start_day: u32,
        end_day: u32,
        start_shift: usize,
        end_shift: usize,
    ) -> Result<Self, ScheduleError> {
        if start_day == 0 || end_day <= start_day {
            return Err(ScheduleError::InvalidStop(
                "day range must be non-empty and 1-based",
            ));
        }
        if end_shift <= start_shift || end_shift > crate::pattern::SHIFTS_PER_DAY {
            return Err(ScheduleError::InvalidStop("shift range out of bounds"));
        }
        Ok(Self {
            start_day,
            end_day,
            start_shift,
            end_shift,
        })
    }
}

/// Mois calendaire : premier jour normalisé au 1er, exactement un
/// `Day` par jour du mois, arrêts appliqués une seule fois.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Month {
    pub first: NaiveDate,
    pub days: Vec<Day>,
    pub stops: Vec<Stop>,
}

impl Month {
    /// Construit le mois et applique les arrêts, une fois pour toutes.
    ///
    /// Valide l'invariant du modèle : exactement un `Day` par jour du
    /// mois, datés contigus depuis le 1er.
    pub fn new(
        first: NaiveDate,
        days: Vec<Day>,
        stops: Vec<Stop>,
    ) -> Result<Self, ScheduleError> {
        let first = first_of_month(first);
        let expected = days_in_month(first) as usize;
        if days.len() != expected {
            return Err(ScheduleError::InvalidMonth(format!(
                "{} day(s) for {first}, expected {expected}",
                days.len()
            )));
        }
        for (offset, day) in days.iter().enumerate() {
            let date = first + Duration::days(offset as i64);
            if day.date != date {
                return Err(ScheduleError::InvalidMonth(format!(
                    "day {} dated {}, expected {date}",
                    offset + 1,
                    day.date
                )));
            }
        }
        let mut month = Self { first, days, stops };
        month.apply_stops();
        Ok(month)
    }

    fn apply_stops(&mut self) {
        for stop in &self.stops {
            for day_no in stop.start_day..stop.end_day {
                let Some(day) = self.days.get_mut(day_no as usize - 1) else {
                    continue;
                };
                for idx in stop.start_shift..stop.end_shift {
                    if let Some(shift) = day.shifts.get_mut(idx) {
                        shift.full_stop = true;
                    }
                }
            }
        }
    }
}

/// Premier jour du mois contenant `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("le 1er existe pour tout mois")
}

/// Longueur exacte du mois contenant `date` (bissextiles comprises).
pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if date.leap_year() {
                29
            } else {
                28
            }
        }
    }
}
