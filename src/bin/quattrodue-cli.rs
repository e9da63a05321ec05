#![forbid(unsafe_code)]
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use quattrodue::{first_of_month, Team, WorkSchedule};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de consultation du roulement QuattroDue (diagnostic, sans état)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Date de référence du cycle, AAAA-MM-JJ (défaut : 2018-11-07)
    #[arg(long, global = true)]
    reference: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Afficher la grille d'un mois
    Month {
        /// AAAA-MM
        #[arg(long)]
        month: String,
        /// Export JSON des journées (optionnel)
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Qui travaille quel poste à une date donnée
    Day {
        /// AAAA-MM-JJ
        #[arg(long)]
        date: String,
    },

    /// Statut d'une équipe à une date : poste, repos, prochain jour
    /// travaillé
    Team {
        /// Code A..I
        #[arg(long)]
        team: char,
        /// AAAA-MM-JJ
        #[arg(long)]
        date: String,
        /// Horizon du balayage avant/arrière, en jours
        #[arg(long, default_value_t = 30)]
        horizon: u32,
    },

    /// Résumé du cache (diagnostic)
    Stats {
        /// Précharge ± N mois autour d'aujourd'hui avant le résumé
        #[arg(long)]
        preload: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let schedule = WorkSchedule::new()?;
    if let Some(raw) = &cli.reference {
        schedule.update_reference_start_date(parse_date(raw)?);
    }

    match cli.cmd {
        Commands::Month { month, out_json } => {
            let first = parse_month(&month)?;
            let days = schedule.schedule_for_month(first);
            if let Some(path) = out_json {
                std::fs::write(path, serde_json::to_string_pretty(&days)?)?;
            }
            let kinds = schedule.engine().shift_kinds();
            println!(
                "{:>4}-{:02} | {} | repos",
                first.year(),
                first.month(),
                kinds.iter().map(|k| k.name.as_str()).collect::<Vec<_>>().join(" | ")
            );
            for day in &days {
                let cols: Vec<String> = day
                    .shifts
                    .iter()
                    .map(|s| {
                        let teams: String = s.teams.iter().map(|t| t.code()).collect();
                        if s.full_stop {
                            format!("{teams}(arrêt)")
                        } else {
                            teams
                        }
                    })
                    .collect();
                let off: String = day.off_work.iter().map(|t| t.code()).collect();
                println!("{} | {} | {}", day.date, cols.join(" | "), off);
            }
            Ok(())
        }
        Commands::Day { date } => {
            let date = parse_date(&date)?;
            let day = schedule
                .schedule_for_date(date)
                .ok_or_else(|| anyhow!("no schedule for {date}"))?;
            println!("{} (cycle {})", day.date, schedule.day_in_cycle(date));
            for shift in &day.shifts {
                let kind = schedule.engine().shift_kind(shift.kind_index)?;
                let teams: Vec<String> = shift.teams.iter().map(|t| t.to_string()).collect();
                println!(
                    "  {} ({} → {}) : {}{}",
                    kind.name,
                    kind.start,
                    kind.end(),
                    teams.join(", "),
                    if shift.full_stop { " [arrêt]" } else { "" }
                );
            }
            let off: Vec<String> = day.off_work.iter().map(|t| t.to_string()).collect();
            println!("  repos : {}", off.join(", "));
            Ok(())
        }
        Commands::Team { team, date, horizon } => {
            let team = Team::new(team)?;
            let date = parse_date(&date)?;
            if schedule.is_working_day_for_team(date, team) {
                let day = schedule
                    .schedule_for_date(date)
                    .ok_or_else(|| anyhow!("no schedule for {date}"))?;
                let index = day
                    .find_team_shift_index(team)
                    .ok_or_else(|| anyhow!("inconsistent schedule for {team}"))?;
                let kind = schedule.engine().shift_kind(index)?;
                println!("{team} travaille le {date} : poste {}", kind.name);
            } else {
                println!("{team} est au repos le {date}");
            }
            match schedule.next_working_date(team, date, horizon) {
                Some(next) => println!("prochain jour travaillé : {next}"),
                None => println!("aucun jour travaillé sous {horizon} jours"),
            }
            match schedule.previous_working_date(team, date, horizon) {
                Some(prev) => println!("précédent jour travaillé : {prev}"),
                None => println!("aucun jour travaillé dans les {horizon} jours passés"),
            }
            Ok(())
        }
        Commands::Stats { preload } => {
            if let Some(radius) = preload {
                let today = chrono::Local::now().date_naive();
                schedule.cache().preload_months_around(first_of_month(today), radius);
            }
            println!("{}", schedule.cache_stats());
            Ok(())
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date (expected AAAA-MM-JJ): {raw}"))
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (expected AAAA-MM): {raw}"))
}
