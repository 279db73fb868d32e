use crate::error::{Error, Result};
use crate::events::MatchUpdate;
use crate::header::Header;
use crate::reader::RoundReader;
use crate::stats::{headshot_percentage, PlayerMatchStats, PlayerRoundStats};
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A match: a directory of `.rec` files, one per round, in lexical order.
pub struct MatchReader {
    pub root: PathBuf,
    rounds: Vec<RoundReader>,
    read: bool,
}

/// JSON export shape for one round.
#[derive(Serialize)]
pub struct RoundData<'a> {
    pub header: &'a Header,
    #[serde(rename = "matchFeedback")]
    pub match_feedback: &'a [MatchUpdate],
    pub stats: Vec<PlayerRoundStats>,
}

/// JSON export shape for a whole match.
#[derive(Serialize)]
pub struct MatchData<'a> {
    pub rounds: Vec<RoundData<'a>>,
    pub stats: Vec<PlayerMatchStats>,
}

impl MatchReader {
    /// Opens every round in the directory and reads each roster (partial
    /// reads only; call [`MatchReader::read_all`] for the full feeds).
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_owned();
        let mut rounds = Vec::new();
        for path in list_replay_files(&root)? {
            let mut r = RoundReader::from_file(&path)?;
            r.read_partial()?;
            rounds.push(r);
        }
        Ok(MatchReader {
            root,
            rounds,
            read: false,
        })
    }

    /// Fully decodes every round.
    pub fn read_all(&mut self) -> Result<()> {
        let total = self.num_rounds();
        for (i, r) in self.rounds.iter_mut().enumerate() {
            info!("reading round {}/{}...", i + 1, total);
            r.read()?;
        }
        self.read = true;
        Ok(())
    }

    pub fn num_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn rounds(&self) -> &[RoundReader] {
        &self.rounds
    }

    pub fn round_at(&self, i: usize) -> Option<&RoundReader> {
        self.rounds.get(i)
    }

    pub fn first_round(&self) -> Option<&RoundReader> {
        self.rounds.first()
    }

    pub fn last_round(&self) -> Option<&RoundReader> {
        self.rounds.last()
    }

    /// Which team won the given round, judged by the score deltas between
    /// consecutive round headers. Needs the full reads to have happened.
    pub fn winning_team_index(&self, round: usize) -> Option<usize> {
        if !self.read {
            return None;
        }
        let teams = &self.round_at(round)?.header.teams;
        if round == 0 {
            return Some(usize::from(teams[0].score <= teams[1].score));
        }
        let previous = &self.round_at(round - 1)?.header.teams;
        Some(usize::from(teams[0].score <= previous[0].score))
    }

    /// Per-player statistics aggregated across every round.
    pub fn player_stats(&self) -> Vec<PlayerMatchStats> {
        let mut stats: Vec<PlayerMatchStats> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for r in &self.rounds {
            for p in r.player_stats() {
                let i = *index.entry(p.username.clone()).or_insert_with(|| {
                    stats.push(PlayerMatchStats {
                        username: p.username.clone(),
                        team_index: p.team_index,
                        ..PlayerMatchStats::default()
                    });
                    stats.len() - 1
                });
                stats[i].rounds += 1;
                stats[i].kills += p.kills;
                if p.died {
                    stats[i].deaths += 1;
                }
                stats[i].assists += p.assists;
                stats[i].headshots += p.headshots;
                stats[i].headshot_percentage =
                    headshot_percentage(stats[i].headshots, stats[i].kills);
            }
        }
        stats
    }

    /// The export shape: every round's header, feed, and stats, plus the
    /// aggregated match stats.
    pub fn data(&self) -> MatchData<'_> {
        MatchData {
            rounds: self
                .rounds
                .iter()
                .map(|r| RoundData {
                    header: &r.header,
                    match_feedback: &r.match_feedback,
                    stats: r.player_stats(),
                })
                .collect(),
            stats: self.player_stats(),
        }
    }
}

fn list_replay_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rec"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(Error::InvalidFolder);
    }
    Ok(paths)
}
