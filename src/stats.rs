use crate::events::{MatchUpdate, MatchUpdateType};
use crate::reader::RoundReader;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundStats {
    pub username: String,
    #[serde(skip)]
    pub team_index: usize,
    pub score: u32,
    #[serde(skip)]
    pub operator: String,
    pub kills: u32,
    pub died: bool,
    pub assists: u32,
    pub headshots: u32,
    pub headshot_percentage: f64,
    #[serde(rename = "1vX", skip_serializing_if = "Option::is_none")]
    pub one_vx: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStats {
    pub username: String,
    #[serde(skip)]
    pub team_index: usize,
    pub rounds: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshots: u32,
    pub headshot_percentage: f64,
}

pub(crate) fn headshot_percentage(headshots: u32, kills: u32) -> f64 {
    if kills == 0 {
        return 0.0;
    }
    f64::from(headshots) / f64::from(kills) * 100.0
}

impl RoundReader {
    /// The first kill of the round, if anyone got one.
    pub fn opening_kill(&self) -> Option<&MatchUpdate> {
        self.match_feedback
            .iter()
            .find(|a| a.kind == MatchUpdateType::Kill)
    }

    /// The first death of the round, whether through a kill or on its own.
    pub fn opening_death(&self) -> Option<&MatchUpdate> {
        self.match_feedback
            .iter()
            .find(|a| a.kind == MatchUpdateType::Kill || a.kind == MatchUpdateType::Death)
    }

    /// Kill/death subsequence of the feed, in order.
    pub fn kills_and_deaths(&self) -> Vec<&MatchUpdate> {
        self.match_feedback
            .iter()
            .filter(|a| a.kind == MatchUpdateType::Kill || a.kind == MatchUpdateType::Death)
            .collect()
    }

    /// Consecutive kill pairs where the later killer avenges the earlier
    /// victim.
    pub fn trades(&self) -> Vec<[&MatchUpdate; 2]> {
        let mut trades = Vec::new();
        let mut previous: Option<&MatchUpdate> = None;
        for a in &self.match_feedback {
            if a.kind != MatchUpdateType::Kill {
                continue;
            }
            if let Some(prev) = previous {
                if prev.target == a.username {
                    trades.push([prev, a]);
                }
            }
            previous = Some(a);
        }
        trades
    }

    /// Builds per-player round statistics from the feed, the roster, and the
    /// scoreboard counters, including the 1vX of the last winner standing.
    pub fn player_stats(&self) -> Vec<PlayerRoundStats> {
        let winning_team = usize::from(self.header.teams[1].won);
        let mut stats: Vec<PlayerRoundStats> = self
            .header
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let board = self.scoreboard.players.get(i).copied().unwrap_or_default();
                PlayerRoundStats {
                    username: p.username.clone(),
                    team_index: p.team_index,
                    operator: p.operator.to_string(),
                    score: board.score,
                    assists: board.assists,
                    ..PlayerRoundStats::default()
                }
            })
            .collect();
        let index: HashMap<&str, usize> = self
            .header
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.username.as_str(), i))
            .collect();

        let mut last_death: Option<usize> = None;
        for a in &self.match_feedback {
            match a.kind {
                MatchUpdateType::Kill => {
                    if let Some(&i) = index.get(a.username.as_str()) {
                        stats[i].kills += 1;
                        if a.headshot == Some(true) {
                            stats[i].headshots += 1;
                        }
                        stats[i].headshot_percentage =
                            headshot_percentage(stats[i].headshots, stats[i].kills);
                    }
                    if let Some(&t) = index.get(a.target.as_str()) {
                        stats[t].died = true;
                        last_death = Some(t);
                    }
                }
                MatchUpdateType::Death => {
                    if let Some(&i) = index.get(a.username.as_str()) {
                        stats[i].died = true;
                        last_death = Some(i);
                    }
                }
                _ => {}
            }
        }

        // 1vX: the winner left standing (or the winner who died last when
        // nobody survived) gets credited with the kills made while their
        // team was down to one.
        let winners_alive: Vec<usize> = stats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.team_index == winning_team && !s.died)
            .map(|(i, _)| i)
            .collect();
        let last_death_was_winner =
            last_death.is_some_and(|i| stats[i].team_index == winning_team);
        let last_standing = match winners_alive.len() {
            1 => Some(winners_alive[0]),
            0 if last_death_was_winner => last_death,
            _ => None,
        };
        if let Some(w) = last_standing {
            let username = stats[w].username.clone();
            let mut team_left = self.num_players(winning_team) as i64;
            let mut one_vx: u32 = 0;
            for a in &self.match_feedback {
                match a.kind {
                    MatchUpdateType::Kill => {
                        if let Some(&t) = index.get(a.target.as_str()) {
                            if stats[t].team_index == winning_team {
                                team_left -= 1;
                            }
                        }
                    }
                    MatchUpdateType::Death | MatchUpdateType::PlayerLeave => {
                        if let Some(&i) = index.get(a.username.as_str()) {
                            if stats[i].team_index == winning_team {
                                team_left -= 1;
                            }
                        }
                    }
                    _ => {}
                }
                if a.username != username {
                    continue;
                }
                if a.kind == MatchUpdateType::Kill && team_left < 2 {
                    one_vx += 1;
                }
            }
            // opponents who never died were faced, not fought
            for s in &stats {
                if s.team_index != winning_team && !s.died {
                    one_vx += 1;
                }
            }
            stats[w].one_vx = Some(one_vx);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{decode, ReplayBuilder};

    fn reader_with_roster() -> RoundReader {
        let mut b = ReplayBuilder::ranked("Y8S1", crate::reader::Y8S1);
        for i in 0..10 {
            let team = usize::from(i >= 5);
            b.header_player(100 + i as u64, &format!("p{i}"), team);
        }
        b.pad(128);
        decode(&b.build_legacy(), false)
    }

    fn kill(r: &RoundReader, killer: &str, target: &str, headshot: bool) -> MatchUpdate {
        let mut u = r.update(MatchUpdateType::Kill);
        u.username = killer.into();
        u.target = target.into();
        u.headshot = Some(headshot);
        u
    }

    #[test]
    fn kills_deaths_and_headshot_percentage() {
        let mut r = reader_with_roster();
        r.header.teams[0].won = true;
        r.match_feedback = vec![
            kill(&r, "p0", "p5", true),
            kill(&r, "p0", "p6", false),
            {
                let mut u = r.update(MatchUpdateType::Death);
                u.username = "p7".into();
                u
            },
        ];
        let stats = r.player_stats();
        assert_eq!(stats[0].kills, 2);
        assert_eq!(stats[0].headshots, 1);
        assert_eq!(stats[0].headshot_percentage, 50.0);
        assert!(stats[5].died);
        assert!(stats[6].died);
        assert!(stats[7].died);
        assert!(!stats[8].died);
        assert_eq!(stats[1].headshot_percentage, 0.0);
    }

    #[test]
    fn opening_kill_and_death() {
        let mut r = reader_with_roster();
        let mut death = r.update(MatchUpdateType::Death);
        death.username = "p3".into();
        r.match_feedback = vec![death, kill(&r, "p0", "p5", false)];
        assert_eq!(r.opening_kill().unwrap().username, "p0");
        assert_eq!(r.opening_death().unwrap().username, "p3");
        assert_eq!(r.kills_and_deaths().len(), 2);
    }

    #[test]
    fn trades_pair_consecutive_kills() {
        let mut r = reader_with_roster();
        r.match_feedback = vec![
            kill(&r, "p0", "p5", false),
            kill(&r, "p6", "p0", false), // avenges p5's killer
            kill(&r, "p1", "p7", false),
        ];
        let trades = r.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0][0].username, "p0");
        assert_eq!(trades[0][1].username, "p6");
    }

    #[test]
    fn one_vx_for_the_last_winner_standing() {
        let mut r = reader_with_roster();
        r.header.teams[0].won = true;
        // p1..p4 die, leaving p0 in a 1v2 which they close out
        r.match_feedback = vec![
            kill(&r, "p5", "p1", false),
            kill(&r, "p5", "p2", false),
            kill(&r, "p6", "p3", false),
            kill(&r, "p6", "p4", false),
            kill(&r, "p0", "p5", false),
            kill(&r, "p0", "p6", false),
        ];
        let stats = r.player_stats();
        assert_eq!(stats[0].one_vx, Some(2 + 3)); // two kills + three never-died opponents
        assert!(stats.iter().enumerate().all(|(i, s)| i == 0 || s.one_vx.is_none()));
    }

    #[test]
    fn one_vx_needs_a_lone_winner() {
        let mut r = reader_with_roster();
        r.header.teams[0].won = true;
        r.match_feedback = vec![kill(&r, "p0", "p5", false)];
        let stats = r.player_stats();
        assert!(stats.iter().all(|s| s.one_vx.is_none()));
    }
}
