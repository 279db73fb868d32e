use crate::error::Result;
use crate::reader::RoundReader;
use log::debug;
use serde::Serialize;

/// Per-player score and assist counters, indexed like the roster.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scoreboard {
    pub players: Vec<ScoreboardPlayer>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScoreboardPlayer {
    pub score: u32,
    pub assists: u32,
}

impl Scoreboard {
    pub(crate) fn ensure_len(&mut self, len: usize) {
        if self.players.len() < len {
            self.players.resize(len, ScoreboardPlayer::default());
        }
    }

    pub(crate) fn reset(&mut self) {
        for p in &mut self.players {
            *p = ScoreboardPlayer::default();
        }
    }
}

impl RoundReader {
    pub(crate) fn read_scoreboard_score(&mut self) -> Result<()> {
        let score = self.payload.u32_le()?;
        if score == 0 {
            return Ok(());
        }
        self.payload.skip(13)?;
        let id = self.packet_id()?;
        let Some(i) = self.player_index_by_packet_id(&id) else {
            debug!("scoreboard score {score} for an unknown packet-id");
            return Ok(());
        };
        self.scoreboard.ensure_len(i + 1);
        self.scoreboard.players[i].score = score;
        debug!(
            "scoreboard score {score} for {}",
            self.header.players[i].username
        );
        Ok(())
    }

    pub(crate) fn read_scoreboard_assists(&mut self) -> Result<()> {
        let assists = self.payload.u32_le()?;
        if assists == 0 {
            return Ok(());
        }
        self.payload.skip(30)?;
        let id = self.packet_id()?;
        let Some(i) = self.player_index_by_packet_id(&id) else {
            debug!("scoreboard assist for an unknown packet-id");
            return Ok(());
        };
        self.scoreboard.ensure_len(i + 1);
        self.scoreboard.players[i].assists += 1;
        debug!(
            "scoreboard assist for {}",
            self.header.players[i].username
        );
        Ok(())
    }
}
