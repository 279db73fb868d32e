use crate::error::Result;
use crate::events::MatchUpdateType;
use crate::header::Player;
use crate::operators::{Operator, Role};
use crate::reader::{MergeKey, RoundReader, SIG_ATK_SWAP};
use log::{debug, warn};

/// Start of the operator block inside recent player descriptors.
const PLAYER_MARKER: &[u8] = &[0x40, 0xF2, 0x15, 0x04];
/// Recent descriptors emit the same player twice; the second copy carries
/// this byte where the first carries the operator block.
const DUPLICATE_EMISSION: u8 = 0x9D;
/// Precedes the packet-id.
pub(crate) const ID_INDICATOR: &[u8] = &[0x33, 0xD8, 0x3D, 0x4F, 0x23];
pub(crate) const ID_INDICATOR_LEGACY: &[u8] = &[0xE6, 0xF9, 0x7D, 0x86];
/// Precedes the profile id string.
const PROFILE_ID_INDICATOR: &[u8] = &[0x8A, 0x50, 0x9B, 0xD0];
/// Spawn location block, shared with standalone spawn records.
pub(crate) const SPAWN_INDICATOR: &[u8] = &[0xAF, 0x98, 0x99, 0xCA];

impl RoundReader {
    /// Player descriptor: username, pre-swap operator, packet-id, spawn, and
    /// (when the replay has them) profile id and numeric id.
    pub(crate) fn read_player(&mut self) -> Result<()> {
        let username = self.payload.string()?;
        if self.profile.modern_player_marker {
            self.payload.seek(PLAYER_MARKER)?;
            self.payload.skip(8)?;
            if self.payload.int()? == DUPLICATE_EMISSION {
                debug!("second emission of {username:?}, skipping");
                return Ok(());
            }
        } else {
            self.payload.seek(SIG_ATK_SWAP)?;
        }
        let operator = Operator(self.payload.u64_le()?);
        if operator.id() == 0 {
            debug!("empty player slot");
            return Ok(());
        }
        let delim = self.payload.int()?;
        if delim != 0x22 {
            debug!("strange player record for {username:?} (delimiter {delim:#04x}), skipping");
            return Ok(());
        }
        self.payload.seek(self.profile.id_indicator)?;
        let packet_id = self.packet_id()?;
        self.payload.seek(SPAWN_INDICATOR)?;
        let spawn = self.payload.string()?;
        if spawn.is_empty() {
            self.payload.skip(10)?;
            let b = self.payload.int()?;
            if b != 0x1B {
                debug!("strange spawn block for {username:?} ({b:#04x}), skipping");
                return Ok(());
            }
        }
        let team_index = if self.players_read < 5 { 0 } else { 1 };
        let mut id = 0u64;
        let mut profile_id = String::new();
        if !self.header.recording_profile_id.is_empty() {
            self.payload.seek(PROFILE_ID_INDICATOR)?;
            profile_id = self.payload.string()?;
            self.payload.skip(5)?;
            id = self.payload.u64_le()?;
        } else {
            debug!("replay without profile ids, skipping lookup");
        }
        // defender spawns are not reliable at this point; the site record
        // fills them in later
        let spawn = match operator.role() {
            Some(Role::Defense) => None,
            _ if spawn.is_empty() => None,
            _ => Some(spawn),
        };
        debug!(
            "player {username:?} team {team_index} operator {operator} id {id} packet {packet_id:02x?}"
        );
        self.merge_player(Player {
            id,
            profile_id,
            username,
            team_index,
            operator,
            spawn,
            packet_id: Some(packet_id),
            ..Player::default()
        });
        self.players_read += 1;
        if self.players_read == 10 {
            self.derive_team_roles();
        }
        Ok(())
    }

    /// Attacker operator swap: updates the roster entry and records the swap
    /// in the feed. Descriptor echoes (operator unchanged) are not swaps.
    pub(crate) fn read_atk_op_swap(&mut self) -> Result<()> {
        let operator = Operator(self.payload.u64_le()?);
        self.payload.skip(5)?;
        let id = self.packet_id()?;
        let Some(i) = self.player_index_by_packet_id(&id) else {
            return Ok(());
        };
        if self.header.players[i].operator == operator {
            return Ok(());
        }
        self.header.players[i].operator = operator;
        let mut u = self.update(MatchUpdateType::OperatorSwap);
        u.username = self.header.players[i].username.clone();
        u.operator = Some(operator);
        debug!("match update: {u:?}");
        self.match_feedback.push(u);
        Ok(())
    }

    /// Inserts a descriptor into the roster, or folds it into the entry it
    /// re-describes. The join key depends on the replay version; an exact
    /// username match covers entries that came from the header property
    /// stream and have no packet-id yet.
    fn merge_player(&mut self, player: Player) {
        let players = &mut self.header.players;
        let found = match self.profile.merge_key {
            MergeKey::NumericId => players
                .iter()
                .position(|p| player.id != 0 && p.id == player.id),
            MergeKey::PacketId => players
                .iter()
                .position(|p| p.packet_id.is_some() && p.packet_id == player.packet_id),
            // streamer-mode nicknames grow a suffix mid-round
            MergeKey::UsernamePrefix => players.iter().position(|p| {
                !p.username.is_empty() && player.username.starts_with(p.username.as_str())
            }),
        };
        let found = found.or_else(|| {
            players
                .iter()
                .position(|p| !p.username.is_empty() && p.username == player.username)
        });
        match found {
            Some(i) => {
                let existing = &mut players[i];
                if player.id != 0 {
                    existing.id = player.id;
                }
                if !player.profile_id.is_empty() {
                    existing.profile_id = player.profile_id;
                }
                existing.username = player.username;
                existing.team_index = player.team_index;
                existing.operator = player.operator;
                existing.spawn = player.spawn;
                existing.packet_id = player.packet_id;
            }
            None if !player.username.is_empty() => players.push(player),
            None => warn!("could not place a player descriptor with an empty username"),
        }
        let roster = self.header.players.len();
        self.scoreboard.ensure_len(roster);
    }

    /// Once the roster is complete, any player with a known operator pins
    /// down both teams' roles.
    fn derive_team_roles(&mut self) {
        for p in &self.header.players {
            let Some(role) = p.operator.role() else {
                continue;
            };
            if p.team_index > 1 {
                continue;
            }
            self.header.teams[p.team_index].role = Some(role);
            self.header.teams[1 - p.team_index].role = Some(role.opposite());
            return;
        }
        debug!("no operator with a known role; team roles left unset");
    }
}
