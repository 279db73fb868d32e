use crate::container;
use crate::error::{Error, Result};
use crate::events::{MatchUpdate, MatchUpdateType};
use crate::header::{Header, WinCondition};
use crate::operators::Role;
use crate::payload::Payload;
use crate::player::{ID_INDICATOR, ID_INDICATOR_LEGACY, SPAWN_INDICATOR};
use crate::scan;
use crate::scoreboard::Scoreboard;
use log::{debug, warn};
use std::fs;
use std::io::Read;
use std::path::Path;

// codeVersion gates. Layouts shift at season boundaries; parsers branch on
// these through the precomputed VersionProfile.
pub const Y7S2: u32 = 6879059;
pub const Y7S3: u32 = 7040830;
pub const Y7S4: u32 = 7205408;
pub const Y8S1: u32 = 7408213;
pub const Y8S2: u32 = 7580936;
pub const Y8S4: u32 = 7947204;

pub(crate) const SIG_PLAYER: &[u8] = &[0x22, 0x07, 0x94, 0x9B, 0xDC];
pub(crate) const SIG_ATK_SWAP: &[u8] = &[0x22, 0xA9, 0x26, 0x0B, 0xE4];
pub(crate) const SIG_CLOCK: &[u8] = &[0x1F, 0x07, 0xEF, 0xC9];
pub(crate) const SIG_CLOCK_LEGACY: &[u8] = &[0x1E, 0xF1, 0x11, 0xAB];
pub(crate) const SIG_FEEDBACK: &[u8] = &[0x59, 0x34, 0xE5, 0x8B, 0x04];
pub(crate) const SIG_DEFUSER: &[u8] = &[0x22, 0xA9, 0xC8, 0x58, 0xD9];
pub(crate) const SIG_SCORE: &[u8] = &[0x22, 0xC3, 0x61, 0x71, 0xB9];
pub(crate) const SIG_ASSISTS: &[u8] = &[0x22, 0x6E, 0x1B, 0x71, 0xA4];

/// Which roster entry a payload descriptor folds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeKey {
    /// Y8S2 and later: the numeric player id.
    NumericId,
    /// Y7S3 through Y8S1: the opaque packet-id.
    PacketId,
    /// Y7S2 and earlier: username prefix, tolerating streamer-mode renames.
    UsernamePrefix,
}

/// Everything version-dependent, resolved once at construction so parsers
/// never compare codeVersion inline.
#[derive(Debug)]
pub(crate) struct VersionProfile {
    pub binary_clock: bool,
    pub clock_signature: &'static [u8],
    pub modern_player_marker: bool,
    pub id_indicator: &'static [u8],
    pub merge_key: MergeKey,
}

impl VersionProfile {
    fn new(code_version: u32) -> Self {
        VersionProfile {
            binary_clock: code_version >= Y8S1,
            clock_signature: if code_version >= Y8S1 {
                SIG_CLOCK
            } else {
                SIG_CLOCK_LEGACY
            },
            modern_player_marker: code_version >= Y7S4,
            id_indicator: if code_version >= Y7S3 {
                ID_INDICATOR
            } else {
                ID_INDICATOR_LEGACY
            },
            merge_key: if code_version >= Y8S2 {
                MergeKey::NumericId
            } else if code_version >= Y7S3 {
                MergeKey::PacketId
            } else {
                MergeKey::UsernamePrefix
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureKind {
    Player,
    AtkSwap,
    Spawn,
    Clock,
    Feedback,
    DefuserTimer,
    Score,
    Assists,
}

/// Decoder for one round. Construction decompresses the payload and parses
/// the header; [`RoundReader::read`] extracts the feed and resolves the
/// outcome.
#[derive(Debug)]
pub struct RoundReader {
    pub(crate) payload: Payload,
    pub(crate) profile: VersionProfile,
    signatures: Vec<(&'static [u8], SignatureKind)>,
    pub(crate) time_raw: String,
    pub(crate) time: f64,
    pub(crate) planted: bool,
    pub(crate) last_defuser_player: Option<usize>,
    pub(crate) players_read: usize,
    read_partial: bool,
    pub header: Header,
    pub match_feedback: Vec<MatchUpdate>,
    pub scoreboard: Scoreboard,
}

impl RoundReader {
    pub fn new(data: &[u8]) -> Result<Self> {
        let container::Container { header, payload } = container::open(data)?;
        debug!(
            "season {} code {}",
            header.game_version, header.code_version
        );
        let profile = VersionProfile::new(header.code_version);
        let signatures = vec![
            (SIG_PLAYER, SignatureKind::Player),
            (SIG_ATK_SWAP, SignatureKind::AtkSwap),
            (SPAWN_INDICATOR, SignatureKind::Spawn),
            (profile.clock_signature, SignatureKind::Clock),
            (SIG_FEEDBACK, SignatureKind::Feedback),
            (SIG_DEFUSER, SignatureKind::DefuserTimer),
            (SIG_SCORE, SignatureKind::Score),
            (SIG_ASSISTS, SignatureKind::Assists),
        ];
        let mut reader = RoundReader {
            payload: Payload::new(payload),
            profile,
            signatures,
            time_raw: String::new(),
            time: 0.0,
            planted: false,
            last_defuser_player: None,
            players_read: 0,
            read_partial: false,
            header,
            match_feedback: Vec::new(),
            scoreboard: Scoreboard::default(),
        };
        let roster = reader.header.players.len();
        reader.scoreboard.ensure_len(roster);
        Ok(reader)
    }

    pub fn from_reader<R: Read>(mut input: R) -> Result<Self> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        Self::new(&data)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(&fs::read(path)?)
    }

    /// Extracts the full feed and resolves the round outcome. Reading is
    /// idempotent: derived state is reset up front, so repeated reads (or a
    /// partial read followed by a full one) converge on the same result.
    pub fn read(&mut self) -> Result<()> {
        self.reset();
        let limit = if self.read_partial {
            // the roster sits well within the first third
            self.payload.len() / 3
        } else {
            self.payload.len()
        };
        let registry = self.signatures.clone();
        let sig_bytes: Vec<&[u8]> = registry.iter().map(|(b, _)| *b).collect();
        let matches = scan::scan(self.payload.data(), &sig_bytes, limit);
        debug!("{} signature matches in {} bytes", matches.len(), limit);
        for m in matches {
            self.payload.set_pos(m.end);
            let kind = registry[m.signature].1;
            match self.dispatch(kind) {
                Ok(()) => {}
                Err(Error::UnexpectedEnd) => {
                    debug!("record truncated at end of payload");
                    break;
                }
                Err(e) => return Err(e),
            }
            if self.read_partial && self.players_read == 10 {
                break;
            }
        }
        if !self.read_partial {
            self.round_end();
        }
        Ok(())
    }

    /// Reads only far enough to observe the full roster. Faster; the feed
    /// and outcome stay empty.
    pub fn read_partial(&mut self) -> Result<()> {
        self.read_partial = true;
        debug!("using partial read");
        let result = self.read();
        self.read_partial = false;
        result
    }

    fn dispatch(&mut self, kind: SignatureKind) -> Result<()> {
        match kind {
            SignatureKind::Player => self.read_player(),
            SignatureKind::AtkSwap => self.read_atk_op_swap(),
            SignatureKind::Spawn => self.read_spawn(),
            SignatureKind::Clock => self.read_clock(),
            SignatureKind::Feedback => self.read_match_feedback(),
            SignatureKind::DefuserTimer => self.read_defuser_timer(),
            SignatureKind::Score => self.read_scoreboard_score(),
            SignatureKind::Assists => self.read_scoreboard_assists(),
        }
    }

    fn reset(&mut self) {
        self.time_raw.clear();
        self.time = 0.0;
        self.planted = false;
        self.last_defuser_player = None;
        self.players_read = 0;
        self.match_feedback.clear();
        self.scoreboard.reset();
        self.header.site = None;
        for t in &mut self.header.teams {
            t.won = false;
            t.win_condition = None;
            t.role = None;
        }
        for p in &mut self.header.players {
            p.spawn = None;
        }
    }

    pub(crate) fn packet_id(&mut self) -> Result<[u8; 4]> {
        let b = self.payload.bytes(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    pub(crate) fn player_index_by_packet_id(&self, id: &[u8; 4]) -> Option<usize> {
        self.header
            .players
            .iter()
            .position(|p| p.packet_id.as_ref() == Some(id))
    }

    pub(crate) fn player_index_by_username(&self, username: &str) -> Option<usize> {
        if username.is_empty() {
            return None;
        }
        self.header
            .players
            .iter()
            .position(|p| p.username == username)
    }

    pub fn num_players(&self, team_index: usize) -> usize {
        self.header
            .players
            .iter()
            .filter(|p| p.team_index == team_index)
            .count()
    }

    fn team_with_role(&self, role: Role) -> Option<usize> {
        self.header.teams.iter().position(|t| t.role == Some(role))
    }

    fn win(&mut self, team_index: usize, condition: WinCondition) {
        self.header.teams[team_index].won = true;
        self.header.teams[team_index].win_condition = Some(condition);
        self.header.teams[1 - team_index].won = false;
        self.header.teams[1 - team_index].win_condition = None;
        debug!(
            "team {} ({}) wins: {condition:?}",
            team_index, self.header.teams[team_index].name
        );
    }

    /// Resolves who won and why from the accumulated feed. Order matters: a
    /// disabled defuser beats everything, then a completed plant, then
    /// wiping a team, then the clock.
    fn round_end(&mut self) {
        let mut died = vec![false; self.header.players.len()];
        let mut planter: Option<usize> = None;
        let mut disabled = false;
        for u in &self.match_feedback {
            match u.kind {
                MatchUpdateType::Kill => {
                    if let Some(i) = self.player_index_by_username(&u.target) {
                        died[i] = true;
                    }
                }
                MatchUpdateType::Death => {
                    if let Some(i) = self.player_index_by_username(&u.username) {
                        died[i] = true;
                    }
                }
                MatchUpdateType::DefuserPlantComplete => {
                    planter = self.player_index_by_username(&u.username);
                }
                MatchUpdateType::DefuserDisableComplete => disabled = true,
                _ => {}
            }
        }
        if disabled {
            match self.team_with_role(Role::Defense) {
                Some(t) => self.win(t, WinCondition::DisabledDefuser),
                None => warn!("defuser disabled but the defending team is unknown"),
            }
            return;
        }
        if let Some(p) = planter {
            let t = self.header.players[p].team_index;
            if t <= 1 {
                // post-plant kills cannot flip this anymore
                self.win(t, WinCondition::DefusedBomb);
                return;
            }
        }
        for team in 0..2 {
            let mut members = 0;
            let mut dead = 0;
            for (i, p) in self.header.players.iter().enumerate() {
                if p.team_index == team {
                    members += 1;
                    if died[i] {
                        dead += 1;
                    }
                }
            }
            if members > 0 && dead == members {
                self.win(1 - team, WinCondition::KilledOpponents);
                return;
            }
        }
        match self.team_with_role(Role::Defense) {
            Some(t) => self.win(t, WinCondition::Time),
            None => debug!("round ended without a resolvable outcome"),
        }
    }
}
