//! Synthesizes replay files for tests: a property-stream header plus a
//! payload assembled from the same record layouts the parsers consume,
//! compressed into either container variant.

use crate::container::CHUNK_SENTINEL;
use crate::events::{FEEDBACK_MARKER, KILL_INDICATOR};
use crate::player::{ID_INDICATOR, ID_INDICATOR_LEGACY, SPAWN_INDICATOR};
use crate::reader::{
    RoundReader, SIG_ATK_SWAP, SIG_ASSISTS, SIG_CLOCK, SIG_CLOCK_LEGACY, SIG_DEFUSER,
    SIG_FEEDBACK, SIG_PLAYER, SIG_SCORE, Y7S4, Y8S1,
};

const PLAYER_MARKER: &[u8] = &[0x40, 0xF2, 0x15, 0x04];
const PROFILE_ID_INDICATOR: &[u8] = &[0x8A, 0x50, 0x9B, 0xD0];

pub(crate) struct ReplayBuilder {
    version: String,
    code: u32,
    match_type: u32,
    profile_ids: bool,
    team_names: [String; 2],
    scores: [u32; 2],
    match_id: String,
    header_players: Vec<(u64, String, usize)>,
    pub payload: Vec<u8>,
}

impl ReplayBuilder {
    pub fn ranked(version: &str, code: u32) -> Self {
        Self::new(version, code, 2, true)
    }

    pub fn quick_match(version: &str, code: u32) -> Self {
        Self::new(version, code, 1, false)
    }

    fn new(version: &str, code: u32, match_type: u32, profile_ids: bool) -> Self {
        ReplayBuilder {
            version: version.to_owned(),
            code,
            match_type,
            profile_ids,
            team_names: ["Alpha".to_owned(), "Bravo".to_owned()],
            scores: [0, 0],
            match_id: "M-0001".to_owned(),
            header_players: Vec::new(),
            payload: Vec::new(),
        }
    }

    pub fn set_team_names(&mut self, a: &str, b: &str) {
        self.team_names = [a.to_owned(), b.to_owned()];
    }

    pub fn set_scores(&mut self, a: u32, b: u32) {
        self.scores = [a, b];
    }

    pub fn header_player(&mut self, id: u64, name: &str, team: usize) {
        self.header_players.push((id, name.to_owned(), team));
    }

    // ---- header assembly ----

    fn push_prop(out: &mut Vec<u8>, k: &str, v: &str) {
        for s in [k, v] {
            out.push(s.len() as u8);
            out.extend_from_slice(&[0u8; 7]);
            out.extend_from_slice(s.as_bytes());
        }
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"dissect");
        out.extend_from_slice(&[0x02, 0x0B]);
        out.extend_from_slice(&[0u8; 7]);
        out.push(0x4C);
        out.extend_from_slice(&[0u8; 7]);
        let profile = if self.profile_ids { "rec-prof-0001" } else { "" };
        let code = self.code.to_string();
        let match_type = self.match_type.to_string();
        let base = [
            ("version", self.version.as_str()),
            ("code", code.as_str()),
            ("datetime", "2023-04-02-21-14-05"),
            ("matchtype", match_type.as_str()),
            ("worldid", "837214085"),
            ("recordingplayerid", "101"),
            ("recordingprofileid", profile),
            ("additionaltags", ""),
            ("gamemodeid", "327933806"),
            ("roundspermatch", "6"),
            ("roundspermatchovertime", "3"),
            ("roundnumber", "1"),
            ("overtimeroundnumber", "0"),
            ("teamname0", self.team_names[0].as_str()),
            ("teamname1", self.team_names[1].as_str()),
            ("gmsetting", "180"),
        ];
        for (k, v) in base {
            Self::push_prop(&mut out, k, v);
        }
        for (id, name, team) in &self.header_players {
            Self::push_prop(&mut out, "playerid", &id.to_string());
            Self::push_prop(&mut out, "playername", name);
            Self::push_prop(&mut out, "team", &team.to_string());
        }
        Self::push_prop(&mut out, "id", &self.match_id);
        Self::push_prop(&mut out, "teamscore0", &self.scores[0].to_string());
        Self::push_prop(&mut out, "teamscore1", &self.scores[1].to_string());
        out
    }

    // ---- payload records ----

    fn string(out: &mut Vec<u8>, s: &str) {
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }

    fn u32_le(out: &mut Vec<u8>, n: u32) {
        out.push(4);
        out.extend_from_slice(&n.to_le_bytes());
    }

    fn u64_le(out: &mut Vec<u8>, n: u64) {
        out.push(8);
        out.extend_from_slice(&n.to_le_bytes());
    }

    pub fn pad(&mut self, n: usize) {
        self.payload.extend(std::iter::repeat(0x00).take(n));
    }

    pub fn clock(&mut self, seconds: u32) {
        if self.code >= Y8S1 {
            self.payload.extend_from_slice(SIG_CLOCK);
            Self::u32_le(&mut self.payload, seconds);
        } else {
            self.payload.extend_from_slice(SIG_CLOCK_LEGACY);
            let raw = format!("{}:{:02}", seconds / 60, seconds % 60);
            Self::string(&mut self.payload, &raw);
        }
    }

    pub fn clock_str(&mut self, raw: &str) {
        assert!(self.code < Y8S1, "string clocks are pre-Y8S1");
        self.payload.extend_from_slice(SIG_CLOCK_LEGACY);
        Self::string(&mut self.payload, raw);
    }

    pub fn kill(&mut self, killer: &str, target: &str, headshot: bool) {
        self.payload.extend_from_slice(SIG_FEEDBACK);
        self.payload.push(0x01);
        self.payload.extend_from_slice(FEEDBACK_MARKER);
        self.payload.push(0);
        self.payload.extend_from_slice(KILL_INDICATOR);
        Self::string(&mut self.payload, killer);
        self.payload.extend_from_slice(&[0xAA; 15]);
        Self::string(&mut self.payload, target);
        self.payload.extend_from_slice(&[0xBB; 56]);
        self.payload.push(u8::from(headshot));
    }

    pub fn death(&mut self, target: &str) {
        self.payload.extend_from_slice(SIG_FEEDBACK);
        self.payload.push(0x01);
        self.payload.extend_from_slice(FEEDBACK_MARKER);
        self.payload.push(0);
        self.payload.extend_from_slice(KILL_INDICATOR);
        Self::string(&mut self.payload, "");
        self.payload.extend_from_slice(&[0xAA; 15]);
        Self::string(&mut self.payload, target);
    }

    pub fn feedback_message(&mut self, msg: &str) {
        self.payload.extend_from_slice(SIG_FEEDBACK);
        self.payload.push(0x01);
        self.payload.extend_from_slice(FEEDBACK_MARKER);
        self.payload.push(msg.len() as u8);
        self.payload.extend_from_slice(msg.as_bytes());
    }

    pub fn defuser_timer(&mut self, timer: &str, packet_id: [u8; 4]) {
        self.payload.extend_from_slice(SIG_DEFUSER);
        Self::string(&mut self.payload, timer);
        self.payload.extend_from_slice(&[0xCC; 34]);
        self.payload.extend_from_slice(&packet_id);
    }

    pub fn spawn_site(&mut self, location: &str, flag: u8) {
        self.payload.extend_from_slice(SPAWN_INDICATOR);
        Self::string(&mut self.payload, location);
        self.payload.extend_from_slice(&[0xDD; 37]);
        self.payload.push(flag);
    }

    pub fn op_swap(&mut self, operator: u64, packet_id: [u8; 4]) {
        self.payload.extend_from_slice(SIG_ATK_SWAP);
        Self::u64_le(&mut self.payload, operator);
        self.payload.extend_from_slice(&[0xEE; 5]);
        self.payload.extend_from_slice(&packet_id);
    }

    pub fn score(&mut self, points: u32, packet_id: [u8; 4]) {
        self.payload.extend_from_slice(SIG_SCORE);
        Self::u32_le(&mut self.payload, points);
        self.payload.extend_from_slice(&[0x99; 13]);
        self.payload.extend_from_slice(&packet_id);
    }

    pub fn assist(&mut self, count: u32, packet_id: [u8; 4]) {
        self.payload.extend_from_slice(SIG_ASSISTS);
        Self::u32_le(&mut self.payload, count);
        self.payload.extend_from_slice(&[0x98; 30]);
        self.payload.extend_from_slice(&packet_id);
    }

    /// One player descriptor in the layout the current version expects.
    /// `numeric_id` only lands in the record when the builder carries
    /// profile ids.
    pub fn player_descriptor(
        &mut self,
        username: &str,
        operator: u64,
        packet_id: [u8; 4],
        spawn: &str,
        numeric_id: u64,
    ) {
        self.payload.extend_from_slice(SIG_PLAYER);
        Self::string(&mut self.payload, username);
        if self.code >= Y7S4 {
            self.payload.extend_from_slice(PLAYER_MARKER);
            self.payload.extend_from_slice(&[0x11; 8]);
            self.payload.push(0x00);
        } else {
            self.payload.extend_from_slice(SIG_ATK_SWAP);
        }
        Self::u64_le(&mut self.payload, operator);
        self.payload.push(0x22);
        if self.code >= crate::reader::Y7S3 {
            self.payload.extend_from_slice(ID_INDICATOR);
        } else {
            self.payload.extend_from_slice(ID_INDICATOR_LEGACY);
        }
        self.payload.extend_from_slice(&packet_id);
        self.payload.extend_from_slice(SPAWN_INDICATOR);
        Self::string(&mut self.payload, spawn);
        if spawn.is_empty() {
            self.payload.extend_from_slice(&[0x77; 10]);
            self.payload.push(0x1B);
        }
        if self.profile_ids {
            self.payload.extend_from_slice(PROFILE_ID_INDICATOR);
            Self::string(&mut self.payload, &format!("prof-{numeric_id}"));
            self.payload.extend_from_slice(&[0x55; 5]);
            Self::u64_le(&mut self.payload, numeric_id);
        }
        // room for the spawn handler that fires on the embedded indicator
        self.payload.extend_from_slice(&[0xEF; 40]);
    }

    /// A full roster: five attackers then five defenders, usernames
    /// `a0..a4` and `d0..d4`, numeric ids 101.. and packet-ids 1..=10.
    pub fn standard_roster(&mut self, attacker_op: u64, defender_op: u64) {
        for i in 0..5u8 {
            self.player_descriptor(
                &format!("a{i}"),
                attacker_op,
                [1 + i, 0, 0, 9],
                "River Docks",
                101 + u64::from(i),
            );
        }
        for i in 0..5u8 {
            self.player_descriptor(
                &format!("d{i}"),
                defender_op,
                [6 + i, 0, 0, 9],
                "",
                106 + u64::from(i),
            );
        }
    }

    // ---- container assembly ----

    pub fn build_legacy(&self) -> Vec<u8> {
        let mut plain = self.header_bytes();
        plain.extend_from_slice(&self.payload);
        zstd::stream::encode_all(&plain[..], 0).expect("zstd encode")
    }

    pub fn build_chunked(&self, frames: usize) -> Vec<u8> {
        let mut out = self.header_bytes();
        let frames = frames.max(1);
        let chunk = self.payload.len().div_ceil(frames).max(1);
        for (i, part) in self.payload.chunks(chunk).enumerate() {
            out.extend_from_slice(&CHUNK_SENTINEL);
            out.push(i as u8);
            out.extend_from_slice(&zstd::stream::encode_all(part, 0).expect("zstd encode"));
        }
        out
    }
}

/// Decodes a synthetic replay, optionally running the full read.
pub(crate) fn decode(data: &[u8], read: bool) -> RoundReader {
    let mut r = RoundReader::new(data).expect("container/header decode");
    if read {
        r.read().expect("full read");
    }
    r
}
