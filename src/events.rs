use crate::error::{Error, Result};
use crate::operators::{Operator, Role};
use crate::reader::RoundReader;
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Marker inside a match-feedback record, after the bomb-indicator byte.
pub(crate) const FEEDBACK_MARKER: &[u8] = &[0x00, 0x00, 0x00, 0x22, 0xE3, 0x09, 0x00, 0x79];
/// Trace that the zero-size feedback record really is a kill.
pub(crate) const KILL_INDICATOR: &[u8] = &[0x22, 0xD9, 0x13, 0x3C, 0xBA];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchUpdateType {
    Kill,
    Death,
    DefuserPlantStart,
    DefuserPlantComplete,
    DefuserDisableStart,
    DefuserDisableComplete,
    LocateObjective,
    OperatorSwap,
    Battleye,
    PlayerLeave,
    Other,
}

impl MatchUpdateType {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            MatchUpdateType::Kill => "Kill",
            MatchUpdateType::Death => "Death",
            MatchUpdateType::DefuserPlantStart => "DefuserPlantStart",
            MatchUpdateType::DefuserPlantComplete => "DefuserPlantComplete",
            MatchUpdateType::DefuserDisableStart => "DefuserDisableStart",
            MatchUpdateType::DefuserDisableComplete => "DefuserDisableComplete",
            MatchUpdateType::LocateObjective => "LocateObjective",
            MatchUpdateType::OperatorSwap => "OperatorSwap",
            MatchUpdateType::Battleye => "Battleye",
            MatchUpdateType::PlayerLeave => "PlayerLeave",
            MatchUpdateType::Other => "Other",
        }
    }
}

impl Serialize for MatchUpdateType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MatchUpdateType", 2)?;
        s.serialize_field("name", self.name())?;
        s.serialize_field("id", &self.id())?;
        s.end()
    }
}

/// One entry of the in-match feed: kills, deaths, defuser activity, swaps,
/// kicks, leaves, and free-form messages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(rename = "type")]
    pub kind: MatchUpdateType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headshot: Option<bool>,
    pub time: String,
    pub time_in_seconds: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
}

impl RoundReader {
    /// A feed entry stamped with the current game clock.
    pub(crate) fn update(&self, kind: MatchUpdateType) -> MatchUpdate {
        MatchUpdate {
            kind,
            username: String::new(),
            target: String::new(),
            headshot: None,
            time: self.time_raw.clone(),
            time_in_seconds: self.time,
            message: String::new(),
            operator: None,
        }
    }

    /// Clock tick. Recent versions write the remaining seconds as a u32;
    /// older ones as a string that is either `M:SS` or a bare decimal.
    pub(crate) fn read_clock(&mut self) -> Result<()> {
        if self.profile.binary_clock {
            let seconds = self.payload.u32_le()?;
            self.time = seconds as f64;
            self.time_raw = format!("{}:{:02}", seconds / 60, seconds % 60);
            return Ok(());
        }
        let raw = self.payload.string()?;
        match raw.split_once(':') {
            Some((m, s)) => {
                let minutes: u32 = m
                    .parse()
                    .map_err(|_| Error::decode_field("clock", &raw))?;
                let seconds: u32 = s
                    .parse()
                    .map_err(|_| Error::decode_field("clock", &raw))?;
                self.time = (minutes * 60 + seconds) as f64;
            }
            // esports overlays write the clock as a single number
            None => {
                self.time = raw
                    .parse()
                    .map_err(|_| Error::decode_field("clock", &raw))?;
            }
        }
        self.time_raw = raw;
        Ok(())
    }

    /// Match feedback: either a kill record (size byte zero) or a free-form
    /// message classified by content.
    pub(crate) fn read_match_feedback(&mut self) -> Result<()> {
        // meaning unknown, kept as a read
        let _bomb_indicator = self.payload.int()?;
        self.payload.seek(FEEDBACK_MARKER)?;
        let size = self.payload.int()? as usize;
        if size == 0 {
            return self.read_kill_record();
        }
        let msg = String::from_utf8_lossy(self.payload.bytes(size)?).into_owned();
        let mut kind = MatchUpdateType::Other;
        if msg.contains("bombs") || msg.contains("objective") {
            kind = MatchUpdateType::LocateObjective;
        }
        if msg.contains("BattlEye") {
            kind = MatchUpdateType::Battleye;
        }
        if msg.contains("left") {
            kind = MatchUpdateType::PlayerLeave;
        }
        let mut u = self.update(kind);
        if kind == MatchUpdateType::Other {
            u.message = msg;
        } else {
            u.username = msg.split(' ').next().unwrap_or_default().to_owned();
        }
        debug!("match update: {u:?}");
        self.match_feedback.push(u);
        Ok(())
    }

    fn read_kill_record(&mut self) -> Result<()> {
        let trace = self.payload.bytes(5)?;
        if trace != KILL_INDICATOR {
            debug!("unrecognized zero-size feedback record, skipping");
            return Ok(());
        }
        let username = self.payload.string()?;
        // unexplained run, possibly weapon or kill-type metadata
        self.payload.skip(15)?;
        let target = self.payload.string()?;
        if username.is_empty() && !target.is_empty() {
            let mut u = self.update(MatchUpdateType::Death);
            u.username = target;
            debug!("match update: {u:?}");
            self.match_feedback.push(u);
            return Ok(());
        } else if username.is_empty() {
            return Ok(());
        }
        let mut u = self.update(MatchUpdateType::Kill);
        u.username = username;
        u.target = target;
        self.payload.skip(56)?;
        u.headshot = Some(self.payload.int()? == 1);
        // the stream repeats kill records; keep the first occurrence
        let duplicate = self.match_feedback.iter().any(|v| {
            v.kind == MatchUpdateType::Kill && v.username == u.username && v.target == u.target
        });
        if duplicate {
            debug!("duplicate kill {} -> {}, ignored", u.username, u.target);
            return Ok(());
        }
        debug!("match update: {u:?}");
        self.match_feedback.push(u);
        Ok(())
    }

    /// Defuser timer: emits a plant/disable start for the player holding the
    /// defuser, and a completion once the timer string reaches `0.00`.
    pub(crate) fn read_defuser_timer(&mut self) -> Result<()> {
        let timer = self.payload.string()?;
        self.payload.skip(34)?;
        let id = self.packet_id()?;
        if let Some(i) = self.player_index_by_packet_id(&id) {
            let kind = if self.planted {
                MatchUpdateType::DefuserDisableStart
            } else {
                MatchUpdateType::DefuserPlantStart
            };
            let mut u = self.update(kind);
            u.username = self.header.players[i].username.clone();
            debug!("match update: {u:?}");
            self.match_feedback.push(u);
            self.last_defuser_player = Some(i);
        }
        // a 0.00 timer can show up without an actual completion; preserved
        if !timer.starts_with("0.00") {
            return Ok(());
        }
        let Some(i) = self.last_defuser_player else {
            debug!("defuser timer completed without a preceding start");
            return Ok(());
        };
        let kind = if self.planted {
            MatchUpdateType::DefuserDisableComplete
        } else {
            self.planted = true;
            MatchUpdateType::DefuserPlantComplete
        };
        let mut u = self.update(kind);
        u.username = self.header.players[i].username.clone();
        debug!("match update: {u:?}");
        self.match_feedback.push(u);
        Ok(())
    }

    /// Spawn record. Defender spawns carry a `<br/>` in the location; the
    /// first one with the site flag set names the round's site.
    pub(crate) fn read_spawn(&mut self) -> Result<()> {
        let location = self.payload.string()?;
        self.payload.skip(37)?;
        let flag = self.payload.int()?;
        if !location.contains("<br/>") {
            return Ok(());
        }
        debug!("spawn {location:?} flag {flag}");
        if self.header.site.is_none() && (flag == 1 || flag == 164) {
            let formatted = location.replacen("<br/>", ", ", 1);
            debug!("defense site: {formatted}");
            for p in &mut self.header.players {
                let role = self.header.teams.get(p.team_index).and_then(|t| t.role);
                if role == Some(Role::Defense) {
                    p.spawn = Some(formatted.clone());
                }
            }
            self.header.site = Some(formatted);
        }
        Ok(())
    }
}
