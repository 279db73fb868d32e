use crate::error::{Error, Result};
use crate::operators::{Operator, Role};
use crate::payload::Payload;
use chrono::NaiveDateTime;
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::mem::take;

/// Seven zero bytes between the length prefix and the content of every
/// header string.
const STRING_SEPARATOR: [u8; 7] = [0; 7];

/// Round metadata parsed from the key/value property stream at the start of
/// a replay, plus the fields that event parsers fill in while reading the
/// payload (site, operators, team roles, outcome).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub game_version: String,
    pub code_version: u32,
    pub timestamp: NaiveDateTime,
    pub match_type: MatchType,
    pub map: Map,
    #[serde(rename = "recordingPlayerID")]
    pub recording_player_id: u64,
    #[serde(rename = "recordingProfileID")]
    pub recording_profile_id: String,
    pub additional_tags: String,
    #[serde(rename = "gamemode")]
    pub game_mode: GameMode,
    pub rounds_per_match: u32,
    pub rounds_per_match_overtime: u32,
    pub round_number: u32,
    pub overtime_round_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub teams: [Team; 2],
    pub players: Vec<Player>,
    pub gm_settings: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_category: Option<u32>,
    #[serde(rename = "matchID")]
    pub match_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    pub score: u32,
    pub won: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_condition: Option<WinCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u64,
    #[serde(rename = "profileID")]
    pub profile_id: String,
    pub username: String,
    pub team_index: usize,
    pub operator: Operator,
    pub hero_name: u64,
    pub alliance: u64,
    pub role_image: u64,
    pub role_name: String,
    pub role_portrait: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn: Option<String>,
    /// Opaque in-replay identifier, the join key for event payloads.
    #[serde(skip)]
    pub(crate) packet_id: Option<[u8; 4]>,
}

/// How the round ended for the winning team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WinCondition {
    KilledOpponents,
    SecuredArea,
    DisabledDefuser,
    DefusedBomb,
    ExtractedHostage,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchType(pub u32);

impl MatchType {
    pub const QUICK_MATCH: MatchType = MatchType(1);
    pub const RANKED: MatchType = MatchType(2);
    pub const CUSTOM_GAME_LOCAL: MatchType = MatchType(7);
    pub const CUSTOM_GAME_ONLINE: MatchType = MatchType(8);
    pub const UNRANKED: MatchType = MatchType(12);

    pub fn name(self) -> String {
        match self {
            MatchType::QUICK_MATCH => "QuickMatch".into(),
            MatchType::RANKED => "Ranked".into(),
            MatchType::CUSTOM_GAME_LOCAL => "CustomGameLocal".into(),
            MatchType::CUSTOM_GAME_ONLINE => "CustomGameOnline".into(),
            MatchType::UNRANKED => "Unranked".into(),
            MatchType(other) => format!("MatchType({other})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMode(pub u32);

impl GameMode {
    pub const BOMB: GameMode = GameMode(327933806);
    pub const SECURE_AREA: GameMode = GameMode(1983085217);
    pub const HOSTAGE: GameMode = GameMode(2838806006);

    pub fn name(self) -> String {
        match self {
            GameMode::BOMB => "Bomb".into(),
            GameMode::SECURE_AREA => "SecureArea".into(),
            GameMode::HOSTAGE => "Hostage".into(),
            GameMode(other) => format!("GameMode({other})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Map(pub u64);

impl Map {
    pub const CLUB_HOUSE: Map = Map(837214085);
    pub const KAFE_DOSTOYEVSKY: Map = Map(1378191338);
    pub const KANAL: Map = Map(1460220617);
    pub const YACHT: Map = Map(1767965020);
    pub const PRESIDENTIAL_PLANE: Map = Map(2609218856);
    pub const CONSULATE: Map = Map(2609221242);
    pub const BARTLETT_U: Map = Map(2697268122);
    pub const COASTLINE: Map = Map(42090092951);
    pub const TOWER: Map = Map(53627213396);
    pub const VILLA: Map = Map(88107330328);
    pub const FORTRESS: Map = Map(126196841359);
    pub const HEREFORD_BASE: Map = Map(127951053400);
    pub const THEME_PARK: Map = Map(199824623654);
    pub const OREGON: Map = Map(231702797556);
    pub const HOUSE: Map = Map(237873412352);
    pub const CHALET: Map = Map(259816839773);
    pub const STADIUM_BRAVO: Map = Map(270063334510);
    pub const SKYSCRAPER: Map = Map(276279025182);
    pub const BORDER: Map = Map(305979357167);
    pub const FAVELA: Map = Map(329867321446);
    pub const BANK: Map = Map(355496559878);
    pub const OUTBACK: Map = Map(362605108559);
    pub const EMERALD_PLAINS: Map = Map(365284490964);
    pub const NIGHTHAVEN_LABS: Map = Map(378595635123);

    pub fn name(self) -> String {
        match self {
            Map::CLUB_HOUSE => "ClubHouse".into(),
            Map::KAFE_DOSTOYEVSKY => "KafeDostoyevsky".into(),
            Map::KANAL => "Kanal".into(),
            Map::YACHT => "Yacht".into(),
            Map::PRESIDENTIAL_PLANE => "PresidentialPlane".into(),
            Map::CONSULATE => "Consulate".into(),
            Map::BARTLETT_U => "BartlettU".into(),
            Map::COASTLINE => "Coastline".into(),
            Map::TOWER => "Tower".into(),
            Map::VILLA => "Villa".into(),
            Map::FORTRESS => "Fortress".into(),
            Map::HEREFORD_BASE => "HerefordBase".into(),
            Map::THEME_PARK => "ThemePark".into(),
            Map::OREGON => "Oregon".into(),
            Map::HOUSE => "House".into(),
            Map::CHALET => "Chalet".into(),
            Map::STADIUM_BRAVO => "StadiumBravo".into(),
            Map::SKYSCRAPER => "Skyscraper".into(),
            Map::BORDER => "Border".into(),
            Map::FAVELA => "Favela".into(),
            Map::BANK => "Bank".into(),
            Map::OUTBACK => "Outback".into(),
            Map::EMERALD_PLAINS => "EmeraldPlains".into(),
            Map::NIGHTHAVEN_LABS => "NighthavenLabs".into(),
            Map(other) => format!("Map({other})"),
        }
    }
}

macro_rules! serialize_tagged_id {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut s = serializer.serialize_struct(stringify!($ty), 2)?;
                s.serialize_field("name", &self.name())?;
                s.serialize_field("id", &self.0)?;
                s.end()
            }
        }
    };
}

serialize_tagged_id!(MatchType);
serialize_tagged_id!(GameMode);
serialize_tagged_id!(Map);

impl Header {
    /// The roster entry of the player who recorded this replay, if present.
    pub fn recording_player(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.id == self.recording_player_id)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recording = self
            .recording_player()
            .map(|p| p.username.as_str())
            .unwrap_or("UNKNOWN");
        writeln!(f, "Version:          {}/{}", self.game_version, self.code_version)?;
        writeln!(f, "Recording Player: {} [{}]", recording, self.recording_player_id)?;
        writeln!(f, "Match ID:         {}", self.match_id)?;
        writeln!(f, "Timestamp:        {}", self.timestamp)?;
        writeln!(f, "Match Type:       {}", self.match_type.name())?;
        writeln!(f, "Game Mode:        {}", self.game_mode.name())?;
        writeln!(f, "Map:              {}", self.map.name())?;
        Ok(())
    }
}

/// Validates the `dissect` magic and consumes the opaque version preamble,
/// which ends after the second separated run of seven zero bytes.
pub(crate) fn read_magic(cur: &mut Payload) -> Result<()> {
    let magic = cur.bytes(7).map_err(|_| Error::InvalidFile)?;
    if magic != b"dissect" {
        return Err(Error::InvalidFile);
    }
    let mut zeros = 0;
    let mut runs = 0;
    while runs != 2 {
        let b = cur.int().map_err(|_| Error::InvalidFile)?;
        if b == 0x00 {
            if zeros != 6 {
                zeros += 1;
            } else {
                zeros = 0;
                runs += 1;
            }
        } else if zeros > 0 {
            zeros = 0;
        }
    }
    Ok(())
}

fn read_header_string(cur: &mut Payload) -> Result<String> {
    let len = cur.int()? as usize;
    let sep = cur.bytes(7)?;
    if sep != STRING_SEPARATOR {
        return Err(Error::InvalidStringSeparator);
    }
    let b = cur.bytes(len)?;
    Ok(String::from_utf8_lossy(b).into_owned())
}

fn num<T: std::str::FromStr>(props: &HashMap<String, String>, key: &'static str) -> Result<T> {
    let v = props.get(key).map(String::as_str).unwrap_or("");
    v.parse().map_err(|_| Error::decode_field(key, v))
}

fn field<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::decode_field(key, value))
}

/// Decodes the key/value property stream. Player blocks open at `playerid`
/// and close at `playlistcategory` or `id`; the loop runs until `teamscore1`
/// has been seen.
pub(crate) fn read_header(cur: &mut Payload) -> Result<Header> {
    let mut props: HashMap<String, String> = HashMap::new();
    let mut gm_settings: Vec<i64> = Vec::new();
    let mut players: Vec<Player> = Vec::new();
    let mut current = Player::default();
    let mut in_player = false;

    loop {
        let k = read_header_string(cur)?;
        let v = read_header_string(cur)?;
        if k == "playerid" {
            if in_player {
                players.push(take(&mut current));
            }
            in_player = true;
            current = Player::default();
        }
        if (k == "playlistcategory" || k == "id") && in_player {
            players.push(take(&mut current));
            in_player = false;
        }
        if !in_player {
            if k == "gmsetting" {
                gm_settings.push(field("gmsetting", &v)?);
            } else {
                props.insert(k, v);
            }
        } else {
            match k.as_str() {
                "playerid" => current.id = field("playerid", &v)?,
                "playername" => current.username = v,
                "team" => current.team_index = field("team", &v)?,
                "heroname" => current.hero_name = field("heroname", &v)?,
                "alliance" => current.alliance = field("alliance", &v)?,
                "roleimage" => current.role_image = field("roleimage", &v)?,
                "rolename" => current.role_name = v,
                "roleportrait" => current.role_portrait = field("roleportrait", &v)?,
                _ => {}
            }
        }
        if props.contains_key("teamscore1") {
            break;
        }
    }

    let datetime = props.get("datetime").map(String::as_str).unwrap_or("");
    let timestamp = NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d-%H-%M-%S")
        .map_err(|_| Error::decode_field("datetime", datetime))?;

    let playlist_category = match props.get("playlistcategory") {
        Some(v) if !v.is_empty() => match v.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                debug!("omitting unparseable playlistcategory {v:?}");
                None
            }
        },
        _ => None,
    };

    Ok(Header {
        game_version: props.get("version").cloned().unwrap_or_default(),
        code_version: num(&props, "code")?,
        timestamp,
        match_type: MatchType(num(&props, "matchtype")?),
        map: Map(num(&props, "worldid")?),
        recording_player_id: num(&props, "recordingplayerid")?,
        recording_profile_id: props.get("recordingprofileid").cloned().unwrap_or_default(),
        additional_tags: props.get("additionaltags").cloned().unwrap_or_default(),
        game_mode: GameMode(num(&props, "gamemodeid")?),
        rounds_per_match: num(&props, "roundspermatch")?,
        rounds_per_match_overtime: num(&props, "roundspermatchovertime")?,
        round_number: num(&props, "roundnumber")?,
        overtime_round_number: num(&props, "overtimeroundnumber")?,
        site: None,
        teams: [
            Team {
                name: props.get("teamname0").cloned().unwrap_or_default(),
                score: num(&props, "teamscore0")?,
                ..Team::default()
            },
            Team {
                name: props.get("teamname1").cloned().unwrap_or_default(),
                score: num(&props, "teamscore1")?,
                ..Team::default()
            },
        ],
        players,
        gm_settings,
        playlist_category,
        match_id: props.get("id").cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(out: &mut Vec<u8>, k: &str, v: &str) {
        for s in [k, v] {
            out.push(s.len() as u8);
            out.extend_from_slice(&STRING_SEPARATOR);
            out.extend_from_slice(s.as_bytes());
        }
    }

    fn base_props(out: &mut Vec<u8>) {
        prop(out, "version", "Y8S1");
        prop(out, "code", "7408213");
        prop(out, "datetime", "2023-04-02-21-14-05");
        prop(out, "matchtype", "2");
        prop(out, "worldid", "837214085");
        prop(out, "recordingplayerid", "42");
        prop(out, "recordingprofileid", "abc-def");
        prop(out, "additionaltags", "");
        prop(out, "gamemodeid", "327933806");
        prop(out, "roundspermatch", "6");
        prop(out, "roundspermatchovertime", "3");
        prop(out, "roundnumber", "1");
        prop(out, "overtimeroundnumber", "0");
        prop(out, "teamname0", "YELLOW");
        prop(out, "teamname1", "BLUE");
        prop(out, "gmsetting", "180");
        prop(out, "gmsetting", "-1");
    }

    #[test]
    fn decodes_properties_and_players() {
        let mut bytes = Vec::new();
        base_props(&mut bytes);
        prop(&mut bytes, "playerid", "100");
        prop(&mut bytes, "playername", "one");
        prop(&mut bytes, "team", "0");
        prop(&mut bytes, "heroname", "92270642682");
        prop(&mut bytes, "playerid", "101");
        prop(&mut bytes, "playername", "two");
        prop(&mut bytes, "team", "1");
        prop(&mut bytes, "playlistcategory", "27");
        prop(&mut bytes, "id", "match-1");
        prop(&mut bytes, "teamscore0", "4");
        prop(&mut bytes, "teamscore1", "3");

        let mut cur = Payload::new(bytes);
        let h = read_header(&mut cur).unwrap();
        assert_eq!(h.game_version, "Y8S1");
        assert_eq!(h.code_version, 7408213);
        assert_eq!(h.match_type, MatchType::RANKED);
        assert_eq!(h.map, Map::CLUB_HOUSE);
        assert_eq!(h.game_mode, GameMode::BOMB);
        assert_eq!(h.teams[0].name, "YELLOW");
        assert_eq!(h.teams[0].score, 4);
        assert_eq!(h.teams[1].score, 3);
        assert_eq!(h.gm_settings, vec![180, -1]);
        assert_eq!(h.playlist_category, Some(27));
        assert_eq!(h.match_id, "match-1");
        assert_eq!(h.players.len(), 2);
        assert_eq!(h.players[0].username, "one");
        assert_eq!(h.players[0].id, 100);
        assert_eq!(h.players[1].team_index, 1);
    }

    #[test]
    fn bad_separator_is_rejected() {
        let mut bytes = vec![0x03];
        bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0]);
        bytes.extend_from_slice(b"abc");
        let mut cur = Payload::new(bytes);
        assert!(matches!(
            read_header(&mut cur),
            Err(Error::InvalidStringSeparator)
        ));
    }

    #[test]
    fn bad_numeric_field_is_a_decode_error() {
        let mut bytes = Vec::new();
        prop(&mut bytes, "code", "not-a-number");
        prop(&mut bytes, "datetime", "2023-04-02-21-14-05");
        prop(&mut bytes, "teamscore0", "0");
        prop(&mut bytes, "teamscore1", "0");
        let mut cur = Payload::new(bytes);
        assert!(matches!(
            read_header(&mut cur),
            Err(Error::DecodeField { field: "code", .. })
        ));
    }

    #[test]
    fn magic_state_machine_stops_after_two_zero_runs() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"dissect");
        bytes.extend_from_slice(&[0x05, 0x00, 0x00, 0x09]);
        bytes.extend_from_slice(&[0x00; 7]);
        bytes.push(0x33);
        bytes.extend_from_slice(&[0x00; 7]);
        bytes.push(0xEE); // first byte after the preamble
        let mut cur = Payload::new(bytes);
        read_magic(&mut cur).unwrap();
        assert_eq!(cur.int().unwrap(), 0xEE);
    }

    #[test]
    fn missing_magic_is_invalid() {
        let mut cur = Payload::new(b"not a replay".to_vec());
        assert!(matches!(read_magic(&mut cur), Err(Error::InvalidFile)));
    }
}
