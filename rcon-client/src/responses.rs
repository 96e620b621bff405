//! Typed shapes for the handful of commands whose `contentBody` is
//! structured JSON worth parsing, rather than an opaque string.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// The platform a player connected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPlatform {
    /// Valve's Steam platform.
    #[serde(rename = "steam")]
    Steam,
    /// The Epic Games Store / Epic Online Services.
    #[serde(rename = "epic")]
    Epic,
    /// Xbox Live.
    #[serde(rename = "xbl")]
    Xbox,
}

/// A player's current team assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PlayerTeam {
    /// German faction.
    Ger = 0,
    /// United States faction.
    Us = 1,
    /// Soviet faction.
    Rus = 2,
    /// Great Britain faction.
    Gb = 3,
    /// Deutsches Afrikakorps faction.
    Dak = 4,
    /// British Eighth Army faction.
    B8a = 5,
    /// Not yet assigned to a team.
    Unassigned = 6,
}

/// A player's current role (class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PlayerRole {
    /// Rifleman.
    Rifleman = 0,
    /// Assault.
    Assault = 1,
    /// Automatic rifleman.
    AutomaticRifleman = 2,
    /// Medic.
    Medic = 3,
    /// Spotter.
    Spotter = 4,
    /// Support.
    Support = 5,
    /// Heavy machine gunner.
    HeavyMachineGunner = 6,
    /// Anti-tank.
    AntiTank = 7,
    /// Engineer.
    Engineer = 8,
    /// Officer.
    Officer = 9,
    /// Sniper.
    Sniper = 10,
    /// Crewman.
    Crewman = 11,
    /// Tank commander.
    TankCommander = 12,
    /// Army commander.
    ArmyCommander = 13,
}

/// A player's scoring breakdown, as returned within [`GetPlayerResponse`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerScoreData {
    /// Combat score.
    #[serde(rename = "cOMBAT")]
    pub combat: i64,
    /// Offense score.
    pub offense: i64,
    /// Defense score.
    pub defense: i64,
    /// Support score.
    pub support: i64,
}

/// A player's in-world position, in centimeters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerWorldPosition {
    /// East-west axis, between -100000 and 100000.
    pub x: f64,
    /// North-south axis, between -100000 and 100000.
    pub y: f64,
    /// Vertical axis.
    pub z: f64,
}

/// The structured response to [`crate::commands::RconCommands::get_player`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPlayerResponse {
    /// The player's display name.
    pub name: String,
    /// The player's clan tag, or empty if none.
    #[serde(rename = "clanTag")]
    pub clan_tag: String,
    /// The player's platform identifier.
    #[serde(rename = "iD")]
    pub id: String,
    /// The platform the player connected from.
    pub platform: PlayerPlatform,
    /// The player's Epic Online Services ID.
    #[serde(rename = "eosId")]
    pub eos_id: String,
    /// The player's level.
    pub level: u32,
    /// The player's current team.
    pub team: PlayerTeam,
    /// The player's current role.
    pub role: PlayerRole,
    /// The name of the player's squad, or empty if unassigned.
    pub platoon: String,
    /// The player's current loadout.
    pub loadout: String,
    /// The player's kill count this session.
    pub kills: u32,
    /// The player's death count this session.
    pub deaths: u32,
    /// The player's scoring breakdown.
    #[serde(rename = "scoreData")]
    pub score_data: PlayerScoreData,
    /// The player's position in the world.
    #[serde(rename = "worldPosition")]
    pub world_position: PlayerWorldPosition,
}

/// The structured response to [`crate::commands::RconCommands::get_players`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPlayersResponse {
    /// The currently connected players.
    pub players: Vec<GetPlayerResponse>,
}

/// A platform the server reports support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportedPlatform {
    /// Valve's Steam platform.
    Steam,
    /// Windows via the Microsoft Store / Xbox Game Pass.
    #[serde(rename = "WinGDK")]
    WinGdk,
    /// The Epic Games Store / Epic Online Services.
    #[serde(rename = "eos")]
    Epic,
}

/// The structured response to
/// [`crate::commands::RconCommands::get_server_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetServerConfigResponse {
    /// The server's display name.
    #[serde(rename = "serverName")]
    pub server_name: String,
    /// The running game build number.
    #[serde(rename = "buildNumber")]
    pub build_number: String,
    /// The running game build's source control revision.
    #[serde(rename = "buildRevision")]
    pub build_revision: String,
    /// The platforms the server accepts connections from.
    #[serde(rename = "supportedPlatforms")]
    pub supported_platforms: Vec<SupportedPlatform>,
    /// Whether a password is required to join.
    #[serde(rename = "passwordProtected")]
    pub password_protected: bool,
}

/// The structured response to
/// [`crate::commands::RconCommands::get_command_details`].
///
/// The server's parameter shapes vary per command (combo box, free text, or
/// number), so `dialogue_parameters` is left as raw JSON for the caller to
/// interpret rather than modeled as a closed set of variants here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCommandDetailsResponse {
    /// The command's identifier, as passed to `get_command_details`.
    pub name: String,
    /// A user-friendly name for the command.
    pub text: String,
    /// A human-readable description of what the command does.
    pub description: String,
    /// The command's declared parameters, in server-defined JSON shape.
    #[serde(rename = "dialogueParameters")]
    pub dialogue_parameters: serde_json::Value,
}
