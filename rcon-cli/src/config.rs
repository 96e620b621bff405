use std::time::Duration;

use clap::{Parser, Subcommand};

/// Sends a single command to a Hell Let Loose RCON server and prints its
/// response.
///
/// Every option can also be set via its matching environment variable,
/// which is the more convenient way to keep `RCON_PASSWORD` out of your
/// shell history.
#[derive(Parser, Debug)]
pub struct CliConfig {
    /// The RCON server's hostname or IP address.
    #[clap(long, env = "RCON_HOST")]
    pub host: String,

    /// The RCON server's port.
    #[clap(long, env = "RCON_PORT", default_value = "9501")]
    pub port: u16,

    /// The RCON password.
    #[clap(long, env = "RCON_PASSWORD")]
    pub password: String,

    /// How long to wait for a response before giving up.
    #[clap(long, env = "RCON_TIMEOUT", default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lists every connected player.
    GetPlayers,
    /// Shows details for a single connected player.
    GetPlayer {
        /// The player's platform ID.
        player_id: String,
    },
    /// Shows the server's current configuration.
    GetServerConfig,
    /// Shows the parameter schema for a command.
    GetCommandDetails {
        /// The command's name, as the server knows it (e.g. `AddAdmin`).
        command: String,
    },
    /// Switches the currently active map.
    ChangeMap {
        /// The map's identifier.
        map_name: String,
    },
    /// Broadcasts a banner message to every connected player.
    Broadcast {
        /// The message to display.
        message: String,
    },
    /// Disconnects a player from the server.
    Kick {
        /// The player's platform ID.
        player_id: String,
        /// Shown to the player as the kick reason.
        reason: String,
    },
    /// Bans a player, temporarily or permanently.
    Ban {
        /// The player's platform ID.
        player_id: String,
        /// Shown to the player as the ban reason.
        reason: String,
        /// Recorded as the banning admin's name.
        #[clap(long, default_value = "rcon-cli")]
        admin_name: String,
        /// Ban duration in hours. Omit for a permanent ban.
        #[clap(long)]
        duration_hours: Option<u32>,
    },
    /// Lifts any ban, temporary or permanent, on a player.
    RemoveBan {
        /// The player's platform ID.
        player_id: String,
    },
    /// Sends a raw command and prints its content body verbatim.
    Execute {
        /// The command name, as the server knows it.
        command: String,
        /// The command's protocol version.
        #[clap(long, default_value = "2")]
        version: u32,
        /// The content body, sent as-is (use `{...}` for a structured body).
        #[clap(default_value = "")]
        body: String,
    },
}
