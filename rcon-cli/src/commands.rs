use eyre::Context;
use rcon_client::{Rcon, RconCommands};

use crate::config::Command;

/// Runs `command` against `client` and prints whatever it returns.
pub async fn run(client: &Rcon, command: Command) -> eyre::Result<()> {
    match command {
        Command::GetPlayers => {
            let players = client.get_players().await.context("GetPlayers")?;
            println!("{}", serde_json::to_string_pretty(&players)?);
        }
        Command::GetPlayer { player_id } => {
            let player = client.get_player(&player_id).await.context("GetPlayer")?;
            println!("{}", serde_json::to_string_pretty(&player)?);
        }
        Command::GetServerConfig => {
            let config = client.get_server_config().await.context("GetServerConfig")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::GetCommandDetails { command } => {
            let details = client.get_command_details(&command).await.context("GetCommandDetails")?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::ChangeMap { map_name } => {
            client.change_map(&map_name).await.context("ChangeMap")?;
        }
        Command::Broadcast { message } => {
            client.broadcast(&message).await.context("ServerBroadcast")?;
        }
        Command::Kick { player_id, reason } => {
            client.kick_player(&player_id, &reason).await.context("Kick")?;
        }
        Command::Ban {
            player_id,
            reason,
            admin_name,
            duration_hours,
        } => {
            client
                .ban_player(&player_id, &reason, &admin_name, duration_hours)
                .await
                .context("Ban")?;
        }
        Command::RemoveBan { player_id } => {
            client.remove_ban(&player_id).await.context("RemoveBan")?;
        }
        Command::Execute { command, version, body } => {
            let reply = client.execute(&command, version, body).await.context("Execute")?;
            println!("{reply}");
        }
    }

    Ok(())
}
