//! The game commands built on top of the raw `execute` primitive.
//!
//! This is a representative slice of the full RCON command surface, not an
//! exhaustive one: enough commands to exercise every shape the protocol
//! supports (fire-and-forget, structured request bodies, structured
//! response bodies, and the one command pair with genuinely ambiguous
//! fan-out semantics) without this module becoming a command-name
//! directory.

use rcon_types::RconBody;

use crate::{
    error::RconError,
    responses::{GetCommandDetailsResponse, GetPlayerResponse, GetPlayersResponse, GetServerConfigResponse},
};

fn parse_json<T: serde::de::DeserializeOwned>(body: String) -> Result<T, RconError> {
    serde_json::from_str(&body).map_err(|e| RconError::Message(format!("unexpected response shape: {e}")))
}

/// The game commands a connected RCON client can run.
///
/// Implemented by [`crate::connection::RconConnection`], [`crate::client::Rcon`]
/// and [`crate::pool::RconPool`] on top of their own `execute`.
#[allow(async_fn_in_trait)]
pub trait RconCommands {
    /// Sends a raw command and returns its content body. Every other
    /// method on this trait is built on top of this one.
    async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError>;

    /// Grants `admin_group` permissions to `player_id`.
    async fn add_admin(&self, player_id: &str, admin_group: &str, comment: &str) -> Result<(), RconError> {
        self.execute(
            "AddAdmin",
            2,
            serde_json::json!({"PlayerId": player_id, "AdminGroup": admin_group, "Comment": comment}),
        )
        .await?;
        Ok(())
    }

    /// Revokes `player_id`'s admin permissions.
    async fn remove_admin(&self, player_id: &str) -> Result<(), RconError> {
        self.execute("RemoveAdmin", 2, serde_json::json!({"PlayerId": player_id}))
            .await?;
        Ok(())
    }

    /// Switches the server to `map_name` immediately.
    async fn change_map(&self, map_name: &str) -> Result<(), RconError> {
        self.execute("ChangeMap", 2, serde_json::json!({"MapName": map_name}))
            .await?;
        Ok(())
    }

    /// Broadcasts `message` as a banner visible to all players.
    async fn broadcast(&self, message: &str) -> Result<(), RconError> {
        self.execute("ServerBroadcast", 2, serde_json::json!({"Message": message}))
            .await?;
        Ok(())
    }

    /// Sends `message` as a chat message to every connected player.
    async fn message_all_players(&self, message: &str) -> Result<(), RconError> {
        self.execute("SendServerMessage", 2, serde_json::json!({"Message": message}))
            .await?;
        Ok(())
    }

    /// Sends `message` as a chat message to a single player.
    async fn message_player(&self, player_id: &str, message: &str) -> Result<(), RconError> {
        self.execute(
            "SendServerMessage",
            2,
            serde_json::json!({"Message": message, "PlayerId": player_id}),
        )
        .await?;
        Ok(())
    }

    /// Immediately disconnects `player_id`, showing them `message`.
    async fn kick_player(&self, player_id: &str, message: &str) -> Result<(), RconError> {
        self.execute(
            "Kick",
            2,
            serde_json::json!({"PlayerId": player_id, "Reason": message}),
        )
        .await?;
        Ok(())
    }

    /// Fetches every connected player.
    async fn get_players(&self) -> Result<GetPlayersResponse, RconError> {
        let body = self
            .execute("ServerInformation", 2, serde_json::json!({"Name": "players", "Value": ""}))
            .await?;
        parse_json(body)
    }

    /// Fetches a single connected player by ID.
    async fn get_player(&self, player_id: &str) -> Result<GetPlayerResponse, RconError> {
        let body = self
            .execute(
                "ServerInformation",
                2,
                serde_json::json!({"Name": "player", "Value": player_id}),
            )
            .await?;
        parse_json(body)
    }

    /// Fetches the server's current configuration.
    async fn get_server_config(&self) -> Result<GetServerConfigResponse, RconError> {
        let body = self
            .execute(
                "ServerInformation",
                2,
                serde_json::json!({"Name": "serverconfig", "Value": ""}),
            )
            .await?;
        parse_json(body)
    }

    /// Fetches the parameter schema for `command`.
    async fn get_command_details(&self, command: &str) -> Result<GetCommandDetailsResponse, RconError> {
        let body = self.execute("ClientReferenceData", 2, command).await?;
        parse_json(body)
    }

    /// Bans `player_id`, either temporarily (`duration_hours` is `Some`)
    /// or permanently.
    async fn ban_player(
        &self,
        player_id: &str,
        reason: &str,
        admin_name: &str,
        duration_hours: Option<u32>,
    ) -> Result<(), RconError> {
        match duration_hours {
            Some(hours) => {
                self.execute(
                    "TemporaryBan",
                    2,
                    serde_json::json!({
                        "PlayerId": player_id,
                        "Duration": hours,
                        "Reason": reason,
                        "AdminName": admin_name,
                    }),
                )
                .await?;
            }
            None => {
                self.execute(
                    "PermanentBan",
                    2,
                    serde_json::json!({
                        "PlayerId": player_id,
                        "Reason": reason,
                        "AdminName": admin_name,
                    }),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Lifts a temporary ban on `player_id`. A no-op if none exists.
    async fn remove_temp_ban(&self, player_id: &str) -> Result<(), RconError> {
        self.execute("RemoveTempBan", 2, serde_json::json!({"PlayerId": player_id}))
            .await?;
        Ok(())
    }

    /// Lifts a permanent ban on `player_id`. A no-op if none exists.
    async fn remove_permanent_ban(&self, player_id: &str) -> Result<(), RconError> {
        self.execute("RemovePermanentBan", 2, serde_json::json!({"PlayerId": player_id}))
            .await?;
        Ok(())
    }

    /// Lifts any ban on `player_id`, temporary or permanent.
    ///
    /// The server has no single "unban" command, and no way to ask
    /// whether a given ban is temporary or permanent ahead of time, so
    /// this runs both removal commands concurrently. One of them will
    /// typically no-op against a ban that was never there; if either
    /// fails, the other is still given a chance to complete, and the
    /// first error is returned.
    async fn remove_ban(&self, player_id: &str) -> Result<(), RconError> {
        tokio::try_join!(self.remove_temp_ban(player_id), self.remove_permanent_ban(player_id))?;
        Ok(())
    }
}
