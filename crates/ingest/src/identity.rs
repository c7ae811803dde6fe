//! Identity — username bindings and player records.
//!
//! The authenticator announces `name → uuid` before a player joins. Later
//! lines (join, leave, chat, death) only carry the display name, so the
//! binding is what turns them back into a stable identity. Bindings are
//! overwritten, never merged: a name reused by another account resolves to
//! its most recent owner.

use std::collections::HashMap;

use crate::ingest::IngestError;
use crate::store::{Player, Store};

/// Per-run name bindings plus create-or-update of player records.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    bindings: HashMap<String, String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `uuid` and make sure the player record reflects it.
    ///
    /// A new uuid creates a player with an empty history. A known uuid under
    /// a different name moves the old name into history. Repeating the same
    /// pair changes nothing.
    pub fn resolve_or_create<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
        uuid: &str,
    ) -> Result<Player, IngestError> {
        self.bindings.insert(name.to_string(), uuid.to_string());

        match store.player_by_uuid(uuid)? {
            None => {
                let player = store.insert_player(uuid, name)?;
                tracing::debug!(player = %name, uuid = %uuid, "New player");
                Ok(player)
            }
            Some(mut player) => {
                if player.rename(name) {
                    tracing::debug!(
                        player = %name,
                        previous = ?player.past_usernames.last(),
                        uuid = %uuid,
                        "Player changed name"
                    );
                    store.update_player_names(&player)?;
                }
                Ok(player)
            }
        }
    }

    /// The uuid currently bound to `name`.
    pub fn uuid_for(&self, name: &str) -> Result<&str, IngestError> {
        self.bindings
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| IngestError::UnknownPlayer(name.to_string()))
    }

    pub fn lookup_by_uuid<S: Store + ?Sized>(
        &self,
        store: &S,
        uuid: &str,
    ) -> Result<Player, IngestError> {
        store
            .player_by_uuid(uuid)?
            .ok_or_else(|| IngestError::UnknownPlayer(uuid.to_string()))
    }

    /// Resolve a display name through this run's bindings.
    pub fn lookup_by_current_name<S: Store + ?Sized>(
        &self,
        store: &S,
        name: &str,
    ) -> Result<Player, IngestError> {
        let uuid = self.uuid_for(name)?;
        self.lookup_by_uuid(store, uuid)
    }
}
