//! Command runner
//!
//! Every gateway sentinel (`None`, `false`, empty) that means "the operation
//! did not happen" becomes an error here, so the binary exits non-zero.

use crate::cli::Command;
use anyhow::{anyhow, bail, Context, Result};
use fbm_core::{User, UserStore};
use serde_json::{json, Value};

/// Run one command against a store and return its JSON report.
pub async fn execute(store: &dyn UserStore, command: Command) -> Result<Value> {
    match command {
        Command::Check => {
            if !store.test_connection().await {
                bail!("User table is not reachable");
            }
            Ok(json!({ "status": "ok" }))
        }

        Command::List => {
            let users = store.list_all().await;
            tracing::info!(count = users.len(), "Listed users");
            Ok(serde_json::to_value(users)?)
        }

        Command::Get { id } => {
            let user = store
                .get_by_id(id)
                .await
                .ok_or_else(|| anyhow!("User {} not found", id))?;
            Ok(serde_json::to_value(user)?)
        }

        Command::Create {
            name,
            login,
            password,
            age,
        } => {
            let user = store
                .create(User::new(name, login, password, age))
                .await
                .context("User was not created")?;
            tracing::info!(id = user.id, "Created user");
            Ok(serde_json::to_value(user)?)
        }

        Command::Update {
            id,
            name,
            login,
            password,
            age,
        } => {
            let mut replacement = User::new(name, login, password, age);
            replacement.id = id;

            let user = store
                .update(replacement)
                .await
                .ok_or_else(|| anyhow!("User {} was not updated", id))?;
            Ok(serde_json::to_value(user)?)
        }

        Command::Set { id, field, value } => {
            let change = field.parse_change(&value)?;
            let user = store
                .partial_update(id, change)
                .await
                .ok_or_else(|| anyhow!("Field {} of user {} was not updated", field, id))?;
            Ok(serde_json::to_value(user)?)
        }

        Command::Delete { id } => {
            if !store.delete(id).await {
                bail!("User {} was not deleted", id);
            }
            tracing::info!(id, "Deleted user");
            Ok(json!({ "deleted": id }))
        }
    }
}
