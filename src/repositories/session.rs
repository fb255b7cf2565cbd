//! Session repository for database operations.

use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, EntityTrait};

use crate::entities::session::{self, SESSION_ROW_ID};
use crate::error::Result;

/// Repository for the session singleton.
pub struct SessionRepository;

impl SessionRepository {
    /// Get the current session, if any.
    pub async fn current<C>(conn: &C) -> Result<Option<session::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(session::Entity::find_by_id(SESSION_ROW_ID).one(conn).await?)
    }

    /// Replace the session row with a new one.
    pub async fn replace<C>(
        conn: &C,
        identity: &str,
        display_name: &str,
        location_label: &str,
        logged_in_at: &str,
        last_sync_at: &str,
    ) -> Result<session::Model>
    where
        C: ConnectionTrait,
    {
        session::Entity::delete_many().exec(conn).await?;
        let row = session::ActiveModel {
            id: ActiveValue::Set(SESSION_ROW_ID),
            identity: ActiveValue::Set(identity.to_string()),
            display_name: ActiveValue::Set(display_name.to_string()),
            location_label: ActiveValue::Set(location_label.to_string()),
            logged_in_at: ActiveValue::Set(logged_in_at.to_string()),
            last_sync_at: ActiveValue::Set(last_sync_at.to_string()),
        };
        Ok(row.insert(conn).await?)
    }

    /// Delete the session.
    pub async fn delete<C>(conn: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        session::Entity::delete_many().exec(conn).await?;
        Ok(())
    }
}
