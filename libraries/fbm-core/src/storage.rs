//! Storage trait for the user table

use crate::types::{FieldChange, User, UserId};
use async_trait::async_trait;

/// User persistence surface consumed by presentation code
///
/// Every method reports failure through its return value alone: an empty
/// vector, `None` or `false`. "Not found" and "backend unavailable" are
/// deliberately indistinguishable here; implementations log the cause.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get all users, in whatever order the backend returns them
    async fn list_all(&self) -> Vec<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: UserId) -> Option<User>;

    /// Insert a new user, returning the stored record with its assigned ID
    ///
    /// Any `id` or `created_at` carried by `user` is ignored.
    async fn create(&self, user: User) -> Option<User>;

    /// Replace every mutable field of the user matching `user.id`
    async fn update(&self, user: User) -> Option<User>;

    /// Change exactly one field of an existing user
    ///
    /// Implementations are allowed to do this as read-then-write, so a
    /// concurrent writer to the same row may be overwritten.
    async fn partial_update(&self, id: UserId, change: FieldChange) -> Option<User>;

    /// Delete a user, returning `true` once the row is confirmed gone
    async fn delete(&self, id: UserId) -> bool;

    /// Liveness probe against the backend
    async fn test_connection(&self) -> bool;

    // ========================================================================
    // Single-field helpers
    // ========================================================================

    /// Change only the name
    async fn update_name(&self, id: UserId, name: String) -> Option<User> {
        self.partial_update(id, FieldChange::Name(name)).await
    }

    /// Change only the login
    async fn update_login(&self, id: UserId, login: String) -> Option<User> {
        self.partial_update(id, FieldChange::Login(login)).await
    }

    /// Change only the password
    async fn update_password(&self, id: UserId, password: String) -> Option<User> {
        self.partial_update(id, FieldChange::Password(password)).await
    }

    /// Change only the age
    async fn update_age(&self, id: UserId, age: i32) -> Option<User> {
        self.partial_update(id, FieldChange::Age(age)).await
    }
}
