//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the SQL migrations exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// User accounts table.
    ///
    /// The `id` column is the primary key (UUID v4, generated per row at
    /// insert). `username` and `email` carry unique constraints.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique account name.
        username -> Varchar,
        /// Password value, stored as provided.
        password -> Varchar,
        /// Unique email address.
        email -> Varchar,
        /// Subscription role, stored as its lowercase string value.
        role -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Profiles table, one row per user.
    ///
    /// `user_id` is unique and references `users(id)` with `ON DELETE
    /// CASCADE`, so removing a user removes its profile.
    profiles (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user; unique, cascades on user deletion.
        user_id -> Uuid,
        /// Contact phone number.
        phone -> Nullable<Varchar>,
        /// Given name.
        name -> Nullable<Varchar>,
        /// Family name.
        surname -> Nullable<Varchar>,
        /// Free-form description.
        about -> Nullable<Varchar>,
        /// Date of birth.
        date_of_birth -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(profiles -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, profiles);
