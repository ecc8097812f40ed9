//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `email` is unique and stored lower-cased.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    parking_locations (id) {
        id -> Uuid,
        name -> Varchar,
        address -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        total_spaces -> Int4,
        hourly_rate_cents -> Int8,
        /// `{"type":"always_open"}` or `{"type":"daily","opensAt":..,"closesAt":..}`.
        operating_hours -> Jsonb,
        amenities -> Array<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reservations. The window is half-open: `[start_time, end_time)`.
    bookings (id) {
        id -> Uuid,
        user_id -> Uuid,
        location_id -> Uuid,
        vehicle_plate -> Varchar,
        vehicle_type -> Varchar,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        total_price_cents -> Int8,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(bookings -> parking_locations (location_id));
diesel::joinable!(bookings -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(users, parking_locations, bookings);
