//! Diesel schema for delayed job persistence.

diesel::table! {
    /// Delayed jobs; at most one pending row per (key, name) pair,
    /// enforced by a partial unique index.
    delayed_jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Business key the job is scheduled under.
        #[max_length = 255]
        key -> Varchar,
        /// Job name identifying its handler.
        #[max_length = 255]
        name -> Varchar,
        /// Opaque payload handed to the handler.
        payload -> Jsonb,
        /// Time the job fires at or after.
        fire_at -> Timestamptz,
        /// Job status.
        #[max_length = 50]
        status -> Varchar,
        /// Failed handler attempts so far.
        attempts -> Int4,
        /// Last handler error, if any.
        last_error -> Nullable<Text>,
        /// Insertion sequence (BIGSERIAL), the tie-break for equal fire times.
        insertion_seq -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}
