//! Diesel schema for implementation board persistence.

diesel::table! {
    /// Implementation task records with optimistic version tokens.
    implementation_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Customer account identifier.
        #[max_length = 255]
        account_id -> Varchar,
        /// Customer web domain.
        #[max_length = 255]
        domain -> Varchar,
        /// Optional market segment.
        #[max_length = 255]
        segment -> Nullable<Varchar>,
        /// Board status.
        #[max_length = 50]
        status -> Varchar,
        /// Assignee, if scheduled.
        #[max_length = 255]
        assignee_id -> Nullable<Varchar>,
        /// Scheduled time, if scheduled.
        scheduled_at -> Nullable<Timestamptz>,
        /// Free-form notes.
        notes -> Nullable<Text>,
        /// Position within the status column.
        position -> Int4,
        /// Insertion sequence (BIGSERIAL), the tie-break for equal positions.
        insertion_seq -> Int8,
        /// Creating actor.
        #[max_length = 255]
        created_by -> Varchar,
        /// Optimistic concurrency token.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only board events; `id` is the insertion sequence.
    implementation_events (id) {
        /// Insertion sequence (BIGSERIAL).
        id -> Int8,
        /// Parent task identifier.
        task_id -> Uuid,
        /// Event kind.
        #[max_length = 50]
        kind -> Varchar,
        /// Structured payload shaped by the event kind.
        payload -> Jsonb,
        /// Actor who caused the event.
        #[max_length = 255]
        created_by -> Varchar,
        /// Event timestamp.
        created_at -> Timestamptz,
    }
}
