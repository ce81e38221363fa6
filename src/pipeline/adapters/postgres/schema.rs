//! Diesel schema for opportunity pipeline persistence.

diesel::table! {
    /// Opportunity records with optimistic version tokens.
    opportunities (id) {
        /// Opportunity identifier.
        id -> Uuid,
        /// Company the opportunity is with.
        #[max_length = 255]
        company_name -> Varchar,
        /// Owning seller identifier.
        #[max_length = 255]
        owner -> Varchar,
        /// Amount in minor units.
        amount_cents -> Int8,
        /// Current pipeline stage.
        #[max_length = 50]
        stage -> Varchar,
        /// End of the trial window, if set.
        trial_ends_at -> Nullable<Timestamptz>,
        /// Reason recorded when the opportunity was lost.
        lost_reason -> Nullable<Text>,
        /// Tag set as a JSON array.
        tags -> Jsonb,
        /// Optimistic concurrency token.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only stage history records; `id` is the insertion sequence.
    opportunity_history (id) {
        /// Insertion sequence (BIGSERIAL), the tie-break for equal timestamps.
        id -> Int8,
        /// Parent opportunity identifier.
        opportunity_id -> Uuid,
        /// Actor who performed the change.
        #[max_length = 255]
        actor -> Varchar,
        /// Stage left, NULL for the creation record.
        #[max_length = 50]
        from_stage -> Nullable<Varchar>,
        /// Stage entered.
        #[max_length = 50]
        to_stage -> Varchar,
        /// Optional note attached to the change.
        note -> Nullable<Text>,
        /// Record timestamp.
        created_at -> Timestamptz,
    }
}
