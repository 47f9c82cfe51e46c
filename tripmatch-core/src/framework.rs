use sqlx::PgPool;

/// Runs the `Processor` query objects defined next to each entity.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
