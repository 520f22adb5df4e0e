use sqlx::PgPool;

/// Executes entity queries against the connection pool.
///
/// Every query type under [`crate::entities`] is a `kanau` processor input
/// implemented for this type.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
