use anyhow::{Context, Result};

/// PostgreSQL BIGINT -> counter. Negative values mean a corrupted row.
pub fn to_count(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value)
        .with_context(|| format!("negative value {} in column {}", value, column))
}

/// Counter -> PostgreSQL BIGINT.
pub fn to_db_int(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value)
        .with_context(|| format!("value {} for column {} exceeds BIGINT range", value, column))
}
