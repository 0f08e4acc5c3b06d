use anyhow::Context;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use log::{info, warn};
use tokio_postgres::NoTls;

use crate::config::PostgresSettings;

const SCHEMA_PATH: &str = "schema/postgres.sql";

/// Splits a migration script on `;`, leaving `$$ ... $$` bodies and
/// `-- comments` intact.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_dollar_quote = false;
    let mut in_comment = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match c {
            '-' if !in_dollar_quote && matches!(chars.peek(), Some((_, '-'))) => {
                in_comment = true;
            },
            '$' if matches!(chars.peek(), Some((_, '$'))) => {
                chars.next();
                in_dollar_quote = !in_dollar_quote;
            },
            ';' if !in_dollar_quote => {
                statements.push(&sql[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    statements.push(&sql[start..]);

    statements
        .into_iter()
        .filter(|stmt| {
            stmt.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            })
        })
        .collect()
}

/// PostgreSQL client with connection pooling.
///
/// Stores tracked videos and their trend series. Uses `deadpool-postgres`
/// for connection management.
#[derive(Clone)]
pub struct PostgresClient {
    pub pool: Pool,
}

impl PostgresClient {
    pub async fn new(settings: PostgresSettings) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL at {}:{}", settings.host, settings.port);

        let max_retries = 3;
        let mut retries = 0;

        loop {
            let mut pg_config = tokio_postgres::Config::new();
            pg_config
                .host(&settings.host)
                .port(settings.port)
                .user(&settings.user)
                .password(&settings.password)
                .dbname(&settings.database);

            let mgr_config = ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            };

            let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
            let pool = Pool::builder(mgr)
                .max_size(settings.pool_size)
                .build()
                .context("Failed to create PostgreSQL connection pool")?;

            // Test the connection
            match pool.get().await {
                Ok(_conn) => {
                    info!("Successfully connected to PostgreSQL");
                    return Ok(Self { pool });
                },
                Err(e) => {
                    retries += 1;
                    if retries >= max_retries {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to PostgreSQL after {} attempts: {}",
                            max_retries,
                            e
                        ));
                    }

                    let delay = std::time::Duration::from_millis(100 * 2_u64.pow(retries));
                    warn!(
                        "Failed to connect to PostgreSQL (attempt {}/{}), retrying in {:?}...",
                        retries, max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running PostgreSQL migrations");
        let client = self.pool.get().await?;

        let schema = tokio::fs::read_to_string(SCHEMA_PATH)
            .await
            .with_context(|| format!("Failed to read {}", SCHEMA_PATH))?;

        for stmt in split_sql_statements(&schema) {
            let stmt = stmt.trim();
            client
                .execute(stmt, &[])
                .await
                .with_context(|| format!("Failed to execute migration statement: {}", stmt))?;
        }

        info!("PostgreSQL migrations completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_statements() {
        let sql = "CREATE SCHEMA a;\nCREATE TABLE a.t (x INT);\n";
        let stmts: Vec<&str> = split_sql_statements(sql)
            .into_iter()
            .map(str::trim)
            .collect();
        assert_eq!(stmts, vec!["CREATE SCHEMA a", "CREATE TABLE a.t (x INT)"]);
    }

    #[test]
    fn test_split_keeps_dollar_quoted_bodies() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $$ BEGIN PERFORM 1; END; $$ \
                   LANGUAGE plpgsql;\nSELECT 1";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("PERFORM 1; END;"));
        assert_eq!(stmts[1].trim(), "SELECT 1");
    }

    #[test]
    fn test_split_ignores_semicolons_in_comments() {
        let sql = "-- header; not a statement\nCREATE SCHEMA a;\n-- trailing comment\n";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("CREATE SCHEMA a"));
    }

    #[test]
    fn test_shipped_schema_splits_cleanly() {
        let schema = include_str!("../../../schema/postgres.sql");
        let stmts = split_sql_statements(schema);
        assert!(stmts
            .iter()
            .any(|s| s.contains("CREATE TABLE IF NOT EXISTS trendwatch.videos")));
        assert!(stmts.iter().all(|s| !s.trim().is_empty()));
    }
}
