//! Materialise declared tables: CREATE TABLE IF NOT EXISTS in declaration order
//! (referenced tables first). Existing tables are never altered or dropped.

use crate::config::{ResolvedModel, ResolvedTable};
use crate::error::AppError;
use crate::sql::Dialect;
use crate::store::Database;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Apply the resolved tables to the database. Idempotent.
pub async fn apply_migrations(db: &Database, model: &ResolvedModel) -> Result<(), AppError> {
    let statements = create_table_statements(db.dialect(), model);
    let mut session = db.session().await?;
    for (table, sql) in &statements {
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(sql).execute(&mut *session).await?;
        tracing::info!(table = %table, "table ensured");
    }
    Ok(())
}

/// One `(table name, CREATE TABLE)` pair per table, in declaration order.
pub fn create_table_statements(dialect: Dialect, model: &ResolvedModel) -> Vec<(String, String)> {
    model
        .tables
        .iter()
        .map(|t| (t.name.clone(), create_table(dialect, t)))
        .collect()
}

fn create_table(dialect: Dialect, table: &ResolvedTable) -> String {
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote(&c.name), dialect.column_type(c.column_type, c.max_length));
            if !c.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    defs.push(format!("PRIMARY KEY ({})", quote(&table.primary_key)));

    for c in &table.columns {
        if c.unique {
            defs.push(format!("UNIQUE ({})", quote(&c.name)));
        }
        if let Some(fk) = &c.references {
            defs.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quote(&fk.name),
                quote(&c.name),
                quote(&fk.table),
                quote(&fk.column)
            ));
        }
    }

    format!("CREATE TABLE IF NOT EXISTS {} (\n  {}\n)", quote(&table.name), defs.join(",\n  "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve};

    fn model() -> ResolvedModel {
        resolve(&builtin_config().unwrap()).unwrap()
    }

    fn statement(dialect: Dialect, table: &str) -> String {
        create_table_statements(dialect, &model())
            .into_iter()
            .find(|(t, _)| t == table)
            .map(|(_, sql)| sql)
            .unwrap()
    }

    #[test]
    fn parents_are_created_first() {
        let tables: Vec<_> = create_table_statements(Dialect::Sqlite, &model())
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        let pos = |name: &str| tables.iter().position(|t| t == name).unwrap();
        assert!(pos("patient") < pos("tumor"));
        assert!(pos("trial") < pos("pdx_trial"));
        assert!(pos("pdx_trial") < pos("mouse"));
        assert_eq!(tables.len(), 18);
    }

    #[test]
    fn optional_one_to_one_gets_unique_constraint() {
        let sql = statement(Dialect::Postgres, "genomic_sequencing");
        assert!(sql.contains("\"id\" UUID NOT NULL"));
        assert!(sql.contains("\"trial_id\" UUID,"));
        assert!(sql.contains("UNIQUE (\"trial_id\")"));
        assert!(sql.contains(
            "CONSTRAINT \"fk_genomic_sequencing_trial\" FOREIGN KEY (\"trial_id\") REFERENCES \"trial\" (\"id\")"
        ));
    }

    #[test]
    fn shared_key_is_not_duplicated_as_unique() {
        let sql = statement(Dialect::Sqlite, "pdx_trial");
        assert!(!sql.contains("UNIQUE"));
        assert!(sql.contains("\"id\" TEXT NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (\"id\") REFERENCES \"trial\" (\"id\")"));
    }

    #[test]
    fn varchar_keeps_its_length() {
        let sql = statement(Dialect::Postgres, "patient");
        assert!(sql.contains("\"nhc\" VARCHAR(50) NOT NULL"));
        assert!(sql.contains("\"birth_date\" DATE"));
    }

    #[test]
    fn booleans_are_integers_on_sqlite() {
        assert!(statement(Dialect::Sqlite, "biomodel").contains("\"progresses\" INTEGER"));
        assert!(statement(Dialect::Postgres, "biomodel").contains("\"progresses\" BOOLEAN"));
    }

    #[tokio::test]
    async fn creates_every_declared_table() {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        apply_migrations(&db, &model()).await.unwrap();
        let mut session = db.session().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&mut *session)
            .await
            .unwrap();
        assert_eq!(count, 18);
    }

    #[tokio::test]
    async fn applying_twice_is_harmless() {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        let model = model();
        apply_migrations(&db, &model).await.unwrap();
        apply_migrations(&db, &model).await.unwrap();
    }
}
