use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

/// A schema script compiled into the binary.
#[derive(Debug)]
pub(crate) struct Migration {
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    const fn new(version: &'static str, script: &'static str) -> Self {
        Self { version, script }
    }

    /// `FxHasher` is unseeded, so the value is stable between runs.
    pub(crate) fn checksum(&self) -> String {
        format!("{:016x}", fxhash::hash64(self.script.as_bytes()))
    }
}

/// Ordered by version; never edit an entry once it has shipped.
pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration::new("0001_registry", include_str!("../migrations/0001_registry.surql")),
    Migration::new("0002_rsvp", include_str!("../migrations/0002_rsvp.surql")),
];

#[derive(Debug, Default)]
pub(crate) struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AppliedMigration {
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
    migrations: &'a [Migration],
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db, migrations: MIGRATIONS }
    }

    #[cfg(test)]
    const fn with_migrations(db: &'a Surreal<Any>, migrations: &'a [Migration]) -> Self {
        Self { db, migrations }
    }

    pub(crate) async fn run(&self) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let applied = self.applied_migrations().await?;

        for migration in self.migrations {
            let record =
                AppliedMigration { version: migration.version.to_owned(), checksum: migration.checksum() };

            if let Some(existing) = applied.get(migration.version) {
                ensure_checksum_match(migration, &existing.checksum, &record.checksum)?;
                report.skipped.push(record);
                continue;
            }

            self.apply(migration, &record).await?;
            report.applied.push(record);
        }

        Ok(report)
    }

    async fn apply(
        &self,
        migration: &Migration,
        record: &AppliedMigration,
    ) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE migration SET version = $version, checksum = $checksum, applied_at = time::now();
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(&query)
            .bind(("version", record.version.clone()))
            .bind(("checksum", record.checksum.clone()))
            .await
            .context(format!("Applying migration {}", migration.version))?
            .check()
            .map_err(surrealdb::Error::from)
            .context(format!("Migration {} rejected", migration.version))?;

        Ok(())
    }

    async fn applied_migrations(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = self
            .db
            .query(
                "DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;
                SELECT version, checksum FROM migration;",
            )
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(1)
            .context("Parsing applied migrations")?;

        Ok(entries.into_iter().map(|entry| (entry.version.clone(), entry)).collect())
    }
}

fn ensure_checksum_match(
    migration: &Migration,
    existing: &str,
    expected: &str,
) -> Result<(), DatabaseError> {
    if existing != expected {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {existing}, compiled {expected})",
                migration.version
            )
            .into(),
            context: Some("Migration already applied with different content".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::any::connect;

    async fn memory() -> Surreal<Any> {
        let db = connect("mem://").await.unwrap();
        db.use_ns("test").use_db("migrations").await.unwrap();
        db
    }

    #[test]
    fn checksums_are_stable_and_distinct() {
        let a = Migration::new("a", "DEFINE TABLE a;");
        let b = Migration::new("b", "DEFINE TABLE b;");
        assert_eq!(a.checksum(), Migration::new("a2", "DEFINE TABLE a;").checksum());
        assert_ne!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 16);
    }

    #[test]
    fn versions_are_ordered_and_unique() {
        let versions: Vec<_> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[tokio::test]
    async fn second_run_skips_everything() {
        let db = memory().await;

        let first = MigrationRunner::new(&db).run().await.unwrap();
        assert_eq!(first.applied.len(), MIGRATIONS.len());
        assert!(first.skipped.is_empty());

        let second = MigrationRunner::new(&db).run().await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), MIGRATIONS.len());
    }

    #[tokio::test]
    async fn edited_migration_is_rejected() {
        let db = memory().await;
        let original = [Migration::new("0001_demo", "DEFINE TABLE IF NOT EXISTS demo SCHEMALESS;")];
        MigrationRunner::with_migrations(&db, &original).run().await.unwrap();

        let edited = [Migration::new("0001_demo", "DEFINE TABLE IF NOT EXISTS demo SCHEMAFULL;")];
        let err = MigrationRunner::with_migrations(&db, &edited).run().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
    }
}
