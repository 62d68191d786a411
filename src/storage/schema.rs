//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS execution_requests (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            project_id TEXT,
            test_plan_id TEXT,
            executor_name TEXT,
            environment TEXT,
            start_date TEXT NOT NULL,
            finish_date TEXT,
            duration_secs INTEGER NOT NULL DEFAULT 0,
            passed_count INTEGER NOT NULL DEFAULT 0,
            failed_count INTEGER NOT NULL DEFAULT 0,
            warning_count INTEGER NOT NULL DEFAULT 0,
            skipped_count INTEGER NOT NULL DEFAULT 0,
            blocked_count INTEGER NOT NULL DEFAULT 0,
            stopped_count INTEGER NOT NULL DEFAULT 0,
            unknown_count INTEGER NOT NULL DEFAULT 0,
            passed_rate INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS test_runs (
            id TEXT PRIMARY KEY,
            execution_request_id TEXT NOT NULL,
            name TEXT NOT NULL,
            test_case_id TEXT,
            status TEXT NOT NULL,
            start_date TEXT NOT NULL,
            finish_date TEXT,
            duration_secs INTEGER NOT NULL DEFAULT 0,
            root_cause_id TEXT,
            defect_found_in_id TEXT,
            comment TEXT,
            FOREIGN KEY (execution_request_id) REFERENCES execution_requests(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS log_records (
            id TEXT PRIMARY KEY,
            test_run_id TEXT NOT NULL,
            parent_record_id TEXT,
            name TEXT NOT NULL,
            message TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            start_date TEXT NOT NULL,
            finish_date TEXT,
            validation_json TEXT,
            attachments_json TEXT NOT NULL DEFAULT '[]',
            FOREIGN KEY (test_run_id) REFERENCES test_runs(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS labels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS execution_request_labels (
            execution_request_id TEXT NOT NULL,
            label_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (execution_request_id, label_id),
            FOREIGN KEY (execution_request_id) REFERENCES execution_requests(id) ON DELETE CASCADE,
            FOREIGN KEY (label_id) REFERENCES labels(id)
        );

        CREATE TABLE IF NOT EXISTS test_run_labels (
            test_run_id TEXT NOT NULL,
            label_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (test_run_id, label_id),
            FOREIGN KEY (test_run_id) REFERENCES test_runs(id) ON DELETE CASCADE,
            FOREIGN KEY (label_id) REFERENCES labels(id)
        );

        CREATE TABLE IF NOT EXISTS defects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            link TEXT,
            description TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS defect_links (
            defect_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            target_id TEXT NOT NULL,
            PRIMARY KEY (defect_id, kind, target_id),
            FOREIGN KEY (defect_id) REFERENCES defects(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS dictionary_entries (
            id TEXT PRIMARY KEY,
            category TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (category, name)
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id TEXT NOT NULL,
            setting_type TEXT NOT NULL,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, setting_type)
        );

        CREATE INDEX IF NOT EXISTS idx_execution_requests_start ON execution_requests(start_date);
        CREATE INDEX IF NOT EXISTS idx_test_runs_request ON test_runs(execution_request_id);
        CREATE INDEX IF NOT EXISTS idx_log_records_run ON log_records(test_run_id);
        CREATE INDEX IF NOT EXISTS idx_dictionary_category ON dictionary_entries(category);
        CREATE INDEX IF NOT EXISTS idx_defect_links_target ON defect_links(target_id);",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (1)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        for table in [
            "execution_requests",
            "test_runs",
            "log_records",
            "labels",
            "defects",
            "dictionary_entries",
            "user_settings",
        ] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "table {} should start empty", table);
        }
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap(); // Should not error

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }
}
