use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA temp_store=MEMORY;").execute(pool).await {
        tracing::warn!("Failed to set temp_store: {}", e);
    }

    // host data snapshots, one current (archived = 0) row per hostname
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS hosts (
            id TEXT PRIMARY KEY,
            hostname TEXT NOT NULL,
            location TEXT NOT NULL,
            environment TEXT NOT NULL,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS exadatas (
            rack_id TEXT PRIMARY KEY,
            hostname TEXT NOT NULL,
            environment TEXT NOT NULL,
            location TEXT NOT NULL,
            hidden INTEGER NOT NULL DEFAULT 0,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS license_types (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS oracle_database_agreements (
            id TEXT PRIMARY KEY,
            license_type_id TEXT NOT NULL,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS mysql_contracts (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS licenses_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            license_type_id TEXT NOT NULL,
            item_description TEXT NOT NULL,
            metric TEXT NOT NULL,
            date INTEGER NOT NULL,
            consumed REAL NOT NULL,
            covered REAL NOT NULL,
            purchased REAL NOT NULL,
            UNIQUE(license_type_id, item_description, date)
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            alert_code TEXT NOT NULL,
            alert_severity TEXT NOT NULL,
            alert_status TEXT NOT NULL,
            hostname TEXT NOT NULL,
            date INTEGER NOT NULL,
            data TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_hosts_hostname_archived", "CREATE INDEX IF NOT EXISTS idx_hosts_hostname_archived ON hosts(hostname, archived)"),
        ("idx_hosts_created_at", "CREATE INDEX IF NOT EXISTS idx_hosts_created_at ON hosts(created_at)"),
        ("idx_exadatas_hidden", "CREATE INDEX IF NOT EXISTS idx_exadatas_hidden ON exadatas(hidden)"),
        (
            "idx_agreements_license_type",
            "CREATE INDEX IF NOT EXISTS idx_agreements_license_type ON oracle_database_agreements(license_type_id)",
        ),
        ("idx_history_date", "CREATE INDEX IF NOT EXISTS idx_history_date ON licenses_history(date)"),
        (
            "idx_alerts_hostname_code",
            "CREATE INDEX IF NOT EXISTS idx_alerts_hostname_code ON alerts(hostname, alert_code, alert_status)",
        ),
        ("idx_alerts_date", "CREATE INDEX IF NOT EXISTS idx_alerts_date ON alerts(date)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}
