use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;

use crate::error::StoreError;
use crate::models::{Architecture, DatabaseStats, NewTransfer, Transfer, TransferFilter};

const TRANSFER_COLUMNS: &str = "id, fromChain, toChain, amount, carbonSaved, timestamp";

const ARCHITECTURE_COLUMNS: &str = "id, name, energyPerValidator, co2PerValidator, \
     co2PerTransaction, throughput, finality, energyEfficiency, validatorCount, emissions, \
     decentralization, developerEcosystem, networkAdoption";

struct SeedArchitecture {
    name: &'static str,
    energy_per_validator: f64,
    co2_per_validator: f64,
    co2_per_transaction: f64,
    throughput: f64,
    finality: f64,
    energy_efficiency: f64,
    validator_count: i64,
    emissions: &'static str,
    decentralization: f64,
    developer_ecosystem: f64,
    network_adoption: f64,
}

const SEED_ARCHITECTURES: [SeedArchitecture; 3] = [
    SeedArchitecture {
        name: "Avalanche (Subnets + ICTT)",
        energy_per_validator: 0.2,
        co2_per_validator: 0.12,
        co2_per_transaction: 0.0001,
        throughput: 4500.0,
        finality: 2.0,
        energy_efficiency: 0.2,
        validator_count: 100,
        emissions: "Lower",
        decentralization: 7.5,
        developer_ecosystem: 7.0,
        network_adoption: 6.5,
    },
    SeedArchitecture {
        name: "Ethereum (PoS + Bridges)",
        energy_per_validator: 0.4,
        co2_per_validator: 0.24,
        co2_per_transaction: 0.0003,
        throughput: 20.0,
        finality: 30.0,
        energy_efficiency: 0.05,
        validator_count: 100_000,
        emissions: "Medium",
        decentralization: 9.0,
        developer_ecosystem: 10.0,
        network_adoption: 9.5,
    },
    SeedArchitecture {
        name: "Solana (PoH + Tower BFT)",
        energy_per_validator: 0.3,
        co2_per_validator: 0.18,
        co2_per_transaction: 0.0002,
        throughput: 50_000.0,
        finality: 1.0,
        energy_efficiency: 0.1,
        validator_count: 1000,
        emissions: "Low",
        decentralization: 6.0,
        developer_ecosystem: 8.0,
        network_adoption: 8.0,
    },
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Private in-memory store. A single connection keeps every query on the
    /// same database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fromChain TEXT NOT NULL,
                toChain TEXT NOT NULL,
                amount TEXT NOT NULL,
                carbonSaved REAL NOT NULL DEFAULT 0,
                timestamp INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transfers_timestamp ON transfers(timestamp)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS architectures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                energyPerValidator REAL NOT NULL,
                co2PerValidator REAL NOT NULL,
                co2PerTransaction REAL NOT NULL,
                throughput REAL NOT NULL,
                finality REAL NOT NULL,
                energyEfficiency REAL NOT NULL,
                validatorCount INTEGER NOT NULL,
                emissions TEXT NOT NULL,
                decentralization REAL NOT NULL,
                developerEcosystem REAL NOT NULL,
                networkAdoption REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seed_markers (
                name TEXT PRIMARY KEY,
                seeded_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts the reference architectures once per store. The marker row and
    /// the inserts share a transaction, so concurrent cold starts seed at most
    /// once. Returns the number of rows inserted.
    pub async fn seed_architectures(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query("INSERT OR IGNORE INTO seed_markers (name, seeded_at) VALUES (?, ?)")
            .bind("architectures")
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        // Stores populated before the marker existed.
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM architectures")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            tx.commit().await?;
            return Ok(0);
        }

        let mut inserted = 0;
        for arch in &SEED_ARCHITECTURES {
            inserted += sqlx::query(
                r#"
                INSERT INTO architectures (
                    name, energyPerValidator, co2PerValidator, co2PerTransaction, throughput,
                    finality, energyEfficiency, validatorCount, emissions,
                    decentralization, developerEcosystem, networkAdoption
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(arch.name)
            .bind(arch.energy_per_validator)
            .bind(arch.co2_per_validator)
            .bind(arch.co2_per_transaction)
            .bind(arch.throughput)
            .bind(arch.finality)
            .bind(arch.energy_efficiency)
            .bind(arch.validator_count)
            .bind(arch.emissions)
            .bind(arch.decentralization)
            .bind(arch.developer_ecosystem)
            .bind(arch.network_adoption)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn insert_transfer(&self, transfer: &NewTransfer) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transfers (fromChain, toChain, amount, carbonSaved, timestamp)
            VALUES (?, ?, ?, ?, COALESCE(?, CAST(strftime('%s', 'now') AS INTEGER)))
            "#,
        )
        .bind(&transfer.from_chain)
        .bind(&transfer.to_chain)
        .bind(&transfer.amount)
        .bind(transfer.carbon_saved)
        .bind(transfer.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest first; rows sharing a timestamp come back in reverse insertion order.
    pub async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, StoreError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM transfers WHERE 1=1", TRANSFER_COLUMNS));

        if let Some(chain) = &filter.chain {
            query
                .push(" AND (LOWER(fromChain) = LOWER(")
                .push_bind(chain.clone())
                .push(") OR LOWER(toChain) = LOWER(")
                .push_bind(chain.clone())
                .push("))");
        }

        if let Some(since) = filter.since {
            query.push(" AND timestamp >= ").push_bind(since);
        }

        query.push(" ORDER BY timestamp DESC, id DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let transfers = query
            .build_query_as::<Transfer>()
            .fetch_all(&self.pool)
            .await?;

        Ok(transfers)
    }

    pub async fn list_architectures(&self) -> Result<Vec<Architecture>, StoreError> {
        let architectures = sqlx::query_as::<_, Architecture>(&format!(
            "SELECT {} FROM architectures ORDER BY id ASC",
            ARCHITECTURE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(architectures)
    }

    pub async fn get_architecture(&self, id: i64) -> Result<Architecture, StoreError> {
        sqlx::query_as::<_, Architecture>(&format!(
            "SELECT {} FROM architectures WHERE id = ?",
            ARCHITECTURE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    pub async fn count_architectures(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM architectures")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn get_stats(&self) -> Result<DatabaseStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_transfers,
                COALESCE(SUM(CAST(amount AS REAL)), 0.0) AS total_amount,
                COALESCE(SUM(carbonSaved), 0.0) AS total_carbon_saved,
                MIN(timestamp) AS earliest_timestamp,
                MAX(timestamp) AS latest_timestamp
            FROM transfers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DatabaseStats {
            total_transfers: row.try_get("total_transfers")?,
            total_amount: row.try_get("total_amount")?,
            total_carbon_saved: row.try_get("total_carbon_saved")?,
            earliest_timestamp: row.try_get("earliest_timestamp")?,
            latest_timestamp: row.try_get("latest_timestamp")?,
        })
    }
}
