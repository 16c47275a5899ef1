//! Repository for the `node_deaths` table (append-only).

use fleetwatch_core::sinks::NodeDeath;
use sqlx::PgPool;

use crate::models::node::NodeDeathRow;

const COLUMNS: &str = "id, pc_id, ip, dead_at, created_at";

/// Provides query operations for node deaths.
pub struct NodeDeathRepo;

impl NodeDeathRepo {
    pub async fn insert(pool: &PgPool, death: &NodeDeath) -> Result<NodeDeathRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO node_deaths (pc_id, ip, dead_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NodeDeathRow>(&query)
            .bind(&death.node_id)
            .bind(&death.address)
            .bind(death.dead_at)
            .fetch_one(pool)
            .await
    }

    /// Deaths of one node, most recent first.
    pub async fn list_for_node(
        pool: &PgPool,
        pc_id: &str,
    ) -> Result<Vec<NodeDeathRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM node_deaths \
             WHERE pc_id = $1 \
             ORDER BY dead_at DESC"
        );
        sqlx::query_as::<_, NodeDeathRow>(&query)
            .bind(pc_id)
            .fetch_all(pool)
            .await
    }
}
