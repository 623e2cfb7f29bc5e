//! SQLite persistence for partitioned graphs.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use osmgrid_core::{GraphSink, PartitionKey, PartitionedGraph, PartitionedNode};
use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Errors raised when persisting or reading a graph in SQLite.
#[derive(Debug, Error)]
pub enum PersistGraphError {
    /// Failed to create the parent directory for the database.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin graph persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating or clearing the tables failed.
    #[error("failed to prepare graph tables")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a node or adjacency row failed.
    #[error("failed to persist node {node_id}")]
    PersistRow {
        /// Node being written.
        node_id: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit graph persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Reading persisted rows back failed.
    #[error("failed to query persisted graph")]
    Query {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Stores nodes with their partition columns and directed adjacency rows.
///
/// Each [`persist`](GraphSink::persist) call replaces the previous contents
/// inside a single transaction, so readers see either the old graph or the
/// new one.
///
/// Schema:
/// - `nodes(node_id TEXT PRIMARY KEY, lat REAL, lon REAL, lat_part TEXT, lon_part TEXT)`
/// - `node_adjacency(node_a TEXT, node_b TEXT)`, one row per direction.
#[derive(Debug, Clone)]
pub struct SqliteGraphSink {
    path: Utf8PathBuf,
}

impl SqliteGraphSink {
    /// Target the database at `path`; nothing is opened until use.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Database path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, PersistGraphError> {
        Connection::open(self.path.as_std_path()).map_err(|source| PersistGraphError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Distinct partitions ordered by latitude then longitude key.
    pub fn partitions(&self) -> Result<Vec<PartitionKey>, PersistGraphError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare("SELECT DISTINCT lat_part, lon_part FROM nodes ORDER BY lat_part, lon_part")
            .map_err(query_error)?;
        let rows = statement
            .query_map([], |row| Ok(PartitionKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(query_error)?;
        rows.collect::<Result<_, _>>().map_err(query_error)
    }

    /// Nodes of one partition with their neighbours, ordered by identifier.
    pub fn partition_nodes(
        &self,
        key: &PartitionKey,
    ) -> Result<Vec<PartitionedNode>, PersistGraphError> {
        let connection = self.connect()?;
        let mut nodes_statement = connection
            .prepare(
                "SELECT node_id, lat, lon FROM nodes
                 WHERE lat_part = ?1 AND lon_part = ?2 ORDER BY node_id",
            )
            .map_err(query_error)?;
        let mut neighbours_statement = connection
            .prepare("SELECT node_b FROM node_adjacency WHERE node_a = ?1 ORDER BY node_b")
            .map_err(query_error)?;

        let located: Vec<(String, f64, f64)> = nodes_statement
            .query_map((&key.lat, &key.lon), |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(query_error)?
            .collect::<Result<_, _>>()
            .map_err(query_error)?;

        located
            .into_iter()
            .map(|(id, lat, lon)| {
                let adjacency = neighbours_statement
                    .query_map([&id], |row| row.get(0))
                    .map_err(query_error)?
                    .collect::<Result<_, _>>()
                    .map_err(query_error)?;
                Ok(PartitionedNode {
                    id,
                    lat,
                    lon,
                    adjacency,
                })
            })
            .collect()
    }

    /// Partition recorded for a node, if any.
    pub fn partition_of(&self, node_id: &str) -> Result<Option<PartitionKey>, PersistGraphError> {
        let connection = self.connect()?;
        connection
            .query_row(
                "SELECT lat_part, lon_part FROM nodes WHERE node_id = ?1",
                [node_id],
                |row| Ok(PartitionKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(query_error)
    }
}

fn query_error(source: SqliteError) -> PersistGraphError {
    PersistGraphError::Query { source }
}

impl GraphSink for SqliteGraphSink {
    type Error = PersistGraphError;

    fn persist(&mut self, graph: &PartitionedGraph) -> Result<(), Self::Error> {
        osmgrid_fs::ensure_parent_dir(&self.path).map_err(|source| {
            PersistGraphError::CreateDirectory {
                path: self.path.clone(),
                source,
            }
        })?;
        let mut connection = self.connect()?;
        let transaction = connection
            .transaction()
            .map_err(|source| PersistGraphError::BeginTransaction { source })?;

        reset_schema(&transaction)?;
        persist_rows(&transaction, graph)?;

        transaction
            .commit()
            .map_err(|source| PersistGraphError::Commit { source })?;
        info!(
            "persisted {} nodes in {} partitions to {}",
            graph.node_count(),
            graph.partition_count(),
            self.path
        );
        Ok(())
    }
}

fn reset_schema(transaction: &Transaction<'_>) -> Result<(), PersistGraphError> {
    transaction
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS nodes (
                node_id TEXT PRIMARY KEY,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                lat_part TEXT NOT NULL,
                lon_part TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS nodes_partition ON nodes (lat_part, lon_part);
            CREATE TABLE IF NOT EXISTS node_adjacency (
                node_a TEXT NOT NULL,
                node_b TEXT NOT NULL,
                PRIMARY KEY (node_a, node_b)
            );
            DELETE FROM node_adjacency;
            DELETE FROM nodes;",
        )
        .map_err(|source| PersistGraphError::Schema { source })
}

fn persist_rows(
    transaction: &Transaction<'_>,
    graph: &PartitionedGraph,
) -> Result<(), PersistGraphError> {
    let mut insert_node = transaction
        .prepare(
            "INSERT INTO nodes (node_id, lat, lon, lat_part, lon_part)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|source| PersistGraphError::Schema { source })?;
    let mut insert_edge = transaction
        .prepare("INSERT OR IGNORE INTO node_adjacency (node_a, node_b) VALUES (?1, ?2)")
        .map_err(|source| PersistGraphError::Schema { source })?;

    for (key, nodes) in graph.partitions() {
        for node in nodes {
            let row_error = |source| PersistGraphError::PersistRow {
                node_id: node.id.clone(),
                source,
            };
            insert_node
                .execute((&node.id, node.lat, node.lon, &key.lat, &key.lon))
                .map_err(row_error)?;
            for neighbour in &node.adjacency {
                insert_edge
                    .execute((&node.id, neighbour))
                    .map_err(row_error)?;
            }
        }
    }
    Ok(())
}
