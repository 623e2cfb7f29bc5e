//! [`GraphSink`](osmgrid_core::GraphSink) implementations.

mod json;
mod sqlite;

pub use json::{DEFAULT_FILE_TEMPLATE, JsonPartitionSink, PARTITION_MAP_FILE, WriteJsonError};
pub use sqlite::{PersistGraphError, SqliteGraphSink};
