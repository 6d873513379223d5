//! Command handlers for the `vecdb` binary.
//!
//! Every handler writes one JSON document to stdout.

use serde::{Deserialize, Serialize};
use std::path::Path;
use vecdb::{Metric, Most, Order, Ranking, Result, VecDb};

/// Result type for command handlers.
pub type CmdResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Vectors given on the command line: one row or a batch of rows.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VectorInput {
    /// A single vector, e.g. `[1.0, 0.0]`.
    One(Vec<f32>),
    /// A batch, e.g. `[[1.0, 0.0], [0.0, 1.0]]`.
    Batch(Vec<Vec<f32>>),
}

impl VectorInput {
    /// Parses a JSON vector or batch.
    pub fn parse(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the rows.
    pub fn into_rows(self) -> Vec<Vec<f32>> {
        match self {
            Self::One(row) => vec![row],
            Self::Batch(rows) => rows,
        }
    }
}

/// Parses a single vector, rejecting batches.
fn parse_single(json: &str) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error>> {
    match VectorInput::parse(json)? {
        VectorInput::One(row) => Ok(row),
        VectorInput::Batch(_) => Err("expected a single vector, got a batch".into()),
    }
}

/// Resolves the metric flag, falling back to the configured default.
pub fn resolve_metric(
    flag: Option<&str>,
    default: Metric,
) -> std::result::Result<Metric, Box<dyn std::error::Error>> {
    flag.map_or(Ok(default), |name| {
        Metric::parse(name).ok_or_else(|| format!("unknown metric '{name}'").into())
    })
}

const fn order_for(ascending: bool) -> Order {
    if ascending {
        Order::Ascending
    } else {
        Order::Descending
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Store command.
pub fn cmd_store(db: &VecDb, collection: &str, json: &str) -> CmdResult {
    let rows = VectorInput::parse(json)?.into_rows();
    let index = db.store(&rows, collection)?;
    print_json(&serde_json::json!({ "index": index }))
}

/// Get command.
pub fn cmd_get(db: &VecDb, collection: &str, index: Option<usize>) -> CmdResult {
    match index {
        Some(index) => print_json(&db.get(index, collection)?),
        None => print_json(&db.get_all(collection)?.to_rows()),
    }
}

/// Update command.
pub fn cmd_update(db: &VecDb, collection: &str, index: usize, json: &str) -> CmdResult {
    let vector = parse_single(json)?;
    db.update(index, &vector, collection)?;
    print_json(&serde_json::json!({ "updated": index }))
}

/// Delete command.
pub fn cmd_delete(db: &VecDb, collection: &str, index: usize) -> CmdResult {
    db.delete(index, collection)?;
    print_json(&serde_json::json!({ "deleted": index }))
}

/// Compare command.
pub fn cmd_compare(
    db: &VecDb,
    collection: &str,
    json: &str,
    metric: Metric,
    ascending: bool,
) -> CmdResult {
    let query = parse_single(json)?;
    let ranking: Ranking = db.compare(&query, &metric, order_for(ascending), collection)?;
    print_json(&ranking)
}

/// Most command.
pub fn cmd_most(
    db: &VecDb,
    collection: &str,
    json: &str,
    n: usize,
    metric: Metric,
    ascending: bool,
) -> CmdResult {
    let query = parse_single(json)?;
    let most: Most = db.most(&query, &metric, n, order_for(ascending), collection)?;
    print_json(&most)
}

/// Summary of one collection.
#[derive(Debug, Serialize)]
struct CollectionInfo {
    name: String,
    rows: usize,
    live: usize,
}

/// Summary of the store.
#[derive(Debug, Serialize)]
struct StoreInfo<'a> {
    path: &'a Path,
    emb_dim: usize,
    collections: Vec<CollectionInfo>,
}

/// Info command.
pub fn cmd_info(db: &VecDb) -> CmdResult {
    let collections = db
        .collections()?
        .into_iter()
        .map(|name| {
            Ok(CollectionInfo {
                rows: db.row_count(&name)?,
                live: db.live_count(&name)?,
                name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    print_json(&StoreInfo {
        path: db.path(),
        emb_dim: db.dimensions(),
        collections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_vector() {
        assert_eq!(
            VectorInput::parse("[1.0, 0.5]").expect("parse"),
            VectorInput::One(vec![1.0, 0.5])
        );
    }

    #[test]
    fn test_parse_batch() {
        let rows = VectorInput::parse("[[1, 0], [0, 1]]")
            .expect("parse")
            .into_rows();
        assert_eq!(rows, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(VectorInput::parse("{\"a\": 1}").is_err());
        assert!(parse_single("[[1.0]]").is_err());
    }

    #[test]
    fn test_resolve_metric() {
        assert_eq!(
            resolve_metric(None, Metric::Dot).expect("metric"),
            Metric::Dot
        );
        assert_eq!(
            resolve_metric(Some("l2"), Metric::Dot).expect("metric"),
            Metric::Euclidean
        );
        assert!(resolve_metric(Some("manhattan"), Metric::Dot).is_err());
    }
}
