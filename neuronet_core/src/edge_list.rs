use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::NodeId;

/// Parsed edge list: the raw (origin, destination) pairs in file order plus
/// the largest node id seen on either side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EdgeList {
    pub edges: Vec<(NodeId, NodeId)>,
    pub max_node: NodeId,
    pub skipped_lines: usize,
}

impl EdgeList {
    /// Reads an edge list file. Fails only if the file cannot be opened or read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open edge list {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("cannot read edge list {}", path.display()))
    }

    /// One edge per line: `origin destination`, whitespace separated.
    /// Empty lines and lines starting with `#` are comments. Anything that does
    /// not start with two non-negative integers is skipped.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut list = EdgeList::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_pair(line) {
                Some((src, dst)) => {
                    list.max_node = list.max_node.max(src).max(dst);
                    list.edges.push((src, dst));
                }
                None => list.skipped_lines += 1,
            }
        }

        if list.skipped_lines > 0 {
            debug!(skipped = list.skipped_lines, "skipped malformed edge lines");
        }
        Ok(list)
    }
}

fn parse_pair(line: &str) -> Option<(NodeId, NodeId)> {
    let mut fields = line.split_whitespace();
    let src = fields.next()?.parse().ok()?;
    let dst = fields.next()?.parse().ok()?;
    Some((src, dst))
}
