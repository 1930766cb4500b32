//! The path selector mini-language: `$`, `.key`, `[*]`.
//!
//! Nothing published matches this exact tiny grammar, so it's implemented
//! directly against our own [`Node`](super::node::Node) tree rather than
//! pulled in as a dependency.

use super::node::{Node, NodeValue};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Wildcard,
}

/// Parse a path string like `$.spec.params[*]` into segments. `$` denotes
/// "the node this path is evaluated against" — which, per the rule-table
/// semantics, is the previous path's result for every path after the first
/// in a chain, not necessarily the document root.
fn parse(path: &str) -> Vec<Segment> {
    let trimmed = path.strip_prefix('$').unwrap_or(path);
    let mut segments = Vec::new();
    for raw in trimmed.split('.').filter(|s| !s.is_empty()) {
        if let Some(key) = raw.strip_suffix("[*]") {
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            segments.push(Segment::Wildcard);
        } else {
            segments.push(Segment::Key(raw.to_string()));
        }
    }
    segments
}

fn step<'a>(nodes: &[&'a Node], segment: &Segment) -> Vec<&'a Node> {
    let mut out = Vec::new();
    for node in nodes {
        match segment {
            Segment::Key(key) => {
                if let Some(child) = node.get(key) {
                    out.push(child);
                }
            }
            Segment::Wildcard => {
                if let NodeValue::Sequence(items) = &node.value {
                    out.extend(items.iter());
                }
            }
        }
    }
    out
}

/// Evaluate a single path against `start`, returning every matching node.
/// Null nodes and type mismatches (e.g. `.key` on a sequence) simply
/// produce no matches rather than erroring.
pub fn eval<'a>(start: &'a Node, path: &str) -> Vec<&'a Node> {
    let segments = parse(path);
    let mut current = vec![start];
    for segment in &segments {
        current = step(&current, segment);
    }
    current
}

/// Evaluate a chain of paths `P1..Pk`, where `Pi` (`i>1`) is evaluated
/// against each node produced by `P(i-1)`. Returns one "chain" per distinct
/// leaf match, each chain holding the node matched by every path in order
/// (so `chain.last()` is the final path's match and `chain[0]` is the
/// first's) — this is exactly what the declarative identifier/reference
/// rule tables need to hand to their builder functions.
pub fn eval_chain<'a>(start: &'a Node, paths: &[&str]) -> Vec<Vec<&'a Node>> {
    let mut frontier: Vec<(&'a Node, Vec<&'a Node>)> = vec![(start, Vec::new())];
    for path in paths {
        let segments = parse(path);
        let mut next = Vec::new();
        for (ctx, chain) in &frontier {
            let mut matched = vec![*ctx];
            for segment in &segments {
                matched = step(&matched, segment);
            }
            for m in matched {
                let mut new_chain = chain.clone();
                new_chain.push(m);
                next.push((m, new_chain));
            }
        }
        frontier = next;
    }
    frontier.into_iter().map(|(_, chain)| chain).collect()
}
