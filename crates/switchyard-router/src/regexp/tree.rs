//! Segment tree flattened into a single alternation regex.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RouterError;
use crate::pattern::{Pattern, LABEL_REGEX};

/// How one segment is matched inside the combined regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edge {
    /// Exact segment text.
    Literal(String),
    /// A capturing group. `groups` counts the capturing groups inside
    /// `source` so numbering stays exact.
    Capture { source: String, groups: usize },
    /// Trailing `*` after at least one segment: zero or more segments.
    Tail,
    /// A `*` standing for the whole path.
    Any,
}

impl Edge {
    /// Whether the edge may consume more than one segment, which makes the
    /// branch taken after it depend on backtracking. Any constraint other
    /// than the plain label regex may admit a slash.
    fn spans(&self) -> bool {
        match self {
            Edge::Capture { source, .. } => source != LABEL_REGEX,
            Edge::Literal(_) | Edge::Tail | Edge::Any => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Edge::Literal(_) => 0,
            Edge::Capture { .. } => 1,
            Edge::Tail => 2,
            Edge::Any => 3,
        }
    }
}

/// One segment of a route, ready for insertion.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub edge: Edge,
    pub name: Option<String>,
}

/// Convert parsed segments into steps.
///
/// A `.*` constraint can not be told apart from a trailing wildcard once
/// flattened and is refused.
pub(crate) fn to_steps(path: &str, segments: &[Arc<Pattern>]) -> Result<Vec<Step>, RouterError> {
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            let edge = match pattern.as_ref() {
                Pattern::Static(text) => Edge::Literal(text.clone()),
                Pattern::Param { .. } => Edge::Capture {
                    source: LABEL_REGEX.to_string(),
                    groups: 0,
                },
                Pattern::Constrained { constraint, .. } => {
                    if constraint.source() == ".*" {
                        return Err(RouterError::UnsupportedPath(path.to_string()));
                    }
                    Edge::Capture {
                        source: constraint.source().to_string(),
                        groups: constraint.groups(),
                    }
                }
                Pattern::Wildcard if i < last => Edge::Capture {
                    source: LABEL_REGEX.to_string(),
                    groups: 0,
                },
                Pattern::Wildcard if i == 0 => Edge::Any,
                Pattern::Wildcard => Edge::Tail,
            };
            Ok(Step {
                edge,
                name: pattern.name().map(str::to_string),
            })
        })
        .collect()
}

/// Whether every step is a literal.
pub(crate) fn is_static(steps: &[Step]) -> bool {
    steps.iter().all(|s| matches!(s.edge, Edge::Literal(_)))
}

/// Whether a trailing-wildcard route matches every path `leaf` matches:
/// its prefix before the `*` equals the leaf's leading steps edge by edge.
pub(crate) fn covers(wildcard: &[Step], leaf: &[Step]) -> bool {
    let Some((tail, prefix)) = wildcard.split_last() else {
        return false;
    };
    if !matches!(tail.edge, Edge::Tail | Edge::Any) || leaf.len() < prefix.len() {
        return false;
    }
    prefix.iter().zip(leaf).all(|(a, b)| a.edge == b.edge)
}

/// Raised when the route set has no unambiguous single-regex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

#[derive(Debug, Default)]
struct Node {
    children: Vec<(Edge, usize)>,
    leaf: Option<usize>,
    /// Reached through a capture that may span segments; such a node keeps
    /// a single continuation.
    spans: bool,
}

impl Node {
    fn child(&self, edge: &Edge) -> Option<usize> {
        self.children
            .iter()
            .find(|(e, _)| e == edge)
            .map(|(_, id)| *id)
    }

    fn has_capture(&self) -> bool {
        self.children
            .iter()
            .any(|(e, _)| matches!(e, Edge::Capture { .. }))
    }
}

/// The emitted regex and its group tables.
#[derive(Debug, Default)]
pub(crate) struct Emitted {
    pub source: String,
    /// `(group, leaf)` for every leaf marker, in emission order.
    pub leaf_groups: Vec<(usize, usize)>,
    /// Capture group of each `Capture` node, keyed by node id.
    pub capture_groups: HashMap<usize, usize>,
}

/// Arena-allocated segment tree. Node 0 is the root.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Insert a dynamic leaf. Returns the node id reached by each step.
    pub fn insert(&mut self, steps: &[Step], leaf: usize) -> Result<Vec<usize>, Conflict> {
        let mut current = 0;
        let mut trail = Vec::with_capacity(steps.len());

        for step in steps {
            let next = match self.nodes[current].child(&step.edge) {
                Some(id) => id,
                None => {
                    let siblings = &self.nodes[current].children;
                    let clash = match step.edge {
                        Edge::Literal(_) => self.nodes[current].has_capture(),
                        Edge::Capture { .. } => siblings
                            .iter()
                            .any(|(e, _)| matches!(e, Edge::Literal(_) | Edge::Capture { .. })),
                        Edge::Tail | Edge::Any => false,
                    };
                    let node = &self.nodes[current];
                    let branches = node.spans && (node.leaf.is_some() || !node.children.is_empty());
                    if clash || branches {
                        return Err(Conflict);
                    }

                    let id = self.nodes.len();
                    self.nodes.push(Node {
                        spans: step.edge.spans(),
                        ..Node::default()
                    });
                    self.nodes[current].children.push((step.edge.clone(), id));
                    id
                }
            };
            trail.push(next);
            current = next;
        }

        let node = &self.nodes[current];
        match node.leaf {
            Some(other) if other != leaf => Err(Conflict),
            None if node.spans && !node.children.is_empty() => Err(Conflict),
            _ => {
                self.nodes[current].leaf = Some(leaf);
                Ok(trail)
            }
        }
    }

    /// Walk a static path without inserting it. Meeting a capture where the
    /// literal branch ends means the static table would shadow a dynamic route.
    pub fn check_static(&self, steps: &[Step]) -> Result<(), Conflict> {
        let mut current = 0;

        for step in steps {
            let node = &self.nodes[current];
            match node.child(&step.edge) {
                Some(id) => current = id,
                None if node.has_capture() => return Err(Conflict),
                None => return Ok(()),
            }
        }

        Ok(())
    }

    /// Flatten the tree into one anchored regex.
    pub fn emit(&self) -> Emitted {
        let mut emitted = Emitted::default();
        let mut next_group = 1;
        let body = self.emit_node(0, 0, &mut emitted, &mut next_group);
        emitted.source = format!("^{body}");
        emitted
    }

    fn emit_node(&self, id: usize, depth: usize, out: &mut Emitted, next_group: &mut usize) -> String {
        let node = &self.nodes[id];
        let mut alternatives = Vec::with_capacity(node.children.len() + 1);

        if let Some(leaf) = node.leaf {
            out.leaf_groups.push((*next_group, leaf));
            *next_group += 1;
            alternatives.push("($)".to_string());
        }

        let mut children: Vec<&(Edge, usize)> = node.children.iter().collect();
        children.sort_by(|(a, _), (b, _)| {
            a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
                (Edge::Literal(x), Edge::Literal(y)) => x.cmp(y),
                _ => std::cmp::Ordering::Equal,
            })
        });

        let sep = if depth > 0 { "/" } else { "" };
        for (edge, child) in children {
            let mut alternative = match edge {
                Edge::Literal(text) => format!("{sep}{}", regex_lite::escape(text)),
                Edge::Capture { source, groups } => {
                    out.capture_groups.insert(*child, *next_group);
                    *next_group += 1 + groups;
                    format!("{sep}({source})")
                }
                Edge::Tail => "(?:/.*)?".to_string(),
                Edge::Any => ".*".to_string(),
            };
            alternative.push_str(&self.emit_node(*child, depth + 1, out, next_group));
            alternatives.push(alternative);
        }

        match alternatives.len() {
            0 => String::new(),
            1 => alternatives.pop().unwrap_or_default(),
            _ => format!("(?:{})", alternatives.join("|")),
        }
    }
}
