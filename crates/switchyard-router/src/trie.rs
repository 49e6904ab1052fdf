use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RouterError;
use crate::path::expand_optional;
use crate::pattern::{parse_path, Pattern};
use crate::{Match, Params, RouteMatcher, METHOD_ALL};

/// Segment trie router. Walks the trie on every lookup and accepts any
/// route set, so it is the fallback of last resort for [`crate::SmartMatcher`].
#[derive(Debug)]
pub struct TrieMatcher<H> {
    root: Node,
    /// Handlers indexed by insertion score. Optional variants of one
    /// registration share a score.
    handlers: Vec<H>,
}

/// A single node in the segment trie.
#[derive(Debug, Default)]
struct Node {
    /// Static children keyed by segment text.
    static_children: HashMap<String, Node>,
    /// Parameter children, in insertion order, keyed by their raw label.
    param_children: Vec<ParamNode>,
    /// Wildcard child. Mid-path it stands for one segment; its own handlers
    /// belong to a trailing `*` and match any remaining segments.
    wildcard_child: Option<Box<Node>>,
    /// Handler scores attached here, per method. `ALL` registrations are
    /// merged into every method list so lookups never filter.
    methods: HashMap<String, Vec<usize>>,
}

/// A parameter segment node.
#[derive(Debug)]
struct ParamNode {
    /// Segment as written, e.g. `:id` or `:id{[0-9]+}`.
    label: String,
    pattern: Arc<Pattern>,
    node: Node,
}

/// A live branch of the search: a node plus the parameters bound on the
/// way to it.
struct Candidate<'t, 'p> {
    node: &'t Node,
    params: Vec<(&'t str, &'p str)>,
}

struct Hit<'t, 'p> {
    score: usize,
    params: Vec<(&'t str, &'p str)>,
}

impl<H> Default for TrieMatcher<H> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            handlers: Vec::new(),
        }
    }
}

impl<H> TrieMatcher<H> {
    /// Create a new empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Collect every handler entry reachable for `path`, unsorted.
    fn search<'t, 'p>(&'t self, method: &str, path: &'p str) -> Vec<Hit<'t, 'p>> {
        let parts: Vec<&'p str> = path.split('/').collect();
        let mut starts = Vec::with_capacity(parts.len());
        let mut offset = 0;
        for part in &parts {
            starts.push(offset);
            offset += part.len() + 1;
        }
        let last = parts.len() - 1;

        // queue[i] holds the candidates that consume segment i next. A
        // constrained parameter spanning several segments resumes further on.
        let mut queue: Vec<Vec<Candidate<'t, 'p>>> = (0..=parts.len()).map(|_| Vec::new()).collect();
        queue[0].push(Candidate {
            node: &self.root,
            params: Vec::new(),
        });
        let mut hits = Vec::new();

        for i in 0..parts.len() {
            let part = parts[i];
            let is_last = i == last;

            for Candidate { node, params } in std::mem::take(&mut queue[i]) {
                if let Some(child) = node.static_children.get(part) {
                    if is_last {
                        child.collect_terminal(method, &params, &mut hits);
                    } else {
                        queue[i + 1].push(Candidate {
                            node: child,
                            params: params.clone(),
                        });
                    }
                }

                if let Some(wildcard) = node.wildcard_child.as_deref() {
                    wildcard.collect(method, &params, &mut hits);
                    if !part.is_empty() {
                        if is_last {
                            // One segment for `*`, zero for a trailing `*` after it.
                            if let Some(tail) = wildcard.wildcard_child.as_deref() {
                                tail.collect(method, &params, &mut hits);
                            }
                        } else {
                            queue[i + 1].push(Candidate {
                                node: wildcard,
                                params: params.clone(),
                            });
                        }
                    }
                }

                for child in &node.param_children {
                    match child.pattern.as_ref() {
                        Pattern::Param { name } => {
                            if part.is_empty() {
                                continue;
                            }
                            let mut bound = params.clone();
                            bound.push((name.as_str(), part));
                            if is_last {
                                child.node.collect_terminal(method, &bound, &mut hits);
                            } else {
                                queue[i + 1].push(Candidate {
                                    node: &child.node,
                                    params: bound,
                                });
                            }
                        }
                        Pattern::Constrained { name, constraint } => {
                            for end in i..=last {
                                let text = &path[starts[i]..starts[end] + parts[end].len()];
                                if !constraint.is_match(text) {
                                    continue;
                                }
                                let mut bound = params.clone();
                                bound.push((name.as_str(), text));
                                if end == last {
                                    child.node.collect_terminal(method, &bound, &mut hits);
                                } else {
                                    queue[end + 1].push(Candidate {
                                        node: &child.node,
                                        params: bound,
                                    });
                                }
                            }
                        }
                        Pattern::Static(_) | Pattern::Wildcard => {}
                    }
                }
            }
        }

        hits
    }
}

impl Node {
    /// Traverse or create nodes for a parsed path.
    fn insert(&mut self, segments: &[Arc<Pattern>]) -> &mut Node {
        let mut current = self;

        for pattern in segments {
            current = match pattern.as_ref() {
                Pattern::Static(text) => current.static_children.entry(text.clone()).or_default(),
                Pattern::Wildcard => current
                    .wildcard_child
                    .get_or_insert_with(Box::default)
                    .as_mut(),
                Pattern::Param { .. } | Pattern::Constrained { .. } => {
                    let label = pattern.label();
                    let index = match current.param_children.iter().position(|c| c.label == label) {
                        Some(index) => index,
                        None => {
                            current.param_children.push(ParamNode {
                                label,
                                pattern: Arc::clone(pattern),
                                node: Node::default(),
                            });
                            current.param_children.len() - 1
                        }
                    };
                    &mut current.param_children[index].node
                }
            };
        }

        current
    }

    /// Record a handler score under `method`.
    fn attach(&mut self, method: &str, score: usize) {
        if method == METHOD_ALL {
            self.methods.values_mut().for_each(|scores| scores.push(score));
            self.methods
                .entry(METHOD_ALL.to_string())
                .or_insert_with(|| vec![score]);
            return;
        }

        if !self.methods.contains_key(method) {
            let inherited = self.methods.get(METHOD_ALL).cloned().unwrap_or_default();
            self.methods.insert(method.to_string(), inherited);
        }
        if let Some(scores) = self.methods.get_mut(method) {
            scores.push(score);
        }
    }

    fn handlers_for(&self, method: &str) -> Option<&Vec<usize>> {
        self.methods
            .get(method)
            .or_else(|| self.methods.get(METHOD_ALL))
    }

    fn collect<'t, 'p>(
        &'t self,
        method: &str,
        params: &[(&'t str, &'p str)],
        hits: &mut Vec<Hit<'t, 'p>>,
    ) {
        if let Some(scores) = self.handlers_for(method) {
            hits.extend(scores.iter().map(|&score| Hit {
                score,
                params: params.to_vec(),
            }));
        }
    }

    /// Collect a node reached by the last segment, plus its trailing
    /// wildcard (`/a/*` matches `/a`).
    fn collect_terminal<'t, 'p>(
        &'t self,
        method: &str,
        params: &[(&'t str, &'p str)],
        hits: &mut Vec<Hit<'t, 'p>>,
    ) {
        self.collect(method, params, hits);
        if let Some(wildcard) = self.wildcard_child.as_deref() {
            wildcard.collect(method, params, hits);
        }
    }
}

impl<H: Clone + Send + Sync> RouteMatcher<H> for TrieMatcher<H> {
    fn name(&self) -> &'static str {
        "trie"
    }

    fn add(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouterError> {
        let variants = expand_optional(path).unwrap_or_else(|| vec![path.to_string()]);
        let parsed = variants
            .iter()
            .map(|variant| parse_path(variant))
            .collect::<Result<Vec<_>, _>>()?;

        let score = self.handlers.len();
        self.handlers.push(handler);
        for segments in parsed {
            self.root.insert(&segments).attach(method, score);
        }

        Ok(())
    }

    fn lookup(&self, method: &str, path: &str) -> Result<Option<Match<H>>, RouterError> {
        let mut hits = self.search(method, path);
        if hits.is_empty() {
            return Ok(None);
        }

        // Stable: hits of one registration keep their traversal order, and
        // every variant that matched contributes its bindings.
        hits.sort_by_key(|hit| hit.score);

        let mut params = Params::new();
        let mut handlers = Vec::with_capacity(hits.len());
        let mut previous = None;
        for hit in &hits {
            if previous != Some(hit.score) {
                handlers.push(self.handlers[hit.score].clone());
                previous = Some(hit.score);
            }
            for (name, value) in &hit.params {
                params.insert_first(name, value);
            }
        }

        Ok(Some(Match { handlers, params }))
    }
}
