//! Cycle detection over the task dependency graph.
//!
//! Edge direction: dep -> task. For
//!
//! ```text
//! { "id": "B", "dependencies": ["A"] }
//! ```
//!
//! we add edge A -> B (A must complete before B). Ids that only appear as a
//! dependency target are still graph nodes.
//!
//! The traversal is an iterative depth-first search with three node states.
//! A node stays in-progress while it sits on the traversal stack; when the
//! search closes a strongly connected component, the component is popped off
//! the stack in one slice and reported if it forms a cycle. This reports every
//! node lying on some cycle and nothing that is merely reachable from one.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Finished,
}

/// Adjacency lists keyed by dense node index.
#[derive(Debug, Default)]
struct DependencyGraph<'a> {
    ids: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    dependents: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    fn from_tasks(tasks: &'a [Task]) -> Self {
        let mut graph = Self::default();
        for task in tasks {
            let Some(id) = task.id() else { continue };
            let node = graph.node(id);
            for dep in &task.dependencies {
                let from = graph.node(dep);
                graph.dependents[from].push(node);
            }
        }
        graph
    }

    fn node(&mut self, id: &'a str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id);
        self.index.insert(id, idx);
        self.dependents.push(Vec::new());
        idx
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn has_self_loop(&self, node: usize) -> bool {
        self.dependents[node].contains(&node)
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    next_edge: usize,
}

/// Return the ids of every task that participates in a dependency cycle.
///
/// A task depending on itself is a one-node cycle. Tasks without an id are
/// ignored.
pub fn detect_cycles(tasks: &[Task]) -> BTreeSet<String> {
    let graph = DependencyGraph::from_tasks(tasks);
    let n = graph.len();

    let mut color = vec![Color::Unvisited; n];
    // Discovery order and the lowest discovery order reachable through
    // nodes still on the stack.
    let mut order = vec![0usize; n];
    let mut low = vec![0usize; n];
    let mut stack_pos = vec![0usize; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut counter = 0usize;
    let mut cyclic = BTreeSet::new();

    for root in 0..n {
        if color[root] != Color::Unvisited {
            continue;
        }

        let mut frames = vec![Frame { node: root, next_edge: 0 }];
        enter(root, &mut counter, &mut color, &mut order, &mut low, &mut stack_pos, &mut stack);

        while let Some(frame) = frames.last_mut() {
            let u = frame.node;

            if let Some(&v) = graph.dependents[u].get(frame.next_edge) {
                frame.next_edge += 1;
                match color[v] {
                    Color::Unvisited => {
                        enter(v, &mut counter, &mut color, &mut order, &mut low, &mut stack_pos, &mut stack);
                        frames.push(Frame { node: v, next_edge: 0 });
                    }
                    // back edge into the stack: v and everything above it loop back to v
                    Color::InProgress => low[u] = low[u].min(order[v]),
                    Color::Finished => {}
                }
                continue;
            }

            frames.pop();
            if let Some(parent) = frames.last() {
                low[parent.node] = low[parent.node].min(low[u]);
            }

            if low[u] == order[u] {
                let component = stack.split_off(stack_pos[u]);
                for &w in &component {
                    color[w] = Color::Finished;
                }
                if component.len() > 1 || graph.has_self_loop(u) {
                    cyclic.extend(component.iter().map(|&w| graph.ids[w].to_string()));
                }
            }
        }
    }

    debug!(nodes = n, cyclic = cyclic.len(), "cycle detection finished");
    cyclic
}

fn enter(
    node: usize,
    counter: &mut usize,
    color: &mut [Color],
    order: &mut [usize],
    low: &mut [usize],
    stack_pos: &mut [usize],
    stack: &mut Vec<usize>,
) {
    color[node] = Color::InProgress;
    order[node] = *counter;
    low[node] = *counter;
    *counter += 1;
    stack_pos[node] = stack.len();
    stack.push(node);
}
