//! Strongly connected components.
//!
//! Iterative Tarjan over an insertion-ordered node set. Components are
//! emitted in reverse topological order: by the time a component is emitted,
//! every successor outside it has already been emitted. The re-resolution
//! caches rely on exactly that ordering.

use std::hash::Hash;

use indexmap::IndexSet;

/// Computes the strongly connected components of the graph over `nodes`.
///
/// `successors` is consulted once per node; successors outside `nodes` are
/// ignored. The result is deterministic for a fixed insertion order of
/// `nodes` and of each successor list.
pub(crate) fn strongly_connected_components<T, F, I>(
    nodes: &IndexSet<T>,
    mut successors: F,
) -> Vec<Vec<T>>
where
    T: Clone + Eq + Hash,
    F: FnMut(&T) -> I,
    I: IntoIterator<Item = T>,
{
    let successor_indices: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| {
            successors(node)
                .into_iter()
                .filter_map(|successor| nodes.get_index_of(&successor))
                .collect()
        })
        .collect();

    let n = nodes.len();
    let mut components = Vec::new();
    let mut order = vec![usize::MAX; n];
    let mut lowlink = vec![usize::MAX; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_order = 0;

    for root in 0..n {
        if order[root] != usize::MAX {
            continue;
        }
        // (node, next successor to look at)
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(&mut (v, ref mut cursor)) = frames.last_mut() {
            if *cursor == 0 {
                order[v] = next_order;
                lowlink[v] = next_order;
                next_order += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            if let Some(&w) = successor_indices[v].get(*cursor) {
                *cursor += 1;
                if order[w] == usize::MAX {
                    frames.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(order[w]);
                }
            } else {
                if lowlink[v] == order[v] {
                    let mut component = Vec::new();
                    loop {
                        let w = stack.pop().expect("component members are on the stack");
                        on_stack[w] = false;
                        component.push(
                            nodes
                                .get_index(w)
                                .expect("indices come from this set")
                                .clone(),
                        );
                        if w == v {
                            break;
                        }
                    }
                    components.push(component);
                }
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
            }
        }
    }
    components
}
