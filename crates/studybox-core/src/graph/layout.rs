//! Hierarchical (top-to-bottom) layout.
//!
//! 1. Cycle breaking: a depth-first search in first-appearance order marks
//!    every edge that points back onto the search stack. Back-edges and
//!    self-loops are ignored for ranking but are still rendered.
//! 2. Ranking: longest path from the sources over the remaining acyclic edges.
//! 3. Ordering: barycenter sweeps between adjacent ranks, keeping the ordering
//!    with the fewest crossings seen so far.
//! 4. Coordinates: every rank is centered under the widest rank; positions are
//!    the top-left corner of the node footprint.
//!
//! Every step is deterministic, so identical input yields identical output.

use super::Position;
use crate::config::LayoutConfig;
use std::collections::VecDeque;
use tracing::debug;

/// Placement of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub rank: usize,
    pub position: Position,
}

/// Lays out `node_count` nodes connected by `links` (pairs of node indices).
pub fn layout(node_count: usize, links: &[(usize, usize)], config: &LayoutConfig) -> Vec<Slot> {
    if node_count == 0 {
        return Vec::new();
    }

    let acyclic = acyclic_links(node_count, links);
    let ranks = assign_ranks(node_count, &acyclic);
    let mut layers = initial_layers(&ranks);
    reduce_crossings(&mut layers, &ranks, &acyclic, config.sweeps);

    debug!(
        nodes = node_count,
        links = links.len(),
        ignored = links.len() - acyclic.len(),
        ranks = layers.len(),
        "[Layout] Hierarchical layout computed"
    );

    place(&layers, node_count, config)
}

/// Drops self-loops and DFS back-edges.
fn acyclic_links(node_count: usize, links: &[(usize, usize)]) -> Vec<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (i, &(source, target)) in links.iter().enumerate() {
        if source != target {
            outgoing[source].push(i);
        }
    }

    let mut back = vec![false; links.len()];
    let mut marks = vec![Mark::Unvisited; node_count];

    for start in 0..node_count {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, cursor into its outgoing links)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::OnStack;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&link) = outgoing[node].get(top.1) {
                top.1 += 1;
                let target = links[link].1;
                match marks[target] {
                    Mark::OnStack => back[link] = true,
                    Mark::Unvisited => {
                        marks[target] = Mark::OnStack;
                        stack.push((target, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    links
        .iter()
        .enumerate()
        .filter(|&(i, &(source, target))| source != target && !back[i])
        .map(|(_, &link)| link)
        .collect()
}

/// Longest-path ranking via Kahn's algorithm.
fn assign_ranks(node_count: usize, links: &[(usize, usize)]) -> Vec<usize> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];
    for &(source, target) in links {
        successors[source].push(target);
        indegree[target] += 1;
    }

    let mut ranks = vec![0usize; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| indegree[n] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in &successors[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    ranks
}

fn initial_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut layers = vec![Vec::new(); depth];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }
    layers
}

fn positions_of(layers: &[Vec<usize>], node_count: usize) -> Vec<usize> {
    let mut position = vec![0usize; node_count];
    for layer in layers {
        for (i, &node) in layer.iter().enumerate() {
            position[node] = i;
        }
    }
    position
}

/// Links between ranks `r` and `r + 1`, as (upper node, lower node).
fn adjacent_links(links: &[(usize, usize)], ranks: &[usize], upper: usize) -> Vec<(usize, usize)> {
    links
        .iter()
        .copied()
        .filter(|&(source, target)| ranks[source] == upper && ranks[target] == upper + 1)
        .collect()
}

fn count_crossings(layers: &[Vec<usize>], ranks: &[usize], links: &[(usize, usize)]) -> usize {
    let node_count = ranks.len();
    let position = positions_of(layers, node_count);
    let mut crossings = 0;
    for upper in 0..layers.len().saturating_sub(1) {
        let between = adjacent_links(links, ranks, upper);
        for (i, &(a_up, a_down)) in between.iter().enumerate() {
            for &(b_up, b_down) in &between[i + 1..] {
                let up = position[a_up].cmp(&position[b_up]);
                let down = position[a_down].cmp(&position[b_down]);
                if up.is_ne() && down.is_ne() && up != down {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

/// Reorders `layer` by the mean position of its neighbours in the fixed layer.
fn sort_by_barycenter(
    layer: &mut [usize],
    neighbours: &[Vec<usize>],
    fixed_position: &[usize],
) {
    let mut ordered: Vec<(usize, f64)> = layer
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let adjacent = &neighbours[node];
            let center = if adjacent.is_empty() {
                i as f64
            } else {
                adjacent.iter().map(|&n| fixed_position[n] as f64).sum::<f64>()
                    / adjacent.len() as f64
            };
            (node, center)
        })
        .collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (slot, (node, _)) in layer.iter_mut().zip(ordered) {
        *slot = node;
    }
}

fn reduce_crossings(
    layers: &mut [Vec<usize>],
    ranks: &[usize],
    links: &[(usize, usize)],
    sweeps: usize,
) {
    if layers.len() < 2 {
        return;
    }
    let node_count = ranks.len();
    let mut up: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut down: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(source, target) in links {
        if ranks[target] == ranks[source] + 1 {
            up[target].push(source);
            down[source].push(target);
        }
    }

    let mut best = layers.to_vec();
    let mut best_crossings = count_crossings(layers, ranks, links);

    for _ in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        for r in 1..layers.len() {
            let fixed = positions_of(layers, node_count);
            sort_by_barycenter(&mut layers[r], &up, &fixed);
        }
        for r in (0..layers.len() - 1).rev() {
            let fixed = positions_of(layers, node_count);
            sort_by_barycenter(&mut layers[r], &down, &fixed);
        }
        let crossings = count_crossings(layers, ranks, links);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.to_vec();
        }
    }

    layers.clone_from_slice(&best);
}

fn place(layers: &[Vec<usize>], node_count: usize, config: &LayoutConfig) -> Vec<Slot> {
    let step_x = config.node_width + config.node_sep;
    let step_y = config.node_height + config.rank_sep;
    let span = |count: usize| {
        if count == 0 {
            0.0
        } else {
            count as f64 * config.node_width + (count - 1) as f64 * config.node_sep
        }
    };
    let widest = layers.iter().map(|layer| span(layer.len())).fold(0.0, f64::max);

    let mut slots = vec![
        Slot {
            rank: 0,
            position: Position::default(),
        };
        node_count
    ];
    for (rank, layer) in layers.iter().enumerate() {
        let offset = (widest - span(layer.len())) / 2.0;
        for (i, &node) in layer.iter().enumerate() {
            slots[node] = Slot {
                rank,
                position: Position {
                    x: offset + i as f64 * step_x,
                    y: rank as f64 * step_y,
                },
            };
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_tree_ranks_top_to_bottom() {
        // 0 -> 1, 0 -> 2, 1 -> 3
        let slots = layout(4, &[(0, 1), (0, 2), (1, 3)], &config());
        let ranks: Vec<_> = slots.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 1, 2]);
        assert!(slots[0].position.y < slots[1].position.y);
        assert_eq!(slots[1].position.y, slots[2].position.y);
        assert!(slots[3].position.y > slots[1].position.y);
    }

    #[test]
    fn test_longest_path_rank() {
        // 0 -> 1 -> 2 and the shortcut 0 -> 2
        let slots = layout(3, &[(0, 1), (1, 2), (0, 2)], &config());
        assert_eq!(slots[2].rank, 2);
    }

    #[test]
    fn test_cycle_does_not_break_ranking() {
        // 0 -> 1 -> 2 -> 0 : the closing edge is a back-edge
        let links = [(0, 1), (1, 2), (2, 0)];
        assert_eq!(acyclic_links(3, &links), vec![(0, 1), (1, 2)]);
        let slots = layout(3, &links, &config());
        let ranks: Vec<_> = slots.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_self_loop_ignored() {
        let slots = layout(2, &[(0, 0), (0, 1)], &config());
        assert_eq!(slots[0].rank, 0);
        assert_eq!(slots[1].rank, 1);
    }

    #[test]
    fn test_no_overlap_within_rank() {
        let links: Vec<_> = (1..6).map(|n| (0, n)).collect();
        let cfg = config();
        let slots = layout(6, &links, &cfg);
        let mut xs: Vec<f64> = slots[1..].iter().map(|s| s.position.x).collect();
        xs.sort_by(f64::total_cmp);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= cfg.node_width + cfg.node_sep - 1e-9);
        }
    }

    #[test]
    fn test_parent_centered_over_children() {
        let cfg = config();
        let slots = layout(3, &[(0, 1), (0, 2)], &cfg);
        let children_mid = (slots[1].position.x + slots[2].position.x) / 2.0;
        assert!((slots[0].position.x - children_mid).abs() < 1e-9);
        let min_x = slots.iter().map(|s| s.position.x).fold(f64::MAX, f64::min);
        assert_eq!(min_x, 0.0);
    }

    #[test]
    fn test_barycenter_removes_crossing() {
        // rank 0: a(0) b(1); rank 1: c(2) d(3); a -> d, b -> c crosses in index order
        let links = [(0, 3), (1, 2)];
        let ranks = assign_ranks(4, &links);
        let mut layers = initial_layers(&ranks);
        assert_eq!(count_crossings(&layers, &ranks, &links), 1);
        reduce_crossings(&mut layers, &ranks, &links, 4);
        assert_eq!(count_crossings(&layers, &ranks, &links), 0);
    }
}
