use hashbrown::HashSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{depth_first_search, Bfs, DfsEvent};

// link index -> link index, weighted by the joint connecting them
pub(crate) type LinkGraph = DiGraphMap<usize, usize>;

struct BfsIter<'a> {
    graph: &'a LinkGraph,
    bfs: Bfs<usize, HashSet<usize>>,
}

impl Iterator for BfsIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.bfs.next(self.graph)
    }
}

// BFS traversal of the link graph starting at `start` (included)
// every parent node is visited before its children
pub(super) fn bfs(graph: &LinkGraph, start: usize) -> Vec<usize> {
    let bfs = Bfs::new(graph, start);
    let iter = BfsIter { graph, bfs };
    iter.collect()
}

// DFS pre-order from `start`, children in the order their edges were added
pub(super) fn dfs_preorder(graph: &LinkGraph, start: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(graph.node_count());
    depth_first_search(graph, Some(start), |event| {
        if let DfsEvent::Discover(node, _) = event {
            order.push(node);
        }
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    //      0
    //     / \
    //    1   2
    //   /     \
    //  3       4
    fn tree() -> LinkGraph {
        let mut graph = LinkGraph::new();
        for n in 0..5 {
            graph.add_node(n);
        }
        graph.add_edge(0, 1, 0);
        graph.add_edge(0, 2, 1);
        graph.add_edge(1, 3, 2);
        graph.add_edge(2, 4, 3);
        graph
    }

    #[test]
    fn bfs_visits_level_by_level() {
        assert_eq!(bfs(&tree(), 0), vec![0, 1, 2, 3, 4]);
        assert_eq!(bfs(&tree(), 2), vec![2, 4]);
    }

    #[test]
    fn dfs_preorder_follows_declaration_order() {
        assert_eq!(dfs_preorder(&tree(), 0), vec![0, 1, 3, 2, 4]);
    }

    #[test]
    fn dfs_preorder_skips_unreachable_nodes() {
        let mut graph = tree();
        graph.add_node(7);
        assert_eq!(dfs_preorder(&graph, 0).len(), 5);
    }
}
