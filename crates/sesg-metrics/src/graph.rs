//! Citation graph over the studies of one review.
//!
//! An edge `A → B` means "A references B". Backward snowballing follows
//! edges forward only; full snowballing ignores direction.

use std::collections::{HashMap, HashSet, VecDeque};

use rustworkx_core::petgraph::Direction;
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use sesg_core::entities::CitationEdge;
use sesg_db::service::SesgService;

use crate::error::MetricsError;

/// Edge-direction policy of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Follow references from citing to cited study.
    Directed,
    /// Follow references both ways.
    Undirected,
}

/// Directed reference graph keyed by study id.
pub struct CitationGraph {
    graph: DiGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl CitationGraph {
    /// Build a graph over `study_ids` with the given reference edges.
    ///
    /// Studies without edges become isolated nodes.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::UnknownStudy`] if an edge names a study
    /// outside `study_ids`.
    pub fn from_edges<'a>(
        study_ids: impl IntoIterator<Item = &'a str>,
        edges: &[CitationEdge],
    ) -> Result<Self, MetricsError> {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();
        for id in study_ids {
            id_to_index
                .entry(id.to_string())
                .or_insert_with(|| graph.add_node(id.to_string()));
        }

        for edge in edges {
            let from = *id_to_index
                .get(&edge.from_study_id)
                .ok_or_else(|| MetricsError::UnknownStudy(edge.from_study_id.clone()))?;
            let to = *id_to_index
                .get(&edge.to_study_id)
                .ok_or_else(|| MetricsError::UnknownStudy(edge.to_study_id.clone()))?;
            graph.update_edge(from, to, ());
        }

        Ok(Self { graph, id_to_index })
    }

    /// Build the graph of a review's GS from the store.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Database`] if reading studies or edges fails.
    pub async fn from_service(service: &SesgService, review_id: &str) -> Result<Self, MetricsError> {
        let studies = service.list_gs(review_id).await?;
        let edges = service.list_citation_edges(review_id).await?;
        Self::from_edges(studies.iter().map(|s| s.id.as_str()), &edges)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Breadth-first reachability from `starts`, start nodes included.
    ///
    /// Ids are returned in visit order and never repeated. Unknown start
    /// ids are ignored.
    #[must_use]
    pub fn bfs<S: AsRef<str>>(&self, policy: Traversal, starts: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        for start in starts {
            if let Some(&idx) = self.id_to_index.get(start.as_ref()) {
                if seen.insert(idx) {
                    queue.push_back(idx);
                }
            }
        }

        while let Some(idx) = queue.pop_front() {
            order.push(self.graph[idx].clone());
            let neighbors: Vec<NodeIndex> = match policy {
                Traversal::Directed => self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .collect(),
                Traversal::Undirected => self.graph.neighbors_undirected(idx).collect(),
            };
            for next in neighbors {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }
}
