//! Bond-graph projection and molecule assignment.

use std::collections::HashMap;

use petgraph::graph::UnGraph;
use petgraph::visit::Bfs;

use crate::core::models::atom::Atom;
use crate::core::models::system::{index_by_id, LammpsData, LookupError};

/// Edge payload of the bond graph: a bond's fields without its two
/// endpoints, which the edge itself carries.
#[derive(Debug, Clone, PartialEq)]
pub struct BondEdge {
    pub id: usize,
    pub type_id: usize,
    pub comment: Option<String>,
}

impl LammpsData {
    /// Projects the store onto an undirected graph with atoms as nodes and
    /// bonds as edges.
    pub fn to_graph(&self) -> Result<UnGraph<Atom, BondEdge>, LookupError> {
        let mut graph = UnGraph::new_undirected();
        let mut nodes = HashMap::new();
        for atom in self.atoms.iter().flatten() {
            nodes.insert(atom.id, graph.add_node(atom.clone()));
        }
        for bond in self.bonds.iter().flatten() {
            let [a, b] = bond.atoms;
            let source = *nodes.get(&a).ok_or(LookupError::Atom(a))?;
            let target = *nodes.get(&b).ok_or(LookupError::Atom(b))?;
            graph.add_edge(
                source,
                target,
                BondEdge {
                    id: bond.id,
                    type_id: bond.type_id,
                    comment: bond.comment.clone(),
                },
            );
        }
        Ok(graph)
    }

    /// Renumbers molecule ids from bond connectivity.
    ///
    /// Every previous assignment is discarded. Atoms are visited in list
    /// order; an atom with no molecule yet opens the next id (starting at 1)
    /// and every atom reachable from it through bonds gets the same id. Only
    /// the component partition is meaningful, not the traversal order inside
    /// a component.
    pub fn reset_molecule_ids(&mut self) -> Result<(), LookupError> {
        for atom in self.atoms.iter_mut().flatten() {
            atom.molecule_id = None;
        }

        let graph = self.to_graph()?;
        let node_of: HashMap<usize, _> = graph
            .node_indices()
            .map(|node| (graph[node].id, node))
            .collect();
        let positions = index_by_id(&self.atoms, |a| a.id);

        let mut molecule_id = 0i64;
        for position in 0..self.atoms.len() {
            let (atom_id, unassigned) = match self.atoms[position].as_ref() {
                Some(atom) => (atom.id, atom.molecule_id.is_none()),
                None => continue,
            };
            if !unassigned {
                continue;
            }
            molecule_id += 1;
            let &start = node_of.get(&atom_id).ok_or(LookupError::Atom(atom_id))?;
            let mut bfs = Bfs::new(&graph, start);
            while let Some(node) = bfs.next(&graph) {
                let reached_id = graph[node].id;
                let &n = positions
                    .get(&reached_id)
                    .ok_or(LookupError::Atom(reached_id))?;
                if let Some(reached) = self.atoms[n].as_mut() {
                    reached.molecule_id = Some(molecule_id);
                }
            }
        }
        Ok(())
    }
}
