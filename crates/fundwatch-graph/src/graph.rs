//! Co-investment graph construction

use crate::{FundingRound, GraphError};
use fundwatch_domain::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Kind of relationship an edge records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// An investor took part in a company's round
    InvestorCompany,
    /// Two investors took part in the same round
    InvestorInvestor,
}

/// A node of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Entity id
    pub id: EntityId,
    /// Company or investor
    pub kind: EntityKind,
    /// Display name, empty when the entity was not in the name table
    pub name: String,
}

/// A weighted pairwise relationship
///
/// For investor-company edges `a` is the investor and `b` the company. For
/// investor-investor edges `a < b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// First endpoint
    pub a: EntityId,
    /// Second endpoint
    pub b: EntityId,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Rounds in which the pair appeared together
    pub co_occurrence_count: u64,
    /// Sum of the amounts of those rounds, in minor units
    pub total_amount: i64,
    /// `co_occurrence_count` over the largest count of the same kind in this build
    pub strength: f64,
}

/// Size and density figures of one snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Investor nodes
    pub investors: usize,
    /// Company nodes
    pub companies: usize,
    /// Investor-company edges
    pub investor_company_edges: usize,
    /// Investor-investor edges
    pub investor_investor_edges: usize,
    /// `2E / (n(n-1))` over investors, 0 below two investors
    pub investor_density: f64,
    /// `E / (investors * companies)`, 0 when either side is empty
    pub investor_company_density: f64,
}

impl GraphMetrics {
    fn compute(nodes: &[Node], edges: &[RelationshipEdge]) -> Self {
        let investors = nodes.iter().filter(|n| n.kind == EntityKind::Investor).count();
        let companies = nodes.len() - investors;
        let ic = edges.iter().filter(|e| e.kind == EdgeKind::InvestorCompany).count();
        let ii = edges.len() - ic;

        let investor_density = if investors >= 2 {
            (2 * ii) as f64 / (investors * (investors - 1)) as f64
        } else {
            0.0
        };
        let investor_company_density = if investors > 0 && companies > 0 {
            ic as f64 / (investors * companies) as f64
        } else {
            0.0
        };

        Self {
            investors,
            companies,
            investor_company_edges: ic,
            investor_investor_edges: ii,
            investor_density,
            investor_company_density,
        }
    }
}

/// An immutable snapshot of the co-investment graph
///
/// Strength values are relative to this snapshot only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes sorted by id
    pub nodes: Vec<Node>,
    /// Edges sorted by (kind, a, b)
    pub edges: Vec<RelationshipEdge>,
    /// Build time supplied by the caller
    pub built_at: u64,
    /// Size and density figures
    pub metrics: GraphMetrics,
}

impl Graph {
    /// Edges of one kind
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// The edge between two entities, in either order
    pub fn edge(&self, kind: EdgeKind, x: EntityId, y: EntityId) -> Option<&RelationshipEdge> {
        self.edges_of(kind)
            .find(|e| (e.a == x && e.b == y) || (e.a == y && e.b == x))
    }

    /// Pretty JSON; identical input gives identical bytes
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Default)]
struct Tally {
    count: u64,
    amount: i64,
}

impl Tally {
    fn add(&mut self, amount: i64) {
        self.count += 1;
        self.amount = self.amount.saturating_add(amount);
    }
}

/// Build a graph from funding rounds
///
/// Pure: the output depends only on the arguments, never on input order.
/// `names` supplies node kinds and display names; entities missing from it
/// keep the role they play in the rounds and an empty name. The cancel flag
/// is checked before each round; a cancelled build returns
/// [`GraphError::Cancelled`] and no graph.
pub fn build(
    rounds: &[FundingRound],
    names: &BTreeMap<EntityId, (EntityKind, String)>,
    built_at: u64,
    cancel: &AtomicBool,
) -> Result<Graph, GraphError> {
    let mut tallies: BTreeMap<(EdgeKind, EntityId, EntityId), Tally> = BTreeMap::new();
    let mut companies: BTreeSet<EntityId> = BTreeSet::new();
    let mut investors: BTreeSet<EntityId> = BTreeSet::new();

    for (done, round) in rounds.iter().enumerate() {
        if cancel.load(Ordering::Acquire) {
            info!(rounds_done = done, "Graph build cancelled");
            return Err(GraphError::Cancelled {
                rounds_done: done,
                rounds_total: rounds.len(),
            });
        }

        let amount = round.amount.unwrap_or(0);
        companies.insert(round.company);
        investors.extend(round.investors.iter().copied());

        for investor in &round.investors {
            tallies
                .entry((EdgeKind::InvestorCompany, *investor, round.company))
                .or_default()
                .add(amount);
        }

        // BTreeSet iteration is ascending, so a < b
        let members: Vec<EntityId> = round.investors.iter().copied().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                tallies
                    .entry((EdgeKind::InvestorInvestor, *a, *b))
                    .or_default()
                    .add(amount);
            }
        }
        debug!(company = %round.company, round = %round.round, investors = members.len(), "Round added");
    }

    let mut max_count: BTreeMap<EdgeKind, u64> = BTreeMap::new();
    for ((kind, _, _), tally) in &tallies {
        let max = max_count.entry(*kind).or_insert(0);
        *max = (*max).max(tally.count);
    }

    let edges: Vec<RelationshipEdge> = tallies
        .into_iter()
        .map(|((kind, a, b), tally)| {
            let max = max_count.get(&kind).copied().unwrap_or(1).max(1);
            RelationshipEdge {
                a,
                b,
                kind,
                co_occurrence_count: tally.count,
                total_amount: tally.amount,
                strength: tally.count as f64 / max as f64,
            }
        })
        .collect();

    let mut roles: BTreeMap<EntityId, EntityKind> = BTreeMap::new();
    for id in &companies {
        roles.insert(*id, EntityKind::Company);
    }
    for id in &investors {
        roles.entry(*id).or_insert(EntityKind::Investor);
    }
    let nodes: Vec<Node> = roles
        .into_iter()
        .map(|(id, role)| match names.get(&id) {
            Some((kind, name)) => Node { id, kind: *kind, name: name.clone() },
            None => Node { id, kind: role, name: String::new() },
        })
        .collect();

    let metrics = GraphMetrics::compute(&nodes, &edges);
    info!(
        rounds = rounds.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        investor_density = metrics.investor_density,
        "Graph built"
    );

    Ok(Graph { nodes, edges, built_at, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = (0..n).map(|i| EntityId::from_value(i as u128 + 1)).collect();
        ids.sort();
        ids
    }

    fn round(company: EntityId, label: &str, amount: i64, investors: &[EntityId]) -> FundingRound {
        FundingRound {
            company,
            round: label.to_string(),
            amount: Some(amount),
            investors: investors.iter().copied().collect(),
        }
    }

    #[test]
    fn test_strength_normalized_per_kind() {
        let id = ids(4);
        let (c1, c2, x, y) = (id[0], id[1], id[2], id[3]);
        let rounds = vec![
            round(c1, "seed", 100, &[x, y]),
            round(c1, "series_a", 300, &[x, y]),
            round(c2, "seed", 50, &[x]),
        ];
        let graph = build(&rounds, &BTreeMap::new(), 0, &AtomicBool::new(false)).unwrap();

        let xy = graph.edge(EdgeKind::InvestorInvestor, y, x).unwrap();
        assert_eq!(xy.co_occurrence_count, 2);
        assert_eq!(xy.total_amount, 400);
        assert_eq!(xy.strength, 1.0);

        let x_c2 = graph.edge(EdgeKind::InvestorCompany, x, c2).unwrap();
        assert_eq!(x_c2.co_occurrence_count, 1);
        assert_eq!(x_c2.strength, 0.5);
        assert!(graph.edges.iter().all(|e| (0.0..=1.0).contains(&e.strength)));
    }

    #[test]
    fn test_metrics_densities() {
        let id = ids(5);
        let (c1, c2, x, y, z) = (id[0], id[1], id[2], id[3], id[4]);
        let mut names = BTreeMap::new();
        names.insert(c1, (EntityKind::Company, "C1".to_string()));
        names.insert(c2, (EntityKind::Company, "C2".to_string()));
        let rounds = vec![round(c1, "seed", 0, &[x, y]), round(c2, "seed", 0, &[z])];
        let graph = build(&rounds, &names, 0, &AtomicBool::new(false)).unwrap();

        let m = &graph.metrics;
        assert_eq!((m.investors, m.companies), (3, 2));
        assert_eq!(m.investor_investor_edges, 1);
        assert_eq!(m.investor_company_edges, 3);
        assert!((m.investor_density - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.investor_company_density - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let graph = build(&[], &BTreeMap::new(), 7, &AtomicBool::new(false)).unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.metrics, GraphMetrics::default());
        assert_eq!(graph.built_at, 7);
    }

    #[test]
    fn test_cancelled_build_returns_nothing() {
        let id = ids(2);
        let rounds = vec![round(id[0], "seed", 0, &[id[1]])];
        let err = build(&rounds, &BTreeMap::new(), 0, &AtomicBool::new(true)).unwrap_err();
        assert!(matches!(err, GraphError::Cancelled { rounds_done: 0, rounds_total: 1 }));
    }
}
