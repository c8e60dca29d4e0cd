//! Connection manager (spec.md §4.8): a capped pool of peer sessions with
//! priority-based admission and rotation, and a periodic health sweep that
//! evicts stale links.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ledger_core::NodeId;

/// A connection's health bucket, derived purely from inactivity age.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    Good,
    Degraded,
    Stale,
}

/// Inputs to priority scoring for one connection/candidate: chain-length
/// advantage over us, how recently it connected, and whether it's a full
/// or light client. Kept as plain fields (not derived internally) so the
/// caller supplies fresh numbers each time priority is computed.
#[derive(Clone, Debug)]
pub struct PriorityInputs {
    pub chain_length_advantage: i64,
    pub connected_for: Duration,
    pub is_full_node: bool,
}

/// Weighted priority score: chain-length advantage dominates (peers ahead
/// of us are the most valuable sync sources), full nodes outrank light
/// clients, and longer-lived connections get a small stability bonus.
pub fn priority_score(inputs: &PriorityInputs) -> f64 {
    let advantage = inputs.chain_length_advantage as f64 * 10.0;
    let node_type_bonus = if inputs.is_full_node { 5.0 } else { 0.0 };
    let stability_bonus = (inputs.connected_for.as_secs_f64() / 60.0).min(10.0);
    advantage + node_type_bonus + stability_bonus
}

struct TrackedConnection {
    last_activity: Instant,
    priority: f64,
}

/// Tracks active connections purely for admission/rotation/health
/// decisions; it does not own the actual transport sessions, only
/// bookkeeping about them (spec.md §5: "the connection manager holds weak
/// references for priority accounting").
pub struct ConnectionManager {
    max_connections: usize,
    min_connections: usize,
    health_check_interval: Duration,
    connections: HashMap<NodeId, TrackedConnection>,
}

impl ConnectionManager {
    pub fn new(max_connections: usize, min_connections: usize, health_check_interval: Duration) -> Self {
        Self {
            max_connections,
            min_connections,
            health_check_interval,
            connections: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_full(&self) -> bool {
        self.connections.len() >= self.max_connections
    }

    pub fn needs_more(&self) -> bool {
        self.connections.len() < self.min_connections
    }

    pub fn record(&mut self, peer_id: NodeId, priority: f64) {
        self.connections.insert(
            peer_id,
            TrackedConnection {
                last_activity: Instant::now(),
                priority,
            },
        );
    }

    pub fn touch(&mut self, peer_id: &NodeId) {
        if let Some(conn) = self.connections.get_mut(peer_id) {
            conn.last_activity = Instant::now();
        }
    }

    pub fn remove(&mut self, peer_id: &NodeId) {
        self.connections.remove(peer_id);
    }

    fn weakest(&self) -> Option<(NodeId, f64)> {
        self.connections
            .iter()
            .min_by(|a, b| a.1.priority.partial_cmp(&b.1.priority).unwrap())
            .map(|(id, conn)| (id.clone(), conn.priority))
    }

    /// Admission decision for a new candidate: always admit while under
    /// capacity; once full, admit only if the candidate strictly
    /// outranks the current weakest connection, which is then evicted.
    /// Returns the peer id to evict, if any, alongside the admit decision.
    pub fn admit(&mut self, candidate_priority: f64) -> (bool, Option<NodeId>) {
        if !self.is_full() {
            return (true, None);
        }
        match self.weakest() {
            Some((weakest_id, weakest_priority)) if candidate_priority > weakest_priority => {
                self.connections.remove(&weakest_id);
                (true, Some(weakest_id))
            }
            _ => (false, None),
        }
    }

    /// Classify every tracked connection's health by inactivity age:
    /// within one health-check interval is `Good`, within three is
    /// `Degraded`, beyond that is `Stale`.
    pub fn health_sweep(&self) -> Vec<(NodeId, Health)> {
        self.connections
            .iter()
            .map(|(id, conn)| {
                let age = conn.last_activity.elapsed();
                let health = if age <= self.health_check_interval {
                    Health::Good
                } else if age <= self.health_check_interval * 3 {
                    Health::Degraded
                } else {
                    Health::Stale
                };
                (id.clone(), health)
            })
            .collect()
    }

    pub fn stale_peers(&self) -> Vec<NodeId> {
        self.health_sweep()
            .into_iter()
            .filter(|(_, health)| *health == Health::Stale)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_freely_under_capacity() {
        let mut mgr = ConnectionManager::new(2, 1, Duration::from_secs(60));
        let (admitted, evicted) = mgr.admit(1.0);
        assert!(admitted);
        assert!(evicted.is_none());
        mgr.record(NodeId::new("node_a"), 1.0);
        assert!(!mgr.is_full());
    }

    #[test]
    fn rotation_evicts_the_weakest_connection_when_full() {
        let mut mgr = ConnectionManager::new(1, 1, Duration::from_secs(60));
        mgr.record(NodeId::new("node_weak"), 1.0);
        assert!(mgr.is_full());

        let (admitted, evicted) = mgr.admit(5.0);
        assert!(admitted);
        assert_eq!(evicted, Some(NodeId::new("node_weak")));
    }

    #[test]
    fn does_not_evict_for_a_weaker_or_equal_candidate() {
        let mut mgr = ConnectionManager::new(1, 1, Duration::from_secs(60));
        mgr.record(NodeId::new("node_strong"), 5.0);
        let (admitted, evicted) = mgr.admit(5.0);
        assert!(!admitted);
        assert!(evicted.is_none());
    }

    #[test]
    fn needs_more_below_minimum() {
        let mgr = ConnectionManager::new(10, 3, Duration::from_secs(60));
        assert!(mgr.needs_more());
    }
}
