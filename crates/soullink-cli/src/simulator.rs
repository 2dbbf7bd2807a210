//! Multi-client replication simulator
//!
//! Drives several [`SessionManager`]s attached to one in-memory remote with a
//! seeded stream of random edits, then checks that every client converges on
//! the remote document.

use crate::commands::{default_players, new_document, DEFAULT_GAME, DEFAULT_RULESET};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use soullink_model::{DocumentPath, Member, Slot, TrackerDocument, TrackerId};
use soullink_progression::{
    add_loss, add_pair, current_level_cap, current_rival_cap, record_legendary_encounter,
    toggle_level_cap, toggle_rival_cap, ProgressionError, Result as ProgressionResult,
};
use soullink_sync::{InMemoryRemoteStore, SessionManager, SyncConfig, SyncError, SyncStatus};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TRACKER: &str = "simulation";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of concurrent clients
    pub clients: usize,
    /// Total edits across all clients
    pub edits: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Remote writes to fail before the first success
    pub fail_writes: usize,
    /// How long to wait for clients to converge after the last edit
    pub settle_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            clients: 2,
            edits: 200,
            seed: 42,
            fail_writes: 0,
            settle_timeout: Duration::from_secs(10),
        }
    }
}

/// Simulated local edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedEdit {
    /// Complete the next level cap
    ToggleLevelCap,
    /// Complete the next rival encounter
    ToggleRivalCap,
    /// Catch a new pair into the box
    Catch,
    /// Lose the first team or box pair
    Loss,
    /// Count a legendary encounter
    Legendary,
}

impl SimulatedEdit {
    fn random(rng: &mut StdRng) -> Self {
        match rng.random_range(0..5) {
            0 => Self::ToggleLevelCap,
            1 => Self::ToggleRivalCap,
            2 => Self::Catch,
            3 => Self::Loss,
            _ => Self::Legendary,
        }
    }
}

/// Counters collected during a run
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Edits accepted by a local store
    pub edits_applied: u64,
    /// Edits refused by the progression rules
    pub edits_rejected: u64,
    /// Edits attempted without an active document
    pub edits_skipped: u64,
    /// Successful remote writes over all clients
    pub published: u64,
    /// Remote changes not written back
    pub suppressed_echoes: u64,
    /// Writes that failed after all retries
    pub failed_writes: u64,
    /// Writes accepted by the remote store
    pub remote_writes: usize,
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration of the run
    pub config: SimulatorConfig,
    /// Collected counters
    pub stats: SimulatorStats,
    /// Divergence, publish and invariant failures
    pub violations: Vec<String>,
    /// Remote document after the settle phase
    pub final_document: Option<TrackerDocument>,
}

impl SimulatorReport {
    /// Check if every client converged without violations
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::from("=== Soullink Replication Simulator ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Clients: {}", self.config.clients);
        let _ = writeln!(report, "Edits Applied: {}", self.stats.edits_applied);
        let _ = writeln!(report, "Edits Rejected: {}", self.stats.edits_rejected);
        let _ = writeln!(report, "Edits Skipped: {}", self.stats.edits_skipped);
        let _ = writeln!(report, "Published: {}", self.stats.published);
        let _ = writeln!(report, "Suppressed Echoes: {}", self.stats.suppressed_echoes);
        let _ = writeln!(report, "Failed Writes: {}", self.stats.failed_writes);
        let _ = writeln!(report, "Remote Writes: {}", self.stats.remote_writes);
        if let Some(doc) = &self.final_document {
            let _ = writeln!(
                report,
                "Final Document: best {}, team {}, box {}, graveyard {}",
                doc.stats.best,
                doc.team.len(),
                doc.boxed.len(),
                doc.graveyard.len()
            );
        }

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

fn next_pending(what: &'static str, next: Option<usize>, len: usize) -> ProgressionResult<usize> {
    next.ok_or(ProgressionError::OutOfRange { what, index: len, len })
}

fn apply_edit(
    manager: &SessionManager<InMemoryRemoteStore>,
    edit: SimulatedEdit,
    catches: &mut u64,
) -> Result<(), SyncError> {
    let store = manager.store();
    match edit {
        SimulatedEdit::ToggleLevelCap => {
            store.try_apply(|d| {
                let index = next_pending("level cap", current_level_cap(d), d.level_caps.len())?;
                toggle_level_cap(d, index)
            })?;
        }
        SimulatedEdit::ToggleRivalCap => {
            store.try_apply(|d| {
                let index = next_pending("rival cap", current_rival_cap(d), d.rival_caps.len())?;
                toggle_rival_cap(d, index)
            })?;
        }
        SimulatedEdit::Catch => {
            *catches += 1;
            let route = format!("Route {catches}");
            let members = vec![Member::new("Bidoof", "Bid"), Member::new("Starly", "Star")];
            store.try_apply(|d| add_pair(d, Slot::Box, route, members))?;
        }
        SimulatedEdit::Loss => {
            store.try_apply(|d| {
                let id = d
                    .team
                    .iter()
                    .chain(&d.boxed)
                    .find(|p| !p.is_hole())
                    .map(|p| p.id)
                    .ok_or(ProgressionError::PairNotFound(0))?;
                add_loss(d, id, 0)
            })?;
        }
        SimulatedEdit::Legendary => {
            store.apply_mutation(record_legendary_encounter)?;
        }
    }
    Ok(())
}

fn converged(managers: &[SessionManager<InMemoryRemoteStore>], remote: Option<&TrackerDocument>) -> bool {
    let Some(remote) = remote else {
        return false;
    };
    managers.iter().all(|m| {
        let idle = m.status().is_some_and(|s| {
            let pending = s.borrow().pending;
            !pending
        });
        idle && m.store().document().as_deref() == Some(remote)
    })
}

fn remote_document(remote: &InMemoryRemoteStore, path: &DocumentPath) -> Option<TrackerDocument> {
    remote
        .get(path)
        .and_then(|value| serde_json::from_value(value).ok())
}

/// Run the replication simulator
///
/// # Errors
/// A client fails to open the shared tracker.
pub async fn run_simulator(config: SimulatorConfig, sync: SyncConfig) -> Result<SimulatorReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let remote = Arc::new(InMemoryRemoteStore::new(sync.notification_buffer));
    remote.fail_next_writes(config.fail_writes);

    let tracker = TrackerId::new(TRACKER)?;
    let path = DocumentPath::for_tracker(&sync.path_prefix, &tracker);
    let seed = new_document(DEFAULT_GAME, default_players(2), DEFAULT_RULESET, 0)?;

    let mut managers = Vec::with_capacity(config.clients);
    for _ in 0..config.clients {
        let mut manager = SessionManager::new(Arc::clone(&remote), sync.clone());
        manager.select(Some(tracker.clone()), seed.clone()).await?;
        managers.push(manager);
    }
    info!(clients = managers.len(), seed = config.seed, "clients attached");

    let mut stats = SimulatorStats::default();
    let mut catches = 0;
    for _ in 0..config.edits {
        if managers.is_empty() {
            break;
        }
        let client = rng.random_range(0..managers.len());
        let edit = SimulatedEdit::random(&mut rng);
        match apply_edit(&managers[client], edit, &mut catches) {
            Ok(()) => stats.edits_applied += 1,
            Err(err) if err.is_rejected() => {
                debug!(client, ?edit, error = %err, "edit rejected");
                stats.edits_rejected += 1;
            }
            Err(err) => {
                debug!(client, ?edit, error = %err, "edit skipped");
                stats.edits_skipped += 1;
            }
        }
        if rng.random_bool(0.2) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    let deadline = tokio::time::Instant::now() + config.settle_timeout;
    while !converged(&managers, remote_document(&remote, &path).as_ref())
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let final_document = remote_document(&remote, &path);
    let mut violations = Vec::new();
    for (i, manager) in managers.iter().enumerate() {
        let status = manager.status().map_or_else(SyncStatus::default, |s| {
            let status = s.borrow().clone();
            status
        });
        stats.published += status.published;
        stats.suppressed_echoes += status.suppressed_echoes;
        stats.failed_writes += status.failed_writes;

        let local = manager.store().document();
        if local.as_deref() != final_document.as_ref() {
            violations.push(format!("client {i} diverged from the remote document"));
        }
        if let Some(err) = status.last_error {
            violations.push(format!("client {i} failed to publish: {err}"));
        }
    }
    match &final_document {
        Some(doc) => {
            for violation in doc.validate() {
                violations.push(format!("remote document invariant violated: {violation:?}"));
            }
        }
        None => violations.push("remote document missing".to_string()),
    }
    stats.remote_writes = remote.write_count(&path);

    for manager in &mut managers {
        manager.close();
    }

    Ok(SimulatorReport {
        config,
        stats,
        violations,
        final_document,
    })
}
