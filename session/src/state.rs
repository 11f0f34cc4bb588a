use std::sync::Arc;
use std::time::Instant;

use lineage_core::{build_from_snapshot, compute_view, LineageGraph, LineageView, RawSnapshot, ViewMode};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::generation::{FetchReason, FetchTicket, Generation, GenerationCounter};
use crate::source::{load_snapshot, AssetSource, RelationshipSource};
use crate::status::LineageStatus;

/// Everything the renderer needs, derived together from one raw snapshot.
///
/// Never mutated in place: a selection, refresh or view toggle builds a new
/// value and swaps the `Arc`, so readers holding the old state keep a
/// consistent view.
#[derive(Debug)]
pub struct GraphState {
    /// Generation of the fetch this state was built from. 0 = nothing applied.
    pub generation: Generation,
    pub focal: Option<String>,
    pub view_mode: ViewMode,
    pub snapshot: Arc<RawSnapshot>,
    pub graph: Arc<LineageGraph>,
    pub view: LineageView,
    pub status: LineageStatus,
    /// Time spent producing this state. For a freshly applied snapshot this
    /// covers graph construction and view derivation; a local re-derive
    /// (selection, view toggle) only pays for the view.
    pub build_time_ms: f64,
    pub built_at: Instant,
}

impl GraphState {
    fn empty(view_mode: ViewMode, status: LineageStatus) -> Self {
        Self {
            generation: Generation::default(),
            focal: None,
            view_mode,
            snapshot: Arc::new(RawSnapshot::default()),
            graph: Arc::new(LineageGraph::default()),
            view: LineageView::empty(view_mode),
            status,
            build_time_ms: 0.0,
            built_at: Instant::now(),
        }
    }
}

/// Result of handing a ticket back with fetched data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied {
        generation: Generation,
        status: LineageStatus,
    },
    /// A newer fetch was issued after this one, or this ticket was already
    /// applied; the data was dropped.
    Stale { ticket: FetchTicket, latest: Generation },
}

pub struct LineageSession {
    config: SessionConfig,
    generations: GenerationCounter,
    focal: Option<String>,
    view_mode: ViewMode,
    state: Arc<GraphState>,
}

impl LineageSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let view_mode = config.default_view_mode;
        Ok(Self {
            config,
            generations: GenerationCounter::new(),
            focal: None,
            view_mode,
            state: Arc::new(GraphState::empty(view_mode, LineageStatus::NotLoaded)),
        })
    }

    pub fn state(&self) -> Arc<GraphState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn focal(&self) -> Option<&str> {
        self.focal.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn current_generation(&self) -> Generation {
        self.generations.current()
    }

    /// Issue a ticket for a fetch that will replace the graph.
    pub fn begin_fetch(&mut self, reason: FetchReason) -> FetchTicket {
        let generation = self.generations.bump();
        debug!(%generation, ?reason, focal = ?self.focal, "fetch issued");
        FetchTicket {
            generation,
            focal: self.focal.clone(),
            reason,
        }
    }

    /// Change the focal node.
    ///
    /// Highlights are re-derived from the last applied snapshot right away;
    /// the returned ticket covers the focal-scoped refetch.
    pub fn select(&mut self, focal: Option<&str>) -> FetchTicket {
        self.focal = focal.map(str::to_string);
        self.rederive();
        self.begin_fetch(FetchReason::Selection)
    }

    pub fn refresh(&mut self) -> FetchTicket {
        self.begin_fetch(FetchReason::Refresh)
    }

    /// A manual lineage record was created, edited or deleted.
    pub fn lineage_mutated(&mut self) -> FetchTicket {
        self.begin_fetch(FetchReason::LineageMutation)
    }

    /// Apply a finished fetch, unless a newer one has been issued since.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<RawSnapshot>) -> FetchOutcome {
        let latest = self.generations.current();
        // A ticket is applied at most once: a second hand-back of the same
        // generation is as stale as an overtaken one.
        if !self.generations.is_current(ticket.generation) || ticket.generation <= self.state.generation {
            warn!(
                ticket = %ticket.generation,
                latest = %latest,
                applied = %self.state.generation,
                reason = ?ticket.reason,
                "discarding stale lineage response"
            );
            return FetchOutcome::Stale { ticket, latest };
        }

        let status = match result {
            Ok(snapshot) => {
                let state = self.build_state(ticket.generation, Arc::new(snapshot));
                let status = state.status.clone();
                info!(
                    generation = %ticket.generation,
                    nodes = state.graph.node_count(),
                    edges = state.graph.edge_count(),
                    status = status.as_str(),
                    build_time_ms = state.build_time_ms,
                    "lineage snapshot applied"
                );
                self.state = Arc::new(state);
                status
            }
            Err(err) => {
                warn!(generation = %ticket.generation, error = %err, "lineage fetch failed");
                let status = LineageStatus::FetchFailed {
                    message: err.to_string(),
                };
                let mut state = GraphState::empty(self.view_mode, status.clone());
                state.generation = ticket.generation;
                state.focal = self.focal.clone();
                self.state = Arc::new(state);
                status
            }
        };

        FetchOutcome::Applied {
            generation: ticket.generation,
            status,
        }
    }

    /// Fetch from both collaborators and apply the result under `ticket`.
    pub fn fetch_with<A, R>(&mut self, ticket: FetchTicket, assets: &mut A, relationships: &mut R) -> FetchOutcome
    where
        A: AssetSource + ?Sized,
        R: RelationshipSource + ?Sized,
    {
        let result = load_snapshot(assets, relationships, ticket.focal.as_deref(), &self.config);
        self.complete_fetch(ticket, result)
    }

    /// Switch view mode. No refetch: the view is re-derived locally.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        self.view_mode = mode;
        self.rederive();
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.set_view_mode(self.view_mode.toggled());
        self.view_mode
    }

    fn rederive(&mut self) {
        // A failed or empty state has nothing to re-derive from; keep its
        // status and just carry the new focal/mode.
        let current = &self.state;
        let next = match current.status {
            LineageStatus::Ready | LineageStatus::NoLineage => {
                let mut next = self.derive(
                    current.generation,
                    Arc::clone(&current.snapshot),
                    Arc::clone(&current.graph),
                    Instant::now(),
                );
                next.status = current.status.clone();
                next
            }
            _ => {
                let mut next = GraphState::empty(self.view_mode, current.status.clone());
                next.generation = current.generation;
                next.focal = self.focal.clone();
                next
            }
        };
        self.state = Arc::new(next);
    }

    fn build_state(&self, generation: Generation, snapshot: Arc<RawSnapshot>) -> GraphState {
        let started = Instant::now();
        let graph = Arc::new(build_from_snapshot(&snapshot));
        let mut state = self.derive(generation, snapshot, graph, started);
        state.status = if state.graph.dependency_edge_count() == 0 {
            LineageStatus::NoLineage
        } else {
            LineageStatus::Ready
        };
        state
    }

    /// `started` marks when the work for this state began, so a fresh
    /// snapshot's build time includes graph construction.
    fn derive(
        &self,
        generation: Generation,
        snapshot: Arc<RawSnapshot>,
        graph: Arc<LineageGraph>,
        started: Instant,
    ) -> GraphState {
        let view = compute_view(&graph, self.view_mode, self.focal.as_deref(), &self.config.engine);
        GraphState {
            generation,
            focal: self.focal.clone(),
            view_mode: self.view_mode,
            snapshot,
            graph,
            view,
            status: LineageStatus::Ready,
            build_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            built_at: Instant::now(),
        }
    }
}
