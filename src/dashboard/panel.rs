//! Chart panels with stale-response protection.
//!
//! A load takes a [`Ticket`] recording the session it was issued for and the
//! panel generation at that moment. Switching sessions bumps the generation,
//! so any response still in flight for the previous session fails to commit
//! when it finally arrives.

use std::sync::RwLock;

use crate::cache::Resource;
use crate::error::ApiError;
use crate::models::{ChartData, SessionId};

/// The charts shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chart {
    Products,
    Categories,
}

impl Chart {
    pub const ALL: [Chart; 2] = [Chart::Products, Chart::Categories];

    pub fn resource(&self) -> Resource {
        match self {
            Chart::Products => Resource::ProductChart,
            Chart::Categories => Resource::CategoryChart,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Chart::Products => "Spend by product",
            Chart::Categories => "Spend by category",
        }
    }
}

/// What a panel currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    /// Nothing loaded for the active session yet.
    Idle,
    Loading { session: Option<SessionId> },
    Ready {
        session: Option<SessionId>,
        data: ChartData,
    },
    /// The fetch failed; the panel renders an empty chart with the error.
    Degraded {
        session: Option<SessionId>,
        error: String,
    },
}

impl PanelView {
    /// Session the displayed content belongs to.
    pub fn session(&self) -> Option<Option<SessionId>> {
        match self {
            PanelView::Idle => None,
            PanelView::Loading { session }
            | PanelView::Ready { session, .. }
            | PanelView::Degraded { session, .. } => Some(*session),
        }
    }

    /// Chart to draw; empty unless data is ready.
    pub fn chart(&self) -> ChartData {
        match self {
            PanelView::Ready { data, .. } => data.clone(),
            _ => ChartData::default(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PanelView::Degraded { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PanelView::Ready { .. })
    }
}

/// Proof of an issued load, presented when committing its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: Option<SessionId>,
    generation: u64,
}

impl Ticket {
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }
}

struct PanelState {
    generation: u64,
    view: PanelView,
}

pub struct ChartPanel {
    chart: Chart,
    state: RwLock<PanelState>,
}

impl ChartPanel {
    pub fn new(chart: Chart) -> Self {
        Self {
            chart,
            state: RwLock::new(PanelState {
                generation: 0,
                view: PanelView::Idle,
            }),
        }
    }

    /// Start a load for `session`. Supersedes any load already in flight.
    pub fn begin(&self, session: Option<SessionId>) -> Ticket {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        state.view = PanelView::Loading { session };
        Ticket {
            session,
            generation: state.generation,
        }
    }

    /// Commit a load result. Returns false, leaving the panel untouched, when
    /// the ticket was superseded or was issued for a session that is no
    /// longer active.
    pub fn commit(
        &self,
        ticket: Ticket,
        result: Result<ChartData, ApiError>,
        active: Option<SessionId>,
    ) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if ticket.generation != state.generation || ticket.session != active {
            tracing::debug!(
                "Discarding stale {:?} response for session {:?}",
                self.chart,
                ticket.session
            );
            return false;
        }
        state.view = match result {
            Ok(data) => PanelView::Ready {
                session: ticket.session,
                data,
            },
            Err(e) => {
                tracing::warn!("{} chart unavailable: {}", self.chart.title(), e);
                PanelView::Degraded {
                    session: ticket.session,
                    error: e.to_string(),
                }
            }
        };
        true
    }

    /// Forget the current content and invalidate in-flight loads.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        state.view = PanelView::Idle;
    }

    /// What to render while `active` is the active session. Content that
    /// belongs to any other session is never returned.
    pub fn view(&self, active: Option<SessionId>) -> PanelView {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        match state.view.session() {
            Some(session) if session == active => state.view.clone(),
            _ => PanelView::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChartSeries;

    fn sid(n: u64) -> Option<SessionId> {
        SessionId::new(n)
    }

    fn chart(label: &str) -> ChartData {
        ChartData {
            labels: vec![label.to_string()],
            series: vec![ChartSeries {
                name: "total".into(),
                data: vec![1.0],
            }],
        }
    }

    #[test]
    fn test_commit_current_ticket() {
        let panel = ChartPanel::new(Chart::Products);
        let ticket = panel.begin(sid(1));
        assert!(matches!(panel.view(sid(1)), PanelView::Loading { .. }));
        assert!(panel.commit(ticket, Ok(chart("s1")), sid(1)));
        assert_eq!(panel.view(sid(1)).chart(), chart("s1"));
    }

    #[test]
    fn test_late_response_after_switch_is_discarded() {
        let panel = ChartPanel::new(Chart::Products);
        let old = panel.begin(sid(1));

        // Switch to session 2 and load it before session 1 answers.
        panel.reset();
        let new = panel.begin(sid(2));
        assert!(panel.commit(new, Ok(chart("s2")), sid(2)));

        assert!(!panel.commit(old, Ok(chart("s1")), sid(2)));
        assert_eq!(panel.view(sid(2)).chart(), chart("s2"));
    }

    #[test]
    fn test_response_for_inactive_session_is_discarded() {
        let panel = ChartPanel::new(Chart::Categories);
        let ticket = panel.begin(sid(1));
        assert!(!panel.commit(ticket, Ok(chart("s1")), sid(2)));
        assert_eq!(panel.view(sid(2)), PanelView::Idle);
    }

    #[test]
    fn test_view_hides_other_sessions() {
        let panel = ChartPanel::new(Chart::Products);
        let ticket = panel.begin(sid(1));
        assert!(panel.commit(ticket, Ok(chart("s1")), sid(1)));
        assert_eq!(panel.view(sid(2)), PanelView::Idle);
        assert_eq!(panel.view(None), PanelView::Idle);
    }

    #[test]
    fn test_failure_degrades_to_empty_chart() {
        let panel = ChartPanel::new(Chart::Products);
        let ticket = panel.begin(None);
        assert!(panel.commit(ticket, Err(ApiError::NoActiveSession), None));
        let view = panel.view(None);
        assert!(view.error().is_some());
        assert!(view.chart().is_empty());
    }
}
