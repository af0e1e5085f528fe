//! Route switching. Exactly one flow is mounted at a time; navigating away
//! drops it, so every visit starts from fresh flow state.

use std::fmt;

use shared::domain::ClientIdentity;
use thiserror::Error;
use tracing::debug;

use crate::{
    flows::{FlowId, HistoryFlow, SubmissionFlow},
    identity::IdentityProvider,
    settings::ClientSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    History,
    Settings,
}

impl Route {
    pub const ALL: [Route; 3] = [Self::Home, Self::History, Self::Settings];

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim();
        let normalized = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::History => "/history",
            Self::Settings => "/settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Create case",
            Self::History => "History",
            Self::Settings => "Settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("no page at '{0}'")]
    UnknownRoute(String),
}

/// Read-only view of the client's local settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub identity: Option<ClientIdentity>,
    pub identity_storage: String,
    pub identity_degraded: bool,
    pub server_url: String,
}

pub enum MountedFlow {
    Submission(SubmissionFlow),
    History(HistoryFlow),
    Settings(SettingsView),
}

pub struct Shell {
    identity: IdentityProvider,
    settings: ClientSettings,
    route: Route,
    flow: MountedFlow,
    next_flow_id: u64,
}

impl Shell {
    /// Mounts the flow for `path` as the first page.
    pub fn open(
        mut identity: IdentityProvider,
        settings: ClientSettings,
        path: &str,
    ) -> Result<Self, NavigationError> {
        let route = parse_route(path)?;
        let flow = mount(&mut identity, &settings, FlowId(1), route);
        Ok(Self {
            identity,
            settings,
            route,
            flow,
            next_flow_id: 2,
        })
    }

    pub fn navigate(&mut self, path: &str) -> Result<Route, NavigationError> {
        let route = parse_route(path)?;
        let id = FlowId(self.next_flow_id);
        self.next_flow_id += 1;
        self.flow = mount(&mut self.identity, &self.settings, id, route);
        self.route = route;
        debug!(route = %route, flow = id.0, "mounted route");
        Ok(route)
    }

    pub fn current_route(&self) -> Route {
        self.route
    }

    pub fn current_path(&self) -> &'static str {
        self.route.path()
    }

    pub fn flow(&self) -> &MountedFlow {
        &self.flow
    }

    pub fn submission_mut(&mut self) -> Option<&mut SubmissionFlow> {
        match &mut self.flow {
            MountedFlow::Submission(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn history_mut(&mut self) -> Option<&mut HistoryFlow> {
        match &mut self.flow {
            MountedFlow::History(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn settings_view(&self) -> Option<&SettingsView> {
        match &self.flow {
            MountedFlow::Settings(view) => Some(view),
            _ => None,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

fn parse_route(path: &str) -> Result<Route, NavigationError> {
    Route::from_path(path).ok_or_else(|| NavigationError::UnknownRoute(path.to_string()))
}

fn mount(
    identity: &mut IdentityProvider,
    settings: &ClientSettings,
    id: FlowId,
    route: Route,
) -> MountedFlow {
    match route {
        Route::Home => MountedFlow::Submission(SubmissionFlow::new(id, identity.get_or_create())),
        // The history page reads the identity but never creates one.
        Route::History => MountedFlow::History(HistoryFlow::new(id, identity.existing().ok())),
        Route::Settings => MountedFlow::Settings(SettingsView {
            identity: identity.existing().ok(),
            identity_storage: identity.storage_description(),
            identity_degraded: identity.is_degraded(),
            server_url: settings.server_url.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
