//! Client route state.
//!
//! The closed set of screens, parsing of `#route?returnTo=...` fragments and
//! an injectable `NavigationContext` that holds the current location.
//! Subscribers get every change through a `watch` channel.

pub mod handlers;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::models::user::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    #[default]
    Home,
    CreateCv,
    Templates,
    Preview,
    CreateLetter,
    LetterPreview,
    Dashboard,
    Login,
    Register,
    Profile,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Home,
        Route::CreateCv,
        Route::Templates,
        Route::Preview,
        Route::CreateLetter,
        Route::LetterPreview,
        Route::Dashboard,
        Route::Login,
        Route::Register,
        Route::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::CreateCv => "create-cv",
            Route::Templates => "templates",
            Route::Preview => "preview",
            Route::CreateLetter => "create-letter",
            Route::LetterPreview => "letter-preview",
            Route::Dashboard => "dashboard",
            Route::Login => "login",
            Route::Register => "register",
            Route::Profile => "profile",
        }
    }

    /// Unknown names resolve to `Home`.
    pub fn parse(raw: &str) -> Route {
        Route::ALL
            .into_iter()
            .find(|r| r.as_str() == raw.trim())
            .unwrap_or(Route::Home)
    }

    /// Everything except the landing page and the auth forms.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Home | Route::Login | Route::Register)
    }
}

/// A parsed fragment: the screen plus where to go after signing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to: Option<Route>,
}

impl Location {
    pub fn at(route: Route) -> Self {
        Location {
            route,
            return_to: None,
        }
    }

    /// Parses `#login?returnTo=preview`, `create-cv`, `` and the like.
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.trim().trim_start_matches('#');
        let (path, query) = fragment.split_once('?').unwrap_or((fragment, ""));
        let return_to = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "returnTo")
            .map(|(_, value)| Route::parse(value))
            .filter(|r| *r != Route::Home);
        Location {
            route: Route::parse(path),
            return_to,
        }
    }

    /// The fragment form; the home page is the empty fragment.
    pub fn to_fragment(&self) -> String {
        let path = match self.route {
            Route::Home => "",
            other => other.as_str(),
        };
        match self.return_to {
            Some(target) => format!("{path}?returnTo={}", target.as_str()),
            None => path.to_string(),
        }
    }
}

/// Where a request for `route` actually lands given the session.
pub fn guard(route: Route, auth: &AuthState) -> Location {
    let signed_in = auth.is_authenticated && auth.user.is_some();
    if route.requires_auth() && !signed_in {
        Location {
            route: Route::Login,
            return_to: Some(route),
        }
    } else {
        Location::at(route)
    }
}

/// Shared, observable navigation state.
#[derive(Clone)]
pub struct NavigationContext {
    tx: Arc<watch::Sender<Location>>,
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Location::default());
        NavigationContext { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Location {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.tx.subscribe()
    }

    fn set(&self, location: Location) -> Location {
        debug!("Navigating to #{}", location.to_fragment());
        self.tx.send_replace(location);
        location
    }

    /// Follows a raw fragment, as on a `hashchange`, applying the auth guard.
    pub fn follow_fragment(&self, fragment: &str, auth: &AuthState) -> Location {
        let parsed = Location::parse(fragment);
        let mut target = guard(parsed.route, auth);
        if target.return_to.is_none() {
            target.return_to = parsed.return_to;
        }
        self.set(target)
    }

    pub fn navigate(&self, route: Route, auth: &AuthState) -> Location {
        self.set(guard(route, auth))
    }

    /// After a successful sign-in: the pending `returnTo`, else the dashboard.
    pub fn complete_login(&self) -> Location {
        let target = self.current().return_to.unwrap_or(Route::Dashboard);
        self.set(Location::at(target))
    }

    pub fn reset(&self) -> Location {
        self.set(Location::at(Route::Home))
    }
}
