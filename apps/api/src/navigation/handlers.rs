use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::navigation::{Location, Route};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    #[serde(flatten)]
    pub location: Location,
    pub fragment: String,
    pub requires_auth: bool,
}

impl From<Location> for NavigationResponse {
    fn from(location: Location) -> Self {
        NavigationResponse {
            fragment: location.to_fragment(),
            requires_auth: location.route.requires_auth(),
            location,
        }
    }
}

/// Either a raw fragment (as read from the address bar) or a route name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    pub fragment: Option<String>,
    pub route: Option<Route>,
}

/// GET /api/v1/navigation
pub async fn handle_get_location(State(state): State<AppState>) -> Json<NavigationResponse> {
    Json(state.navigation.current().into())
}

/// POST /api/v1/navigation
pub async fn handle_navigate(
    State(state): State<AppState>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<NavigationResponse>, AppError> {
    let auth = state.repo.load_session().await?;
    let location = match (req.fragment, req.route) {
        (Some(fragment), _) => state.navigation.follow_fragment(&fragment, &auth),
        (None, Some(route)) => state.navigation.navigate(route, &auth),
        (None, None) => {
            return Err(AppError::Validation(
                "Either 'fragment' or 'route' is required".to_string(),
            ))
        }
    };
    Ok(Json(location.into()))
}
