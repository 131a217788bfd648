use crate::domain::booking::BookingDraft;
use crate::domain::ports::RouteCatalogBox;
use crate::domain::route::Route;
use crate::domain::session::Session;
use crate::error::{BookingError, Result};

/// Route browsing and the start of a booking.
pub struct RouteBrowser {
    catalog: RouteCatalogBox,
}

impl RouteBrowser {
    pub fn new(catalog: RouteCatalogBox) -> Self {
        Self { catalog }
    }

    /// Lists routes, keeping those whose name or stops match `query`.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Route>> {
        let routes = self.catalog.list_routes().await?;
        Ok(match query {
            Some(query) => routes.into_iter().filter(|r| r.matches(query)).collect(),
            None => routes,
        })
    }

    pub async fn route(&self, route_id: &str) -> Result<Route> {
        self.catalog
            .get_route(route_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("route {route_id}")))
    }

    /// Loads `route_id` and opens a draft on it, prefilled for the session user.
    ///
    /// An explicit `schedule_id` must belong to the route.
    pub async fn start_booking(
        &self,
        session: &Session,
        route_id: &str,
        schedule_id: Option<&str>,
    ) -> Result<(Route, BookingDraft)> {
        let route = self.route(route_id).await?;
        let mut draft = BookingDraft::for_route(&route, session.user.as_ref());

        if let Some(schedule_id) = schedule_id {
            if route.schedule(schedule_id).is_none() {
                return Err(BookingError::ValidationError(format!(
                    "Schedule {schedule_id} is not offered on route {route_id}"
                )));
            }
            draft.schedule_id = Some(schedule_id.to_string());
        }

        Ok((route, draft))
    }
}
