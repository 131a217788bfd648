use super::ApiClient;
use crate::domain::ports::RouteCatalog;
use crate::domain::route::Route;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const GET_ROUTES: &str = r#"
  query GetRoutes {
    routes {
      id
      name
      stops { id name latitude longitude }
      schedules { id routeId departureTime arrivalTime daysOfWeek }
    }
  }
"#;

pub const GET_ROUTE: &str = r#"
  query GetRoute($id: ID!) {
    route(id: $id) {
      id
      name
      stops { id name latitude longitude }
      schedules { id routeId departureTime arrivalTime daysOfWeek }
    }
  }
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct RoutesData {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct RouteData {
    route: Option<Route>,
}

/// Route catalog served by the route service's GraphQL endpoint.
pub struct GraphQlRouteCatalog {
    client: ApiClient,
}

impl GraphQlRouteCatalog {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response: GraphQlResponse<T> = self
            .client
            .post("/graphql", &GraphQlRequest { query, variables })
            .await?;

        if let Some(error) = response.errors.into_iter().flatten().next() {
            return Err(BookingError::ServiceError {
                status: 200,
                message: error.message,
            });
        }
        response.data.ok_or_else(|| BookingError::ServiceError {
            status: 200,
            message: "GraphQL response carried no data".to_string(),
        })
    }
}

#[async_trait]
impl RouteCatalog for GraphQlRouteCatalog {
    async fn list_routes(&self) -> Result<Vec<Route>> {
        let data: RoutesData = self.query(GET_ROUTES, Value::Null).await?;
        Ok(data.routes)
    }

    async fn get_route(&self, route_id: &str) -> Result<Option<Route>> {
        let data: RouteData = self.query(GET_ROUTE, json!({ "id": route_id })).await?;
        Ok(data.route)
    }
}
