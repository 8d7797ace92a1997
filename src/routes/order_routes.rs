use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::entities::order::{self, State};
use crate::error::{StoreError, StoreResult};
use crate::middleware::{
    auth::Claims,
    logging::{ok_json, store_error_response, to_response},
};
use crate::repository::orders::{self, OrderLine};

pub fn order_routes() -> Router {
    Router::new()
        .route("/order", get(get_orders).post(checkout))
        .route("/order/lookup", get(lookup_order))
}

async fn get_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let orders = match orders::list_for_account(db.as_ref(), claims.account_id).await {
        Ok(orders) => orders,
        Err(err) => return store_error_response(err),
    };

    let mut response = Vec::with_capacity(orders.len());
    for order in orders {
        match OrderResponse::load(db.as_ref(), order).await {
            Ok(value) => response.push(value),
            Err(err) => return store_error_response(err),
        }
    }

    ok_json(response)
}

async fn checkout(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let order = match orders::checkout(db.as_ref(), claims.account_id).await {
        Ok(order) => order,
        Err(err) => return store_error_response(err),
    };

    match OrderResponse::load(db.as_ref(), order).await {
        Ok(value) => to_response((StatusCode::CREATED, Json(json!(value))), Ok(())),
        Err(err) => store_error_response(err),
    }
}

async fn lookup_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let order = match orders::find_by_opaque_id(db.as_ref(), &query.id).await {
        // someone else's order looks the same as a missing one
        Ok(order) if order.account_id != claims.account_id => {
            return store_error_response(StoreError::NotFound {
                entity: "order",
                id: order.id,
            })
        }
        Ok(order) => order,
        Err(err) => return store_error_response(err),
    };

    match OrderResponse::load(db.as_ref(), order).await {
        Ok(value) => ok_json(value),
        Err(err) => store_error_response(err),
    }
}

#[derive(Deserialize, Debug)]
struct LookupQuery {
    id: String,
}

#[derive(Serialize)]
pub(crate) struct OrderResponse {
    id: String,
    state: State,
    date: DateTime<Utc>,
    description: String,
    total_price: f64,
    lines: Vec<OrderLine>,
}

impl OrderResponse {
    pub(crate) async fn load<C: ConnectionTrait>(
        db: &C,
        order: order::Model,
    ) -> StoreResult<OrderResponse> {
        let lines = orders::order_lines(db, order.id).await?;
        Ok(OrderResponse {
            id: order.opaque_id(),
            state: order.state,
            date: order.date,
            description: orders::describe(&lines),
            total_price: orders::total_price(&lines),
            lines,
        })
    }
}
