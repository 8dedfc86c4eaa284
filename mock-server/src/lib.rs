use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const HAL_JSON: &str = "application/hal+json";
pub const VND_ERROR_JSON: &str = "application/vnd.error+json";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub item: String,
    pub quantity: u32,
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateOrder {
    pub item: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateOrder {
    pub status: Option<String>,
    pub quantity: Option<u32>,
}

pub type Db = Arc<RwLock<BTreeMap<Uuid, Order>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(BTreeMap::new()));
    Router::new()
        .route("/", get(root))
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/broken", get(broken))
        .route("/plain", get(plain))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// A HAL document response with the given status.
fn hal(status: StatusCode, body: Value) -> Response {
    (status, [(header::CONTENT_TYPE, HAL_JSON)], body.to_string()).into_response()
}

fn vnd_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "message": message,
        "_links": {"help": {"href": "/docs/errors"}}
    });
    (status, [(header::CONTENT_TYPE, VND_ERROR_JSON)], body.to_string()).into_response()
}

pub fn order_document(order: &Order) -> Value {
    json!({
        "_links": {
            "self": {"href": format!("/orders/{}", order.id)},
            "collection": {"href": "/orders"}
        },
        "id": order.id,
        "item": order.item,
        "quantity": order.quantity,
        "status": order.status
    })
}

async fn root() -> Response {
    hal(
        StatusCode::OK,
        json!({
            "_links": {
                "self": {"href": "/"},
                "orders": {"href": "/orders"},
                "order": {"href": "/orders/{id}", "templated": true, "title": "Find an order"},
                "broken": {"href": "/broken"}
            },
            "name": "order service"
        }),
    )
}

async fn list_orders(State(db): State<Db>) -> Response {
    let orders = db.read().await;
    let embedded: Vec<Value> = orders.values().map(order_document).collect();
    hal(
        StatusCode::OK,
        json!({
            "_links": {"self": {"href": "/orders"}},
            "_embedded": {"orders": embedded},
            "count": orders.len()
        }),
    )
}

/// Answers `201 Created` with a `Location` and no body.
async fn create_order(State(db): State<Db>, Json(input): Json<CreateOrder>) -> Response {
    let order = Order {
        id: Uuid::new_v4(),
        item: input.item,
        quantity: input.quantity,
        status: "pending".to_string(),
    };
    let location = format!("/orders/{}", order.id);
    db.write().await.insert(order.id, order);
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

async fn get_order(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.read().await.get(&id) {
        Some(order) => hal(StatusCode::OK, order_document(order)),
        None => vnd_error(StatusCode::NOT_FOUND, "order not found"),
    }
}

async fn update_order(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOrder>,
) -> Response {
    let mut orders = db.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return vnd_error(StatusCode::NOT_FOUND, "order not found");
    };
    if let Some(status) = input.status {
        order.status = status;
    }
    if let Some(quantity) = input.quantity {
        order.quantity = quantity;
    }
    hal(StatusCode::OK, order_document(order))
}

async fn delete_order(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => vnd_error(StatusCode::NOT_FOUND, "order not found"),
    }
}

async fn broken() -> Response {
    vnd_error(StatusCode::BAD_GATEWAY, "upstream unavailable")
}

async fn plain() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        "not hypermedia",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: Uuid::nil(),
            item: "Coffee".to_string(),
            quantity: 2,
            status: "pending".to_string(),
        }
    }

    #[test]
    fn order_document_links_to_itself() {
        let doc = order_document(&order());
        assert_eq!(
            doc["_links"]["self"]["href"],
            "/orders/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(doc["_links"]["collection"]["href"], "/orders");
        assert_eq!(doc["item"], "Coffee");
        assert_eq!(doc["quantity"], 2);
    }

    #[test]
    fn create_order_defaults_quantity_to_one() {
        let input: CreateOrder = serde_json::from_str(r#"{"item":"Tea"}"#).unwrap();
        assert_eq!(input.item, "Tea");
        assert_eq!(input.quantity, 1);
    }

    #[test]
    fn create_order_rejects_missing_item() {
        let result: Result<CreateOrder, _> = serde_json::from_str(r#"{"quantity":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_order_all_fields_optional() {
        let input: UpdateOrder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.status.is_none());
        assert!(input.quantity.is_none());
    }
}
