//! Integration tests for Tableside.
//!
//! The tests drive the real gateway client, identity context, real-time
//! channel and screen controllers against [`MockBackend`], an in-process
//! `axum` server that speaks the backend's REST envelope and STOMP over
//! WebSocket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tableside-integration-tests
//! ```
//!
//! # Seed Data
//!
//! | What      | Value                                                   |
//! |-----------|---------------------------------------------------------|
//! | Store 1   | "Blue Bottle", open                                     |
//! | Owner     | `owner@cafe.com` / `secret1`, MASTER, store 1           |
//! | Barista   | `barista@cafe.com` / `secret1`, SUB, store 1            |
//! | Seat 1    | `A1`, QR `qr-a1`                                        |
//! | Menus     | Americano ₩4,500, Latte ₩5,000, Cheesecake (sold out)   |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tableside_client::realtime::{Frame, Subscription};
use tableside_client::{
    ApiClient, AppContext, ChannelEvent, ClientConfig, MemoryStore, SessionStore,
};
use tableside_core::{
    ApiResponse, Category, CategoryId, DashboardStats, Email, Identity, MenuId,
    MenuItem, Notification, NotificationId, NotificationType, Order, OrderId, OrderItem,
    OrderStatus, Payment, PaymentStatus, Role, Seat, SeatId, SeatLookup, Store, StoreId,
    TargetAudience, UserId,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

pub const OWNER_EMAIL: &str = "owner@cafe.com";
pub const BARISTA_EMAIL: &str = "barista@cafe.com";
pub const PASSWORD: &str = "secret1";
pub const STORE_ID: StoreId = StoreId::new(1);
pub const SEAT_QR: &str = "qr-a1";

/// A message published to real-time subscribers.
#[derive(Debug, Clone)]
struct Push {
    destination: String,
    body: String,
}

struct Account {
    password: String,
    identity: Identity,
}

/// Everything the mock backend knows.
#[derive(Default)]
pub struct BackendState {
    accounts: Vec<Account>,
    sessions: HashMap<String, UserId>,
    stores: Vec<Store>,
    categories: Vec<Category>,
    menus: Vec<MenuItem>,
    seats: Vec<Seat>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
    next_id: i64,
    /// `METHOD path` of every REST request, in arrival order.
    pub requests: Vec<String>,
    /// `token` query value of every WebSocket connection.
    pub ws_tokens: Vec<Option<String>>,
    /// Destinations of every SUBSCRIBE frame received.
    pub subscriptions: Vec<String>,
    /// Reject WebSocket upgrades.
    pub refuse_ws: bool,
    /// Make `PATCH /notifications/{id}/read` fail.
    pub fail_mark_read: bool,
    /// Answer rejected logins with 401 instead of 400.
    pub login_rejects_with_401: bool,
}

impl BackendState {
    fn seeded() -> Self {
        let mut state = Self {
            next_id: 100,
            ..Self::default()
        };
        state.accounts.push(Account {
            password: PASSWORD.to_string(),
            identity: identity(1, OWNER_EMAIL, "Owner Kim", Role::Master, Some(STORE_ID)),
        });
        state.accounts.push(Account {
            password: PASSWORD.to_string(),
            identity: identity(2, BARISTA_EMAIL, "Barista Lee", Role::Sub, Some(STORE_ID)),
        });
        state.stores.push(Store {
            id: STORE_ID,
            name: "Blue Bottle".to_string(),
            address: Some("Seongsu-dong 1".to_string()),
            phone: Some("02-123-4567".to_string()),
            description: None,
            business_hours: Some("08:00-22:00".to_string()),
            owner_id: Some(UserId::new(1)),
            is_open: true,
        });
        for (id, name, order) in [(1, "Coffee", 0), (2, "Dessert", 1)] {
            state.categories.push(Category {
                id: CategoryId::new(id),
                store_id: Some(STORE_ID),
                name: name.to_string(),
                display_order: order,
                is_active: true,
            });
        }
        for (id, category, name, price, available) in [
            (1, 1, "Americano", 4500, true),
            (2, 1, "Latte", 5000, true),
            (3, 2, "Cheesecake", 6000, false),
        ] {
            state.menus.push(MenuItem {
                id: MenuId::new(id),
                store_id: Some(STORE_ID),
                category_id: Some(CategoryId::new(category)),
                name: name.to_string(),
                description: None,
                price: Decimal::new(price, 0),
                image_url: None,
                is_available: available,
                display_order: i32::try_from(id).unwrap_or_default(),
            });
        }
        state.seats.push(Seat {
            id: SeatId::new(1),
            store_id: STORE_ID,
            seat_number: "A1".to_string(),
            qr_code: SEAT_QR.to_string(),
            capacity: Some(4),
            is_active: true,
        });
        state
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn caller(&self, headers: &HeaderMap) -> Option<&Identity> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let user_id = self.sessions.get(token)?;
        self.accounts
            .iter()
            .map(|a| &a.identity)
            .find(|i| i.id == *user_id)
    }

    fn notify(&mut self, audience: TargetAudience, order: &Order, kind: NotificationType, message: String) -> Notification {
        let notification = Notification {
            id: NotificationId::new(self.next_id()),
            order_id: Some(order.id),
            store_id: order.store_id,
            target_type: audience,
            message,
            kind,
            is_read: false,
            sent_at: Utc::now(),
            read_at: None,
        };
        self.notifications.push(notification.clone());
        notification
    }
}

fn identity(id: i64, email: &str, name: &str, role: Role, store_id: Option<StoreId>) -> Identity {
    Identity {
        id: UserId::new(id),
        email: Email::parse(email).expect("seed email is valid"),
        name: name.to_string(),
        role,
        store_id,
        is_active: true,
        last_login: None,
        created_at: Some(Utc::now()),
    }
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<BackendState>>,
    pushes: broadcast::Sender<Push>,
}

impl Shared {
    fn publish(&self, destination: String, body: String) {
        // No live subscribers is fine.
        let _ = self.pushes.send(Push { destination, body });
    }

    fn publish_notification(&self, notification: &Notification) {
        let topic = match notification.target_type {
            TargetAudience::Admin => format!("/topic/admin/{}", notification.store_id),
            TargetAudience::Customer => match notification.order_id {
                Some(order_id) => format!("/topic/customer/{order_id}"),
                None => return,
            },
        };
        let body = serde_json::to_string(notification).expect("notification serializes");
        self.publish(topic, body);
    }
}

/// An in-process backend listening on a random local port.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Start the server with seed data.
    pub async fn start() -> Self {
        install_crypto_provider();

        let (pushes, _) = broadcast::channel(64);
        let shared = Shared {
            state: Arc::new(Mutex::new(BackendState::seeded())),
            pushes,
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        let app = router(shared.clone());
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, shared, task }
    }

    /// REST base URL, e.g. `http://127.0.0.1:4321/api`.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("valid url")
    }

    /// Client configuration pointing at this backend, with short channel
    /// timings.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.api_url());
        config.storefront_url = Url::parse("http://shop.test").expect("valid url");
        config.payment = Some(tableside_client::config::PaymentConfig {
            client_key: "test_ck_local".to_string().into(),
        });
        config.channel.reconnect_base = Duration::from_millis(50);
        config.channel.handshake_timeout = Duration::from_secs(2);
        config.channel.poll_grace = Duration::from_millis(100);
        config.channel.poll_interval = Duration::from_millis(200);
        config
    }

    /// An application context on in-memory stores.
    #[must_use]
    pub fn context(&self) -> AppContext {
        AppContext::with_stores(
            self.config(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .expect("context builds")
    }

    /// A bare gateway client with its own empty session.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.config(), SessionStore::new(Arc::new(MemoryStore::new())))
            .expect("client builds")
    }

    /// Inspect or change backend state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        f(&mut self.shared.state.lock())
    }

    /// Forget every issued token, so the next authenticated call gets 401.
    pub fn revoke_tokens(&self) {
        self.shared.state.lock().sessions.clear();
    }

    /// Create a staff notification for `order_id` and push it.
    pub fn push_admin_notification(&self, order_id: OrderId, message: &str) -> Notification {
        let notification = {
            let mut state = self.shared.state.lock();
            let order = state
                .orders
                .iter()
                .find(|o| o.id == order_id)
                .cloned()
                .expect("order exists");
            state.notify(
                TargetAudience::Admin,
                &order,
                NotificationType::OrderReceived,
                message.to_string(),
            )
        };
        self.shared.publish_notification(&notification);
        notification
    }

    /// Publish an arbitrary body, bypassing JSON encoding.
    pub fn push_raw(&self, destination: &str, body: &str) {
        self.shared.publish(destination.to_string(), body.to_string());
    }

    /// Wait until `count` SUBSCRIBE frames have arrived.
    pub async fn wait_for_subscriptions(&self, count: usize) {
        for _ in 0..200 {
            if self.shared.state.lock().subscriptions.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} subscriptions");
    }

    /// Seed an order directly, as if a customer had placed it.
    pub fn seed_order(&self, status: OrderStatus) -> Order {
        let mut state = self.shared.state.lock();
        let id = state.next_id();
        let order = Order {
            id: OrderId::new(id),
            store_id: STORE_ID,
            seat_id: SeatId::new(1),
            seat_number: Some("A1".to_string()),
            order_number: format!("A-{id:03}"),
            total_amount: Decimal::new(4500, 0),
            status,
            payment_status: PaymentStatus::Completed,
            customer_note: None,
            items: vec![OrderItem {
                id: None,
                menu_id: MenuId::new(1),
                menu_name: "Americano".to_string(),
                quantity: 1,
                unit_price: Decimal::new(4500, 0),
                options: None,
            }],
            cancelable: status == OrderStatus::Pending,
            paid: true,
            created_at: Some(Utc::now()),
        };
        state.orders.push(order.clone());
        order
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// reqwest and tokio-tungstenite both need a process-wide rustls provider.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

// =============================================================================
// REST
// =============================================================================

fn router(shared: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/stores/my", get(my_stores))
        .route("/stores/{id}", get(store).put(update_store))
        .route("/stores/{id}/dashboard", get(dashboard))
        .route("/stores/{id}/categories", get(categories))
        .route("/stores/{id}/menus", get(menus))
        .route("/stores/{id}/seats", get(seats))
        .route("/stores/{id}/orders", get(store_orders))
        .route("/menus/{id}/availability", patch(set_availability))
        .route("/seats/qr/{qr}", get(seat_by_qr))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(order))
        .route("/orders/{id}/status", patch(update_status))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/payments/confirm", post(confirm_payment))
        .route("/notifications/{key}/{id}", get(notifications))
        .route("/notifications/{key}/{id}/unread-count", get(unread_count))
        .route("/notifications/{key}/{id}/read-all", patch(mark_all_read))
        .route("/notifications/{key}/read", patch(mark_read));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws_upgrade))
        .layer(axum::middleware::from_fn_with_state(shared.clone(), record_request))
        .with_state(shared)
}

async fn record_request(
    State(shared): State<Shared>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    shared.state.lock().requests.push(line);
    next.run(request).await
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok("OK", data))).into_response()
}

fn fail(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ApiResponse::<()>::failure("Request failed", error)),
    )
        .into_response()
}

fn unauthorized() -> Response {
    fail(StatusCode::UNAUTHORIZED, "Authentication required")
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(shared): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = shared.state.lock();
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.identity.email.as_str() == body.email && a.password == body.password)
    else {
        let status = if state.login_rejects_with_401 {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::BAD_REQUEST
        };
        return fail(status, "Invalid email or password");
    };
    let user = account.identity.clone();
    let access_token = format!("access-{}", Uuid::new_v4().simple());
    state.sessions.insert(access_token.clone(), user.id);
    ok(serde_json::json!({
        "accessToken": access_token,
        "refreshToken": format!("refresh-{}", Uuid::new_v4().simple()),
        "user": user,
    }))
}

#[derive(Deserialize)]
struct SignupBody {
    email: String,
    password: String,
    name: String,
}

async fn signup(State(shared): State<Shared>, Json(body): Json<SignupBody>) -> Response {
    let mut state = shared.state.lock();
    if state.accounts.iter().any(|a| a.identity.email.as_str() == body.email) {
        return fail(StatusCode::CONFLICT, "Email already registered");
    }
    let id = state.next_id();
    let Ok(email) = Email::parse(&body.email) else {
        return fail(StatusCode::BAD_REQUEST, "Invalid email");
    };
    let created = identity(id, email.as_str(), &body.name, Role::Master, None);
    state.accounts.push(Account {
        password: body.password,
        identity: created.clone(),
    });
    ok(created)
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.state.lock();
    state.caller(&headers).cloned().map_or_else(unauthorized, ok)
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = shared.state.lock();
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.sessions.remove(token);
    }
    ok(serde_json::Value::Null)
}

async fn my_stores(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.state.lock();
    let Some(caller) = state.caller(&headers) else {
        return unauthorized();
    };
    let owned: Vec<Store> = state
        .stores
        .iter()
        .filter(|s| s.owner_id == Some(caller.id))
        .cloned()
        .collect();
    ok(owned)
}

async fn store(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock();
    state
        .stores
        .iter()
        .find(|s| s.id == StoreId::new(id))
        .cloned()
        .map_or_else(|| fail(StatusCode::NOT_FOUND, "Store not found"), ok)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreBody {
    name: String,
    address: Option<String>,
    phone: Option<String>,
    description: Option<String>,
    business_hours: Option<String>,
    is_open: bool,
}

async fn update_store(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StoreBody>,
) -> Response {
    let mut state = shared.state.lock();
    let Some(caller) = state.caller(&headers).cloned() else {
        return unauthorized();
    };
    let Some(store) = state.stores.iter_mut().find(|s| s.id == StoreId::new(id)) else {
        return fail(StatusCode::NOT_FOUND, "Store not found");
    };
    if store.owner_id != Some(caller.id) {
        return fail(StatusCode::FORBIDDEN, "Only the owner can change the store");
    }
    store.name = body.name;
    store.address = body.address;
    store.phone = body.phone;
    store.description = body.description;
    store.business_hours = body.business_hours;
    store.is_open = body.is_open;
    ok(store.clone())
}

async fn dashboard(State(shared): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock();
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let orders: Vec<&Order> = state
        .orders
        .iter()
        .filter(|o| o.store_id == StoreId::new(id))
        .collect();
    let count = |status: OrderStatus| u32::try_from(orders.iter().filter(|o| o.status == status).count()).unwrap_or(u32::MAX);
    ok(DashboardStats {
        today_order_count: u32::try_from(orders.len()).unwrap_or(u32::MAX),
        today_revenue: orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total_amount)
            .sum(),
        pending_order_count: count(OrderStatus::Pending),
        preparing_order_count: count(OrderStatus::Preparing),
    })
}

async fn categories(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock();
    let list: Vec<Category> = state
        .categories
        .iter()
        .filter(|c| c.store_id == Some(StoreId::new(id)))
        .cloned()
        .collect();
    ok(list)
}

async fn menus(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = shared.state.lock();
    let category = query
        .get("categoryId")
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(CategoryId::new);
    let list: Vec<MenuItem> = state
        .menus
        .iter()
        .filter(|m| m.store_id == Some(StoreId::new(id)))
        .filter(|m| category.is_none() || m.category_id == category)
        .cloned()
        .collect();
    ok(list)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityBody {
    is_available: bool,
}

async fn set_availability(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<AvailabilityBody>,
) -> Response {
    let mut state = shared.state.lock();
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let Some(menu) = state.menus.iter_mut().find(|m| m.id == MenuId::new(id)) else {
        return fail(StatusCode::NOT_FOUND, "Menu not found");
    };
    menu.is_available = body.is_available;
    ok(menu.clone())
}

async fn seats(State(shared): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock();
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let list: Vec<Seat> = state
        .seats
        .iter()
        .filter(|s| s.store_id == StoreId::new(id))
        .cloned()
        .collect();
    ok(list)
}

async fn seat_by_qr(State(shared): State<Shared>, Path(qr): Path<String>) -> Response {
    let state = shared.state.lock();
    let Some(seat) = state.seats.iter().find(|s| s.qr_code == qr).cloned() else {
        return fail(StatusCode::NOT_FOUND, "Seat not found");
    };
    let Some(store) = state.stores.iter().find(|s| s.id == seat.store_id).cloned() else {
        return fail(StatusCode::NOT_FOUND, "Store not found");
    };
    ok(SeatLookup { seat, store })
}

async fn store_orders(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = shared.state.lock();
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let status = query.get("status").and_then(|raw| raw.parse::<OrderStatus>().ok());
    let list: Vec<Order> = state
        .orders
        .iter()
        .filter(|o| o.store_id == StoreId::new(id))
        .filter(|o| status.is_none_or(|s| o.status == s))
        .cloned()
        .collect();
    ok(list)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrder {
    store_id: StoreId,
    seat_id: SeatId,
    items: Vec<NewOrderItem>,
    customer_note: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrderItem {
    menu_id: MenuId,
    quantity: u32,
    options: Option<String>,
}

async fn create_order(State(shared): State<Shared>, Json(body): Json<NewOrder>) -> Response {
    let mut state = shared.state.lock();
    if body.items.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Order has no items");
    }
    let mut items = Vec::new();
    for line in &body.items {
        let Some(menu) = state.menus.iter().find(|m| m.id == line.menu_id) else {
            return fail(StatusCode::BAD_REQUEST, "Unknown menu item");
        };
        if !menu.is_available {
            return fail(StatusCode::BAD_REQUEST, "Menu item is sold out");
        }
        items.push(OrderItem {
            id: None,
            menu_id: menu.id,
            menu_name: menu.name.clone(),
            quantity: line.quantity,
            unit_price: menu.price,
            options: line.options.clone(),
        });
    }
    let seat_number = state
        .seats
        .iter()
        .find(|s| s.id == body.seat_id)
        .map(|s| s.seat_number.clone());
    let id = state.next_id();
    let order = Order {
        id: OrderId::new(id),
        store_id: body.store_id,
        seat_id: body.seat_id,
        seat_number,
        order_number: format!("A-{id:03}"),
        total_amount: items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        customer_note: body.customer_note,
        items,
        cancelable: true,
        paid: false,
        created_at: Some(Utc::now()),
    };
    state.orders.push(order.clone());
    ok(order)
}

async fn order(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock();
    state
        .orders
        .iter()
        .find(|o| o.id == OrderId::new(id))
        .cloned()
        .map_or_else(|| fail(StatusCode::NOT_FOUND, "Order not found"), ok)
}

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn update_status(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Response {
    let (order, notification) = {
        let mut state = shared.state.lock();
        if state.caller(&headers).is_none() {
            return unauthorized();
        }
        let Some(order) = state.orders.iter_mut().find(|o| o.id == OrderId::new(id)) else {
            return fail(StatusCode::NOT_FOUND, "Order not found");
        };
        if order.status.next() != Some(body.status) {
            return fail(StatusCode::BAD_REQUEST, "Invalid status transition");
        }
        order.status = body.status;
        order.cancelable = false;
        let order = order.clone();
        let kind = if body.status == OrderStatus::Completed {
            NotificationType::OrderCompleted
        } else {
            NotificationType::OrderReceived
        };
        let message = format!("Order {} is {}", order.order_number, body.status.label().to_lowercase());
        let notification = state.notify(TargetAudience::Customer, &order, kind, message);
        (order, notification)
    };
    shared.publish_notification(&notification);
    ok(order)
}

async fn cancel_order(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let (order, notification) = {
        let mut state = shared.state.lock();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == OrderId::new(id)) else {
            return fail(StatusCode::NOT_FOUND, "Order not found");
        };
        if order.status != OrderStatus::Pending {
            return fail(StatusCode::BAD_REQUEST, "Order can no longer be cancelled");
        }
        order.status = OrderStatus::Cancelled;
        order.cancelable = false;
        let order = order.clone();
        let message = format!("Order {} was cancelled", order.order_number);
        let notification = state.notify(
            TargetAudience::Customer,
            &order,
            NotificationType::OrderCancelled,
            message,
        );
        (order, notification)
    };
    shared.publish_notification(&notification);
    ok(order)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBody {
    payment_key: String,
    toss_order_id: String,
    order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

async fn confirm_payment(State(shared): State<Shared>, Json(body): Json<ConfirmBody>) -> Response {
    let (payment, notification) = {
        let mut state = shared.state.lock();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == body.order_id) else {
            return fail(StatusCode::NOT_FOUND, "Order not found");
        };
        if order.total_amount != body.amount {
            return fail(StatusCode::BAD_REQUEST, "Amount does not match the order");
        }
        if !body.toss_order_id.starts_with(&format!("TS-{}-", order.id)) {
            return fail(StatusCode::BAD_REQUEST, "Unknown payment order");
        }
        order.paid = true;
        order.payment_status = PaymentStatus::Completed;
        let order = order.clone();
        let message = format!("New order {}", order.order_number);
        let notification = state.notify(
            TargetAudience::Admin,
            &order,
            NotificationType::OrderReceived,
            message,
        );
        let payment = Payment {
            payment_key: body.payment_key,
            order_id: order.id,
            amount: body.amount,
            status: PaymentStatus::Completed,
            method: Some("CARD".to_string()),
            approved_at: Some(Utc::now()),
        };
        (payment, notification)
    };
    shared.publish_notification(&notification);
    ok(payment)
}

fn audience(raw: &str) -> Option<TargetAudience> {
    match raw {
        "admin" => Some(TargetAudience::Admin),
        "customer" => Some(TargetAudience::Customer),
        _ => None,
    }
}

fn visible_to(notification: &Notification, audience: TargetAudience, id: i64) -> bool {
    notification.target_type == audience
        && match audience {
            TargetAudience::Admin => notification.store_id == StoreId::new(id),
            TargetAudience::Customer => notification.order_id == Some(OrderId::new(id)),
        }
}

async fn notifications(State(shared): State<Shared>, Path((raw, id)): Path<(String, i64)>) -> Response {
    let Some(audience) = audience(&raw) else {
        return fail(StatusCode::NOT_FOUND, "Unknown audience");
    };
    let state = shared.state.lock();
    let mut list: Vec<Notification> = state
        .notifications
        .iter()
        .filter(|n| visible_to(n, audience, id))
        .cloned()
        .collect();
    list.reverse();
    ok(list)
}

async fn unread_count(State(shared): State<Shared>, Path((raw, id)): Path<(String, i64)>) -> Response {
    let Some(audience) = audience(&raw) else {
        return fail(StatusCode::NOT_FOUND, "Unknown audience");
    };
    let state = shared.state.lock();
    let count = state
        .notifications
        .iter()
        .filter(|n| visible_to(n, audience, id) && !n.is_read)
        .count();
    ok(serde_json::json!({ "count": count }))
}

async fn mark_read(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = shared.state.lock();
    if state.fail_mark_read {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Could not update notification");
    }
    let Some(notification) = state
        .notifications
        .iter_mut()
        .find(|n| n.id == NotificationId::new(id))
    else {
        return fail(StatusCode::NOT_FOUND, "Notification not found");
    };
    notification.mark_read(Utc::now());
    ok(serde_json::Value::Null)
}

async fn mark_all_read(State(shared): State<Shared>, Path((raw, id)): Path<(String, i64)>) -> Response {
    if audience(&raw) != Some(TargetAudience::Admin) {
        return fail(StatusCode::NOT_FOUND, "Unknown audience");
    }
    let mut state = shared.state.lock();
    let now = Utc::now();
    for notification in state
        .notifications
        .iter_mut()
        .filter(|n| visible_to(n, TargetAudience::Admin, id))
    {
        notification.mark_read(now);
    }
    ok(serde_json::Value::Null)
}

// =============================================================================
// STOMP over WebSocket
// =============================================================================

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let token = query.get("token").cloned();
    {
        let mut state = shared.state.lock();
        state.ws_tokens.push(token);
        if state.refuse_ws {
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }
    ws.on_upgrade(move |socket| stomp_session(socket, shared))
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> bool {
    socket
        .send(Message::Text(frame.encode().into()))
        .await
        .is_ok()
}

async fn stomp_session(mut socket: WebSocket, shared: Shared) {
    let mut pushes = shared.pushes.subscribe();
    let mut subscriptions: Vec<(String, String)> = Vec::new();
    let mut message_id = 0_u64;

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let Some(Ok(Message::Text(text))) = inbound else {
                    return;
                };
                let Ok(Some(frame)) = Frame::parse(text.as_str()) else {
                    continue;
                };
                match frame.command.as_str() {
                    "CONNECT" | "STOMP" => {
                        let reply = Frame::new("CONNECTED").header("version", "1.2");
                        if !send_frame(&mut socket, &reply).await {
                            return;
                        }
                    }
                    "SUBSCRIBE" => {
                        let id = frame.get_header("id").unwrap_or("sub-0").to_string();
                        let destination = frame.get_header("destination").unwrap_or_default().to_string();
                        shared.state.lock().subscriptions.push(destination.clone());
                        subscriptions.push((id, destination));
                    }
                    "DISCONNECT" => return,
                    _ => {}
                }
            }
            push = pushes.recv() => {
                let Ok(push) = push else {
                    continue;
                };
                for (id, destination) in &subscriptions {
                    if *destination != push.destination {
                        continue;
                    }
                    message_id += 1;
                    let frame = Frame::new("MESSAGE")
                        .header("subscription", id.as_str())
                        .header("destination", destination.as_str())
                        .header("message-id", message_id.to_string())
                        .header("content-type", "application/json")
                        .body(push.body.clone());
                    if !send_frame(&mut socket, &frame).await {
                        return;
                    }
                }
            }
        }
    }
}

/// Log in through the identity context of `ctx`.
pub async fn login_as(ctx: &AppContext, email: &str) -> Identity {
    let credentials = tableside_client::gateway::Credentials {
        email: Email::parse(email).expect("valid email"),
        password: PASSWORD.to_string().into(),
    };
    ctx.identity.login(&credentials).await.expect("login succeeds")
}

/// The next pushed notification on `events`, skipping poller snapshots.
pub async fn next_notification(events: &mut Subscription) -> Notification {
    let wait = async {
        loop {
            match events.recv().await {
                Some(ChannelEvent::Notification(notification)) => return notification,
                Some(ChannelEvent::UnreadCount(_)) => {}
                None => panic!("channel closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("notification within 5s")
}
