use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use dripsplit::config::CONFIG;
use dripsplit::core::models::{
    balance::GroupBalance, bill::Bill, group::Group, request::TransactionRequest, user::User,
};
use dripsplit::core::service::VerifyPolicy;
use dripsplit::infrastructure::audit::{AuditEntry, AuditLog, in_memory::InMemoryAuditLog};
use dripsplit::infrastructure::directory::InMemoryDirectory;
use dripsplit::infrastructure::ledger::{LedgerGateway, json_rpc::JsonRpcLedger};
use dripsplit::infrastructure::notify::TracingNotifier;
use dripsplit::infrastructure::storage::in_memory::InMemoryStorage;
use dripsplit::{DripsplitError, DripsplitService};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

type Engine =
    DripsplitService<InMemoryStorage, JsonRpcLedger, InMemoryDirectory, TracingNotifier, InMemoryAuditLog>;

struct AppState {
    service: Engine,
    directory: InMemoryDirectory,
    audit: InMemoryAuditLog,
}

// Request structs for JSON payloads
#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
    address: String,
}

#[derive(Deserialize)]
struct CreateGroupRequest {
    name: String,
    description: String,
    member_ids: Vec<String>,
    created_by_id: String,
}

#[derive(Deserialize)]
struct AddMemberRequest {
    user_id: String,
}

#[derive(Deserialize)]
struct AddBillRequest {
    description: String,
    creditor_id: String,
    participant_ids: Vec<String>,
    weights: Vec<u64>,
    total_drops: i64,
}

#[derive(Deserialize)]
struct PayRequestRequest {
    id: String,
    reference: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// Newtype wrapper for DripsplitError to implement IntoResponse
struct ApiError(DripsplitError);

impl From<DripsplitError> for ApiError {
    fn from(err: DripsplitError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            DripsplitError::UserNotFound(_)
            | DripsplitError::GroupNotFound(_)
            | DripsplitError::BillNotFound(_)
            | DripsplitError::RequestNotFound(_)
            | DripsplitError::AddressNotFound(_)
            | DripsplitError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            DripsplitError::UsernameTaken(_)
            | DripsplitError::AlreadyGroupMember(_)
            | DripsplitError::DuplicateReference(_)
            | DripsplitError::AlreadyPaid(_) => StatusCode::CONFLICT,
            DripsplitError::NotGroupMember(_)
            | DripsplitError::InvalidSplit(_)
            | DripsplitError::InvalidAmount(_)
            | DripsplitError::InvalidReference(_)
            | DripsplitError::VerificationFailed(_) => StatusCode::BAD_REQUEST,
            DripsplitError::LedgerUnavailable(_) => StatusCode::BAD_GATEWAY,
            DripsplitError::StorageError(_) | DripsplitError::AuditError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.service.create_user(req.username).await?;
    state.directory.register(&user.id, &req.address).await;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| DripsplitError::UserNotFound(user_id))?;
    Ok(Json(user))
}

async fn get_user_requests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<TransactionRequest>>, ApiError> {
    let requests = state.service.requests_to_user(&user_id).await?;
    Ok(Json(requests))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let created_by = state
        .service
        .get_user(&req.created_by_id)
        .await?
        .ok_or_else(|| DripsplitError::UserNotFound(req.created_by_id))?;
    let group = state
        .service
        .create_group(req.name, req.description, req.member_ids, &created_by)
        .await?;
    Ok(Json(group))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| DripsplitError::GroupNotFound(group_id))?;
    Ok(Json(group))
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state.service.add_member(&group_id, &req.user_id).await?;
    Ok(Json(group))
}

async fn get_group_balances(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupBalance>>, ApiError> {
    let balances = state.service.group_balances(&group_id).await?;
    Ok(Json(balances))
}

async fn get_group_bills(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Bill>>, ApiError> {
    let bills = state.service.group_bills(&group_id).await?;
    Ok(Json(bills))
}

async fn add_group_bill(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddBillRequest>,
) -> Result<Json<Vec<GroupBalance>>, ApiError> {
    let (_bill, balances) = state
        .service
        .add_group_bill(
            &group_id,
            req.description,
            &req.creditor_id,
            req.participant_ids,
            req.weights,
            req.total_drops,
        )
        .await?;
    Ok(Json(balances))
}

async fn settle_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<TransactionRequest>>, ApiError> {
    let requests = state.service.settle(&group_id).await?;
    Ok(Json(requests))
}

async fn add_bill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBillRequest>,
) -> Result<Json<Vec<TransactionRequest>>, ApiError> {
    let (_bill, requests) = state
        .service
        .add_bill(
            req.description,
            &req.creditor_id,
            req.participant_ids,
            req.weights,
            req.total_drops,
        )
        .await?;
    Ok(Json(requests))
}

async fn get_bill(
    State(state): State<Arc<AppState>>,
    Path(bill_id): Path<String>,
) -> Result<Json<Bill>, ApiError> {
    let bill = state.service.get_bill(&bill_id).await?;
    Ok(Json(bill))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<TransactionRequest>, ApiError> {
    let request = state.service.get_request(&request_id).await?;
    Ok(Json(request))
}

async fn pay_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PayRequestRequest>,
) -> Result<Json<TransactionRequest>, ApiError> {
    let paid = state.service.pay_request(&req.id, &req.reference).await?;
    Ok(Json(paid))
}

async fn get_audit_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let entries = state.audit.entries().await?;
    Ok(Json(entries))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    // The ledger connection is the source of monetary truth; without it the
    // service must not accept settlement traffic.
    let ledger = JsonRpcLedger::new(CONFIG.ledger_url.clone());
    match ledger.server_info().await {
        Ok(server_info) => {
            info!(
                build_version = %server_info.build_version,
                complete_ledgers = %server_info.complete_ledgers,
                "connected to ledger"
            );
        }
        Err(err) => {
            error!(url = %CONFIG.ledger_url, error = %err, "connecting to ledger failed");
            std::process::exit(1);
        }
    }

    let storage = InMemoryStorage::new();
    let directory = InMemoryDirectory::new();
    let audit = InMemoryAuditLog::new();
    let service = DripsplitService::new(
        storage,
        ledger,
        directory.clone(),
        TracingNotifier::new(),
        audit.clone(),
    )
    .with_verify_policy(VerifyPolicy {
        attempts: CONFIG.ledger_retry_attempts,
        delay: CONFIG.ledger_retry_delay,
    });
    let state = Arc::new(AppState {
        service,
        directory,
        audit,
    });

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/requests", get(get_user_requests))
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/balances", get(get_group_balances))
        .route("/groups/{group_id}/bills", get(get_group_bills))
        .route("/groups/{group_id}/bill", put(add_group_bill))
        .route("/groups/{group_id}/settle", put(settle_group))
        .route("/bills", post(add_bill))
        .route("/bills/{bill_id}", get(get_bill))
        .route("/requests/{request_id}", get(get_request))
        .route("/requests/pay", put(pay_request))
        .route("/audits", get(get_audit_entries))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
