//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. A
//! connection that subscribes to events also receives notifications,
//! interleaved with its responses.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stamp_types::Caller;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands::{self, subscriptions::Subscription};
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    #[serde(default)]
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: Value,
    /// Identity asserted by the upstream identity provider. Absent = anonymous.
    #[serde(default)]
    pub caller: Caller,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-initiated JSON-RPC notification (no id).
#[derive(Debug, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC error object. Used for protocol faults only; ledger failures
/// travel inside a successful `result` as a tagged reply.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcNotification {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

impl RpcError {
    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(socket = ?self.socket_path, "IPC server listening");

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

enum Incoming {
    Line(Option<String>),
    Notification(Option<RpcNotification>),
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut subscription: Option<Subscription> = None;

    loop {
        // `next_line` is cancel safe, so losing the race to a notification
        // never drops a partially read request.
        let incoming = tokio::select! {
            line = lines.next_line() => Incoming::Line(line?),
            note = commands::subscriptions::next_notification(&mut subscription) => {
                Incoming::Notification(note)
            }
        };

        let mut out = match incoming {
            Incoming::Line(None) => break, // EOF
            Incoming::Line(Some(line)) if line.trim().is_empty() => continue,
            Incoming::Line(Some(line)) => {
                let response = handle_line(&state, &mut subscription, &line).await;
                serde_json::to_string(&response)?
            }
            Incoming::Notification(Some(note)) => serde_json::to_string(&note)?,
            Incoming::Notification(None) => {
                debug!("event stream closed, dropping subscription");
                subscription = None;
                continue;
            }
        };

        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

async fn handle_line(
    state: &Arc<DaemonState>,
    subscription: &mut Option<Subscription>,
    line: &str,
) -> RpcResponse {
    let request = match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => request,
        Err(_) => return RpcResponse::error(Value::Null, RpcError::parse_error()),
    };
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(request.id, RpcError::invalid_request());
    }

    let id = request.id.clone();
    let result = match request.method.as_str() {
        "subscribeEvents" => {
            commands::subscriptions::subscribe(state, request.caller, &request.params, subscription)
                .await
        }
        "unsubscribeEvents" => Ok(commands::subscriptions::unsubscribe(subscription)),
        _ => dispatch_request(state, request).await,
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(
    state: &Arc<DaemonState>,
    request: RpcRequest,
) -> Result<Value, RpcError> {
    let method = request.method.as_str();
    let caller = request.caller;
    let params = &request.params;

    debug!(method, caller = ?caller.id(), "dispatching RPC method");

    match method {
        // Enrollment
        "ensureCustomerCard" => commands::enrollment::ensure_customer_card(state, caller, params).await,
        "ensureBusinessAndDefaultCard" => {
            commands::enrollment::ensure_business_and_default_card(state, caller, params).await
        }

        // Wallet passes
        "generateWalletPass" => commands::passes::generate_wallet_pass(state, caller, params).await,
        "regenerateWalletPass" => {
            commands::passes::regenerate_wallet_pass(state, caller, params).await
        }
        "revokeWalletPass" => commands::passes::revoke_wallet_pass(state, caller, params).await,

        // Stamps and redemption
        "processPromotionScan" => commands::redemption::process_promotion_scan(state, params).await,
        "redeemWalletPassToken" => {
            commands::redemption::redeem_wallet_pass_token(state, caller, params).await
        }
        "generateRewardClaimToken" => {
            commands::redemption::generate_reward_claim_token(state, caller, params).await
        }
        "redeemRewardClaimToken" => {
            commands::redemption::redeem_reward_claim_token(state, caller, params).await
        }

        // Administration
        "updateBusiness" => commands::admin::update_business(state, caller, params).await,
        "addStaffMember" => commands::admin::add_staff_member(state, caller, params).await,
        "setStaffActive" => commands::admin::set_staff_active(state, caller, params).await,
        "listStaff" => commands::admin::list_staff(state, caller, params).await,
        "createPromotion" => commands::admin::create_promotion(state, caller, params).await,
        "setPromotionActive" => commands::admin::set_promotion_active(state, caller, params).await,
        "generatePromotionScanToken" => {
            commands::admin::generate_promotion_scan_token(state, caller, params).await
        }
        "getPublicActivePromotions" => {
            commands::admin::get_public_active_promotions(state, params).await
        }
        "updateLoyaltyCard" => commands::admin::update_loyalty_card(state, caller, params).await,

        // Reads
        "getCustomerCard" => commands::reads::get_customer_card(state, caller, params).await,
        "listRewards" => commands::reads::list_rewards(state, caller, params).await,
        "listEvents" => commands::reads::list_events(state, caller, params).await,

        _ => Err(RpcError::method_not_found(method)),
    }
}
