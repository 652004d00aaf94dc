//! IPC command handlers.
//!
//! Each submodule implements the commands for one area of the ledger.
//! Handlers parse typed params, run the ledger call on the blocking pool
//! (SQLite may wait on the write lock) and wrap the outcome in a tagged
//! [`Reply`].

pub mod admin;
pub mod enrollment;
pub mod passes;
pub mod reads;
pub mod redemption;
pub mod subscriptions;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stamp_ledger::{Ledger, LedgerError};
use stamp_types::{Coded, ErrorCode, Reply};

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Deserialize `params` into the operation's parameter struct.
fn parse<P: DeserializeOwned>(params: &Value) -> std::result::Result<P, RpcError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Run `op` against the ledger and wrap its outcome.
async fn call<T, F>(state: &Arc<DaemonState>, op: F) -> Result
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Ledger) -> stamp_ledger::Result<T> + Send + 'static,
{
    let ledger = state.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || op(&ledger))
        .await
        .map_err(|e| RpcError::internal_error(&format!("ledger task failed: {e}")))?;
    reply(outcome)
}

/// Turn a ledger outcome into the `{success, data?, error?}` envelope.
fn reply<T: Serialize>(outcome: stamp_ledger::Result<T>) -> Result {
    if let Err(err) = &outcome {
        log_failure(err);
    }
    serde_json::to_value(Reply::from(outcome))
        .map_err(|e| RpcError::internal_error(&format!("serialize reply: {e}")))
}

fn log_failure(err: &LedgerError) {
    match err.code() {
        ErrorCode::UnknownError => tracing::warn!(error = %err, "ledger operation failed"),
        code => tracing::debug!(%code, error = %err, "ledger operation rejected"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Daemon state over an in-memory ledger.

    use std::sync::Arc;

    use serde_json::Value;
    use stamp_ledger::Ledger;
    use stamp_types::Caller;

    use crate::config::DaemonConfig;
    use crate::events::EventBus;
    use crate::rpc::{dispatch_request, RpcRequest};
    use crate::DaemonState;

    pub fn state() -> Arc<DaemonState> {
        let event_bus = EventBus::new(64);
        let ledger = Ledger::open_memory()
            .expect("open ledger")
            .with_sink(Arc::new(event_bus.clone()));
        Arc::new(DaemonState {
            ledger: Arc::new(ledger),
            config: DaemonConfig::default(),
            event_bus,
        })
    }

    /// Dispatch one call and return its `result` envelope.
    pub async fn call(state: &Arc<DaemonState>, caller: Option<&str>, method: &str, params: Value) -> Value {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(1),
            method: method.to_string(),
            params,
            caller: caller.map(Caller::identified).unwrap_or_default(),
        };
        dispatch_request(state, request).await.expect("protocol-level success")
    }
}
