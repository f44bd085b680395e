//! # Invoke Loop
//!
//! One JSON request per input line, one JSON response per output line.
//!
//! ## Wire Format
//! ```text
//! stdin  ──► {"id":1,"cmd":"sell_from_stock","args":{"stock_item_id":"..","quantity":3}}
//! stdout ◄── {"id":1,"ok":true,"data":{...},"notice":{"level":"success","message":"..."}}
//!
//! stdin  ──► {"id":2,"cmd":"get_order","args":{"id":"nope"}}
//! stdout ◄── {"id":2,"ok":false,"error":{"code":"NOT_FOUND","message":"..."},
//!             "notice":{"level":"error","message":"..."}}
//! ```
//!
//! Requests are handled strictly in order; the next line is not read
//! until the previous response is flushed. Logs go to stderr.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::commands;
use crate::error::ApiError;
use crate::notifier::{Notice, Notifier};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Echoed back untouched so the caller can match responses.
    #[serde(default)]
    pub id: Value,
    pub cmd: String,
    #[serde(default)]
    pub args: Value,
    /// Acts as this account for this request only.
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub notice: Notice,
}

impl Response {
    /// Response written when the host cannot start.
    pub fn fatal(message: impl Into<String>) -> Self {
        let notice = Notifier::fatal(message);
        Response {
            id: Value::Null,
            ok: false,
            data: None,
            error: Some(ApiError::internal(notice.message.clone())),
            notice,
        }
    }
}

/// Handles one input line. Never fails: malformed input becomes an
/// `INVALID_REQUEST` response.
pub async fn handle_line(state: &AppState, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            let result = Err(ApiError::invalid_request(format!("Malformed request: {}", e)));
            let notice = Notifier::notice("", &result);
            return Response {
                id: Value::Null,
                ok: false,
                data: None,
                error: result.err(),
                notice,
            };
        }
    };

    debug!(cmd = %request.cmd, "Handling request");
    let result = commands::dispatch(state, &request.cmd, request.account.as_deref(), request.args).await;
    let notice = Notifier::notice(&request.cmd, &result);

    match result {
        Ok(reply) => Response {
            id: request.id,
            ok: true,
            data: Some(reply.data),
            error: None,
            notice,
        },
        Err(err) => Response {
            id: request.id,
            ok: false,
            data: None,
            error: Some(err),
            notice,
        },
    }
}

/// Writes one response line and flushes it.
pub async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Serves requests until `reader` reaches end of input.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(state, &line).await;
        write_response(&mut writer, &response).await?;
        handled += 1;
    }

    info!(handled, "Input closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConfigState, DbState, OrderLedger, SessionState};
    use atelie_core::AccountId;
    use atelie_db::{Database, DbConfig};

    async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState {
            db: DbState::new(db),
            session: SessionState::new(AccountId::new("acc-1").unwrap()),
            ledger: OrderLedger::new(),
            config: ConfigState::default(),
        }
    }

    fn responses(out: &[u8]) -> Vec<Value> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_register_then_sell() {
        let state = state().await;
        let mut out = Vec::new();
        let input = br#"{"id":1,"cmd":"register_stock_item","args":{"produto":"Caneca","quantidade":10,"valor_venda":"20,00"}}
"#;
        serve(&state, &input[..], &mut out).await.unwrap();
        let first = responses(&out);
        let stock_id = first[0]["data"]["id"].as_str().unwrap().to_string();

        let sell = serde_json::json!({
            "id": "sale-1",
            "cmd": "sell_from_stock",
            "args": { "stock_item_id": stock_id, "quantity": 3 }
        });
        let input = format!("{}\n\n{}\n", sell, r#"{"id":3,"cmd":"get_ledger"}"#);
        let mut out = Vec::new();
        serve(&state, input.as_bytes(), &mut out).await.unwrap();

        let lines = responses(&out);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], "sale-1");
        assert_eq!(lines[0]["ok"], true);
        assert_eq!(lines[0]["notice"]["level"], "success");
        assert_eq!(lines[0]["data"]["remaining_quantity"], 7);
        assert_eq!(lines[1]["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_line_gets_error_response() {
        let state = state().await;
        let response = handle_line(&state, "not json").await;
        assert!(!response.ok);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
        assert_eq!(json["notice"]["level"], "error");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_not_found_is_error_notice() {
        let state = state().await;
        let response = handle_line(&state, r#"{"id":9,"cmd":"get_order","args":{"id":"missing"}}"#).await;
        assert_eq!(response.id, serde_json::json!(9));
        assert_eq!(response.error.unwrap().code, crate::error::ErrorCode::NotFound);
    }

    #[test]
    fn test_fatal_response() {
        let json = serde_json::to_value(Response::fatal("Database unavailable")).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["notice"]["message"], "Database unavailable");
    }
}
