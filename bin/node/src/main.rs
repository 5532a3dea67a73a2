//! rollcheck node
//!
//! A single-process chain that:
//! - Produces a block every `BLOCK_TIME_MS`
//! - Lets rival players and the predictor's operator submit each block
//! - Serves JSON-RPC for queries and for submitting transactions

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::utils::format_ether;
use anyhow::Result;
use axum::{
    extract::State as AxumState,
    routing::{get, post},
    Json, Router,
};
use rollcheck_core::{Address, Hash, LogEntry, Receipt, Transaction, TxKind};
use rollcheck_host::{Config, Session};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

type SharedState = Arc<RwLock<Session>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env();
    info!("Starting rollcheck node...");
    info!("  Predictor:  {}", config.predictor);
    info!("  Game:       {}", config.game);
    info!("  Owner:      {}", config.owner);
    info!("  Strategy:   {:?}", config.strategy);
    info!("  Rivals:     {} (p={})", config.rival_count, config.rival_play_probability);
    info!("  Block time: {}ms", config.block_time_ms);

    let state = Arc::new(RwLock::new(Session::new(&config)?));

    let block_state = state.clone();
    let block_time = Duration::from_millis(config.block_time_ms);
    tokio::spawn(async move {
        block_production_loop(block_state, block_time).await;
    });

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/", post(rpc_handler))
        .with_state(state);

    info!("RPC server listening on {}", config.rpc_addr);
    let listener = tokio::net::TcpListener::bind(&config.rpc_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Produces a block every tick
async fn block_production_loop(state: SharedState, block_time: Duration) {
    let mut ticker = interval(block_time);
    loop {
        ticker.tick().await;
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let mut session = state.write().await;
        let report = session.step(timestamp);
        if report.block.number % 50 == 0 {
            let summary = session.summary();
            info!(
                "Block {}: balance={} ETH, wins={}, counter={}",
                summary.blocks,
                summary.predictor_balance,
                summary.predictor_wins,
                summary.sequence_counter,
            );
        }
    }
}

/// Health check endpoint
async fn health() -> &'static str {
    "ok"
}

/// JSON-RPC request
#[derive(Deserialize)]
struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC response
#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: String,
    result: Value,
    id: Value,
}

/// Transaction input for RPC; nonce is filled in when absent
#[derive(Deserialize)]
struct TxInput {
    from: Address,
    #[serde(default)]
    nonce: Option<u64>,
    kind: TxKind,
}

fn nth_param(req: &RpcRequest, n: usize) -> Option<&Value> {
    req.params.as_ref().and_then(|p| p.as_array()).and_then(|arr| arr.get(n))
}

fn first_param(req: &RpcRequest) -> Option<&Value> {
    nth_param(req, 0)
}

fn parse_param<T: for<'de> Deserialize<'de>>(req: &RpcRequest) -> Option<T> {
    first_param(req).and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// RPC handler
async fn rpc_handler(
    AxumState(state): AxumState<SharedState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let result = match req.method.as_str() {
        "rc_sendTransaction" => send_transaction(&state, &req).await,
        "rc_setGameOpen" => match parse_param::<bool>(&req) {
            Some(open) => {
                state.write().await.chain_mut().set_game_open(open);
                json!({ "success": true, "open": open })
            }
            None => json!({ "success": false, "error": "expected [bool]" }),
        },
        _ => query(&state, &req).await,
    };

    Json(RpcResponse { jsonrpc: "2.0".to_string(), result, id: req.id })
}

/// Read-only methods
async fn query(state: &SharedState, req: &RpcRequest) -> Value {
    let session = state.read().await;
    let chain = session.chain();

    match req.method.as_str() {
        "eth_blockNumber" | "rc_blockNumber" => {
            json!(format!("0x{:x}", chain.latest_block().number))
        }
        "rc_getBlock" => {
            let latest = chain.latest_block().number;
            let number = first_param(req).and_then(Value::as_u64).unwrap_or(latest);
            chain.block(number).map_or(Value::Null, |b| json!(b))
        }
        "rc_getBalance" => match parse_param::<Address>(req) {
            Some(address) => json!({
                "wei": chain.balance(&address).to_string(),
                "ether": format_ether(chain.balance(&address)),
            }),
            None => Value::Null,
        },
        "rc_getReceipt" => parse_param::<Hash>(req)
            .and_then(|hash| chain.receipt(&hash))
            .map_or(Value::Null, receipt_json),
        // params: [fromBlock?, emitter?]
        "rc_getEvents" => {
            let from = first_param(req).and_then(Value::as_u64).unwrap_or(0);
            let emitter =
                nth_param(req, 1).and_then(|v| serde_json::from_value::<Address>(v.clone()).ok());
            let entries: Vec<_> = match emitter {
                Some(emitter) => chain
                    .events()
                    .by_emitter(&emitter)
                    .filter(|e| e.block_number >= from)
                    .map(log_json)
                    .collect(),
                None => chain.events().since(from).map(log_json).collect(),
            };
            json!(entries)
        }
        "rc_predict" => {
            let block = chain.pending_context();
            let outcome = chain.preview();
            json!({
                "block": block.number,
                "parentHash": block.parent_hash,
                "counter": chain.sequence_counter().to_string(),
                "pendingCounter": chain.pending_counter().to_string(),
                "roll": outcome.roll,
                "win": outcome.is_win(),
            })
        }
        "rc_getStatus" => json!({
            "summary": session.summary(),
            "mempool": chain.mempool_stats(),
            "gameOpen": chain.executor().game().is_open(),
        }),
        _ => Value::Null,
    }
}

/// Handle rc_sendTransaction
async fn send_transaction(state: &SharedState, req: &RpcRequest) -> Value {
    let Some(input) = parse_param::<TxInput>(req) else {
        return json!({ "success": false, "error": "invalid tx" });
    };

    let mut session = state.write().await;
    let chain = session.chain_mut();
    let nonce = input.nonce.unwrap_or_else(|| chain.next_nonce(&input.from));
    match chain.submit(Transaction::new(input.from, nonce, input.kind)) {
        Ok(hash) => json!({ "success": true, "txHash": hash, "nonce": nonce }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    }
}

fn receipt_json(receipt: &Receipt) -> Value {
    json!({
        "txHash": receipt.tx_hash,
        "blockNumber": receipt.block_number,
        "success": receipt.is_success(),
        "error": receipt.status.as_ref().err().map(ToString::to_string),
        "predictedRoll": receipt.predicted_roll(),
        "logs": receipt.logs.iter().map(log_json).collect::<Vec<_>>(),
    })
}

fn log_json(entry: &LogEntry) -> Value {
    json!(entry)
}
