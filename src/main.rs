//! Demo: tres upserts contra el fixture de pedidos en memoria.
//!
//! - alta de línea con producto (selector genérico + outfields);
//! - actualización parcial de un pedido existente;
//! - alta de línea con almacén (selector de consulta propia).

use log::{info, warn};
use rxbridge::adapters::Fixture;
use rxbridge::config::CONFIG;
use rxbridge::engine::{UpsertMethod, UpsertRequest};
use rxbridge::errors::AppError;
use rxbridge::{in_memory_upserter, logging};
use serde_json::{json, Value};

const FIXTURE: &str = include_str!("../fixtures/order_line.json");

fn run() -> Result<(), AppError> {
    let fixture = Fixture::from_json_str(FIXTURE)?;
    let (_stack, upserter) = in_memory_upserter(&fixture)?;
    let scope = fixture.scope();
    info!("fixture loaded: {} definitions", fixture.definitions.len());

    let requests = [("línea con producto",
                     UpsertMethod::Create,
                     "ORDER_LINE",
                     json!({"salesOrder": "SO-1", "product": "P-001", "orderedQuantity": "3"})),
                    ("pedido existente", UpsertMethod::update("SO-1"), "ORDER", json!({"description": "x"})),
                    ("línea con almacén",
                     UpsertMethod::Create,
                     "ORDER_LINE",
                     json!({"salesOrder": "SO-1", "warehouse": "W-1"}))];

    for (label, method, definition, body) in requests {
        let Value::Object(payload) = body else {
            warn!("{label}: payload is not an object, skipped");
            continue;
        };
        info!("{label}: {} {definition}", method.as_str());
        let saved = upserter.upsert(&scope, &UpsertRequest::new(method, definition, payload))?;
        println!("== {label}\n{}", serde_json::to_string_pretty(&saved).unwrap_or_default());
    }
    Ok(())
}

fn main() {
    logging::init(&CONFIG.logging);
    if let Err(e) = run() {
        eprintln!("[rxbridge-demo] {e}");
        std::process::exit(1);
    }
}
