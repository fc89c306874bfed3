use rx_adapters::{Fixture, InMemoryStack};
use rx_core::{UpsertMethod, UpsertRequest};
use rxbridge::config::CONFIG;
use rxbridge::logging;
use serde_json::Value;

const USAGE: &str = "Uso: rx-cli upsert --fixture <JSON> --definition <ID> --method <create|update> [--id <ID>] \
                     --payload <JSON|archivo> [--changed <campo>] [--dry-run]";

/// `--payload` admite JSON en línea o la ruta de un archivo.
fn read_payload(arg: &str) -> Result<serde_json::Map<String, Value>, String> {
    let raw = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).map_err(|e| format!("no se pudo leer {arg}: {e}"))?
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("el payload debe ser un objeto JSON".into()),
        Err(e) => Err(format!("payload inválido: {e}")),
    }
}

fn main() {
    // CONFIG carga .env si existe (RX_PAGE_SIZE, RX_LOG...)
    logging::init(&CONFIG.logging);

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] != "upsert" {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    let mut fixture_path: Option<String> = None;
    let mut definition: Option<String> = None;
    let mut method: Option<String> = None;
    let mut record_id: Option<String> = None;
    let mut payload_arg: Option<String> = None;
    let mut changed: Option<String> = None;
    let mut dry_run = false;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--fixture" => { i += 1; fixture_path = args.get(i).cloned(); }
            "--definition" => { i += 1; definition = args.get(i).cloned(); }
            "--method" => { i += 1; method = args.get(i).cloned(); }
            "--id" => { i += 1; record_id = args.get(i).cloned(); }
            "--payload" => { i += 1; payload_arg = args.get(i).cloned(); }
            "--changed" => { i += 1; changed = args.get(i).cloned(); }
            "--dry-run" => dry_run = true,
            other => log::warn!("argumento ignorado: {other}"),
        }
        i += 1;
    }

    let (Some(fixture_path), Some(definition), Some(method), Some(payload_arg)) =
        (fixture_path, definition, method, payload_arg)
    else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let fixture = match Fixture::from_path(&fixture_path) {
        Ok(f) => f,
        Err(e) => { eprintln!("[rx-cli] {e}"); std::process::exit(3); }
    };
    let payload = match read_payload(&payload_arg) {
        Ok(p) => p,
        Err(e) => { eprintln!("[rx-cli] {e}"); std::process::exit(3); }
    };
    let method = match UpsertMethod::parse(&method, record_id) {
        Ok(m) => m,
        Err(e) => { eprintln!("[rx-cli] {e}"); std::process::exit(2); }
    };

    let stack = InMemoryStack::from_fixture(&fixture);
    let upserter = match stack.upserter(CONFIG.engine.clone()) {
        Ok(u) => u,
        Err(e) => { eprintln!("[rx-cli] {e}"); std::process::exit(5); }
    };
    let mut request = UpsertRequest::new(method, definition, payload);
    request.changed_field = changed;

    let scope = fixture.scope();
    let output = if dry_run {
        upserter.resolve(&scope, &request).and_then(|r| {
            serde_json::to_value(&r).map_err(|e| rx_core::UpsertError::InvalidPayload(e.to_string()))
        })
    } else {
        upserter.upsert(&scope, &request).map(Value::Object)
    };

    match output {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string()));
        }
        Err(e) => {
            eprintln!("[rx-cli] {} ({})", e, e.message_key());
            std::process::exit(4);
        }
    }
}
