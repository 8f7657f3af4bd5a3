/// Translate or explain a piece of text with the active service, printing
/// the paced render to stdout.
///
/// Run: cargo run --example translate -- [--explain] [--service <id>] <text...>
/// Requires: the key for the chosen AI service in env (e.g. GEMINI_API_KEY),
/// or `--service google` for the keyless service.
use std::io::Write;
use std::sync::{Arc, Mutex};

use ai_translator::{
    DisplaySink, HttpTransport, MemoryPreferences, Mode, PanelSession, ProviderRegistry,
    RenderScheduler, TranslationService, TranslatorConfig,
};

/// Prints only what was committed since the previous render.
struct StdoutSink {
    printed: Mutex<String>,
}

impl DisplaySink for StdoutSink {
    fn render(&self, committed: &str) {
        let mut printed = self.printed.lock().unwrap();
        let mut out = std::io::stdout().lock();
        match committed.strip_prefix(printed.as_str()) {
            Some(suffix) => {
                let _ = write!(out, "{suffix}");
            }
            None => {
                let _ = write!(out, "\n{committed}");
            }
        }
        let _ = out.flush();
        *printed = committed.to_string();
    }

    fn is_visible(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut mode = Mode::Translate;
    let mut service_id = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--explain" => mode = Mode::Explain,
            "--service" => service_id = args.next(),
            _ => words.push(arg),
        }
    }
    let text = if words.is_empty() {
        "Ownership is Rust's most unique feature.".to_string()
    } else {
        words.join(" ")
    };

    let config = TranslatorConfig::from_env()?;
    let registry = ProviderRegistry::from_config(&config)?;
    let preferences = Arc::new(MemoryPreferences::from_env(&registry));
    let transport = Arc::new(HttpTransport::new(&config.timeout)?);
    let service = TranslationService::from_config(&config, transport, preferences)?;
    if let Some(id) = service_id {
        service.set_active_service(&id)?;
    }

    println!("Services:");
    for s in service.services() {
        let marker = if s.id == service.active_service().id { "*" } else { " " };
        println!(" {marker} {} ({})", s.display_name, s.id);
    }
    println!("\n[{}] {mode}: {text}\n", service.active_service().display_name);

    let sink = Arc::new(StdoutSink {
        printed: Mutex::new(String::new()),
    });
    let scheduler = Arc::new(RenderScheduler::new(sink, config.render.clone()));
    let session = PanelSession::new(Arc::new(service), scheduler.clone());

    let result = session.run(&text, mode).await;
    scheduler.settle().await;
    println!();
    result?;
    Ok(())
}
