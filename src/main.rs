use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use authorize_token::client::InMemoryClientGetter;
use authorize_token::config::{self, LogFormat};
use authorize_token::context::RequestContext;
use authorize_token::errors::AdmissionError;
use authorize_token::models::{AuthorizeToken, Object};
use authorize_token::registry::{self, AuthorizeTokenStrategy};
use authorize_token::selection::{FieldSelector, LabelSelector};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    let fmt_layer = match cfg.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cfg.log_filter))
        .with(fmt_layer)
        .init();

    let args = cli::Cli::parse();
    let clients_file = args.clients.or(cfg.clients_file);

    let result = match args.command {
        cli::Commands::Validate { token } => {
            let getter = load_clients(clients_file.as_deref())?;
            handle_validate(getter, &token).await
        }
        cli::Commands::ValidateUpdate { old, new } => {
            let getter = load_clients(clients_file.as_deref())?;
            handle_validate_update(getter, &old, &new).await
        }
        cli::Commands::Attrs { token } => handle_attrs(&token),
        cli::Commands::Match {
            tokens,
            selector,
            field_selector,
        } => handle_match(&tokens, &selector, &field_selector),
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn load_clients(path: Option<&Path>) -> anyhow::Result<InMemoryClientGetter> {
    match path {
        Some(path) => InMemoryClientGetter::from_file(path),
        None => {
            tracing::warn!("no clients file configured; every client lookup will fail");
            Ok(InMemoryClientGetter::new())
        }
    }
}

fn read_object<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&source).with_context(|| format!("parsing {}", path.display()))
}

/// Print field errors as JSON and turn the rejection into a failing result.
fn report(result: Result<(), AdmissionError>, token: &AuthorizeToken) -> anyhow::Result<()> {
    match result {
        Ok(()) => {
            tracing::info!(name = %token.metadata.name, client = %token.client_name, "token admitted");
            println!("{}", serde_json::to_string_pretty(token)?);
            Ok(())
        }
        Err(err) => {
            if let Some(errors) = err.field_errors() {
                println!("{}", serde_json::to_string_pretty(errors)?);
            }
            tracing::info!(name = %token.metadata.name, "token rejected");
            Err(err.into())
        }
    }
}

async fn handle_validate(getter: InMemoryClientGetter, path: &Path) -> anyhow::Result<()> {
    let strategy = AuthorizeTokenStrategy::new(Arc::new(getter));
    let ctx = RequestContext::new();
    let mut token: AuthorizeToken = read_object(path)?;

    let result = registry::before_create(&strategy, &ctx, &mut token).await;
    report(result, &token)
}

async fn handle_validate_update(getter: InMemoryClientGetter, old_path: &Path, new_path: &Path) -> anyhow::Result<()> {
    let strategy = AuthorizeTokenStrategy::new(Arc::new(getter));
    let ctx = RequestContext::new();
    let old: AuthorizeToken = read_object(old_path)?;
    let mut token: AuthorizeToken = read_object(new_path)?;

    let result = registry::before_update(&strategy, &ctx, &mut token, Some(&old as &dyn Object)).await;
    report(result, &token)
}

fn handle_attrs(path: &Path) -> anyhow::Result<()> {
    let token: AuthorizeToken = read_object(path)?;
    let (labels, fields) = registry::get_attrs(&token)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "labels": labels,
            "fields": fields,
        }))?
    );
    Ok(())
}

fn handle_match(paths: &[std::path::PathBuf], selector: &str, field_selector: &str) -> anyhow::Result<()> {
    let predicate = registry::matcher(LabelSelector::parse(selector)?, FieldSelector::parse(field_selector)?);
    tracing::debug!(label = %predicate.label, field = %predicate.field, "built selection predicate");

    let mut matched = 0usize;
    for path in paths {
        let token: AuthorizeToken = read_object(path)?;
        if predicate.matches(&token)? {
            matched += 1;
            println!("{}\t{}", path.display(), token.metadata.name);
        }
    }
    if matched == 0 {
        println!("No tokens matched.");
    }
    Ok(())
}
