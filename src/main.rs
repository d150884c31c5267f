//! `fn-invoke`: run one API Gateway event through an echo function.
//!
//! ```text
//! fn-invoke --config function.toml --event event.json
//! cat event.json | fn-invoke
//! ```
//!
//! The echo function reports what the pipeline saw: path metadata, request
//! id, case-preserved headers and query string, path parameters and the
//! decoded body. The rendered response is printed as JSON on stdout.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use uuid::Uuid;

use lambda_pipeline::config::{load_config, FunctionConfig};
use lambda_pipeline::observability::init_logging;
use lambda_pipeline::pipeline::{Function, NoBody, Reply, RequestShape};
use lambda_pipeline::{Context, FunctionError, Request, Response};

#[derive(Parser)]
#[command(name = "fn-invoke")]
#[command(about = "Invoke an echo function with an API Gateway proxy event", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event JSON file; read from stdin when omitted.
    #[arg(short, long)]
    event: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Echo {
    method: String,
    path: String,
    resource: String,
    request_id: String,
    headers: HashMap<String, String>,
    query_string: HashMap<String, Vec<String>>,
    path_parameters: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<serde_json::Value>,
}

impl Echo {
    fn from_context(ctx: &Context, body: Option<serde_json::Value>) -> Self {
        let path = ctx.path();
        Self {
            method: path.method.clone(),
            path: path.path.clone(),
            resource: path.resource.clone(),
            request_id: ctx.request_id().to_string(),
            headers: ctx.headers().map().clone(),
            query_string: ctx.query_string().map_multi().clone(),
            path_parameters: ctx.path_parameters().map().clone(),
            body,
        }
    }
}

fn echo_body(ctx: &Context, body: Option<&serde_json::Value>) -> Result<Reply<Echo>, FunctionError> {
    Ok(Reply::Json(Echo::from_context(ctx, body.cloned())))
}

fn echo_empty(ctx: &Context, _: Option<&NoBody>) -> Result<Reply<Echo>, FunctionError> {
    Ok(Reply::Json(Echo::from_context(ctx, None)))
}

fn read_event(path: Option<&PathBuf>) -> Result<Request, Box<dyn std::error::Error>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };

    let mut request: Request = serde_json::from_str(&raw)?;
    if request.request_context.request_id.is_empty() {
        request.request_context.request_id = Uuid::new_v4().to_string();
    }
    Ok(request)
}

fn invoke(config: &FunctionConfig, request: Request) -> Response {
    if request.body.is_empty() && !request.is_base64_encoded {
        Function::new(RequestShape::none(), echo_empty)
            .configure(config)
            .invoke(request)
    } else {
        Function::new(RequestShape::<serde_json::Value>::of(), echo_body)
            .configure(config)
            .invoke(request)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = FunctionConfig::default();
            config.apply_env();
            config
        }
    };
    init_logging(&config.logging);

    tracing::info!(
        debug = config.debug,
        body_strategy = ?config.body_strategy,
        "fn-invoke v0.1.0 starting"
    );

    let request = read_event(cli.event.as_ref())?;
    let response = invoke(&config, request);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
