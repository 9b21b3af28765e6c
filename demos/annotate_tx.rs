//! Annotates one transaction and prints the resulting tree
//!
//! ```text
//! TRACE_ANNOTATOR_RPC_URL=https://eth.llamarpc.com \
//! TRACE_ANNOTATOR_ETHERSCAN_API_KEY=... \
//!     cargo run --example annotate_tx -- 0x<tx hash> [config.toml]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trace_annotator::{
    types::{AnnotatedNode, NodeData},
    AnnotatorConfig,
};

fn render(node: &AnnotatedNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let notes = &node.annotations;
    let line = match &node.data {
        NodeData::Call(call) => {
            let target = notes
                .pretty_address_label
                .clone()
                .or_else(|| call.to.map(|to| to.to_checksum(None)))
                .unwrap_or_else(|| "?".into());
            let body = notes.pretty_name.clone().unwrap_or_else(|| {
                call.input
                    .as_ref()
                    .map(|input| input.to_string())
                    .unwrap_or_default()
            });
            let mut line = format!("{:?} {target}.{body}", call.kind);
            if let Some(value) = &notes.pretty_value {
                line.push_str(&format!(" value={value}"));
            }
            if let Some(result) = &notes.pretty_result {
                line.push_str(&format!(" -> {result}"));
            }
            match (&notes.pretty_error, &call.error) {
                (Some(reason), _) => line.push_str(&format!(" reverted: {reason}")),
                (None, Some(payload)) => line.push_str(&format!(" reverted: {payload}")),
                (None, None) => {}
            }
            line
        }
        NodeData::Storage(access) => {
            format!("{:?} {} {} -> {}", access.kind, access.slot, access.before, access.after)
        }
        NodeData::Log(log) => match &notes.pretty_name {
            Some(name) => format!("emit {name}"),
            None => format!("log topics={:?} data={}", log.topics, log.data),
        },
    };
    out.push_str(&format!("{indent}{line}\n"));
    for child in &node.children {
        render(child, depth + 1, out);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(tx_hash) = args.next() else {
        bail!("usage: annotate_tx <tx hash> [config.toml]");
    };
    let config_path = args.next().map(PathBuf::from);

    let config = AnnotatorConfig::load(config_path.as_deref())?;
    let annotator = config.builder().await?.build()?;

    let trace = annotator.load(&tx_hash).await?;
    let mut out = String::new();
    render(&trace.annotated, 0, &mut out);
    println!("First pass:\n{out}");

    let updates = annotator.subscribe();
    if let Some(report) = annotator.resolve(&trace).await {
        info!(?report, "Resolution finished");
    }

    let latest = updates.borrow().clone();
    if let Some(latest) = latest {
        let mut out = String::new();
        render(&latest.annotated, 0, &mut out);
        println!("Revision {}:\n{out}", latest.revision);
    }
    Ok(())
}
