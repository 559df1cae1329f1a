//! `widgets` — command-line host for the engagement widgets.
//!
//! Usage:
//!   widgets status                 latest changelog version, unread flag, prompt content
//!   widgets ack                    acknowledge the latest changelog version
//!   widgets stats <target> [kind]  interaction count + local flag
//!   widgets like <target> [kind]   toggle the interaction (submits only when turning on)
//!   widgets rate <component> <n>   submit a star rating
//!
//! Config comes from `config/widgets.toml` (see `WidgetConfig::load_default`).
//! Set `WIDGETS_STORE_PATH` to remember state between runs.

use anyhow::{bail, Context, Result};
use engagement_widgets::{InteractionTarget, StarRating, WidgetConfig, WidgetContext};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs to stderr, filtered by `WIDGETS_LOG` (falls back to `RUST_LOG`, then `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("WIDGETS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn target_from(args: &[String]) -> Result<InteractionTarget> {
    let Some(id) = args.first() else {
        bail!("missing <target>");
    };
    let kind = args.get(1).map(String::as_str).unwrap_or("like");
    Ok(InteractionTarget::new(id.as_str(), kind))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WidgetConfig::load_default().context("loading widget config")?;
    let ctx = WidgetContext::from_config(cfg)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((cmd, rest)) = args.split_first() else {
        bail!("usage: widgets <status|ack|stats|like|rate> [args]");
    };

    let out = match cmd.as_str() {
        "status" => {
            let mut feed = ctx.feed(ctx.config.feed.prompt_limit);
            let mut prompt = ctx.update_prompt();
            let snapshot = feed.refresh().await.clone();
            let shown = prompt.evaluate(&snapshot).cloned();
            json!({
                "kind": feed.kind(),
                "loading": snapshot.loading,
                "latest_version": snapshot.latest_version(),
                "has_unread": prompt.status().has_unread,
                "prompt": shown,
                "error": feed.last_error(),
            })
        }
        "ack" => {
            let mut bell = ctx.bell();
            bell.refresh().await;
            let status = bell.set_open(true);
            json!({
                "latest_version": bell.feed().latest_version(),
                "has_unread": status.has_unread,
            })
        }
        "stats" => {
            let toggle = ctx.toggle(target_from(rest)?);
            let view = toggle.load().await;
            json!({ "count": view.count, "active": view.active, "loading": view.loading })
        }
        "like" => {
            let toggle = ctx.toggle(target_from(rest)?);
            toggle.load().await;
            let outcome = toggle.toggle().await;
            let view = toggle.view();
            json!({
                "count": view.count,
                "active": view.active,
                "submission": format!("{:?}", outcome.submission),
            })
        }
        "rate" => {
            let (Some(component), Some(n)) = (rest.first(), rest.get(1)) else {
                bail!("usage: widgets rate <component> <n>");
            };
            let n: u8 = n.parse().context("rating must be a number")?;
            let mut stars = StarRating::new(Some(component.clone()));
            match stars.select(n, &ctx.api).await {
                Some(ok) => json!({ "rating": n, "ok": ok }),
                None => bail!("rating must be between 1 and {}", stars.max()),
            }
        }
        other => bail!("unknown command: {other}"),
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
