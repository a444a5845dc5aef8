// Startup fetch of the three data files.
use anyhow::{Context, anyhow, bail};
use futures_util::future::try_join3;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, window};

use crate::config::GameConfig;
use crate::game::theme::Datasets;

fn js_err(v: JsValue) -> anyhow::Error {
    match v.as_string() {
        Some(s) => anyhow!(s),
        None => anyhow!("{:?}", v),
    }
}

async fn fetch_text(url: &str) -> anyhow::Result<String> {
    let win = window().context("no window")?;
    let resp: Response = JsFuture::from(win.fetch_with_str(url))
        .await
        .map_err(js_err)
        .with_context(|| format!("fetching {url}"))?
        .dyn_into()
        .map_err(js_err)?;
    if !resp.ok() {
        bail!("HTTP error! status: {} ({url})", resp.status());
    }
    let body = JsFuture::from(resp.text().map_err(js_err)?).await.map_err(js_err)?;
    body.as_string().with_context(|| format!("{url}: response body is not text"))
}

/// Fetches capitals, names and the image mapping concurrently and parses them.
/// Any single failure fails the whole load.
pub async fn load_datasets(cfg: &GameConfig) -> anyhow::Result<Datasets> {
    let (capitals, names, mapping) = try_join3(
        fetch_text(&cfg.capitals_url),
        fetch_text(&cfg.names_url),
        fetch_text(&cfg.mapping_url),
    )
    .await?;
    Datasets::from_sources(&capitals, &names, &mapping)
}
