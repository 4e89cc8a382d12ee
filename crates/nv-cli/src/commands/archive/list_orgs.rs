use anyhow::Context;
use nv_api::{Fetcher, HttpTransport};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct OrgRow {
    id: String,
    name: String,
}

pub async fn handle(fetcher: &Fetcher<HttpTransport>, flags: &GlobalFlags) -> anyhow::Result<()> {
    let spinner = Progress::spinner("listing organizations");
    let orgs = fetcher.list_organizations().await;
    spinner.finish_clear();
    let orgs = orgs.context("failed to list organizations")?;

    let rows: Vec<OrgRow> = orgs
        .into_iter()
        .map(|org| OrgRow {
            id: org.id,
            name: org.name,
        })
        .collect();
    output(&rows, flags.format)
}
