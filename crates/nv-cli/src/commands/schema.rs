use nv_core::{Catalog, ScanRecord};

use crate::cli::root_commands::{SchemaArgs, SchemaKind};

/// Handle `nvault schema`. Always prints JSON.
pub fn handle(args: &SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.kind {
        SchemaKind::Catalog => schemars::schema_for!(Catalog),
        SchemaKind::ScanRecord => schemars::schema_for!(ScanRecord),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
