use crate::app::Workspace;
use anyhow::Result;
use std::path::Path;

pub async fn run(home: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let service = workspace.generation_service()?;
    println!("{}", service.resolve_model().await);
    Ok(())
}
