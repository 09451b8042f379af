use crate::app::Workspace;
use anyhow::Result;
use std::path::Path;
use studybox_core::state::StateRepository;

pub async fn run(home: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(home)?;
    workspace.state.clear().await?;
    println!("Session cleared.");
    Ok(())
}
