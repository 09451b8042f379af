use crate::app::Workspace;
use anyhow::Result;
use std::path::Path;

pub async fn run(home: Option<&Path>, message: &str) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let study = workspace.study().await?;

    study.open_chat().await?;
    let reply = study.chat(message).await?;
    println!("{reply}");
    study.close_chat().await?;
    Ok(())
}
