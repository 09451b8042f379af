use crate::app::Workspace;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use studybox_application::SourceInput;
use studybox_core::bundle::StudyBundle;
use studybox_core::request::Difficulty;
use studybox_infrastructure::document_extractor::mime_for_path;

pub struct GenerateArgs {
    pub topic: String,
    pub file: Option<PathBuf>,
    pub video: Option<String>,
    pub language: Option<String>,
    pub difficulty: Option<Difficulty>,
}

pub async fn run(home: Option<&Path>, args: GenerateArgs) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let study = workspace.study().await?;

    if args.language.is_some() || args.difficulty.is_some() {
        let mut settings = study.settings().await;
        if let Some(language) = args.language {
            settings.language = language;
        }
        if let Some(difficulty) = args.difficulty {
            settings.difficulty = difficulty;
        }
        study.update_settings(settings).await?;
    }

    let input = match (args.file, args.video) {
        (Some(path), _) => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SourceInput::File {
                mime_type: mime_for_path(&path),
                data,
            }
        }
        (None, Some(url)) => SourceInput::Video { url },
        (None, None) => SourceInput::Topic,
    };

    println!("Generating study material...");
    let bundle = study.generate(&args.topic, input).await?;
    print_bundle(&bundle);
    Ok(())
}

pub async fn expand(home: Option<&Path>, label: &str) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let study = workspace.study().await?;

    let new_edges = study.expand(label).await?;
    println!("Added {} concept(s) under \"{label}\":", new_edges.len());
    for edge in &new_edges {
        println!("  {} -> {}", edge.source, edge.target);
    }
    Ok(())
}

fn print_bundle(bundle: &StudyBundle) {
    println!("\n# {}\n", bundle.title);
    println!("{}\n", bundle.summary);

    println!("## Key points");
    for point in &bundle.key_points {
        println!("- {point}");
    }

    println!("\n## Quiz");
    for (index, item) in bundle.quiz.iter().enumerate() {
        println!("{}. {}", index + 1, item.question);
        for option in &item.options {
            let marker = if *option == item.correct_option { "*" } else { " " };
            println!("   [{marker}] {option}");
        }
    }

    println!("\n## Flashcards");
    for card in &bundle.flashcards {
        println!("- {} :: {}", card.front, card.back);
    }

    println!("\n## Mind map");
    for edge in &bundle.mind_map_edges {
        println!("  {} -> {}", edge.source, edge.target);
    }

    println!(
        "\nAccuracy {} | Time saved {}",
        bundle.stats.accuracy, bundle.stats.time_saved
    );
}
