use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studybox_core::request::Difficulty;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "studybox")]
#[command(about = "studybox - turn study material into summaries, quizzes, flashcards and mind maps", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep config, secrets and state under this directory
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a study bundle from a topic, a file or a video
    Generate {
        #[arg(short, long, default_value = "")]
        topic: String,
        /// Document or image to study from
        #[arg(short, long, conflicts_with = "video")]
        file: Option<PathBuf>,
        /// Video link whose captions are the material
        #[arg(long)]
        video: Option<String>,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Add sub-concepts under a mind-map node
    Expand { label: String },
    /// Take an exam on the current bundle
    Exam {
        /// Offer a second attempt with the same questions after grading
        #[arg(long)]
        retake: bool,
    },
    /// Ask a question about the current bundle
    Chat { message: String },
    /// Print the laid-out mind map
    Graph,
    /// Forget the current bundle and settings
    Reset,
    /// Show the model generation requests will use
    Models,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "studybox=debug,studybox_core=debug,studybox_interaction=debug,studybox_infrastructure=debug,studybox_application=debug"
    } else {
        "studybox=info,studybox_interaction=info,studybox_application=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let home = cli.home.as_deref();
    match cli.command {
        Commands::Generate {
            topic,
            file,
            video,
            language,
            difficulty,
        } => {
            commands::generate::run(
                home,
                commands::generate::GenerateArgs {
                    topic,
                    file,
                    video,
                    language,
                    difficulty,
                },
            )
            .await?
        }
        Commands::Expand { label } => commands::generate::expand(home, &label).await?,
        Commands::Exam { retake } => commands::exam::run(home, retake).await?,
        Commands::Chat { message } => commands::chat::run(home, &message).await?,
        Commands::Graph => commands::graph::run(home).await?,
        Commands::Reset => commands::reset::run(home).await?,
        Commands::Models => commands::models::run(home).await?,
    }

    Ok(())
}
