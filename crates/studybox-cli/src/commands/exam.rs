use crate::app::Workspace;
use anyhow::{Context, Result};
use std::path::Path;
use studybox_application::StudyUseCase;
use studybox_core::exam::{ExamQuestion, Grading, QuestionKind};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

pub async fn run(home: Option<&Path>, retake: bool) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let study = workspace.study().await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("Preparing the exam...");
    let questions = study.start_exam().await?;
    take(&study, &questions, &mut input).await?;

    if retake {
        println!("\nSecond attempt, same questions.");
        study.retake().await?;
        take(&study, &questions, &mut input).await?;
    }
    Ok(())
}

async fn take(study: &StudyUseCase, questions: &[ExamQuestion], input: &mut Input) -> Result<()> {
    for question in questions {
        println!("\nQ{}. {}", question.id, question.question);
        let options = question.options.as_deref().unwrap_or_default();
        if question.kind == QuestionKind::Mcq {
            for (index, option) in options.iter().enumerate() {
                println!("  {}) {option}", index + 1);
            }
        }

        let line = input
            .next_line()
            .await
            .context("Failed to read an answer")?
            .unwrap_or_default();
        study.answer(question.id, pick_option(&line, options)).await?;
    }

    println!("\nGrading...");
    let grading = study.grade().await?;
    print_grading(&grading);
    Ok(())
}

/// A bare option number selects that option; anything else is the answer text.
fn pick_option(line: &str, options: &[String]) -> String {
    let line = line.trim();
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .cloned()
        .unwrap_or_else(|| line.to_string())
}

fn print_grading(grading: &Grading) {
    println!("Score: {}/100", grading.score);
    println!("{}", grading.feedback);
    for correction in &grading.corrections {
        let mark = if correction.is_correct { "ok" } else { "x " };
        println!("  [{mark}] Q{}: {}", correction.question_id, correction.remark);
    }
}
