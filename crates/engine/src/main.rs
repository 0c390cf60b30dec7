//! Storyloom command line entry point.
//!
//! ```text
//! storyloom new <title>
//! storyloom page <story_id> [<parent_page_id> <choice>]
//! ```

use anyhow::{bail, Context};
use storyloom_domain::{PageId, StoryId};
use storyloom_engine::infrastructure::settings::EngineSettings;
use storyloom_engine::telemetry::init_tracing;
use storyloom_engine::use_cases::story::GeneratePageInput;
use storyloom_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = EngineSettings::from_env();
    init_tracing("storyloom_engine=info");

    tracing::info!(
        endpoint = %settings.endpoint,
        stories_dir = %settings.stories_dir.display(),
        max_retries = settings.retry.max_retries,
        base_delay_ms = settings.retry.base_delay_ms,
        "Starting Storyloom"
    );

    let app = App::from_settings(&settings);
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["new", title @ ..] if !title.is_empty() => {
            let story = app.use_cases.create_story.execute(&title.join(" ")).await?;
            println!("{}", story.id());
        }
        ["page", story_id, rest @ ..] => {
            let story_id: StoryId = story_id.parse().context("invalid story id")?;
            let (parent_page_id, choice_taken) = match rest {
                [] => (None, None),
                [parent, choice @ ..] if !choice.is_empty() => {
                    let parent: PageId = parent.parse().context("invalid parent page id")?;
                    (Some(parent), Some(choice.join(" ")))
                }
                _ => bail!("a parent page id must be followed by the choice taken"),
            };

            let generated = app
                .use_cases
                .generate_page
                .execute(GeneratePageInput {
                    story_id,
                    parent_page_id,
                    choice_taken,
                })
                .await?;

            println!("page {}\n", generated.page.id);
            println!("{}\n", generated.page.narrative);
            for (i, choice) in generated.page.choices.iter().enumerate() {
                println!("  {}. {}", i + 1, choice);
            }
            for warning in &generated.warnings {
                eprintln!("warning [{}] {}: {}", warning.code, warning.field, warning.message);
            }
        }
        _ => bail!("usage: storyloom new <title> | storyloom page <story_id> [<parent_page_id> <choice>]"),
    }

    Ok(())
}
