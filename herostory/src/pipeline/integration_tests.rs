//! Scenario tests for whole pipeline runs.

#[cfg(test)]
mod tests {
    use crate::config::{ExecutionMode, StageDeadlines};
    use crate::core::{AssetRole, StageName, StageStatus};
    use crate::errors::{FailureKind, GenerationError};
    use crate::events::CollectingEventSink;
    use crate::pipeline::{run_pipeline, Pipeline};
    use crate::providers::Generators;
    use crate::testing::{
        assert_all_complete_except, assert_halted, assert_ledger_well_formed, assert_stage_failed,
        assert_stage_status, Script, ScriptedGenerator,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    const CHARACTER: &str = "Ren, a shy lantern keeper who talks to moths.";
    const WORLD: &str = "A valley where the fog remembers every footstep.";

    fn happy_generator() -> ScriptedGenerator {
        ScriptedGenerator::new()
            .on_text("short story", Script::reply("Ren lit the first lantern.\n\nThe fog listened."))
            .on_text("hero's name", Script::reply("Ren"))
            .on_text("illustration prompt", Script::reply("a lantern glowing in fog"))
            .on_text("instrumental soundtrack", Script::reply("soft flutes and low strings"))
            .on_text("real-life parallels", Script::reply("Like Ren, you notice small lights.\n\nStart a journal."))
    }

    fn pipeline_for(generator: &Arc<ScriptedGenerator>) -> Pipeline {
        Pipeline::builder(Generators::uniform(generator.clone())).build()
    }

    #[tokio::test]
    async fn test_happy_path_completes_every_stage() {
        let generator = Arc::new(happy_generator());
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert!(result.is_success());
        assert_ledger_well_formed(&result);
        assert_all_complete_except(&result, &[]);

        assert_eq!(result.hero_name.as_deref(), Some("Ren"));
        assert_eq!(
            result.story_markup.as_deref(),
            Some("<p>Ren lit the first lantern.</p>\n<p>The fog listened.</p>")
        );
        assert_eq!(result.images.len(), 2);
        assert!(result.audio.is_some());
        assert!(result.analogy.as_deref().unwrap().starts_with("Like Ren"));
        assert_eq!(result.request.character, CHARACTER);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_call() {
        let generator = Arc::new(happy_generator());
        let pipeline = pipeline_for(&generator);

        let err = run_pipeline(&pipeline, "   ", WORLD).await.unwrap_err();
        assert!(err.is_validation());

        let err = run_pipeline(&pipeline, CHARACTER, "").await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(generator.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_story_halts_run() {
        let generator = Arc::new(happy_generator().on_text("short story", Script::reply("   ")));

        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert_halted(&result);
        assert_ledger_well_formed(&result);
        assert_stage_failed(&result, StageName::Story, FailureKind::NoContent);
        assert!(result.images.is_empty());
        assert!(result.audio.is_none());
        assert_eq!(generator.text_calls(), 1);
        assert_eq!(generator.image_calls() + generator.music_calls(), 0);
    }

    #[tokio::test]
    async fn test_story_provider_failure_halts_run() {
        let generator = Arc::new(ScriptedGenerator::new().on_text(
            "short story",
            Script::fail(GenerationError::provider_status("gemini", 429, "quota")),
        ));

        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert_halted(&result);
        assert_stage_failed(&result, StageName::Story, FailureKind::Provider);
        assert!(result.fatal_error.as_deref().unwrap().contains("429"));
    }

    #[tokio::test]
    async fn test_each_single_optional_failure_is_isolated() {
        let cases = [
            (StageName::BackgroundImage, AssetRole::BackgroundImage),
            (StageName::HeroImage, AssetRole::HeroImage),
        ];

        for (stage, role) in cases {
            let generator = Arc::new(
                happy_generator().on_image(role, Script::fail(GenerationError::provider("gemini-image", "503"))),
            );
            let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

            assert!(result.is_success());
            assert_ledger_well_formed(&result);
            assert_stage_failed(&result, stage, FailureKind::Provider);
            assert_all_complete_except(&result, &[stage]);
            assert_eq!(result.images.len(), 1);
            assert_ne!(result.images[0].role, role);
        }
    }

    #[tokio::test]
    async fn test_music_failure_is_isolated() {
        let generator = Arc::new(
            happy_generator().on_music(Script::fail(GenerationError::provider_status("elevenlabs", 402, "payment"))),
        );
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert!(result.is_success());
        assert_stage_failed(&result, StageName::Music, FailureKind::Provider);
        assert_all_complete_except(&result, &[StageName::Music]);
        assert!(result.audio.is_none());
        assert_eq!(result.images.len(), 2);
    }

    #[tokio::test]
    async fn test_analogy_failure_is_isolated() {
        let generator = Arc::new(
            happy_generator().on_text("real-life parallels", Script::fail(GenerationError::work("model crashed"))),
        );
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert!(result.is_success());
        assert_stage_failed(&result, StageName::Analogy, FailureKind::Work);
        assert_all_complete_except(&result, &[StageName::Analogy]);
        assert!(result.analogy.is_none());
        assert!(result.analogy_markup.is_none());
    }

    #[tokio::test]
    async fn test_missing_image_payload_is_no_content() {
        let generator = Arc::new(happy_generator().on_image(AssetRole::HeroImage, Script::NoContent));
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert_stage_failed(&result, StageName::HeroImage, FailureKind::NoContent);
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].role, AssetRole::BackgroundImage);
    }

    #[tokio::test(start_paused = true)]
    async fn test_images_ordered_background_first_when_hero_finishes_first() {
        let generator = Arc::new(
            happy_generator()
                .on_image(AssetRole::BackgroundImage, Script::delayed(Duration::from_secs(20), Script::produce()))
                .on_image(AssetRole::HeroImage, Script::delayed(Duration::from_secs(1), Script::produce())),
        );
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        let roles: Vec<AssetRole> = result.images.iter().map(|a| a.role).collect();
        assert_eq!(roles, vec![AssetRole::BackgroundImage, AssetRole::HeroImage]);

        let background = result.stage(StageName::BackgroundImage).unwrap();
        let hero = result.stage(StageName::HeroImage).unwrap();
        assert!(hero.ended_at.unwrap() <= background.ended_at.unwrap());
    }

    #[tokio::test]
    async fn test_empty_name_reply_uses_fallback() {
        let generator = Arc::new(happy_generator().on_text("hero's name", Script::reply("")));
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert_eq!(result.hero_name.as_deref(), Some("the hero"));
        assert_stage_status(&result, StageName::HeroName, StageStatus::Complete);
        assert!(result.stage(StageName::HeroName).unwrap().error.is_none());

        let analogy_prompt = generator
            .text_prompts()
            .into_iter()
            .find(|p| p.contains("real-life parallels"))
            .unwrap();
        assert!(analogy_prompt.contains("story about the hero"));
    }

    #[tokio::test]
    async fn test_name_failure_still_allows_analogy() {
        let generator = Arc::new(
            happy_generator().on_text("hero's name", Script::fail(GenerationError::provider("gemini", "reset"))),
        );
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert_stage_failed(&result, StageName::HeroName, FailureKind::Provider);
        assert_stage_status(&result, StageName::Analogy, StageStatus::Complete);
        assert!(result.hero_name.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stage_times_out_alone_and_bounds_run() {
        let generator = Arc::new(
            happy_generator().on_music(Script::delayed(Duration::from_secs(3_600), Script::produce())),
        );
        let started = tokio::time::Instant::now();
        let result = run_pipeline(&pipeline_for(&generator), CHARACTER, WORLD).await.unwrap();

        assert!(result.is_success());
        assert_stage_failed(&result, StageName::Music, FailureKind::Timeout);
        assert_all_complete_except(&result, &[StageName::Music]);

        let music_deadline = StageDeadlines::default().music();
        assert!(started.elapsed() <= music_deadline + Duration::from_secs(1));
        assert!(result.duration_ms <= (music_deadline.as_secs_f64() + 1.0) * 1000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_story_times_out_and_halts() {
        let generator = Arc::new(ScriptedGenerator::new().on_text(
            "short story",
            Script::delayed(Duration::from_secs(600), Script::reply("too late")),
        ));
        let deadlines = StageDeadlines {
            story_secs: 5,
            ..StageDeadlines::default()
        };
        let pipeline = Pipeline::builder(Generators::uniform(generator.clone()))
            .with_deadlines(deadlines)
            .build();

        let result = run_pipeline(&pipeline, CHARACTER, WORLD).await.unwrap();

        assert_halted(&result);
        assert_stage_failed(&result, StageName::Story, FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_sequential_mode_matches_concurrent_outcome() {
        let generator = Arc::new(happy_generator().on_music(Script::NoContent));
        let pipeline = Pipeline::builder(Generators::uniform(generator.clone()))
            .with_mode(ExecutionMode::Sequential)
            .build();

        let result = run_pipeline(&pipeline, CHARACTER, WORLD).await.unwrap();

        assert_eq!(pipeline.mode(), ExecutionMode::Sequential);
        assert_ledger_well_formed(&result);
        assert_stage_failed(&result, StageName::Music, FailureKind::NoContent);
        assert_all_complete_except(&result, &[StageName::Music]);
        assert_eq!(result.images[0].role, AssetRole::BackgroundImage);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let generator = Arc::new(happy_generator().on_image(AssetRole::HeroImage, Script::NoContent));
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = Pipeline::builder(Generators::uniform(generator))
            .with_event_sink(sink.clone())
            .build();

        let result = run_pipeline(&pipeline, CHARACTER, WORLD).await.unwrap();
        assert_eq!(result.failed_stages(), vec![StageName::HeroImage]);

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some("pipeline.started"));
        assert_eq!(types.last().map(String::as_str), Some("pipeline.completed"));
        assert_eq!(sink.count("stage.started"), 6);
        assert_eq!(sink.count("stage.completed"), 5);
        assert_eq!(sink.stages("stage.failed"), vec![StageName::HeroImage]);
        let failed = sink
            .events()
            .into_iter()
            .find(|e| e.event_type == "stage.failed")
            .unwrap();
        assert_eq!(failed.data["criticality"], "optional");
    }

    #[tokio::test]
    async fn test_halt_emits_skips() {
        let generator = Arc::new(ScriptedGenerator::new().on_text("short story", Script::Empty));
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = Pipeline::builder(Generators::uniform(generator))
            .with_event_sink(sink.clone())
            .build();

        run_pipeline(&pipeline, CHARACTER, WORLD).await.unwrap();

        assert_eq!(sink.stages("stage.skipped"), StageName::ALL[1..].to_vec());
        let failed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| e.event_type == "stage.failed")
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].stage(), Some(StageName::Story));
        assert_eq!(failed[0].data["criticality"], "critical");
        assert_eq!(sink.count("pipeline.failed"), 1);
        assert_eq!(sink.count("pipeline.completed"), 0);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let generator = Arc::new(happy_generator());
        let pipeline = Arc::new(pipeline_for(&generator));

        let a = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { run_pipeline(&pipeline, CHARACTER, WORLD).await }
        });
        let b = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { run_pipeline(&pipeline, "Mira, a tide reader", "An inland sea").await }
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_ne!(a.run_id, b.run_id);
        assert_eq!(b.request.character, "Mira, a tide reader");
        assert_all_complete_except(&a, &[]);
        assert_all_complete_except(&b, &[]);
    }
}
