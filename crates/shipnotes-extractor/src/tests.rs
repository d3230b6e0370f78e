//! Integration tests for the extraction pipeline

#[cfg(test)]
mod tests {
    use crate::observe::{GenerationEnd, GenerationLevel, GenerationStart, TraceStart};
    use crate::{
        ExtractionEngine, ExtractorConfig, ExtractorError, GenerationObserver,
        InMemoryPromptRegistry, ProcessedSetTracker, PromptResolver, RegistryPrompt,
    };
    use shipnotes_domain::{Message, Release};
    use shipnotes_llm::{LlmError, MockProvider};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Trace(TraceStart),
        Start(GenerationStart),
        End(GenerationEnd),
        Flush,
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl GenerationObserver for RecordingObserver {
        fn trace_start(&self, event: &TraceStart) {
            self.events.lock().unwrap().push(Event::Trace(event.clone()));
        }

        fn generation_start(&self, event: &GenerationStart) {
            self.events.lock().unwrap().push(Event::Start(event.clone()));
        }

        fn generation_end(&self, event: &GenerationEnd) {
            self.events.lock().unwrap().push(Event::End(event.clone()));
        }

        fn flush(&self) {
            self.events.lock().unwrap().push(Event::Flush);
        }
    }

    fn builtin_engine(llm: MockProvider) -> ExtractionEngine<MockProvider> {
        ExtractionEngine::new(llm, PromptResolver::builtin(), ExtractorConfig::default())
    }

    fn registry_engine(llm: MockProvider) -> ExtractionEngine<MockProvider> {
        ExtractionEngine::new(llm, registry_resolver(), ExtractorConfig::default())
    }

    fn batch() -> Vec<Message> {
        vec![
            Message::new("m1", "Shipped v2.1.0", "1705312800", "U1"),
            Message::new("m2", "Lunch is at noon", "1705399200", "U2"),
            Message::new("m3", "Dark mode is live", "1705485600", "U1"),
        ]
    }

    fn release_json(title: &str, source: &str) -> String {
        format!(
            r#"[{{"date":"2024-01-15","title":"{}","description":"d","sourceMessageId":"{}"}}]"#,
            title, source
        )
    }

    fn registry_resolver() -> PromptResolver {
        let registry = InMemoryPromptRegistry::new().with_prompt(
            "release-extraction",
            RegistryPrompt::new("REGISTRY INSTRUCTIONS")
                .with_config("model", "registry-model")
                .with_config("max_tokens", 777)
                .with_config("temperature", 0.1)
                .with_config("top_p", 0.5)
                .with_config("http_referer", "https://ops.example")
                .with_config("title", "Release Bot"),
        );
        PromptResolver::required(registry)
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let llm = MockProvider::default();
        llm.push_response(release_json("v2.1.0", "m1"));
        llm.push_response("[]");
        llm.push_response(format!("```json\n{}\n```", release_json("Dark mode", "m3")));

        let engine = registry_engine(llm.clone());
        let releases = engine.extract(&batch()).await.unwrap();

        assert_eq!(
            releases,
            vec![
                Release::new("2024-01-15", "v2.1.0", "d", "m1"),
                Release::new("2024-01-15", "Dark mode", "d", "m3"),
            ]
        );
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_one_request_per_message_in_order() {
        let llm = MockProvider::default();
        let engine = registry_engine(llm.clone());

        engine.extract(&batch()).await.unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        for (request, id) in requests.iter().zip(["m1", "m2", "m3"]) {
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.messages[0].role, "user");
            let content = &request.messages[0].content;
            assert!(content.starts_with("REGISTRY INSTRUCTIONS"));
            assert!(content.contains(&format!("[{} |", id)));
        }
    }

    #[tokio::test]
    async fn test_registry_parameters_reach_request() {
        let llm = MockProvider::default();
        let engine = registry_engine(llm.clone());

        engine.extract(&batch()[..1]).await.unwrap();

        let request = &llm.requests()[0];
        assert_eq!(request.model, "registry-model");
        assert_eq!(request.max_tokens, 777);
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.top_p, Some(0.5));
        assert_eq!(request.headers.http_referer.as_deref(), Some("https://ops.example"));
        assert_eq!(request.headers.title.as_deref(), Some("Release Bot"));
    }

    #[tokio::test]
    async fn test_missing_required_prompt_aborts_before_network() {
        let llm = MockProvider::default();
        let engine = ExtractionEngine::new(
            llm.clone(),
            PromptResolver::required(InMemoryPromptRegistry::new()),
            ExtractorConfig::default(),
        );

        let result = engine.extract(&batch()).await;
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_http_500_mid_batch_aborts_and_marks_nothing() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("processed.json");

        let mut tracker = ProcessedSetTracker::new(&state_path);
        tracker.load().unwrap();

        let llm = MockProvider::default();
        llm.push_response(release_json("v2.1.0", "m1"));
        llm.push_error(LlmError::Http {
            status: 500,
            body: "internal error".to_string(),
        });
        let engine = builtin_engine(llm.clone());

        let pending = tracker.filter_unprocessed(&batch());
        let result = engine.extract(&pending).await;

        // Caller only marks after success
        if result.is_ok() {
            tracker.mark_processed(pending.iter().map(|m| m.id.clone())).unwrap();
        }

        match result {
            Err(ExtractorError::Transport { status, body }) => {
                assert_eq!(status, Some(500));
                assert_eq!(body, "internal error");
            }
            other => panic!("expected Transport error, got {:?}", other),
        }
        assert_eq!(llm.call_count(), 2, "third message must not be requested");

        let mut reloaded = ProcessedSetTracker::new(&state_path);
        reloaded.load().unwrap();
        assert!(reloaded.state().is_empty());
        assert_eq!(reloaded.filter_unprocessed(&batch()).len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_after_success_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("processed.json");
        let llm = MockProvider::new(release_json("v", "m1"));
        let engine = builtin_engine(llm.clone());

        for _ in 0..2 {
            let mut tracker = ProcessedSetTracker::new(&state_path);
            tracker.load().unwrap();
            let pending = tracker.filter_unprocessed(&batch());
            engine.extract(&pending).await.unwrap();
            tracker.mark_processed(pending.iter().map(|m| m.id.clone())).unwrap();
        }

        // Second run saw nothing pending
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_format_error_aborts_batch() {
        let llm = MockProvider::default();
        llm.push_response("# Summary\n\nv2.1.0 shipped.");
        let engine = builtin_engine(llm.clone());

        let result = engine.extract(&batch()).await;
        assert!(matches!(result, Err(ExtractorError::Format(_))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_markdown_with_bracket_citation_leaves_batch_unprocessed() {
        let dir = TempDir::new().unwrap();
        let mut tracker = ProcessedSetTracker::new(dir.path().join("processed.json"));
        tracker.load().unwrap();

        let llm = MockProvider::default();
        llm.push_response("# Summary\n\nThe team shipped v2 [1].\n\n[1] release notes");
        let engine = builtin_engine(llm.clone());

        let pending = tracker.filter_unprocessed(&batch());
        let result = engine.extract(&pending).await;

        assert!(matches!(result, Err(ExtractorError::Format(_))));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(tracker.filter_unprocessed(&batch()).len(), 3);
    }

    #[tokio::test]
    async fn test_parse_error_aborts_batch() {
        let llm = MockProvider::default();
        llm.push_response("[]");
        llm.push_response("not json at all");
        let engine = builtin_engine(llm.clone());

        let result = engine.extract(&batch()).await;
        assert!(matches!(result, Err(ExtractorError::Parse(_))));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_truncated_response_is_recovered() {
        let llm = MockProvider::default();
        llm.push_response(
            r#"[{"date":"2024-01-15","title":"t","description":"d","sourceMessageId":"m1"}"#,
        );
        let engine = builtin_engine(llm);

        let releases = engine.extract(&batch()[..1]).await.unwrap();
        assert_eq!(releases, vec![Release::new("2024-01-15", "t", "d", "m1")]);
    }

    #[tokio::test]
    async fn test_progress_reports_each_message() {
        let llm = MockProvider::default();
        llm.push_response(release_json("a", "m1"));
        llm.push_response("[]");
        llm.push_response(release_json("c", "m3"));
        let engine = builtin_engine(llm);

        let mut seen = Vec::new();
        engine
            .extract_with_progress(&batch(), |progress| {
                seen.push((
                    progress.message.id.clone(),
                    progress.index,
                    progress.total,
                    progress.releases.len(),
                    progress.is_last(),
                ));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("m1".to_string(), 0, 3, 1, false),
                ("m2".to_string(), 1, 3, 1, false),
                ("m3".to_string(), 2, 3, 2, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_progress_failure_aborts_batch() {
        let llm = MockProvider::default();
        let engine = builtin_engine(llm.clone());

        let result = engine
            .extract_with_progress(&batch(), |progress| {
                if progress.index == 0 {
                    anyhow::bail!("disk full");
                }
                Ok(())
            })
            .await;

        match result {
            Err(ExtractorError::Progress(msg)) => assert!(msg.contains("disk full")),
            other => panic!("expected Progress error, got {:?}", other),
        }
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_observer_sees_trace_and_generations() {
        let llm = MockProvider::default();
        llm.push_response(release_json("v2", "m1"));
        let observer = RecordingObserver::default();
        let engine = registry_engine(llm).with_observer(observer.clone());

        engine.extract(&batch()[..1]).await.unwrap();

        let events = observer.events();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            Event::Trace(TraceStart {
                message_count: 1,
                model: "registry-model".to_string()
            })
        );
        match &events[1] {
            Event::Start(start) => {
                assert_eq!(start.message_id, "m1");
                assert_eq!(start.model, "registry-model");
                assert_eq!(start.model_parameters["max_tokens"], 777);
                assert_eq!(start.model_parameters["temperature"], 0.1);
                assert!(start.input.contains("Shipped v2.1.0"));
            }
            other => panic!("expected generation start, got {:?}", other),
        }
        match &events[2] {
            Event::End(GenerationEnd::Success { message_id, usage, .. }) => {
                assert_eq!(message_id, "m1");
                assert!(usage.is_some());
            }
            other => panic!("expected successful generation end, got {:?}", other),
        }
        assert_eq!(events[3], Event::Flush);
    }

    #[tokio::test]
    async fn test_observer_sees_error_and_warning_levels() {
        let llm = MockProvider::default();
        llm.push_error(LlmError::Http {
            status: 502,
            body: "bad gateway".to_string(),
        });
        let observer = RecordingObserver::default();
        let engine = builtin_engine(llm).with_observer(observer.clone());
        assert!(engine.extract(&batch()).await.is_err());

        let level_of = |events: &[Event]| {
            events.iter().find_map(|e| match e {
                Event::End(GenerationEnd::Failure { level, .. }) => Some(*level),
                _ => None,
            })
        };
        assert_eq!(level_of(&observer.events()), Some(GenerationLevel::Error));
        assert_eq!(observer.events().last(), Some(&Event::Flush));

        let llm = MockProvider::new("not json at all");
        let observer = RecordingObserver::default();
        let engine = builtin_engine(llm).with_observer(observer.clone());
        assert!(engine.extract(&batch()).await.is_err());
        assert_eq!(level_of(&observer.events()), Some(GenerationLevel::Warning));
    }

    #[tokio::test]
    async fn test_observer_does_not_change_outcome() {
        let response = release_json("v2", "m1");

        let plain = ExtractionEngine::new(
            MockProvider::new(response.clone()),
            PromptResolver::builtin(),
            ExtractorConfig::default(),
        );
        let observed = ExtractionEngine::new(
            MockProvider::new(response),
            PromptResolver::builtin(),
            ExtractorConfig::default(),
        )
        .with_observer(RecordingObserver::default());

        assert_eq!(
            plain.extract(&batch()).await.unwrap(),
            observed.extract(&batch()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_thread_replies_are_sent_with_parent() {
        let llm = MockProvider::default();
        let engine = builtin_engine(llm.clone());

        let reply =
            Message::new("r1", "notes attached", "1705312900", "U2").with_author_name("Ada");
        let message = Message::new("m1", "Release thread", "1705312800", "U1").with_reply(reply);
        engine.extract(&[message]).await.unwrap();

        let content = &llm.requests()[0].messages[0].content;
        let parent = content.find("[m1 | 2024-01-15] Release thread").unwrap();
        let reply = content.find("[r1 | 2024-01-15] Ada: notes attached").unwrap();
        assert!(parent < reply);
    }
}
