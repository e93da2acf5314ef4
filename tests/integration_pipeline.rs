//! End-to-end tests of the query pipeline with injected backends

mod common;

use common::{build_assistant, test_config, FailingRetriever, RecordingGenerator, StaticRetriever};
use std::time::Duration;
use tempfile::tempdir;
use vialy::{Category, Intent, VialyError};

const MULTA_QUERY: &str = "¿Cuánto es la multa por exceso de velocidad?";

#[tokio::test]
async fn test_multa_scenario_classification_and_prompt() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) =
        RecordingGenerator::answering("Según el Artículo 131-C.29, la multa es tipo C.");
    let assistant = build_assistant(
        &config,
        vec![Box::new(StaticRetriever {
            passages: vec![("Artículo 131. Las multas se clasifican...", "codigo.pdf", Some(42))],
        })],
        Box::new(generator),
    );

    let response = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();

    assert_eq!(response.category, Category::Multa);
    assert_eq!(response.intent, Intent::Info);
    assert!(response.context_used);
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].file, "codigo.pdf");

    // the composed prompt carries the literal query, the fine-tier table,
    // and the retrieved context
    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(MULTA_QUERY));
    assert!(prompts[0].contains("Tipo C = 15 SMLDV = $711,750 COP"));
    assert!(prompts[0].contains("Artículo 131. Las multas se clasifican..."));
}

#[tokio::test]
async fn test_retrieval_failure_degrades_to_placeholder() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![Box::new(FailingRetriever)], Box::new(generator));

    let response = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();

    assert!(!response.context_used);
    assert!(response.sources.is_empty());
    let prompts = prompts.lock().unwrap();
    assert!(prompts[0].contains("No hay documentos específicos para esta consulta."));
}

#[tokio::test]
async fn test_retrieval_fallback_chain_serves_from_legacy() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, _prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(
        &config,
        vec![
            Box::new(FailingRetriever),
            Box::new(StaticRetriever {
                passages: vec![("pasaje de respaldo", "codigo.pdf", None)],
            }),
        ],
        Box::new(generator),
    );

    let response = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    assert!(response.context_used);
    assert_eq!(response.sources[0].file, "codigo.pdf");
}

#[tokio::test]
async fn test_repeat_query_hits_cache_but_still_appends_turns() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("respuesta cacheada");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let first = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    let second = assistant
        .ask(MULTA_QUERY, "user-1", Some(&first.session_id))
        .await
        .unwrap();

    // one generation call total: the second answer came from the cache
    assert_eq!(prompts.lock().unwrap().len(), 1);
    assert_eq!(second.answer, "respuesta cacheada");
    assert_eq!(second.category, first.category);

    // but both calls bound the turn to the session
    let info = assistant.session_info(&first.session_id).unwrap().unwrap();
    assert_eq!(info.message_count, 4);
}

#[tokio::test]
async fn test_cache_is_shared_across_sessions() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("compartida");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let first = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    let second = assistant.ask(MULTA_QUERY, "user-2", None).await.unwrap();

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(prompts.lock().unwrap().len(), 1);

    // each session still got its own turn pair
    assert_eq!(
        assistant
            .session_info(&second.session_id)
            .unwrap()
            .unwrap()
            .message_count,
        2
    );
}

#[tokio::test]
async fn test_normalized_query_variants_share_cache_entry() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    assistant
        .ask(&format!("  {}  ", MULTA_QUERY.to_uppercase()), "user-1", None)
        .await
        .unwrap();

    assert_eq!(prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generation_failure_no_cache_no_history() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let prompts = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let generator = RecordingGenerator {
        prompts: std::sync::Arc::clone(&prompts),
        answer: String::new(),
        fail: true,
        delay: None,
    };
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let err = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap_err();
    let err = err.downcast::<VialyError>().unwrap();
    assert!(matches!(err, VialyError::ServiceUnavailable(_)));

    // session creation happened before generation and is kept
    assert_eq!(assistant.active_sessions().unwrap(), 1);

    // generation failed: nothing cached
    assert_eq!(assistant.status().unwrap().cache_entries, 0);

    // and a retry does call the backend again (no stale cache entry)
    let err = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap_err();
    assert!(err.downcast::<VialyError>().is_ok());
    assert_eq!(prompts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_generation_timeout_surfaces_degraded() {
    let dir = tempdir().unwrap();
    let mut config = test_config(&dir);
    config.pipeline.generation_timeout_seconds = 1;

    let (mut generator, _prompts) = RecordingGenerator::answering("tarde");
    generator.delay = Some(Duration::from_secs(5));
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let err = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap_err();
    let err = err.downcast::<VialyError>().unwrap();
    assert!(matches!(err, VialyError::ServiceUnavailable(_)));
    assert_eq!(assistant.status().unwrap().cache_entries, 0);
}

#[tokio::test]
async fn test_short_query_rejected_without_side_effects() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let err = assistant.ask("ab", "user-1", None).await.unwrap_err();
    let err = err.downcast::<VialyError>().unwrap();
    assert!(matches!(err, VialyError::InvalidInput(_)));

    assert_eq!(assistant.active_sessions().unwrap(), 0);
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_owner_rejected_without_side_effects() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let err = assistant.ask(MULTA_QUERY, "  ", None).await.unwrap_err();
    let err = err.downcast::<VialyError>().unwrap();
    assert!(matches!(err, VialyError::InvalidInput(_)));

    assert_eq!(assistant.active_sessions().unwrap(), 0);
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_context_digest_injected_on_followup_turn() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, prompts) =
        RecordingGenerator::answering("Según el Artículo 131-C.29, tipo C.");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let first = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    assistant
        .ask(
            "¿Y qué documentos necesito presentar?",
            "user-1",
            Some(&first.session_id),
        )
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);

    // the first turn has no accumulated context
    assert!(prompts[0].contains("Sin contexto previo en esta conversación."));

    // the follow-up carries the digest and the rendered history
    assert!(prompts[1].contains("Tema Principal: MULTA"));
    assert!(prompts[1].contains("Exceso Velocidad"));
    assert!(prompts[1].contains("131-C.29"));
    assert!(prompts[1].contains(&format!("Usuario: {}", MULTA_QUERY)));
}

#[tokio::test]
async fn test_clear_history_resets_session() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, _prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let mut session_id = None;
    for query in [
        "¿Cuánto es la multa por exceso de velocidad?",
        "¿Qué documentos necesito presentar?",
        "¿Cómo renuevo la licencia de conducción?",
    ] {
        let response = assistant
            .ask(query, "user-1", session_id.as_deref())
            .await
            .unwrap();
        session_id = Some(response.session_id);
    }
    let session_id = session_id.unwrap();
    assert_eq!(
        assistant.session_info(&session_id).unwrap().unwrap().message_count,
        6
    );

    assert!(assistant.clear_history(&session_id).unwrap());
    assert!(assistant.session_info(&session_id).unwrap().is_none());
    assert!(!assistant.clear_history(&session_id).unwrap());
}

#[tokio::test]
async fn test_session_continuity_and_status() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let (generator, _prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let first = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    let second = assistant
        .ask(
            "¿Qué pasa si no pago el comparendo?",
            "user-1",
            Some(&first.session_id),
        )
        .await
        .unwrap();

    assert_eq!(first.session_id, second.session_id);

    let status = assistant.status().unwrap();
    assert_eq!(status.active_sessions, 1);
    assert_eq!(status.cache_entries, 2);

    assistant.clear_cache();
    assert_eq!(assistant.status().unwrap().cache_entries, 0);
}

#[tokio::test]
async fn test_fast_mode_prompt_skips_history() {
    let dir = tempdir().unwrap();
    let mut config = test_config(&dir);
    config.pipeline.fast_mode = true;

    let (generator, prompts) = RecordingGenerator::answering("respuesta");
    let assistant = build_assistant(&config, vec![], Box::new(generator));

    let first = assistant.ask(MULTA_QUERY, "user-1", None).await.unwrap();
    assistant
        .ask(
            "¿Y el semáforo en rojo cuánto cuesta?",
            "user-1",
            Some(&first.session_id),
        )
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    // fast-mode prompts never include history, even on follow-ups
    assert!(!prompts[1].contains("Usuario:"));
    assert!(prompts[1].contains("Experto en multas de tránsito Colombia."));
}
