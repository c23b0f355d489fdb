//! Session lifecycle tests against deterministic fake providers

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{pdf_with_pages, test_config, Harness};
use docuscope::interactive::run_batch;
use docuscope::{Error, QueryRequest, SessionState};

const PAIRS_CSV: &[u8] = b"name,value\nA,1\nB,2\n";

#[tokio::test]
async fn test_initialize_marks_models_ready() {
    let mut h = Harness::new();
    assert_eq!(h.session.state(), SessionState::Uninitialized);

    h.session.initialize().await.unwrap();
    assert_eq!(h.session.state(), SessionState::ModelsReady);
}

#[tokio::test]
async fn test_initialize_names_unavailable_model() {
    let mut h = Harness::new();
    h.llm.healthy.store(false, Ordering::SeqCst);

    match h.session.initialize().await {
        Err(Error::ModelsUnavailable(message)) => {
            assert!(message.contains("fake-llm"));
            assert!(!message.contains("fake-embed"));
        }
        other => panic!("expected ModelsUnavailable, got {:?}", other),
    }
    assert_eq!(h.session.state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn test_load_requires_initialized_models() {
    let mut h = Harness::new();
    let path = h.write("pairs.csv", PAIRS_CSV);

    assert!(matches!(
        h.session.load_document(&path).await,
        Err(Error::ModelsNotReady)
    ));
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_name_value_csv_yields_two_chunks() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);

    let summary = h.session.load_document(&path).await.unwrap();
    assert_eq!(summary.total_chunks, 2);
    assert_eq!(h.session.state(), SessionState::DocumentLoaded);

    let texts: Vec<String> = h
        .session
        .index()
        .unwrap()
        .chunks()
        .map(|c| c.text.clone())
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("name") && texts[0].contains("A") && texts[0].contains("value") && texts[0].contains('1'));
    assert!(texts[1].contains("name") && texts[1].contains("B") && texts[1].contains("value") && texts[1].contains('2'));
}

#[tokio::test]
async fn test_top_k_larger_than_index_returns_all_chunks() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    let answer = h
        .session
        .query(&QueryRequest::new("What is the value of B?").with_top_k(4))
        .await
        .unwrap();

    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.answer_text, "The answer is in the document.");
    assert!(answer.sources[0].similarity >= answer.sources[1].similarity);
}

#[tokio::test]
async fn test_zero_byte_pdf_is_empty_document() {
    let mut h = Harness::ready().await;
    let path = h.write("blank.pdf", b"");

    assert!(matches!(
        h.session.load_document(&path).await,
        Err(Error::EmptyDocument(_))
    ));
    assert_eq!(h.session.state(), SessionState::ModelsReady);
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut h = Harness::ready().await;
    let notes = h.write("notes.txt", b"hello");

    assert!(matches!(
        h.session.load_document(&notes).await,
        Err(Error::UnsupportedFormat { .. })
    ));
    assert!(matches!(
        h.session.load_document(h.dir.path().join("missing.csv")).await,
        Err(Error::FileNotFound(_))
    ));
}

#[tokio::test]
async fn test_loading_b_replaces_a() {
    let mut h = Harness::ready().await;
    let a = h.write("a.csv", b"city,population\nOslo,700000\nBergen,290000\nTromso,77000\n");
    let b = h.write("b.csv", PAIRS_CSV);

    h.session.load_document(&a).await.unwrap();
    assert_eq!(h.session.index().unwrap().len(), 3);

    h.session.load_document(&b).await.unwrap();
    let index = h.session.index().unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.chunks().all(|c| c.source.source_id == "b.csv"));
    assert_eq!(h.session.document().unwrap().filename, "b.csv");

    let results = h.session.retrieve("Oslo population").await.unwrap();
    assert!(results.iter().all(|r| r.chunk.source.source_id == "b.csv"));
}

#[tokio::test]
async fn test_failed_load_keeps_previous_document() {
    let mut h = Harness::ready().await;
    let a = h.write("a.csv", PAIRS_CSV);
    let b = h.write("b.csv", b"item,price\nTea,3\n");

    h.session.load_document(&a).await.unwrap();
    h.embedder.fail.store(true, Ordering::SeqCst);

    assert!(matches!(
        h.session.load_document(&b).await,
        Err(Error::EmbeddingUnavailable(_))
    ));
    assert_eq!(h.session.state(), SessionState::DocumentLoaded);
    assert_eq!(h.session.document().unwrap().filename, "a.csv");
    assert_eq!(h.session.index().unwrap().len(), 2);

    h.embedder.fail.store(false, Ordering::SeqCst);
    assert!(h.session.ask("What is A?").await.is_ok());
}

#[tokio::test]
async fn test_question_before_load() {
    let mut h = Harness::ready().await;

    assert!(matches!(
        h.session.ask("anything?").await,
        Err(Error::NoDocumentLoaded)
    ));
    assert!(matches!(
        h.session.retrieve("anything?").await,
        Err(Error::NoDocumentLoaded)
    ));
}

#[tokio::test]
async fn test_empty_question_rejected() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    assert!(matches!(h.session.ask("   ").await, Err(Error::EmptyQuestion)));
}

#[tokio::test]
async fn test_question_failure_keeps_session_usable() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    h.llm.fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.session.ask("What is A?").await,
        Err(Error::GenerationUnavailable(_))
    ));
    assert_eq!(h.session.state(), SessionState::DocumentLoaded);

    h.embedder.fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.session.ask("What is A?").await,
        Err(Error::EmbeddingUnavailable(_))
    ));
    assert_eq!(h.session.state(), SessionState::DocumentLoaded);

    h.llm.fail.store(false, Ordering::SeqCst);
    h.embedder.fail.store(false, Ordering::SeqCst);
    let answer = h.session.ask("What is A?").await.unwrap();
    assert_eq!(answer.sources.len(), 2);
}

#[tokio::test]
async fn test_cancelled_question_returns_to_document_loaded() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    h.llm.hang.store(true, Ordering::SeqCst);
    let outcome = tokio::time::timeout(Duration::from_millis(50), h.session.ask("What is B?")).await;
    assert!(outcome.is_err());

    assert_eq!(h.session.state(), SessionState::DocumentLoaded);
    assert_eq!(h.session.index().unwrap().len(), 2);
}

#[tokio::test]
async fn test_retrieval_is_repeatable() {
    let mut h = Harness::ready().await;
    let path = h.write(
        "menu.csv",
        b"dish,price,notes\nMargherita,12,classic tomato\nDiavola,14,spicy salami\nMarinara,9,no cheese\nQuattro Formaggi,15,four cheeses\nCalzone,13,folded\n",
    );
    h.session.load_document(&path).await.unwrap();

    let first = h.session.retrieve("Which pizza has cheese?").await.unwrap();
    let second = h.session.retrieve("Which pizza has cheese?").await.unwrap();

    assert_eq!(first.len(), 4);
    let ids = |results: &[docuscope::retrieval::SearchResult]| {
        results.iter().map(|r| r.chunk.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert!(first.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn test_prompt_carries_context_in_retrieval_order() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    let answer = h.session.ask("What is the value of B?").await.unwrap();
    let prompt = h.llm.last_prompt.lock().clone().unwrap();

    let first = prompt.find(&answer.sources[0].text).unwrap();
    let second = prompt.find(&answer.sources[1].text).unwrap();
    assert!(first < second);
    assert!(prompt.contains("What is the value of B?"));
}

#[tokio::test]
async fn test_load_bytes_upload() {
    let mut h = Harness::ready().await;

    let summary = h.session.load_bytes("upload.csv", PAIRS_CSV.to_vec()).await.unwrap();
    assert_eq!(summary.filename, "upload.csv");
    assert_eq!(summary.total_segments, 2);
    assert_eq!(summary.content_hash.len(), 64);
}

#[tokio::test]
async fn test_pdf_pages_become_positions() {
    let mut h = Harness::ready().await;
    let path = h.write(
        "report.pdf",
        &pdf_with_pages(&["Revenue grew in the north region", "Costs fell in the south region"]),
    );

    let summary = h.session.load_document(&path).await.unwrap();
    assert_eq!(summary.total_chunks, 2);

    let index = h.session.index().unwrap();
    let positions: Vec<u32> = index.chunks().map(|c| c.source.position).collect();
    assert_eq!(positions, vec![1, 2]);
    let first = index.chunks().next().unwrap();
    assert!(first.text.contains("Revenue"));
}

#[tokio::test]
async fn test_batch_records_failures_and_continues() {
    let mut h = Harness::ready().await;
    let a = h.write("a.csv", PAIRS_CSV);
    let missing = h.dir.path().join("missing.csv");
    let b = h.write("b.csv", b"item,price\nTea,3\nCake,5\n");
    let questions = vec!["What is A?".to_string(), "What costs 5?".to_string()];

    let mut output = Vec::new();
    let report = run_batch(
        &mut h.session,
        &[a.clone(), missing.clone(), b.clone()],
        &questions,
        &mut output,
    )
    .await
    .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.load_failures.len(), 1);
    assert_eq!(report.load_failures[0].0, missing.display().to_string());
    assert!(report.documents.iter().all(|d| d.successful() == 2));

    let json = report.to_json().unwrap();
    let b_answers = &json[b.display().to_string().as_str()];
    assert_eq!(b_answers["What costs 5?"]["answer"], "The answer is in the document.");
    assert!(b_answers["What costs 5?"]["sources"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s.as_str().unwrap().starts_with("b.csv, Row ")));

    assert_eq!(h.session.document().unwrap().filename, "b.csv");
    assert!(String::from_utf8(output).unwrap().contains("2/2 successful"));
}

#[tokio::test]
async fn test_zero_top_k_rejected_before_generation() {
    let mut h = Harness::ready().await;
    let path = h.write("pairs.csv", PAIRS_CSV);
    h.session.load_document(&path).await.unwrap();

    assert!(matches!(
        h.session
            .query(&QueryRequest::new("What is A?").with_top_k(0))
            .await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(h.llm.last_prompt.lock().is_none());
    assert_eq!(h.session.state(), SessionState::DocumentLoaded);

    let answer = h
        .session
        .query(&QueryRequest::new("What is A?").with_top_k(1))
        .await
        .unwrap();
    assert_eq!(answer.sources.len(), 1);
}

#[tokio::test]
async fn test_initialize_rejects_dimension_mismatch() {
    let mut config = test_config();
    config.embeddings.dimensions = 16;
    let mut h = Harness::with_config(config);

    match h.session.initialize().await {
        Err(Error::Config(message)) => {
            assert!(message.contains("fake-embed"));
            assert!(message.contains("16"));
        }
        other => panic!("expected Config error, got {:?}", other),
    }
    assert_eq!(h.session.state(), SessionState::Uninitialized);
}
