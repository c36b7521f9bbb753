mod common;

use std::sync::Arc;

use content_service::Error;
use content_service::services::Services;
use content_service::store::{MemoryStore, RecordStore};
use content_service::types::principal::Principal;

use common::{AlwaysStale, answer_by, asker, open_question};

#[tokio::test]
async fn accepting_a_sibling_unaccepts_the_previous_answer() {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), 3);
    let question_id = open_question(&store).await;
    let a = answer_by(&services, question_id, "alice").await;
    let b = answer_by(&services, question_id, "bob").await;

    let accepted = services.answers.accept(a.id, &asker()).await.unwrap();
    assert!(accepted.is_accepted);
    assert!(store.find_answer(a.id).await.unwrap().unwrap().is_accepted);
    assert!(!store.find_answer(b.id).await.unwrap().unwrap().is_accepted);

    services.answers.accept(b.id, &asker()).await.unwrap();
    assert!(!store.find_answer(a.id).await.unwrap().unwrap().is_accepted);
    assert!(store.find_answer(b.id).await.unwrap().unwrap().is_accepted);
}

#[tokio::test]
async fn re_accepting_the_same_answer_is_harmless() {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), 3);
    let question_id = open_question(&store).await;
    let a = answer_by(&services, question_id, "alice").await;

    services.answers.accept(a.id, &asker()).await.unwrap();
    services.answers.accept(a.id, &asker()).await.unwrap();

    let accepted = store
        .find_active_answers(question_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|answer| answer.is_accepted)
        .count();
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn answer_author_cannot_accept_on_behalf_of_the_asker() {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), 3);
    let question_id = open_question(&store).await;
    let a = answer_by(&services, question_id, "alice").await;

    let result = services
        .answers
        .accept(a.id, &Principal::new("alice", "alice"))
        .await;
    assert!(matches!(result, Err(Error::Forbidden(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_leave_exactly_one_winner() {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), 64);
    let question_id = open_question(&store).await;

    let mut answers = Vec::new();
    for i in 0..8 {
        answers.push(answer_by(&services, question_id, &format!("helper-{}", i)).await);
    }

    let mut handles = Vec::new();
    for answer in &answers {
        let coordinator = services.acceptance.clone();
        let answer_id = answer.id;
        handles.push(tokio::spawn(async move {
            coordinator.accept(answer_id, &asker()).await
        }));
    }
    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert!(successes >= 1);

    let accepted: Vec<_> = store
        .find_active_answers(question_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|answer| answer.is_accepted)
        .collect();
    assert_eq!(accepted.len(), 1);

    let question = store.find_question(question_id).await.unwrap().unwrap();
    assert_eq!(question.revision, successes);
}

#[tokio::test]
async fn accept_gives_up_after_bounded_retries() {
    let store = Arc::new(AlwaysStale::default());
    let services = Services::new(store.clone(), 3);
    let question_id = open_question(&store.inner).await;
    let a = answer_by(&services, question_id, "alice").await;

    let result = services.answers.accept(a.id, &asker()).await;
    assert!(matches!(result, Err(Error::Conflict(_))));
    assert!(!store.find_answer(a.id).await.unwrap().unwrap().is_accepted);
}
