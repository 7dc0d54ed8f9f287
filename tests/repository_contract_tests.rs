use std::sync::Arc;

use aptitude_hub::{
    errors::AppError,
    models::domain::{Answer, Principal, Question, Submission, UserProfile, UserRole},
    repositories::{
        InMemoryQuestionRepository, InMemorySubmissionRepository, InMemoryUserRepository,
        QuestionRepository, SubmissionRepository, UserRepository,
    },
};

fn make_question(text: &str, points: u32) -> Question {
    Question::new(text, &["a", "b", "c"], 0, points)
}

fn make_submission(user: &str, score: u64) -> Submission {
    Submission::new(
        Principal::new(user),
        vec![Answer { question_id: 1, selected_index: 0 }],
        score,
    )
}

async fn question_repository_contract(repo: Arc<dyn QuestionRepository>) {
    let first = repo.create(make_question("one?", 1)).await.expect("create first");
    let second = repo.create(make_question("two?", 2)).await.expect("create second");
    assert!(second.id > first.id, "ids increase");

    let found = repo.find_by_id(first.id).await.expect("find should work");
    assert_eq!(found.map(|q| q.question_text), Some("one?".to_string()));

    let mut edited = second.clone();
    edited.question_text = "two, edited?".to_string();
    edited.options.push("d".to_string());
    let updated = repo.update(edited).await.expect("update should work");
    assert_eq!(updated.options.len(), 4);

    let all = repo.find_all().await.expect("list should work");
    assert_eq!(
        all.iter().map(|q| q.id).collect::<Vec<_>>(),
        vec![first.id, second.id],
        "listing is ordered by id"
    );

    let mut ghost = make_question("ghost?", 1);
    ghost.id = 9_999;
    let missing_update = repo.update(ghost).await;
    assert!(matches!(missing_update, Err(AppError::NotFound(_))));

    repo.delete(first.id).await.expect("delete should work");
    assert!(repo.find_by_id(first.id).await.expect("find").is_none());

    let missing_delete = repo.delete(first.id).await;
    assert!(matches!(missing_delete, Err(AppError::NotFound(_))));

    let third = repo.create(make_question("three?", 3)).await.expect("create third");
    assert!(third.id > second.id, "deleted ids are not reused");
}

async fn submission_repository_contract(repo: Arc<dyn SubmissionRepository>) {
    let older = repo.create(make_submission("alice", 1)).await.expect("create");
    let newer = repo.create(make_submission("alice", 2)).await.expect("create");
    repo.create(make_submission("bob", 3)).await.expect("create");

    let duplicate = repo.create(older.clone()).await;
    assert!(duplicate.is_err());

    let alice = repo
        .find_by_user(&Principal::new("alice"))
        .await
        .expect("query should work");
    assert_eq!(
        alice.iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
        vec![newer.id, older.id],
        "newest first"
    );

    let nobody = repo
        .find_by_user(&Principal::new("carol"))
        .await
        .expect("query should work");
    assert!(nobody.is_empty());
}

async fn user_repository_contract(repo: Arc<dyn UserRepository>) {
    let alice = Principal::new("alice");
    let bob = Principal::new("bob");

    assert!(repo.find_by_principal(&alice).await.expect("find").is_none());
    assert!(!repo.admin_exists().await.expect("admin_exists"));

    let saved = repo
        .save_profile(&alice, UserProfile { name: "Alice".to_string() })
        .await
        .expect("save profile");
    assert_eq!(saved.role, UserRole::User, "new records default to user");

    repo.set_role(&alice, UserRole::Guest).await.expect("set role");
    let record = repo
        .find_by_principal(&alice)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.role, UserRole::Guest);
    assert_eq!(record.profile.map(|p| p.name), Some("Alice".to_string()));

    repo.claim_initial_admin(&bob, "hash").await.expect("first claim");
    assert!(repo.admin_exists().await.expect("admin_exists"));

    let second = repo.claim_initial_admin(&alice, "hash").await;
    assert!(matches!(second, Err(AppError::AlreadyInitialized(_))));
    let alice_role = repo
        .find_by_principal(&alice)
        .await
        .expect("find")
        .map(|r| r.role);
    assert_eq!(alice_role, Some(UserRole::Guest));
}

#[tokio::test]
async fn in_memory_question_repository_honours_contract() {
    question_repository_contract(Arc::new(InMemoryQuestionRepository::new())).await;
}

#[tokio::test]
async fn in_memory_submission_repository_honours_contract() {
    submission_repository_contract(Arc::new(InMemorySubmissionRepository::new())).await;
}

#[tokio::test]
async fn in_memory_user_repository_honours_contract() {
    user_repository_contract(Arc::new(InMemoryUserRepository::new())).await;
}

#[tokio::test]
async fn concurrent_claims_admit_exactly_one() {
    let repo = Arc::new(InMemoryUserRepository::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.claim_initial_admin(&Principal::new(format!("p{}", i)), "hash")
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task should not panic") {
            Ok(record) => {
                winners += 1;
                assert_eq!(record.role, UserRole::Admin);
            }
            Err(err) => assert!(matches!(err, AppError::AlreadyInitialized(_))),
        }
    }
    assert_eq!(winners, 1);
}
