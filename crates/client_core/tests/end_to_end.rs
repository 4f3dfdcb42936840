use std::{sync::Arc, time::Duration};

use client_core::{
    ClientSettings, HttpEvaluator, QuestionBank, ReportRenderer, ReportState, SessionController,
    SessionEvent, SessionPhase, SubmitOutcome,
};
use evaluator_stub::{build_router, builtin_questions, AppState};
use shared::domain::SessionId;
use tokio::net::TcpListener;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn spawn_stub() -> (Arc<HttpEvaluator>, Arc<QuestionBank>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let questions = builtin_questions().expect("questions");
    let bank = Arc::new(QuestionBank::from_records(questions.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = build_router(AppState::new(questions));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let settings = ClientSettings::default()
        .with_evaluator_url(&format!("http://{addr}"))
        .expect("settings");
    let evaluator = Arc::new(HttpEvaluator::new(&settings).expect("evaluator"));
    (evaluator, bank)
}

#[tokio::test]
async fn interview_runs_to_a_rendered_report() {
    let (evaluator, bank) = spawn_stub().await;
    let controller = SessionController::new(evaluator.clone(), TEST_TIMEOUT);
    let mut events = controller.subscribe_events();

    let first = controller.start().await.expect("start");
    assert_eq!(Some(first.as_str()), bank.question(0));
    assert_eq!(controller.phase(), SessionPhase::AwaitingAnswer);

    let answers: Vec<String> = bank
        .records()
        .iter()
        .map(|record| record.answer.clone())
        .collect();
    let mut completed_id = None;
    for (index, answer) in answers.iter().enumerate() {
        match controller.submit(answer.clone()).await.expect("submit") {
            SubmitOutcome::NextQuestion { turn, question } => {
                assert_eq!(Some(turn.question.as_str()), bank.question(index));
                assert_eq!(Some(question.as_str()), bank.question(index + 1));
            }
            SubmitOutcome::Completed { turn, session_id } => {
                assert_eq!(index, answers.len() - 1);
                assert_eq!(Some(turn.question.as_str()), bank.question(index));
                completed_id = Some(session_id);
            }
        }
    }
    let session_id = completed_id.expect("interview completed");
    assert_eq!(controller.phase(), SessionPhase::Completed);
    assert_eq!(controller.history().len(), answers.len());
    assert!(controller.history().iter().all(|turn| turn.score >= 90.0));

    let mut saw_completed = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Completed { session_id: id } = event {
            assert_eq!(id, session_id);
            saw_completed = true;
        }
    }
    assert!(saw_completed);

    let mut renderer = ReportRenderer::new(evaluator, bank.clone(), TEST_TIMEOUT);
    assert!(matches!(
        renderer.load(&session_id).await,
        ReportState::Loaded(_)
    ));
    let view = renderer.view().expect("view");
    assert_eq!(view.rows.len(), answers.len());
    assert_eq!(view.rows[0].question, bank.question(0).expect("first question"));
    assert!(view.final_score.expect("final score") >= 90.0);
    let text = view.to_string();
    assert!(text.contains("Overall Feedback:"), "{text}");
    assert!(text.contains("Detailed Feedback:"), "{text}");
}

#[tokio::test]
async fn unknown_session_renders_empty_report() {
    let (evaluator, bank) = spawn_stub().await;
    let mut renderer = ReportRenderer::new(evaluator, bank, TEST_TIMEOUT);
    assert_eq!(
        renderer.load(&SessionId::new("never-issued")).await,
        &ReportState::Empty
    );
    assert!(renderer.view().is_none());
}

#[tokio::test]
async fn weak_answers_are_recorded_with_low_scores() {
    let (evaluator, _) = spawn_stub().await;
    let controller = SessionController::new(evaluator, TEST_TIMEOUT);
    controller.start().await.expect("start");

    let outcome = controller.submit("no").await.expect("submit");
    assert_eq!(outcome.turn().score, 0.0);
    assert!(outcome.turn().feedback.contains("too short"));
    assert_eq!(controller.draft(), "");
}
