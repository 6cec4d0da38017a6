//! End-to-end session tests against the in-memory scripted server.
//!
//! Every test runs on a paused tokio clock, so countdowns expire as soon as
//! the runtime goes idle instead of after real seconds.

#![allow(clippy::expect_used)]

use std::{collections::BTreeMap, time::Duration};

use credo_client::{
    ClientError, EndReason, GameClient, SessionHandle, SessionUpdate, SystemEnv, TransportError,
};
use credo_core::{Phase, ResponseError};
use credo_harness::{ScriptedServer, SimEnv, Submission};
use credo_proto::{
    CardId, CardPrototype, Cost, CostProvider, EntityId, GameEvent, GameState, RequestKind,
    RequestUserEvent, UserEvent,
};

fn snapshot(round: u32, finished: bool) -> GameEvent {
    GameEvent::StateUpdate(GameState {
        round_number: round,
        is_my_turn: true,
        game_finished: finished,
        ..GameState::default()
    })
}

fn turn_request(seqnum: u64, timeout_ms: u64, playable: &[u32]) -> RequestUserEvent {
    RequestUserEvent {
        seqnum,
        timeout_ms,
        kind: RequestKind::TurnAction {
            playable_cards: playable.iter().copied().map(EntityId).collect(),
        },
    }
}

async fn joined(server: &ScriptedServer, room: &str) -> GameClient<ScriptedServer> {
    let mut client = GameClient::new(server.clone());
    client.login("alice").await.expect("login");
    client.join_room(room).await.expect("join");
    client
}

/// Next update that is not a countdown.
async fn next_event(handle: &mut SessionHandle) -> SessionUpdate {
    loop {
        match handle.next_update().await.expect("session loop alive") {
            SessionUpdate::Countdown { .. } => continue,
            update => return update,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn answer_reaches_server_and_clears_request() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby-7").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");
    assert!(handle.is_waiting());

    assert!(server.push(snapshot(1, false)).await);
    match next_event(&mut handle).await {
        SessionUpdate::State { state, phase } => {
            assert_eq!(state.round_number, 1);
            assert_eq!(phase, Phase::Active);
        },
        other => panic!("expected state, got {other:?}"),
    }
    assert!(!handle.is_waiting());

    let request = turn_request(5, 20_000, &[10, 11]);
    assert!(server.push(GameEvent::RequestUserEvent(request.clone())).await);
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Prompt(request.clone()));
    assert_eq!(handle.current_request(), Some(request));

    handle.submit(5, UserEvent::PlayCard { entity: EntityId(10) }).expect("submit");
    assert_eq!(
        next_event(&mut handle).await,
        SessionUpdate::Submitted { seqnum: 5, event: UserEvent::PlayCard { entity: EntityId(10) } }
    );
    assert_eq!(handle.current_request(), None);

    assert_eq!(
        server.submissions(),
        vec![Submission {
            room_id: "room-1".to_string(),
            seqnum: 5,
            event: UserEvent::PlayCard { entity: EntityId(10) },
        }]
    );
    assert_eq!(handle.close().await, EndReason::Left);
}

#[tokio::test(start_paused = true)]
async fn timeout_sends_single_empty() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(GameEvent::RequestUserEvent(turn_request(3, 500, &[1]))).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(_)));

    let mut countdowns = 0;
    let submitted = loop {
        match handle.next_update().await.expect("update") {
            SessionUpdate::Countdown { seqnum, remaining } => {
                assert_eq!(seqnum, 3);
                assert!(remaining < Duration::from_millis(500));
                countdowns += 1;
            },
            update => break update,
        }
    };
    assert!(countdowns > 0);
    assert_eq!(submitted, SessionUpdate::Submitted { seqnum: 3, event: UserEvent::Empty });

    // A late answer finds nothing to answer.
    handle.submit(3, UserEvent::EndTurn).expect("submit");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(server.submissions().len(), 1);
    assert_eq!(handle.current_request(), None);
}

#[tokio::test(start_paused = true)]
async fn answer_for_superseded_request_is_dropped() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(GameEvent::RequestUserEvent(turn_request(1, 10_000, &[4]))).await;
    server.push(GameEvent::RequestUserEvent(turn_request(2, 10_000, &[4]))).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(r) if r.seqnum == 1));
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(r) if r.seqnum == 2));

    handle.submit(1, UserEvent::EndTurn).expect("submit");
    handle.submit(2, UserEvent::EndTurn).expect("submit");

    assert_eq!(
        next_event(&mut handle).await,
        SessionUpdate::Submitted { seqnum: 2, event: UserEvent::EndTurn }
    );
    let seqnums: Vec<u64> = server.submissions().iter().map(|s| s.seqnum).collect();
    assert_eq!(seqnums, vec![2]);
}

#[tokio::test(start_paused = true)]
async fn invalid_payment_is_rejected_and_request_kept() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    let request = RequestUserEvent {
        seqnum: 4,
        timeout_ms: 30_000,
        kind: RequestKind::CostAction {
            cost: Some(Cost { any: 3 }),
            providers: vec![
                CostProvider { entity: EntityId(1), provided: Some(Cost { any: 2 }) },
                CostProvider { entity: EntityId(2), provided: Some(Cost { any: 1 }) },
                CostProvider { entity: EntityId(3), provided: None },
            ],
        },
    };
    server.push(GameEvent::RequestUserEvent(request.clone())).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(_)));

    handle.submit(4, UserEvent::PayCost { providers: vec![EntityId(1)] }).expect("submit");
    assert_eq!(
        next_event(&mut handle).await,
        SessionUpdate::Rejected {
            seqnum: 4,
            error: ResponseError::CostNotSatisfied { required: 3, provided: 2 },
        }
    );
    assert_eq!(handle.current_request(), Some(request));

    let payment = UserEvent::PayCost { providers: vec![EntityId(1), EntityId(2)] };
    handle.submit(4, payment.clone()).expect("submit");
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Submitted { seqnum: 4, event: payment });
    assert!(server.submissions().iter().all(|s| s.seqnum == 4));
    assert_eq!(server.submissions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_cancels_subscription() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(snapshot(1, false)).await;
    server.push(GameEvent::RequestUserEvent(turn_request(8, 5_000, &[]))).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::State { .. }));
    assert!(server.is_subscribed());

    assert_eq!(handle.close().await, EndReason::Left);
    assert!(!server.is_subscribed());
    assert!(!server.push(snapshot(2, false)).await);

    // The countdown died with the session.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(server.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_enter_is_refused_while_session_runs() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");
    assert!(client.in_game());

    assert!(matches!(
        client.enter_game(SystemEnv::new()).await,
        Err(ClientError::AlreadyEntered)
    ));

    // The first stream is still the live one, and its request times out once.
    server.push(GameEvent::RequestUserEvent(turn_request(5, 500, &[1]))).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(r) if r.seqnum == 5));
    assert_eq!(
        next_event(&mut handle).await,
        SessionUpdate::Submitted { seqnum: 5, event: UserEvent::Empty }
    );
    tokio::time::sleep(Duration::from_secs(2)).await;

    let submitted: Vec<(u64, UserEvent)> =
        server.submissions().into_iter().map(|s| (s.seqnum, s.event)).collect();
    assert_eq!(submitted, vec![(5, UserEvent::Empty)]);
}

#[tokio::test(start_paused = true)]
async fn enter_again_after_close() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;

    let handle = client.enter_game(SystemEnv::new()).await.expect("enter");
    assert_eq!(handle.close().await, EndReason::Left);
    assert!(!client.in_game());

    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter again");
    server.push(snapshot(4, false)).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::State { .. }));
    assert_eq!(handle.state().map(|s| s.round_number), Some(4));
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_frees_the_session_slot() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;

    drop(client.enter_game(SystemEnv::new()).await.expect("enter"));
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(!client.in_game());
    assert!(!server.is_subscribed());
    client.enter_game(SystemEnv::new()).await.expect("enter again");
}

#[tokio::test(start_paused = true)]
async fn leave_ends_with_update() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    handle.leave();
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Ended(EndReason::Left));
    assert!(handle.next_update().await.is_none());
    assert!(matches!(
        handle.submit(1, UserEvent::EndTurn),
        Err(ClientError::SessionEnded)
    ));
}

#[tokio::test]
async fn operations_require_login_and_room() {
    let server = ScriptedServer::new();
    let mut client = GameClient::new(server);

    assert_eq!(client.room_name(), "unknown");
    assert!(matches!(client.join_room("lobby").await, Err(ClientError::NotLoggedIn)));
    assert!(matches!(client.enter_game(SystemEnv::new()).await, Err(ClientError::NotJoined)));
    assert!(matches!(
        client.submit_user_event(1, UserEvent::EndTurn).await,
        Err(ClientError::NotJoined)
    ));

    client.login("bob").await.expect("login");
    assert!(matches!(client.enter_game(SystemEnv::new()).await, Err(ClientError::NotJoined)));

    client.join_room("lobby").await.expect("join");
    assert_eq!(client.room_name(), "lobby");
}

#[tokio::test]
async fn refused_join_keeps_client_unjoined() {
    let server = ScriptedServer::new();
    server.refuse_room("full");
    let mut client = GameClient::new(server);
    client.login("carol").await.expect("login");

    match client.join_room("full").await {
        Err(ClientError::Transport(TransportError::Rejected { message })) => {
            assert_eq!(message, "room full is full");
        },
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(client.session().is_none());
}

#[tokio::test]
async fn direct_submit_is_addressed_to_joined_room() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;

    client.submit_user_event(11, UserEvent::EndTurn).await.expect("submit");
    assert_eq!(
        server.submissions(),
        vec![Submission { room_id: "room-1".to_string(), seqnum: 11, event: UserEvent::EndTurn }]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_submission_is_reported() {
    let server = ScriptedServer::new();
    server.fail_submissions(true);
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(GameEvent::RequestUserEvent(turn_request(6, 5_000, &[]))).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::Prompt(_)));

    handle.submit(6, UserEvent::EndTurn).expect("submit");
    assert_eq!(
        next_event(&mut handle).await,
        SessionUpdate::SubmitFailed { seqnum: 6, error: "connection closed".to_string() }
    );
    // Already answered; the countdown does not submit again.
    assert_eq!(handle.current_request(), None);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(server.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stream_failure_ends_session() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.fail_stream(TransportError::Closed).await;
    let reason = EndReason::StreamFailed { reason: "connection closed".to_string() };
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Ended(reason.clone()));
    assert_eq!(handle.close().await, reason);
}

#[tokio::test(start_paused = true)]
async fn stream_end_after_finish_is_game_finished() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(snapshot(9, true)).await;
    assert!(matches!(
        next_event(&mut handle).await,
        SessionUpdate::State { phase: Phase::Finished, .. }
    ));

    server.close_stream();
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Ended(EndReason::GameFinished));
}

#[tokio::test(start_paused = true)]
async fn stream_end_mid_game_is_stream_closed() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let mut handle = client.enter_game(SystemEnv::new()).await.expect("enter");

    server.push(snapshot(2, false)).await;
    assert!(matches!(next_event(&mut handle).await, SessionUpdate::State { .. }));

    server.close_stream();
    assert_eq!(next_event(&mut handle).await, SessionUpdate::Ended(EndReason::StreamClosed));
}

#[tokio::test]
async fn virtual_clock_expires_long_countdown() {
    let server = ScriptedServer::new();
    let client = joined(&server, "lobby").await;
    let env = SimEnv::new();
    let handle = client.enter_game(env.clone()).await.expect("enter");

    server.push(GameEvent::RequestUserEvent(turn_request(1, 20_000, &[2]))).await;
    let submissions = server.wait_for_submissions(1).await;

    assert_eq!(submissions[0].seqnum, 1);
    assert_eq!(submissions[0].event, UserEvent::Empty);
    assert!(env.elapsed() >= Duration::from_secs(20));
    assert_eq!(handle.close().await, EndReason::Left);
}

#[tokio::test]
async fn card_catalog_is_fetched_once() {
    let prototypes = BTreeMap::from([(
        CardId(1),
        CardPrototype { name: "Acolyte".to_string(), description: "Pay 1.".to_string() },
    )]);
    let server = ScriptedServer::new().with_prototypes(prototypes);
    let mut client = joined(&server, "lobby").await;

    let catalog = client.card_catalog().await.expect("catalog");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.display_name(CardId(1)), "Acolyte");
    assert_eq!(catalog.display_name(CardId(99)), "card #99");
}
