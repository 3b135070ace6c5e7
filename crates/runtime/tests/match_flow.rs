mod common;

use battle_core::{BattleState, MatchScore, RoundResult, Side};
use runtime::{
    BattleEvent, EventKind, FixedSettings, MatchEnd, Runtime, ScriptedSource, TimerCategory,
};

use common::{config, kinds, pair, start, within};

/// Full match: the player wins every round on "power" until the target of
/// two is reached.
///
/// 1. Start the match and wait for the first prompt
/// 2. Select "power" and wait for the resolution (1-0)
/// 3. Let the cooldown run out and play the second round (2-0)
/// 4. Verify the match concluded with A as winner and the event order
#[tokio::test(start_paused = true)]
async fn player_reaches_target_and_wins() {
    let h = start(config(), ScriptedSource::repeating(pair()), 2).await;
    let readiness = h.handle.readiness();

    let concluded = readiness.match_concluded();
    let prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");
    let BattleEvent::RoundPrompt(first) = within(prompt).await.expect("first prompt") else {
        panic!("expected a round prompt");
    };
    assert_eq!(first.round, 1);
    assert_eq!(first.stats, vec!["power".to_string(), "speed".to_string()]);

    let resolved = readiness.round_resolved();
    let next_prompt = readiness.round_prompt();
    assert!(h.handle.submit_selection("power").await.expect("select"));

    let BattleEvent::RoundResolved(round_one) = within(resolved).await.expect("resolution") else {
        panic!("expected a round resolution");
    };
    assert_eq!(round_one.result, RoundResult::WinA);
    assert_eq!(round_one.delta, 2);
    assert_eq!(round_one.score, MatchScore::new(1, 0));
    assert!(!round_one.match_ended);

    within(next_prompt).await.expect("second prompt");
    let resolved = readiness.round_resolved();
    assert!(h.handle.submit_selection("power").await.expect("select"));

    let BattleEvent::RoundResolved(round_two) = within(resolved).await.expect("resolution") else {
        panic!("expected a round resolution");
    };
    assert_eq!(round_two.score, MatchScore::new(2, 0));
    assert!(round_two.match_ended);

    let BattleEvent::MatchConcluded(end) = within(concluded).await.expect("conclusion") else {
        panic!("expected match conclusion");
    };
    assert_eq!(end.winner, Some(Side::A));
    assert_eq!(end.ended_by, MatchEnd::TargetReached);
    assert_eq!(end.target_score, 2);

    let snapshot = h.handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.state, BattleState::MatchOver);
    assert_eq!(snapshot.score, MatchScore::new(2, 0));

    use EventKind as K;
    assert_eq!(
        kinds(
            &h.events,
            &[
                K::RoundStarted,
                K::RoundPrompt,
                K::StatSelected,
                K::RoundResolved,
                K::CountdownFinished,
                K::MatchConcluded,
            ]
        ),
        vec![
            K::RoundStarted,
            K::RoundPrompt,
            K::StatSelected,
            K::RoundResolved,
            K::CountdownFinished,
            K::RoundStarted,
            K::RoundPrompt,
            K::StatSelected,
            K::RoundResolved,
            K::MatchConcluded,
        ]
    );

    use BattleState as S;
    assert_eq!(
        h.log.states(),
        vec![
            S::WaitingForMatchStart,
            S::RoundStart,
            S::WaitingForPlayerAction,
            S::RoundDecision,
            S::RoundOver,
            S::RoundStart,
            S::WaitingForPlayerAction,
            S::RoundDecision,
            S::RoundOver,
            S::MatchOver,
        ]
    );

    h.runtime.shutdown().await.expect("shutdown");
}

/// Target of five: the player wins five straight rounds on "power", each
/// separated by a full cooldown, and the match ends 5-0.
#[tokio::test(start_paused = true)]
async fn five_straight_wins_reach_target_of_five() {
    let h = start(config(), ScriptedSource::repeating(pair()), 5).await;
    let readiness = h.handle.readiness();

    let concluded = readiness.match_concluded();
    let mut prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");

    for round in 1..=5 {
        let BattleEvent::RoundPrompt(shown) = within(prompt).await.expect("prompt") else {
            panic!("expected a round prompt");
        };
        assert_eq!(shown.round, round);

        let resolved = readiness.round_resolved();
        prompt = readiness.round_prompt();
        assert!(h.handle.submit_selection("power").await.expect("select"));

        let BattleEvent::RoundResolved(result) = within(resolved).await.expect("resolution")
        else {
            panic!("expected a round resolution");
        };
        assert_eq!(result.round, round);
        assert_eq!(result.result, RoundResult::WinA);
        assert_eq!(result.score, MatchScore::new(round, 0));
        assert_eq!(result.match_ended, round == 5);
    }

    let BattleEvent::MatchConcluded(end) = within(concluded).await.expect("conclusion") else {
        panic!("expected match conclusion");
    };
    assert_eq!(end.winner, Some(Side::A));
    assert_eq!(end.score, MatchScore::new(5, 0));
    assert_eq!(end.target_score, 5);
    assert_eq!(end.ended_by, MatchEnd::TargetReached);

    let snapshot = h.handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.state, BattleState::MatchOver);
    assert_eq!(kinds(&h.events, &[EventKind::RoundResolved]).len(), 5);
    assert_eq!(kinds(&h.events, &[EventKind::CountdownFinished]).len(), 4);

    h.runtime.shutdown().await.expect("shutdown");
}

/// Clearing the bus listeners keeps the handle's milestone gates working.
#[tokio::test(start_paused = true)]
async fn readiness_survives_listener_reset() {
    let h = start(config(), ScriptedSource::repeating(pair()), 5).await;

    h.handle.reset_listeners();
    assert_eq!(h.handle.event_bus().listener_count(EventKind::RoundPrompt), 1);

    let prompt = h.handle.readiness().round_prompt();
    h.handle.start_match().await.expect("start");

    let BattleEvent::RoundPrompt(shown) = within(prompt).await.expect("prompt") else {
        panic!("expected a round prompt");
    };
    assert_eq!(shown.round, 1);
    // Recording listeners registered before the reset are gone.
    assert!(kinds(&h.events, &[EventKind::RoundPrompt]).is_empty());
}

/// A lost round scores for B; a draw leaves the score untouched.
#[tokio::test(start_paused = true)]
async fn losing_and_drawn_rounds_score_correctly() {
    let tie = common::card("twin", &[("power", 5), ("speed", 7)]);
    let source = ScriptedSource::new([
        Ok(pair()),
        Ok(battle_core::ContestantPair::new(pair().a, tie)),
    ]);
    let mut cfg = config();
    cfg.skip_cooldown = true;
    let h = start(cfg, source, 5).await;
    let readiness = h.handle.readiness();

    let prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");
    within(prompt).await.expect("prompt");

    let resolved = readiness.round_resolved();
    let prompt = readiness.round_prompt();
    h.handle.submit_selection("speed").await.expect("select");
    let BattleEvent::RoundResolved(lost) = within(resolved).await.expect("resolution") else {
        panic!("expected a round resolution");
    };
    assert_eq!(lost.result, RoundResult::WinB);
    assert_eq!(lost.score, MatchScore::new(0, 1));

    within(prompt).await.expect("prompt");
    let resolved = readiness.round_resolved();
    h.handle.submit_selection("power").await.expect("select");
    let BattleEvent::RoundResolved(drawn) = within(resolved).await.expect("resolution") else {
        panic!("expected a round resolution");
    };
    assert_eq!(drawn.result, RoundResult::Draw);
    assert_eq!(drawn.score, MatchScore::new(0, 1));
}

/// Double submission: only the first selection is applied.
#[tokio::test(start_paused = true)]
async fn second_selection_in_same_round_is_ignored() {
    let h = start(config(), ScriptedSource::repeating(pair()), 5).await;
    let readiness = h.handle.readiness();

    let prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");
    within(prompt).await.expect("prompt");

    let resolved = readiness.round_resolved();
    let first = h.handle.submit_selection("power").await.expect("select");
    let second = h.handle.submit_selection("speed").await.expect("select");
    assert!(first);
    assert!(!second);

    let BattleEvent::RoundResolved(round) = within(resolved).await.expect("resolution") else {
        panic!("expected a round resolution");
    };
    assert_eq!(round.stat, "power");
    assert_eq!(round.score, MatchScore::new(1, 0));
    assert_eq!(kinds(&h.events, &[EventKind::RoundResolved]).len(), 1);
    assert_eq!(kinds(&h.events, &[EventKind::StatSelected]).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn selections_outside_the_window_are_ignored() {
    let h = start(config(), ScriptedSource::repeating(pair()), 5).await;
    let readiness = h.handle.readiness();

    assert!(!h.handle.submit_selection("power").await.expect("select"));

    let prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");
    within(prompt).await.expect("prompt");

    assert!(!h.handle.submit_selection("grip").await.expect("select"));
    let snapshot = h.handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.state, BattleState::WaitingForPlayerAction);
    assert_eq!(snapshot.selection, None);
}

#[tokio::test(start_paused = true)]
async fn skipping_the_cooldown_starts_next_round_immediately() {
    let h = start(config(), ScriptedSource::repeating(pair()), 5).await;
    let readiness = h.handle.readiness();

    let prompt = readiness.round_prompt();
    h.handle.start_match().await.expect("start");
    within(prompt).await.expect("prompt");

    let resolved = readiness.round_resolved();
    let finished = readiness.cooldown_finished();
    h.handle.submit_selection("power").await.expect("select");
    within(resolved).await.expect("resolution");

    assert!(
        h.handle
            .timer(TimerCategory::Cooldown)
            .await
            .expect("timer")
            .is_some()
    );
    h.handle.skip_cooldown().await.expect("skip");

    let BattleEvent::CountdownFinished(done) = within(finished).await.expect("cooldown") else {
        panic!("expected cooldown completion");
    };
    assert!(done.skipped);
}

#[tokio::test(start_paused = true)]
async fn missing_target_setting_falls_back_to_default() {
    let runtime = Runtime::builder()
        .contestant_source(ScriptedSource::repeating(pair()))
        .settings(FixedSettings::unset())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();

    let started = handle.readiness().round_started();
    handle.start_match().await.expect("start");
    within(started).await.expect("round started");

    let snapshot = handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.target_score, 5);
    assert_eq!(snapshot.round, 1);
}

#[tokio::test]
async fn builder_requires_a_contestant_source() {
    let result = Runtime::builder().build().await;
    assert!(matches!(
        result,
        Err(runtime::RuntimeError::MissingContestantSource)
    ));
}
