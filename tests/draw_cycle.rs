#![allow(non_snake_case)]
use family_bingo::{
    game::{
        MAX_NUMBER,
        MIN_NUMBER,
        POOL_SIZE,
    },
    reveal::RevealEvent,
    session::RollerDisplay,
    test_helpers::*,
};
use std::collections::HashSet;

#[tokio::test(start_paused = true)]
async fn draw_one__commits_number_to_history() {
    // given
    let mut ctx = TestContext::new();

    // when
    let drawn = ctx.draw_one().await;

    // then
    let view = ctx.session().view();
    assert!((MIN_NUMBER..=MAX_NUMBER).contains(&drawn));
    assert_eq!(view.history, vec![drawn]);
    assert_eq!(view.latest, Some(drawn));
    assert_eq!(view.remaining, 74);
    assert_eq!(view.display, RollerDisplay::Landed(drawn));
    assert!(!view.is_revealing);
}

#[tokio::test(start_paused = true)]
async fn draw_one__history_hides_number_until_reveal_completes() {
    // given
    let mut ctx = TestContext::new();
    ctx.session().start_roll();

    // when
    let drawn = ctx.session().stop_and_draw().unwrap();

    // then
    let view = ctx.session().view();
    assert!(view.history.is_empty());
    assert_eq!(view.latest, None);
    assert_eq!(view.remaining, 75);
    assert_eq!(ctx.saved_snapshot().current_number, Some(drawn));

    ctx.finish_reveal().await;
    assert_eq!(ctx.session().view().history, vec![drawn]);
}

#[tokio::test(start_paused = true)]
async fn full_game__draws_every_number_exactly_once() {
    // given
    let mut ctx = TestContext::new();

    // when
    let mut seen = HashSet::new();
    for _ in 0..POOL_SIZE {
        let drawn = ctx.draw_one().await;
        assert!(seen.insert(drawn), "{drawn} drawn twice");
    }

    // then
    let view = ctx.session().view();
    assert!(view.is_over);
    assert_eq!(view.remaining, 0);
    assert_eq!(seen.len(), POOL_SIZE);
    assert!(!ctx.session().start_roll());
    assert!(!ctx.session().is_rolling());
}

#[tokio::test(start_paused = true)]
async fn stop_and_draw__without_roll_changes_nothing() {
    let mut ctx = TestContext::new();

    assert_eq!(ctx.session().stop_and_draw(), None);
    assert!(ctx.drain_events().is_empty());
    assert!(ctx.session().view().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_roll__twice_is_a_single_roll() {
    let mut ctx = TestContext::new();

    assert!(ctx.session().start_roll());
    assert!(!ctx.session().start_roll());
    assert!(ctx.session().is_rolling());
}

#[tokio::test(start_paused = true)]
async fn reveal__emits_exactly_one_completion_ending_on_target() {
    // given
    let mut ctx = TestContext::new();
    ctx.session().start_roll();
    let drawn = ctx.session().stop_and_draw().unwrap();

    // when
    let events = ctx.finish_reveal().await;
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    let trailing = ctx.drain_events();

    // then
    let completions = events
        .iter()
        .filter(|event| matches!(event, RevealEvent::Complete { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(trailing.is_empty());
    let last_frame = events.iter().rev().find_map(|event| match event {
        RevealEvent::Frame { frame, .. } => Some(*frame),
        RevealEvent::Complete { .. } => None,
    });
    assert_eq!(last_frame.and_then(|frame| frame.value()), Some(drawn));
}
