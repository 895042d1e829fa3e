#![allow(non_snake_case)]
use family_bingo::{
    phase::Phase,
    reveal::{
        RevealEvent,
        RevealMode,
    },
    test_helpers::*,
};

#[tokio::test(start_paused = true)]
async fn phase__switches_to_climax_at_trigger() {
    // given
    let mut ctx = TestContext::new();
    assert_eq!(ctx.session().set_climax_trigger(40), 40);

    // when
    for _ in 0..34 {
        ctx.draw_one().await;
    }
    let before = ctx.session().view();
    ctx.draw_one().await;
    let after = ctx.session().view();

    // then
    assert_eq!(before.remaining, 41);
    assert_eq!(before.phase, Phase::Normal);
    assert_eq!(after.remaining, 40);
    assert_eq!(after.phase, Phase::Climax);
}

#[tokio::test(start_paused = true)]
async fn manual_climax__applies_immediately_and_toggles_back() {
    let mut ctx = TestContext::new();

    assert!(ctx.session().toggle_manual_climax());
    assert_eq!(ctx.session().view().phase, Phase::Climax);
    assert!(ctx.saved_snapshot().is_manual_climax);

    assert!(!ctx.session().toggle_manual_climax());
    assert_eq!(ctx.session().view().phase, Phase::Normal);
}

#[tokio::test(start_paused = true)]
async fn climax_reveal__uses_a_dramatized_mode() {
    // given
    let mut ctx = TestContext::new();
    ctx.session().toggle_manual_climax();

    for _ in 0..10 {
        // when
        ctx.session().start_roll();
        let drawn = ctx.session().stop_and_draw().unwrap();
        let events = ctx.finish_reveal().await;

        // then
        let frames = events
            .iter()
            .filter(|event| matches!(event, RevealEvent::Frame { .. }))
            .count();
        assert!(frames > 1, "climax reveal showed a single frame");
        assert_eq!(ctx.session().view().latest, Some(drawn));
    }
}

#[tokio::test(start_paused = true)]
async fn normal_reveal__is_instant() {
    let mut ctx = TestContext::new();
    ctx.session().start_roll();
    ctx.session().stop_and_draw().unwrap();

    let events = ctx.finish_reveal().await;

    assert_eq!(events.len(), 2);
    assert!(!RevealMode::CLIMAX_MODES.contains(&RevealMode::Instant));
}

#[tokio::test(start_paused = true)]
async fn climax_trigger__clamped_into_range() {
    let mut ctx = TestContext::new();

    assert_eq!(ctx.session().set_climax_trigger(0), 1);
    assert_eq!(ctx.session().set_climax_trigger(-9), 1);
    assert_eq!(ctx.session().set_climax_trigger(75), 74);
    assert_eq!(ctx.saved_snapshot().climax_trigger_remaining.get(), 74);
}
