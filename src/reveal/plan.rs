use crate::{
    game::{
        MAX_NUMBER,
        MIN_NUMBER,
    },
    phase::Phase,
};
use rand::{
    Rng,
    seq::IndexedRandom,
};
use std::{
    ops::RangeInclusive,
    time::Duration,
};

const INSTANT_DELAY: Duration = Duration::from_millis(300);
const INSTANT_SETTLE: Duration = Duration::from_millis(200);
const CLIMAX_SETTLE: Duration = Duration::from_millis(500);

const REEL_BASE_STEP_MS: f64 = 60.0;
const REEL_MAX_STEP_MS: f64 = 800.0;
const REEL_SLOWDOWN_WINDOW: u32 = 8;
const REEL_FIRST_SLOWDOWN: f64 = 1.15;
const REEL_SECOND_SLOWDOWN: f64 = 1.5;
const REEL_STAGGER: Duration = Duration::from_millis(30);
const TENS_MAX_DIGIT: u8 = 7;
const ONES_MAX_DIGIT: u8 = 9;

const DECEL_STEPS: RangeInclusive<u32> = 20..=30;
const DECEL_BASE_MS: f64 = 50.0;
const DECEL_GROWTH: f64 = 1.12;
const DECEL_MAX_MS: f64 = 700.0;

const BLACKOUT_MS: RangeInclusive<u64> = 1500..=2500;

const DRUM_ROLL_TOTAL: Duration = Duration::from_millis(3000);
const DRUM_ROLL_BEAT: Duration = Duration::from_millis(50);

const COUNTDOWN_FROM: u8 = 3;
const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

const SLIDE_STEPS: RangeInclusive<u8> = 15..=25;
const SLIDE_BASE_MS: u64 = 40;
const SLIDE_INCREMENT_MS: u64 = 20;

/// Step-count tiers for a single reel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReelTier {
    Medium,
    Long,
}

impl ReelTier {
    pub fn steps(self) -> RangeInclusive<u32> {
        match self {
            ReelTier::Medium => 26..=34,
            ReelTier::Long => 58..=70,
        }
    }
}

/// What the roller shows during one stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frame {
    Blank,
    Number(u8),
    Digits { tens: u8, ones: u8 },
    Countdown(u8),
}

impl Frame {
    /// Bingo number this frame reads as, if any.
    pub fn value(&self) -> Option<u8> {
        match *self {
            Frame::Number(n) => Some(n),
            Frame::Digits { tens, ones } => Some(tens * 10 + ones),
            Frame::Blank | Frame::Countdown(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stage {
    /// Wait before showing `frame`, measured from the previous stage.
    pub delay: Duration,
    pub frame: Frame,
}

impl Stage {
    fn new(delay: Duration, frame: Frame) -> Self {
        Self { delay, frame }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevealMode {
    Instant,
    Reels,
    DeceleratingRoll,
    Blackout,
    DrumRoll,
    Countdown,
    LinearSlide,
}

impl RevealMode {
    pub const CLIMAX_MODES: [RevealMode; 6] = [
        RevealMode::Reels,
        RevealMode::DeceleratingRoll,
        RevealMode::Blackout,
        RevealMode::DrumRoll,
        RevealMode::Countdown,
        RevealMode::LinearSlide,
    ];

    pub fn choose<R: Rng + ?Sized>(phase: Phase, rng: &mut R) -> Self {
        match phase {
            Phase::Normal => RevealMode::Instant,
            Phase::Climax => *Self::CLIMAX_MODES
                .choose(rng)
                .unwrap_or(&RevealMode::Reels),
        }
    }
}

/// Finite, ordered list of stages ending on the target, followed by a
/// settle pause before completion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevealPlan {
    pub mode: RevealMode,
    pub target: u8,
    pub stages: Vec<Stage>,
    pub settle: Duration,
}

impl RevealPlan {
    pub fn build<R: Rng + ?Sized>(mode: RevealMode, target: u8, rng: &mut R) -> Self {
        let stages = match mode {
            RevealMode::Instant => vec![Stage::new(INSTANT_DELAY, Frame::Number(target))],
            RevealMode::Reels => reels(target, rng),
            RevealMode::DeceleratingRoll => decelerating_roll(target, rng),
            RevealMode::Blackout => blackout(target, rng),
            RevealMode::DrumRoll => drum_roll(target, rng),
            RevealMode::Countdown => countdown(target),
            RevealMode::LinearSlide => linear_slide(target, rng),
        };
        let settle = match mode {
            RevealMode::Instant => INSTANT_SETTLE,
            _ => CLIMAX_SETTLE,
        };
        Self {
            mode,
            target,
            stages,
            settle,
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.delay).sum::<Duration>() + self.settle
    }

    pub fn final_frame(&self) -> Option<Frame> {
        self.stages.last().map(|s| s.frame)
    }
}

fn millis(ms: f64) -> Duration {
    Duration::from_micros((ms * 1000.0).round() as u64)
}

fn random_number_except<R: Rng + ?Sized>(rng: &mut R, excluded: &[u8]) -> u8 {
    loop {
        let n = rng.random_range(MIN_NUMBER..=MAX_NUMBER);
        if !excluded.contains(&n) {
            return n;
        }
    }
}

fn random_digit_except<R: Rng + ?Sized>(rng: &mut R, max: u8, excluded: &[u8]) -> u8 {
    loop {
        let d = rng.random_range(0..=max);
        if !excluded.contains(&d) {
            return d;
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Reel {
    Tens,
    Ones,
}

struct ReelRun {
    reel: Reel,
    max_digit: u8,
    target: u8,
    steps: u32,
    slowdown: f64,
    offset: Duration,
}

impl ReelRun {
    /// Absolute time and digit of every step. Spinning digits skip both the
    /// previous digit and the target digit; the last step lands on target.
    fn spin<R: Rng + ?Sized>(&self, start: u8, rng: &mut R) -> Vec<(Duration, Reel, u8)> {
        let mut events = Vec::with_capacity(self.steps as usize);
        let mut at = self.offset;
        let mut delay_ms = REEL_BASE_STEP_MS;
        let mut current = start;
        for step in 1..=self.steps {
            current = if step == self.steps {
                self.target
            } else {
                random_digit_except(rng, self.max_digit, &[current, self.target])
            };
            events.push((at, self.reel, current));
            let remaining = self.steps - step;
            delay_ms = if remaining <= REEL_SLOWDOWN_WINDOW {
                (delay_ms * self.slowdown).min(REEL_MAX_STEP_MS)
            } else {
                REEL_BASE_STEP_MS
            };
            at += millis(delay_ms);
        }
        events
    }
}

fn reels<R: Rng + ?Sized>(target: u8, rng: &mut R) -> Vec<Stage> {
    let target_tens = target / 10;
    let target_ones = target % 10;
    let tens_first = rng.random_bool(0.5);

    let first_steps = rng.random_range(ReelTier::Medium.steps());
    let second_steps = rng.random_range(ReelTier::Long.steps());
    let (tens_steps, ones_steps) = if tens_first {
        (first_steps, second_steps)
    } else {
        (second_steps, first_steps)
    };
    let (tens_slowdown, ones_slowdown) = if tens_first {
        (REEL_FIRST_SLOWDOWN, REEL_SECOND_SLOWDOWN)
    } else {
        (REEL_SECOND_SLOWDOWN, REEL_FIRST_SLOWDOWN)
    };
    let (tens_offset, ones_offset) = if tens_first {
        (Duration::ZERO, REEL_STAGGER)
    } else {
        (REEL_STAGGER, Duration::ZERO)
    };

    let mut tens = random_digit_except(rng, TENS_MAX_DIGIT, &[target_tens]);
    let mut ones = random_digit_except(rng, ONES_MAX_DIGIT, &[target_ones]);
    let mut stages = vec![Stage::new(Duration::ZERO, Frame::Digits { tens, ones })];

    let tens_run = ReelRun {
        reel: Reel::Tens,
        max_digit: TENS_MAX_DIGIT,
        target: target_tens,
        steps: tens_steps,
        slowdown: tens_slowdown,
        offset: tens_offset,
    };
    let ones_run = ReelRun {
        reel: Reel::Ones,
        max_digit: ONES_MAX_DIGIT,
        target: target_ones,
        steps: ones_steps,
        slowdown: ones_slowdown,
        offset: ones_offset,
    };
    let mut events = tens_run.spin(tens, rng);
    events.extend(ones_run.spin(ones, rng));
    events.sort_by_key(|(at, _, _)| *at);

    let mut last = Duration::ZERO;
    for (at, reel, digit) in events {
        match reel {
            Reel::Tens => tens = digit,
            Reel::Ones => ones = digit,
        }
        stages.push(Stage::new(at - last, Frame::Digits { tens, ones }));
        last = at;
    }
    stages
}

fn decelerating_roll<R: Rng + ?Sized>(target: u8, rng: &mut R) -> Vec<Stage> {
    let steps = rng.random_range(DECEL_STEPS);
    let mut stages = Vec::with_capacity(steps as usize + 1);
    let mut delay_ms = 0.0;
    let mut previous = target;
    for _ in 0..steps {
        let n = random_number_except(rng, &[target, previous]);
        stages.push(Stage::new(millis(delay_ms), Frame::Number(n)));
        previous = n;
        delay_ms = if delay_ms == 0.0 {
            DECEL_BASE_MS
        } else {
            (delay_ms * DECEL_GROWTH).min(DECEL_MAX_MS)
        };
    }
    stages.push(Stage::new(millis(delay_ms), Frame::Number(target)));
    stages
}

fn blackout<R: Rng + ?Sized>(target: u8, rng: &mut R) -> Vec<Stage> {
    let dark = Duration::from_millis(rng.random_range(BLACKOUT_MS));
    vec![
        Stage::new(Duration::ZERO, Frame::Blank),
        Stage::new(dark, Frame::Number(target)),
    ]
}

fn drum_roll<R: Rng + ?Sized>(target: u8, rng: &mut R) -> Vec<Stage> {
    let beats = (DRUM_ROLL_TOTAL.as_millis() / DRUM_ROLL_BEAT.as_millis()) as usize;
    let mut stages = Vec::with_capacity(beats + 1);
    let mut previous = target;
    for beat in 0..beats {
        let n = random_number_except(rng, &[target, previous]);
        let delay = if beat == 0 {
            Duration::ZERO
        } else {
            DRUM_ROLL_BEAT
        };
        stages.push(Stage::new(delay, Frame::Number(n)));
        previous = n;
    }
    stages.push(Stage::new(DRUM_ROLL_BEAT, Frame::Number(target)));
    stages
}

fn countdown(target: u8) -> Vec<Stage> {
    let mut stages: Vec<Stage> = (1..=COUNTDOWN_FROM)
        .rev()
        .enumerate()
        .map(|(i, tick)| {
            let delay = if i == 0 { Duration::ZERO } else { COUNTDOWN_TICK };
            Stage::new(delay, Frame::Countdown(tick))
        })
        .collect();
    stages.push(Stage::new(COUNTDOWN_TICK, Frame::Number(target)));
    stages
}

fn linear_slide<R: Rng + ?Sized>(target: u8, rng: &mut R) -> Vec<Stage> {
    let steps = rng.random_range(SLIDE_STEPS);
    let span = i32::from(MAX_NUMBER);
    let mut stages = Vec::with_capacity(usize::from(steps) + 1);
    for i in 0..steps {
        let offset = i32::from(target) - 1 - i32::from(steps) + i32::from(i);
        let n = (offset.rem_euclid(span) + 1) as u8;
        let delay = if i == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(SLIDE_BASE_MS + SLIDE_INCREMENT_MS * u64::from(i))
        };
        stages.push(Stage::new(delay, Frame::Number(n)));
    }
    let last = SLIDE_BASE_MS + SLIDE_INCREMENT_MS * u64::from(steps);
    stages.push(Stage::new(Duration::from_millis(last), Frame::Number(target)));
    stages
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;
    use rand::{
        SeedableRng,
        rngs::StdRng,
    };

    const ALL_MODES: [RevealMode; 7] = [
        RevealMode::Instant,
        RevealMode::Reels,
        RevealMode::DeceleratingRoll,
        RevealMode::Blackout,
        RevealMode::DrumRoll,
        RevealMode::Countdown,
        RevealMode::LinearSlide,
    ];

    fn tens_digits(plan: &RevealPlan) -> Vec<u8> {
        plan.stages
            .iter()
            .filter_map(|s| match s.frame {
                Frame::Digits { tens, .. } => Some(tens),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn choose__normal_phase_is_instant() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(
                RevealMode::choose(Phase::Normal, &mut rng),
                RevealMode::Instant
            );
        }
    }

    #[test]
    fn choose__climax_phase_picks_a_dramatized_mode() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let mode = RevealMode::choose(Phase::Climax, &mut rng);
            assert!(RevealMode::CLIMAX_MODES.contains(&mode));
        }
    }

    #[test]
    fn instant__single_short_stage() {
        let mut rng = StdRng::seed_from_u64(3);

        let plan = RevealPlan::build(RevealMode::Instant, 42, &mut rng);

        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.final_frame(), Some(Frame::Number(42)));
        assert_eq!(plan.total_duration(), Duration::from_millis(500));
    }

    #[test]
    fn reels__single_digit_target_lands_tens_on_zero() {
        // given
        let mut rng = StdRng::seed_from_u64(4);

        // when
        let plan = RevealPlan::build(RevealMode::Reels, 7, &mut rng);

        // then
        assert_eq!(
            plan.final_frame(),
            Some(Frame::Digits { tens: 0, ones: 7 })
        );
        let tens = tens_digits(&plan);
        assert!(tens.len() > 1);
        assert!(tens.iter().all(|d| *d <= TENS_MAX_DIGIT));
    }

    #[test]
    fn reels__step_delays_never_exceed_cap() {
        let mut rng = StdRng::seed_from_u64(5);

        let plan = RevealPlan::build(RevealMode::Reels, 64, &mut rng);

        assert!(
            plan.stages
                .iter()
                .all(|s| s.delay <= millis(REEL_MAX_STEP_MS))
        );
        assert_eq!(plan.settle, CLIMAX_SETTLE);
    }

    #[test]
    fn reels__both_reels_run_tiered_step_counts() {
        let mut rng = StdRng::seed_from_u64(6);

        let plan = RevealPlan::build(RevealMode::Reels, 33, &mut rng);

        // one starting frame plus one frame per reel step
        let steps = plan.stages.len() as u32 - 1;
        let min = ReelTier::Medium.steps().start() + ReelTier::Long.steps().start();
        let max = ReelTier::Medium.steps().end() + ReelTier::Long.steps().end();
        assert!((min..=max).contains(&steps));
    }

    #[test]
    fn drum_roll__lasts_fixed_duration() {
        let mut rng = StdRng::seed_from_u64(7);

        let plan = RevealPlan::build(RevealMode::DrumRoll, 10, &mut rng);

        assert_eq!(plan.total_duration(), DRUM_ROLL_TOTAL + CLIMAX_SETTLE);
    }

    #[test]
    fn countdown__ticks_three_two_one() {
        let plan = RevealPlan::build(RevealMode::Countdown, 61, &mut StdRng::seed_from_u64(8));

        let frames: Vec<Frame> = plan.stages.iter().map(|s| s.frame).collect();

        assert_eq!(
            frames,
            vec![
                Frame::Countdown(3),
                Frame::Countdown(2),
                Frame::Countdown(1),
                Frame::Number(61),
            ]
        );
    }

    #[test]
    fn linear_slide__wraps_below_one() {
        let mut rng = StdRng::seed_from_u64(9);

        let plan = RevealPlan::build(RevealMode::LinearSlide, 3, &mut rng);

        let values: Vec<u8> = plan.stages.iter().filter_map(|s| s.frame.value()).collect();
        assert_eq!(values[values.len() - 3..], [1, 2, 3]);
        assert!(values.iter().all(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n)));
    }

    proptest! {
        #[test]
        fn build__target_only_shown_on_final_stage(
            seed in any::<u64>(),
            target in MIN_NUMBER..=MAX_NUMBER,
            mode_idx in 0usize..ALL_MODES.len(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = RevealPlan::build(ALL_MODES[mode_idx], target, &mut rng);
            let (last, earlier) = plan.stages.split_last().unwrap();
            prop_assert_eq!(last.frame.value(), Some(target));
            for stage in earlier {
                prop_assert_ne!(stage.frame.value(), Some(target));
            }
        }
    }
}
