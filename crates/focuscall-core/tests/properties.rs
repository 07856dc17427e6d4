//! Property tests for round accounting and skip equivalence.

use focuscall_core::events::Event;
use focuscall_core::media::MediaCatalog;
use focuscall_core::timer::{Command, SessionConfig, SessionEngine, SessionEvent, SessionPhase, StepType};
use proptest::prelude::*;

fn started(config: SessionConfig) -> SessionEngine {
    let mut engine = SessionEngine::new(MediaCatalog::with_seed(0));
    engine.handle(SessionEvent::OpenCall);
    engine.handle(SessionEvent::Start(config));
    engine
}

fn state(engine: &SessionEngine) -> (SessionPhase, u32, bool, u32) {
    let p = engine.progress();
    (engine.phase(), p.current_round, p.is_break_phase, p.remaining_seconds)
}

proptest! {
    #[test]
    fn full_run_visits_every_stage_once(rounds in 1u32..6, focus in 1u32..5, brk in 1u32..5) {
        let config = SessionConfig::new(rounds, focus, brk).unwrap();
        let mut engine = SessionEngine::new(MediaCatalog::with_seed(0));
        engine.handle(SessionEvent::OpenCall);

        let mut stages = Vec::new();
        let mut records = 0;
        let mut collect = |commands: Vec<Command>, stages: &mut Vec<(u32, StepType)>| {
            for command in commands {
                match command {
                    Command::Notify(Event::StageStarted { round, step_type, .. }) => stages.push((round, step_type)),
                    Command::RecordCompletion => records += 1,
                    _ => {}
                }
            }
        };

        collect(engine.handle(SessionEvent::Start(config)), &mut stages);
        let mut ticks = 0u64;
        while engine.phase() == SessionPhase::Running {
            collect(engine.handle(SessionEvent::Tick), &mut stages);
            ticks += 1;
            prop_assert!(ticks <= config.total_seconds());
        }

        prop_assert_eq!(engine.phase(), SessionPhase::Config);
        prop_assert_eq!(ticks, config.total_seconds());
        prop_assert_eq!(records, 1);

        let focus_stages = stages.iter().filter(|(_, t)| *t == StepType::Focus).count();
        let break_stages = stages.iter().filter(|(_, t)| *t == StepType::Break).count();
        prop_assert_eq!(focus_stages, rounds as usize);
        prop_assert_eq!(break_stages, rounds as usize);

        let rounds_seen: Vec<u32> = stages.iter().map(|(r, _)| *r).collect();
        prop_assert!(rounds_seen.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(rounds_seen.first().copied(), Some(1));
        prop_assert_eq!(rounds_seen.last().copied(), Some(rounds));
    }

    #[test]
    fn skip_matches_waiting_out_the_stage(
        rounds in 1u32..4,
        focus in 1u32..8,
        brk in 1u32..8,
        lead in 0u32..20,
    ) {
        let config = SessionConfig::new(rounds, focus, brk).unwrap();
        let mut waited = started(config);
        let mut skipped = started(config);

        // Walk both to the same point somewhere in the run.
        for _ in 0..lead {
            if waited.phase() != SessionPhase::Running {
                break;
            }
            waited.handle(SessionEvent::Tick);
            skipped.handle(SessionEvent::Tick);
        }
        prop_assume!(waited.phase() == SessionPhase::Running);

        let k = waited.progress().remaining_seconds;
        prop_assert!(k > 0);
        for _ in 0..k {
            waited.handle(SessionEvent::Tick);
        }
        skipped.handle(SessionEvent::Skip);

        prop_assert_eq!(state(&waited), state(&skipped));
    }
}
