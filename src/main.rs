//! Orbit Arena headless runner
//!
//! Drives a match without a renderer and prints the round stats as JSON.
//!
//! Usage: `orbit-arena [--tuning FILE] [--seed N] [--seats N] [--seconds S] [--difficulty D]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use orbit_arena::consts::SIM_DT;
    use orbit_arena::harness::{Authority, IntentSender, SoloHarness};
    use orbit_arena::sim::{GameState, IntentKind, Seat};
    use orbit_arena::{Difficulty, MatchSettings, Tuning};

    struct Options {
        tuning: Option<String>,
        seed: u64,
        seats: u8,
        seconds: f32,
        difficulty: Difficulty,
    }

    fn parse_args() -> Result<Options, Box<dyn Error>> {
        let mut options = Options {
            tuning: None,
            seed: 1,
            seats: 1,
            seconds: 60.0,
            difficulty: Difficulty::Normal,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("missing value for {arg}"));
            match arg.as_str() {
                "--tuning" => options.tuning = Some(value()?),
                "--seed" => options.seed = value()?.parse()?,
                "--seats" => options.seats = value()?.parse()?,
                "--seconds" => options.seconds = value()?.parse()?,
                "--difficulty" => {
                    let name = value()?;
                    options.difficulty =
                        Difficulty::from_str(&name).ok_or_else(|| format!("unknown difficulty {name}"))?;
                }
                other => return Err(format!("unknown argument {other}").into()),
            }
        }
        Ok(options)
    }

    /// Aim a seat at the ball closest to escaping
    fn autopilot(state: &GameState, seat: Seat) -> Option<f32> {
        state.paddle_for_seat(seat)?;
        state
            .balls
            .iter()
            .filter(|b| !b.escaped)
            .max_by(|a, b| {
                let da = state.arena.distance_from_center(a.pos);
                let db = state.arena.distance_from_center(b.pos);
                da.total_cmp(&db)
            })
            .map(|b| state.arena.to_polar(b.pos).1)
    }

    fn run_solo(settings: MatchSettings, tuning: Tuning, seconds: f32) -> GameState {
        let mut solo = SoloHarness::new(settings, tuning);
        let mut elapsed = 0.0;
        while elapsed < seconds && !solo.is_over() {
            if let Some(angle) = autopilot(solo.state(), 0) {
                solo.set_target_angle(angle);
            }
            let out = solo.frame(SIM_DT);
            for event in &out.events {
                log::debug!("{:?}", event);
            }
            elapsed += SIM_DT;
        }
        solo.state().clone()
    }

    fn run_authority(settings: MatchSettings, tuning: Tuning, seconds: f32) -> Result<GameState, Box<dyn Error>> {
        let mut host = Authority::new(&settings, tuning);
        let seats: Vec<IntentSender> = (0..settings.seats)
            .map(|seat| host.connect(seat))
            .collect::<Result<_, _>>()?;

        let mut elapsed = 0.0;
        let mut broadcasts = 0usize;
        while elapsed < seconds && !host.is_over() {
            for seat in &seats {
                if let Some(angle) = autopilot(host.state(), seat.seat()) {
                    seat.try_submit(IntentKind::SetTargetAngle { angle })?;
                }
            }
            broadcasts += host.advance(SIM_DT).len();
            elapsed += SIM_DT;
        }
        log::info!("{} ticks, {} messages", host.tick(), broadcasts);
        Ok(host.state().clone())
    }

    pub fn main() -> Result<(), Box<dyn Error>> {
        env_logger::init();
        let options = parse_args()?;

        let tuning = match &options.tuning {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };
        tuning.validate()?;

        let mut settings = MatchSettings::multiplayer(options.seed, options.seats);
        settings.difficulty = options.difficulty;
        log::info!(
            "Orbit Arena starting: seed {}, {} seat(s), {}",
            settings.seed,
            settings.seats,
            settings.difficulty.as_str()
        );

        let state = if settings.is_solo() {
            run_solo(settings, tuning, options.seconds)
        } else {
            run_authority(settings, tuning, options.seconds)?
        };

        println!("{}", serde_json::to_string_pretty(&state.stats)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library is driven by the host page on wasm
}
