//! Hopforge headless runner
//!
//! Generates a level (or a race), drives it with a scripted input pattern
//! and logs every event. Useful for replaying a seed without a renderer.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use anyhow::{Context, Result};
    use clap::{Parser, ValueEnum};

    use hopforge::sim::{Game, GameEvent, GamePhase, TickInput, advance, normalize_seed};
    use hopforge::{Loadout, RunRecords, WeaponKind};

    /// Frame delta the runner feeds the simulation
    const FRAME_DT: f32 = 1.0 / 60.0;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum ModeArg {
        Classic,
        Race,
        Speedrun,
    }

    /// Run a level headlessly and report what happened
    #[derive(Debug, Parser)]
    #[command(name = "hopforge", version, about)]
    struct Args {
        /// Seed for the starting classic level
        #[arg(long)]
        seed: Option<i64>,

        /// Starting classic level
        #[arg(long, default_value_t = 1)]
        level: u32,

        #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
        mode: ModeArg,

        /// Rounds in race mode
        #[arg(long, default_value_t = 5)]
        rounds: u32,

        /// Frames to simulate
        #[arg(long, default_value_t = 600)]
        frames: u32,

        /// Equipped weapon (pulse, rapid, scatter)
        #[arg(long)]
        weapon: Option<String>,

        /// Jump upgrade tier
        #[arg(long, default_value_t = 0)]
        jump_tier: u8,

        /// Speed upgrade tier
        #[arg(long, default_value_t = 0)]
        speed_tier: u8,

        /// Own and enable the double jump
        #[arg(long)]
        double_jump: bool,

        /// Records ledger to read seeds from and write results back to
        #[arg(long)]
        records: Option<PathBuf>,

        /// Print the final world snapshot as JSON
        #[arg(long)]
        json: bool,
    }

    /// Run right, tap jump on a cadence, shoot whenever armed
    fn scripted_input(frame: u32) -> TickInput {
        TickInput {
            right: frame % 120 < 100,
            jump: frame % 45 < 4,
            shoot: frame % 10 == 0,
            ..Default::default()
        }
    }

    fn load_records(path: &PathBuf) -> Result<RunRecords> {
        if !path.exists() {
            return Ok(RunRecords::new());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let records = RunRecords::from_json(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(records)
    }

    fn entropy() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let args = Args::parse();

        let weapon = args
            .weapon
            .as_deref()
            .map(str::parse::<WeaponKind>)
            .transpose()?;
        let loadout = Loadout {
            jump_tier: args.jump_tier,
            speed_tier: args.speed_tier,
            double_jump_owned: args.double_jump,
            weapon,
            ..Default::default()
        };

        let mut records = match &args.records {
            Some(path) => load_records(path)?,
            None => RunRecords::new(),
        };

        let mut game = match args.mode {
            ModeArg::Classic => {
                let mut seeds: BTreeMap<u32, u32> = records.level_seeds.clone();
                if let Some(seed) = args.seed {
                    seeds.insert(args.level.max(1), normalize_seed(seed));
                }
                Game::classic(loadout, args.level, seeds, entropy())
            }
            ModeArg::Race => Game::race(loadout, args.rounds),
            ModeArg::Speedrun => Game::speedrun(loadout),
        };
        log::info!(
            "Starting {:?} at level {} (seed {})",
            game.mode,
            game.level,
            game.world.seed
        );

        let mut coins: u64 = 0;
        for frame in 0..args.frames {
            for event in advance(&mut game, &scripted_input(frame), FRAME_DT) {
                coins += event.coins() as u64;
                match &event {
                    GameEvent::Landed | GameEvent::Jumped { .. } | GameEvent::Shot { .. } => {
                        log::debug!("[{}] {:?}", frame, event)
                    }
                    _ => log::info!("[{}] {:?}", frame, event),
                }
                records.apply(&event);
            }
            if game.phase == GamePhase::Finished {
                break;
            }
        }

        log::info!(
            "Done: level {}, round {}, {} coins earned",
            game.level,
            game.round,
            coins
        );

        if let Some(path) = &args.records {
            std::fs::write(path, records.to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }

        if args.json {
            println!("{}", serde_json::to_string_pretty(&game.world)?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the host on wasm32
}
