//! Angr entry point
//!
//! Runs a level headless with scripted launches and logs the HUD.
//! Usage: `angr [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
use angr::sim::{ArcadeWorld, GameStatus, HeadlessStage, Level, Simulation};
#[cfg(not(target_arch = "wasm32"))]
use angr::{AssetContext, GameScreen, Screen, Settings};

/// Fixed frame delta for the headless loop
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after this many frames
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: u64 = 60 * 120;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Angr (headless) starting...");

    let path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let settings = Settings::load_or_default(path.as_deref());

    let world = ArcadeWorld::new(settings.gravity);
    let sim = Simulation::new(world, HeadlessStage::new(), settings);
    let mut screen = GameScreen::new(Level::Proving, sim);
    let mut assets = AssetContext::new();

    screen.preload(&mut assets);
    screen.show(&assets);

    let mut frame = 0;
    while frame < MAX_FRAMES {
        // One scripted launch per second, a little harder each time
        if frame % 60 == 30 && screen.hud().status == GameStatus::InProgress {
            let launches = screen.simulation().state().launches() as f32;
            let velocity = glam::Vec2::new(400.0 + launches * 150.0, -100.0);
            match screen.simulation_mut().launch(glam::Vec2::new(200.0, 300.0), velocity) {
                Ok(id) => log::info!("Launched {:?} at {:?}", id, velocity),
                Err(e) => log::debug!("Launch refused: {}", e),
            }
        }

        let Some(report) = screen.render(FRAME_DT) else {
            break;
        };
        for event in &report.events {
            log::debug!("{:?} (+{})", event.event, event.points);
        }
        if frame % 60 == 0 {
            log::info!("HUD: {:?}", report.hud);
        }
        if report.hud.status != GameStatus::InProgress {
            break;
        }
        frame += 1;
    }

    let hud = screen.hud();
    println!(
        "{:?}: score {}, {}/{} targets left, {} attempts left after {} frames",
        hud.status, hud.score, hud.targets_remaining, hud.targets_total, hud.attempts_remaining, frame
    );

    screen.unload(&mut assets);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on wasm; there is no headless runner
}
