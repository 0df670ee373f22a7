//! Process event loop.
//!
//! One task on a current-thread runtime selects over termination signals,
//! live poses from the bus, and operator commands. Every event is handled to
//! completion before the next is taken, so the controller needs no locking.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::future::Future;
use std::path::PathBuf;

use canvas::engine::Action;
use canvas::input::Key;
use msgs::Pose;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::bus::Bus;
use crate::config::AppConfig;
use crate::console::Command;
use crate::controller::WorldStateController;
use crate::descriptor::MapLoadError;
use crate::transport::BusTransport;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("startup map failed to load: {0}")]
    MapLoad(#[from] MapLoadError),
    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Run until `exit`, a termination signal, or a console read error.
///
/// The blank arena is published first, then `map` if given. End of console
/// input stops command handling but live poses keep flowing until shutdown.
pub async fn run<R, S>(config: AppConfig, bus: Bus, map: Option<PathBuf>, input: R, shutdown: S) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let transport = BusTransport::new(bus.clone(), config.topics.clone());
    let mut poses = bus.subscribe(&config.topics.pose);
    let mut controller = WorldStateController::new(transport, &config);
    controller.update_map();
    if let Some(path) = map.as_deref() {
        present(controller.load_map(path)?);
    }

    info!(pose_topic = %config.topics.pose, "world state editor running");

    let mut lines = input.lines();
    let mut console_open = true;
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("termination signal received");
                break Ok(());
            }
            Some(bytes) = poses.recv() => on_pose_bytes(&mut controller, &bytes),
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) => {
                    handle_line(&mut controller, &line);
                    if controller.is_shut_down() {
                        break Ok(());
                    }
                }
                Ok(None) => {
                    info!("console input closed");
                    console_open = false;
                }
                Err(e) => break Err(AppError::Io(e)),
            },
        }
    };

    controller.shutdown();
    outcome
}

fn on_pose_bytes(controller: &mut WorldStateController<BusTransport>, bytes: &[u8]) {
    match msgs::decode_message::<Pose>(bytes) {
        Ok(pose) => present(controller.on_live_pose(&pose)),
        Err(e) => warn!(error = %e, "dropping undecodable pose"),
    }
}

fn handle_line(controller: &mut WorldStateController<BusTransport>, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, line, "bad command");
            eprintln!("error: {e}");
            return;
        }
    };
    debug!(?command, "command");

    match command {
        Command::Down(pt) => present(controller.on_pointer_down(pt)),
        Command::Drag(pt) => present(controller.on_pointer_drag(pt)),
        Command::Up(pt) => present(controller.on_pointer_up(pt)),
        Command::Key(name) => present(controller.on_key(&Key::new(name))),
        Command::Open(path) => match controller.open_map(Some(&path)) {
            Ok(actions) => present(actions),
            Err(e) => eprintln!("error: {e}"),
        },
        Command::Cancel => match controller.open_map(None) {
            Ok(actions) => present(actions),
            Err(e) => eprintln!("error: {e}"),
        },
        Command::Reset => controller.reset(),
        Command::Pose { x, y, yaw } => {
            if let Err(e) = controller.transport().publish_live_pose(&Pose::planar(x, y, yaw)) {
                warn!(error = %e, "live pose injection failed");
            }
        }
        Command::Status => match serde_json::to_string(&controller.status()) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "status serialization failed"),
        },
        Command::Exit => {
            controller.shutdown();
        }
    }
    debug!(mode = ?controller.engine().mode, "command handled");
}

/// Hand front-end actions to the (headless) display.
fn present(actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::SetCursor(cursor) => info!(cursor, "cursor"),
            Action::RenderNeeded => debug!("redraw"),
            Action::PublishPose(_) | Action::MapChanged => {}
        }
    }
}
