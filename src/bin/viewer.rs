//! Viewer entry point: one window, one scene session.

use orrery::{OrreryApp, SessionConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let app = OrreryApp::new(SessionConfig::from_env())?;
    app.run()
}
