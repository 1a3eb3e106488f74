use clap::Subcommand;
use paytick_core::Namespace;
use serde_json::json;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum ModeAction {
    /// Print the active mode
    Show,
    /// Switch modes; the timer of the outgoing mode is reset
    Switch {
        /// "default" or "alternate"
        mode: Namespace,
    },
}

pub fn run(action: ModeAction, quiet: bool) -> CliResult {
    let mut session = Session::open(quiet)?;
    session.catch_up()?;

    match action {
        ModeAction::Show => {
            print_json(&json!({ "active": session.manager.active() }))?;
        }
        ModeAction::Switch { mode } => {
            let event = session.manager.switch_to(mode);
            session.print_outcome(event)?;
        }
    }
    Ok(())
}
