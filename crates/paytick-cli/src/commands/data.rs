use clap::Subcommand;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum DataAction {
    /// Reset the timer and delete all saved settings of the active mode
    Clear,
}

pub fn run(action: DataAction, quiet: bool) -> CliResult {
    let mut session = Session::open(quiet)?;

    match action {
        DataAction::Clear => {
            let event = session.manager.engine_mut().clear_all_data();
            print_json(&event)?;
        }
    }
    Ok(())
}
