use clap::{Subcommand, ValueEnum};
use focusguard_core::{Command, Phase, Response};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the session (installs blocking rules in Focus)
    Start,
    /// Toggle pause
    Pause,
    /// Return to an idle Focus phase and remove blocking rules
    Reset,
    /// Print the current state as JSON
    Status,
    /// Overwrite the remaining time; only applies while idle
    SetDuration {
        /// Minutes to set (clamped to 1..=120)
        minutes: u32,
        /// Optionally switch the active phase too
        #[arg(long, value_enum)]
        mode: Option<PhaseArg>,
    },
}

/// clap-friendly mirror of the core phase enum.
#[derive(Clone, Copy, ValueEnum)]
pub enum PhaseArg {
    Focus,
    ShortBreak,
    LongBreak,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Focus => Phase::Focus,
            PhaseArg::ShortBreak => Phase::ShortBreak,
            PhaseArg::LongBreak => Phase::LongBreak,
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = super::open_service()?;

    let command = match action {
        TimerAction::Start => Command::StartTimer,
        TimerAction::Pause => Command::PauseTimer,
        TimerAction::Reset => Command::ResetTimer,
        TimerAction::Status => Command::GetState,
        TimerAction::SetDuration { minutes, mode } => Command::SetTimerDuration {
            minutes,
            mode: mode.map(Phase::from),
        },
    };

    let response = service.dispatch(command);
    service.save_snapshot();

    match response {
        Response::State(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        ack => println!("{}", serde_json::to_string(&ack)?),
    }
    Ok(())
}
