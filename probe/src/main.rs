mod scenario;

use clap::{Parser, ValueEnum};
use trapline::{
    AccessRule, CaptureMode, ConfigBuilder, Signal, TransferMode, TrapPlan, TrapSelection,
    OVERFLOW_CODE,
};

use crate::scenario::Scenario;

/// trapline probe command-line interface
#[derive(Parser)]
#[command(
    name = "trapline-probe",
    version,
    about = "Run one scenario under a trapline recovery point"
)]
struct Cli {
    /// How the recovery point is captured
    #[arg(long, value_enum, default_value_t = CaptureArg::Fast, env = "TRAPLINE_CAPTURE")]
    capture: CaptureArg,

    /// Which fault handlers to arm
    #[arg(long, value_enum, default_value_t = TrapsArg::Detect, env = "TRAPLINE_TRAPS")]
    traps: TrapsArg,

    /// Also arm SIGSEGV, treating faults with this CPU trap number as overflow
    #[arg(long, value_name = "TRAPNO")]
    access_vector: Option<usize>,

    /// How reported failures reach the guard [default: unwind, or resume in
    /// panic=abort builds]
    #[arg(long, value_enum)]
    transfer: Option<TransferArg>,

    /// Result code reported for an overflow trap
    #[arg(long, default_value_t = OVERFLOW_CODE, allow_negative_numbers = true)]
    overflow_code: i32,

    /// Scenario to run
    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Clone, Copy, ValueEnum)]
enum CaptureArg {
    Fast,
    SaveMask,
}

impl From<CaptureArg> for CaptureMode {
    fn from(arg: CaptureArg) -> Self {
        match arg {
            CaptureArg::Fast => CaptureMode::Fast,
            CaptureArg::SaveMask => CaptureMode::SaveSignalMask,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TransferArg {
    Unwind,
    Resume,
}

impl From<TransferArg> for TransferMode {
    fn from(arg: TransferArg) -> Self {
        match arg {
            TransferArg::Unwind => TransferMode::Unwind,
            TransferArg::Resume => TransferMode::Resume,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TrapsArg {
    Detect,
    Off,
}

impl From<TrapsArg> for TrapSelection {
    fn from(arg: TrapsArg) -> Self {
        match arg {
            TrapsArg::Detect => TrapSelection::Detect,
            TrapsArg::Off => TrapSelection::Disabled,
        }
    }
}

impl Cli {
    fn trap_selection(&self) -> TrapSelection {
        let Some(vector) = self.access_vector else {
            return self.traps.into();
        };
        let base = match self.traps {
            TrapsArg::Detect => TrapPlan::detect(),
            TrapsArg::Off => TrapPlan::none(),
        };
        TrapSelection::Plan(base.with_access(Signal::SEGV, AccessRule::TrapNumber(vector)))
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut builder = ConfigBuilder::default();
    builder
        .capture(cli.capture.into())
        .traps(cli.trap_selection())
        .overflow_code(cli.overflow_code);
    if let Some(transfer) = cli.transfer {
        builder.transfer(transfer.into());
    }
    let config = builder.build()?;
    trapline::init(config)?;
    log::info!("running {:?}", cli.scenario);

    for line in cli.scenario.run()? {
        println!("{}", line);
    }

    trapline::teardown()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
