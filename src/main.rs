// src/main.rs

use checkrun::report::RunVerdict;
use checkrun::{cli, logging, run, signals};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("checkrun error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(RunVerdict::Completed(summary)) => {
            println!("{summary}");
            std::process::exit(summary.exit_code());
        }
        // No summary on a signaled abort; die by the same signal so the
        // caller sees the termination, not a pass/fail code.
        Ok(RunVerdict::Interrupted(signal)) => signals::exit_by_signal(signal),
        Err(err) => {
            eprintln!("checkrun error: {err:?}");
            std::process::exit(1);
        }
    }
}
