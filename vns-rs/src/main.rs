use std::io::{self, Write};

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use vns::cli::{self, ConfigFile};
use vns::config::Config;
use vns::console::{ConsoleExecutor, ConsoleSettings};
use vns::script::{Interpreter, RunError};

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("vns: {e}");
            eprintln!("Usage: vns [-d] [-q] [-s] [-f[<file>]] [--dump] <script>");
            eprintln!("       vns [-d] [-q] [-s] [-f[<file>]] [--dump] -");
            std::process::exit(EXIT_USAGE);
        }
    };

    // ── Load config ───────────────────────────────────────────────────────────
    let mut config = Config::default();
    let mut config_problems = Vec::new();
    if let Some(path) = cli::resolve_config(&args.config) {
        match Config::load_file(&path) {
            Ok((c, errors)) => {
                config = c;
                config_problems.extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
            }
            Err(e) if matches!(args.config, ConfigFile::Explicit(_)) => {
                eprintln!("vns: {}: {e}", path.display());
                std::process::exit(EXIT_FAILURE);
            }
            Err(e) => config_problems.push(format!("{}: {e}", path.display())),
        }
    }
    if args.strict {
        config.strict = true;
    }

    // ── Logging ───────────────────────────────────────────────────────────────
    let level = if args.debug {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config.log_level
    };
    init_logging(level);
    for problem in &config_problems {
        log::warn!("{problem}");
    }

    // ── Read script ───────────────────────────────────────────────────────────
    let name = args.script.display_name();
    let src = match cli::read_script(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vns: {name}: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };
    log::debug!("loaded {name} ({} bytes)", src.len());

    let mut interp = Interpreter::new();
    interp.set_strict(config.strict);

    if args.dump {
        std::process::exit(dump(&mut interp, &src, &name));
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let stdin_tty = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 };
    let stdout_tty = unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 };
    let mut settings = ConsoleSettings::from_config(&config, stdout_tty);
    if !stdin_tty || !stdout_tty {
        settings.auto_advance = true;
    }

    let mut console = ConsoleExecutor::new(io::stdout().lock(), settings);
    let result = interp.execute(&src, &mut console);
    let _ = console.flush();

    let code = match result {
        Ok(()) => 0,
        Err(e @ RunError::Syntax(_)) => {
            eprintln!("vns: {name}: {e}");
            EXIT_USAGE
        }
        Err(e @ RunError::Rejected { .. }) => {
            eprintln!("vns: {name}: {e}");
            EXIT_FAILURE
        }
        Err(e @ RunError::Interrupted(_)) => {
            eprintln!("vns: {e}");
            EXIT_INTERRUPTED
        }
    };
    std::process::exit(code);
}

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

/// Print the parsed command listing.  Returns the exit status.
fn dump(interp: &mut Interpreter, src: &str, name: &str) -> i32 {
    let script = match interp.parse(src) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vns: {name}: syntax error at {e}");
            return EXIT_USAGE;
        }
    };

    let mut out = io::stdout().lock();
    script.queue.each(|id, cmd| {
        let _ = writeln!(out, "{:>5}  {cmd}", id.to_string());
    });
    let mut labels: Vec<_> = script.labels.values().collect();
    labels.sort_by_key(|l| l.id);
    for label in labels {
        let _ = writeln!(out, "label {:?} -> {}", label.name, label.id);
    }
    let _ = out.flush();

    if interp.logger().has_errors() {
        EXIT_FAILURE
    } else {
        0
    }
}
