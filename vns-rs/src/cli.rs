//! Command-line argument parsing.
//!
//! Usage:
//!   vns [-d] [-q] [-s] [-f[<file>]] [--dump] <script>
//!
//! `-d`, `-q` and `-s` also have long forms (`--debug`, `--quiet`,
//! `--strict`), and switches may follow the script.  `<script>` may be `-`
//! to read from stdin.

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which config file to load.
    pub config: ConfigFile,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Errors only (`-q`).
    pub quiet: bool,
    /// Refuse to run a script with any error diagnostic (`-s`).
    pub strict: bool,
    /// Print the parsed command listing instead of running (`--dump`).
    pub dump: bool,
    pub script: ScriptSource,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `$VNSRC`, the platform config dir, then `./.vnsrc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum ScriptSource {
    #[default]
    Stdin,
    File(PathBuf),
}

impl ScriptSource {
    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            ScriptSource::Stdin => "<stdin>".to_owned(),
            ScriptSource::File(p) => p.display().to_string(),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or(&[]))
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<&str> = Vec::new();
    let mut rest = argv.iter();

    while let Some(arg) = rest.next() {
        if arg == "--" {
            positional.extend(rest.by_ref().map(String::as_str));
        } else if let Some(name) = arg.strip_prefix("--") {
            Switch::long(name)
                .ok_or_else(|| format!("unknown option: {arg}"))?
                .apply(&mut args);
        } else if let Some(letters) = arg.strip_prefix('-').filter(|l| !l.is_empty()) {
            for (i, c) in letters.char_indices() {
                if c == 'f' {
                    args.config = config_choice(&letters[i + 1..], &mut rest);
                    break;
                }
                Switch::short(c)
                    .ok_or_else(|| format!("unknown option: -{c}"))?
                    .apply(&mut args);
            }
        } else {
            positional.push(arg);
        }
    }

    args.script = match positional.as_slice() {
        [] => return Err("no script given".to_owned()),
        ["-"] => ScriptSource::Stdin,
        [path] => ScriptSource::File(PathBuf::from(*path)),
        more => return Err(format!("too many arguments ({})", more.len())),
    };
    Ok(args)
}

/// An on/off flag, spelled `-x` or `--name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    Debug,
    Quiet,
    Strict,
    Dump,
}

impl Switch {
    fn short(c: char) -> Option<Switch> {
        match c {
            'd' => Some(Switch::Debug),
            'q' => Some(Switch::Quiet),
            's' => Some(Switch::Strict),
            _ => None,
        }
    }

    fn long(name: &str) -> Option<Switch> {
        match name {
            "debug" => Some(Switch::Debug),
            "quiet" => Some(Switch::Quiet),
            "strict" => Some(Switch::Strict),
            "dump" => Some(Switch::Dump),
            _ => None,
        }
    }

    fn apply(self, args: &mut CliArgs) {
        match self {
            Switch::Debug => args.debug = true,
            Switch::Quiet => args.quiet = true,
            Switch::Strict => args.strict = true,
            Switch::Dump => args.dump = true,
        }
    }
}

/// `-f<file>`, `-f <file>` or a bare `-f`.  A separate file is only taken
/// when a script argument still follows it.
fn config_choice(attached: &str, rest: &mut std::slice::Iter<'_, String>) -> ConfigFile {
    if !attached.is_empty() {
        return ConfigFile::Explicit(PathBuf::from(attached));
    }
    match rest.as_slice() {
        [file, _, ..] if !file.starts_with('-') => {
            rest.next();
            ConfigFile::Explicit(PathBuf::from(file))
        }
        _ => ConfigFile::Skip,
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the config file in the standard locations.
///
/// Priority: `$VNSRC` → `<platform config dir>/vnsrc` → `./.vnsrc`.
/// Returns the first path that exists, or `None`.
pub fn find_config() -> Option<PathBuf> {
    let env = std::env::var_os("VNSRC").map(PathBuf::from);
    let platform = directories::ProjectDirs::from("", "", "vns")
        .map(|dirs| dirs.config_dir().join("vnsrc"));
    [env, platform, Some(PathBuf::from("./.vnsrc"))]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
}

/// Resolve the config path chosen by `choice`.
pub fn resolve_config(choice: &ConfigFile) -> Option<PathBuf> {
    match choice {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => find_config(),
    }
}

/// Read the script text.
pub fn read_script(source: &ScriptSource) -> std::io::Result<String> {
    match source {
        ScriptSource::Stdin => std::io::read_to_string(std::io::stdin()),
        ScriptSource::File(p) => std::fs::read_to_string(p),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn script_required() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
    }

    #[test]
    fn script_positional() {
        let a = parse_argv(&argv(&["intro.vns"])).unwrap();
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("intro.vns")));
        assert!(matches!(a.config, ConfigFile::Search));
    }

    #[test]
    fn dash_is_stdin() {
        let a = parse_argv(&argv(&["-"])).unwrap();
        assert_eq!(a.script, ScriptSource::Stdin);
        assert_eq!(a.script.display_name(), "<stdin>");
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-d", "-q", "-s", "--dump", "x"])).unwrap();
        assert!(a.debug && a.quiet && a.strict && a.dump);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-dqs", "x"])).unwrap();
        assert!(a.debug && a.quiet && a.strict);
        assert!(!a.dump);
    }

    #[test]
    fn long_switches_anywhere() {
        let a = parse_argv(&argv(&["--debug", "x", "--strict", "--dump"])).unwrap();
        assert!(a.debug && a.strict && a.dump);
        assert!(!a.quiet);
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("x")));
        let a = parse_argv(&argv(&["-", "--quiet"])).unwrap();
        assert!(a.quiet);
        assert_eq!(a.script, ScriptSource::Stdin);
    }

    #[test]
    fn config_flag_ends_letter_group() {
        let a = parse_argv(&argv(&["-dfmy.vnsrc", "x"])).unwrap();
        assert!(a.debug);
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.vnsrc")));
        let a = parse_argv(&argv(&["-sf", "--dump", "x"])).unwrap();
        assert!(a.strict && a.dump);
        assert!(matches!(a.config, ConfigFile::Skip));
    }

    #[test]
    fn config_skip() {
        let a = parse_argv(&argv(&["-f", "x"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("x")));
        assert!(resolve_config(&a.config).is_none());
    }

    #[test]
    fn config_explicit_embedded() {
        let a = parse_argv(&argv(&["-fmy.vnsrc", "x"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.vnsrc")));
    }

    #[test]
    fn config_explicit_separate() {
        let a = parse_argv(&argv(&["-f", "my.vnsrc", "x"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.vnsrc")));
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("x")));
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-odd-name"])).unwrap();
        assert_eq!(a.script, ScriptSource::File(PathBuf::from("-odd-name")));
    }

    #[test]
    fn too_many_positional() {
        assert!(parse_argv(&argv(&["a", "b"])).is_err());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z", "x"])).is_err());
        assert!(parse_argv(&argv(&["--verbose", "x"])).is_err());
    }

    #[test]
    fn read_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.vns");
        std::fs::write(&path, "hello[r]").unwrap();
        let text = read_script(&ScriptSource::File(path)).unwrap();
        assert_eq!(text, "hello[r]");
    }
}
