/*!
The CLI & Configuration layer. Parses argv (after prepending whatever the
`LGREP_OPTIONS` environment variable holds), resolves the pattern and
matcher engine, and normalizes everything into an immutable `Config` that
the rest of the binary consumes. No component downstream of this module
looks at `std::env` or `clap` again.
*/
use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{App, Arg, ArgGroup, ErrorKind};

use error::{Error, Result};
use lgrep_matcher::{Engine, MatcherOptions};
use searcher::SearchOptions;
use worker::BinaryMode;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirPolicy {
    Read,
    Skip,
    Recurse,
}

pub struct Config {
    pub pattern: Vec<u8>,
    pub paths: Vec<PathBuf>,
    pub engine: Engine,
    pub matcher_opts: MatcherOptions,
    pub search_opts: SearchOptions,
    pub use_mmap: bool,
    pub binary_mode: BinaryMode,
    pub dir_policy: DirPolicy,
    pub with_filename: bool,
    pub null_filename: bool,
    pub suppress_diagnostics: bool,
    pub exit_on_match: bool,
}

/// Parse `LGREP_OPTIONS`-prepended, whitespace-separated default options,
/// honoring backslash escapes for whitespace and the backslash itself.
fn split_env_options(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut chars = raw.chars().peekable();
    let mut in_token = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '\\' {
                        cur.push(next);
                        chars.next();
                        in_token = true;
                        continue;
                    }
                }
                cur.push(c);
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    out.push(cur.clone());
                    cur.clear();
                    in_token = false;
                }
            }
            c => {
                cur.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        out.push(cur);
    }
    out
}

/// Pull bare digit-sequence arguments (`-3`) out of `argv`, since clap has
/// no portable way to register an arbitrary number of single-character
/// numeric flags. Each one found accumulates into the default context
/// count, matching GNU grep's own special-cased handling of `-<digits>`.
fn extract_bare_context(argv: Vec<String>) -> (Vec<String>, Option<usize>) {
    let mut out = Vec::with_capacity(argv.len());
    let mut context = None;
    for arg in argv {
        let is_bare_digits = arg.len() > 1
            && arg.starts_with('-')
            && arg[1..].bytes().all(|b| b.is_ascii_digit());
        if is_bare_digits {
            let n: usize = arg[1..].parse().unwrap_or(0);
            context = Some(context.unwrap_or(0) + n);
        } else {
            out.push(arg);
        }
    }
    (out, context)
}

fn build_app<'a, 'b>() -> App<'a, 'b> {
    App::new("lgrep")
        .about("print lines matching a pattern")
        .arg(Arg::with_name("extended").short("E"))
        .arg(Arg::with_name("fixed").short("F"))
        .arg(Arg::with_name("basic").short("G"))
        .arg(Arg::with_name("perl").short("P"))
        .arg(Arg::with_name("engine_name").short("X").takes_value(true))
        .group(
            ArgGroup::with_name("engine")
                .args(&["extended", "fixed", "basic", "perl", "engine_name"])
                .multiple(false),
        )
        .arg(Arg::with_name("regexp").short("e").takes_value(true).multiple(true).number_of_values(1))
        .arg(Arg::with_name("file_patterns").short("f").takes_value(true).multiple(true).number_of_values(1))
        .arg(Arg::with_name("ignore_case").short("i"))
        .arg(Arg::with_name("ignore_case_y").short("y"))
        .arg(Arg::with_name("word_regexp").short("w"))
        .arg(Arg::with_name("line_regexp").short("x"))
        .arg(Arg::with_name("invert_match").short("v"))
        .arg(Arg::with_name("count").short("c"))
        .arg(Arg::with_name("files_with_matches").short("l"))
        .arg(Arg::with_name("files_without_matches").short("L"))
        .arg(Arg::with_name("quiet").short("q"))
        .arg(Arg::with_name("no_messages").short("s"))
        .arg(Arg::with_name("line_number").short("n"))
        .arg(Arg::with_name("byte_offset").short("b"))
        .arg(Arg::with_name("with_filename").short("H"))
        .arg(Arg::with_name("no_filename").short("h"))
        .arg(Arg::with_name("after_context").short("A").takes_value(true))
        .arg(Arg::with_name("before_context").short("B").takes_value(true))
        .arg(Arg::with_name("context").short("C").takes_value(true))
        .arg(Arg::with_name("max_count").short("m").takes_value(true))
        .arg(Arg::with_name("null").short("Z"))
        .arg(Arg::with_name("null_data").short("z"))
        .arg(Arg::with_name("text").short("a"))
        .arg(Arg::with_name("binary_without_match").short("I"))
        .arg(Arg::with_name("binary_files").long("binary-files").takes_value(true))
        .arg(Arg::with_name("directories").short("d").takes_value(true))
        .arg(Arg::with_name("recursive").short("r"))
        .arg(Arg::with_name("mmap").long("mmap"))
        .arg(Arg::with_name("dos_unix").short("U"))
        .arg(Arg::with_name("dos_strip_cr").short("u"))
        .arg(Arg::with_name("pattern").index(1))
        .arg(Arg::with_name("files").index(2).multiple(true))
}

fn read_pattern_file(path: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if path == "-" {
        io::stdin().read_to_end(&mut buf).map_err(|err| Error::io(err, "<stdin>"))?;
    } else {
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .map_err(|err| Error::io(err, path))?;
    }
    while buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(buf)
}

/// Parse argv into a `Config`. `argv` excludes the program name.
pub fn parse(argv: Vec<String>) -> Result<Config> {
    let mut full = Vec::new();
    full.push("lgrep".to_string());
    if let Ok(extra) = env::var("LGREP_OPTIONS") {
        full.extend(split_env_options(&extra));
    }
    full.extend(argv);

    let (full, bare_context) = extract_bare_context(full);

    let app = build_app().version(env!("CARGO_PKG_VERSION"));
    let matches = match app.get_matches_from_safe(full) {
        Ok(m) => m,
        Err(ref err)
            if err.kind == ErrorKind::HelpDisplayed
                || err.kind == ErrorKind::VersionDisplayed =>
        {
            print!("{}", err.message);
            ::std::process::exit(0);
        }
        Err(err) => return Err(Error::config(err.message)),
    };

    let engine = if matches.is_present("extended") {
        Engine::Extended
    } else if matches.is_present("fixed") {
        Engine::FixedStrings
    } else if matches.is_present("basic") {
        Engine::Basic
    } else if matches.is_present("perl") {
        Engine::Perl
    } else if let Some(name) = matches.value_of("engine_name") {
        Engine::by_name(name)?
    } else {
        Engine::Basic
    };

    let mut pattern_parts: Vec<Vec<u8>> = Vec::new();
    if let Some(vals) = matches.values_of("regexp") {
        pattern_parts.extend(vals.map(|s| s.as_bytes().to_vec()));
    }
    if let Some(vals) = matches.values_of("file_patterns") {
        for path in vals {
            pattern_parts.push(read_pattern_file(path)?);
        }
    }
    let positional_is_pattern = pattern_parts.is_empty();
    let mut paths: Vec<PathBuf> = Vec::new();
    if positional_is_pattern {
        let pat = matches
            .value_of("pattern")
            .ok_or_else(|| Error::config("no pattern given"))?;
        pattern_parts.push(pat.as_bytes().to_vec());
        if let Some(files) = matches.values_of("files") {
            paths.extend(files.map(PathBuf::from));
        }
    } else {
        if let Some(p) = matches.value_of("pattern") {
            paths.push(PathBuf::from(p));
        }
        if let Some(files) = matches.values_of("files") {
            paths.extend(files.map(PathBuf::from));
        }
    }
    let pattern = pattern_parts.join(&b'\n');

    let eol = if matches.is_present("null_data") { 0u8 } else { b'\n' };

    let matcher_opts = MatcherOptions {
        case_insensitive: matches.is_present("ignore_case") || matches.is_present("ignore_case_y"),
        whole_word: matches.is_present("word_regexp"),
        whole_line: matches.is_present("line_regexp"),
        line_terminator: eol,
        fixed_strings: matches.is_present("fixed"),
    };

    let (mut before, mut after) = (0usize, 0usize);
    if let Some(c) = bare_context {
        before = c;
        after = c;
    }
    if let Some(c) = matches.value_of("context") {
        let c: usize = c.parse().map_err(|_| Error::config("invalid -C argument"))?;
        before = c;
        after = c;
    }
    if let Some(b) = matches.value_of("before_context") {
        before = b.parse().map_err(|_| Error::config("invalid -B argument"))?;
    }
    if let Some(a) = matches.value_of("after_context") {
        after = a.parse().map_err(|_| Error::config("invalid -A argument"))?;
    }

    let max_count = match matches.value_of("max_count") {
        Some(m) => Some(m.parse().map_err(|_| Error::config("invalid -m argument"))?),
        None => None,
    };

    let files_with_matches = matches.is_present("files_with_matches");
    let files_without_matches = matches.is_present("files_without_matches");
    let quiet = matches.is_present("quiet") || files_with_matches || files_without_matches;

    let search_opts = SearchOptions {
        eol: eol,
        invert_match: matches.is_present("invert_match"),
        line_number: matches.is_present("line_number"),
        byte_offset: matches.is_present("byte_offset"),
        count_only: matches.is_present("count"),
        files_with_matches: files_with_matches,
        files_without_matches: files_without_matches,
        quiet: quiet,
        max_count: max_count,
        before_context: before,
        after_context: after,
    };

    let binary_mode = if matches.is_present("text") {
        BinaryMode::Text
    } else if matches.is_present("binary_without_match") {
        BinaryMode::Skip
    } else {
        match matches.value_of("binary_files") {
            Some("text") => BinaryMode::Text,
            Some("without-match") => BinaryMode::Skip,
            Some("binary") | None => BinaryMode::Binary,
            Some(other) => {
                return Err(Error::config(format!("unknown binary-files type: {}", other)));
            }
        }
    };

    // -U/-u select MS-DOS text-mode byte semantics on builds that carry
    // that support; this one doesn't, so the flags are accepted (grep
    // scripts pass them unconditionally) and otherwise ignored.
    let _ = (matches.is_present("dos_unix"), matches.is_present("dos_strip_cr"));

    let recursive = matches.is_present("recursive");
    let dir_policy = match matches.value_of("directories") {
        Some("read") => DirPolicy::Read,
        Some("skip") => DirPolicy::Skip,
        Some("recurse") => DirPolicy::Recurse,
        Some(other) => {
            return Err(Error::config(format!("unknown -d action: {}", other)));
        }
        None if recursive => DirPolicy::Recurse,
        None => DirPolicy::Read,
    };

    let with_filename = if matches.is_present("with_filename") {
        true
    } else if matches.is_present("no_filename") {
        false
    } else {
        paths.len() > 1 || dir_policy == DirPolicy::Recurse
    };

    Ok(Config {
        pattern: pattern,
        paths: paths,
        engine: engine,
        matcher_opts: matcher_opts,
        search_opts: search_opts,
        use_mmap: matches.is_present("mmap"),
        binary_mode: binary_mode,
        dir_policy: dir_policy,
        with_filename: with_filename,
        null_filename: matches.is_present("null"),
        suppress_diagnostics: matches.is_present("no_messages"),
        // Distinct from `search_opts.quiet`: `-l`/`-L` also set that flag to
        // suppress per-line output, but must keep scanning every remaining
        // path to list it; only true `-q` stops the whole run on the first
        // match found anywhere.
        exit_on_match: matches.is_present("quiet"),
    })
}
