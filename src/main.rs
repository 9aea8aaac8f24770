/*!
lgrep is a line-oriented pattern search tool: a buffered, optionally
memory-mapped scanning engine driving a pluggable pattern matcher, with
grep-compatible output, context, and exit-status semantics.
*/
extern crate clap;
extern crate env_logger;
extern crate lgrep_matcher;
extern crate libc;
#[macro_use]
extern crate log;
extern crate memchr;
extern crate memmap;
extern crate same_file;

mod args;
mod error;
mod line_buffer;
mod pathutil;
mod printer;
mod searcher;
mod walk;
mod worker;

use std::env;
use std::io::{self, Write};
use std::process;

use args::{Config, DirPolicy};
use error::Error;
use printer::Printer;
use walk::Walker;
use worker::{Work, Worker};

fn main() {
    // Off by default, as it is for the rest of this ecosystem; set
    // RUST_LOG=lgrep=debug to see matcher selection, mmap-fallback, and
    // directory-walk diagnostics.
    env_logger::try_init().ok();

    let argv: Vec<String> = env::args().skip(1).collect();
    let config = match args::parse(argv) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("lgrep: {}", err);
            process::exit(2);
        }
    };

    match run(config) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("lgrep: {}", err);
            process::exit(2);
        }
    }
}

fn run(config: Config) -> Result<i32, Error> {
    let matcher = lgrep_matcher::build(config.engine, &config.pattern, &config.matcher_opts)?;
    let stdout = io::stdout();
    let mut printer = Printer::new(stdout.lock())
        .with_filename(config.with_filename)
        .line_number(config.search_opts.line_number)
        .byte_offset(config.search_opts.byte_offset)
        .null_data(config.null_filename);

    let mut worker = Worker::new(
        matcher,
        config.search_opts.clone(),
        config.use_mmap,
        config.binary_mode,
        config.suppress_diagnostics,
    );

    let mut any_match = false;
    let mut any_trouble = false;

    if config.paths.is_empty() {
        let (count, trouble) = worker.run(&mut printer, Work::Stdin);
        any_match = any_match || count > 0;
        any_trouble = any_trouble || trouble;
    } else {
        'paths: for path in &config.paths {
            if path.is_dir() {
                match config.dir_policy {
                    DirPolicy::Skip => continue,
                    DirPolicy::Read => {
                        if !config.suppress_diagnostics {
                            eprintln!("lgrep: {}: Is a directory", path.display());
                        }
                        any_trouble = true;
                    }
                    DirPolicy::Recurse => {
                        let walker =
                            Walker::new(path).suppress_diagnostics(config.suppress_diagnostics);
                        for entry in walker {
                            match entry {
                                Ok(ent) => {
                                    if ent.is_dir {
                                        continue;
                                    }
                                    let (count, trouble) =
                                        worker.run(&mut printer, Work::Path(ent.path));
                                    any_match = any_match || count > 0;
                                    any_trouble = any_trouble || trouble;
                                    // `-q` stops the whole run, not just this
                                    // directory, the moment any match is found.
                                    if count > 0 && config.exit_on_match {
                                        break 'paths;
                                    }
                                }
                                Err(err) => {
                                    if !config.suppress_diagnostics {
                                        eprintln!("lgrep: {}", err);
                                    }
                                    any_trouble = true;
                                }
                            }
                        }
                    }
                }
            } else {
                let (count, trouble) = worker.run(&mut printer, Work::Path(path.clone()));
                any_match = any_match || count > 0;
                any_trouble = any_trouble || trouble;
                if count > 0 && config.exit_on_match {
                    break 'paths;
                }
            }
        }
    }

    if let Err(err) = printer.into_inner().flush() {
        eprintln!("lgrep: {}", err);
        return Ok(2);
    }

    if any_trouble {
        Ok(2)
    } else if any_match {
        Ok(0)
    } else {
        Ok(1)
    }
}
