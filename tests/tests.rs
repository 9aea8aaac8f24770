/*!
This module contains *integration* tests. Their purpose is to test the CLI
interface: that passing a flag does what it says on the tin.

Tests for more fine grained behavior (buffer growth, line scanning, output
formatting) live as unit tests in their respective modules.
*/

#![allow(dead_code, unused_imports)]

use std::process::Command;

use workdir::WorkDir;

mod hay;

macro_rules! sherlock {
    ($name:ident, $fun:expr) => {
        sherlock!($name, "Sherlock", $fun);
    };
    ($name:ident, $query:expr, $fun:expr) => {
        sherlock!($name, $query, "sherlock", $fun);
    };
    ($name:ident, $query:expr, $path:expr, $fun:expr) => {
        #[test]
        fn $name() {
            let wd = WorkDir::new(stringify!($name));
            wd.create("sherlock", hay::SHERLOCK);
            let mut cmd = wd.command();
            cmd.arg($query).arg($path);
            $fun(wd, cmd);
        }
    };
}

fn path(unix: &str) -> String {
    if cfg!(windows) {
        unix.replace("/", "\\")
    } else {
        unix.to_string()
    }
}

sherlock!(single_file, |wd: WorkDir, mut cmd| {
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(with_filename, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-H");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
sherlock:For the Doctor Watsons of this world, as opposed to the Sherlock
sherlock:be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(no_filename_forced, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-H").arg("-h");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(line_numbers, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-n");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
1:For the Doctor Watsons of this world, as opposed to the Sherlock
3:be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(byte_offset, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-b");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
0:For the Doctor Watsons of this world, as opposed to the Sherlock
129:be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(inverted, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-v");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
Holmeses, success in the province of detective work must always
can extract a clew from a wisp of straw or a flake of cigar ash;
but Doctor Watson has to have it taken out for him and dusted,
and exhibited clearly, with a label attached.
";
    assert_eq!(lines, expected);
});

sherlock!(inverted_line_numbers, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-n").arg("-v");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
2:Holmeses, success in the province of detective work must always
4:can extract a clew from a wisp of straw or a flake of cigar ash;
5:but Doctor Watson has to have it taken out for him and dusted,
6:and exhibited clearly, with a label attached.
";
    assert_eq!(lines, expected);
});

sherlock!(case_insensitive, "sherlock", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-i");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(case_insensitive_y_alias, "sherlock", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-y");
    let lines: String = wd.stdout(&mut cmd);
    assert!(!lines.is_empty());
});

sherlock!(word, "as", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-w");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
";
    assert_eq!(lines, expected);
});

sherlock!(line_regexp, "Sherlock Holmes", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-x");
    let lines: String = wd.stdout(&mut cmd);
    assert!(lines.is_empty());
});

sherlock!(fixed_strings, "()", "file", |wd: WorkDir, mut cmd: Command| {
    wd.create("file", "blib\n()\nblab\n");
    cmd.arg("-F");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "()\n");
});

sherlock!(quiet, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-q");
    let lines: String = wd.stdout(&mut cmd);
    assert!(lines.is_empty());
});

sherlock!(quiet_still_matches, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-q");
    wd.output(&mut cmd);
});

sherlock!(count, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-c");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "2\n");
});

sherlock!(files_with_matches, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-l");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "sherlock\n");
});

sherlock!(files_without_matches, "NADA", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-L");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "sherlock\n");
});

sherlock!(max_count, "Sherlock", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-m").arg("1");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
";
    assert_eq!(lines, expected);
});

#[test]
fn max_count_zero_exits_without_matching() {
    let wd = WorkDir::new("max_count_zero_exits_without_matching");
    wd.create("sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    cmd.arg("-m").arg("0").arg("Sherlock").arg("sherlock");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

sherlock!(after_context, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-A").arg("1");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
Holmeses, success in the province of detective work must always
be, to a very large extent, the result of luck. Sherlock Holmes
can extract a clew from a wisp of straw or a flake of cigar ash;
";
    assert_eq!(lines, expected);
});

sherlock!(after_context_line_numbers, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-A").arg("1").arg("-n");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
1:For the Doctor Watsons of this world, as opposed to the Sherlock
2-Holmeses, success in the province of detective work must always
3:be, to a very large extent, the result of luck. Sherlock Holmes
4-can extract a clew from a wisp of straw or a flake of cigar ash;
";
    assert_eq!(lines, expected);
});

sherlock!(before_context, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-B").arg("1");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
Holmeses, success in the province of detective work must always
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
});

sherlock!(context, "world|attached", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-C").arg("1");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
Holmeses, success in the province of detective work must always
--
but Doctor Watson has to have it taken out for him and dusted,
and exhibited clearly, with a label attached.
";
    assert_eq!(lines, expected);
});

sherlock!(context_bare_digit, "world|attached", |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-1");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
Holmeses, success in the province of detective work must always
--
but Doctor Watson has to have it taken out for him and dusted,
and exhibited clearly, with a label attached.
";
    assert_eq!(lines, expected);
});

sherlock!(context_line_numbers, "world|attached",
|wd: WorkDir, mut cmd: Command| {
    cmd.arg("-C").arg("1").arg("-n");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
1:For the Doctor Watsons of this world, as opposed to the Sherlock
2-Holmeses, success in the province of detective work must always
--
5-but Doctor Watson has to have it taken out for him and dusted,
6:and exhibited clearly, with a label attached.
";
    assert_eq!(lines, expected);
});

sherlock!(null_filename, |wd: WorkDir, mut cmd: Command| {
    cmd.arg("-Z").arg("-H");
    let out = wd.output(&mut cmd);
    assert!(out.stdout.starts_with(b"sherlock\x00"));
});

#[test]
fn e_flag_pattern() {
    // With -e given, the first positional argument is a path, not the
    // pattern.
    let wd = WorkDir::new("e_flag_pattern");
    wd.create("sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    cmd.arg("-e").arg("Sherlock").arg("sherlock");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
}

#[test]
fn f_flag_pattern_file() {
    let wd = WorkDir::new("f_flag_pattern_file");
    wd.create("sherlock", hay::SHERLOCK);
    wd.create("pat", "Sherlock\n");
    let mut cmd = wd.command();
    cmd.arg("-f").arg("pat").arg("sherlock");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
}

#[test]
fn stdin_search() {
    let wd = WorkDir::new("stdin_search");
    let mut cmd = wd.command();
    cmd.arg("Sherlock");
    let output = wd.pipe(&mut cmd, hay::SHERLOCK);
    let lines = String::from_utf8_lossy(&output.stdout).into_owned();
    let expected = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
}

#[test]
fn no_match_is_exit_one() {
    let wd = WorkDir::new("no_match_is_exit_one");
    wd.create("sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    cmd.arg("NADA").arg("sherlock");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn directory_default_is_an_error() {
    let wd = WorkDir::new("directory_default_is_an_error");
    wd.create_dir("foo");
    wd.create("foo/sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    cmd.arg("Sherlock").arg(".");
    wd.assert_err(&mut cmd);
}

#[test]
fn directory_skip() {
    let wd = WorkDir::new("directory_skip");
    wd.create_dir("foo");
    wd.create("foo/sherlock", hay::SHERLOCK);
    wd.create("top", "Sherlock Holmes lives here too.");
    let mut cmd = wd.command();
    cmd.arg("-d").arg("skip").arg("Sherlock").arg(".").arg("top");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "top:Sherlock Holmes lives here too.\n");
}

#[test]
fn directory_recurse() {
    let wd = WorkDir::new("directory_recurse");
    wd.create_dir("foo/bar");
    wd.create("foo/bar/sherlock", hay::SHERLOCK);
    wd.create("foo/watson", "nothing interesting");
    let mut cmd = wd.command();
    cmd.arg("-r").arg("Sherlock").arg("foo");
    let lines: String = wd.stdout(&mut cmd);
    let expected = format!("\
{path}:For the Doctor Watsons of this world, as opposed to the Sherlock
{path}:be, to a very large extent, the result of luck. Sherlock Holmes
", path = path("foo/bar/sherlock"));
    assert_eq!(lines, expected);
}

#[test]
fn directory_recurse_finds_loop() {
    if cfg!(windows) {
        return;
    }
    let wd = WorkDir::new("directory_recurse_finds_loop");
    wd.create_dir("foo");
    wd.create("foo/sherlock", hay::SHERLOCK);
    wd.link_dir("foo", "foo/loop");
    let mut cmd = wd.command();
    cmd.arg("-r").arg("Sherlock").arg("foo");
    let out = wd.output(&mut cmd);
    // The loop is diagnosed (and skipped) rather than recursed into
    // forever; the real file is still found exactly once.
    let lines = String::from_utf8_lossy(&out.stdout);
    assert_eq!(lines.matches("sherlock:For the Doctor").count(), 1);
}

#[test]
fn binary_default_reports_match_only() {
    let wd = WorkDir::new("binary_default_reports_match_only");
    wd.create_bytes("file", b"foo\x00bar\nfoo\x00baz\n");
    let mut cmd = wd.command();
    cmd.arg("foo").arg("file");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "Binary file file matches\n");
}

#[test]
fn binary_skip_with_capital_i() {
    let wd = WorkDir::new("binary_skip_with_capital_i");
    wd.create_bytes("file", b"foo\x00bar\nfoo\x00baz\n");
    let mut cmd = wd.command();
    cmd.arg("-I").arg("foo").arg("file");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn binary_text_with_a_flag() {
    let wd = WorkDir::new("binary_text_with_a_flag");
    wd.create_bytes("file", b"foo\x00bar\nfoo\x00baz\n");
    let mut cmd = wd.command();
    cmd.arg("-a").arg("foo").arg("file");
    let lines: String = wd.stdout(&mut cmd);
    assert_eq!(lines, "foo\x00bar\nfoo\x00baz\n");
}

#[test]
fn mmap_and_stream_agree() {
    let wd = WorkDir::new("mmap_and_stream_agree");
    wd.create("sherlock", hay::SHERLOCK);

    let mut cmd_stream = wd.command();
    cmd_stream.arg("Sherlock").arg("sherlock");
    let stream_out: String = wd.stdout(&mut cmd_stream);

    let mut cmd_mmap = wd.command();
    cmd_mmap.arg("--mmap").arg("Sherlock").arg("sherlock");
    let mmap_out: String = wd.stdout(&mut cmd_mmap);

    assert_eq!(stream_out, mmap_out);
}

#[test]
fn suppress_diagnostics_silences_stderr() {
    let wd = WorkDir::new("suppress_diagnostics_silences_stderr");
    let mut cmd = wd.command();
    cmd.arg("-s").arg("Sherlock").arg("does-not-exist");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stderr.is_empty());
}

#[test]
fn unreadable_path_raises_trouble_exit_status() {
    let wd = WorkDir::new("unreadable_path_raises_trouble_exit_status");
    let mut cmd = wd.command();
    cmd.arg("Sherlock").arg("does-not-exist");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(!out.stderr.is_empty());
}

#[test]
fn quiet_stops_the_whole_run_on_first_match() {
    let wd = WorkDir::new("quiet_stops_the_whole_run_on_first_match");
    wd.create("sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    // "does-not-exist" would raise trouble (exit 2) if this run ever got
    // around to opening it; `-q` must stop at the first match, in
    // "sherlock", before that ever happens.
    cmd.arg("-q").arg("Sherlock").arg("sherlock").arg("does-not-exist");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn env_options_are_prepended() {
    let wd = WorkDir::new("env_options_are_prepended");
    wd.create("sherlock", hay::SHERLOCK);
    let mut cmd = wd.command();
    cmd.env("LGREP_OPTIONS", "-n");
    cmd.arg("Sherlock").arg("sherlock");
    let lines: String = wd.stdout(&mut cmd);
    let expected = "\
1:For the Doctor Watsons of this world, as opposed to the Sherlock
3:be, to a very large extent, the result of luck. Sherlock Holmes
";
    assert_eq!(lines, expected);
}
