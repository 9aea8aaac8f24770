use regex::bytes::{Regex, RegexBuilder};

use {Error, Match, Matcher, MatcherOptions, Result};

/// A matcher backed by a general purpose regular expression engine.
///
/// This is the one engine that actually ships in this binary; it backs the
/// `-E`, `-G` and `-P` selections alike (their dialect differences are an
/// external collaborator's concern, see the module documentation on
/// `lgrep_matcher`), and it backs `-F` once the pattern has been escaped to
/// a literal by the caller.
///
/// `find_at` guarantees a match never spans `opts.line_terminator`: the
/// backing engine's `multi_line` mode only anchors `^`/`$` there, so a
/// candidate match whose span crosses that byte is rejected and the search
/// retried just past its start.
#[derive(Debug)]
pub struct RegexMatcher {
    re: Regex,
    line_terminator: u8,
}

impl RegexMatcher {
    /// Build the regex source for `pattern` honoring word/line wrapping.
    ///
    /// `-F` escapes every character in `pattern` so the result can only ever
    /// match the literal bytes given; `-w`/`-x` wrap the (possibly escaped)
    /// pattern in word/line boundaries, same as GNU grep's own treatment of
    /// `-F`/`-w`/`-x` as pattern-level rewrites rather than engine-level
    /// flags.
    fn pattern_source(pattern: &[u8], opts: &MatcherOptions) -> Result<String> {
        let text = ::std::str::from_utf8(pattern).map_err(|_| {
            Error::Compile(
                "pattern is not valid UTF-8".to_string(),
            )
        })?;
        let body = if opts.fixed_strings {
            text.split('\n')
                .map(::regex::escape)
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            text.to_string()
        };
        let body = if opts.whole_line {
            format!("(?:^(?:{})$)", body)
        } else if opts.whole_word {
            format!(r"(?:\b(?:{})\b)", body)
        } else {
            body
        };
        Ok(body)
    }
}

impl Matcher for RegexMatcher {
    fn compile(pattern: &[u8], opts: &MatcherOptions) -> Result<RegexMatcher> {
        let source = RegexMatcher::pattern_source(pattern, opts)?;
        let re = RegexBuilder::new(&source)
            .case_insensitive(opts.case_insensitive)
            .multi_line(true)
            .unicode(true)
            .build()
            .map_err(|err| Error::Compile(err.to_string()))?;
        Ok(RegexMatcher { re: re, line_terminator: opts.line_terminator })
    }

    fn find_at(&self, haystack: &[u8], at: usize) -> Result<Option<Match>> {
        let mut at = at;
        loop {
            if at > haystack.len() {
                return Ok(None);
            }
            let m = match self.re.find_at(haystack, at) {
                Some(m) => m,
                None => return Ok(None),
            };
            // `multi_line` only anchors `^`/`$` at the terminator; classes
            // like `\s`, `\W` or `[^a]` still match it, since the regex
            // engine has no notion of a caller-configurable line terminator.
            // Reject any match whose span crosses it and retry just past
            // where this one started, rather than ever reporting a match
            // that spans two lines.
            if m.start() == m.end()
                || !haystack[m.start()..m.end()].contains(&self.line_terminator)
            {
                return Ok(Some(Match::new(m.start(), m.end())));
            }
            at = m.start() + 1;
        }
    }
}
