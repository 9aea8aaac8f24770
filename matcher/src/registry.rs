use {AnyMatcher, Error, Matcher, MatcherOptions, Result};
use regex_matcher::RegexMatcher;

/// The engine selection made on the command line (`-E`/`-F`/`-G`/`-P`/
/// `-X name`).
///
/// Extended, basic and Perl-compatible selections are distinct *requests*,
/// but as documented on `RegexMatcher`, this binary backs all three with
/// the same regex engine; the dialect differences among them are an
/// external collaborator's concern that this crate deliberately does not
/// reimplement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Engine {
    Extended,
    Basic,
    FixedStrings,
    Perl,
}

impl Engine {
    /// Resolve a `-X name` argument to a known engine, or fail.
    pub fn by_name(name: &str) -> Result<Engine> {
        match name {
            "extended" | "egrep" => Ok(Engine::Extended),
            "basic" | "grep" => Ok(Engine::Basic),
            "fixed" | "fgrep" => Ok(Engine::FixedStrings),
            "perl" | "pcre" => Ok(Engine::Perl),
            _ => Err(Error::UnknownEngine(name.to_string())),
        }
    }
}

/// Compile `pattern` under `engine`, returning a type-erased matcher.
pub fn build(
    engine: Engine,
    pattern: &[u8],
    opts: &MatcherOptions,
) -> Result<Box<AnyMatcher>> {
    let mut opts = opts.clone();
    if let Engine::FixedStrings = engine {
        opts.fixed_strings = true;
    }
    debug!(
        "compiling pattern under {:?} selection (backed by the same regex engine as every \
         other selection)",
        engine
    );
    let m = RegexMatcher::compile(pattern, &opts)?;
    Ok(Box::new(m))
}
