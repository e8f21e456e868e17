// Interface allow-list: glob patterns compiled to anchored regexes.

use regex::Regex;

use crate::error::GatherError;

/// Compiled interface allow-list. A name passes if any pattern matches it
/// in full; `*` matches any run of characters, `?` a single character.
#[derive(Debug)]
pub struct InterfaceFilter {
    patterns: Vec<Regex>,
}

impl InterfaceFilter {
    pub fn compile(globs: &[String]) -> Result<Self, GatherError> {
        let patterns = globs
            .iter()
            .map(|glob| {
                Regex::new(&glob_to_regex(glob)).map_err(|source| GatherError::Filter {
                    pattern: glob.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(name))
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}
