use std::collections::BTreeMap;

/// A single plug-in-specific option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag,
    Str(String),
}

impl OptionValue {
    pub fn is_flag(&self) -> bool {
        matches!(self, OptionValue::Flag)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s.as_str()),
            OptionValue::Flag => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_str().and_then(|s| s.parse().ok())
    }

    pub fn as_bool(&self) -> bool {
        match self {
            OptionValue::Flag => true,
            OptionValue::Str(s) => matches!(s.as_str(), "1" | "true" | "yes" | "on"),
        }
    }
}

/// Plug-in-specific options parsed out of the raw command line before clap
/// sees it, keyed as `prefix.key`.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    opts: BTreeMap<String, OptionValue>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.opts.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.opts.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        let needle = format!("{prefix}.");
        self.opts.keys().any(|k| k.starts_with(&needle))
    }

    /// All options under `prefix.*`, with the prefix stripped from the key.
    pub fn for_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a OptionValue)> {
        let needle = format!("{prefix}.");
        self.opts.iter().filter_map(move |(k, v)| {
            k.strip_prefix(&needle).map(|stripped| (stripped, v))
        })
    }
}

/// True if `arg` has the `--prefix.key[=value]` shape used for plug-in
/// options, i.e. a long flag whose name contains at least one `.`.
fn is_backend_option(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix("--") else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or(rest);
    !name.is_empty() && name.contains('.') && name.split('.').all(|part| !part.is_empty())
}

/// Strip plug-in-specific `--prefix.key[=value]` / `--prefix.key value`
/// options out of `args`, returning the filtered argv (safe to hand to a
/// clap parser) and the parsed options table.
pub fn extract_backend_options(args: Vec<String>) -> (Vec<String>, BackendOptions) {
    let mut filtered = Vec::with_capacity(args.len());
    let mut options = BackendOptions::new();

    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        if !is_backend_option(&arg) {
            filtered.push(arg);
            continue;
        }

        let body = arg.strip_prefix("--").unwrap();
        if let Some((key, value)) = body.split_once('=') {
            options.insert(key.to_string(), OptionValue::Str(value.to_string()));
            continue;
        }

        // `--prefix.key value` form: only consume the next token as a value
        // if it isn't itself a flag.
        match iter.peek() {
            Some(next) if !next.starts_with('-') => {
                options.insert(body.to_string(), OptionValue::Str(next.clone()));
                iter.next();
            }
            _ => {
                options.insert(body.to_string(), OptionValue::Flag);
            }
        }
    }

    (filtered, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recognizes_dotted_long_flags() {
        assert!(is_backend_option("--posix.direct-io"));
        assert!(!is_backend_option("--quiet"));
        assert!(!is_backend_option("-q"));
    }

    #[test]
    fn parses_equals_form() {
        let (filtered, opts) = extract_backend_options(args(&["bench", "--posix.root=/tmp/x"]));
        assert_eq!(filtered, args(&["bench"]));
        assert_eq!(opts.get("posix.root").unwrap().as_str(), Some("/tmp/x"));
    }

    #[test]
    fn parses_space_separated_form() {
        let (filtered, opts) = extract_backend_options(args(&["bench", "--posix.root", "/tmp/x"]));
        assert_eq!(filtered, args(&["bench"]));
        assert_eq!(opts.get("posix.root").unwrap().as_str(), Some("/tmp/x"));
    }

    #[test]
    fn parses_flag_form() {
        let (filtered, opts) = extract_backend_options(args(&["bench", "--posix.sync"]));
        assert_eq!(filtered, args(&["bench"]));
        assert!(opts.get("posix.sync").unwrap().is_flag());
    }

    #[test]
    fn flag_followed_by_another_flag_stays_a_flag() {
        let (_, opts) = extract_backend_options(args(&["--posix.sync", "--quiet"]));
        assert!(opts.get("posix.sync").unwrap().is_flag());
    }

    #[test]
    fn for_prefix_strips_prefix() {
        let mut opts = BackendOptions::new();
        opts.insert("posix.root", OptionValue::Str("/tmp".into()));
        opts.insert("posix.sync", OptionValue::Flag);
        opts.insert("other.thing", OptionValue::Flag);
        let under_posix: Vec<_> = opts.for_prefix("posix").map(|(k, _)| k).collect();
        assert_eq!(under_posix.len(), 2);
        assert!(under_posix.contains(&"root"));
        assert!(under_posix.contains(&"sync"));
    }

    #[test]
    fn non_dotted_long_flags_pass_through() {
        let (filtered, opts) = extract_backend_options(args(&["--quiet", "--verbose"]));
        assert_eq!(filtered, args(&["--quiet", "--verbose"]));
        assert!(opts.is_empty());
    }

    #[test]
    fn short_flags_pass_through() {
        let (filtered, opts) = extract_backend_options(args(&["-q", "-v"]));
        assert_eq!(filtered, args(&["-q", "-v"]));
        assert!(opts.is_empty());
    }
}
