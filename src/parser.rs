use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use crate::{Error, Result};

/// A flag value before any schema has looked at it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Str(String),
    Num(f64),
    List(Vec<String>),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawParseResult {
    pub positionals: Vec<String>,
    pub flags: BTreeMap<String, RawValue>,
}

/// Decides whether an undeclared flag is kept. Receives the flag token as it
/// appeared on the command line.
pub type UnknownFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Receives human readable warnings.
pub type WarnFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Options of [`parse_args`]. Everything is off or empty by default, except
/// `allow_negative_numbers`.
#[derive(Clone)]
pub struct ParserOptions {
    pub(crate) boolean: BTreeSet<String>,
    pub(crate) string: BTreeSet<String>,
    pub(crate) array: BTreeSet<String>,
    pub(crate) alias: BTreeMap<String, String>,
    pub(crate) defaults: BTreeMap<String, RawValue>,
    pub(crate) negated_boolean: bool,
    pub(crate) stop_early: bool,
    pub(crate) allow_negative_numbers: bool,
    pub(crate) parse_numbers: bool,
    pub(crate) warn_on_unknown: bool,
    pub(crate) strict: bool,
    pub(crate) unknown: Option<UnknownFn>,
    pub(crate) warn: Option<WarnFn>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            boolean: BTreeSet::new(),
            string: BTreeSet::new(),
            array: BTreeSet::new(),
            alias: BTreeMap::new(),
            defaults: BTreeMap::new(),
            negated_boolean: false,
            stop_early: false,
            allow_negative_numbers: true,
            parse_numbers: false,
            warn_on_unknown: false,
            strict: false,
            unknown: None,
            warn: None,
        }
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("boolean", &self.boolean)
            .field("string", &self.string)
            .field("array", &self.array)
            .field("alias", &self.alias)
            .field("defaults", &self.defaults)
            .field("negated_boolean", &self.negated_boolean)
            .field("stop_early", &self.stop_early)
            .field("allow_negative_numbers", &self.allow_negative_numbers)
            .field("parse_numbers", &self.parse_numbers)
            .field("warn_on_unknown", &self.warn_on_unknown)
            .field("strict", &self.strict)
            .field("unknown", &self.unknown.is_some())
            .field("warn", &self.warn.is_some())
            .finish()
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boolean<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boolean.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn string<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.string.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn array<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array.extend(names.into_iter().map(Into::into));
        self
    }

    /// Makes `short` an alternative spelling of `long`.
    pub fn alias(mut self, short: impl Into<String>, long: impl Into<String>) -> Self {
        self.alias.insert(short.into(), long.into());
        self
    }

    pub fn default_value(mut self, name: impl Into<String>, value: RawValue) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    pub fn negated_boolean(mut self, yes: bool) -> Self {
        self.negated_boolean = yes;
        self
    }

    pub fn stop_early(mut self, yes: bool) -> Self {
        self.stop_early = yes;
        self
    }

    pub fn allow_negative_numbers(mut self, yes: bool) -> Self {
        self.allow_negative_numbers = yes;
        self
    }

    pub fn parse_numbers(mut self, yes: bool) -> Self {
        self.parse_numbers = yes;
        self
    }

    pub fn warn_on_unknown(mut self, yes: bool) -> Self {
        self.warn_on_unknown = yes;
        self
    }

    pub fn strict(mut self, yes: bool) -> Self {
        self.strict = yes;
        self
    }

    pub fn unknown<F>(mut self, allow: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.unknown = Some(Arc::new(allow));
        self
    }

    /// Replaces the default `tracing` warning sink.
    pub fn warn_with<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warn = Some(Arc::new(sink));
        self
    }

    fn canonical<'s>(&'s self, name: &'s str) -> &'s str {
        self.alias.get(name).map(String::as_str).unwrap_or(name)
    }

    fn is_known(&self, name: &str) -> bool {
        if self.alias.contains_key(name) {
            return true;
        }
        self.boolean.contains(name) || self.string.contains(name) || self.array.contains(name)
    }

    fn warn(&self, msg: &str) {
        match &self.warn {
            Some(sink) => sink(msg),
            None => tracing::warn!("{msg}"),
        }
    }
}

/// Splits `args` into positionals and flags, without any schema beyond what
/// `opts` declares.
pub fn parse_args<I, S>(args: I, opts: &ParserOptions) -> Result<RawParseResult>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
    Parser::new(args, opts).run()
}

struct Parser<'a> {
    opts: &'a ParserOptions,
    rargs: Vec<String>,
    stopped: bool,
    occurrences: BTreeMap<String, usize>,
    res: RawParseResult,
}

impl<'a> Parser<'a> {
    fn new(mut args: Vec<String>, opts: &'a ParserOptions) -> Self {
        args.reverse();
        Self {
            opts,
            rargs: args,
            stopped: false,
            occurrences: BTreeMap::new(),
            res: RawParseResult::default(),
        }
    }

    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }

    fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }

    fn looks_like_flag(&self, arg: &str) -> bool {
        match arg.strip_prefix('-') {
            None | Some("") => false,
            Some(rest) => !(self.opts.allow_negative_numbers && is_number(rest)),
        }
    }

    /// Next token, if it can serve as the value of an untyped flag.
    fn next_value(&mut self) -> Option<String> {
        match self.peek() {
            Some(arg) if !self.looks_like_flag(arg) => self.next(),
            _ => None,
        }
    }

    fn run(mut self) -> Result<RawParseResult> {
        while let Some(arg) = self.next() {
            if self.stopped {
                self.res.positionals.push(arg);
                continue;
            }
            if arg == "--" {
                let rest = self.rargs.drain(..).rev();
                self.res.positionals.extend(rest);
                break;
            }
            if let Some(body) = arg.strip_prefix("--") {
                self.long_flag(&arg, body)?;
            } else if let Some(body) = arg.strip_prefix('-').filter(|it| !it.is_empty()) {
                self.short_flag(&arg, body)?;
            } else {
                self.positional(arg);
            }
        }
        Ok(self.finish())
    }

    fn positional(&mut self, arg: String) {
        self.res.positionals.push(arg);
        if self.opts.stop_early {
            self.stopped = true;
        }
    }

    fn long_flag(&mut self, token: &str, body: &str) -> Result<()> {
        let opts = self.opts;
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };
        if opts.negated_boolean {
            if let Some(negated) = name.strip_prefix("no-") {
                let negated = opts.canonical(negated);
                if opts.boolean.contains(negated) {
                    self.set(negated, RawValue::Bool(false));
                    return Ok(());
                }
            }
        }
        self.flag(token, name, inline)
    }

    fn short_flag(&mut self, token: &str, body: &str) -> Result<()> {
        let opts = self.opts;
        if let Some((name, value)) = body.split_once('=') {
            return self.flag(token, name, Some(value.to_string()));
        }
        if opts.allow_negative_numbers && is_number(body) {
            self.positional(token.to_string());
            return Ok(());
        }
        for c in body.chars() {
            let name = c.to_string();
            if !opts.is_known(&name) && !self.allow_unknown(&format!("-{c}"), &name)? {
                continue;
            }
            self.set(opts.canonical(&name), RawValue::Bool(true));
        }
        Ok(())
    }

    /// A single flag which may carry a value, either inline after `=` or as
    /// the following token.
    fn flag(&mut self, token: &str, name: &str, inline: Option<String>) -> Result<()> {
        let opts = self.opts;
        if !opts.is_known(name) && !self.allow_unknown(token, name)? {
            // Swallow the value the flag would have taken.
            if inline.is_none() {
                self.next_value();
            }
            return Ok(());
        }

        let name = opts.canonical(name);
        if opts.boolean.contains(name) {
            let value = inline.as_deref().map_or(true, parse_bool);
            self.set(name, RawValue::Bool(value));
        } else if opts.array.contains(name) {
            let value = inline.or_else(|| self.next());
            self.push(name, value);
        } else if opts.string.contains(name) {
            let value = match inline.or_else(|| self.next()) {
                Some(it) => RawValue::Str(it),
                None => RawValue::Bool(true),
            };
            self.set(name, value);
        } else {
            let value = match inline.or_else(|| self.next_value()) {
                Some(it) => self.infer(it),
                None => RawValue::Bool(true),
            };
            self.set(name, value);
        }
        Ok(())
    }

    fn allow_unknown(&self, token: &str, name: &str) -> Result<bool> {
        let opts = self.opts;
        if let Some(allow) = &opts.unknown {
            return Ok(allow(token));
        }
        let flag = format!("--{name}");
        if opts.strict {
            return Err(Error::UnknownFlag { flag });
        }
        if opts.warn_on_unknown {
            opts.warn(&format!("Unknown flag: {flag}"));
        }
        Ok(true)
    }

    fn infer(&self, value: String) -> RawValue {
        if self.opts.parse_numbers {
            if let Some(num) = parse_number(&value) {
                return RawValue::Num(num);
            }
        }
        RawValue::Str(value)
    }

    fn set(&mut self, name: &str, value: RawValue) {
        self.res.flags.insert(name.to_string(), value);
    }

    fn push(&mut self, name: &str, value: Option<String>) {
        *self.occurrences.entry(name.to_string()).or_default() += 1;
        let slot = self.res.flags.entry(name.to_string()).or_insert(RawValue::List(Vec::new()));
        match slot {
            RawValue::List(items) => items.extend(value),
            _ => *slot = RawValue::List(value.into_iter().collect()),
        }
    }

    fn finish(mut self) -> RawParseResult {
        for (name, count) in &self.occurrences {
            if *count != 1 {
                continue;
            }
            if let Some(RawValue::List(items)) = self.res.flags.get_mut(name) {
                if let [single] = items.as_slice() {
                    if single.contains(',') {
                        *items = single
                            .split(',')
                            .filter(|it| !it.is_empty())
                            .map(str::to_string)
                            .collect();
                    }
                }
            }
        }
        for (name, value) in &self.opts.defaults {
            self.res.flags.entry(name.clone()).or_insert_with(|| value.clone());
        }
        self.res
    }
}

/// `true` and `false` in any case, anything else non-empty counts as set.
pub(crate) fn parse_bool(value: &str) -> bool {
    if value.eq_ignore_ascii_case("false") {
        return false;
    }
    !value.is_empty()
}

/// Optionally signed integer or decimal, like `42`, `-1` or `9.99`.
pub(crate) fn is_number(text: &str) -> bool {
    let text = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits)
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    if !is_number(text) {
        return None;
    }
    text.parse().ok()
}
