use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{
    parser::{parse_args, parse_bool, parse_number, ParserOptions, RawParseResult, RawValue},
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Boolean,
    String,
    Number,
    Array,
    Positional,
    Enum,
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    Num(f64),
    List(Vec<String>),
}

impl Value {
    /// Renderings compared against an `allowed` set.
    fn members(&self) -> Vec<String> {
        match self {
            Value::Bool(it) => vec![it.to_string()],
            Value::Str(it) => vec![it.clone()],
            Value::Num(it) => vec![it.to_string()],
            Value::List(items) => items.clone(),
        }
    }
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Value {
        match raw {
            RawValue::Bool(it) => Value::Bool(it),
            RawValue::Str(it) => Value::Str(it),
            RawValue::Num(it) => Value::Num(it),
            RawValue::List(it) => Value::List(it),
        }
    }
}

impl From<bool> for Value {
    fn from(it: bool) -> Value {
        Value::Bool(it)
    }
}

impl From<&str> for Value {
    fn from(it: &str) -> Value {
        Value::Str(it.to_string())
    }
}

impl From<String> for Value {
    fn from(it: String) -> Value {
        Value::Str(it)
    }
}

impl From<f64> for Value {
    fn from(it: f64) -> Value {
        Value::Num(it)
    }
}

impl From<i32> for Value {
    fn from(it: i32) -> Value {
        Value::Num(it.into())
    }
}

impl From<Vec<String>> for Value {
    fn from(it: Vec<String>) -> Value {
        Value::List(it)
    }
}

impl From<Vec<&str>> for Value {
    fn from(it: Vec<&str>) -> Value {
        Value::List(it.into_iter().map(str::to_string).collect())
    }
}

/// Declaration of a single argument of a command.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub alias: Vec<String>,
    pub default: Option<Value>,
    pub required: bool,
    pub allowed: Option<Vec<String>>,
    pub description: Option<String>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, kind: ArgKind) -> ArgSpec {
        ArgSpec {
            name: name.into(),
            kind,
            alias: Vec::new(),
            default: None,
            required: false,
            allowed: None,
            description: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> ArgSpec {
        ArgSpec::new(name, ArgKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> ArgSpec {
        ArgSpec::new(name, ArgKind::String)
    }

    pub fn number(name: impl Into<String>) -> ArgSpec {
        ArgSpec::new(name, ArgKind::Number)
    }

    pub fn array(name: impl Into<String>) -> ArgSpec {
        ArgSpec::new(name, ArgKind::Array)
    }

    pub fn positional(name: impl Into<String>) -> ArgSpec {
        ArgSpec::new(name, ArgKind::Positional)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, allowed: I) -> ArgSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgSpec::new(name, ArgKind::Enum).allowed(allowed)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> ArgSpec {
        self.alias.push(alias.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> ArgSpec {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> ArgSpec {
        self.required = true;
        self
    }

    pub fn allowed<I, S>(mut self, allowed: I) -> ArgSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> ArgSpec {
        self.description = Some(description.into());
        self
    }

    pub fn is_flag(&self) -> bool {
        self.kind != ArgKind::Positional
    }
}

/// Arguments of one invocation, keyed by name, plus the positionals no
/// [`ArgSpec`] claimed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TypedArgs {
    values: BTreeMap<String, Value>,
    rest: Vec<String>,
}

impl TypedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// `false` when absent or not a boolean.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Value::Bool(true)))
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Str(it) => Some(it.as_str()),
            _ => None,
        }
    }

    pub fn num(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Num(it) => Some(*it),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.get(name)? {
            Value::List(it) => Some(it.as_slice()),
            _ => None,
        }
    }

    /// Leftover positionals.
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Checks that names and aliases are unique and that at most one positional
/// is required without a default.
pub fn validate_schema(specs: &[ArgSpec]) -> Result<()> {
    let mut names = BTreeSet::new();
    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(Error::InvalidSchema(format!("duplicate argument `{}`", spec.name)));
        }
    }
    let mut aliases = BTreeSet::new();
    for spec in specs {
        for alias in &spec.alias {
            if names.contains(alias.as_str()) || !aliases.insert(alias.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "alias `{alias}` of `{}` is already taken",
                    spec.name
                )));
            }
        }
    }
    let mandatory = specs
        .iter()
        .filter(|it| it.kind == ArgKind::Positional && it.required && it.default.is_none())
        .count();
    if mandatory > 1 {
        return Err(Error::InvalidSchema(
            "at most one positional can be required without a default".to_string(),
        ));
    }
    Ok(())
}

/// Tokenizer configuration derived from `specs`, on top of `base`.
pub fn options_for(specs: &[ArgSpec], base: &ParserOptions) -> ParserOptions {
    let mut opts = base.clone().negated_boolean(true);
    for spec in specs {
        let name = spec.name.clone();
        opts = match spec.kind {
            ArgKind::Positional => continue,
            ArgKind::Boolean => opts.boolean([name]),
            // Values are taken verbatim, numbers are coerced afterwards.
            ArgKind::String | ArgKind::Number | ArgKind::Enum => opts.string([name]),
            ArgKind::Array => opts.array([name]),
        };
        for alias in &spec.alias {
            opts = opts.alias(alias.clone(), spec.name.clone());
        }
    }
    opts
}

/// Tokenizes `tokens` and coerces the result against `specs`.
pub fn parse_typed<I, S>(tokens: I, specs: &[ArgSpec], base: &ParserOptions) -> Result<TypedArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    validate_schema(specs)?;
    let raw = parse_args(tokens, &options_for(specs, base))?;
    coerce(raw, specs)
}

/// Interprets a raw parse result according to `specs`, in declaration order.
pub fn coerce(raw: RawParseResult, specs: &[ArgSpec]) -> Result<TypedArgs> {
    let RawParseResult { positionals, mut flags } = raw;
    let mut positionals = VecDeque::from(positionals);
    let mut values = BTreeMap::new();

    for spec in specs {
        let value = match spec.kind {
            ArgKind::Positional => positionals.pop_front().map(Value::Str),
            ArgKind::Boolean => flags.remove(&spec.name).map(|raw| Value::Bool(to_bool(raw))),
            ArgKind::String | ArgKind::Enum => flags.remove(&spec.name).map(Value::from),
            ArgKind::Number => match flags.remove(&spec.name) {
                Some(raw) => Some(Value::Num(to_number(&spec.name, raw)?)),
                None => None,
            },
            ArgKind::Array => flags.remove(&spec.name).map(to_list),
        };
        let value = value.or_else(|| spec.default.clone()).or_else(|| match spec.kind {
            ArgKind::Boolean => Some(Value::Bool(false)),
            _ => None,
        });

        let value = match value {
            Some(it) => it,
            None if spec.required => {
                return Err(Error::MissingRequiredArgument { name: spec.name.clone() })
            }
            None => continue,
        };
        if let Some(allowed) = &spec.allowed {
            check_allowed(spec, &value, allowed)?;
        }
        values.insert(spec.name.clone(), value);
    }

    for (name, raw) in flags {
        values.entry(name).or_insert_with(|| raw.into());
    }
    Ok(TypedArgs { values, rest: positionals.into() })
}

fn to_bool(raw: RawValue) -> bool {
    match raw {
        RawValue::Bool(it) => it,
        RawValue::Str(it) => parse_bool(&it),
        RawValue::Num(it) => it != 0.0,
        RawValue::List(items) => items.last().map_or(false, |it| parse_bool(it)),
    }
}

fn to_number(name: &str, raw: RawValue) -> Result<f64> {
    let text = match raw {
        RawValue::Num(it) => return Ok(it),
        RawValue::Str(it) => it,
        RawValue::Bool(it) => it.to_string(),
        RawValue::List(items) => items.join(","),
    };
    parse_number(&text).ok_or_else(|| Error::TypeCoercion { name: name.to_string(), value: text })
}

fn to_list(raw: RawValue) -> Value {
    match raw {
        RawValue::List(items) => Value::List(items),
        RawValue::Str(it) => Value::List(vec![it]),
        RawValue::Num(it) => Value::List(vec![it.to_string()]),
        RawValue::Bool(_) => Value::List(Vec::new()),
    }
}

fn check_allowed(spec: &ArgSpec, value: &Value, allowed: &[String]) -> Result<()> {
    for member in value.members() {
        if !allowed.contains(&member) {
            return Err(Error::InvalidEnumValue {
                name: spec.name.clone(),
                value: member,
                allowed: allowed.to_vec(),
            });
        }
    }
    Ok(())
}

