//! Types describing a batch of file operations.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One of the six file operations a batch can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Copy,
    Move,
    Del,
    Zip,
    Unzip,
    Rename,
}

impl Command {
    /// Every recognized command, in declaration order.
    pub const ALL: [Command; 6] = [
        Command::Copy,
        Command::Move,
        Command::Del,
        Command::Zip,
        Command::Unzip,
        Command::Rename,
    ];

    /// Returns the batch key for this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Copy => "copy",
            Command::Move => "move",
            Command::Del => "del",
            Command::Zip => "zip",
            Command::Unzip => "unzip",
            Command::Rename => "rename",
        }
    }

    /// Resolves a batch key. Unrecognized names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of work for a command.
///
/// The dispatch core treats jobs as opaque structured data; only the
/// executor interprets their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(Value);

impl Job {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the job as a bare path string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<Value> for Job {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Job {
    fn from(path: &str) -> Self {
        Self(Value::String(path.to_string()))
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested degree of parallelism for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Run items one at a time, in order.
    Sequential,
    /// Fan out across this many workers.
    Workers(usize),
    /// One worker per available CPU.
    Auto,
}

impl Parallelism {
    /// Number of workers to use, where 0 means sequential.
    pub fn worker_count(&self) -> usize {
        match self {
            Parallelism::Sequential => 0,
            Parallelism::Workers(n) => *n,
            Parallelism::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Serialize for Parallelism {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Parallelism::Sequential => serializer.serialize_bool(false),
            Parallelism::Workers(n) => serializer.serialize_u64(*n as u64),
            Parallelism::Auto => serializer.serialize_bool(true),
        }
    }
}

impl<'de> Deserialize<'de> for Parallelism {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null | Value::Bool(false) => Ok(Parallelism::Sequential),
            Value::Bool(true) => Ok(Parallelism::Auto),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Parallelism::Sequential),
                Some(count) => Ok(Parallelism::Workers(count as usize)),
                None => Err(de::Error::custom(format!(
                    "parallel must be a non-negative integer, got {n}"
                ))),
            },
            other => Err(de::Error::custom(format!(
                "parallel must be a worker count or boolean, got {other}"
            ))),
        }
    }
}

// An explicit `null` still overrides, so route it through `Parallelism`
// instead of letting `Option` swallow it.
fn deserialize_parallel<'de, D>(deserializer: D) -> Result<Option<Parallelism>, D::Error>
where
    D: Deserializer<'de>,
{
    Parallelism::deserialize(deserializer).map(Some)
}

/// Options for a command, either global or command-scoped.
///
/// Recognized keys are `parallel`, `progress` and `cache`. Any other key is
/// kept in `extra` and handed to the executor untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSet {
    #[serde(
        default,
        deserialize_with = "deserialize_parallel",
        skip_serializing_if = "Option::is_none"
    )]
    pub parallel: Option<Parallelism>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays `overrides` on top of `self`. Keys set in `overrides` win.
    pub fn merged_with(&self, overrides: &OptionSet) -> OptionSet {
        let mut extra = self.extra.clone();
        for (key, value) in &overrides.extra {
            extra.insert(key.clone(), value.clone());
        }

        OptionSet {
            parallel: overrides.parallel.or(self.parallel),
            progress: overrides.progress.or(self.progress),
            cache: overrides.cache.or(self.cache),
            extra,
        }
    }

    /// Whether unchanged item lists may be skipped. Defaults to true.
    pub fn cache_enabled(&self) -> bool {
        self.cache.unwrap_or(true)
    }

    /// Whether progress should be reported. Defaults to false.
    pub fn progress_enabled(&self) -> bool {
        self.progress.unwrap_or(false)
    }

    /// Worker count for dispatch; 0 selects sequential execution.
    pub fn worker_count(&self) -> usize {
        self.parallel.map(|p| p.worker_count()).unwrap_or(0)
    }

    /// Looks up a pass-through option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Looks up a pass-through boolean option.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(Value::as_bool)
    }

    pub fn with_parallel(mut self, workers: usize) -> Self {
        self.parallel = Some(if workers == 0 {
            Parallelism::Sequential
        } else {
            Parallelism::Workers(workers)
        });
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = Some(enabled);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Items and options for a single command in a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub items: Vec<Job>,
    #[serde(default)]
    pub options: OptionSet,
}

impl CommandSpec {
    pub fn new(items: Vec<Job>) -> Self {
        Self {
            items,
            options: OptionSet::default(),
        }
    }

    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }
}

/// A recognized command and its work.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub command: Command,
    pub spec: CommandSpec,
}

/// An ordered set of commands to run.
///
/// Commands execute in insertion order. Keys that do not name a known
/// command are remembered in `ignored` and never executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch {
    entries: Vec<BatchEntry>,
    ignored: Vec<String>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command by key. A repeated command replaces the earlier spec
    /// but keeps its position.
    pub fn insert(&mut self, name: &str, spec: CommandSpec) {
        match Command::parse(name) {
            Some(command) => self.insert_command(command, spec),
            None => {
                if !self.ignored.iter().any(|n| n == name) {
                    self.ignored.push(name.to_string());
                }
            }
        }
    }

    pub fn insert_command(&mut self, command: Command, spec: CommandSpec) {
        match self.entries.iter_mut().find(|e| e.command == command) {
            Some(entry) => entry.spec = spec,
            None => self.entries.push(BatchEntry { command, spec }),
        }
    }

    /// Builder form of [`CommandBatch::insert`].
    pub fn with(mut self, name: &str, spec: CommandSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn get(&self, command: Command) -> Option<&CommandSpec> {
        self.entries
            .iter()
            .find(|e| e.command == command)
            .map(|e| &e.spec)
    }

    /// Keys that were present but are not recognized commands.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CommandBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.command.as_str(), &entry.spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommandBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BatchVisitor;

        impl<'de> Visitor<'de> for BatchVisitor {
            type Value = CommandBatch;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of command names to {items, options}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CommandBatch, A::Error> {
                let mut batch = CommandBatch::new();
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    if Command::parse(&name).is_none() {
                        batch.insert(&name, CommandSpec::default());
                        continue;
                    }
                    let spec = CommandSpec::deserialize(value)
                        .map_err(|e| de::Error::custom(format!("invalid `{name}` entry: {e}")))?;
                    batch.insert(&name, spec);
                }
                Ok(batch)
            }
        }

        deserializer.deserialize_map(BatchVisitor)
    }
}
