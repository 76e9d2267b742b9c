//! Option store behind a cluster client: identity, argv overrides and config
//! file sections.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use toml_edit::{DocumentMut, Item, Value};
use tracing::debug;

use crate::errno::Errno;

const ENTITY_TYPE_CLIENT: &str = "client";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityName {
    kind: String,
    id: String,
}

impl EntityName {
    #[must_use]
    pub fn client(id: &str) -> Self {
        Self {
            kind: ENTITY_TYPE_CLIENT.to_string(),
            id: id.to_string(),
        }
    }

    fn parse(full: &str) -> Option<Self> {
        let (kind, id) = full.split_once('.')?;
        if kind.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self {
            kind: kind.to_string(),
            id: id.to_string(),
        })
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.id)
    }
}

/// Configuration context shared by every cluster client implementation.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    name: Option<EntityName>,
    options: BTreeMap<String, String>,
}

impl ClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client identity to `client.<identity>`.
    ///
    /// # Errors
    /// `EINVAL` when the identity is empty.
    pub fn init(&mut self, identity: &str) -> Result<(), Errno> {
        if identity.trim().is_empty() {
            return Err(Errno::EINVAL);
        }
        let name = EntityName::client(identity);
        debug!(%name, "client identity initialized");
        self.name = Some(name);
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> Option<&EntityName> {
        self.name.as_ref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.name.is_some()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(&normalize_key(key)).map(String::as_str)
    }

    /// Sets one option; `id` and `name` rewrite the entity name instead.
    ///
    /// # Errors
    /// `EINVAL` for an empty key or a malformed entity name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Errno> {
        let key = normalize_key(key);
        match key.as_str() {
            "" => return Err(Errno::EINVAL),
            "id" => {
                if value.is_empty() {
                    return Err(Errno::EINVAL);
                }
                let kind = self
                    .name
                    .as_ref()
                    .map_or(ENTITY_TYPE_CLIENT, EntityName::kind)
                    .to_string();
                self.name = Some(EntityName {
                    kind,
                    id: value.to_string(),
                });
            }
            "name" => {
                self.name = Some(EntityName::parse(value).ok_or(Errno::EINVAL)?);
            }
            _ => {}
        }
        debug!(option = %key, value, "config option set");
        self.options.insert(key, value.to_string());
        Ok(())
    }

    /// Applies command-line style overrides in order.
    ///
    /// # Errors
    /// `EINVAL` for an empty option name, an unknown short flag or a
    /// malformed entity name. A value-taking option at the end of `args`
    /// is set to `true`.
    pub fn parse_args(&mut self, args: &[String]) -> Result<(), Errno> {
        let mut idx = 0;
        while idx < args.len() {
            let arg = args[idx].as_str();
            idx += 1;
            let key = if let Some(long) = arg.strip_prefix("--") {
                if let Some((key, value)) = long.split_once('=') {
                    self.set(key, value)?;
                    continue;
                }
                long.to_string()
            } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
                short_alias(short).ok_or(Errno::EINVAL)?.to_string()
            } else {
                debug!(arg, "ignoring positional argument");
                continue;
            };
            if key.is_empty() {
                return Err(Errno::EINVAL);
            }
            let value_required = VALUE_OPTIONS.contains(&normalize_key(&key).as_str());
            match args.get(idx).filter(|next| value_required || !is_flag(next)) {
                Some(value) => {
                    self.set(&key, value)?;
                    idx += 1;
                }
                None => self.set(&key, "true")?,
            }
        }
        Ok(())
    }

    /// Loads a TOML config file: `[global]`, then `[client]`, then
    /// `[client.<id>]`, each overriding what came before.
    ///
    /// # Errors
    /// The OS errno when the file cannot be read, `EINVAL` when it does not
    /// parse or holds non-scalar option values.
    pub fn read_config_file(&mut self, path: &Path) -> Result<(), Errno> {
        let contents = fs::read_to_string(path).map_err(Errno::from)?;
        let doc: DocumentMut = contents.parse().map_err(|err| {
            debug!(path = %path.display(), %err, "config file is not valid TOML");
            Errno::EINVAL
        })?;

        let mut sections: Vec<&Item> = Vec::new();
        if let Some(global) = doc.get("global") {
            sections.push(global);
        }
        let kind = self
            .name
            .as_ref()
            .map_or(ENTITY_TYPE_CLIENT, EntityName::kind)
            .to_string();
        if let Some(kind_section) = doc.get(&kind) {
            sections.push(kind_section);
            let id_section = self
                .name
                .as_ref()
                .and_then(|name| kind_section.get(name.id()));
            if let Some(id_section) = id_section {
                sections.push(id_section);
            }
        }

        let mut collected = Vec::new();
        for section in sections {
            let table = section.as_table_like().ok_or(Errno::EINVAL)?;
            for (key, item) in table.iter() {
                if item.is_table_like() && !item.is_inline_table() {
                    continue;
                }
                let value = item.as_value().and_then(scalar_string).ok_or(Errno::EINVAL)?;
                collected.push((key.to_string(), value));
            }
        }
        for (key, value) in collected {
            self.set(&key, &value)?;
        }
        debug!(path = %path.display(), "config file applied");
        Ok(())
    }
}

/// Finds the config file named by `-c`/`--conf` (separate or `=` form).
///
/// Returns `Err(())` when the flag is the last argument.
pub(crate) fn find_conf_path(args: &[String]) -> Result<Option<&str>, ()> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--conf=") {
            return Ok(Some(path));
        }
        if arg == "-c" || arg == "--conf" {
            return args.get(idx + 1).map(|path| Some(path.as_str())).ok_or(());
        }
    }
    Ok(None)
}

/// Options that always consume the following argument, even one starting
/// with `-`.
const VALUE_OPTIONS: [&str; 4] = ["conf", "mon_host", "id", "name"];

/// `--anything` or a known short flag; `-1` and `-x.toml` are values.
fn is_flag(arg: &str) -> bool {
    arg.starts_with("--") || arg.strip_prefix('-').and_then(short_alias).is_some()
}

fn short_alias(flag: &str) -> Option<&'static str> {
    match flag {
        "c" => Some("conf"),
        "m" => Some("mon_host"),
        "i" => Some("id"),
        "n" => Some("name"),
        _ => None,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.value().clone()),
        Value::Integer(i) => Some(i.value().to_string()),
        Value::Float(f) => Some(f.value().to_string()),
        Value::Boolean(b) => Some(b.value().to_string()),
        Value::Datetime(d) => Some(d.value().to_string()),
        Value::Array(_) | Value::InlineTable(_) => None,
    }
}
