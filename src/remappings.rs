//! Import remappings: `context:prefix=target` directives that redirect import resolution,
//! mirroring the `@openzeppelin/=lib/openzeppelin-contracts/` style entries solc itself accepts.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, path::PathBuf, str::FromStr};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remapping {
    /// Only applies within this context (a directory prefix), if set.
    pub context: Option<String>,
    pub name: String,
    pub path: String,
}

impl Remapping {
    /// Returns the slash-joined form solc expects on the command line / in settings.
    pub fn to_solc_arg(&self) -> String {
        match &self.context {
            Some(context) => format!("{context}:{}={}", self.name, self.path),
            None => format!("{}={}", self.name, self.path),
        }
    }

    /// Resolves `self.path` against `root`, turning a relative library path into an absolute one.
    pub fn join_path(mut self, root: &std::path::Path) -> Self {
        let path = PathBuf::from(&self.path);
        if path.is_relative() {
            self.path = root.join(path).to_string_lossy().into_owned();
        }
        self
    }
}

impl fmt::Display for Remapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_solc_arg())
    }
}

/// solc expects remappings as an array of `context:name=path` strings, not JSON objects — the
/// derived struct shape exists only for our own convenience, so serialize/deserialize through
/// the string form instead.
impl Serialize for Remapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_solc_arg())
    }
}

impl<'de> Deserialize<'de> for Remapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl FromStr for Remapping {
    type Err = String;

    fn from_str(remapping: &str) -> Result<Self, Self::Err> {
        let (context_and_name, path) = remapping
            .split_once('=')
            .ok_or_else(|| format!("no `=` in remapping `{remapping}`"))?;

        let (context, name) = match context_and_name.split_once(':') {
            Some((context, name)) => (Some(context.to_owned()), name.to_owned()),
            None => (None, context_and_name.to_owned()),
        };

        if name.is_empty() {
            return Err(format!("empty remapping name in `{remapping}`"));
        }
        if path.is_empty() {
            return Err(format!("empty remapping target in `{remapping}`"));
        }

        Ok(Self { context, name, path: path.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_remapping() {
        let r: Remapping = "@oz/=lib/openzeppelin-contracts/".parse().unwrap();
        assert_eq!(r.context, None);
        assert_eq!(r.name, "@oz/");
        assert_eq!(r.path, "lib/openzeppelin-contracts/");
    }

    #[test]
    fn parses_contextual_remapping() {
        let r: Remapping = "contracts/:@oz/=lib/openzeppelin-contracts/".parse().unwrap();
        assert_eq!(r.context.as_deref(), Some("contracts/"));
        assert_eq!(r.to_solc_arg(), "contracts/:@oz/=lib/openzeppelin-contracts/");
    }

    #[test]
    fn rejects_malformed_remapping() {
        assert!("no-equals-sign".parse::<Remapping>().is_err());
        assert!("=target".parse::<Remapping>().is_err());
    }

    #[test]
    fn serializes_as_a_plain_string_not_an_object() {
        let r: Remapping = "@oz/=lib/openzeppelin-contracts/".parse().unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"@oz/=lib/openzeppelin-contracts/\"");
        let round_tripped: Remapping = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, r);
    }
}
