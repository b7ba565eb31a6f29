//! Common types used across CLI modules

use imgpipe_core::domain::step::Step;
use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Prefix that should uniquely identify a job
    Prefix(String),
}

impl IdOrPrefix {
    /// Attempts to parse as a full UUID first, otherwise treats as a prefix
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.to_lowercase()),
        }
    }

    /// Get the UUID if this is a full ID
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            IdOrPrefix::Full(uuid) => Some(*uuid),
            IdOrPrefix::Prefix(_) => None,
        }
    }

    pub fn matches(&self, id: Uuid) -> bool {
        match self {
            IdOrPrefix::Full(uuid) => *uuid == id,
            IdOrPrefix::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

impl From<&str> for IdOrPrefix {
    fn from(s: &str) -> Self {
        IdOrPrefix::parse(s)
    }
}

/// Parse one `--op` value
///
/// Accepted forms: `resize=WxH`, `blur=SIGMA`, `sharpen` and `sharpen=SIGMA`.
/// Range checks are left to the server.
pub fn parse_step(input: &str) -> Result<Step, String> {
    let (name, arg) = match input.split_once('=') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (input.trim(), None),
    };

    let sigma = |arg: &str| {
        arg.parse::<f32>()
            .map_err(|_| format!("invalid sigma '{}' for {}", arg, name))
    };

    match (name.to_ascii_lowercase().as_str(), arg) {
        ("resize", Some(size)) => {
            let (width, height) = size
                .split_once(['x', 'X'])
                .ok_or_else(|| format!("resize expects WIDTHxHEIGHT, got '{}'", size))?;
            let dimension = |raw: &str| {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid dimension '{}' in '{}'", raw, size))
            };
            Ok(Step::Resize {
                width: dimension(width)?,
                height: dimension(height)?,
            })
        }
        ("resize", None) => Err("resize expects WIDTHxHEIGHT, e.g. resize=640x480".to_string()),
        ("blur", Some(arg)) => Ok(Step::Blur { sigma: sigma(arg)? }),
        ("blur", None) => Err("blur expects a sigma, e.g. blur=2".to_string()),
        ("sharpen", Some(arg)) => Ok(Step::Sharpen {
            sigma: Some(sigma(arg)?),
        }),
        ("sharpen", None) => Ok(Step::Sharpen { sigma: None }),
        _ => Err(format!(
            "unknown op '{}' (expected resize, blur or sharpen)",
            name
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_or_prefix() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(id));

        let prefix = IdOrPrefix::parse(&id.to_string()[..6].to_uppercase());
        assert!(prefix.as_uuid().is_none());
        assert!(prefix.matches(id));
        assert!(!IdOrPrefix::from("zzzz").matches(id));
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            parse_step("resize=640x480").unwrap(),
            Step::Resize {
                width: 640,
                height: 480
            }
        );
        assert_eq!(parse_step("blur=2.5").unwrap(), Step::Blur { sigma: 2.5 });
        assert_eq!(parse_step("sharpen").unwrap(), Step::Sharpen { sigma: None });
        assert_eq!(
            parse_step("Sharpen=0.5").unwrap(),
            Step::Sharpen { sigma: Some(0.5) }
        );
    }

    #[test]
    fn test_parse_step_errors() {
        assert!(parse_step("resize=640").is_err());
        assert!(parse_step("resize=axb").is_err());
        assert!(parse_step("blur").is_err());
        assert!(parse_step("blur=much").is_err());
        assert!(parse_step("rotate=90").is_err());
    }
}
