use std::{fmt, str::FromStr};

/// The environment the service registry is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    #[default]
    Release,
    /// Stubbed authentication and fixture-backed network.
    Test,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Release => "release",
            Flavor::Test => "test",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown flavor `{0}`")]
pub struct UnknownFlavor(String);

impl FromStr for Flavor {
    type Err = UnknownFlavor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "release" => Ok(Flavor::Release),
            "test" => Ok(Flavor::Test),
            other => Err(UnknownFlavor(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flavor() {
        assert_eq!("release".parse::<Flavor>().unwrap(), Flavor::Release);
        assert_eq!(" Test ".parse::<Flavor>().unwrap(), Flavor::Test);
        assert!("staging".parse::<Flavor>().is_err());
    }
}
