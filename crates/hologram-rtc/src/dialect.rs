//! C++ language dialects accepted by the runtime compiler

use std::fmt;
use std::str::FromStr;

use crate::error::RtcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CppDialect {
    Cpp03,
    Cpp11,
    Cpp14,
    Cpp17,
}

impl CppDialect {
    pub const ALL: [CppDialect; 4] = [Self::Cpp03, Self::Cpp11, Self::Cpp14, Self::Cpp17];

    /// Name as passed to `--std=`
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cpp03 => "c++03",
            Self::Cpp11 => "c++11",
            Self::Cpp14 => "c++14",
            Self::Cpp17 => "c++17",
        }
    }
}

impl fmt::Display for CppDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CppDialect {
    type Err = RtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dialect| dialect.name() == s)
            .ok_or_else(|| RtcError::UnknownDialect(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for dialect in CppDialect::ALL {
            assert_eq!(dialect.name().parse::<CppDialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn test_unknown_dialect() {
        let err = "c++20".parse::<CppDialect>().unwrap_err();
        assert_eq!(err, RtcError::UnknownDialect("c++20".into()));
        assert_eq!(err.to_string(), "no C++ dialect named \"c++20\"");
        assert_eq!(err.kind(), hologram_launch::ErrorKind::InvalidArgument);

        // Matching is exact
        assert!("C++17".parse::<CppDialect>().is_err());
    }
}
