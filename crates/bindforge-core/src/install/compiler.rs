//! Compiler selection for the toolchain bootstrap.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Known host compiler families usable for the initial bootstrap pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerFamily {
    Clang,
    Gcc,
}

impl CompilerFamily {
    /// The C / C++ driver command names for this family.
    pub fn driver_pair(self) -> (&'static str, &'static str) {
        match self {
            Self::Clang => ("clang", "clang++"),
            Self::Gcc => ("gcc", "g++"),
        }
    }
}

impl FromStr for CompilerFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clang" => Ok(Self::Clang),
            "gcc" => Ok(Self::Gcc),
            other => Err(Error::Validation(format!(
                "compiler '{}' not supported, we support clang, gcc",
                other
            ))),
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clang => write!(f, "clang"),
            Self::Gcc => write!(f, "gcc"),
        }
    }
}

/// CMake build modes accepted for the toolchain build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Release,
    Debug,
    MinSizeRel,
    RelWithDebInfo,
}

impl BuildMode {
    /// The spelling CMake expects in `-DCMAKE_BUILD_TYPE`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::MinSizeRel => "MinSizeRel",
            Self::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl FromStr for BuildMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Release" => Ok(Self::Release),
            "Debug" => Ok(Self::Debug),
            "MinSizeRel" => Ok(Self::MinSizeRel),
            "RelWithDebInfo" => Ok(Self::RelWithDebInfo),
            other => Err(Error::Validation(format!(
                "build mode '{}' not supported, we support Release, Debug, MinSizeRel, RelWithDebInfo",
                other
            ))),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved compiler pair plus build mode, fixed for the duration of a
/// bootstrap run.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    pub family: CompilerFamily,
    pub build_mode: BuildMode,
    /// C driver path or command name.
    pub cc: String,
    /// C++ driver path or command name.
    pub cxx: String,
}

impl BuildConfiguration {
    /// Resolve a configuration from a compiler family.
    pub fn new(family: CompilerFamily, build_mode: BuildMode) -> Self {
        let (cc, cxx) = family.driver_pair();
        Self {
            family,
            build_mode,
            cc: cc.to_string(),
            cxx: cxx.to_string(),
        }
    }

    /// CMake cache arguments selecting this configuration.
    pub fn cmake_args(&self) -> Vec<String> {
        Self::cmake_args_for(&self.cc, &self.cxx, self.build_mode)
    }

    /// CMake cache arguments for an explicit compiler pair.
    ///
    /// Bootstrap pass 2 uses this to force the just-built compilers while
    /// keeping the caller's build mode.
    pub fn cmake_args_for(cc: &str, cxx: &str, build_mode: BuildMode) -> Vec<String> {
        vec![
            format!("-DCMAKE_C_COMPILER={}", cc),
            format!("-DCMAKE_CXX_COMPILER={}", cxx),
            format!("-DCMAKE_BUILD_TYPE={}", build_mode),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_families_resolve_driver_pairs() {
        let config = BuildConfiguration::new(CompilerFamily::Clang, BuildMode::Release);
        assert_eq!(config.cc, "clang");
        assert_eq!(config.cxx, "clang++");

        let config = BuildConfiguration::new(CompilerFamily::Gcc, BuildMode::Debug);
        assert_eq!(config.cc, "gcc");
        assert_eq!(config.cxx, "g++");
    }

    #[test]
    fn unknown_family_is_rejected() {
        let err = "icc".parse::<CompilerFamily>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn unknown_build_mode_is_rejected() {
        let err = "Profile".parse::<BuildMode>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn cmake_args_carry_compilers_and_mode() {
        let config = BuildConfiguration::new(CompilerFamily::Clang, BuildMode::MinSizeRel);
        assert_eq!(
            config.cmake_args(),
            vec![
                "-DCMAKE_C_COMPILER=clang",
                "-DCMAKE_CXX_COMPILER=clang++",
                "-DCMAKE_BUILD_TYPE=MinSizeRel",
            ]
        );
    }
}
