//! Build description synthesis.
//!
//! Turns the generator's manifest plus the original project sources into a
//! CMake project: one position-independent static library per foreign
//! compilation unit, and one aggregate extension-module target over the
//! generated sources, linked against all of them and the binding library
//! subproject.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Extensions that mark a project file as a compilation unit of its own
/// (headers are include-path only).
const FOREIGN_UNIT_EXTENSIONS: &[&str] = &["c", "cc", "cpp"];

/// Inputs for one synthesized build description.
pub struct BuildDescription {
    /// Extension module target name.
    pub module_name: String,
    /// Root of the binding library tree (added as a subproject).
    pub pybind11_source: PathBuf,
    /// Generated sources, relative to the build directory.
    pub generated_sources: Vec<PathBuf>,
    /// Every enumerated project source file.
    pub project_sources: Vec<PathBuf>,
    /// Include paths attached to every target.
    pub include_dirs: Vec<PathBuf>,
}

impl BuildDescription {
    /// Project sources that get their own static-library target.
    fn foreign_units(&self) -> impl Iterator<Item = &PathBuf> {
        self.project_sources.iter().filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| FOREIGN_UNIT_EXTENSIONS.contains(&ext))
        })
    }

    /// Derive a unique target name from a source path.
    fn static_lib_name(path: &Path) -> String {
        path.display()
            .to_string()
            .replace(['/', '.'], "_")
    }

    /// Render the build description in the external build tool's format.
    pub fn render(&self) -> String {
        let include_dirs = self
            .include_dirs
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let mut lines = Vec::new();
        lines.push("cmake_minimum_required(VERSION 3.4...3.18)".to_string());
        lines.push(format!("project({})", self.module_name));
        lines.push(format!(
            "add_subdirectory(\"{}\" \"${{CMAKE_CURRENT_BINARY_DIR}}/pybind11_build\")",
            self.pybind11_source.display()
        ));
        lines.push(String::new());

        let mut to_link = Vec::new();
        for source in self.foreign_units() {
            let lib = Self::static_lib_name(source);
            lines.push(format!(
                "add_library({} STATIC ${{CMAKE_SOURCE_DIR}}/{})",
                lib,
                source.display()
            ));
            lines.push(format!(
                "set_target_properties({} PROPERTIES POSITION_INDEPENDENT_CODE ON)",
                lib
            ));
            lines.push(format!(
                "target_include_directories({} PRIVATE {})",
                lib, include_dirs
            ));
            to_link.push(lib);
        }

        let generated = self
            .generated_sources
            .iter()
            .map(|source| format!("${{CMAKE_CURRENT_BINARY_DIR}}/{}", source.display()))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!(
            "pybind11_add_module({} MODULE {})",
            self.module_name, generated
        ));
        lines.push(format!(
            "target_include_directories({} PRIVATE {})",
            self.module_name, include_dirs
        ));
        lines.push(format!(
            "set_target_properties({} PROPERTIES POSITION_INDEPENDENT_CODE ON)",
            self.module_name
        ));
        lines.push(format!(
            "target_link_libraries({} PRIVATE {})",
            self.module_name,
            to_link.join(" ")
        ));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Write the description where the external build tool expects it.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> BuildDescription {
        BuildDescription {
            module_name: "demo".to_string(),
            pybind11_source: PathBuf::from("/build/pybind11"),
            generated_sources: vec![PathBuf::from("demo.cpp"), PathBuf::from("demo/ns.cpp")],
            project_sources: vec![
                PathBuf::from("src/algo.cpp"),
                PathBuf::from("src/algo.hpp"),
                PathBuf::from("src/ffi.c"),
            ],
            include_dirs: vec![PathBuf::from("/proj/src"), PathBuf::from("/build/pybind11/include")],
        }
    }

    #[test]
    fn headers_do_not_become_targets() {
        let text = description().render();
        assert!(text.contains("add_library(src_algo_cpp STATIC ${CMAKE_SOURCE_DIR}/src/algo.cpp)"));
        assert!(text.contains("add_library(src_ffi_c STATIC ${CMAKE_SOURCE_DIR}/src/ffi.c)"));
        assert!(!text.contains("algo_hpp"));
    }

    #[test]
    fn every_target_is_position_independent() {
        let text = description().render();
        assert_eq!(
            text.matches("POSITION_INDEPENDENT_CODE ON").count(),
            3 // two static libs + the module
        );
    }

    #[test]
    fn module_aggregates_generated_sources_and_links_all_libs() {
        let text = description().render();
        assert!(text.contains(
            "pybind11_add_module(demo MODULE ${CMAKE_CURRENT_BINARY_DIR}/demo.cpp \
             ${CMAKE_CURRENT_BINARY_DIR}/demo/ns.cpp)"
        ));
        assert!(text.contains("target_link_libraries(demo PRIVATE src_algo_cpp src_ffi_c)"));
    }

    #[test]
    fn binding_library_is_a_subproject() {
        let text = description().render();
        assert!(text.contains(
            "add_subdirectory(\"/build/pybind11\" \"${CMAKE_CURRENT_BINARY_DIR}/pybind11_build\")"
        ));
    }

    #[test]
    fn include_dirs_reach_every_target() {
        let text = description().render();
        assert_eq!(
            text.matches("PRIVATE /proj/src /build/pybind11/include").count(),
            3
        );
    }
}
