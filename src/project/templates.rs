use super::{STARTER_SOURCE, WATCHED_DIRS, list_variable_name};
use crate::manifest::{
    BUILD_RULE_ANCHOR, SOURCES_ANCHOR, render_build_rule, render_export, render_file_list,
};

pub const DEFAULT_CXX_STANDARD: u16 = 17;

/// Values substituted into the generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTemplate {
    pub name: String,
    pub cxx_standard: u16,
}

impl ProjectTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cxx_standard: DEFAULT_CXX_STANDARD,
        }
    }

    pub fn root_manifest(&self) -> String {
        let mut out = format!(
            "cmake_minimum_required(VERSION 3.13)\nproject({})\n\nset(CMAKE_CXX_STANDARD {})\nset(CMAKE_CXX_STANDARD_REQUIRED ON)\n\ninclude_directories(lib)\n\n",
            self.name, self.cxx_standard
        );
        for dir in WATCHED_DIRS {
            out.push_str(&format!("add_subdirectory({dir})\n"));
        }
        out.push('\n');
        out.push_str(BUILD_RULE_ANCHOR);
        out.push('\n');
        out.push_str(&render_build_rule(&[list_variable_name("bin")]));
        out.push('\n');
        out
    }

    /// `bin` starts out knowing its one source file; the rest get only the
    /// anchor. Every manifest exports its list so the root build rule sees it,
    /// and a list inserted by sync lands above the export.
    pub fn dir_manifest(&self, dir: &str) -> String {
        let variable = list_variable_name(dir);
        let export = render_export(&variable);
        if dir != "bin" {
            return format!("{SOURCES_ANCHOR}\n{export}\n");
        }
        format!(
            "{SOURCES_ANCHOR}\n{}\n{export}\n\nadd_executable(${{PROJECT_NAME}} ${{{variable}}})\n",
            render_file_list(&variable, &[STARTER_SOURCE.to_string()])
        )
    }

    pub fn starter_source(&self) -> &'static str {
        "int main() {\n\n    return 0;\n}\n"
    }

    pub fn readme(&self) -> String {
        format!(
            "# {}\n\n## Description\n\nA brief description of your project.\n",
            self.name
        )
    }
}
