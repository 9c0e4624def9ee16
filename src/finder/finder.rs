use is_executable::IsExecutable;
use std::{collections::HashSet, env, ffi::OsString, fs};

pub struct ExecutablesFinder {
    path: Option<OsString>,
}

impl ExecutablesFinder {
    pub fn new() -> Self {
        Self {
            path: env::var_os("PATH"),
        }
    }

    pub fn with_path(path: impl Into<OsString>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Names of executables on `PATH` starting with `prefix`, first occurrence
    /// wins, in `PATH` order.
    pub fn find_executables_starting_with(&self, prefix: &str) -> Vec<String> {
        let Some(path_env) = &self.path else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut binaries = Vec::new();

        for dir in env::split_paths(path_env) {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            let mut names: Vec<String> = entries
                .flatten()
                .filter(|entry| {
                    let path = entry.path();
                    path.is_file() && path.is_executable()
                })
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with(prefix))
                .collect();
            names.sort();

            for name in names {
                if seen.insert(name.clone()) {
                    binaries.push(name);
                }
            }
        }

        binaries
    }
}

impl Default for ExecutablesFinder {
    fn default() -> Self {
        Self::new()
    }
}
