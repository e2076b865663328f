//! Shared test fixtures. Compiled only for `cfg(test)`.

use std::collections::{HashMap, HashSet};

use crate::registry::{ReturnValue, StdlibFunction, StdlibLoader, StdlibType};

/// Fixed-table stdlib loader - no network, no manifest.
pub(crate) struct MockStdlibLoader {
    packages: HashSet<String>,
    functions: HashMap<String, StdlibFunction>,
}

impl MockStdlibLoader {
    pub(crate) fn new(packages: &[&str]) -> Self {
        Self {
            packages: packages.iter().map(|s| s.to_string()).collect(),
            functions: HashMap::new(),
        }
    }

    pub(crate) fn with_function(
        mut self,
        import_path: &str,
        name: &str,
        signature: &str,
        returns: &[&str],
    ) -> Self {
        self.functions.insert(
            format!("{import_path}.{name}"),
            StdlibFunction {
                name: name.to_string(),
                signature: signature.to_string(),
                returns: returns
                    .iter()
                    .map(|t| ReturnValue { ty: t.to_string() })
                    .collect(),
            },
        );
        self
    }
}

impl StdlibLoader for MockStdlibLoader {
    fn validate(&self, import_path: &str) -> bool {
        self.packages.contains(import_path)
    }

    fn function(&self, import_path: &str, name: &str) -> Option<&StdlibFunction> {
        self.functions.get(&format!("{import_path}.{name}"))
    }

    fn get_type(&self, _import_path: &str, _name: &str) -> Option<&StdlibType> {
        None
    }

    fn package_count(&self) -> usize {
        self.packages.len()
    }
}
