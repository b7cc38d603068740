use crate::{metadata::format::Version, symbols::attributes::TargetOs};

/// A compiled unit this build links against, given as its metadata blob.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub metadata: Vec<u8>,
    /// The module version the dependent was written against.
    pub expected_version: Version,
}

impl Dependency {
    pub fn new(name: &str, metadata: Vec<u8>, expected_version: Version) -> Self {
        Dependency {
            name: name.to_string(),
            metadata,
            expected_version,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub module_name: String,
    pub version: Version,
    pub target_os: TargetOs,
    /// Run instruction combining after the module verifies.
    pub peephole: bool,
    pub dependencies: Vec<Dependency>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            module_name: String::from("main"),
            version: Version::new(0, 1, 0),
            target_os: TargetOs::host(),
            peephole: false,
            dependencies: vec![],
        }
    }
}

impl BuildOptions {
    pub fn new(module_name: &str) -> Self {
        BuildOptions {
            module_name: module_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_target_os(mut self, target_os: TargetOs) -> Self {
        self.target_os = target_os;
        self
    }

    pub fn with_peephole(mut self, peephole: bool) -> Self {
        self.peephole = peephole;
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}
