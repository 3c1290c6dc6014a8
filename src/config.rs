use std::path::PathBuf;

use crate::partner::NamingConvention;
use crate::variant::MultiTagPolicy;

pub const DEFAULT_OUTPUT_DIR: &str = "target/generated-sources/eventgen";
pub const DEFAULT_EXTENSION: &str = "java";

/// Settings of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the generated source tree; register it as a source root.
    pub output_dir: PathBuf,
    /// Extension of generated files, without the dot.
    pub extension: String,
    pub naming: NamingConvention,
    pub multi_tag_policy: MultiTagPolicy,
    /// Render and report, but write nothing.
    pub dry_run: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            naming: NamingConvention::default(),
            multi_tag_policy: MultiTagPolicy::default(),
            dry_run: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into(), ..Self::default() }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_multi_tag_policy(mut self, policy: MultiTagPolicy) -> Self {
        self.multi_tag_policy = policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
