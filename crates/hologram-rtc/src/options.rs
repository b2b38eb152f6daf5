//! Runtime-compilation options record

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hologram_launch::{ComputeCapability, Device, ToolkitVersion};

use crate::dialect::CppDialect;
use crate::error::Result;

/// Diagnostic number as reported by the compiler
pub type DiagnosticNumber = u32;

/// How the compiler should treat a particular diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticHandling {
    Error,
    Suppress,
    Warn,
}

impl DiagnosticHandling {
    /// Suffix of the `--diag-*` option selecting this handling
    pub const fn option_name(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Suppress => "suppress",
            Self::Warn => "warn",
        }
    }
}

/// Options for compiling device code at runtime
///
/// Fields left at their defaults produce no arguments; only deviations from
/// the compiler's own defaults are marshalled. See [`crate::marshal`] for the
/// exact argument order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Target compute capabilities, one `--gpu-architecture` each
    pub targets: BTreeSet<ComputeCapability>,

    /// Generate relocatable device code for separate linking
    pub generate_relocatable_code: bool,
    pub compile_extensible_whole_program: bool,
    /// Emit device debugging information
    pub debug: bool,
    /// With `debug`, still optimize device code
    pub optimize_device_code_in_debug_mode: bool,
    pub generate_line_info: bool,
    /// Allow the 128-bit integer type in device code
    pub support_128bit_integers: bool,
    /// Report each inlined function
    pub indicate_function_inlining: bool,
    pub compiler_self_identification: bool,

    /// Upper bound on registers per thread
    pub maximum_register_count: Option<u32>,

    /// Flush single-precision denormals to zero; implied by `use_fast_math`
    pub flush_denormal_floats_to_zero: bool,
    /// Implied false by `use_fast_math`
    pub use_precise_square_root: bool,
    /// Implied false by `use_fast_math`
    pub use_precise_division: bool,
    /// Implied true by `use_fast_math`
    pub use_fused_multiply_add: bool,
    pub use_fast_math: bool,

    pub link_time_optimization: bool,
    /// Search the source file's directory for includes
    pub source_dirs_in_include_path: bool,
    pub extra_device_vectorization: bool,

    /// `None` leaves the dialect to the compiler
    pub language_dialect: Option<CppDialect>,

    /// Macros defined without a value (`-DNAME`)
    pub no_value_defines: BTreeSet<String>,
    /// Macros undefined (`-UNAME`)
    pub undefines: BTreeSet<String>,
    /// Macros defined with a value (`-DNAME=VALUE`)
    pub valued_defines: BTreeMap<String, String>,

    pub disable_warnings: bool,
    /// Treat all kernel pointer parameters as if they were restrict-qualified
    pub assume_restrict: bool,
    /// Functions without an execution space annotation are device functions
    pub default_execution_space_is_device: bool,
    pub display_error_numbers: bool,

    /// Options forwarded verbatim to the assembler
    pub ptxas: String,

    pub additional_include_paths: Vec<String>,
    /// Headers included before the source
    pub preinclude_files: Vec<String>,

    pub builtin_move_and_forward: bool,
    pub increase_stack_limit_to_max: bool,
    pub builtin_initializer_list: bool,

    /// Arguments appended after every other option, verbatim
    pub extra_options: Vec<String>,

    /// Per-diagnostic handling overrides
    pub error_handling_overrides: BTreeMap<DiagnosticNumber, DiagnosticHandling>,

    /// Toolkit whose argument conventions are targeted
    pub toolkit: ToolkitVersion,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            targets: BTreeSet::new(),
            generate_relocatable_code: false,
            compile_extensible_whole_program: false,
            debug: false,
            optimize_device_code_in_debug_mode: false,
            generate_line_info: false,
            support_128bit_integers: false,
            indicate_function_inlining: false,
            compiler_self_identification: false,
            maximum_register_count: None,
            flush_denormal_floats_to_zero: false,
            use_precise_square_root: true,
            use_precise_division: true,
            use_fused_multiply_add: true,
            use_fast_math: false,
            link_time_optimization: false,
            source_dirs_in_include_path: true,
            extra_device_vectorization: false,
            language_dialect: None,
            no_value_defines: BTreeSet::new(),
            undefines: BTreeSet::new(),
            valued_defines: BTreeMap::new(),
            disable_warnings: false,
            assume_restrict: false,
            default_execution_space_is_device: false,
            display_error_numbers: true,
            ptxas: String::new(),
            additional_include_paths: Vec::new(),
            preinclude_files: Vec::new(),
            builtin_move_and_forward: true,
            increase_stack_limit_to_max: true,
            builtin_initializer_list: true,
            extra_options: Vec::new(),
            error_handling_overrides: BTreeMap::new(),
            toolkit: ToolkitVersion::default(),
        }
    }
}

impl CompilationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================================
    // Targets
    // ============================================================================================

    /// Add a target alongside any existing ones
    pub fn add_target(&mut self, compute_capability: ComputeCapability) -> &mut Self {
        self.targets.insert(compute_capability);
        self
    }

    /// Make `compute_capability` the only target
    pub fn set_target(&mut self, compute_capability: ComputeCapability) -> &mut Self {
        self.targets.clear();
        self.add_target(compute_capability)
    }

    /// Make the device's compute capability the only target
    pub fn set_target_device(&mut self, device: &dyn Device) -> &mut Self {
        self.set_target(device.compute_capability())
    }

    // ============================================================================================
    // Language dialect
    // ============================================================================================

    pub fn set_language_dialect(&mut self, dialect: CppDialect) -> &mut Self {
        self.language_dialect = Some(dialect);
        self
    }

    /// Set the dialect by its `--std=` name; an empty name clears it
    pub fn set_language_dialect_name(&mut self, name: &str) -> Result<&mut Self> {
        if name.is_empty() {
            return Ok(self.clear_language_dialect());
        }
        let dialect = name.parse()?;
        Ok(self.set_language_dialect(dialect))
    }

    pub fn clear_language_dialect(&mut self) -> &mut Self {
        self.language_dialect = None;
        self
    }

    // ============================================================================================
    // Diagnostics
    // ============================================================================================

    pub fn suppress_error(&mut self, number: DiagnosticNumber) -> &mut Self {
        self.error_handling_overrides.insert(number, DiagnosticHandling::Suppress);
        self
    }

    pub fn treat_as_error(&mut self, number: DiagnosticNumber) -> &mut Self {
        self.error_handling_overrides.insert(number, DiagnosticHandling::Error);
        self
    }

    pub fn warn_about(&mut self, number: DiagnosticNumber) -> &mut Self {
        self.error_handling_overrides.insert(number, DiagnosticHandling::Warn);
        self
    }

    // ============================================================================================
    // Preprocessor and paths
    // ============================================================================================

    /// Define a macro without a value, replacing any valued definition
    pub fn define(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.valued_defines.remove(&name);
        self.no_value_defines.insert(name);
        self
    }

    /// Define a macro with a value, replacing any valueless definition
    pub fn define_value(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.no_value_defines.remove(&name);
        self.valued_defines.insert(name, value.into());
        self
    }

    pub fn undefine(&mut self, name: impl Into<String>) -> &mut Self {
        self.undefines.insert(name.into());
        self
    }

    pub fn add_include_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.additional_include_paths.push(path.into());
        self
    }

    pub fn add_preinclude_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.preinclude_files.push(file.into());
        self
    }

    pub fn add_extra_option(&mut self, option: impl Into<String>) -> &mut Self {
        self.extra_options.push(option.into());
        self
    }
}

/// Space-separated command line, as produced by [`crate::render`]
impl fmt::Display for CompilationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::marshal::render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RtcError;
    use hologram_launch::sim::DeviceSpec;

    #[test]
    fn test_defaults_match_compiler_defaults() {
        let opts = CompilationOptions::default();
        assert!(opts.use_precise_square_root && opts.use_precise_division && opts.use_fused_multiply_add);
        assert!(opts.source_dirs_in_include_path);
        assert!(opts.display_error_numbers);
        assert!(!opts.use_fast_math);
        assert_eq!(opts.language_dialect, None);
        assert_eq!(opts.toolkit, ToolkitVersion::LATEST);
    }

    #[test]
    fn test_targets() {
        let mut opts = CompilationOptions::new();
        opts.add_target(ComputeCapability::new(7, 5))
            .add_target(ComputeCapability::new(8, 0));
        assert_eq!(opts.targets.len(), 2);

        opts.set_target_device(&DeviceSpec::ada_rtx4090());
        assert_eq!(
            opts.targets.iter().copied().collect::<Vec<_>>(),
            vec![ComputeCapability::new(8, 9)]
        );
    }

    #[test]
    fn test_language_dialect_by_name() {
        let mut opts = CompilationOptions::new();
        opts.set_language_dialect_name("c++14").unwrap();
        assert_eq!(opts.language_dialect, Some(CppDialect::Cpp14));

        let err = opts.set_language_dialect_name("c++98").unwrap_err();
        assert_eq!(err, RtcError::UnknownDialect("c++98".into()));
        assert_eq!(opts.language_dialect, Some(CppDialect::Cpp14));

        opts.set_language_dialect_name("").unwrap();
        assert_eq!(opts.language_dialect, None);
    }

    #[test]
    fn test_diagnostic_overrides_replace() {
        let mut opts = CompilationOptions::new();
        opts.suppress_error(177).warn_about(550).treat_as_error(177);
        assert_eq!(opts.error_handling_overrides[&177], DiagnosticHandling::Error);
        assert_eq!(opts.error_handling_overrides[&550], DiagnosticHandling::Warn);
    }

    #[test]
    fn test_define_kinds_are_exclusive() {
        let mut opts = CompilationOptions::new();
        opts.define("DEBUG").define_value("DEBUG", "2");
        assert!(opts.no_value_defines.is_empty());
        assert_eq!(opts.valued_defines["DEBUG"], "2");

        opts.define("DEBUG");
        assert!(opts.valued_defines.is_empty());
        assert!(opts.no_value_defines.contains("DEBUG"));
    }
}
