//! Marshalling compilation options into compiler arguments
//!
//! Options are written to a [`MarshalTarget`] in a fixed order:
//!
//! 1. boolean and scalar toggles, in declaration order
//! 2. fast math, or else the individual toggles it subsumes
//! 3. device optimization in debug mode, assembler options, dialect, register limit
//! 4. multi-valued options: targets, undefines, valueless defines, valued
//!    defines, include paths, pre-includes, diagnostic overrides, extra options
//!
//! Each option is one argument. Targets choose how arguments are separated: a
//! [`String`] takes a character or string delimiter between them, while
//! [`MarshalledOptions`] collects each argument into its own entry.

use std::fmt;

use tracing::debug;

use crate::options::CompilationOptions;

/// Sink for marshalled options, separated by delimiters of type `D`
pub trait MarshalTarget<D: ?Sized> {
    /// Append a fragment to the option being written
    fn append(&mut self, fragment: &str);

    /// Separate the option just written from whatever follows
    fn delimit(&mut self, delimiter: &D);
}

impl MarshalTarget<char> for String {
    fn append(&mut self, fragment: &str) {
        self.push_str(fragment);
    }

    fn delimit(&mut self, delimiter: &char) {
        self.push(*delimiter);
    }
}

impl MarshalTarget<str> for String {
    fn append(&mut self, fragment: &str) {
        self.push_str(fragment);
    }

    fn delimit(&mut self, delimiter: &str) {
        self.push_str(delimiter);
    }
}

/// Delimiter that ends one argument of a [`MarshalledOptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionEnd;

/// Compiler arguments, one entry per option
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarshalledOptions {
    options: Vec<String>,
    pending: String,
}

impl MarshalledOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed arguments
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.options.iter()
    }

    /// Consume into the argument list, completing any partially written argument
    pub fn into_options(mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            self.options.push(std::mem::take(&mut self.pending));
        }
        self.options
    }
}

impl MarshalTarget<OptionEnd> for MarshalledOptions {
    fn append(&mut self, fragment: &str) {
        self.pending.push_str(fragment);
    }

    fn delimit(&mut self, _: &OptionEnd) {
        self.options.push(std::mem::take(&mut self.pending));
    }
}

impl<'a> IntoIterator for &'a MarshalledOptions {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for MarshalledOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(option)?;
        }
        Ok(())
    }
}

/// Writes options to a target, delimiting before every option but the first
struct Emitter<'t, 'd, T: ?Sized, D: ?Sized> {
    target: &'t mut T,
    delimiter: &'d D,
    emitted: usize,
}

impl<T, D> Emitter<'_, '_, T, D>
where
    T: MarshalTarget<D> + ?Sized,
    D: ?Sized,
{
    fn option(&mut self, fragments: &[&str]) {
        if self.emitted > 0 {
            self.target.delimit(self.delimiter);
        }
        for fragment in fragments {
            self.target.append(fragment);
        }
        self.emitted += 1;
    }

    fn flag(&mut self, enabled: bool, option: &str) {
        if enabled {
            self.option(&[option]);
        }
    }
}

/// Write `opts` to `target`, returning the number of options written
///
/// With `trailing_delimiter`, the last option is followed by a delimiter as
/// well; when no option is written, nothing is.
pub fn process<T, D>(opts: &CompilationOptions, target: &mut T, delimiter: &D, trailing_delimiter: bool) -> usize
where
    T: MarshalTarget<D> + ?Sized,
    D: ?Sized,
{
    let mut out = Emitter {
        target,
        delimiter,
        emitted: 0,
    };

    out.flag(opts.generate_relocatable_code, "--relocatable-device-code=true");
    out.flag(opts.compile_extensible_whole_program, "--extensible-whole-program=true");
    out.flag(opts.debug, "--device-debug");
    out.flag(opts.generate_line_info, "--generate-line-info");
    out.flag(opts.support_128bit_integers, "--device-int128");
    out.flag(opts.indicate_function_inlining, "--optimization-info=inline");
    out.flag(opts.compiler_self_identification, "--version-ident=true");
    out.flag(!opts.builtin_initializer_list, "--builtin-initializer-list=false");
    out.flag(!opts.source_dirs_in_include_path, "--no-source-include");
    out.flag(opts.extra_device_vectorization, "--extra-device-vectorization");
    out.flag(opts.disable_warnings, "--disable-warnings");
    out.flag(opts.assume_restrict, "--restrict");
    out.flag(opts.default_execution_space_is_device, "--device-as-default-execution-space");
    out.flag(!opts.display_error_numbers, "--no-display-error-number");
    out.flag(!opts.builtin_move_and_forward, "--builtin-move-forward=false");
    out.flag(!opts.increase_stack_limit_to_max, "--modify-stack-limit=false");
    out.flag(opts.link_time_optimization, "--dlink-time-opt");

    if opts.use_fast_math {
        out.option(&["--use_fast_math"]);
    } else {
        out.flag(opts.flush_denormal_floats_to_zero, "--ftz=true");
        out.flag(!opts.use_precise_square_root, "--prec-sqrt=false");
        out.flag(!opts.use_precise_division, "--prec-div=false");
        out.flag(!opts.use_fused_multiply_add, "--fmad=false");
    }

    out.flag(opts.optimize_device_code_in_debug_mode, "--dopt=on");
    if !opts.ptxas.is_empty() {
        out.option(&["--ptxas-options=", &opts.ptxas]);
    }
    if let Some(dialect) = opts.language_dialect {
        out.option(&["--std=", dialect.name()]);
    }
    if let Some(count) = opts.maximum_register_count {
        out.option(&["--maxrregcount=", &count.to_string()]);
    }

    let prefix = opts.toolkit.architecture_prefix();
    for target in &opts.targets {
        out.option(&["--gpu-architecture=", prefix, &target.as_combined_number().to_string()]);
    }
    for name in &opts.undefines {
        out.option(&["-U", name]);
    }
    for name in &opts.no_value_defines {
        out.option(&["-D", name]);
    }
    for (name, value) in &opts.valued_defines {
        out.option(&["-D", name, "=", value]);
    }
    for path in &opts.additional_include_paths {
        out.option(&["--include-path=", path]);
    }
    for file in &opts.preinclude_files {
        out.option(&["--pre-include=", file]);
    }
    for (number, handling) in &opts.error_handling_overrides {
        out.option(&["--diag-", handling.option_name(), "=", &number.to_string()]);
    }
    for extra in &opts.extra_options {
        out.option(&[extra]);
    }

    if trailing_delimiter && out.emitted > 0 {
        out.target.delimit(out.delimiter);
    }
    debug!(options = out.emitted, "marshalled compilation options");
    out.emitted
}

/// Marshal `opts` into one entry per compiler argument
pub fn marshal(opts: &CompilationOptions) -> MarshalledOptions {
    let mut marshalled = MarshalledOptions::new();
    process(opts, &mut marshalled, &OptionEnd, true);
    marshalled
}

/// Render `opts` as a space-separated command line
pub fn render(opts: &CompilationOptions) -> String {
    let mut rendered = String::new();
    process(opts, &mut rendered, &' ', false);
    rendered
}
