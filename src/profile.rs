//! # Profile Module
//!
//! A [`Profile`] selects one of the built-in feature levels: which extensions
//! are recognized, which files and directories are excluded, which patterns
//! count as an existing header and how much of each file is inspected.
//!
//! The resolved settings for a run live in a [`RuleSet`]. It starts from the
//! profile defaults and is then adjusted by the config file and the command
//! line.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ExtensionMap};
use crate::file_filter::ExclusionSet;
use crate::styles::CommentStyleId;
use crate::styles::CommentStyleId::*;

/// Built-in feature level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
  /// C-family sources only, checked for a BSD 3-Clause copyright notice
  Basic,
  /// Every supported language, with the full exclusion and pattern tables
  #[default]
  Enhanced,
}

impl fmt::Display for Profile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Profile::Basic => f.write_str("basic"),
      Profile::Enhanced => f.write_str("enhanced"),
    }
  }
}

/// What to do with a file that carries somebody else's license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForeignLicensePolicy {
  /// Treat the file as already licensed and leave it alone
  #[default]
  Skip,
  /// Leave the file alone but report it as a conflict
  Flag,
}

/// Size of the raw prefix inspected by the binary check.
pub const BINARY_SNIFF_BYTES: usize = 1024;

const MIB: u64 = 1024 * 1024;

const BASIC_EXTENSIONS: &[(&str, CommentStyleId)] = &[
  ("c", CStyle),
  ("h", CStyle),
  ("cpp", CStyle),
  ("hpp", CStyle),
  ("cc", CStyle),
  ("s", CStyle),
];

const BASIC_EXCLUDE_DIRS: &[&str] = &[".git", "build", "target"];

/// Matches a copyright notice that names the BSD 3-Clause license, in either
/// order.
const BASIC_PATTERN: &str = r"(?s)(copyright.*bsd 3-clause license|bsd 3-clause license.*copyright)";

// Ambiguous extensions appear once: `m` is MATLAB, `inc` is a C include, `s`
// is hash-commented assembly.
const ENHANCED_EXTENSIONS: &[(&str, CommentStyleId)] = &[
  // C/C++
  ("c", CStyle),
  ("h", CStyle),
  ("cpp", CStyle),
  ("cxx", CStyle),
  ("cc", CStyle),
  ("hpp", CStyle),
  ("hxx", CStyle),
  ("hh", CStyle),
  ("c++", CStyle),
  ("h++", CStyle),
  ("inl", CStyle),
  ("inc", CStyle),
  ("tcc", CStyle),
  // .NET
  ("cs", CppStyle),
  ("csx", CppStyle),
  ("vb", CppStyle),
  ("fs", CppStyle),
  ("fsx", CppStyle),
  // JVM
  ("java", CppStyle),
  ("scala", CppStyle),
  ("kt", CppStyle),
  ("kts", CppStyle),
  ("groovy", CppStyle),
  ("gradle", CppStyle),
  // JavaScript/TypeScript
  ("js", CppStyle),
  ("jsx", CppStyle),
  ("ts", CppStyle),
  ("tsx", CppStyle),
  ("mjs", CppStyle),
  ("cjs", CppStyle),
  ("vue", HtmlStyle),
  ("svelte", HtmlStyle),
  // Web
  ("html", HtmlStyle),
  ("htm", HtmlStyle),
  ("xhtml", HtmlStyle),
  ("xml", HtmlStyle),
  ("svg", HtmlStyle),
  ("xsl", HtmlStyle),
  ("xslt", HtmlStyle),
  ("xaml", HtmlStyle),
  ("css", CStyle),
  ("scss", CppStyle),
  ("sass", CppStyle),
  ("less", CppStyle),
  ("styl", CppStyle),
  // Python
  ("py", HashStyle),
  ("pyx", HashStyle),
  ("pxd", HashStyle),
  ("pxi", HashStyle),
  ("pyw", HashStyle),
  ("py3", HashStyle),
  ("pyi", HashStyle),
  // Shell
  ("sh", HashStyle),
  ("bash", HashStyle),
  ("zsh", HashStyle),
  ("fish", HashStyle),
  ("ksh", HashStyle),
  ("csh", HashStyle),
  ("tcsh", HashStyle),
  // Ruby
  ("rb", HashStyle),
  ("rbw", HashStyle),
  ("rake", HashStyle),
  ("gemspec", HashStyle),
  ("ru", HashStyle),
  // Perl
  ("pl", HashStyle),
  ("pm", HashStyle),
  ("pod", HashStyle),
  ("t", HashStyle),
  ("psgi", HashStyle),
  // PHP
  ("php", CppStyle),
  ("php3", CppStyle),
  ("php4", CppStyle),
  ("php5", CppStyle),
  ("phtml", CppStyle),
  ("phps", CppStyle),
  // Go, Rust, Swift, Objective-C++, D
  ("go", CppStyle),
  ("rs", CppStyle),
  ("swift", CppStyle),
  ("mm", CppStyle),
  ("d", CppStyle),
  ("di", CppStyle),
  // Assembly
  ("s", HashStyle),
  ("asm", HashStyle),
  ("nasm", HashStyle),
  // Configuration
  ("conf", HashStyle),
  ("config", HashStyle),
  ("cfg", HashStyle),
  ("ini", HashStyle),
  ("properties", HashStyle),
  ("env", HashStyle),
  ("toml", HashStyle),
  ("yaml", HashStyle),
  ("yml", HashStyle),
  ("json", CppStyle),
  ("json5", CppStyle),
  ("jsonc", CppStyle),
  // Build systems
  ("mk", HashStyle),
  ("make", HashStyle),
  ("cmake", HashStyle),
  ("am", HashStyle),
  ("in", HashStyle),
  ("ac", HashStyle),
  ("m4", HashStyle),
  ("scons", HashStyle),
  ("waf", HashStyle),
  ("ninja", HashStyle),
  // Documentation
  ("md", MarkdownStyle),
  ("markdown", MarkdownStyle),
  ("mdown", MarkdownStyle),
  ("mkd", MarkdownStyle),
  ("rst", HashStyle),
  ("txt", TextStyle),
  ("text", TextStyle),
  ("rtf", TextStyle),
  // LaTeX
  ("tex", LatexStyle),
  ("latex", LatexStyle),
  ("sty", LatexStyle),
  ("cls", LatexStyle),
  ("dtx", LatexStyle),
  ("ins", LatexStyle),
  // SQL
  ("sql", SqlStyle),
  ("mysql", SqlStyle),
  ("pgsql", SqlStyle),
  ("plsql", SqlStyle),
  ("tsql", SqlStyle),
  // R
  ("r", HashStyle),
  ("rmd", HashStyle),
  ("rnw", HashStyle),
  // MATLAB/Octave
  ("m", MatlabStyle),
  ("mat", MatlabStyle),
  ("fig", MatlabStyle),
  // Lua, Haskell
  ("lua", LuaStyle),
  ("hs", HaskellStyle),
  ("lhs", HaskellStyle),
  // Erlang/Elixir
  ("erl", ErlangStyle),
  ("hrl", ErlangStyle),
  ("ex", HashStyle),
  ("exs", HashStyle),
  // Lisp
  ("lisp", LispStyle),
  ("lsp", LispStyle),
  ("cl", LispStyle),
  ("el", LispStyle),
  ("scm", LispStyle),
  ("ss", LispStyle),
  ("rkt", LispStyle),
  // Fortran
  ("f", FortranStyle),
  ("f77", FortranStyle),
  ("f90", FortranStyle),
  ("f95", FortranStyle),
  ("f03", FortranStyle),
  ("f08", FortranStyle),
  ("for", FortranStyle),
  ("ftn", FortranStyle),
  // Ada
  ("ada", AdaStyle),
  ("adb", AdaStyle),
  ("ads", AdaStyle),
  // Pascal
  ("pas", PascalStyle),
  ("pp", PascalStyle),
  // COBOL
  ("cob", HashStyle),
  ("cbl", HashStyle),
  ("cpy", HashStyle),
  // Vim
  ("vim", VimStyle),
  ("vimrc", VimStyle),
  // Batch/PowerShell
  ("bat", BatchStyle),
  ("cmd", BatchStyle),
  ("ps1", PowershellStyle),
  ("psm1", PowershellStyle),
  ("psd1", PowershellStyle),
  // Misc
  ("proto", CppStyle),
  ("graphql", HashStyle),
  ("gql", HashStyle),
  ("dockerfile", HashStyle),
  ("tf", HashStyle),
  ("tfvars", HashStyle),
  ("ansible", HashStyle),
  ("k8s", HashStyle),
  ("awk", HashStyle),
  ("sed", HashStyle),
  ("tcl", HashStyle),
  ("tk", HashStyle),
  ("expect", HashStyle),
  ("jinja", HashStyle),
  ("j2", HashStyle),
  ("mustache", HashStyle),
  ("handlebars", HashStyle),
  ("hbs", HashStyle),
];

const ENHANCED_SPECIAL_FILES: &[(&str, CommentStyleId)] = &[
  ("Makefile", HashStyle),
  ("makefile", HashStyle),
  ("GNUmakefile", HashStyle),
  ("CMakeLists.txt", HashStyle),
  ("Dockerfile", HashStyle),
  ("Vagrantfile", HashStyle),
  ("Rakefile", HashStyle),
  ("Gemfile", HashStyle),
  ("Podfile", HashStyle),
  ("Brewfile", HashStyle),
  ("Procfile", HashStyle),
  ("Jenkinsfile", HashStyle),
  (".gitignore", HashStyle),
  (".gitattributes", HashStyle),
  (".dockerignore", HashStyle),
  (".eslintrc", HashStyle),
  (".prettierrc", HashStyle),
  (".babelrc", HashStyle),
  (".editorconfig", HashStyle),
  (".clang-format", HashStyle),
  (".clang-tidy", HashStyle),
];

const ENHANCED_EXCLUDE_DIRS: &[&str] = &[
  ".git",
  ".github",
  ".svn",
  ".hg",
  ".bzr",
  "build",
  "builds",
  "bin",
  "obj",
  "out",
  "output",
  "dist",
  "target",
  "release",
  "debug",
  "node_modules",
  "bower_components",
  "vendor",
  "third_party",
  "external",
  "deps",
  "dependencies",
  "venv",
  "env",
  ".venv",
  ".env",
  "virtualenv",
  "__pycache__",
  ".pytest_cache",
  ".mypy_cache",
  ".idea",
  ".vscode",
  ".vs",
  ".atom",
  ".sublime",
  "cmake-build-debug",
  "cmake-build-release",
  ".gradle",
  ".maven",
  "coverage",
  ".coverage",
  ".nyc_output",
  "logs",
  "log",
  "tmp",
  "temp",
  "cache",
  ".cache",
  "backup",
  "backups",
  ".backup",
  "test-results",
  "test-reports",
  "documentation",
  "docs/_build",
  "site",
];

const ENHANCED_EXCLUDE_FILES: &[&str] = &[
  // License and project documents
  "LICENSE",
  "LICENSE.txt",
  "LICENSE.md",
  "COPYING",
  "COPYRIGHT",
  "README.md",
  "README.txt",
  "README.rst",
  "README",
  "CHANGELOG.md",
  "CHANGELOG.txt",
  "CHANGELOG.rst",
  "CHANGELOG",
  "CONTRIBUTING.md",
  "CONTRIBUTING.txt",
  "CONTRIBUTING.rst",
  "CODE_OF_CONDUCT.md",
  "SECURITY.md",
  "SUPPORT.md",
  "AUTHORS",
  "AUTHORS.txt",
  "AUTHORS.md",
  "CONTRIBUTORS",
  "CONTRIBUTORS.txt",
  "CONTRIBUTORS.md",
  "MAINTAINERS",
  "MAINTAINERS.txt",
  "MAINTAINERS.md",
  "NOTICE",
  "NOTICE.txt",
  "NOTICE.md",
  "COMMERCIAL_TERMS.md",
  "USAGE_GUIDE.md",
  // Tool configuration and lock files
  ".gitignore",
  ".gitattributes",
  ".gitmodules",
  ".editorconfig",
  ".prettierrc",
  ".eslintrc",
  ".npmrc",
  ".yarnrc",
  ".bowerrc",
  "package-lock.json",
  "yarn.lock",
  "pnpm-lock.yaml",
  "Cargo.lock",
  "go.sum",
  "poetry.lock",
  "Pipfile.lock",
  "composer.lock",
  "mix.lock",
  // System files
  ".DS_Store",
  "Thumbs.db",
  "desktop.ini",
  // Generated files
  "*.min.js",
  "*.min.css",
  "*.bundle.js",
  "*.bundle.css",
  "*.map",
  "*.d.ts",
];

/// Markers of this project's own header.
const PROJECT_PATTERNS: &[&str] = &[
  r"Copyright.*Ashish.*Yesale",
  r"SAGE OS.*Copyright",
  r"SPDX-License-Identifier",
  r"This file is part of the SAGE OS Project",
  r"ashishyesale007@gmail\.com",
];

/// Markers of third-party licenses.
const FOREIGN_PATTERNS: &[&str] = &[
  r"Licensed under",
  r"All rights reserved",
  r"Permission is hereby granted",
  r"MIT License",
  r"Apache License",
  r"GNU General Public License",
  r"GPL-[0-9]",
  r"LGPL-[0-9]",
];

impl Profile {
  fn extensions(self) -> &'static [(&'static str, CommentStyleId)] {
    match self {
      Profile::Basic => BASIC_EXTENSIONS,
      Profile::Enhanced => ENHANCED_EXTENSIONS,
    }
  }

  fn special_files(self) -> &'static [(&'static str, CommentStyleId)] {
    match self {
      Profile::Basic => &[],
      Profile::Enhanced => ENHANCED_SPECIAL_FILES,
    }
  }

  fn exclude_dirs(self) -> &'static [&'static str] {
    match self {
      Profile::Basic => BASIC_EXCLUDE_DIRS,
      Profile::Enhanced => ENHANCED_EXCLUDE_DIRS,
    }
  }

  fn exclude_files(self) -> &'static [&'static str] {
    match self {
      Profile::Basic => &[],
      Profile::Enhanced => ENHANCED_EXCLUDE_FILES,
    }
  }

  fn project_patterns(self) -> &'static [&'static str] {
    match self {
      Profile::Basic => &[BASIC_PATTERN],
      Profile::Enhanced => PROJECT_PATTERNS,
    }
  }

  fn foreign_patterns(self) -> &'static [&'static str] {
    match self {
      Profile::Basic => &[],
      Profile::Enhanced => FOREIGN_PATTERNS,
    }
  }

  /// Default size ceiling for eligible files.
  pub const fn max_file_size(self) -> u64 {
    match self {
      Profile::Basic => MIB,
      Profile::Enhanced => 10 * MIB,
    }
  }

  /// Default number of leading bytes searched for an existing header.
  pub const fn header_scan_bytes(self) -> usize {
    match self {
      Profile::Basic => 500,
      Profile::Enhanced => 5000,
    }
  }
}

/// Resolved rules for one run.
#[derive(Debug, Clone)]
pub struct RuleSet {
  pub profile: Profile,
  pub extension_map: ExtensionMap,
  pub exclusions: ExclusionSet,
  /// Regexes that identify this project's header.
  pub project_patterns: Vec<String>,
  /// Regexes that identify a third-party license.
  pub foreign_patterns: Vec<String>,
  pub max_file_size: u64,
  pub header_scan_bytes: usize,
  pub binary_sniff_bytes: usize,
  pub foreign_policy: ForeignLicensePolicy,
  /// Whether directories whose name starts with a dot are left out of the
  /// walk.
  pub skip_hidden_dirs: bool,
}

impl RuleSet {
  /// Builds the default rules of `profile`.
  pub fn new(profile: Profile) -> Self {
    Self::with_overrides(profile, &BTreeMap::new(), &BTreeMap::new())
  }

  /// Builds the rules of `profile`, with the given mappings taking priority
  /// over the built-in tables.
  pub fn with_overrides(
    profile: Profile,
    extensions: &BTreeMap<String, CommentStyleId>,
    filenames: &BTreeMap<String, CommentStyleId>,
  ) -> Self {
    let mut extension_map = ExtensionMap::new();

    for (name, style) in filenames {
      extension_map.register_filename(name, *style);
    }
    for (extension, style) in extensions {
      extension_map.register_extension(extension, *style);
    }
    for (name, style) in profile.special_files() {
      extension_map.register_filename(name, *style);
    }
    for (extension, style) in profile.extensions() {
      extension_map.register_extension(extension, *style);
    }

    let mut exclusions = ExclusionSet::default();
    for name in profile.exclude_files() {
      exclusions.add_file(name);
    }
    for dir in profile.exclude_dirs() {
      exclusions.add_dir(dir);
    }

    Self {
      profile,
      extension_map,
      exclusions,
      project_patterns: profile.project_patterns().iter().map(|p| (*p).to_string()).collect(),
      foreign_patterns: profile.foreign_patterns().iter().map(|p| (*p).to_string()).collect(),
      max_file_size: profile.max_file_size(),
      header_scan_bytes: profile.header_scan_bytes(),
      binary_sniff_bytes: BINARY_SNIFF_BYTES,
      foreign_policy: ForeignLicensePolicy::default(),
      skip_hidden_dirs: profile == Profile::Enhanced,
    }
  }

  /// A classifier over this rule set's extension map.
  pub fn classifier(&self) -> Classifier {
    Classifier::new(self.extension_map.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::path::Path;

  use super::*;

  #[test]
  fn test_builtin_tables_have_no_duplicate_keys() {
    for profile in [Profile::Basic, Profile::Enhanced] {
      let mut seen = HashSet::new();
      for (ext, _) in profile.extensions() {
        assert!(seen.insert(ext.to_lowercase()), "{profile}: duplicate extension {ext}");
      }
      let mut seen = HashSet::new();
      for (name, _) in profile.special_files() {
        assert!(seen.insert(*name), "{profile}: duplicate file name {name}");
      }
    }
  }

  #[test]
  fn test_ambiguous_extensions_resolve_deliberately() {
    let rules = RuleSet::new(Profile::Enhanced);
    let map = &rules.extension_map;
    assert_eq!(map.lookup_extension("m"), Some(MatlabStyle));
    assert_eq!(map.lookup_extension("inc"), Some(CStyle));
    assert_eq!(map.lookup_extension("S"), Some(HashStyle));
    assert_eq!(map.lookup_extension("R"), Some(HashStyle));
  }

  #[test]
  fn test_basic_profile_is_c_family_only() {
    let rules = RuleSet::new(Profile::Basic);
    let classifier = rules.classifier();
    assert_eq!(classifier.classify(Path::new("kernel/kernel.c")), Some(CStyle));
    assert_eq!(classifier.classify(Path::new("boot/start.S")), Some(CStyle));
    assert_eq!(classifier.classify(Path::new("tools/gen.py")), None);
    assert_eq!(classifier.classify(Path::new("Makefile")), None);
    assert_eq!(rules.header_scan_bytes, 500);
    assert_eq!(rules.max_file_size, MIB);
  }

  #[test]
  fn test_enhanced_profile_defaults() {
    let rules = RuleSet::new(Profile::Enhanced);
    assert_eq!(rules.header_scan_bytes, 5000);
    assert_eq!(rules.max_file_size, 10 * MIB);
    assert_eq!(rules.binary_sniff_bytes, 1024);
    assert_eq!(rules.foreign_policy, ForeignLicensePolicy::Skip);
  }

  #[test]
  fn test_overrides_take_priority() {
    let mut extensions = BTreeMap::new();
    extensions.insert("m".to_string(), CppStyle);
    let mut filenames = BTreeMap::new();
    filenames.insert("Makefile".to_string(), TextStyle);

    let rules = RuleSet::with_overrides(Profile::Enhanced, &extensions, &filenames);
    let classifier = rules.classifier();
    assert_eq!(classifier.classify(Path::new("shape.m")), Some(CppStyle));
    assert_eq!(classifier.classify(Path::new("Makefile")), Some(TextStyle));
    assert_eq!(classifier.classify(Path::new("makefile")), Some(HashStyle));
  }
}
