//! Editor startup script
//!
//! vim is launched with `-S <script>` so the injected command sequences find
//! the editor in a known configuration: exclusive selections, a cursor that
//! may sit one past the last column, and visual mappings that keep a
//! selection usable after indenting or deleting.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::Config;

/// Visual-mode mappings the translator relies on
const VISUAL_MAPPINGS: &[(&str, &str)] = &[
    // Delete without touching the unnamed register, back to insert
    ("<Del>", "\"_di"),
    // Indent and reselect
    (">", ">gv"),
    ("<", "<gv"),
];

/// Render the startup script for `config`
pub fn render(config: &Config) -> String {
    let mut script = String::new();

    let _ = writeln!(script, "set nocompatible");
    let _ = writeln!(script, "set tabstop={0} shiftwidth={0} softtabstop={0}", config.tab_width);
    let _ = writeln!(
        script,
        "set {}",
        if config.expand_tab { "expandtab" } else { "noexpandtab" }
    );
    script.push_str(
        "set whichwrap+=<,>,[,]\n\
         set selection=exclusive\n\
         set virtualedit=onemore\n\
         set backspace=indent,eol,start\n\
         set nohlsearch\n\
         set incsearch\n",
    );
    for (lhs, rhs) in VISUAL_MAPPINGS {
        let _ = writeln!(script, "vnoremap {} {}", lhs, rhs);
    }

    script
}

/// Write the startup script to a temporary file
///
/// The file is removed when the returned handle is dropped.
pub fn write_script(config: &Config) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("shvim-")
        .suffix(".vim")
        .tempfile()?;
    file.write_all(render(config).as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Arguments for the editor: source the script, start in insert mode, no
/// swap file
pub fn editor_args(script: &Path, file: &Path) -> Vec<String> {
    vec![
        "-S".to_string(),
        script.display().to_string(),
        "-c".to_string(),
        "startinsert".to_string(),
        "-n".to_string(),
        file.display().to_string(),
    ]
}
