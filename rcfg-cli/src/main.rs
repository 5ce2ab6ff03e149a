use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use path_clean::PathClean;
use rcfg::{ConfigData, DialectSettings, Kind, Loc};

/// Parse one or more JSON(+dialect) config files with `rcfg` and print
/// their structure and StringTable/ConfigData stats.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// A single config file to parse.
    #[clap(short, long = "file", value_parser)]
    file: Option<PathBuf>,

    /// A directory of config files to parse, one after another.
    #[clap(short, long = "dir", value_parser)]
    dir: Option<String>,

    /// Enable all eight dialect relaxations at once.
    #[clap(long)]
    relaxed: bool,

    /// Object keys may be a bare word instead of a quoted string.
    #[clap(long)]
    unquoted_keys: bool,

    /// Treat `// ...` and `/* ... */` as whitespace.
    #[clap(long)]
    c_comments: bool,

    /// Parse a top-level member list (no enclosing `{}`) as an object.
    #[clap(long)]
    implicit_root_object: bool,

    /// Commas between array elements / object members are optional.
    #[clap(long)]
    optional_commas: bool,

    /// Accept `=` in place of `:` between an object key and value.
    #[clap(long)]
    equals_for_colon: bool,

    /// Accept Python-style `"""..."""` raw multiline strings.
    #[clap(long)]
    python_multiline_strings: bool,

    /// Treat `\` as a literal character inside quoted strings.
    #[clap(long)]
    skip_escape_sequences: bool,

    /// Accept bytes below 0x20 unescaped inside quoted strings.
    #[clap(long)]
    allow_control_characters: bool,

    /// Pack the string table before printing stats.
    #[clap(long)]
    pack: bool,
}

impl Args {
    fn dialect(&self) -> DialectSettings {
        if self.relaxed {
            return DialectSettings::relaxed();
        }
        DialectSettings {
            unquoted_keys: self.unquoted_keys,
            c_comments: self.c_comments,
            implicit_root_object: self.implicit_root_object,
            optional_commas: self.optional_commas,
            equals_for_colon: self.equals_for_colon,
            python_multiline_strings: self.python_multiline_strings,
            skip_escape_sequences: self.skip_escape_sequences,
            allow_control_characters: self.allow_control_characters,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = args.dialect();

    if let Some(dir_path) = &args.dir {
        let dir = std::fs::read_dir(dir_path)
            .with_context(|| format!("reading directory {dir_path}"))?;
        for entry in dir {
            let entry = entry?;
            let file_path = entry.path().clean();
            if let Err(e) = print_config(&file_path, &settings, args.pack) {
                tracing::warn!(file = %file_path.display(), error = %e, "failed to parse config");
            }
        }
    } else if let Some(file_path) = &args.file {
        print_config(file_path, &settings, args.pack)?;
    } else {
        println!("No file or directory specified.");
    }

    Ok(())
}

fn print_config(file_path: &Path, settings: &DialectSettings, pack: bool) -> Result<()> {
    let src = std::fs::read_to_string(file_path)
        .with_context(|| format!("reading {}", file_path.display()))?;

    println!("---------- {} ----------", file_path.display());
    let mut data = ConfigData::new();
    match rcfg::parse(&src, &mut data, settings) {
        Ok(()) => {
            print_value(&data, data.root(), 0);
        }
        Err(e) => {
            println!("parse error: {e}");
            return Ok(());
        }
    }

    if pack {
        let before = data.total_bytes();
        let after = data.pack_strings();
        tracing::info!(before, after, "packed string table");
    }

    println!(
        "stats: total_bytes={} value_region_bytes={} used_value_bytes={}",
        data.total_bytes(),
        data.value_region_bytes(),
        data.used_value_bytes()
    );

    Ok(())
}

fn print_value(data: &ConfigData, loc: Loc, depth: usize) {
    let indent = "  ".repeat(depth);
    match data.kind(loc) {
        Kind::Null => println!("{indent}null"),
        Kind::False => println!("{indent}false"),
        Kind::True => println!("{indent}true"),
        Kind::Number => println!("{indent}{}", data.to_number(loc).unwrap_or_default()),
        Kind::String => println!("{indent}{:?}", data.to_str(loc).unwrap_or_default()),
        Kind::Array => {
            println!("{indent}[");
            for i in 0..data.array_len(loc) {
                print_value(data, data.array_item(loc, i), depth + 1);
            }
            println!("{indent}]");
        }
        Kind::Object => {
            println!("{indent}{{");
            for i in 0..data.object_len(loc) {
                let key = data.to_str(data.object_key_loc(loc, i)).unwrap_or_default();
                println!("{}  {key}:", indent);
                print_value(data, data.object_value(loc, i), depth + 2);
            }
            println!("{indent}}}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn prints_a_simple_object() -> Result<()> {
        let mut file = tempfile_with(b"{\"a\": 1, \"b\": [1, 2, 3]}")?;
        file.flush()?;
        print_config(file.path(), &DialectSettings::default(), false)
    }

    #[test]
    fn reports_parse_errors_without_failing() -> Result<()> {
        let mut file = tempfile_with(b"not json")?;
        file.flush()?;
        print_config(file.path(), &DialectSettings::default(), false)
    }

    fn tempfile_with(bytes: &[u8]) -> Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(bytes)?;
        Ok(file)
    }
}
